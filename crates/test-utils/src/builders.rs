#![allow(dead_code)]

use std::time::Duration;

use branchbuild::build::BuildCommand;
use branchbuild::config::{ConfigFile, RawConfigFile};
use branchbuild::engine::SupervisorSettings;
use branchbuild::errors::Result;

/// Builder for `RawConfigFile` to simplify config tests.
pub struct RawConfigBuilder {
    raw: RawConfigFile,
}

impl RawConfigBuilder {
    pub fn new(repo: &str) -> Self {
        let mut raw = RawConfigFile::default();
        raw.repo.name = Some(repo.to_string());
        Self { raw }
    }

    /// No repository at all.
    pub fn empty() -> Self {
        Self {
            raw: RawConfigFile::default(),
        }
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.raw.repo.branch = Some(branch.to_string());
        self
    }

    pub fn remote(mut self, remote: &str) -> Self {
        self.raw.repo.remote = Some(remote.to_string());
        self
    }

    pub fn workdir(mut self, dir: &str) -> Self {
        self.raw.repo.workdir = Some(dir.to_string());
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.raw.build.program = program.to_string();
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.raw.build.target = Some(target.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.raw.build.args.push(arg.to_string());
        self
    }

    pub fn poll_interval(mut self, value: &str) -> Self {
        self.raw.poll.interval = value.to_string();
        self
    }

    pub fn quiescence(mut self, value: &str) -> Self {
        self.raw.poll.quiescence = value.to_string();
        self
    }

    pub fn pull_timeout(mut self, value: &str) -> Self {
        self.raw.poll.pull_timeout = value.to_string();
        self
    }

    pub fn log_dir(mut self, dir: &str) -> Self {
        self.raw.logs.dir = dir.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.raw
    }

    pub fn build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.raw)
    }
}

/// Builder for `SupervisorSettings` with timings short enough for tests.
pub struct SettingsBuilder {
    settings: SupervisorSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: SupervisorSettings {
                branch: "main".to_string(),
                command: BuildCommand::new("make", vec!["all".to_string()]),
                poll_interval: Duration::from_millis(20),
                pull_timeout: Duration::from_millis(500),
                quiescence: Duration::from_millis(30),
            },
        }
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.settings.branch = branch.to_string();
        self
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.settings.poll_interval = d;
        self
    }

    pub fn pull_timeout(mut self, d: Duration) -> Self {
        self.settings.pull_timeout = d;
        self
    }

    pub fn quiescence(mut self, d: Duration) -> Self {
        self.settings.quiescence = d;
        self
    }

    pub fn build(self) -> SupervisorSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
