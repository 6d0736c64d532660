// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::build::BuildCommand;
use crate::vcs::RepoSpec;

pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_BUILD_PROGRAM: &str = "make";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Configuration as read from a TOML file, before CLI overrides and
/// validation.
///
/// ```toml
/// [repo]
/// name = "owner/project"
/// branch = "main"
///
/// [build]
/// target = "release"
///
/// [poll]
/// interval = "1s"
/// quiescence = "1s"
/// ```
///
/// All sections are optional and have reasonable defaults; only
/// `repo.name` has to come from somewhere (file or CLI).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub repo: RepoSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub poll: PollSection,

    #[serde(default)]
    pub logs: LogsSection,
}

/// `[repo]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoSection {
    /// `owner/project`.
    #[serde(default)]
    pub name: Option<String>,

    /// Clone URL; derived from `name` when absent.
    #[serde(default)]
    pub remote: Option<String>,

    /// Tracked branch; `master` when absent.
    #[serde(default)]
    pub branch: Option<String>,

    /// Directory the clone lives in; the current directory when absent.
    #[serde(default)]
    pub workdir: Option<String>,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default = "default_program")]
    pub program: String,

    /// Passed as the first argument, e.g. a make target.
    #[serde(default)]
    pub target: Option<String>,

    /// Extra arguments after the target.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_program() -> String {
    DEFAULT_BUILD_PROGRAM.to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            program: default_program(),
            target: None,
            args: Vec::new(),
        }
    }
}

/// `[poll]` section. All values are duration strings (`"1s"`, `"250ms"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollSection {
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_quiescence")]
    pub quiescence: String,

    #[serde(default = "default_pull_timeout")]
    pub pull_timeout: String,

    #[serde(default = "default_kill_grace")]
    pub kill_grace: String,
}

fn default_interval() -> String {
    "1s".to_string()
}

fn default_quiescence() -> String {
    "1s".to_string()
}

fn default_pull_timeout() -> String {
    "30s".to_string()
}

fn default_kill_grace() -> String {
    "2s".to_string()
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            quiescence: default_quiescence(),
            pull_timeout: default_pull_timeout(),
            kill_grace: default_kill_grace(),
        }
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogsSection {
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.to_string()
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}

/// Timing knobs for the poller, the supervisor and process termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_interval: std::time::Duration,
    pub quiescence: std::time::Duration,
    pub pull_timeout: std::time::Duration,
    pub kill_grace: std::time::Duration,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub repo: RepoSpec,
    pub branch: String,
    pub workdir: PathBuf,
    pub build: BuildCommand,
    pub timing: Timing,
    pub log_dir: PathBuf,
}

impl ConfigFile {
    /// Path of the working copy (`workdir/<project>`).
    pub fn worktree(&self) -> PathBuf {
        self.workdir.join(&self.repo.dir_name)
    }
}
