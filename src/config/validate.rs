// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::build::BuildCommand;
use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, DEFAULT_BRANCH, RawConfigFile, Timing};
use crate::errors::{BranchbuildError, Result};
use crate::vcs::RepoSpec;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BranchbuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let repo = validate_repo(&raw)?;
        let branch = validate_branch(&raw)?;
        let build = validate_build(&raw)?;
        let timing = validate_timing(&raw)?;

        let workdir = raw
            .repo
            .workdir
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        if raw.logs.dir.trim().is_empty() {
            return Err(config_error("[logs].dir must not be empty"));
        }

        Ok(ConfigFile {
            repo,
            branch,
            workdir,
            build,
            timing,
            log_dir: PathBuf::from(&raw.logs.dir),
        })
    }
}

fn config_error(msg: impl Into<String>) -> BranchbuildError {
    BranchbuildError::ConfigError(msg.into())
}

fn validate_repo(cfg: &RawConfigFile) -> Result<RepoSpec> {
    let name = cfg.repo.name.as_deref().ok_or_else(|| {
        config_error("a repository is required: pass REPO or set [repo].name")
    })?;

    RepoSpec::parse(name, cfg.repo.remote.clone())
        .map_err(|e| config_error(format!("[repo].name: {e}")))
}

fn validate_branch(cfg: &RawConfigFile) -> Result<String> {
    let branch = cfg
        .repo
        .branch
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_BRANCH);

    if branch.starts_with('-') || branch.contains(char::is_whitespace) {
        return Err(config_error(format!(
            "[repo].branch '{branch}' is not a valid branch name"
        )));
    }

    Ok(branch.to_string())
}

fn validate_build(cfg: &RawConfigFile) -> Result<BuildCommand> {
    let program = cfg.build.program.trim();
    if program.is_empty() {
        return Err(config_error("[build].program must not be empty"));
    }

    let mut args = Vec::new();
    if let Some(target) = cfg.build.target.as_deref().map(str::trim) {
        if !target.is_empty() {
            args.push(target.to_string());
        }
    }
    args.extend(cfg.build.args.iter().cloned());

    Ok(BuildCommand::new(program, args))
}

/// Upper bound for every timing value.
const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn validate_timing(cfg: &RawConfigFile) -> Result<Timing> {
    let poll_interval = duration_field("poll.interval", &cfg.poll.interval)?;
    let quiescence = duration_field("poll.quiescence", &cfg.poll.quiescence)?;
    let pull_timeout = duration_field("poll.pull_timeout", &cfg.poll.pull_timeout)?;
    let kill_grace = duration_field("poll.kill_grace", &cfg.poll.kill_grace)?;

    if poll_interval.is_zero() {
        return Err(config_error("[poll].interval must be greater than 0"));
    }
    if pull_timeout.is_zero() {
        return Err(config_error("[poll].pull_timeout must be greater than 0"));
    }

    Ok(Timing {
        poll_interval,
        quiescence,
        pull_timeout,
        kill_grace,
    })
}

fn duration_field(key: &str, value: &str) -> Result<Duration> {
    let d = parse_duration(value).map_err(|e| config_error(format!("[{key}]: {e}")))?;
    if d > MAX_DURATION {
        return Err(config_error(format!(
            "[{key}]: '{value}' is longer than the 365 day limit"
        )));
    }
    Ok(d)
}
