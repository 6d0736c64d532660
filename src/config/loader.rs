// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BranchbuildError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Default config file looked up in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Branchbuild.toml")
}

/// Build the effective configuration for a CLI invocation.
///
/// - `--config PATH` must point at a readable file.
/// - Without it, `Branchbuild.toml` is used when present.
/// - CLI values then override whatever the file said.
pub fn resolve(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match args.config.as_deref() {
        Some(path) => load_from_path(path).map_err(|e| match e {
            BranchbuildError::IoError(io) => {
                BranchbuildError::ConfigError(format!("cannot read config '{path}': {io}"))
            }
            other => other,
        })?,
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                debug!(path = ?default_path, "using default config file");
                load_from_path(&default_path)?
            } else {
                RawConfigFile::default()
            }
        }
    };

    apply_cli_overrides(&mut raw, args);
    ConfigFile::try_from(raw)
}

/// Copy every value given on the command line into `raw`.
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if let Some(repo) = &args.repo {
        raw.repo.name = Some(repo.clone());
    }
    if let Some(target) = &args.target {
        raw.build.target = Some(target.clone());
    }
    if let Some(branch) = &args.branch {
        raw.repo.branch = Some(branch.clone());
    }
    if let Some(remote) = &args.remote {
        raw.repo.remote = Some(remote.clone());
    }
    if let Some(workdir) = &args.workdir {
        raw.repo.workdir = Some(workdir.clone());
    }
    if let Some(program) = &args.program {
        raw.build.program = program.clone();
    }
    if let Some(dir) = &args.log_dir {
        raw.logs.dir = dir.clone();
    }
    if let Some(interval) = &args.poll_interval {
        raw.poll.interval = interval.clone();
    }
    if let Some(quiescence) = &args.quiescence {
        raw.poll.quiescence = quiescence.clone();
    }
}
