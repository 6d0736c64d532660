// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Positional arguments cover the common case
//! (`branchbuild owner/project release main`). Everything else can also be
//! set in a TOML config file; flags given here win over the file.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `branchbuild`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "branchbuild",
    version,
    about = "Keep a build continuously up to date with a git branch.",
    long_about = None
)]
pub struct CliArgs {
    /// Repository to track, as `owner/project`.
    #[arg(value_name = "REPO")]
    pub repo: Option<String>,

    /// Build target handed to the build program (e.g. a make target).
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Branch to track. Defaults to `master`.
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Path to a config file (TOML).
    ///
    /// Without this flag `Branchbuild.toml` is used if it exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Clone URL, overriding the one derived from REPO.
    #[arg(long, value_name = "URL")]
    pub remote: Option<String>,

    /// Directory the repository is cloned into.
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<String>,

    /// Build program (default `make`).
    #[arg(long, value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Directory for captured command output.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// How often to pull, e.g. `1s` or `500ms`.
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Delay between a detected change and the restarted build.
    #[arg(long, value_name = "DURATION")]
    pub quiescence: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BRANCHBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't touch git or build.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
