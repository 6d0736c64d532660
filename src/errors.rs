// src/errors.rs

//! Crate-wide error types.
//!
//! `BranchbuildError` is what configuration loading and the supervisor
//! return. The collaborator errors (`VcsError`, `BuildError`, `ExecError`)
//! stay separate so the supervisor can tell a cancelled build from a failed
//! one without string matching.

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BranchbuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Source control error: {0}")]
    Vcs(#[from] VcsError),
}

/// Failure of a single captured process run.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The scope was cancelled and the process group was terminated.
    #[error("process cancelled")]
    Cancelled,

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("output capture failed: {0}")]
    Capture(#[source] io::Error),

    #[error("waiting for process failed: {0}")]
    Wait(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git {op} exited with code {code:?}: {detail}")]
    CommandFailed {
        op: &'static str,
        code: Option<i32>,
        detail: String,
    },

    #[error("branch '{0}' did not match anything known to git")]
    UnknownBranch(String),

    #[error("git {op} was cancelled")]
    Cancelled { op: &'static str },

    #[error("git {op} could not run: {source}")]
    Exec {
        op: &'static str,
        #[source]
        source: ExecError,
    },
}

impl VcsError {
    pub(crate) fn from_exec(op: &'static str, err: ExecError) -> Self {
        match err {
            ExecError::Cancelled => VcsError::Cancelled { op },
            other => VcsError::Exec { op, source: other },
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("build cancelled")]
    Cancelled,

    #[error("build command `{command}` exited with code {code:?}")]
    Failed { command: String, code: Option<i32> },

    #[error("build command `{command}` could not run: {source}")]
    Exec {
        command: String,
        #[source]
        source: ExecError,
    },
}

impl BuildError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, BranchbuildError>;
