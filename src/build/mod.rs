// src/build/mod.rs

//! Build collaborator: one external command run in the working copy.

pub mod process;

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::errors::BuildError;
use crate::vcs::BoxFuture;

pub use process::ProcessBuildRunner;

/// The build command line, e.g. `make all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs a [`BuildCommand`] inside a cancellable scope.
pub trait BuildRunner: Send + Sync + 'static {
    /// Run `command` to completion.
    ///
    /// Once `scope` is cancelled this must stop the build and return
    /// [`BuildError::Cancelled`] promptly.
    fn run<'a>(
        &'a self,
        scope: CancellationToken,
        command: &'a BuildCommand,
    ) -> BoxFuture<'a, Result<(), BuildError>>;
}
