// src/build/process.rs

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::build::{BuildCommand, BuildRunner};
use crate::errors::{BuildError, ExecError};
use crate::exec::{OpKind, OutputCapture, run_captured};
use crate::vcs::BoxFuture;

/// Production [`BuildRunner`]: spawns the build in the working copy with
/// output going to the `build` capture files.
#[derive(Debug, Clone)]
pub struct ProcessBuildRunner {
    worktree: PathBuf,
    capture: Arc<OutputCapture>,
    kill_grace: Duration,
}

impl ProcessBuildRunner {
    pub fn new(worktree: impl Into<PathBuf>, capture: Arc<OutputCapture>, kill_grace: Duration) -> Self {
        Self {
            worktree: worktree.into(),
            capture,
            kill_grace,
        }
    }
}

impl BuildRunner for ProcessBuildRunner {
    fn run<'a>(
        &'a self,
        scope: CancellationToken,
        command: &'a BuildCommand,
    ) -> BoxFuture<'a, Result<(), BuildError>> {
        Box::pin(async move {
            let mut cmd = Command::new(&command.program);
            cmd.args(&command.args).current_dir(&self.worktree);

            debug!(command = %command, worktree = ?self.worktree, "spawning build");

            let output = match run_captured(cmd, OpKind::Build, &self.capture, &scope, self.kill_grace)
                .await
            {
                Ok(output) => output,
                Err(ExecError::Cancelled) => return Err(BuildError::Cancelled),
                Err(source) => {
                    return Err(BuildError::Exec {
                        command: command.to_string(),
                        source,
                    });
                }
            };

            info!(command = %command, exit_code = ?output.code(), "build process exited");

            if output.success() {
                Ok(())
            } else {
                Err(BuildError::Failed {
                    command: command.to_string(),
                    code: output.code(),
                })
            }
        })
    }
}
