// src/exec/command.rs

//! Run one external command with captured output under a cancellation scope.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ExecError;
use crate::exec::capture::{OpKind, OutputCapture};
use crate::exec::terminate::terminate;

/// Result of a command that ran to completion.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub async fn stdout(&self) -> Result<String, ExecError> {
        read_lossy(&self.stdout_path).await
    }

    pub async fn stderr(&self) -> Result<String, ExecError> {
        read_lossy(&self.stderr_path).await
    }
}

async fn read_lossy(path: &Path) -> Result<String, ExecError> {
    let bytes = tokio::fs::read(path).await.map_err(ExecError::Capture)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Spawn `command` with stdout/stderr redirected to the capture files for
/// `op` and wait for it.
///
/// When `scope` is cancelled first, the whole process group is terminated
/// (SIGTERM, `kill_grace`, SIGKILL) and [`ExecError::Cancelled`] is returned.
/// The child is always reaped before this returns.
pub async fn run_captured(
    command: std::process::Command,
    op: OpKind,
    capture: &OutputCapture,
    scope: &CancellationToken,
    kill_grace: Duration,
) -> Result<CommandOutput, ExecError> {
    if scope.is_cancelled() {
        return Err(ExecError::Cancelled);
    }

    let program = command.get_program().to_string_lossy().into_owned();
    let mut command = into_tokio(command);

    let streams = capture.open(op).map_err(ExecError::Capture)?;
    command
        .stdin(Stdio::null())
        .stdout(Stdio::from(streams.stdout))
        .stderr(Stdio::from(streams.stderr))
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;

    debug!(%op, %program, pid = ?child.id(), "process started");

    tokio::select! {
        biased;

        _ = scope.cancelled() => {
            info!(%op, %program, "cancellation requested; terminating process group");
            if let Err(e) = terminate(&mut child, kill_grace).await {
                warn!(%op, %program, error = %e, "failed to terminate process");
            }
            Err(ExecError::Cancelled)
        }

        status = child.wait() => {
            let status = status.map_err(ExecError::Wait)?;
            debug!(%op, %program, ?status, "process exited");
            Ok(CommandOutput {
                status,
                stdout_path: streams.stdout_path,
                stderr_path: streams.stderr_path,
            })
        }
    }
}

/// Convert to a tokio command, making the child lead its own process group.
fn into_tokio(mut command: std::process::Command) -> Command {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    Command::from(command)
}
