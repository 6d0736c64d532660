// src/exec/terminate.rs

//! Stopping a child process together with everything it spawned.
//!
//! Commands are started as leaders of their own process group, so a build
//! tool's compiler children can be signalled in one go. Termination is
//! SIGTERM to the group, a bounded wait, then SIGKILL.

use std::io;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Terminate `child` and its process group, waiting at most `grace` before
/// escalating to SIGKILL. Returns once the child has been reaped.
pub async fn terminate(child: &mut Child, grace: Duration) -> io::Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;

        if let Some(pid) = child.id() {
            signal_group(pid, Signal::SIGTERM);

            match timeout(grace, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    debug!(pid, ?status, "process exited after SIGTERM");
                    // Anything left in the group outlived its leader.
                    signal_group(pid, Signal::SIGKILL);
                    return Ok(());
                }
                Err(_) => {
                    warn!(pid, ?grace, "process ignored SIGTERM; sending SIGKILL");
                    signal_group(pid, Signal::SIGKILL);
                }
            }
        }
    }

    match child.try_wait()? {
        Some(_) => Ok(()),
        None => child.kill().await,
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };

    // ESRCH just means the group is already gone.
    if let Err(e) = killpg(Pid::from_raw(raw), signal) {
        debug!(pid, ?signal, error = %e, "signalling process group failed");
    }
}
