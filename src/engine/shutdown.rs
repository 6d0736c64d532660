// src/engine/shutdown.rs

//! Interrupt listener.
//!
//! On Unix SIGINT, SIGTERM and SIGQUIT are handled, with
//! [`tokio::signal::ctrl_c`] awaited as well. Elsewhere only Ctrl-C is.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Cancel `run_scope` on the first termination signal.
///
/// The task exits quietly if the run scope ends some other way. If signal
/// handlers cannot be installed the run scope is cancelled as well, since
/// the process could otherwise not be stopped cleanly.
pub fn spawn_interrupt_listener(run_scope: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = run_scope.cancelled() => {}
            res = wait_for_shutdown_signal() => {
                match res {
                    Ok(()) => info!("termination signal received; shutting down"),
                    Err(e) => error!(error = %e, "failed to install signal handlers; shutting down"),
                }
                run_scope.cancel();
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_exits_when_run_scope_ends() {
        let run_scope = CancellationToken::new();
        let listener = spawn_interrupt_listener(run_scope.clone());

        run_scope.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), listener)
            .await
            .expect("listener should exit")
            .expect("listener should not panic");
    }
}
