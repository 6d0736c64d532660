use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use branchbuild::build::{BuildCommand, BuildRunner};
use branchbuild::errors::BuildError;
use branchbuild::vcs::BoxFuture;
use tokio_util::sync::CancellationToken;

/// How one fake build behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildScript {
    Succeed,
    Fail(i32),
    /// Keep "building" until the scope is cancelled.
    RunUntilCancelled,
    /// Succeed after a delay unless cancelled first.
    SucceedAfter(Duration),
    /// Wait for cancellation, then take this long to wind down.
    LingerAfterCancel(Duration),
}

/// A fake build runner that:
/// - follows a script per build (then a default script)
/// - records how many builds started, finished, and ran concurrently
#[derive(Debug)]
pub struct RecordingBuildRunner {
    scripts: Mutex<VecDeque<BuildScript>>,
    default_script: BuildScript,
    starts: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl RecordingBuildRunner {
    pub fn new(default_script: BuildScript) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            default_script,
            starts: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Scripts for the first builds, in order.
    pub fn with_scripts(self, scripts: impl IntoIterator<Item = BuildScript>) -> Self {
        self.scripts.lock().unwrap().extend(scripts);
        self
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Builds currently inside `run`.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl BuildRunner for RecordingBuildRunner {
    fn run<'a>(
        &'a self,
        scope: CancellationToken,
        command: &'a BuildCommand,
    ) -> BoxFuture<'a, Result<(), BuildError>> {
        Box::pin(async move {
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default_script);

            self.commands.lock().unwrap().push(command.to_string());
            self.starts.fetch_add(1, Ordering::SeqCst);
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(live, Ordering::SeqCst);

            let result = match script {
                BuildScript::Succeed => Ok(()),
                BuildScript::Fail(code) => Err(BuildError::Failed {
                    command: command.to_string(),
                    code: Some(code),
                }),
                BuildScript::RunUntilCancelled => {
                    scope.cancelled().await;
                    Err(BuildError::Cancelled)
                }
                BuildScript::LingerAfterCancel(linger) => {
                    scope.cancelled().await;
                    tokio::time::sleep(linger).await;
                    Err(BuildError::Cancelled)
                }
                BuildScript::SucceedAfter(delay) => {
                    tokio::select! {
                        _ = scope.cancelled() => Err(BuildError::Cancelled),
                        _ = tokio::time::sleep(delay) => Ok(()),
                    }
                }
            };

            match &result {
                Ok(()) => self.succeeded.fetch_add(1, Ordering::SeqCst),
                Err(BuildError::Cancelled) => self.cancelled.fetch_add(1, Ordering::SeqCst),
                Err(_) => self.failed.fetch_add(1, Ordering::SeqCst),
            };
            self.live.fetch_sub(1, Ordering::SeqCst);

            result
        })
    }
}
