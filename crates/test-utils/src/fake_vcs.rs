use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use branchbuild::errors::VcsError;
use branchbuild::vcs::{BoxFuture, PullStatus, SourceControl};
use tokio_util::sync::CancellationToken;

/// What the next `pull` should report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedPull {
    Changed,
    UpToDate,
    Fail,
    /// Block until the pull's scope is cancelled.
    Hang,
}

/// A fake source control client that:
/// - answers pulls from a script (then `UpToDate` once the script runs out)
/// - can be told to fail clone, pull_all or checkout
/// - counts every call
#[derive(Debug, Default)]
pub struct ScriptedSourceControl {
    pulls: Mutex<VecDeque<ScriptedPull>>,
    fail_clone: AtomicBool,
    hang_clone: AtomicBool,
    fail_pull_all: AtomicBool,
    fail_checkout: AtomicBool,
    clone_calls: AtomicUsize,
    pull_all_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    checked_out: Mutex<Vec<String>>,
}

impl ScriptedSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pulls(self, pulls: impl IntoIterator<Item = ScriptedPull>) -> Self {
        self.pulls.lock().unwrap().extend(pulls);
        self
    }

    pub fn failing_clone(self) -> Self {
        self.fail_clone.store(true, Ordering::SeqCst);
        self
    }

    /// Clone blocks until its scope is cancelled.
    pub fn hanging_clone(self) -> Self {
        self.hang_clone.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_pull_all(self) -> Self {
        self.fail_pull_all.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_checkout(self) -> Self {
        self.fail_checkout.store(true, Ordering::SeqCst);
        self
    }

    /// Queue another pull result while the supervisor is running.
    pub fn push_pull(&self, pull: ScriptedPull) {
        self.pulls.lock().unwrap().push_back(pull);
    }

    pub fn clone_calls(&self) -> usize {
        self.clone_calls.load(Ordering::SeqCst)
    }

    pub fn pull_all_calls(&self) -> usize {
        self.pull_all_calls.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    pub fn checked_out(&self) -> Vec<String> {
        self.checked_out.lock().unwrap().clone()
    }

    fn scripted_failure(op: &'static str) -> VcsError {
        VcsError::CommandFailed {
            op,
            code: Some(1),
            detail: "scripted failure".to_string(),
        }
    }
}

impl SourceControl for ScriptedSourceControl {
    fn clone_repo(&self, scope: CancellationToken) -> BoxFuture<'_, Result<(), VcsError>> {
        Box::pin(async move {
            self.clone_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang_clone.load(Ordering::SeqCst) {
                scope.cancelled().await;
                return Err(VcsError::Cancelled { op: "clone" });
            }
            if self.fail_clone.load(Ordering::SeqCst) {
                return Err(Self::scripted_failure("clone"));
            }
            Ok(())
        })
    }

    fn pull_all(&self, _scope: CancellationToken) -> BoxFuture<'_, Result<PullStatus, VcsError>> {
        Box::pin(async move {
            self.pull_all_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_pull_all.load(Ordering::SeqCst) {
                return Err(Self::scripted_failure("pull_all"));
            }
            Ok(PullStatus::UpToDate)
        })
    }

    fn pull<'a>(
        &'a self,
        scope: CancellationToken,
        _branch: &'a str,
    ) -> BoxFuture<'a, Result<PullStatus, VcsError>> {
        Box::pin(async move {
            self.pull_calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .pulls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(ScriptedPull::UpToDate);

            match next {
                ScriptedPull::Changed => Ok(PullStatus::Changed),
                ScriptedPull::UpToDate => Ok(PullStatus::UpToDate),
                ScriptedPull::Fail => Err(Self::scripted_failure("pull")),
                ScriptedPull::Hang => {
                    scope.cancelled().await;
                    Err(VcsError::Cancelled { op: "pull" })
                }
            }
        })
    }

    fn checkout<'a>(
        &'a self,
        _scope: CancellationToken,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<(), VcsError>> {
        Box::pin(async move {
            self.checked_out.lock().unwrap().push(branch.to_string());
            if self.fail_checkout.load(Ordering::SeqCst) {
                return Err(VcsError::UnknownBranch(branch.to_string()));
            }
            Ok(())
        })
    }
}
