// src/engine/poller.rs

//! Change poller.
//!
//! Pulls the tracked branch on a fixed cadence and fires the restart
//! trigger when the pull moved the tree. Pull errors and timeouts are logged
//! and polling continues; the next tick is the retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::deadline_after;
use crate::engine::trigger::{RestartTrigger, TriggerOutcome};
use crate::errors::VcsError;
use crate::vcs::{PullStatus, SourceControl};

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Changed,
    Unchanged,
    Failed,
    TimedOut,
    Cancelled,
}

pub struct ChangePoller<V: SourceControl> {
    vcs: Arc<V>,
    branch: String,
    interval: Duration,
    pull_timeout: Duration,
    trigger: RestartTrigger,
}

impl<V: SourceControl> ChangePoller<V> {
    pub fn new(
        vcs: Arc<V>,
        branch: impl Into<String>,
        interval: Duration,
        pull_timeout: Duration,
        trigger: RestartTrigger,
    ) -> Self {
        Self {
            vcs,
            branch: branch.into(),
            interval,
            pull_timeout,
            trigger,
        }
    }

    /// Run the poller on its own task until `scope` is cancelled.
    pub fn spawn(self, scope: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(scope))
    }

    pub async fn run(self, scope: CancellationToken) {
        info!(branch = %self.branch, interval = ?self.interval, "change poller started");

        // First poll one interval after start: setup has just pulled.
        let mut ticker = interval_at(deadline_after(self.interval), self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.poll_once(&scope).await {
                PollOutcome::Changed => match self.trigger.fire() {
                    TriggerOutcome::Fired => debug!("restart requested"),
                    TriggerOutcome::AlreadyPending => debug!("restart already pending"),
                    TriggerOutcome::Closed => {
                        debug!("supervisor no longer listening; poller exiting");
                        break;
                    }
                },
                PollOutcome::Cancelled => break,
                PollOutcome::Unchanged | PollOutcome::Failed | PollOutcome::TimedOut => {}
            }
        }

        info!("change poller stopped");
    }

    /// Pull once in a child of `scope`, bounded by the pull timeout.
    pub async fn poll_once(&self, scope: &CancellationToken) -> PollOutcome {
        if scope.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        let pull_scope = scope.child_token();
        let mut pull = self.vcs.pull(pull_scope.clone(), &self.branch);

        let finished = tokio::select! {
            res = &mut pull => Some(res),
            _ = sleep(self.pull_timeout) => None,
        };

        let Some(result) = finished else {
            pull_scope.cancel();
            // Let the client reap the git process before moving on.
            let _ = pull.await;
            warn!(
                branch = %self.branch,
                timeout = ?self.pull_timeout,
                "pull timed out; will retry on next tick"
            );
            return PollOutcome::TimedOut;
        };

        match result {
            Ok(PullStatus::Changed) => {
                info!(branch = %self.branch, "new commits pulled");
                PollOutcome::Changed
            }
            Ok(PullStatus::UpToDate) => {
                debug!(branch = %self.branch, "branch up to date");
                PollOutcome::Unchanged
            }
            Err(VcsError::Cancelled { .. }) if scope.is_cancelled() => PollOutcome::Cancelled,
            Err(e) => {
                warn!(branch = %self.branch, error = %e, "pull failed; will retry on next tick");
                PollOutcome::Failed
            }
        }
    }
}
