// src/engine/runtime.rs

use std::fmt;
use std::future::pending;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::build::BuildRunner;
use crate::errors::{BuildError, Result, VcsError};
use crate::vcs::SourceControl;

use super::core::CoreRuntime;
use super::poller::ChangePoller;
use super::trigger::{RestartSignals, RestartTrigger, restart_channel};
use super::{
    BuildOutcome, CoreCommand, Generation, SupervisorEvent, SupervisorSettings, deadline_after,
};

/// A build scope and the task running in it.
struct ActiveBuild {
    generation: Generation,
    scope: CancellationToken,
    /// Taken once the task's result has been observed.
    handle: Option<JoinHandle<BuildOutcome>>,
}

/// Owns the current build scope and drives [`CoreRuntime`] with events from
/// the run scope, the change poller, quiescence timers and build tasks.
///
/// This is a pure IO shell: every decision about when to start, cancel or
/// restart a build is made by the core.
pub struct Supervisor<V: SourceControl, B: BuildRunner> {
    core: CoreRuntime,
    vcs: Arc<V>,
    builder: Arc<B>,
    settings: SupervisorSettings,
    run_scope: CancellationToken,
    trigger: Option<RestartTrigger>,
    signals: RestartSignals,
    current: Option<ActiveBuild>,
    /// Cancelled builds that may still be terminating.
    retired: Vec<ActiveBuild>,
    restart_at: Option<(Generation, Instant)>,
}

impl<V: SourceControl, B: BuildRunner> fmt::Debug for Supervisor<V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("settings", &self.settings)
            .field("current", &self.current.as_ref().map(|b| b.generation))
            .field("retired", &self.retired.len())
            .finish_non_exhaustive()
    }
}

impl<V: SourceControl, B: BuildRunner> Supervisor<V, B> {
    pub fn new(
        vcs: Arc<V>,
        builder: Arc<B>,
        settings: SupervisorSettings,
        run_scope: CancellationToken,
    ) -> Self {
        let (trigger, signals) = restart_channel();
        Self {
            core: CoreRuntime::new(settings.quiescence),
            vcs,
            builder,
            settings,
            run_scope,
            trigger: Some(trigger),
            signals,
            current: None,
            retired: Vec::new(),
            restart_at: None,
        }
    }

    /// Set up the working copy, then supervise builds until the run scope
    /// is cancelled.
    ///
    /// Returns an error only for fatal setup failures (clone, checkout).
    /// An interrupt at any point is a clean stop.
    pub async fn run(mut self) -> Result<()> {
        info!(branch = %self.settings.branch, command = %self.settings.command, "branchbuild supervisor started");

        self.setup().await?;
        if self.run_scope.is_cancelled() {
            info!("interrupted during setup; stopping");
            return Ok(());
        }

        let poller = match self.trigger.take() {
            Some(trigger) => {
                let poller = ChangePoller::new(
                    Arc::clone(&self.vcs),
                    self.settings.branch.clone(),
                    self.settings.poll_interval,
                    self.settings.pull_timeout,
                    trigger,
                );
                Some(poller.spawn(self.run_scope.child_token()))
            }
            None => None,
        };

        let step = self.core.begin();
        for command in step.commands {
            self.execute_command(command).await;
        }

        loop {
            let event = tokio::select! {
                biased;

                _ = self.run_scope.cancelled() => SupervisorEvent::ShutdownRequested,

                Some(_) = self.signals.recv() => SupervisorEvent::ChangeDetected,

                generation = quiescence_elapsed(&mut self.restart_at) => {
                    SupervisorEvent::QuiescenceElapsed { generation }
                }

                (generation, outcome) = build_finished(&mut self.current) => {
                    SupervisorEvent::BuildFinished { generation, outcome }
                }
            };

            debug!(?event, "supervisor received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command).await;
            }

            if !step.keep_running {
                break;
            }
        }

        self.wind_down(poller).await;
        info!("supervisor stopped");
        Ok(())
    }

    /// Clone, best-effort pull of every branch, then checkout.
    async fn setup(&self) -> Result<()> {
        let scope = self.run_scope.child_token();

        if let Err(e) = self.vcs.clone_repo(scope.clone()).await {
            return self.fatal_unless_interrupted("clone", e);
        }

        match self.vcs.pull_all(scope.clone()).await {
            Ok(status) => info!(?status, "initial pull finished"),
            Err(_) if self.run_scope.is_cancelled() => return Ok(()),
            Err(e) => warn!(error = %e, "initial pull failed; continuing"),
        }

        if let Err(e) = self.vcs.checkout(scope, &self.settings.branch).await {
            return self.fatal_unless_interrupted("checkout", e);
        }

        Ok(())
    }

    fn fatal_unless_interrupted(&self, op: &str, err: VcsError) -> Result<()> {
        if self.run_scope.is_cancelled() {
            debug!(op, error = %err, "setup step ended by shutdown");
            return Ok(());
        }
        error!(op, error = %err, "setup failed");
        Err(err.into())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::StartBuild { generation } => self.start_build(generation).await,
            CoreCommand::CancelBuild { generation } => self.cancel_build(generation),
            CoreCommand::ScheduleRestart { generation, after } => {
                debug!(generation, ?after, "restart scheduled");
                self.restart_at = Some((generation, deadline_after(after)));
            }
            CoreCommand::Stop => {
                self.restart_at = None;
                info!("core issued Stop");
            }
        }
    }

    async fn start_build(&mut self, generation: Generation) {
        // The working copy has a single writer: finish reaping first.
        self.reap_retired().await;

        if let Some(previous) = self.current.take() {
            previous.scope.cancel();
            self.retired.push(previous);
            self.reap_retired().await;
        }

        // Reaping can take up to the kill grace; an interrupt may land meanwhile.
        if self.run_scope.is_cancelled() {
            info!(generation, "shutdown requested while reaping; not starting build");
            return;
        }

        let scope = self.run_scope.child_token();
        let builder = Arc::clone(&self.builder);
        let command = self.settings.command.clone();
        let build_scope = scope.clone();

        info!(generation, command = %command, "starting build");

        let handle = tokio::spawn(async move {
            match builder.run(build_scope, &command).await {
                Ok(()) => {
                    info!(generation, "build succeeded");
                    BuildOutcome::Success
                }
                Err(BuildError::Cancelled) => {
                    info!(generation, "build cancelled");
                    BuildOutcome::Cancelled
                }
                Err(e) => {
                    let code = match &e {
                        BuildError::Failed { code, .. } => *code,
                        _ => None,
                    };
                    warn!(generation, error = %e, "build failed");
                    BuildOutcome::Failed(code)
                }
            }
        });

        self.current = Some(ActiveBuild {
            generation,
            scope,
            handle: Some(handle),
        });
    }

    fn cancel_build(&mut self, generation: Generation) {
        match self.current.take() {
            Some(build) if build.generation == generation => {
                debug!(generation, "cancelling build scope");
                build.scope.cancel();
                self.retired.push(build);
            }
            other => {
                debug!(generation, "cancel for a build that is not current");
                self.current = other;
            }
        }
    }

    async fn reap_retired(&mut self) {
        for mut build in self.retired.drain(..) {
            let Some(handle) = build.handle.take() else {
                continue;
            };
            match handle.await {
                Ok(outcome) => {
                    debug!(generation = build.generation, ?outcome, "retired build finished")
                }
                Err(e) => {
                    warn!(generation = build.generation, error = %e, "build task did not finish cleanly")
                }
            }
        }
    }

    async fn wind_down(&mut self, poller: Option<JoinHandle<()>>) {
        // Covers loop exits that did not come from the run scope itself.
        self.run_scope.cancel();

        if let Some(build) = self.current.take() {
            build.scope.cancel();
            self.retired.push(build);
        }
        self.reap_retired().await;

        if let Some(poller) = poller {
            if let Err(e) = poller.await {
                warn!(error = %e, "change poller did not finish cleanly");
            }
        }
    }
}

/// Resolves when the scheduled restart is due, clearing it.
/// Pending forever when nothing is scheduled. Cancel safe.
async fn quiescence_elapsed(restart_at: &mut Option<(Generation, Instant)>) -> Generation {
    match *restart_at {
        Some((generation, deadline)) => {
            sleep_until(deadline).await;
            *restart_at = None;
            generation
        }
        None => pending().await,
    }
}

/// Resolves with the outcome of the current build task, at most once per
/// build. Pending forever when there is none. Cancel safe.
async fn build_finished(current: &mut Option<ActiveBuild>) -> (Generation, BuildOutcome) {
    let Some(build) = current.as_mut() else {
        return pending().await;
    };
    let Some(handle) = build.handle.as_mut() else {
        return pending().await;
    };

    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(generation = build.generation, error = %e, "build task panicked");
            BuildOutcome::Failed(None)
        }
    };
    build.handle = None;
    (build.generation, outcome)
}
