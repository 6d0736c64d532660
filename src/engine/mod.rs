// src/engine/mod.rs

//! Supervision engine for branchbuild.
//!
//! This module ties together:
//! - the restart state machine (`Idle`, `Building`, `PendingRestart`, `Stopped`)
//! - the change poller that pulls the tracked branch on a fixed cadence
//! - the interrupt listener that cancels the run scope on SIGINT/SIGTERM
//! - the async loop that owns the current build scope
//!
//! The pure core state machine lives in [`core`] and [`event_handlers`];
//! the async/IO shell is implemented in [`runtime`].

use std::time::Duration;

use crate::build::BuildCommand;

/// Sequence number of a build scope. The first build is generation 1.
pub type Generation = u64;

/// How a build scope ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    /// Non-zero exit, or the command could not be started (`None`).
    Failed(Option<i32>),
    Cancelled,
}

/// Events flowing into the core from the poller, timers, build tasks and
/// the run scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// The poller saw new commits on the tracked branch.
    ChangeDetected,
    /// The quiescence delay before `generation` has elapsed.
    QuiescenceElapsed { generation: Generation },
    /// The build task for `generation` returned.
    BuildFinished {
        generation: Generation,
        outcome: BuildOutcome,
    },
    /// The run scope was cancelled.
    ShutdownRequested,
}

/// Settings the supervisor loop and poller run with.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub branch: String,
    pub command: BuildCommand,
    pub poll_interval: Duration,
    pub pull_timeout: Duration,
    pub quiescence: Duration,
}

/// `Instant::now() + after`, saturating to a far-future deadline instead of
/// panicking on overflow.
pub(crate) fn deadline_after(after: Duration) -> tokio::time::Instant {
    const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

    let now = tokio::time::Instant::now();
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

pub mod core;
pub mod event_handlers;
pub mod poller;
pub mod runtime;
pub mod shutdown;
pub mod trigger;

pub use self::core::{CoreRuntime, SupervisorState};
pub use event_handlers::{CoreCommand, CoreStep};
pub use poller::{ChangePoller, PollOutcome};
pub use runtime::Supervisor;
pub use shutdown::{spawn_interrupt_listener, wait_for_shutdown_signal};
pub use trigger::{ChangeSignal, RestartSignals, RestartTrigger, TriggerOutcome, restart_channel};
