// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::core::SupervisorState;
use crate::engine::{BuildOutcome, Generation};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Create a new build scope and run the build command in it.
    StartBuild { generation: Generation },
    /// Cancel the build scope of `generation`.
    CancelBuild { generation: Generation },
    /// Report `QuiescenceElapsed { generation }` once `after` has passed.
    ScheduleRestart {
        generation: Generation,
        after: Duration,
    },
    /// Wind everything down; no further builds.
    Stop,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub(crate) fn stopped() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: false,
        }
    }
}

/// Handle a change signal.
///
/// - While building, the current scope is cancelled and a restart is
///   scheduled for the next generation.
/// - While a restart is already pending the signal collapses into it.
/// - Before the first build it schedules one like any other restart.
pub fn handle_change_detected(
    state: &mut SupervisorState,
    last_generation: Generation,
    quiescence: Duration,
) -> CoreStep {
    match *state {
        SupervisorState::Idle => {
            let next = last_generation + 1;
            *state = SupervisorState::PendingRestart { next };
            CoreStep::with(vec![CoreCommand::ScheduleRestart {
                generation: next,
                after: quiescence,
            }])
        }
        SupervisorState::Building {
            generation,
            finished,
        } => {
            let next = generation + 1;
            let mut commands = Vec::with_capacity(2);
            if finished.is_none() {
                info!(generation, "change detected; cancelling current build");
                commands.push(CoreCommand::CancelBuild { generation });
            } else {
                info!(generation, "change detected; scheduling rebuild");
            }
            commands.push(CoreCommand::ScheduleRestart {
                generation: next,
                after: quiescence,
            });
            *state = SupervisorState::PendingRestart { next };
            CoreStep::with(commands)
        }
        SupervisorState::PendingRestart { next } => {
            debug!(next, "change detected while restart pending; collapsing");
            CoreStep::idle()
        }
        SupervisorState::Stopped => CoreStep::stopped(),
    }
}

/// Handle the end of a quiescence delay. Only the delay for the pending
/// generation starts a build; anything else is stale.
pub fn handle_quiescence_elapsed(state: &mut SupervisorState, generation: Generation) -> CoreStep {
    match *state {
        SupervisorState::PendingRestart { next } if next == generation => {
            *state = SupervisorState::Building {
                generation,
                finished: None,
            };
            CoreStep::with(vec![CoreCommand::StartBuild { generation }])
        }
        SupervisorState::Stopped => CoreStep::stopped(),
        _ => {
            debug!(generation, "ignoring stale quiescence timer");
            CoreStep::idle()
        }
    }
}

/// Handle a finished build task.
///
/// A failed build is not retried; the loop waits for the next change.
pub fn handle_build_finished(
    state: &mut SupervisorState,
    generation: Generation,
    outcome: BuildOutcome,
) -> CoreStep {
    match state {
        SupervisorState::Building {
            generation: current,
            finished,
        } if *current == generation && finished.is_none() => {
            match outcome {
                BuildOutcome::Success => info!(generation, "build up to date"),
                BuildOutcome::Failed(code) => {
                    warn!(generation, exit_code = ?code, "build failed; waiting for next change")
                }
                BuildOutcome::Cancelled => debug!(generation, "build cancelled"),
            }
            *finished = Some(outcome);
            CoreStep::idle()
        }
        SupervisorState::Stopped => CoreStep::stopped(),
        _ => {
            debug!(generation, ?outcome, "ignoring completion of a retired build");
            CoreStep::idle()
        }
    }
}

/// Handle a shutdown request. Always terminal.
pub fn handle_shutdown(state: &mut SupervisorState) -> CoreStep {
    let mut commands = Vec::new();

    match *state {
        SupervisorState::Building {
            generation,
            finished: None,
        } => {
            info!(generation, "shutdown requested; cancelling current build");
            commands.push(CoreCommand::CancelBuild { generation });
        }
        SupervisorState::PendingRestart { next } => {
            info!(next, "shutdown requested; dropping pending restart");
        }
        SupervisorState::Stopped => return CoreStep::stopped(),
        _ => info!("shutdown requested"),
    }

    *state = SupervisorState::Stopped;
    commands.push(CoreCommand::Stop);

    CoreStep {
        commands,
        keep_running: false,
    }
}
