// src/engine/core.rs

//! Pure core state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`SupervisorEvent`]s and produces:
//! - an updated supervisor state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Supervisor`) is responsible for:
//! - creating and cancelling build scopes
//! - running quiescence timers
//! - reading change signals and the run scope
//!
//! The core has no channels, tokens, timers or processes, so every
//! transition can be tested directly.

use std::time::Duration;

use crate::engine::event_handlers::{
    CoreCommand, CoreStep, handle_build_finished, handle_change_detected,
    handle_quiescence_elapsed, handle_shutdown,
};
use crate::engine::{BuildOutcome, Generation, SupervisorEvent};

/// Where the supervisor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Setup done, first build not started yet.
    Idle,
    /// `generation` is the current build scope. `finished` is set once its
    /// task has returned; the scope stays current until the next change.
    Building {
        generation: Generation,
        finished: Option<BuildOutcome>,
    },
    /// The previous scope was cancelled; `next` starts after quiescence.
    PendingRestart { next: Generation },
    /// Terminal.
    Stopped,
}

#[derive(Debug)]
pub struct CoreRuntime {
    state: SupervisorState,
    quiescence: Duration,
    last_generation: Generation,
}

impl CoreRuntime {
    pub fn new(quiescence: Duration) -> Self {
        Self {
            state: SupervisorState::Idle,
            quiescence,
            last_generation: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Highest generation handed out so far (0 before the first build).
    pub fn last_generation(&self) -> Generation {
        self.last_generation
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SupervisorState::Stopped
    }

    /// Start the first build. Only meaningful from `Idle`.
    pub fn begin(&mut self) -> CoreStep {
        match self.state {
            SupervisorState::Idle => {
                let generation = self.last_generation + 1;
                self.last_generation = generation;
                self.state = SupervisorState::Building {
                    generation,
                    finished: None,
                };
                CoreStep {
                    commands: vec![CoreCommand::StartBuild { generation }],
                    keep_running: true,
                }
            }
            SupervisorState::Stopped => CoreStep::stopped(),
            _ => CoreStep::idle(),
        }
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        let step = match event {
            SupervisorEvent::ChangeDetected => {
                handle_change_detected(&mut self.state, self.last_generation, self.quiescence)
            }
            SupervisorEvent::QuiescenceElapsed { generation } => {
                handle_quiescence_elapsed(&mut self.state, generation)
            }
            SupervisorEvent::BuildFinished {
                generation,
                outcome,
            } => handle_build_finished(&mut self.state, generation, outcome),
            SupervisorEvent::ShutdownRequested => handle_shutdown(&mut self.state),
        };

        for command in &step.commands {
            if let CoreCommand::StartBuild { generation } = command {
                self.last_generation = self.last_generation.max(*generation);
            }
        }

        step
    }
}
