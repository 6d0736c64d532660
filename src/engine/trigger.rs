// src/engine/trigger.rs

//! Edge-triggered "rebuild now" signal between the poller and the
//! supervisor.
//!
//! The channel holds at most one signal. Firing while one is already queued
//! is a no-op, so a burst of changes reaches the supervisor as one.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Content-free change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal;

/// Result of [`RestartTrigger::fire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Fired,
    /// A signal was already waiting; this one merged into it.
    AlreadyPending,
    /// The supervisor is gone.
    Closed,
}

#[derive(Debug, Clone)]
pub struct RestartTrigger {
    tx: mpsc::Sender<ChangeSignal>,
}

#[derive(Debug)]
pub struct RestartSignals {
    rx: mpsc::Receiver<ChangeSignal>,
}

pub fn restart_channel() -> (RestartTrigger, RestartSignals) {
    let (tx, rx) = mpsc::channel(1);
    (RestartTrigger { tx }, RestartSignals { rx })
}

impl RestartTrigger {
    /// Request a restart. Never blocks.
    pub fn fire(&self) -> TriggerOutcome {
        match self.tx.try_send(ChangeSignal) {
            Ok(()) => TriggerOutcome::Fired,
            Err(TrySendError::Full(_)) => TriggerOutcome::AlreadyPending,
            Err(TrySendError::Closed(_)) => TriggerOutcome::Closed,
        }
    }
}

impl RestartSignals {
    /// Wait for the next signal. `None` once every trigger is dropped.
    /// Cancel safe.
    pub async fn recv(&mut self) -> Option<ChangeSignal> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_fire_collapses_into_first() {
        let (trigger, mut signals) = restart_channel();

        assert_eq!(trigger.fire(), TriggerOutcome::Fired);
        assert_eq!(trigger.fire(), TriggerOutcome::AlreadyPending);
        assert_eq!(trigger.clone().fire(), TriggerOutcome::AlreadyPending);

        assert_eq!(signals.recv().await, Some(ChangeSignal));
        assert_eq!(trigger.fire(), TriggerOutcome::Fired);
    }

    #[tokio::test]
    async fn fire_after_supervisor_dropped_reports_closed() {
        let (trigger, signals) = restart_channel();
        drop(signals);
        assert_eq!(trigger.fire(), TriggerOutcome::Closed);
    }
}
