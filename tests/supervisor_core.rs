// tests/supervisor_core.rs

mod common;
use crate::common::init_tracing;

use std::time::Duration;

use branchbuild::engine::{
    BuildOutcome, CoreCommand, CoreRuntime, SupervisorEvent, SupervisorState,
};

const QUIESCENCE: Duration = Duration::from_millis(100);

fn started_core() -> CoreRuntime {
    let mut core = CoreRuntime::new(QUIESCENCE);
    let step = core.begin();
    assert_eq!(step.commands, vec![CoreCommand::StartBuild { generation: 1 }]);
    core
}

#[test]
fn begin_starts_generation_one() {
    init_tracing();

    let core = started_core();
    assert_eq!(
        core.state(),
        SupervisorState::Building {
            generation: 1,
            finished: None
        }
    );
    assert_eq!(core.last_generation(), 1);
}

#[test]
fn begin_twice_does_not_start_a_second_build() {
    let mut core = started_core();
    let step = core.begin();
    assert!(step.commands.is_empty());
    assert!(step.keep_running);
}

#[test]
fn change_while_building_cancels_and_schedules_next_generation() {
    init_tracing();

    let mut core = started_core();
    let step = core.step(SupervisorEvent::ChangeDetected);

    assert_eq!(
        step.commands,
        vec![
            CoreCommand::CancelBuild { generation: 1 },
            CoreCommand::ScheduleRestart {
                generation: 2,
                after: QUIESCENCE
            },
        ]
    );
    assert!(step.keep_running);
    assert_eq!(core.state(), SupervisorState::PendingRestart { next: 2 });
}

#[test]
fn quiescence_elapsed_starts_the_pending_generation() {
    let mut core = started_core();
    core.step(SupervisorEvent::ChangeDetected);

    let step = core.step(SupervisorEvent::QuiescenceElapsed { generation: 2 });
    assert_eq!(step.commands, vec![CoreCommand::StartBuild { generation: 2 }]);
    assert_eq!(core.last_generation(), 2);
    assert_eq!(
        core.state(),
        SupervisorState::Building {
            generation: 2,
            finished: None
        }
    );
}

#[test]
fn changes_during_pending_restart_collapse() {
    let mut core = started_core();
    core.step(SupervisorEvent::ChangeDetected);

    for _ in 0..5 {
        let step = core.step(SupervisorEvent::ChangeDetected);
        assert!(step.commands.is_empty());
        assert!(step.keep_running);
    }

    let step = core.step(SupervisorEvent::QuiescenceElapsed { generation: 2 });
    assert_eq!(step.commands, vec![CoreCommand::StartBuild { generation: 2 }]);
}

#[test]
fn stale_quiescence_timer_is_ignored() {
    let mut core = started_core();
    core.step(SupervisorEvent::ChangeDetected);

    let step = core.step(SupervisorEvent::QuiescenceElapsed { generation: 7 });
    assert!(step.commands.is_empty());
    assert_eq!(core.state(), SupervisorState::PendingRestart { next: 2 });
}

#[test]
fn failed_build_is_recorded_and_not_retried() {
    init_tracing();

    let mut core = started_core();
    let step = core.step(SupervisorEvent::BuildFinished {
        generation: 1,
        outcome: BuildOutcome::Failed(Some(2)),
    });

    assert!(step.commands.is_empty());
    assert!(step.keep_running);
    assert_eq!(
        core.state(),
        SupervisorState::Building {
            generation: 1,
            finished: Some(BuildOutcome::Failed(Some(2)))
        }
    );
}

#[test]
fn change_after_finished_build_schedules_without_cancel() {
    let mut core = started_core();
    core.step(SupervisorEvent::BuildFinished {
        generation: 1,
        outcome: BuildOutcome::Success,
    });

    let step = core.step(SupervisorEvent::ChangeDetected);
    assert_eq!(
        step.commands,
        vec![CoreCommand::ScheduleRestart {
            generation: 2,
            after: QUIESCENCE
        }]
    );
}

#[test]
fn completion_of_retired_build_is_ignored() {
    let mut core = started_core();
    core.step(SupervisorEvent::ChangeDetected);
    core.step(SupervisorEvent::QuiescenceElapsed { generation: 2 });

    let step = core.step(SupervisorEvent::BuildFinished {
        generation: 1,
        outcome: BuildOutcome::Cancelled,
    });
    assert!(step.commands.is_empty());
    assert_eq!(
        core.state(),
        SupervisorState::Building {
            generation: 2,
            finished: None
        }
    );
}

#[test]
fn shutdown_while_building_cancels_and_stops() {
    let mut core = started_core();
    let step = core.step(SupervisorEvent::ShutdownRequested);

    assert_eq!(
        step.commands,
        vec![CoreCommand::CancelBuild { generation: 1 }, CoreCommand::Stop]
    );
    assert!(!step.keep_running);
    assert!(core.is_stopped());
}

#[test]
fn shutdown_while_pending_never_starts_the_next_build() {
    let mut core = started_core();
    core.step(SupervisorEvent::ChangeDetected);

    let step = core.step(SupervisorEvent::ShutdownRequested);
    assert_eq!(step.commands, vec![CoreCommand::Stop]);
    assert!(!step.keep_running);

    // The timer that was already armed fires late.
    let step = core.step(SupervisorEvent::QuiescenceElapsed { generation: 2 });
    assert!(step.commands.is_empty());
    assert!(!step.keep_running);
    assert!(core.is_stopped());
}

#[test]
fn stopped_is_terminal() {
    let mut core = started_core();
    core.step(SupervisorEvent::ShutdownRequested);

    for event in [
        SupervisorEvent::ChangeDetected,
        SupervisorEvent::ShutdownRequested,
        SupervisorEvent::BuildFinished {
            generation: 1,
            outcome: BuildOutcome::Success,
        },
    ] {
        let step = core.step(event);
        assert!(step.commands.is_empty());
        assert!(!step.keep_running);
    }
    assert!(core.begin().commands.is_empty());
}

#[test]
fn change_before_first_build_schedules_generation_one() {
    let mut core = CoreRuntime::new(QUIESCENCE);
    let step = core.step(SupervisorEvent::ChangeDetected);
    assert_eq!(
        step.commands,
        vec![CoreCommand::ScheduleRestart {
            generation: 1,
            after: QUIESCENCE
        }]
    );
}
