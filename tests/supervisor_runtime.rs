// tests/supervisor_runtime.rs

mod common;
use crate::common::{TestResult, eventually, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use branchbuild::engine::{Supervisor, SupervisorSettings};
use branchbuild::errors::{BranchbuildError, VcsError};
use branchbuild_test_utils::builders::SettingsBuilder;
use branchbuild_test_utils::{
    BuildScript, RecordingBuildRunner, ScriptedPull, ScriptedSourceControl,
};

struct Harness {
    vcs: Arc<ScriptedSourceControl>,
    builder: Arc<RecordingBuildRunner>,
    run_scope: CancellationToken,
    handle: JoinHandle<branchbuild::errors::Result<()>>,
}

fn spawn_supervisor(
    vcs: ScriptedSourceControl,
    builder: RecordingBuildRunner,
    settings: SupervisorSettings,
) -> Harness {
    let vcs = Arc::new(vcs);
    let builder = Arc::new(builder);
    let run_scope = CancellationToken::new();

    let supervisor = Supervisor::new(
        Arc::clone(&vcs),
        Arc::clone(&builder),
        settings,
        run_scope.clone(),
    );
    let handle = tokio::spawn(supervisor.run());

    Harness {
        vcs,
        builder,
        run_scope,
        handle,
    }
}

#[tokio::test]
async fn failed_first_build_then_change_rebuilds_successfully() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([ScriptedPull::UpToDate, ScriptedPull::Changed]),
        RecordingBuildRunner::new(BuildScript::Succeed).with_scripts([BuildScript::Fail(2)]),
        SettingsBuilder::new().branch("main").build(),
    );

    with_timeout(eventually(|| h.builder.succeeded() == 1)).await;

    assert_eq!(h.vcs.clone_calls(), 1);
    assert_eq!(h.vcs.pull_all_calls(), 1);
    assert_eq!(h.vcs.checked_out(), vec!["main".to_string()]);
    assert_eq!(h.builder.failed(), 1);
    assert_eq!(h.builder.starts(), 2);
    assert!(h.vcs.pull_calls() >= 2);

    h.run_scope.cancel();
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn interrupt_cancels_running_build_and_stops() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new(),
        RecordingBuildRunner::new(BuildScript::RunUntilCancelled),
        SettingsBuilder::new().build(),
    );

    with_timeout(eventually(|| h.builder.live() == 1)).await;

    h.run_scope.cancel();
    with_timeout(h.handle).await??;

    assert_eq!(h.builder.starts(), 1);
    assert_eq!(h.builder.cancelled(), 1);
    assert_eq!(h.builder.live(), 0);
    Ok(())
}

#[tokio::test]
async fn change_mid_build_cancels_then_restarts() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([ScriptedPull::Changed]),
        RecordingBuildRunner::new(BuildScript::RunUntilCancelled),
        SettingsBuilder::new().build(),
    );

    with_timeout(eventually(|| h.builder.starts() == 2)).await;

    assert_eq!(h.builder.cancelled(), 1);
    assert_eq!(h.builder.max_live(), 1);

    h.run_scope.cancel();
    with_timeout(h.handle).await??;
    assert_eq!(h.builder.cancelled(), 2);
    Ok(())
}

#[tokio::test]
async fn burst_of_changes_within_quiescence_restarts_once() -> TestResult {
    init_tracing();

    // Polls every 10ms, quiescence 150ms: the three changes land inside a
    // single quiescence window.
    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([
            ScriptedPull::Changed,
            ScriptedPull::Changed,
            ScriptedPull::Changed,
        ]),
        RecordingBuildRunner::new(BuildScript::RunUntilCancelled),
        SettingsBuilder::new()
            .poll_interval(Duration::from_millis(10))
            .quiescence(Duration::from_millis(150))
            .build(),
    );

    with_timeout(eventually(|| h.builder.starts() == 2)).await;
    // Let any stray restart show up.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(h.builder.starts(), 2);
    assert_eq!(h.builder.max_live(), 1);

    h.run_scope.cancel();
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn never_more_than_one_build_under_constant_changes() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls(std::iter::repeat_n(ScriptedPull::Changed, 30)),
        RecordingBuildRunner::new(BuildScript::SucceedAfter(Duration::from_millis(15))),
        SettingsBuilder::new()
            .poll_interval(Duration::from_millis(5))
            .quiescence(Duration::from_millis(5))
            .build(),
    );

    with_timeout(eventually(|| h.builder.starts() >= 5)).await;

    h.run_scope.cancel();
    with_timeout(h.handle).await??;

    assert_eq!(h.builder.max_live(), 1);
    assert_eq!(h.builder.live(), 0);
    Ok(())
}

#[tokio::test]
async fn pull_failures_do_not_stop_polling() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([
            ScriptedPull::Fail,
            ScriptedPull::Fail,
            ScriptedPull::Changed,
        ]),
        RecordingBuildRunner::new(BuildScript::Succeed),
        SettingsBuilder::new().build(),
    );

    with_timeout(eventually(|| h.builder.starts() == 2)).await;
    assert!(h.vcs.pull_calls() >= 3);

    h.run_scope.cancel();
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn failed_initial_pull_all_is_not_fatal() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().failing_pull_all(),
        RecordingBuildRunner::new(BuildScript::Succeed),
        SettingsBuilder::new().build(),
    );

    with_timeout(eventually(|| h.builder.succeeded() == 1)).await;

    h.run_scope.cancel();
    with_timeout(h.handle).await??;
    Ok(())
}

#[tokio::test]
async fn clone_failure_is_fatal_and_nothing_builds() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().failing_clone(),
        RecordingBuildRunner::new(BuildScript::Succeed),
        SettingsBuilder::new().build(),
    );

    let result = with_timeout(h.handle).await?;
    assert!(matches!(
        result,
        Err(BranchbuildError::Vcs(VcsError::CommandFailed { op: "clone", .. }))
    ));
    assert_eq!(h.vcs.checked_out(), Vec::<String>::new());
    assert_eq!(h.builder.starts(), 0);
    Ok(())
}

#[tokio::test]
async fn checkout_failure_is_fatal_and_nothing_builds() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().failing_checkout(),
        RecordingBuildRunner::new(BuildScript::Succeed),
        SettingsBuilder::new().branch("nope").build(),
    );

    let result = with_timeout(h.handle).await?;
    match result {
        Err(BranchbuildError::Vcs(VcsError::UnknownBranch(branch))) => assert_eq!(branch, "nope"),
        other => panic!("expected unknown branch error, got {other:?}"),
    }
    assert_eq!(h.builder.starts(), 0);
    assert_eq!(h.vcs.pull_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn interrupt_during_setup_is_a_clean_stop() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().hanging_clone(),
        RecordingBuildRunner::new(BuildScript::Succeed),
        SettingsBuilder::new().build(),
    );

    with_timeout(eventually(|| h.vcs.clone_calls() == 1)).await;
    h.run_scope.cancel();

    with_timeout(h.handle).await??;
    assert_eq!(h.builder.starts(), 0);
    assert_eq!(h.vcs.pull_all_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn interrupt_during_pending_restart_starts_nothing_new() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([ScriptedPull::Changed]),
        RecordingBuildRunner::new(BuildScript::RunUntilCancelled),
        SettingsBuilder::new()
            .quiescence(Duration::from_secs(10))
            .build(),
    );

    // First build cancelled by the change; restart now waits 10s.
    with_timeout(eventually(|| h.builder.cancelled() == 1)).await;

    h.run_scope.cancel();
    with_timeout(h.handle).await??;

    assert_eq!(h.builder.starts(), 1);
    Ok(())
}

#[tokio::test]
async fn interrupt_while_reaping_old_build_starts_nothing_new() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([ScriptedPull::Changed]),
        RecordingBuildRunner::new(BuildScript::Succeed)
            .with_scripts([BuildScript::LingerAfterCancel(Duration::from_millis(400))]),
        SettingsBuilder::new()
            .quiescence(Duration::from_millis(10))
            .build(),
    );

    // The restart is due well before the old build finishes winding down.
    with_timeout(eventually(|| h.vcs.pull_calls() >= 1)).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.builder.live(), 1);

    h.run_scope.cancel();
    with_timeout(h.handle).await??;

    assert_eq!(h.builder.starts(), 1);
    assert_eq!(h.builder.cancelled(), 1);
    assert_eq!(h.builder.live(), 0);
    Ok(())
}

#[tokio::test]
async fn unbounded_quiescence_waits_instead_of_panicking() -> TestResult {
    init_tracing();

    let h = spawn_supervisor(
        ScriptedSourceControl::new().with_pulls([ScriptedPull::Changed]),
        RecordingBuildRunner::new(BuildScript::RunUntilCancelled),
        SettingsBuilder::new().quiescence(Duration::MAX).build(),
    );

    with_timeout(eventually(|| h.builder.cancelled() == 1)).await;
    assert!(!h.handle.is_finished());

    h.run_scope.cancel();
    with_timeout(h.handle).await??;
    assert_eq!(h.builder.starts(), 1);
    Ok(())
}
