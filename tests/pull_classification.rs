// tests/pull_classification.rs

use branchbuild::errors::VcsError;
use branchbuild::vcs::{PullStatus, classify_checkout, classify_clone, classify_pull};

const FAST_FORWARD: &str = "\
From github.com:acme/widgets
 * branch            main       -> FETCH_HEAD
Updating 3f2a1bc..9e8d7f6
Fast-forward
 src/lib.rs | 2 +-
 1 file changed, 1 insertion(+), 1 deletion(-)
";

const MERGE: &str = "\
Merge made by the 'ort' strategy.
 README.md | 1 +
 1 file changed, 1 insertion(+)
";

#[test]
fn fast_forward_output_is_changed() {
    let status = classify_pull("pull", true, Some(0), FAST_FORWARD, "").unwrap();
    assert_eq!(status, PullStatus::Changed);
    assert!(status.is_changed());
}

#[test]
fn merge_output_is_changed() {
    let status = classify_pull("pull", true, Some(0), MERGE, "").unwrap();
    assert_eq!(status, PullStatus::Changed);
}

#[test]
fn already_up_to_date_is_unchanged() {
    let status = classify_pull("pull", true, Some(0), "Already up to date.\n", "").unwrap();
    assert_eq!(status, PullStatus::UpToDate);
    assert!(!status.is_changed());
}

#[test]
fn evidence_wins_over_failed_exit() {
    let stderr = "error: cannot lock ref 'refs/remotes/origin/other'\n";
    let status = classify_pull("pull_all", false, Some(1), FAST_FORWARD, stderr).unwrap();
    assert_eq!(status, PullStatus::Changed);
}

#[test]
fn failure_without_evidence_carries_last_stderr_line() {
    let stderr = "remote: Enumerating objects\rremote: done\nfatal: Could not read from remote repository.\n";
    let err = classify_pull("pull", false, Some(128), "", stderr).unwrap_err();

    match err {
        VcsError::CommandFailed { op, code, detail } => {
            assert_eq!(op, "pull");
            assert_eq!(code, Some(128));
            assert_eq!(detail, "fatal: Could not read from remote repository.");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn clone_into_existing_destination_succeeds() {
    let stderr = "fatal: destination path 'widgets' already exists and is not an empty directory.\n";
    assert!(classify_clone(false, Some(128), stderr).is_ok());
    assert!(classify_clone(true, Some(0), "Cloning into 'widgets'...\n").is_ok());
}

#[test]
fn clone_failure_is_an_error() {
    let stderr = "fatal: repository 'nope' does not exist\n";
    let err = classify_clone(false, Some(128), stderr).unwrap_err();
    assert!(matches!(err, VcsError::CommandFailed { op: "clone", .. }));
}

#[test]
fn checkout_of_unknown_branch_is_reported() {
    let stderr = "error: pathspec 'nope' did not match any file(s) known to git\n";
    let err = classify_checkout("nope", false, Some(1), stderr).unwrap_err();
    assert!(matches!(err, VcsError::UnknownBranch(ref b) if b == "nope"));
}

#[test]
fn checkout_success_and_other_failures() {
    assert!(classify_checkout("main", true, Some(0), "Switched to branch 'main'\n").is_ok());

    let err = classify_checkout("main", false, Some(1), "error: local changes would be overwritten\n")
        .unwrap_err();
    assert!(matches!(err, VcsError::CommandFailed { op: "checkout", .. }));
}
