// src/vcs/classify.rs

//! Interpreting git's output.
//!
//! Git reports most outcomes only as text, so each operation is classified
//! from its exit status plus the captured stdout/stderr.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::errors::VcsError;
use crate::vcs::PullStatus;

static UPDATE_EVIDENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:Updating [0-9a-f]+\.\.[0-9a-f]+|Fast-forward|Merge made by)")
        .expect("update evidence pattern is valid")
});

const CLONE_ALREADY_EXISTS: &str = "already exists";
const CHECKOUT_UNKNOWN_BRANCH: &str = "did not match any file(s) known to git";

/// True when the output shows the working tree was moved.
pub fn has_update_evidence(stdout: &str, stderr: &str) -> bool {
    UPDATE_EVIDENCE.is_match(stdout) || UPDATE_EVIDENCE.is_match(stderr)
}

/// Classify a finished `git pull`.
///
/// Update evidence wins over the exit status: a pull that moved the tree
/// and then failed (for example while fetching another ref) still changed
/// what the next build will see.
pub fn classify_pull(
    op: &'static str,
    success: bool,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<PullStatus, VcsError> {
    if has_update_evidence(stdout, stderr) {
        if !success {
            warn!(op, exit_code = ?code, "git reported updates but exited unsuccessfully");
        }
        return Ok(PullStatus::Changed);
    }

    if success {
        return Ok(PullStatus::UpToDate);
    }

    Err(VcsError::CommandFailed {
        op,
        code,
        detail: last_line(stderr),
    })
}

/// Classify a finished `git clone`. An existing destination counts as done.
pub fn classify_clone(success: bool, code: Option<i32>, stderr: &str) -> Result<(), VcsError> {
    if success || stderr.contains(CLONE_ALREADY_EXISTS) {
        return Ok(());
    }

    Err(VcsError::CommandFailed {
        op: "clone",
        code,
        detail: last_line(stderr),
    })
}

/// Classify a finished `git checkout <branch>`.
pub fn classify_checkout(
    branch: &str,
    success: bool,
    code: Option<i32>,
    stderr: &str,
) -> Result<(), VcsError> {
    if stderr.contains(CHECKOUT_UNKNOWN_BRANCH) {
        return Err(VcsError::UnknownBranch(branch.to_string()));
    }
    if success {
        return Ok(());
    }

    Err(VcsError::CommandFailed {
        op: "checkout",
        code,
        detail: last_line(stderr),
    })
}

/// Last non-empty line of `text`. Progress output uses `\r`, so both line
/// terminators split.
pub fn last_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("no output")
        .to_string()
}
