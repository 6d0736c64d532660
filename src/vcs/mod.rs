// src/vcs/mod.rs

//! Source control collaborator.
//!
//! The supervisor and the poller talk to a [`SourceControl`] instead of
//! running git directly. Production uses [`GitClient`]; tests provide a
//! scripted implementation that never touches a repository.

pub mod classify;
pub mod git;

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::errors::VcsError;

pub use classify::{classify_checkout, classify_clone, classify_pull, has_update_evidence};
pub use git::{GitClient, InvalidRepoName, RepoSpec};

/// Boxed future returned by the collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a pull did to the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStatus {
    Changed,
    UpToDate,
}

impl PullStatus {
    pub fn is_changed(self) -> bool {
        matches!(self, PullStatus::Changed)
    }
}

/// Operations against the one tracked repository.
///
/// Every call receives the scope it runs under. Cancelling that scope must
/// stop the underlying work and make the call return promptly.
pub trait SourceControl: Send + Sync + 'static {
    /// Clone the repository. Cloning into an existing destination succeeds.
    fn clone_repo(&self, scope: CancellationToken) -> BoxFuture<'_, Result<(), VcsError>>;

    /// Fetch and merge every remote branch.
    fn pull_all(&self, scope: CancellationToken) -> BoxFuture<'_, Result<PullStatus, VcsError>>;

    /// Pull `branch` from origin.
    fn pull<'a>(
        &'a self,
        scope: CancellationToken,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<PullStatus, VcsError>>;

    /// Switch the working copy to `branch`.
    fn checkout<'a>(
        &'a self,
        scope: CancellationToken,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<(), VcsError>>;
}
