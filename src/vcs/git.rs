// src/vcs/git.rs

//! [`SourceControl`] backed by the `git` command line.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::VcsError;
use crate::exec::{OpKind, OutputCapture, run_captured};
use crate::vcs::classify::{classify_checkout, classify_clone, classify_pull};
use crate::vcs::{BoxFuture, PullStatus, SourceControl};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected 'owner/project', got '{0}'")]
pub struct InvalidRepoName(pub String);

/// Which repository to track and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// `owner/project`.
    pub slug: String,
    /// URL passed to `git clone`.
    pub remote: String,
    /// Directory the clone lands in, relative to the workdir.
    pub dir_name: String,
}

impl RepoSpec {
    /// Parse `owner/project`. Without an explicit `remote` the GitHub SSH
    /// URL for the slug is used.
    pub fn parse(name: &str, remote: Option<String>) -> Result<Self, InvalidRepoName> {
        let name = name.trim();
        let (owner, project) = match name.split('/').collect::<Vec<_>>().as_slice() {
            [owner, project] if !owner.is_empty() && !project.is_empty() => (*owner, *project),
            _ => return Err(InvalidRepoName(name.to_string())),
        };

        let remote = remote
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| format!("git@github.com:{owner}/{project}.git"));

        Ok(Self {
            slug: name.to_string(),
            remote,
            dir_name: project.to_string(),
        })
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.slug, self.remote)
    }
}

/// Runs git for one repository, capturing output per operation.
#[derive(Debug, Clone)]
pub struct GitClient {
    repo: RepoSpec,
    workdir: PathBuf,
    capture: Arc<OutputCapture>,
    kill_grace: Duration,
}

/// Captured text of a finished git command.
struct GitOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl GitClient {
    pub fn new(
        repo: RepoSpec,
        workdir: impl Into<PathBuf>,
        capture: Arc<OutputCapture>,
        kill_grace: Duration,
    ) -> Self {
        Self {
            repo,
            workdir: workdir.into(),
            capture,
            kill_grace,
        }
    }

    pub fn repo(&self) -> &RepoSpec {
        &self.repo
    }

    /// The checked-out working copy.
    pub fn worktree(&self) -> PathBuf {
        self.workdir.join(&self.repo.dir_name)
    }

    fn git(&self, dir: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(dir).env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    async fn run(
        &self,
        op: OpKind,
        cmd: Command,
        scope: &CancellationToken,
    ) -> Result<GitOutput, VcsError> {
        let label = op.dir_name();
        let output = run_captured(cmd, op, &self.capture, scope, self.kill_grace)
            .await
            .map_err(|e| VcsError::from_exec(label, e))?;

        let stdout = output
            .stdout()
            .await
            .map_err(|e| VcsError::from_exec(label, e))?;
        let stderr = output
            .stderr()
            .await
            .map_err(|e| VcsError::from_exec(label, e))?;

        debug!(op = label, exit_code = ?output.code(), "git finished");

        Ok(GitOutput {
            success: output.success(),
            code: output.code(),
            stdout,
            stderr,
        })
    }
}

impl SourceControl for GitClient {
    fn clone_repo(&self, scope: CancellationToken) -> BoxFuture<'_, Result<(), VcsError>> {
        Box::pin(async move {
            info!(repo = %self.repo, workdir = ?self.workdir, "cloning repository");

            let mut cmd = self.git(&self.workdir);
            cmd.arg("clone")
                .arg(&self.repo.remote)
                .arg(&self.repo.dir_name)
                .arg("--progress");

            let out = self.run(OpKind::Clone, cmd, &scope).await?;
            classify_clone(out.success, out.code, &out.stderr)
        })
    }

    fn pull_all(&self, scope: CancellationToken) -> BoxFuture<'_, Result<PullStatus, VcsError>> {
        Box::pin(async move {
            let mut cmd = self.git(&self.worktree());
            cmd.args(["pull", "--all", "--progress"]);

            let out = self.run(OpKind::PullAll, cmd, &scope).await?;
            classify_pull(
                OpKind::PullAll.dir_name(),
                out.success,
                out.code,
                &out.stdout,
                &out.stderr,
            )
        })
    }

    fn pull<'a>(
        &'a self,
        scope: CancellationToken,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<PullStatus, VcsError>> {
        Box::pin(async move {
            let mut cmd = self.git(&self.worktree());
            cmd.args(["pull", "origin", branch, "--progress"]);

            let out = self.run(OpKind::Pull, cmd, &scope).await?;
            classify_pull(
                OpKind::Pull.dir_name(),
                out.success,
                out.code,
                &out.stdout,
                &out.stderr,
            )
        })
    }

    fn checkout<'a>(
        &'a self,
        scope: CancellationToken,
        branch: &'a str,
    ) -> BoxFuture<'a, Result<(), VcsError>> {
        Box::pin(async move {
            info!(branch, "checking out branch");

            let mut cmd = self.git(&self.worktree());
            cmd.args(["checkout", branch]);

            let out = self.run(OpKind::Checkout, cmd, &scope).await?;
            classify_checkout(branch, out.success, out.code, &out.stderr)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_derives_remote_and_dir() {
        let spec = RepoSpec::parse("acme/widgets", None).unwrap();
        assert_eq!(spec.slug, "acme/widgets");
        assert_eq!(spec.remote, "git@github.com:acme/widgets.git");
        assert_eq!(spec.dir_name, "widgets");
    }

    #[test]
    fn parse_keeps_explicit_remote() {
        let spec = RepoSpec::parse("acme/widgets", Some("/srv/git/widgets".into())).unwrap();
        assert_eq!(spec.remote, "/srv/git/widgets");
    }

    #[test]
    fn parse_rejects_malformed_names() {
        for bad in ["widgets", "acme/", "/widgets", "a/b/c", ""] {
            assert!(RepoSpec::parse(bad, None).is_err(), "{bad:?} should be rejected");
        }
    }
}
