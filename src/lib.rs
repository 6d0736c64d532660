// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod vcs;

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::build::ProcessBuildRunner;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, format_duration};
use crate::engine::{Supervisor, SupervisorSettings, spawn_interrupt_listener};
use crate::exec::OutputCapture;
use crate::vcs::GitClient;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (file + CLI overrides)
/// - output capture directories
/// - the git client and the build runner
/// - the run scope and the interrupt listener
/// - the supervisor loop
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = config::resolve(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    // Listen for interrupts before anything slow happens.
    let run_scope = CancellationToken::new();
    let listener = spawn_interrupt_listener(run_scope.clone());

    let capture = Arc::new(
        OutputCapture::init(&cfg.log_dir)
            .with_context(|| format!("initialising log directory {:?}", cfg.log_dir))?,
    );
    fs::create_dir_all(&cfg.workdir)
        .with_context(|| format!("creating workdir {:?}", cfg.workdir))?;

    let vcs = Arc::new(GitClient::new(
        cfg.repo.clone(),
        cfg.workdir.clone(),
        Arc::clone(&capture),
        cfg.timing.kill_grace,
    ));
    let builder = Arc::new(ProcessBuildRunner::new(
        cfg.worktree(),
        Arc::clone(&capture),
        cfg.timing.kill_grace,
    ));

    let settings = SupervisorSettings {
        branch: cfg.branch.clone(),
        command: cfg.build.clone(),
        poll_interval: cfg.timing.poll_interval,
        pull_timeout: cfg.timing.pull_timeout,
        quiescence: cfg.timing.quiescence,
    };

    info!(
        repo = %vcs.repo(),
        branch = %cfg.branch,
        worktree = ?vcs.worktree(),
        logs = ?capture.root(),
        "starting branchbuild"
    );

    let result = Supervisor::new(vcs, builder, settings, run_scope.clone())
        .run()
        .await;

    // Stops the listener when the supervisor ended on a setup error.
    run_scope.cancel();
    if let Err(e) = listener.await {
        debug!(error = %e, "interrupt listener did not finish cleanly");
    }

    result.map_err(anyhow::Error::from)
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("branchbuild dry-run");
    println!("  repo = {}", cfg.repo.slug);
    println!("  remote = {}", cfg.repo.remote);
    println!("  branch = {}", cfg.branch);
    println!("  worktree = {}", cfg.worktree().display());
    println!("  build = {}", cfg.build);
    println!();

    println!("poll:");
    println!("  interval = {}", format_duration(cfg.timing.poll_interval));
    println!("  quiescence = {}", format_duration(cfg.timing.quiescence));
    println!("  pull_timeout = {}", format_duration(cfg.timing.pull_timeout));
    println!("  kill_grace = {}", format_duration(cfg.timing.kill_grace));
    println!();

    println!("logs:");
    println!("  dir = {}", cfg.log_dir.display());

    debug!("dry-run complete (no execution)");
}
