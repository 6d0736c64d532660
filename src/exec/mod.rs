// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything branchbuild runs (git operations and the build itself) goes
//! through [`run_captured`]:
//!
//! - [`capture`] owns the per-operation `info` / `errors` files.
//! - [`command`] spawns a process under a cancellation scope.
//! - [`terminate`] stops a process group with a grace period.

pub mod capture;
pub mod command;
pub mod terminate;

pub use capture::{CapturedStreams, OpKind, OutputCapture};
pub use command::{CommandOutput, run_captured};
pub use terminate::terminate;
