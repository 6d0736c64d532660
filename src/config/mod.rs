// src/config/mod.rs

//! Configuration loading and validation for branchbuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge CLI overrides (`loader.rs`).
//! - Validate and convert into a `ConfigFile` (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::{format_duration, parse_duration};
pub use loader::{apply_cli_overrides, load_and_validate, load_from_path, resolve};
pub use model::{
    BuildSection, ConfigFile, LogsSection, PollSection, RawConfigFile, RepoSection, Timing,
};
