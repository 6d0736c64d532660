// src/exec/capture.rs

//! Per-operation output files.
//!
//! Every command family gets its own directory under the log root with an
//! `info` file (stdout) and an `errors` file (stderr). Each run truncates
//! them, so they always hold the output of the most recent run.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// The kinds of commands whose output is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Clone,
    PullAll,
    Pull,
    Checkout,
    Build,
}

impl OpKind {
    pub const ALL: [OpKind; 5] = [
        OpKind::Clone,
        OpKind::PullAll,
        OpKind::Pull,
        OpKind::Checkout,
        OpKind::Build,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            OpKind::Clone => "clone",
            OpKind::PullAll => "pull_all",
            OpKind::Pull => "pull",
            OpKind::Checkout => "checkout",
            OpKind::Build => "build",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Freshly truncated output files for one run.
#[derive(Debug)]
pub struct CapturedStreams {
    pub stdout: File,
    pub stderr: File,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

/// Root of the captured-output tree.
#[derive(Debug, Clone)]
pub struct OutputCapture {
    root: PathBuf,
}

impl OutputCapture {
    /// Create `<root>/<op>/{info,errors}` for every [`OpKind`].
    pub fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let capture = Self { root: root.into() };

        for op in OpKind::ALL {
            fs::create_dir_all(capture.op_dir(op))?;
            let (info, errors) = capture.paths(op);
            File::create(&info)?;
            File::create(&errors)?;
        }

        debug!(root = ?capture.root, "output capture directories ready");
        Ok(capture)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn op_dir(&self, op: OpKind) -> PathBuf {
        self.root.join(op.dir_name())
    }

    /// `(stdout, stderr)` file paths for `op`.
    pub fn paths(&self, op: OpKind) -> (PathBuf, PathBuf) {
        let dir = self.op_dir(op);
        (dir.join("info"), dir.join("errors"))
    }

    /// Truncate and open the files for a new run of `op`.
    pub fn open(&self, op: OpKind) -> io::Result<CapturedStreams> {
        let (stdout_path, stderr_path) = self.paths(op);
        if let Some(dir) = stdout_path.parent() {
            fs::create_dir_all(dir)?;
        }

        Ok(CapturedStreams {
            stdout: truncate(&stdout_path)?,
            stderr: truncate(&stderr_path)?,
            stdout_path,
            stderr_path,
        })
    }
}

fn truncate(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
