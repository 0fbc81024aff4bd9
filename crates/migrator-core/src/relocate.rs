//! File and directory relocation with partial-failure-tolerant batching.
//!
//! A batch of [`FileOp`]s is issued concurrently by [`settle`]. Every
//! operation runs to completion on its own and yields a [`Settled`] value;
//! one operation failing (typically because an optional file does not exist
//! in this package) never cancels or short-circuits its siblings.

use crate::error::{codes, Warning};
use futures::future::join_all;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Directory names never copied when staging a tree.
pub const COPY_SKIP: [&str; 2] = ["node_modules", ".git"];

/// A single filesystem operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FileOp {
    /// Move a file or directory. With `overwrite`, an existing destination
    /// is replaced; without it, the move fails.
    Move {
        src: PathBuf,
        dst: PathBuf,
        overwrite: bool,
    },
    /// Recursively copy a file or directory, skipping [`COPY_SKIP`].
    Copy { src: PathBuf, dst: PathBuf },
    /// Remove a file or directory. Removing a missing path succeeds.
    Remove { path: PathBuf },
}

impl FileOp {
    /// Move that replaces an existing destination.
    pub fn relocate(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        Self::Move {
            src: src.into(),
            dst: dst.into(),
            overwrite: true,
        }
    }

    pub fn copy(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        Self::Copy {
            src: src.into(),
            dst: dst.into(),
        }
    }

    pub fn remove(path: impl Into<PathBuf>) -> Self {
        Self::Remove { path: path.into() }
    }

    /// The path this operation reads from (or deletes).
    #[must_use]
    pub fn subject(&self) -> &Path {
        match self {
            Self::Move { src, .. } | Self::Copy { src, .. } => src,
            Self::Remove { path } => path,
        }
    }

    fn failure_code(&self) -> &'static str {
        match self {
            Self::Move { .. } => codes::MOVE_FAILED,
            Self::Copy { .. } => codes::COPY_FAILED,
            Self::Remove { .. } => codes::REMOVE_FAILED,
        }
    }

    async fn execute(&self) -> io::Result<()> {
        match self {
            Self::Move {
                src,
                dst,
                overwrite,
            } => move_path(src, dst, *overwrite).await,
            Self::Copy { src, dst } => copy_path(src, dst).await,
            Self::Remove { path } => remove_path(path).await,
        }
    }
}

/// Outcome of one operation in a batch.
#[derive(Debug)]
pub enum Settled {
    Succeeded(FileOp),
    Failed { op: FileOp, error: io::Error },
}

impl Settled {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    #[must_use]
    pub fn op(&self) -> &FileOp {
        match self {
            Self::Succeeded(op) | Self::Failed { op, .. } => op,
        }
    }
}

/// All outcomes of a settled batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Settled>,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Non-fatal warnings for every failed operation.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Settled::Failed { op, error } => {
                    Some(Warning::io(op.failure_code(), op.subject(), error))
                }
                Settled::Succeeded(_) => None,
            })
            .collect()
    }
}

/// Run every operation concurrently and wait for all of them to settle.
pub async fn settle(ops: Vec<FileOp>) -> BatchReport {
    let outcomes = join_all(ops.into_iter().map(|op| async move {
        match op.execute().await {
            Ok(()) => {
                debug!(?op, "File operation succeeded");
                Settled::Succeeded(op)
            }
            Err(error) => {
                warn!(path = %op.subject().display(), %error, "File operation failed");
                Settled::Failed { op, error }
            }
        }
    }))
    .await;

    BatchReport { outcomes }
}

/// Move `src` to `dst`, creating missing parent directories.
///
/// Falls back to copy-then-remove when a rename is not possible (e.g. across
/// filesystems, which is the common case for staging under the temp dir).
///
/// # Errors
/// `NotFound` if `src` does not exist, `InvalidInput` if `dst` is `src` or
/// lies inside it, `AlreadyExists` if `dst` exists and `overwrite` is false,
/// or any underlying IO error.
pub async fn move_path(src: &Path, dst: &Path, overwrite: bool) -> io::Result<()> {
    fs::symlink_metadata(src).await?;

    // checked before anything at dst is removed
    if real_location(dst).await.starts_with(real_location(src).await) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot move {} onto itself or into itself", src.display()),
        ));
    }

    if fs::symlink_metadata(dst).await.is_ok() {
        if !overwrite {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("destination already exists: {}", dst.display()),
            ));
        }
        remove_path(dst).await?;
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    if fs::rename(src, dst).await.is_ok() {
        return Ok(());
    }

    copy_path(src, dst).await?;
    remove_path(src).await
}

/// Where `path` really lives: the nearest existing ancestor of its parent is
/// canonicalized and the remaining components are appended. The final
/// component is never followed, so a symlink is addressed as itself.
async fn real_location(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };

    let mut ancestor = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let mut missing = vec![name.to_os_string()];
    loop {
        if let Ok(real) = fs::canonicalize(ancestor).await {
            return missing.iter().rev().fold(real, |acc, c| acc.join(c));
        }
        match (ancestor.parent(), ancestor.file_name()) {
            (Some(up), Some(segment)) => {
                missing.push(segment.to_os_string());
                ancestor = up;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Remove a file or directory tree. A missing path is not an error.
///
/// # Errors
/// Any IO error other than `NotFound`.
pub async fn remove_path(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Recursively copy `src` to `dst`, skipping [`COPY_SKIP`] directories.
///
/// # Errors
/// `NotFound` if `src` does not exist, or any underlying IO error.
pub async fn copy_path(src: &Path, dst: &Path) -> io::Result<()> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    tokio::task::spawn_blocking(move || {
        migrator_util::fs::copy_recursive(&src, &dst, &COPY_SKIP).map(|_| ())
    })
    .await
    .map_err(io::Error::other)?
}
