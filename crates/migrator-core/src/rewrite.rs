//! Literal find/replace across a glob selection of files.

use crate::error::{codes, Warning};
use crate::glob;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of a rewrite over a set of files.
#[derive(Debug, Default)]
pub struct RewriteReport {
    /// Files that contained the search literal and were rewritten.
    pub rewritten: Vec<PathBuf>,
    /// Files that matched the glob but contained no occurrence.
    pub unchanged: Vec<PathBuf>,
    /// Files that could not be read or written.
    pub warnings: Vec<Warning>,
}

/// Replace every occurrence of `find` with `replace` in the files under `base`
/// matching `pattern`.
///
/// The match set may be empty. A failure on one file is recorded in the
/// report and does not stop the remaining files.
#[must_use]
pub fn replace_in(base: &Path, pattern: &str, find: &str, replace: &str) -> RewriteReport {
    let paths = glob::expand(base, pattern);
    debug!(pattern, matched = paths.len(), "Rewriting files");
    replace_in_files(&paths, find, replace)
}

/// Replace every occurrence of `find` with `replace` in each of `paths`.
#[must_use]
pub fn replace_in_files(paths: &[PathBuf], find: &str, replace: &str) -> RewriteReport {
    let mut report = RewriteReport::default();

    for path in paths {
        match replace_in_file(path, find, replace) {
            Ok(true) => report.rewritten.push(path.clone()),
            Ok(false) => report.unchanged.push(path.clone()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Rewrite failed");
                report
                    .warnings
                    .push(Warning::io(codes::REWRITE_FAILED, path, &e));
            }
        }
    }

    report
}

/// Rewrite a single file. Returns whether the file changed.
///
/// Files without an occurrence are not written at all, so their bytes and
/// timestamps stay untouched.
fn replace_in_file(path: &Path, find: &str, replace: &str) -> io::Result<bool> {
    let content = std::fs::read_to_string(path)?;

    if find.is_empty() || !content.contains(find) {
        return Ok(false);
    }

    let replaced = content.replace(find, replace);
    migrator_util::fs::atomic_write(path, replaced.as_bytes())?;
    Ok(true)
}
