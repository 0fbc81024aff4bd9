//! Shell-style glob expansion relative to a base directory.
//!
//! Supports `*`, `**`, `?`, character classes and brace alternation
//! (`test-helper.{js,ts}`). Only files are returned. Like shell globbing,
//! dot-files are only matched when the pattern itself names a dot segment, and
//! `node_modules`/`.git` are never descended into.

use glob_match::glob_match;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never searched.
const SKIP_DIRS: [&str; 2] = ["node_modules", ".git"];

fn is_glob_segment(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

/// Expand `pattern` against `base`, returning matching files in sorted order.
///
/// A pattern without glob characters matches the single file it names, if it
/// exists. No match is not an error.
#[must_use]
pub fn expand(base: &Path, pattern: &str) -> Vec<PathBuf> {
    let pattern = pattern.trim_start_matches("./");
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();

    let literal_len = segments
        .iter()
        .take_while(|s| !is_glob_segment(s))
        .count();

    if literal_len == segments.len() {
        let path = base.join(pattern);
        return if path.is_file() { vec![path] } else { Vec::new() };
    }

    let walk_root = segments[..literal_len]
        .iter()
        .fold(base.to_path_buf(), |acc, s| acc.join(s));
    if !walk_root.is_dir() {
        return Vec::new();
    }

    let rest = &segments[literal_len..];
    let max_depth = if rest.iter().any(|s| s.contains("**")) {
        usize::MAX
    } else {
        rest.len()
    };
    let include_hidden = segments.iter().any(|s| s.starts_with('.'));

    let mut matches: Vec<PathBuf> = WalkDir::new(&walk_root)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if entry.file_type().is_dir() && SKIP_DIRS.contains(&name.as_ref()) {
                return false;
            }
            include_hidden || !name.starts_with('.')
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            relative_slash_path(base, entry.path())
                .is_some_and(|relative| glob_match(pattern, &relative))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();

    matches.sort();
    matches
}

/// `path` relative to `base`, with `/` separators on every platform.
fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
