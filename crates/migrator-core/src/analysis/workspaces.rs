//! Workspace detection.
//!
//! Parses the `workspaces` field from package.json (array or yarn-style
//! `{ "packages": [...] }`) and looks for `pnpm-workspace.yaml` files, both at
//! a package root and in its ancestors. Everything here is read-only.

use crate::manifest::MANIFEST_NAME;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File declaring a pnpm workspace.
pub const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

/// Workspace member patterns declared by a manifest.
///
/// Returns an empty list when the manifest has no (usable) `workspaces` field.
#[must_use]
pub fn workspace_patterns(package: &Value) -> Vec<String> {
    let Some(workspaces) = package.get("workspaces") else {
        return Vec::new();
    };

    let strings = |arr: &Vec<Value>| -> Vec<String> {
        arr.iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    };

    match workspaces {
        Value::Array(arr) => strings(arr),
        Value::Object(obj) => obj
            .get("packages")
            .and_then(Value::as_array)
            .map(strings)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Whether `dir` itself declares a workspace.
#[must_use]
pub fn declares_workspace(dir: &Path) -> bool {
    if dir.join(PNPM_WORKSPACE_FILE).is_file() {
        return true;
    }

    std::fs::read_to_string(dir.join(MANIFEST_NAME))
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok())
        .is_some_and(|package| !workspace_patterns(&package).is_empty())
}

/// Find the workspace root by walking up the directory tree from `start`.
///
/// Returns the first directory (including `start`) that declares a workspace.
#[must_use]
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if declares_workspace(&current) {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}
