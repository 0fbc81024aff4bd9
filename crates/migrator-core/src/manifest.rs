//! package.json reading and in-place editing.
//!
//! Edits preserve the key order of the original document (`serde_json` is
//! built with `preserve_order`): updated keys stay where they were, new keys
//! are appended to the end of their object.

use crate::error::{codes, Error, Warning};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File name of a package manifest.
pub const MANIFEST_NAME: &str = "package.json";

/// A dependency section of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dependencies,
    DevDependencies,
}

impl Section {
    /// The manifest key for this section.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
        }
    }
}

/// Ordered mapping of package name to version range.
///
/// Backed by the insertion-ordered `serde_json` map; every value is a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Dependencies {
    entries: Map<String, Value>,
}

impl Dependencies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Version range declared for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Set `name` to `version`. Existing entries keep their position.
    pub fn insert(&mut self, name: impl Into<String>, version: impl Into<String>) {
        self.entries.insert(name.into(), Value::String(version.into()));
    }

    /// Remove `name`, returning its version if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        match self.entries.shift_remove(name)? {
            Value::String(version) => Some(version),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| Some((n.as_str(), v.as_str()?)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dependencies {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut deps = Self::new();
        for (name, version) in iter {
            deps.insert(name, version);
        }
        deps
    }
}

/// A package.json document opened for editing.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    root: Map<String, Value>,
}

impl Manifest {
    /// Path of the manifest inside `dir`.
    #[must_use]
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_NAME)
    }

    /// Read the manifest in `dir`.
    ///
    /// # Errors
    /// `ManifestNotFound` if there is no package.json, `ManifestInvalid` if it
    /// cannot be read or is not a JSON object.
    pub fn read(dir: &Path) -> Result<Self, Error> {
        let path = Self::path_in(dir);
        if !path.is_file() {
            return Err(Error::ManifestNotFound {
                path: dir.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::ManifestInvalid {
            path: path.clone(),
            reason: format!("Failed to read: {e}"),
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| Error::ManifestInvalid {
            path: path.clone(),
            reason: format!("Invalid JSON: {e}"),
        })?;

        Self::from_value(path, value)
    }

    /// Build a manifest from an already-parsed document.
    ///
    /// # Errors
    /// `ManifestInvalid` if `value` is not a JSON object.
    pub fn from_value(path: PathBuf, value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(root) => Ok(Self { path, root }),
            _ => Err(Error::ManifestInvalid {
                path,
                reason: "package.json must be a JSON object".into(),
            }),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `name` field.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.root.get("name").and_then(Value::as_str)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Set a top-level field. Existing keys keep their position.
    pub fn set(&mut self, key: &str, value: Value) {
        self.root.insert(key.to_string(), value);
    }

    /// Extract a dependency section.
    ///
    /// Entries whose range is not a string are skipped and reported as
    /// warnings, as is a section that is not an object.
    #[must_use]
    pub fn section(&self, section: Section) -> (Dependencies, Vec<Warning>) {
        let mut deps = Dependencies::new();
        let mut warnings = Vec::new();

        let Some(value) = self.root.get(section.key()) else {
            return (deps, warnings);
        };

        let Some(object) = value.as_object() else {
            warnings.push(Warning::new(
                codes::DEP_RANGE_INVALID,
                Some(&self.path),
                format!(
                    "'{}' must be an object, got {}",
                    section.key(),
                    json_type_name(value)
                ),
            ));
            return (deps, warnings);
        };

        for (name, range) in object {
            if let Some(range) = range.as_str() {
                deps.insert(name.clone(), range);
            } else {
                warnings.push(Warning::new(
                    codes::DEP_RANGE_INVALID,
                    Some(&self.path),
                    format!(
                        "Invalid range for '{name}' in {}: expected string, got {}",
                        section.key(),
                        json_type_name(range)
                    ),
                ));
            }
        }

        (deps, warnings)
    }

    /// Extract a dependency section, ignoring malformed entries.
    #[must_use]
    pub fn dependencies(&self, section: Section) -> Dependencies {
        self.section(section).0
    }

    /// Add or update entries in `section`, creating it if needed.
    pub fn add(&mut self, section: Section, deps: &Dependencies) {
        if deps.is_empty() {
            return;
        }

        let entry = self
            .root
            .entry(section.key())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }

        if let Value::Object(object) = entry {
            for (name, version) in deps.iter() {
                object.insert(name.to_string(), Value::String(version.to_string()));
            }
        }
    }

    /// Remove entries from `section`. Absent names are ignored.
    pub fn remove<S: AsRef<str>>(&mut self, section: Section, names: &[S]) {
        if let Some(Value::Object(object)) = self.root.get_mut(section.key()) {
            for name in names {
                // shift_remove keeps the order of the remaining keys
                object.shift_remove(name.as_ref());
            }
        }
    }

    /// Serialize with two-space indentation and a trailing newline.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        let mut out = serde_json::to_string_pretty(&self.root).unwrap_or_else(|_| "{}".into());
        out.push('\n');
        out
    }

    /// Write the manifest back to its path atomically.
    ///
    /// # Errors
    /// `ManifestWrite` if the file cannot be written.
    pub fn write(&self) -> Result<(), Error> {
        migrator_util::fs::atomic_write(&self.path, self.to_json_string().as_bytes()).map_err(
            |source| Error::ManifestWrite {
                path: self.path.clone(),
                source,
            },
        )
    }
}

/// Get a human-readable type name for a JSON value.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
