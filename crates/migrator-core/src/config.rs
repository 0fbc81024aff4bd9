use crate::analysis::WorkspaceShape;
use crate::error::Error;
use crate::reconcile::Policy;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Default location of the relocated library, relative to the directory.
pub const DEFAULT_ADDON_LOCATION: &str = "package";

/// Default package name of the extracted test app.
pub const DEFAULT_TEST_APP_NAME: &str = "test-app";

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

/// Inputs to a transformation run.
///
/// Relative locations are resolved against `directory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Root of the package to transform.
    pub directory: PathBuf,
    /// Move the library into `addon_location` next to the test app.
    pub in_place: bool,
    pub addon_location: PathBuf,
    /// Explicit test-app location. `None` picks the default for `in_place`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_app_location: Option<PathBuf>,
    pub test_app_name: String,
    /// Stop after analysis without touching the tree.
    pub analysis_only: bool,
    pub reuse_existing_versions: bool,
    pub ignore_new_dependencies: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            in_place: true,
            addon_location: PathBuf::from(DEFAULT_ADDON_LOCATION),
            test_app_location: None,
            test_app_name: DEFAULT_TEST_APP_NAME.to_string(),
            analysis_only: false,
            reuse_existing_versions: false,
            ignore_new_dependencies: false,
        }
    }
}

impl TransformOptions {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place;
        self
    }

    #[must_use]
    pub fn with_addon_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.addon_location = location.into();
        self
    }

    #[must_use]
    pub fn with_test_app_location(mut self, location: Option<PathBuf>) -> Self {
        self.test_app_location = location;
        self
    }

    #[must_use]
    pub fn with_test_app_name(mut self, name: impl Into<String>) -> Self {
        self.test_app_name = name.into();
        self
    }

    #[must_use]
    pub fn with_analysis_only(mut self, analysis_only: bool) -> Self {
        self.analysis_only = analysis_only;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.reuse_existing_versions = policy.reuse_existing_versions;
        self.ignore_new_dependencies = policy.ignore_new_dependencies;
        self
    }

    /// The version-alignment policy selected by these options.
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy {
            reuse_existing_versions: self.reuse_existing_versions,
            ignore_new_dependencies: self.ignore_new_dependencies,
        }
    }

    /// Test-app location relative to `directory`: the explicit value, else
    /// `test-app` in place and `../test-app` otherwise.
    #[must_use]
    pub fn test_app_location(&self) -> PathBuf {
        self.test_app_location.clone().unwrap_or_else(|| {
            if self.in_place {
                PathBuf::from(DEFAULT_TEST_APP_NAME)
            } else {
                Path::new("..").join(DEFAULT_TEST_APP_NAME)
            }
        })
    }

    /// Adjust the options for the package's workspace shape.
    ///
    /// A solo package has no workspace to host a sibling test app, so it is
    /// always converted in place.
    #[must_use]
    pub fn resolve_for_shape(mut self, shape: WorkspaceShape) -> Self {
        if shape == WorkspaceShape::Solo && !self.in_place {
            tracing::debug!("Solo package, forcing in-place extraction");
            self.in_place = true;
        }
        self
    }

    /// Absolute test-app directory.
    #[must_use]
    pub fn test_app_dir(&self, root: &Path) -> PathBuf {
        root.join(self.test_app_location())
    }

    /// Absolute library destination.
    #[must_use]
    pub fn addon_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.addon_location)
    }

    /// Reject options no run could succeed with.
    ///
    /// # Errors
    /// `InvalidOptions` describing the first problem found.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.directory.is_dir() {
            return Err(Error::invalid_options(format!(
                "directory does not exist: {}",
                self.directory.display()
            )));
        }

        if self.test_app_name.trim().is_empty() {
            return Err(Error::invalid_options("test app name must not be empty"));
        }

        if !is_contained(&self.addon_location) {
            return Err(Error::invalid_options(format!(
                "addon location must be a relative path inside the directory: {}",
                self.addon_location.display()
            )));
        }

        let test_app = lexical(&self.test_app_location());
        let holds_directory = if test_app.is_absolute() {
            lexical(&self.directory).starts_with(&test_app)
        } else {
            test_app.components().all(|c| c == Component::ParentDir)
        };
        if holds_directory {
            return Err(Error::invalid_options(format!(
                "test app location must not be the package directory or one of its parents: {}",
                test_app.display()
            )));
        }

        let addon = lexical(&self.addon_location);
        if self.in_place && (test_app.starts_with(&addon) || addon.starts_with(&test_app)) {
            return Err(Error::invalid_options(
                "addon location and test app location must not overlap",
            ));
        }

        Ok(())
    }
}

/// Relative, non-empty, and never climbs out of its base.
fn is_contained(path: &Path) -> bool {
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// `path` with `.` dropped and `..` folded into the preceding segment.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
