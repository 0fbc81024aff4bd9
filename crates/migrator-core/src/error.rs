//! Error and warning types for the transformation engine.
//!
//! Fatal faults are [`Error`] values: they halt the phase sequence. Non-fatal
//! faults (a single file operation failing inside a batch) are [`Warning`]
//! values accumulated on the run context and reported after the run.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stable error and warning codes used in JSON output.
pub mod codes {
    // Fatal faults
    pub const MANIFEST_NOT_FOUND: &str = "MANIFEST_NOT_FOUND";
    pub const MANIFEST_INVALID: &str = "MANIFEST_INVALID";
    pub const MANIFEST_WRITE_FAILED: &str = "MANIFEST_WRITE_FAILED";
    pub const ALREADY_MONOREPO: &str = "ALREADY_MONOREPO";
    pub const REGISTRY_LOOKUP_FAILED: &str = "REGISTRY_LOOKUP_FAILED";
    pub const SCAFFOLD_FAILED: &str = "SCAFFOLD_FAILED";
    pub const RECOVERY_FAILED: &str = "RECOVERY_FAILED";
    pub const OPTIONS_INVALID: &str = "OPTIONS_INVALID";
    pub const ANALYSIS_NOT_CAPTURED: &str = "ANALYSIS_NOT_CAPTURED";
    pub const IO_ERROR: &str = "IO_ERROR";

    // Non-fatal faults
    pub const MOVE_FAILED: &str = "MOVE_FAILED";
    pub const REMOVE_FAILED: &str = "REMOVE_FAILED";
    pub const COPY_FAILED: &str = "COPY_FAILED";
    pub const REWRITE_FAILED: &str = "REWRITE_FAILED";
    pub const DEP_RANGE_INVALID: &str = "DEP_RANGE_INVALID";

    /// Reserved. Version reuse and new-dependency removal apply to disjoint
    /// sets of names, so the reconciler never emits this.
    pub const POLICY_CONFLICT: &str = "POLICY_CONFLICT";
}

/// Fatal engine error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No package.json found in {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("Invalid package.json at {}: {reason}", path.display())]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is already part of a workspace", root.display())]
    AlreadyMonorepo { root: PathBuf },

    #[error("Failed to look up the latest version of {name}: {reason}")]
    RegistryLookup { name: String, reason: String },

    #[error("Failed to scaffold {name} at {}: {reason}", path.display())]
    Scaffold {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to reset the working tree in {}: {reason}", dir.display())]
    Recovery { dir: PathBuf, reason: String },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Phase {phase} needs the package analysis, which has not been captured")]
    AnalysisNotCaptured { phase: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Stable code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ManifestNotFound { .. } => codes::MANIFEST_NOT_FOUND,
            Self::ManifestInvalid { .. } => codes::MANIFEST_INVALID,
            Self::ManifestWrite { .. } => codes::MANIFEST_WRITE_FAILED,
            Self::AlreadyMonorepo { .. } => codes::ALREADY_MONOREPO,
            Self::RegistryLookup { .. } => codes::REGISTRY_LOOKUP_FAILED,
            Self::Scaffold { .. } => codes::SCAFFOLD_FAILED,
            Self::Recovery { .. } => codes::RECOVERY_FAILED,
            Self::InvalidOptions(_) => codes::OPTIONS_INVALID,
            Self::AnalysisNotCaptured { .. } => codes::ANALYSIS_NOT_CAPTURED,
            Self::Io(_) => codes::IO_ERROR,
        }
    }

    /// Whether this fault was raised while analyzing the source package,
    /// i.e. before any mutation.
    #[must_use]
    pub fn is_analysis_fault(&self) -> bool {
        matches!(
            self,
            Self::ManifestNotFound { .. } | Self::ManifestInvalid { .. } | Self::AlreadyMonorepo { .. }
        )
    }

    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }
}

/// Non-fatal fault recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Warning code (see [`codes`]).
    pub code: &'static str,
    /// Path the failed operation addressed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Human-readable message.
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(code: &'static str, path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    /// Warning for a failed filesystem operation on `path`.
    #[must_use]
    pub fn io(code: &'static str, path: &Path, err: &io::Error) -> Self {
        Self::new(code, Some(path), err.to_string())
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}: {}", self.code, path.display(), self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = Error::ManifestNotFound {
            path: PathBuf::from("/work/addon"),
        };
        assert_eq!(err.code(), codes::MANIFEST_NOT_FOUND);
        assert!(err.is_analysis_fault());

        let err = Error::RegistryLookup {
            name: "@embroider/test-setup".into(),
            reason: "offline".into(),
        };
        assert_eq!(err.code(), codes::REGISTRY_LOOKUP_FAILED);
        assert!(!err.is_analysis_fault());
    }

    #[test]
    fn test_error_codes_uppercase() {
        let all_codes = [
            codes::MANIFEST_NOT_FOUND,
            codes::MANIFEST_INVALID,
            codes::MANIFEST_WRITE_FAILED,
            codes::ALREADY_MONOREPO,
            codes::REGISTRY_LOOKUP_FAILED,
            codes::SCAFFOLD_FAILED,
            codes::RECOVERY_FAILED,
            codes::OPTIONS_INVALID,
            codes::ANALYSIS_NOT_CAPTURED,
            codes::IO_ERROR,
            codes::MOVE_FAILED,
            codes::REMOVE_FAILED,
            codes::COPY_FAILED,
            codes::REWRITE_FAILED,
            codes::DEP_RANGE_INVALID,
            codes::POLICY_CONFLICT,
        ];

        for code in all_codes {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Error code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::new(
            codes::MOVE_FAILED,
            Some(Path::new(".prettierrc.js")),
            "No such file or directory",
        );
        assert_eq!(
            warning.to_string(),
            "MOVE_FAILED: .prettierrc.js: No such file or directory"
        );
    }
}
