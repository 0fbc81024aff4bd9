//! Package analysis.
//!
//! [`analyze`] reads a package's manifest and inspects its surroundings
//! (lockfiles, workspace declarations) to produce a [`PackageAnalysis`]
//! snapshot. Analysis never writes to disk, so it is always safe to run
//! before any mutation.

pub mod workspaces;

use crate::error::{Error, Warning};
use crate::manifest::{Dependencies, Manifest, Section};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use workspaces::{
    declares_workspace, find_workspace_root, workspace_patterns, PNPM_WORKSPACE_FILE,
};

/// Directory under the system temp dir that holds staging areas.
const STAGING_DIR: &str = "addon-migrator";

/// Package manager driving a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    /// Lockfiles in detection priority order.
    pub const LOCKFILES: [(&'static str, PackageManager); 3] = [
        ("pnpm-lock.yaml", PackageManager::Pnpm),
        ("yarn.lock", PackageManager::Yarn),
        ("package-lock.json", PackageManager::Npm),
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }

    /// Detect the manager from lockfiles in `dir`.
    #[must_use]
    pub fn from_lockfile(dir: &Path) -> Option<Self> {
        Self::LOCKFILES
            .iter()
            .find(|(file, _)| dir.join(file).is_file())
            .map(|(_, manager)| *manager)
    }

    /// Whether `file_name` is a lockfile of any supported manager.
    #[must_use]
    pub fn is_lockfile(file_name: &str) -> bool {
        Self::LOCKFILES.iter().any(|(file, _)| *file == file_name)
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the package stands alone or lives in a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceShape {
    Solo,
    Monorepo,
}

/// Immutable snapshot of a source package, captured before any mutation.
#[derive(Debug, Clone, Serialize)]
pub struct PackageAnalysis {
    /// Package name from package.json.
    pub name: String,
    /// Absolute package root.
    pub root: PathBuf,
    pub package_manager: PackageManager,
    pub dependencies: Dependencies,
    pub dev_dependencies: Dependencies,
    pub workspace_shape: WorkspaceShape,
    /// Directory declaring the enclosing workspace, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
    /// Library entry point (`main`, defaulting to `index.js`).
    pub entry_point: String,
    /// Staging directory for this package. Never created by analysis.
    pub tmp_location: PathBuf,
    /// Problems found while reading the manifest.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Warning>,
    #[serde(skip)]
    manifest: Option<Manifest>,
}

impl PackageAnalysis {
    #[must_use]
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains(name)
    }

    #[must_use]
    pub fn has_dev_dependency(&self, name: &str) -> bool {
        self.dev_dependencies.contains(name)
    }

    /// Version range the package declares for `name`, preferring
    /// `dependencies` over `devDependencies`.
    #[must_use]
    pub fn version_for_dependency(&self, name: &str) -> Option<&str> {
        self.dependencies
            .get(name)
            .or_else(|| self.dev_dependencies.get(name))
    }

    /// Every declared dependency, `dependencies` winning on duplicates.
    #[must_use]
    pub fn all_dependencies(&self) -> Dependencies {
        let mut all = Dependencies::new();
        for (name, version) in self.dev_dependencies.iter() {
            all.insert(name, version);
        }
        for (name, version) in self.dependencies.iter() {
            all.insert(name, version);
        }
        all
    }

    #[must_use]
    pub fn is_solo(&self) -> bool {
        self.workspace_shape == WorkspaceShape::Solo
    }

    /// The source manifest as read during analysis.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }
}

/// Analyze the package rooted at `root`.
///
/// # Errors
/// `ManifestNotFound` if `root` has no package.json, `ManifestInvalid` if it
/// cannot be parsed or has no `name`.
pub fn analyze(root: &Path) -> Result<PackageAnalysis, Error> {
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let manifest = Manifest::read(&root)?;

    let name = manifest
        .name()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::ManifestInvalid {
            path: manifest.path().to_path_buf(),
            reason: "missing \"name\" field".into(),
        })?
        .to_string();

    let (dependencies, mut issues) = manifest.section(Section::Dependencies);
    let (dev_dependencies, dev_issues) = manifest.section(Section::DevDependencies);
    issues.extend(dev_issues);

    let workspace_root = find_workspace_root(&root);
    let workspace_shape = if workspace_root.is_some() {
        WorkspaceShape::Monorepo
    } else {
        WorkspaceShape::Solo
    };

    let package_manager = PackageManager::from_lockfile(&root)
        .or_else(|| {
            workspace_root
                .as_deref()
                .and_then(PackageManager::from_lockfile)
        })
        .unwrap_or(PackageManager::Npm);

    let entry_point = manifest
        .get("main")
        .and_then(|v| v.as_str())
        .map_or_else(|| "index.js".to_string(), |m| m.trim_start_matches("./").to_string());

    let tmp_location = staging_location(&name, &root);

    Ok(PackageAnalysis {
        name,
        root,
        package_manager,
        dependencies,
        dev_dependencies,
        workspace_shape,
        workspace_root,
        entry_point,
        tmp_location,
        issues,
        manifest: Some(manifest),
    })
}

/// Detect the workspace shape of `root` without reading the full analysis.
#[must_use]
pub fn detect_shape(root: &Path) -> WorkspaceShape {
    let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    if find_workspace_root(&root).is_some() {
        WorkspaceShape::Monorepo
    } else {
        WorkspaceShape::Solo
    }
}

/// Staging directory for a package: unique per package root.
fn staging_location(name: &str, root: &Path) -> PathBuf {
    let slug: String = name
        .trim_start_matches('@')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();

    std::env::temp_dir().join(STAGING_DIR).join(format!(
        "{slug}-{}",
        migrator_util::hash::path_digest(root, 12)
    ))
}
