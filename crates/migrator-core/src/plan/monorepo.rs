//! Monorepo conversion: move a standalone package into a workspace where it
//! is the sole member.

use super::extract_tests::root_entries;
use super::{slash_path, top_level_name, Phase, PhaseOutput, RunContext, Step, Transformation};
use crate::analysis::{analyze, PackageAnalysis, PackageManager, PNPM_WORKSPACE_FILE};
use crate::config::TransformOptions;
use crate::error::Error;
use crate::manifest::Manifest;
use crate::relocate::{settle, FileOp};
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::info;

/// Top-level entries that stay at the workspace root.
const ROOT_ENTRIES_KEPT: [&str; 4] = [".git", ".github", "node_modules", ".npmrc"];

/// Entries copied into the member rather than moved.
const ROOT_ENTRIES_COPIED: [&str; 1] = [".gitignore"];

/// Manifest fields carried from the package to the workspace root.
const CARRIED_FIELDS: [&str; 3] = ["packageManager", "volta", "engines"];

/// Scripts the workspace root delegates to its member.
const DELEGATED_SCRIPTS: [&str; 3] = ["lint", "test", "build"];

/// Root `scripts` entry running `script` in the member named `member`.
#[must_use]
pub fn delegate_script(manager: PackageManager, member: &str, script: &str) -> String {
    match manager {
        PackageManager::Pnpm => format!("pnpm --filter {member} {script}"),
        PackageManager::Yarn => format!("yarn workspace {member} {script}"),
        PackageManager::Npm => format!("npm run {script} --workspace {member}"),
    }
}

/// Initial workspace root manifest for `package`.
#[must_use]
pub fn root_manifest(package: Option<&Manifest>) -> Value {
    let mut root = Map::new();
    root.insert("name".into(), json!("root"));
    root.insert("private".into(), json!(true));
    root.insert("version".into(), json!("0.0.0"));

    if let Some(package) = package {
        for field in CARRIED_FIELDS {
            if let Some(value) = package.get(field) {
                root.insert(field.to_string(), value.clone());
            }
        }
    }

    Value::Object(root)
}

/// The monorepo conversion transformation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeMonorepo;

impl MakeMonorepo {
    fn scan(options: &TransformOptions) -> Result<PhaseOutput, Error> {
        options.validate()?;
        let analysis = analyze(&options.directory)?;

        if let Some(root) = &analysis.workspace_root {
            return Err(Error::AlreadyMonorepo { root: root.clone() });
        }
        info!(name = %analysis.name, manager = %analysis.package_manager, "Analyzed package");

        let step = if options.analysis_only {
            Step::Abort
        } else {
            Step::Continue
        };
        Ok(PhaseOutput::captured(analysis, step))
    }

    async fn relocate_package(
        options: &TransformOptions,
        analysis: &PackageAnalysis,
    ) -> Result<PhaseOutput, Error> {
        let root = &analysis.root;
        let member = options.addon_dir(root);
        let destination = top_level_name(&options.addon_location);

        let ops: Vec<FileOp> = root_entries(root)
            .await?
            .into_iter()
            .filter(|name| {
                !ROOT_ENTRIES_KEPT.contains(&name.as_str())
                    && !PackageManager::is_lockfile(name)
                    && destination.as_ref() != Some(name)
            })
            .map(|name| {
                if ROOT_ENTRIES_COPIED.contains(&name.as_str()) {
                    FileOp::copy(root.join(&name), member.join(&name))
                } else {
                    FileOp::relocate(root.join(&name), member.join(&name))
                }
            })
            .collect();

        let report = settle(ops).await;
        info!(moved = report.succeeded(), to = %member.display(), "Relocated package");
        Ok(PhaseOutput::with_warnings(report.warnings()))
    }

    fn scaffold_workspace_root(
        options: &TransformOptions,
        analysis: &PackageAnalysis,
    ) -> Result<PhaseOutput, Error> {
        let root_path = Manifest::path_in(&analysis.root);
        ensure_manifest_moved(&root_path, &Manifest::path_in(&options.addon_dir(&analysis.root)))?;

        let manifest = Manifest::from_value(root_path, root_manifest(analysis.manifest()))?;
        manifest.write()?;
        Ok(PhaseOutput::done())
    }

    fn reconcile_workspace_manifest(
        options: &TransformOptions,
        analysis: &PackageAnalysis,
    ) -> Result<PhaseOutput, Error> {
        let root = &analysis.root;
        let location = slash_path(&options.addon_location);
        let mut manifest = Manifest::read(root)?;

        if analysis.package_manager == PackageManager::Pnpm {
            let yaml = format!("packages:\n  - '{location}'\n");
            migrator_util::fs::atomic_write(&root.join(PNPM_WORKSPACE_FILE), yaml.as_bytes())?;
        } else {
            manifest.set("workspaces", json!([location]));
        }

        let scripts: Map<String, Value> = DELEGATED_SCRIPTS
            .iter()
            .map(|script| {
                (
                    (*script).to_string(),
                    json!(delegate_script(analysis.package_manager, &analysis.name, script)),
                )
            })
            .collect();
        manifest.set("scripts", Value::Object(scripts));
        manifest.write()?;

        Ok(PhaseOutput::done())
    }
}

/// The package manifest must live only at `moved` before a root manifest may
/// take `original`'s place.
fn ensure_manifest_moved(original: &Path, moved: &Path) -> Result<(), Error> {
    if !moved.is_file() {
        return Err(Error::ManifestNotFound {
            path: moved.to_path_buf(),
        });
    }
    if original.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!(
                "{} was not moved into the workspace member; refusing to overwrite it",
                original.display()
            ),
        )));
    }
    Ok(())
}

impl Transformation for MakeMonorepo {
    const NAME: &'static str = "make-monorepo";

    fn phases(&self, _options: &TransformOptions) -> Vec<Phase> {
        vec![
            Phase::Scan,
            Phase::RelocatePackage,
            Phase::ScaffoldWorkspaceRoot,
            Phase::ReconcileWorkspaceManifest,
        ]
    }

    async fn execute(&self, phase: Phase, ctx: &RunContext) -> Result<PhaseOutput, Error> {
        let options = ctx.options();
        if phase == Phase::Scan {
            return Self::scan(options);
        }

        let analysis = ctx.snapshot(phase)?;
        match phase {
            Phase::RelocatePackage => Self::relocate_package(options, analysis).await,
            Phase::ScaffoldWorkspaceRoot => Self::scaffold_workspace_root(options, analysis),
            Phase::ReconcileWorkspaceManifest => {
                Self::reconcile_workspace_manifest(options, analysis)
            }
            other => unreachable!("{other} is not part of monorepo conversion"),
        }
    }
}
