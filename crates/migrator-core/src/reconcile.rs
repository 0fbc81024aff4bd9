//! Dependency reconciliation for a freshly scaffolded destination manifest.
//!
//! [`reconcile`] is the pure policy pass over one dependency section.
//! [`reconcile_destination`] applies that pass to both sections of a
//! destination manifest and then performs the unconditional finalization
//! (self-dependency swap, test-setup pin, welcome-page removal, back-fill).

use crate::analysis::{PackageAnalysis, PackageManager};
use crate::manifest::{Dependencies, Manifest, Section};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Package added to every destination at its latest published version.
pub const TEST_SETUP_PACKAGE: &str = "@embroider/test-setup";

/// Blueprint dependency removed from every destination.
pub const WELCOME_PAGE_PACKAGE: &str = "ember-welcome-page";

/// Version-alignment switches. Both may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Pin destination entries to the source's range when the source declares
    /// the same name with a different range.
    pub reuse_existing_versions: bool,
    /// Drop destination entries the source does not declare at all.
    pub ignore_new_dependencies: bool,
}

impl Policy {
    /// Whether the policy pass has anything to do.
    #[must_use]
    pub fn is_active(self) -> bool {
        self.reuse_existing_versions || self.ignore_new_dependencies
    }
}

/// Edits to apply to one dependency section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_set: Dependencies,
    pub to_remove: Vec<String>,
}

impl ReconcilePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the policy edits for `dest` given the source's declared ranges.
///
/// `source` should hold every range the source package declares, with
/// `dependencies` winning over `devDependencies`
/// (see [`PackageAnalysis::all_dependencies`]). A name is either re-pinned or
/// removed, never both.
#[must_use]
pub fn reconcile(source: &Dependencies, dest: &Dependencies, policy: Policy) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for (name, dest_version) in dest.iter() {
        match source.get(name) {
            Some(source_version)
                if policy.reuse_existing_versions && source_version != dest_version =>
            {
                plan.to_set.insert(name, source_version);
            }
            None if policy.ignore_new_dependencies => plan.to_remove.push(name.to_string()),
            _ => {}
        }
    }

    plan
}

/// Version range the destination uses to depend on the source package.
#[must_use]
pub fn self_dependency_range(manager: PackageManager) -> &'static str {
    match manager {
        PackageManager::Pnpm => "workspace:*",
        PackageManager::Npm | PackageManager::Yarn => "*",
    }
}

/// Reconcile a destination manifest against the source analysis.
///
/// The policy pass runs only when [`Policy::is_active`]. The finalization
/// always runs, in this order: drop the source's own name from
/// devDependencies, add it as a dependency, pin [`TEST_SETUP_PACKAGE`] to
/// `test_setup_version`, drop [`WELCOME_PAGE_PACKAGE`], then back-fill every
/// source devDependency the destination does not already declare.
///
/// Only the in-memory manifest is edited; the caller writes it.
pub fn reconcile_destination(
    analysis: &PackageAnalysis,
    manifest: &mut Manifest,
    policy: Policy,
    test_setup_version: &str,
) {
    if policy.is_active() {
        let source = analysis.all_dependencies();
        for section in [Section::Dependencies, Section::DevDependencies] {
            let plan = reconcile(&source, &manifest.dependencies(section), policy);
            debug!(
                section = section.key(),
                set = plan.to_set.len(),
                removed = plan.to_remove.len(),
                "Applying version policy"
            );
            manifest.add(section, &plan.to_set);
            manifest.remove(section, &plan.to_remove);
        }
    }

    manifest.remove(Section::DevDependencies, &[analysis.name.as_str()]);

    let mut self_dep = Dependencies::new();
    self_dep.insert(
        analysis.name.as_str(),
        self_dependency_range(analysis.package_manager),
    );
    manifest.add(Section::Dependencies, &self_dep);

    let mut test_setup = Dependencies::new();
    test_setup.insert(TEST_SETUP_PACKAGE, test_setup_version);
    manifest.add(Section::DevDependencies, &test_setup);

    manifest.remove(Section::DevDependencies, &[WELCOME_PAGE_PACKAGE]);

    let current = manifest.dependencies(Section::DevDependencies);
    let backfill: Dependencies = analysis
        .dev_dependencies
        .iter()
        .filter(|(name, _)| !current.contains(name))
        .collect();
    debug!(count = backfill.len(), "Back-filling source devDependencies");
    manifest.add(Section::DevDependencies, &backfill);
}
