#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::unused_async)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Transformation engine for addon-migrator.
//!
//! [`analysis`] captures a read-only snapshot of a package. The mutating
//! components ([`rewrite`], [`relocate`], [`reconcile`]) never read each
//! other's state; [`plan`] sequences them into the two top-level
//! transformations.

pub mod analysis;
pub mod config;
pub mod error;
pub mod glob;
pub mod manifest;
pub mod plan;
pub mod reconcile;
pub mod recovery;
pub mod registry;
pub mod relocate;
pub mod rewrite;
pub mod scaffold;
pub mod version;

pub use analysis::{analyze, PackageAnalysis, PackageManager, WorkspaceShape};
pub use config::{Config, TransformOptions};
pub use error::{codes, Error, Warning};
pub use plan::{drive, ExtractTests, MakeMonorepo, Outcome, Phase, RunReport};
pub use reconcile::Policy;
pub use recovery::{GitRecovery, Recovery};
pub use registry::{RegistryClient, VersionLookup};
pub use scaffold::{CommandScaffolder, Scaffold, ScaffoldRequest};
pub use version::VERSION;

/// Extract a package's tests into a companion test app.
///
/// A solo package is always converted in place.
pub async fn extract_tests<V: VersionLookup, S: Scaffold>(
    options: TransformOptions,
    versions: V,
    scaffolder: S,
) -> RunReport {
    let shape = analysis::detect_shape(&options.directory);
    let options = options.resolve_for_shape(shape);
    drive(&ExtractTests::new(versions, scaffolder), options).await
}

/// Move a standalone package into a new workspace as its sole member.
pub async fn make_monorepo(options: TransformOptions) -> RunReport {
    drive(&MakeMonorepo, options).await
}
