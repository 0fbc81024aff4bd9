//! Phase sequencing for the top-level transformations.
//!
//! A transformation is a fixed, strictly-forward list of [`Phase`]s. The
//! [`drive`] loop runs them one at a time: a phase only starts after the
//! previous one has fully settled, and the run ends on the last phase
//! ([`Outcome::Completed`]), on a phase asking to stop
//! ([`Outcome::Aborted`]), or on the first fatal error ([`Outcome::Faulted`]).
//!
//! Phases see the run through a shared [`RunContext`] and report what they
//! did as a [`PhaseOutput`]; only the driver mutates the context.

pub mod monorepo;

use crate::analysis::PackageAnalysis;
use crate::config::TransformOptions;
use crate::error::{Error, Warning};
use serde::Serialize;
use std::path::{Component, Path};
use tracing::{error, info, warn};

pub use extract_tests::ExtractTests;
pub use monorepo::MakeMonorepo;

/// A step of a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Scan,
    StageSource,
    ScaffoldTestApp,
    MoveAuxiliaryFiles,
    MoveTestTree,
    RewriteRelocatedReferences,
    ReconcileDestinationManifest,
    RemoveSourceLeftovers,
    RelocateLibrary,
    DrainStaging,
    RelocatePackage,
    ScaffoldWorkspaceRoot,
    ReconcileWorkspaceManifest,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "Scan",
            Self::StageSource => "StageSource",
            Self::ScaffoldTestApp => "ScaffoldTestApp",
            Self::MoveAuxiliaryFiles => "MoveAuxiliaryFiles",
            Self::MoveTestTree => "MoveTestTree",
            Self::RewriteRelocatedReferences => "RewriteRelocatedReferences",
            Self::ReconcileDestinationManifest => "ReconcileDestinationManifest",
            Self::RemoveSourceLeftovers => "RemoveSourceLeftovers",
            Self::RelocateLibrary => "RelocateLibrary",
            Self::DrainStaging => "DrainStaging",
            Self::RelocatePackage => "RelocatePackage",
            Self::ScaffoldWorkspaceRoot => "ScaffoldWorkspaceRoot",
            Self::ReconcileWorkspaceManifest => "ReconcileWorkspaceManifest",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the run continues after a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Abort,
}

/// What a phase did, applied to the context by the driver.
#[derive(Debug)]
pub struct PhaseOutput {
    pub step: Step,
    pub warnings: Vec<Warning>,
    /// Snapshot captured by this phase (only `Scan` produces one).
    pub analysis: Option<PackageAnalysis>,
}

impl PhaseOutput {
    #[must_use]
    pub fn done() -> Self {
        Self::with_warnings(Vec::new())
    }

    #[must_use]
    pub fn with_warnings(warnings: Vec<Warning>) -> Self {
        Self {
            step: Step::Continue,
            warnings,
            analysis: None,
        }
    }

    #[must_use]
    pub fn captured(analysis: PackageAnalysis, step: Step) -> Self {
        Self {
            step,
            warnings: analysis.issues.clone(),
            analysis: Some(analysis),
        }
    }
}

/// Per-run state: options, the analysis snapshot, accumulated warnings and
/// the committed phases.
#[derive(Debug)]
pub struct RunContext {
    options: TransformOptions,
    analysis: Option<PackageAnalysis>,
    warnings: Vec<Warning>,
    committed: Vec<Phase>,
}

impl RunContext {
    #[must_use]
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            analysis: None,
            warnings: Vec::new(),
            committed: Vec::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// The analysis snapshot, required by every phase that touches the tree.
    ///
    /// # Errors
    /// `AnalysisNotCaptured` if `Scan` has not completed.
    pub fn snapshot(&self, phase: Phase) -> Result<&PackageAnalysis, Error> {
        self.analysis.as_ref().ok_or(Error::AnalysisNotCaptured {
            phase: phase.as_str(),
        })
    }

    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn last_committed(&self) -> Option<Phase> {
        self.committed.last().copied()
    }

    fn commit(&mut self, phase: Phase, output: PhaseOutput) {
        if !output.warnings.is_empty() {
            warn!(%phase, count = output.warnings.len(), "Phase finished with warnings");
        }
        self.warnings.extend(output.warnings);
        if let Some(analysis) = output.analysis {
            self.analysis = Some(analysis);
        }
        self.committed.push(phase);
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum Outcome {
    /// Every phase ran. Warnings may exist.
    Completed,
    /// Stopped on request after analysis. Not an error.
    Aborted,
    /// A phase failed fatally; later phases never ran.
    Faulted { phase: Phase, error: Error },
}

/// Result of a run.
#[derive(Debug)]
pub struct RunReport {
    pub transformation: &'static str,
    pub outcome: Outcome,
    /// Phases that settled, in order.
    pub committed: Vec<Phase>,
    pub warnings: Vec<Warning>,
    pub analysis: Option<PackageAnalysis>,
    pub options: TransformOptions,
}

impl RunReport {
    #[must_use]
    pub fn last_committed(&self) -> Option<Phase> {
        self.committed.last().copied()
    }

    #[must_use]
    pub fn is_faulted(&self) -> bool {
        matches!(self.outcome, Outcome::Faulted { .. })
    }
}

/// A top-level transformation.
#[allow(async_fn_in_trait)]
pub trait Transformation {
    /// Name used in logs and reports.
    const NAME: &'static str;

    /// Ordered phases for a run with `options`.
    fn phases(&self, options: &TransformOptions) -> Vec<Phase>;

    /// Run one phase.
    ///
    /// # Errors
    /// Any fatal fault; the run stops at this phase.
    async fn execute(&self, phase: Phase, ctx: &RunContext) -> Result<PhaseOutput, Error>;

    /// Best-effort cleanup after a fault.
    async fn after_fault(&self, _ctx: &RunContext) -> Vec<Warning> {
        Vec::new()
    }
}

/// Run `transformation` to a terminal state.
pub async fn drive<T: Transformation>(transformation: &T, options: TransformOptions) -> RunReport {
    let mut ctx = RunContext::new(options);
    let mut outcome = Outcome::Completed;

    for phase in transformation.phases(&ctx.options) {
        info!(transformation = T::NAME, %phase, "Running phase");

        match transformation.execute(phase, &ctx).await {
            Ok(output) => {
                let step = output.step;
                ctx.commit(phase, output);
                if step == Step::Abort {
                    info!(%phase, "Stopping after phase");
                    outcome = Outcome::Aborted;
                    break;
                }
            }
            Err(e) => {
                error!(%phase, code = e.code(), error = %e, "Phase failed");
                let cleanup = transformation.after_fault(&ctx).await;
                ctx.warnings.extend(cleanup);
                outcome = Outcome::Faulted { phase, error: e };
                break;
            }
        }
    }

    RunReport {
        transformation: T::NAME,
        outcome,
        committed: ctx.committed,
        warnings: ctx.warnings,
        analysis: ctx.analysis,
        options: ctx.options,
    }
}

/// First normal component of a relative location, i.e. the top-level entry
/// of the package root that the location lives under.
pub(crate) fn top_level_name(location: &Path) -> Option<String> {
    match location
        .components()
        .find(|c| !matches!(c, Component::CurDir))?
    {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

/// Relative location joined with `/`, `.` segments dropped.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
