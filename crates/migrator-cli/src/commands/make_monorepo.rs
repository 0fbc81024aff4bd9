//! `addon-migrator make-monorepo` command implementation.

use super::report;
use migrator_core::TransformOptions;
use miette::{IntoDiagnostic, Result};

pub fn run(options: TransformOptions, json: bool) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let run = runtime.block_on(migrator_core::make_monorepo(options));
    report::finish(&run, json)
}
