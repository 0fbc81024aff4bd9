//! `addon-migrator reset`: throw away a half-finished conversion.

use super::report;
use migrator_core::{GitRecovery, Recovery};
use miette::{IntoDiagnostic, Result};
use std::path::Path;

pub fn run(dir: &Path, json: bool) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    if let Err(e) = runtime.block_on(GitRecovery.reset(dir)) {
        report::fail(&e, json);
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "directory": dir.to_string_lossy(),
            })
        );
    } else {
        println!("Working tree reset: {}", dir.display());
    }
    Ok(())
}
