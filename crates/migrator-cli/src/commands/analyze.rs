//! `addon-migrator analyze`: print the package snapshot without touching it.

use super::report;
use migrator_core::analyze;
use miette::Result;
use std::path::Path;

pub fn run(dir: &Path, json: bool) -> Result<()> {
    let analysis = analyze(dir).unwrap_or_else(|e| report::fail(&e, json));

    if json {
        println!(
            "{}",
            serde_json::json!({
                "ok": true,
                "analysis": analysis,
            })
        );
    } else {
        report::print_analysis(&analysis);
        report::print_warnings(&analysis.issues);
    }

    Ok(())
}
