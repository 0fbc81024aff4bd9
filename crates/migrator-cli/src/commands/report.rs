//! Human and JSON rendering of run reports.
//!
//! JSON goes to stdout as exactly one object per invocation. Human output
//! goes to stdout, except errors which go to stderr.

use migrator_core::{Error, Outcome, PackageAnalysis, Phase, RunReport, Warning, WorkspaceShape};
use serde_json::{json, Value};

/// Printed after a fault that may have left the tree half-converted.
pub const RESET_HINT: &str = "run `addon-migrator reset` to restore the working tree";

fn outcome_name(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Completed => "completed",
        Outcome::Aborted => "aborted",
        Outcome::Faulted { .. } => "faulted",
    }
}

/// JSON shape of a fatal error.
pub fn error_json(error: &Error, phase: Option<Phase>) -> Value {
    let mut value = json!({
        "code": error.code(),
        "message": error.to_string(),
    });
    if let Some(phase) = phase {
        value["phase"] = json!(phase.as_str());
    }
    value
}

/// JSON shape of a whole run.
pub fn to_json(report: &RunReport) -> Value {
    let committed: Vec<&str> = report.committed.iter().map(|p| p.as_str()).collect();
    let mut value = json!({
        "ok": !report.is_faulted(),
        "transformation": report.transformation,
        "outcome": outcome_name(&report.outcome),
        "committed": committed,
        "warnings": report.warnings,
        "analysis": report.analysis,
        "options": report.options,
    });
    if let Outcome::Faulted { phase, error } = &report.outcome {
        value["error"] = error_json(error, Some(*phase));
    }
    value
}

/// Print a run report and exit 1 if it faulted.
pub fn finish(report: &RunReport, json: bool) -> miette::Result<()> {
    if json {
        println!("{}", to_json(report));
    } else {
        match &report.outcome {
            Outcome::Completed => println!("Done! ✨"),
            Outcome::Aborted => {
                if let Some(analysis) = &report.analysis {
                    print_analysis(analysis);
                    println!();
                }
                println!("Analysis only; nothing was changed.");
            }
            Outcome::Faulted { phase, error } => {
                eprintln!("error: {phase} failed: {error}");
                if *phase != Phase::Scan {
                    eprintln!("hint: {RESET_HINT}");
                }
            }
        }
        print_warnings(&report.warnings);
    }

    if report.is_faulted() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print a fault that happened outside a run and exit 1.
pub fn fail(error: &Error, json: bool) -> ! {
    if json {
        println!(
            "{}",
            json!({
                "ok": false,
                "error": error_json(error, None),
            })
        );
    } else {
        eprintln!("error: {error}");
    }
    std::process::exit(1);
}

pub fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    println!();
    println!("Warnings ({}):", warnings.len());
    for warning in warnings {
        println!("  {warning}");
    }
}

pub fn print_analysis(analysis: &PackageAnalysis) {
    println!("Package:         {}", analysis.name);
    println!("Root:            {}", analysis.root.display());
    println!("Package manager: {}", analysis.package_manager);
    match (&analysis.workspace_shape, &analysis.workspace_root) {
        (WorkspaceShape::Monorepo, Some(root)) => {
            println!("Workspace:       member of {}", root.display());
        }
        _ => println!("Workspace:       none (solo package)"),
    }
    println!("Entry point:     {}", analysis.entry_point);

    for (title, deps) in [
        ("Dependencies", &analysis.dependencies),
        ("Dev dependencies", &analysis.dev_dependencies),
    ] {
        println!();
        println!("{title} ({}):", deps.len());
        for (name, version) in deps.iter() {
            println!("  {name} {version}");
        }
    }
}
