//! Logging initialization for the CLI.
//!
//! The engine only emits `tracing` events; the binary owns the subscriber.

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = INFO, 1 = DEBUG, 2+ = TRACE
/// * `json` - If true, output JSON lines to stderr
///
/// Logs always go to stderr so stdout carries only the command's report.
pub fn init(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG wins for everything but the engine target
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(engine_directive(level));
    if verbosity > 0 {
        filter = filter.add_directive(level.into());
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = installed {
        eprintln!("warning: logging disabled: {e}");
    }
}

fn engine_directive(level: Level) -> Directive {
    format!("migrator_core={level}")
        .parse()
        .unwrap_or_else(|_| level.into())
}
