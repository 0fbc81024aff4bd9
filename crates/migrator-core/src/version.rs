/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string shown by the CLI.
#[must_use]
pub fn version_string() -> String {
    format!("addon-migrator {VERSION}")
}
