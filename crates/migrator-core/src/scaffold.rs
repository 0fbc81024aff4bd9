//! Package scaffolding through an external blueprint generator.

use crate::error::Error;
use crate::manifest::MANIFEST_NAME;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Environment variable overriding the generator command.
///
/// The value is split on whitespace; the first word is the program and the
/// rest are leading arguments.
pub const SCAFFOLD_ENV: &str = "ADDON_MIGRATOR_SCAFFOLD";

/// Generator command used when [`SCAFFOLD_ENV`] is unset.
pub const DEFAULT_SCAFFOLD_COMMAND: &str = "npx ember-cli";

/// Kind of package to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScaffoldKind {
    App,
}

impl ScaffoldKind {
    fn subcommand(self) -> &'static str {
        match self {
            Self::App => "new",
        }
    }
}

/// "Produce a fresh package of `kind` named `name` at `path`."
#[derive(Debug, Clone)]
pub struct ScaffoldRequest {
    pub kind: ScaffoldKind,
    pub name: String,
    pub path: PathBuf,
}

impl ScaffoldRequest {
    pub fn app(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ScaffoldKind::App,
            name: name.into(),
            path: path.into(),
        }
    }

    fn fault(&self, reason: impl Into<String>) -> Error {
        Error::Scaffold {
            name: self.name.clone(),
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

/// Generates fresh packages.
#[allow(async_fn_in_trait)]
pub trait Scaffold {
    /// # Errors
    /// `Scaffold` if the package could not be generated.
    async fn scaffold(&self, request: &ScaffoldRequest) -> Result<(), Error>;
}

impl<T: Scaffold + ?Sized> Scaffold for &T {
    async fn scaffold(&self, request: &ScaffoldRequest) -> Result<(), Error> {
        (**self).scaffold(request).await
    }
}

/// Scaffolds by spawning the blueprint generator.
#[derive(Debug, Clone)]
pub struct CommandScaffolder {
    program: String,
    leading_args: Vec<String>,
}

impl Default for CommandScaffolder {
    fn default() -> Self {
        Self::from_command_line(DEFAULT_SCAFFOLD_COMMAND)
    }
}

impl CommandScaffolder {
    /// Build from a whitespace-separated command line.
    #[must_use]
    pub fn from_command_line(command: &str) -> Self {
        let mut words = command.split_whitespace().map(String::from);
        let program = words.next().unwrap_or_else(|| "npx".to_string());
        Self {
            program,
            leading_args: words.collect(),
        }
    }

    /// Use the command from the environment or the default.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(SCAFFOLD_ENV) {
            Ok(command) if !command.trim().is_empty() => Self::from_command_line(&command),
            _ => Self::default(),
        }
    }

    /// Full argument list for a request.
    #[must_use]
    pub fn args(&self, request: &ScaffoldRequest) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            request.kind.subcommand().to_string(),
            request.name.clone(),
            "--directory".to_string(),
            request.path.to_string_lossy().into_owned(),
            "--skip-git".to_string(),
            "--skip-npm".to_string(),
        ]);
        args
    }
}

impl Scaffold for CommandScaffolder {
    async fn scaffold(&self, request: &ScaffoldRequest) -> Result<(), Error> {
        let args = self.args(request);
        info!(name = %request.name, path = %request.path.display(), "Scaffolding package");
        debug!(program = %self.program, ?args, "Running generator");

        let cwd = request.path.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(cwd)
            .await
            .map_err(|e| request.fault(format!("Failed to create parent directory: {e}")))?;

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(cwd)
            .output()
            .await
            .map_err(|e| request.fault(format!("Failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(request.fault(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if !request.path.join(MANIFEST_NAME).is_file() {
            return Err(request.fault("generator did not produce a package.json"));
        }

        Ok(())
    }
}
