//! Working-tree reset.

use crate::error::Error;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

/// Discards every working-tree change, untracked files included.
#[allow(async_fn_in_trait)]
pub trait Recovery {
    /// # Errors
    /// `Recovery` if the tree could not be reset.
    async fn reset(&self, dir: &Path) -> Result<(), Error>;
}

/// Resets with `git clean -f -d` followed by `git checkout .`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitRecovery;

impl GitRecovery {
    /// The git invocations a reset performs, in order.
    pub const STEPS: [&'static [&'static str]; 2] = [&["clean", "-f", "-d"], &["checkout", "."]];
}

impl Recovery for GitRecovery {
    async fn reset(&self, dir: &Path) -> Result<(), Error> {
        info!(dir = %dir.display(), "Resetting working tree");

        for args in Self::STEPS {
            let output = Command::new("git")
                .args(args)
                .current_dir(dir)
                .output()
                .await
                .map_err(|e| Error::Recovery {
                    dir: dir.to_path_buf(),
                    reason: format!("Failed to run git: {e}"),
                })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::Recovery {
                    dir: dir.to_path_buf(),
                    reason: format!("git {} failed: {}", args.join(" "), stderr.trim()),
                });
            }
        }

        Ok(())
    }
}
