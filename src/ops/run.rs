//! Passthrough execution of the installed binary.

use std::path::Path;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors running the installed binary.
#[derive(Error, Debug)]
pub enum RunError {
    /// No binary is published under the expected name.
    #[error("'{name}' is not installed; run `ferry install` first")]
    NotInstalled {
        /// The tool name from the manifest.
        name: String,
    },

    /// The binary exists but could not be spawned.
    #[error("failed to run '{name}': {source}")]
    Spawn {
        /// The tool name from the manifest.
        name: String,
        /// The underlying spawn failure.
        source: std::io::Error,
    },
}

/// Spawn the published binary with `args`, inheriting stdio, and wait for
/// it to finish.
///
/// Arguments pass through untouched; nothing is interpreted as a ferry
/// flag. The caller maps the returned status onto its own exit code.
///
/// # Errors
/// Returns [`RunError::NotInstalled`] when the binary is absent and
/// [`RunError::Spawn`] when the OS refuses to execute it.
pub fn run_binary(bin_path: &Path, name: &str, args: &[String]) -> Result<ExitStatus, RunError> {
    if !bin_path.is_file() {
        return Err(RunError::NotInstalled { name: name.to_string() });
    }

    tracing::debug!(binary = %bin_path.display(), ?args, "spawning");
    let mut child = std::process::Command::new(bin_path)
        .args(args)
        .spawn()
        .map_err(|source| RunError::Spawn { name: name.to_string(), source })?;

    child
        .wait()
        .map_err(|source| RunError::Spawn { name: name.to_string(), source })
}
