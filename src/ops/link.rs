//! Atomic publish into the shared bin directory.
//!
//! The verified binary is copied to a temp file in the bin directory and
//! renamed over the final name, so a crash mid-publish never leaves a
//! half-written executable on the PATH. The rename replaces any previous
//! version in place.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors publishing a binary into the bin directory.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The binary could not be copied into the staging file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The staged file could not be renamed into place.
    #[error("failed to replace binary: {0}")]
    Replace(#[from] tempfile::PersistError),
}

/// Copy `source` into `bin_dir/name` via a temp file and atomic rename.
///
/// Returns the published path. The executable bit is set on the staged
/// copy before the rename, so the binary is never visible non-executable.
///
/// # Errors
/// Returns an error when staging or the final rename fails.
pub fn publish(source: &Path, bin_dir: &Path, name: &str) -> Result<PathBuf, LinkError> {
    std::fs::create_dir_all(bin_dir)?;

    // Staged in the bin directory itself so the rename never crosses a
    // filesystem boundary.
    let mut staged = tempfile::Builder::new()
        .prefix(".ferry-publish-")
        .tempfile_in(bin_dir)?;
    let mut reader = std::fs::File::open(source)?;
    std::io::copy(&mut reader, &mut staged)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o755))?;
    }

    let target = bin_dir.join(name);
    staged.persist(&target)?;
    tracing::debug!(target = %target.display(), "binary published");
    Ok(target)
}
