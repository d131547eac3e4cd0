//! Best-effort removal of an installed binary.

use std::path::Path;

/// What an uninstall actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// At least one of the published binary and the store entry existed
    /// and was removed.
    Removed {
        /// The published binary was deleted from the bin directory.
        binary: bool,
        /// The tool's store directory was deleted.
        store: bool,
    },
    /// Neither the binary nor the store entry existed.
    NothingToDo,
}

/// Remove the published binary and the tool's store directory.
///
/// Absence of either is not an error; when both are absent the outcome is
/// [`UninstallOutcome::NothingToDo`].
///
/// # Errors
/// Returns an error only when something exists and cannot be deleted.
pub fn uninstall(bin_path: &Path, install_dir: &Path) -> std::io::Result<UninstallOutcome> {
    // symlink_metadata so a dangling symlink still counts as present.
    let binary = bin_path.symlink_metadata().is_ok();
    if binary {
        std::fs::remove_file(bin_path)?;
        tracing::debug!(path = %bin_path.display(), "removed published binary");
    }

    let store = install_dir.is_dir();
    if store {
        std::fs::remove_dir_all(install_dir)?;
        tracing::debug!(path = %install_dir.display(), "removed store entry");
    }

    if binary || store {
        Ok(UninstallOutcome::Removed { binary, store })
    } else {
        Ok(UninstallOutcome::NothingToDo)
    }
}
