//! `ferry uninstall` - best-effort removal of the installed binary.

use anyhow::Result;

use crate::core::manifest::{Project, MANIFEST_FILE};
use crate::ops::uninstall::{uninstall, UninstallOutcome};
use crate::ui::Output;

/// Remove the published binary and its store entry. Absence of either,
/// or of the whole project, is reported but never fails the command.
pub fn run() -> Result<()> {
    let out = Output;
    let cwd = std::env::current_dir()?;

    let project = match Project::discover(&cwd) {
        Ok(Some(project)) => project,
        Ok(None) => {
            out.warn(&format!("no {MANIFEST_FILE} found; nothing to uninstall"));
            return Ok(());
        }
        Err(e) => {
            out.warn(&format!("cannot read project manifest ({e}); nothing to uninstall"));
            return Ok(());
        }
    };

    let name = &project.manifest().tool.name;
    let bin_path = project.bin_dir().join(name);
    let install_dir = project.store_dir().join(name);

    match uninstall(&bin_path, &install_dir)? {
        UninstallOutcome::Removed { binary, store } => {
            if binary {
                out.success(&format!("removed {}", bin_path.display()));
            }
            if store {
                out.success(&format!("removed {}", install_dir.display()));
            }
        }
        UninstallOutcome::NothingToDo => {
            out.info(&format!("'{name}' is not installed; nothing to do"));
        }
    }
    Ok(())
}
