//! `ferry install` - fetch, verify, and publish the pinned binary.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::manifest::{Project, MANIFEST_FILE};
use crate::io::fetch;
use crate::ops::flow;
use crate::ops::lock::InstallLock;
use crate::ui::Output;

/// Run the full install pipeline for the current project.
pub async fn run() -> Result<()> {
    let out = Output;
    let cwd = std::env::current_dir()?;
    let project = Project::discover(&cwd)?.with_context(|| {
        format!(
            "no {MANIFEST_FILE} found in {} or any parent directory",
            cwd.display()
        )
    })?;

    // Held for the whole pipeline so concurrent installs serialize.
    let _lock = InstallLock::acquire(&project.lock_path())?;

    let tool = &project.manifest().tool;
    out.step(&format!("installing {} {}", tool.name, tool.version));

    let planned = flow::plan(&project)?;
    let client = fetch::build_client(&project.manifest().fetch)?;
    let installed = planned.fetch(&client).await?.verify()?.publish()?;

    out.success(&format!(
        "{} {} -> {}",
        tool.name,
        tool.version,
        installed.path.display()
    ));

    advise_on_path(&out, &project.bin_dir(), &tool.name);
    Ok(())
}

/// Point out when the published binary will not actually be picked up by
/// the user's shell.
fn advise_on_path(out: &Output, bin_dir: &Path, name: &str) {
    let on_path = std::env::var_os("PATH")
        .is_some_and(|path| std::env::split_paths(&path).any(|p| p == bin_dir));
    if !on_path {
        out.info(&format!(
            "add this to your shell profile: export PATH=\"{}:$PATH\"",
            bin_dir.display()
        ));
    }

    if let Ok(other) = which::which(name) {
        if other.parent() != Some(bin_dir) {
            out.warn(&format!(
                "'{name}' currently resolves to {}, which shadows the installed binary",
                other.display()
            ));
        }
    }
}
