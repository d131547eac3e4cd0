//! `ferry run` - execute the installed binary with passthrough arguments.

use anyhow::{Context, Result};

use crate::core::manifest::{Project, MANIFEST_FILE};
use crate::ops::run::run_binary;

/// Spawn the installed binary and exit with its status.
pub fn run(args: &[String]) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let project = Project::discover(&cwd)?.with_context(|| {
        format!(
            "no {MANIFEST_FILE} found in {} or any parent directory",
            cwd.display()
        )
    })?;

    let name = &project.manifest().tool.name;
    let bin_path = project.bin_dir().join(name);
    let status = run_binary(&bin_path, name, args)?;

    std::process::exit(exit_code(status));
}

/// Map the child's exit status onto our own exit code. Signal deaths map
/// to the conventional 128+signal.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
