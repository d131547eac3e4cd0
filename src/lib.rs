//! ferry - fetch, verify, and publish a project's pinned release binary.
//!
//! A project commits a `ferry.toml` naming one tool, one version, and the
//! repository that publishes its release archives. `ferry install` resolves
//! the current platform to a release target, streams the archive down,
//! checks the unpacked binary against the committed checksum manifest, and
//! atomically publishes it under `.ferry/bin`. `ferry run` executes it;
//! `ferry uninstall` removes it.
//!
//! # Architecture
//!
//! - **Typestate pipeline**: installs move through `PlannedInstall` →
//!   `FetchedInstall` → `VerifiedInstall` → `InstalledBinary`, so a binary
//!   that failed verification cannot reach the publish stage.
//! - **Newtypes**: `Sha256Digest`, `Target`, and `PlatformKey` keep digests,
//!   release targets, and platforms from blurring into strings.
//! - **Pure core**: `core` never touches the network or filesystem; all
//!   side effects live in `io` and `ops`.
//!
//! # Directory Layout
//!
//! ```text
//! <project>/
//! ├── ferry.toml          # tool pin, committed
//! ├── SHASUMS256.txt      # checksum manifest, committed
//! └── .ferry/
//!     ├── bin/            # published binaries (the PATH entry)
//!     ├── store/<tool>/   # unpacked release archives
//!     └── install.lock    # held for the duration of an install
//! ```

pub mod cmd;
pub mod core;
pub mod io;
pub mod ops;
pub mod types;
pub mod ui;

pub use crate::core::manifest::{Manifest, Project};
pub use crate::core::platform::{PlatformKey, PlatformTable, Target};
pub use crate::core::release::BinaryDescriptor;
pub use crate::ops::InstallError;
pub use crate::types::Sha256Digest;

/// User agent sent with every release download.
pub const USER_AGENT: &str = concat!("ferry/", env!("CARGO_PKG_VERSION"));

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "ferry")]
#[command(version = env!("FERRY_VERSION"))]
#[command(about = "Fetch, verify, and publish a project's pinned release binary")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install the binary pinned in ferry.toml
    Install,
    /// Run the installed binary
    Run {
        /// Arguments passed through to the binary untouched
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Remove the installed binary
    Uninstall,
    /// Compute sha256 digest lines for release assets (for release authoring)
    #[command(hide = true)]
    Checksum {
        /// Files to digest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
