//! The `ferry.toml` project manifest.
//!
//! A project pins exactly one distributed tool. The manifest is discovered
//! by walking ancestor directories from the invocation directory, the same
//! way build tools find their project files. The directory holding
//! `ferry.toml` is the project root; everything ferry writes lives under
//! `<root>/.ferry/`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "ferry.toml";

/// Directory under the project root holding ferry state.
const FERRY_DIR: &str = ".ferry";

/// Default name of the bundled checksum manifest.
const DEFAULT_CHECKSUMS: &str = "SHASUMS256.txt";

/// Parsed contents of `ferry.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// The tool this project wraps.
    pub tool: ToolSpec,
    /// Transport options passed through to the HTTP client.
    #[serde(default)]
    pub fetch: FetchSpec,
    /// Platform-key to release-target pairs. When present, this table
    /// replaces the built-in allow-list entirely.
    #[serde(default)]
    pub targets: Option<BTreeMap<String, String>>,
}

impl Manifest {
    /// Parse manifest text.
    ///
    /// # Errors
    /// Returns the underlying TOML error on malformed input.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// The `[tool]` table: which binary to install and where it is released.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolSpec {
    /// Name of the installed binary.
    pub name: String,
    /// Pinned release version (semantic version, no leading `v`).
    pub version: String,
    /// Repository URL the release page hangs off of.
    pub repository: String,
    /// Base name of the release archive when it differs from `name`.
    /// Release pipelines often name archives after the project rather
    /// than the tool.
    #[serde(default)]
    pub archive: Option<String>,
    /// Path of the bundled checksum manifest, relative to the project root.
    #[serde(default = "default_checksums")]
    pub checksums: String,
}

fn default_checksums() -> String {
    DEFAULT_CHECKSUMS.to_string()
}

/// The `[fetch]` table: an opaque bag of transport options.
///
/// Ferry does not interpret these beyond handing them to the HTTP client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchSpec {
    /// Extra request headers, e.g. an authorization token for a private
    /// release host.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Proxy URL for all requests.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Overall request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Errors reading or parsing a project manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("could not read {}: {source}", path.display())]
    Io {
        /// Path of the manifest file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The manifest file is not valid TOML for this schema.
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        /// Path of the manifest file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// A discovered project: its root directory and parsed manifest.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    manifest: Manifest,
}

impl Project {
    /// Find and load the nearest `ferry.toml` at or above `start`.
    ///
    /// Returns `Ok(None)` when no ancestor directory holds a manifest.
    ///
    /// # Errors
    /// Returns an error when a manifest is found but cannot be read or
    /// parsed.
    pub fn discover(start: &Path) -> Result<Option<Self>, ManifestError> {
        let mut current = start;
        loop {
            if current.join(MANIFEST_FILE).is_file() {
                return Self::load(current.to_path_buf()).map(Some);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// Load the manifest in `root`.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or parsed.
    pub fn load(root: PathBuf) -> Result<Self, ManifestError> {
        let path = root.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let manifest = Manifest::parse(&text).map_err(|source| ManifestError::Parse { path, source })?;
        Ok(Self { root, manifest })
    }

    /// The directory holding `ferry.toml`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The parsed manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Ferry state directory: `<root>/.ferry`.
    pub fn ferry_home(&self) -> PathBuf {
        self.root.join(FERRY_DIR)
    }

    /// Shared binary directory: `<root>/.ferry/bin`.
    pub fn bin_dir(&self) -> PathBuf {
        self.ferry_home().join("bin")
    }

    /// Per-tool staging area: `<root>/.ferry/store`.
    pub fn store_dir(&self) -> PathBuf {
        self.ferry_home().join("store")
    }

    /// Advisory install lock: `<root>/.ferry/install.lock`.
    pub fn lock_path(&self) -> PathBuf {
        self.ferry_home().join("install.lock")
    }

    /// Location of the bundled checksum manifest.
    pub fn checksum_path(&self) -> PathBuf {
        self.root.join(&self.manifest.tool.checksums)
    }
}
