//! Platform identification and the release target allow-list.
//!
//! A [`PlatformKey`] names the host as a normalized `os-arch-endianness`
//! triple (`darwin-x64-le`). A [`PlatformTable`] maps keys to the release
//! target identifiers that appear in published artifact names. The table is
//! an immutable value handed to resolution; a key that is absent from it is
//! always an error, never a default.

use std::collections::BTreeMap;

use thiserror::Error;

/// A release target identifier, e.g. `x86_64-apple-darwin`.
///
/// Target names are opaque to this crate beyond their use in artifact
/// file names; they are whatever the release pipeline publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(String);

impl Target {
    /// Get the target as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The host platform as a normalized `os-arch-endianness` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    os: String,
    arch: String,
    endian: String,
}

impl PlatformKey {
    /// Identify the platform this process is running on.
    pub fn current() -> Self {
        let endian = if cfg!(target_endian = "little") {
            "little"
        } else {
            "big"
        };
        Self {
            os: normalize_os(std::env::consts::OS),
            arch: normalize_arch(std::env::consts::ARCH),
            endian: normalize_endian(endian),
        }
    }

    /// Parse a key written as `os-arch-endianness`, normalizing each segment.
    ///
    /// # Errors
    /// Returns an error when the key does not have exactly three non-empty
    /// segments.
    pub fn parse(key: &str) -> Result<Self, InvalidPlatformKey> {
        let mut segments = key.split('-');
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(os), Some(arch), Some(endian), None)
                if !os.is_empty() && !arch.is_empty() && !endian.is_empty() =>
            {
                Ok(Self {
                    os: normalize_os(os),
                    arch: normalize_arch(arch),
                    endian: normalize_endian(endian),
                })
            }
            _ => Err(InvalidPlatformKey {
                key: key.to_string(),
                reason: "expected <os>-<arch>-<endianness>",
            }),
        }
    }
}

impl std::fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.os, self.arch, self.endian)
    }
}

/// Normalize an OS name to the vocabulary used by release hosts.
fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" => "darwin".to_string(),
        other => other.to_string(),
    }
}

/// Normalize an architecture name.
fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "x86_64" | "amd64" => "x64".to_string(),
        "aarch64" => "arm64".to_string(),
        other => other.to_string(),
    }
}

/// Normalize an endianness name.
fn normalize_endian(endian: &str) -> String {
    match endian.to_lowercase().as_str() {
        "little" => "le".to_string(),
        "big" => "be".to_string(),
        other => other.to_string(),
    }
}

/// A platform key that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid platform key '{key}': {reason}")]
pub struct InvalidPlatformKey {
    /// The offending key.
    pub key: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

/// The host platform has no entry in the release target table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no release target is published for platform {key}")]
pub struct UnsupportedPlatform {
    /// The key that missed the table.
    pub key: PlatformKey,
}

/// Immutable mapping from platform keys to release targets.
#[derive(Debug, Clone)]
pub struct PlatformTable {
    targets: BTreeMap<String, Target>,
}

impl PlatformTable {
    /// The targets this project's releases are built for by default.
    pub fn builtin() -> Self {
        let pairs = [
            ("darwin-x64-le", "x86_64-apple-darwin"),
            ("darwin-arm64-le", "aarch64-apple-darwin"),
            ("linux-x64-le", "x86_64-unknown-linux-gnu"),
            ("linux-arm64-le", "aarch64-unknown-linux-gnu"),
        ];
        let targets = pairs
            .into_iter()
            .map(|(key, target)| (key.to_string(), Target(target.to_string())))
            .collect();
        Self { targets }
    }

    /// Build a table from configured key/target pairs, replacing the
    /// built-in list entirely.
    ///
    /// # Errors
    /// Returns an error when a key does not parse or a target is empty.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, InvalidPlatformKey>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut targets = BTreeMap::new();
        for (key, target) in pairs {
            let parsed = PlatformKey::parse(key.as_ref())?;
            let target = target.into();
            if target.trim().is_empty() {
                return Err(InvalidPlatformKey {
                    key: key.as_ref().to_string(),
                    reason: "release target must not be empty",
                });
            }
            targets.insert(parsed.to_string(), Target(target));
        }
        Ok(Self { targets })
    }

    /// Look up the release target for a platform.
    ///
    /// # Errors
    /// Returns [`UnsupportedPlatform`] when the key is absent.
    pub fn resolve(&self, key: &PlatformKey) -> Result<&Target, UnsupportedPlatform> {
        self.targets
            .get(&key.to_string())
            .ok_or_else(|| UnsupportedPlatform { key: key.clone() })
    }

    /// Number of platforms in the table.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
