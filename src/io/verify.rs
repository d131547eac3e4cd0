//! Checksum verification of fetched binaries.
//!
//! The checksum manifest ships with the project in `sha256sum` layout: one
//! record per line, a 64-hex digest optionally followed by a file name.
//! Records are parsed into discrete values and verification requires an
//! exact digest match on a record that applies to the binary. A binary
//! that fails verification is quarantined in place: write and execute
//! permission are stripped so it cannot be run, but the file is kept for
//! inspection.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Sha256Digest;

/// Errors produced while verifying a fetched binary.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The checksum manifest could not be read.
    #[error("could not read checksum manifest {}: {source}", path.display())]
    Manifest {
        /// Path of the checksum manifest.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or quarantining the binary failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest has no record that applies to the binary.
    #[error("no checksum record applies to '{file}' (checked names: {candidates}); file quarantined")]
    NoRecord {
        /// File that was being verified.
        file: String,
        /// Names that were checked against the manifest.
        candidates: String,
    },

    /// Applicable records exist, but none matches the computed digest.
    #[error(
        "checksum mismatch for '{file}': computed {actual}, manifest lists {expected}; file quarantined"
    )]
    Mismatch {
        /// File that was being verified.
        file: String,
        /// Digest computed over the fetched file.
        actual: Sha256Digest,
        /// Digests the manifest lists for this file.
        expected: String,
    },
}

/// One checksum manifest line: a digest, optionally bound to a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    /// The expected digest.
    pub digest: Sha256Digest,
    /// File the digest covers; `None` applies to any file.
    pub filename: Option<String>,
}

/// Parsed checksum manifest.
#[derive(Debug, Clone, Default)]
pub struct ChecksumManifest {
    records: Vec<ChecksumRecord>,
}

impl ChecksumManifest {
    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, VerifyError> {
        let text = fs::read_to_string(path).map_err(|source| VerifyError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Parse manifest text.
    ///
    /// Blank lines and `#` comments are ignored. Lines that do not start
    /// with a valid digest are skipped with a warning rather than failing
    /// the whole manifest.
    pub fn parse(text: &str) -> Self {
        let mut records = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (digest_part, name_part) = match line.split_once(char::is_whitespace) {
                Some((digest, name)) => (digest, name.trim()),
                None => (line, ""),
            };
            match Sha256Digest::new(digest_part) {
                Ok(digest) => {
                    // sha256sum marks binary-mode files with a leading '*'.
                    let filename = name_part.trim_start_matches('*').trim();
                    records.push(ChecksumRecord {
                        digest,
                        filename: (!filename.is_empty()).then(|| filename.to_string()),
                    });
                }
                Err(e) => {
                    tracing::warn!(line = index + 1, "skipping malformed checksum record: {e}");
                }
            }
        }
        Self { records }
    }

    /// The parsed records, in manifest order.
    pub fn records(&self) -> &[ChecksumRecord] {
        &self.records
    }

    /// Whether the manifest holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Verify the file at `path` against the manifest.
///
/// A record applies when it names one of `candidates` or names no file at
/// all. Verification succeeds iff some applicable record's digest equals
/// the digest computed over the file. On failure the file is quarantined
/// before the error is returned.
///
/// # Errors
/// [`VerifyError::NoRecord`] when nothing in the manifest applies,
/// [`VerifyError::Mismatch`] when applicable records exist but none
/// matches, or an IO error from reading or quarantining the file.
pub fn verify_binary(
    path: &Path,
    manifest: &ChecksumManifest,
    candidates: &[String],
) -> Result<Sha256Digest, VerifyError> {
    let actual = digest_file(path)?;
    let applicable: Vec<&ChecksumRecord> = manifest
        .records
        .iter()
        .filter(|record| match &record.filename {
            Some(name) => candidates.iter().any(|candidate| candidate == name),
            None => true,
        })
        .collect();

    let file = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    if applicable.is_empty() {
        quarantine(path)?;
        return Err(VerifyError::NoRecord {
            file,
            candidates: candidates.join(", "),
        });
    }

    if applicable.iter().any(|record| record.digest == actual) {
        return Ok(actual);
    }

    quarantine(path)?;
    let expected = applicable
        .iter()
        .map(|record| record.digest.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(VerifyError::Mismatch {
        file,
        actual,
        expected,
    })
}

/// Compute the SHA-256 digest of a file (streaming).
///
/// # Errors
/// Returns an error when the file cannot be read.
pub fn digest_file(path: &Path) -> Result<Sha256Digest, VerifyError> {
    use sha2::{Digest, Sha256};

    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Sha256Digest::from_bytes(hasher.finalize().into()))
}

/// Strip write and execute permission, keeping the file for inspection.
fn quarantine(path: &Path) -> Result<(), VerifyError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o400))?;
    }
    #[cfg(not(unix))]
    {
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(path, perms)?;
    }
    Ok(())
}
