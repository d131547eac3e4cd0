use thiserror::Error;

/// Error produced when a string does not parse as a SHA-256 digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex portion is not 64 characters long.
    #[error("expected 64 hex characters, got {len} in '{input}'")]
    BadLength {
        /// Length of the hex portion that was found.
        len: usize,
        /// The offending input.
        input: String,
    },
    /// The hex portion contains a non-hex character.
    #[error("non-hex character in '{input}'")]
    NotHex {
        /// The offending input.
        input: String,
    },
}

/// A validated SHA-256 digest (64 lowercase hex characters).
///
/// This newtype ensures that all digests in the system are validated where
/// they enter it, preventing invalid hex strings from propagating through
/// the codebase. Comparison is byte-exact: digests are normalized to
/// lowercase at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a "sha256:" prefix.
    ///
    /// # Errors
    /// Returns an error if the digest is not exactly 64 hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            return Err(DigestError::BadLength {
                len: hex.len(),
                input: s,
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NotHex { input: s });
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Build a digest from raw SHA-256 output. Infallible: 32 bytes always
    /// encode to the 64 hex characters [`Sha256Digest::new`] accepts.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Get the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
