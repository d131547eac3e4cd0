//! Aggregate error for the install pipeline.

use thiserror::Error;

use crate::core::platform::{InvalidPlatformKey, UnsupportedPlatform};
use crate::core::release::DescriptorError;
use crate::io::fetch::FetchError;
use crate::io::verify::VerifyError;

/// Everything that can go wrong between resolving the release target and
/// publishing the binary. Each stage's error converts in via `From`, so
/// the pipeline stays a chain of `?`.
#[derive(Error, Debug)]
pub enum InstallError {
    /// A `[targets]` key in the manifest is malformed.
    #[error("Config error: {0}")]
    Targets(#[from] InvalidPlatformKey),

    /// No release target is published for the current platform.
    #[error("Platform error: {0}")]
    Platform(#[from] UnsupportedPlatform),

    /// The `[tool]` table does not describe a fetchable release.
    #[error("Config error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// Download or extraction failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Checksum verification failed or could not run.
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// The verified binary could not be published.
    #[error("Publish error: {0}")]
    Link(#[from] crate::ops::link::LinkError),

    /// Filesystem failure outside any dedicated stage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
