//! The install pipeline, one typestate per stage.
//!
//! Planning is pure: it resolves the platform and derives the release
//! descriptor without touching the network or filesystem. Every later
//! transition consumes the previous state, so the stages run in order and
//! each runs at most once:
//!
//! ```text
//! plan -> PlannedInstall
//!           .fetch()   -> FetchedInstall     (download + unpack to store)
//!           .verify()  -> VerifiedInstall    (digest against checksums)
//!           .publish() -> InstalledBinary    (atomic rename into bin/)
//! ```
//!
//! A binary that fails verification is quarantined by the verify stage and
//! can never reach `publish`; the type system enforces that, not a flag.

use std::path::PathBuf;

use reqwest::Client;

use crate::core::manifest::Project;
use crate::core::platform::{PlatformKey, PlatformTable};
use crate::core::release::BinaryDescriptor;
use crate::io::fetch;
use crate::io::verify::{self, ChecksumManifest};
use crate::ops::error::InstallError;
use crate::types::Sha256Digest;

/// A fully resolved install that has not yet touched the network.
#[derive(Debug)]
pub struct PlannedInstall {
    /// What to fetch and where it lands.
    pub descriptor: BinaryDescriptor,
    checksum_path: PathBuf,
    bin_dir: PathBuf,
}

/// The archive has been downloaded and unpacked into the store.
#[derive(Debug)]
pub struct FetchedInstall {
    descriptor: BinaryDescriptor,
    checksum_path: PathBuf,
    bin_dir: PathBuf,
}

/// The unpacked binary matched a record in the checksum manifest.
#[derive(Debug)]
pub struct VerifiedInstall {
    descriptor: BinaryDescriptor,
    bin_dir: PathBuf,
    digest: Sha256Digest,
}

/// Terminal state: the binary is live on the project's bin path.
#[derive(Debug)]
pub struct InstalledBinary {
    /// Where the binary was published.
    pub path: PathBuf,
    /// The digest it was verified against.
    pub digest: Sha256Digest,
}

/// Resolve the current platform against the manifest and derive the
/// release descriptor.
///
/// # Errors
/// Returns an error when a `[targets]` key is malformed, the current
/// platform has no release target, or the `[tool]` table does not
/// describe a fetchable release.
pub fn plan(project: &Project) -> Result<PlannedInstall, InstallError> {
    let manifest = project.manifest();
    let table = match &manifest.targets {
        Some(pairs) => PlatformTable::from_pairs(pairs)?,
        None => PlatformTable::builtin(),
    };

    let key = PlatformKey::current();
    let target = table.resolve(&key)?;
    let descriptor = BinaryDescriptor::new(&manifest.tool, target, &project.store_dir())?;
    tracing::info!(
        tool = %descriptor.name,
        version = %descriptor.version,
        target = %descriptor.target,
        "install planned"
    );

    Ok(PlannedInstall {
        descriptor,
        checksum_path: project.checksum_path(),
        bin_dir: project.bin_dir(),
    })
}

impl PlannedInstall {
    /// Download the release archive and unpack it into the store.
    ///
    /// Any previous store entry for this tool is wiped first, so a failed
    /// earlier install can never contaminate this one.
    ///
    /// # Errors
    /// Returns an error when the download or extraction fails.
    pub async fn fetch(self, client: &Client) -> Result<FetchedInstall, InstallError> {
        let dir = &self.descriptor.install_dir;
        if dir.exists() {
            tokio::fs::remove_dir_all(dir).await?;
        }
        tokio::fs::create_dir_all(dir).await?;

        tracing::info!(url = %self.descriptor.url, "fetching release");
        fetch::download_and_unpack(client, &self.descriptor.url, dir).await?;

        Ok(FetchedInstall {
            descriptor: self.descriptor,
            checksum_path: self.checksum_path,
            bin_dir: self.bin_dir,
        })
    }
}

impl FetchedInstall {
    /// Check the unpacked binary against the project's checksum manifest.
    ///
    /// # Errors
    /// Returns an error when the manifest cannot be loaded, carries no
    /// applicable record, or the digests disagree. In the latter two cases
    /// the binary has been quarantined and will not be published.
    pub fn verify(self) -> Result<VerifiedInstall, InstallError> {
        let manifest = ChecksumManifest::load(&self.checksum_path)?;
        let candidates = self.descriptor.checksum_candidates();
        let digest = verify::verify_binary(&self.descriptor.bin_path, &manifest, &candidates)?;
        tracing::info!(digest = %digest, "checksum verified");

        Ok(VerifiedInstall {
            descriptor: self.descriptor,
            bin_dir: self.bin_dir,
            digest,
        })
    }
}

impl VerifiedInstall {
    /// Publish the verified binary into the bin directory.
    ///
    /// # Errors
    /// Returns an error when staging or the final rename fails.
    pub fn publish(self) -> Result<InstalledBinary, InstallError> {
        let path = crate::ops::link::publish(
            &self.descriptor.bin_path,
            &self.bin_dir,
            &self.descriptor.name,
        )?;
        tracing::info!(path = %path.display(), "binary installed");
        Ok(InstalledBinary { path, digest: self.digest })
    }
}
