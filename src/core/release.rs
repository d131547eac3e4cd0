//! Release artifact location.
//!
//! Pure construction of everything the install pipeline needs to know
//! about one release: the archive URL and the filesystem paths the binary
//! moves through. No I/O happens here; configuration problems are caught
//! before the first byte is fetched.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::manifest::ToolSpec;
use crate::core::platform::Target;

/// Tool configuration that cannot describe a fetchable release.
///
/// Construction collects every problem it finds rather than stopping at
/// the first, so one failed run reports the whole repair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid tool configuration: {}", problems.join("; "))]
pub struct DescriptorError {
    /// Everything wrong with the configuration, in the order found.
    pub problems: Vec<String>,
}

/// Everything needed to fetch, verify, and publish one release binary.
///
/// Invariant: `bin_path` is always `install_dir` joined with `name`.
/// Descriptors are built fresh per invocation and never persisted.
#[derive(Debug, Clone)]
pub struct BinaryDescriptor {
    /// Name of the installed binary.
    pub name: String,
    /// Base name of the release archive (defaults to `name`).
    pub archive: String,
    /// Pinned release version.
    pub version: String,
    /// Release target the archive was built for.
    pub target: String,
    /// Full download URL of the release archive.
    pub url: String,
    /// Directory the archive is unpacked into.
    pub install_dir: PathBuf,
    /// Path of the unpacked binary inside `install_dir`.
    pub bin_path: PathBuf,
}

impl BinaryDescriptor {
    /// Build a descriptor for `tool` released for `target`, staged under
    /// `store_dir`.
    ///
    /// # Errors
    /// Returns every configuration problem found: empty or unusable tool
    /// name, a version that is not a semantic version, a repository that
    /// is not an http(s) URL.
    pub fn new(tool: &ToolSpec, target: &Target, store_dir: &Path) -> Result<Self, DescriptorError> {
        let mut problems = Vec::new();

        let name = tool.name.trim();
        if name.is_empty() {
            problems.push("tool name must not be empty".to_string());
        } else if name.contains('/') || name.contains('\\') {
            problems.push(format!("tool name '{name}' must not contain path separators"));
        }

        if let Err(e) = semver::Version::parse(&tool.version) {
            problems.push(format!(
                "version '{}' is not a semantic version: {e}",
                tool.version
            ));
        }

        let repository = tool.repository.trim_end_matches('/');
        match reqwest::Url::parse(repository) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => problems.push(format!(
                "repository URL must use http or https, not '{}'",
                url.scheme()
            )),
            Err(e) => problems.push(format!(
                "repository '{}' is not a valid URL: {e}",
                tool.repository
            )),
        }

        if !problems.is_empty() {
            return Err(DescriptorError { problems });
        }

        let archive = tool.archive.as_deref().unwrap_or(name).to_string();
        let url = format!(
            "{repository}/releases/download/v{version}/{archive}-{target}.tar.gz",
            version = tool.version,
        );
        let install_dir = store_dir.join(name);
        let bin_path = install_dir.join(name);

        Ok(Self {
            name: name.to_string(),
            archive,
            version: tool.version.clone(),
            target: target.as_str().to_string(),
            url,
            install_dir,
            bin_path,
        })
    }

    /// File names under which the checksum manifest may list this binary:
    /// the bare tool name, or the per-target artifact name.
    pub fn checksum_candidates(&self) -> Vec<String> {
        vec![self.name.clone(), format!("{}-{}", self.archive, self.target)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{PlatformKey, PlatformTable};

    fn tool(name: &str, version: &str, repository: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            version: version.to_string(),
            repository: repository.to_string(),
            archive: None,
            checksums: "SHASUMS256.txt".to_string(),
        }
    }

    fn darwin_x64() -> Target {
        let table = PlatformTable::builtin();
        let key = PlatformKey::parse("darwin-x64-le").unwrap();
        table.resolve(&key).unwrap().clone()
    }

    #[test]
    fn composes_the_release_url() {
        let spec = tool(
            "monorepo",
            "1.2.3",
            "https://github.com/typescript-tools/typescript-tools",
        );
        let descriptor = BinaryDescriptor::new(&spec, &darwin_x64(), Path::new("/store")).unwrap();
        assert_eq!(
            descriptor.url,
            "https://github.com/typescript-tools/typescript-tools/releases/download/v1.2.3/monorepo-x86_64-apple-darwin.tar.gz"
        );
    }

    #[test]
    fn bin_path_is_install_dir_joined_with_name() {
        let spec = tool("monorepo", "1.2.3", "https://example.com/acme/tool");
        let descriptor = BinaryDescriptor::new(&spec, &darwin_x64(), Path::new("/store")).unwrap();
        assert_eq!(descriptor.install_dir, Path::new("/store/monorepo"));
        assert_eq!(descriptor.bin_path, descriptor.install_dir.join("monorepo"));
    }

    #[test]
    fn archive_override_changes_the_artifact_base_name() {
        let mut spec = tool("monorepo", "1.2.3", "https://example.com/acme/tool");
        spec.archive = Some("typescript-tools".to_string());
        let descriptor = BinaryDescriptor::new(&spec, &darwin_x64(), Path::new("/store")).unwrap();
        assert!(
            descriptor
                .url
                .ends_with("/typescript-tools-x86_64-apple-darwin.tar.gz")
        );
        // The published binary keeps the tool name.
        assert_eq!(descriptor.bin_path.file_name().unwrap(), "monorepo");
    }

    #[test]
    fn trailing_repository_slash_is_tolerated() {
        let spec = tool("tool", "1.0.0", "https://example.com/acme/tool/");
        let descriptor = BinaryDescriptor::new(&spec, &darwin_x64(), Path::new("/store")).unwrap();
        assert!(!descriptor.url.contains("tool//releases"));
    }

    #[test]
    fn collects_every_problem() {
        let spec = tool("", "not-a-version", "ftp://example.com/x");
        let err = BinaryDescriptor::new(&spec, &darwin_x64(), Path::new("/store")).unwrap_err();
        assert_eq!(err.problems.len(), 3);
        let rendered = err.to_string();
        assert!(rendered.contains("name"));
        assert!(rendered.contains("semantic version"));
        assert!(rendered.contains("http"));
    }

    #[test]
    fn checksum_candidates_cover_both_artifact_names() {
        let mut spec = tool("monorepo", "1.2.3", "https://example.com/acme/tool");
        spec.archive = Some("typescript-tools".to_string());
        let descriptor = BinaryDescriptor::new(&spec, &darwin_x64(), Path::new("/store")).unwrap();
        let candidates = descriptor.checksum_candidates();
        assert!(candidates.contains(&"monorepo".to_string()));
        assert!(candidates.contains(&"typescript-tools-x86_64-apple-darwin".to_string()));
    }
}
