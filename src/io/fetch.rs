//! Streamed release download and extraction.
//!
//! The release archive is fetched with exactly one GET and flows through a
//! fully streamed pipeline: response bytes -> gzip decode -> tar unpack.
//! The payload is never buffered whole. Release archives are rooted in a
//! single wrapper directory, so exactly one leading path segment is
//! stripped from every entry; entries that are only the wrapper itself are
//! skipped. Entry file modes are preserved.
//!
//! Link entries are rejected outright; a symlink unpacked earlier could
//! route a later file outside the destination. For everything else the
//! remaining path must stay inside the destination and the cumulative
//! declared size must stay under [`MAX_UNPACKED_BYTES`].

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_compression::tokio::bufread::GzipDecoder;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use thiserror::Error;
use tokio_tar::Archive;
use tokio_util::io::StreamReader;

use crate::core::manifest::FetchSpec;

/// Upper bound on the total unpacked size of a release archive.
pub const MAX_UNPACKED_BYTES: u64 = 1024 * 1024 * 1024;

/// Errors fetching or unpacking a release archive.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure, including non-success status codes.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Decode, unpack, or filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A `[fetch]` option could not be applied to the client.
    #[error("invalid fetch option: {0}")]
    Config(String),

    /// An archive entry would land outside the install directory.
    #[error("archive entry '{}' escapes the install directory", path.display())]
    UnsafePath {
        /// The entry path as it appears in the archive.
        path: PathBuf,
    },

    /// An archive entry is a symlink or hard link.
    #[error("archive entry '{}' is a link; only plain files and directories are unpacked", path.display())]
    LinkEntry {
        /// The entry path as it appears in the archive.
        path: PathBuf,
    },

    /// The archive declares more content than the unpacked size bound.
    #[error("archive exceeds the unpacked size limit of {limit} bytes")]
    SizeLimit {
        /// The bound that was exceeded.
        limit: u64,
    },
}

/// Build the HTTP client, applying the manifest's `[fetch]` options.
///
/// # Errors
/// Returns an error when a header, proxy, or the client itself cannot be
/// constructed from the configured values.
pub fn build_client(fetch: &FetchSpec) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &fetch.headers {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::Config(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| FetchError::Config(format!("value for header '{name}': {e}")))?;
        headers.insert(header, value);
    }

    let mut builder = Client::builder()
        .user_agent(crate::USER_AGENT)
        .default_headers(headers);
    if let Some(proxy) = &fetch.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }
    if let Some(secs) = fetch.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// Fetch `url` and unpack the gzipped tar it serves into `dest`.
///
/// Issues exactly one GET. There is no retry; a transport or extraction
/// failure surfaces immediately and may leave partial content in `dest`,
/// which the next install wipes.
///
/// # Errors
/// Returns an error for transport failures, unsafe archive entries, or an
/// archive exceeding the unpacked size bound.
pub async fn download_and_unpack(client: &Client, url: &str, dest: &Path) -> Result<(), FetchError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let decoder = GzipDecoder::new(StreamReader::new(stream));
    unpack_archive(decoder, dest, MAX_UNPACKED_BYTES).await
}

/// Unpack a tar stream into `dest`, stripping one leading path segment.
async fn unpack_archive<R>(reader: R, dest: &Path, size_limit: u64) -> Result<(), FetchError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    tokio::fs::create_dir_all(dest).await?;

    let mut archive = Archive::new(reader);
    let mut entries = archive.entries()?;
    let mut unpacked: u64 = 0;

    while let Some(next) = entries.next().await {
        let mut entry = next?;
        let raw_path = entry.path()?.into_owned();

        // A link unpacked now could alias a later entry's path to anywhere.
        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            return Err(FetchError::LinkEntry { path: raw_path });
        }

        // Only plain relative names are acceptable before stripping.
        if raw_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::UnsafePath { path: raw_path });
        }

        let mut names = raw_path.components().filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        });
        names.next(); // the wrapper directory
        let stripped: PathBuf = names.collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&stripped);
        if !target.starts_with(dest) {
            return Err(FetchError::UnsafePath { path: raw_path });
        }

        unpacked = unpacked.saturating_add(entry.header().size()?);
        if unpacked > size_limit {
            return Err(FetchError::SizeLimit { limit: size_limit });
        }

        if kind.is_dir() {
            tokio::fs::create_dir_all(&target).await?;
            continue;
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        entry.unpack(&target).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    /// Build a gzipped tar from (path, content, mode) triples.
    fn gzipped_archive(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            builder.append_data(&mut header, path, *data).unwrap();
        }
        gzip(&builder.into_inner().unwrap())
    }

    /// Build a gzipped tar with raw v7 headers. `tar::Builder` refuses to
    /// write `..` components, which is exactly what the escape tests need.
    fn raw_gzipped_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, data) in entries {
            let mut header = [0u8; 512];
            header[..name.len()].copy_from_slice(name.as_bytes());
            header[100..108].copy_from_slice(b"0000644\0");
            header[108..116].copy_from_slice(b"0000000\0");
            header[116..124].copy_from_slice(b"0000000\0");
            header[124..136].copy_from_slice(format!("{:011o}\0", data.len()).as_bytes());
            header[136..148].copy_from_slice(b"00000000000\0");
            header[148..156].copy_from_slice(b"        ");
            header[156] = b'0';
            let sum: u32 = header.iter().map(|b| u32::from(*b)).sum();
            header[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());
            out.extend_from_slice(&header);
            out.extend_from_slice(data);
            out.extend_from_slice(&vec![0u8; (512 - data.len() % 512) % 512]);
        }
        out.extend_from_slice(&[0u8; 1024]);
        gzip(&out)
    }

    /// Build a gzipped tar whose first entry is a link of `kind`, followed
    /// by a file routed through the link name.
    fn gzipped_link_archive(kind: tar::EntryType, link: &str, target: &Path) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(kind);
        header.set_size(0);
        builder.append_link(&mut header, link, target).unwrap();

        let payload = b"owned";
        let mut file = tar::Header::new_gnu();
        file.set_size(payload.len() as u64);
        file.set_mode(0o644);
        builder
            .append_data(&mut file, format!("{link}/evil.txt"), payload.as_slice())
            .unwrap();
        gzip(&builder.into_inner().unwrap())
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[tokio::test]
    async fn strips_the_wrapper_directory() {
        let archive = gzipped_archive(&[
            ("monorepo-1.2.3/monorepo", b"#!/bin/sh\nexit 0\n".as_slice(), 0o755),
            ("monorepo-1.2.3/docs/readme.md", b"docs".as_slice(), 0o644),
        ]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");

        unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap();

        assert!(dest.join("monorepo").is_file());
        assert!(dest.join("docs/readme.md").is_file());
        assert!(!dest.join("monorepo-1.2.3").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn entry_modes_are_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let archive = gzipped_archive(&[("pkg/tool", b"bin".as_slice(), 0o755)]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");

        unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap();

        let mode = std::fs::metadata(dest.join("tool")).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0, "execute bit lost in extraction");
    }

    #[tokio::test]
    async fn wrapper_only_and_single_segment_entries_are_skipped() {
        let archive = gzipped_archive(&[("toplevel", b"stray".as_slice(), 0o644)]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");

        unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap();

        assert_eq!(std::fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn parent_traversal_is_rejected() {
        let archive = raw_gzipped_archive(&[("pkg/../../evil", b"owned")]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("inner/out");

        let err = unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::UnsafePath { .. }));
        assert!(!dir.path().join("evil").exists());
        assert!(!dir.path().join("inner/evil").exists());
    }

    #[tokio::test]
    async fn symlink_entries_are_rejected() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");
        // Symlink into the parent of `dest`, then a file through it.
        let archive = gzipped_link_archive(tar::EntryType::Symlink, "pkg/sneaky", dir.path());

        let err = unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::LinkEntry { .. }));
        assert!(!dir.path().join("evil.txt").exists());
        assert!(dest.join("sneaky").symlink_metadata().is_err());
    }

    #[tokio::test]
    async fn hard_link_entries_are_rejected() {
        let archive =
            gzipped_link_archive(tar::EntryType::Link, "pkg/alias", Path::new("/etc/passwd"));
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");

        let err = unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::LinkEntry { .. }));
    }

    #[tokio::test]
    async fn absolute_paths_are_rejected() {
        let archive = raw_gzipped_archive(&[("/etc/evil", b"owned")]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");

        let err = unpack_archive(GzipDecoder::new(&archive[..]), &dest, MAX_UNPACKED_BYTES)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnsafePath { .. }));
    }

    #[tokio::test]
    async fn unpacked_size_is_bounded() {
        let big = vec![0u8; 4096];
        let archive = gzipped_archive(&[("pkg/big", big.as_slice(), 0o644)]);
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");

        let err = unpack_archive(GzipDecoder::new(&archive[..]), &dest, 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::SizeLimit { limit: 1024 }));
        assert!(!dest.join("big").exists());
    }

    #[tokio::test]
    async fn downloads_with_a_single_get() {
        let mut server = mockito::Server::new_async().await;
        let archive = gzipped_archive(&[("pkg/tool", b"payload".as_slice(), 0o755)]);
        let mock = server
            .mock("GET", "/releases/download/v1.0.0/tool-x.tar.gz")
            .with_status(200)
            .with_body(archive)
            .expect(1)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("out");
        let client = build_client(&FetchSpec::default()).unwrap();
        let url = format!("{}/releases/download/v1.0.0/tool-x.tar.gz", server.url());

        download_and_unpack(&client, &url, &dest).await.unwrap();

        assert_eq!(std::fs::read(dest.join("tool")).unwrap(), b"payload");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_failure_surfaces_as_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing.tar.gz")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let client = build_client(&FetchSpec::default()).unwrap();
        let url = format!("{}/missing.tar.gz", server.url());

        let err = download_and_unpack(&client, &url, &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(_)));
    }

    #[test]
    fn client_rejects_a_bad_header_name() {
        let mut fetch = FetchSpec::default();
        fetch.headers.insert("bad header".to_string(), "v".to_string());
        let err = build_client(&fetch).unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }

    #[test]
    fn client_applies_the_full_fetch_spec() {
        let mut fetch = FetchSpec::default();
        fetch.headers.insert("authorization".to_string(), "Bearer t".to_string());
        fetch.proxy = Some("http://proxy.internal:3128".to_string());
        fetch.timeout_secs = Some(5);
        assert!(build_client(&fetch).is_ok());
    }
}
