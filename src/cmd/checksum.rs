//! `ferry checksum` - print digest lines for release assets.
//!
//! Helper for whoever publishes the release: the output lines paste
//! directly into the project's checksum manifest.

use std::path::PathBuf;

use anyhow::Result;

use crate::io::verify::digest_file;

/// Print one `<digest>  <path>` line per file, sha256sum style.
pub fn run(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let digest = digest_file(file)?;
        println!("{digest}  {}", file.display());
    }
    Ok(())
}
