//! Single-writer install lock.
//!
//! One lock file guards the whole `.ferry` tree for the duration of an
//! install, so two concurrent installs cannot interleave their store wipes
//! and bin publishes. The holder's PID is written into the file; a lock
//! that outlives its process is never broken automatically.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors acquiring the install lock.
#[derive(Error, Debug)]
pub enum LockError {
    /// Another process holds the lock.
    #[error(
        "another install is already running (pid {pid}, lock file {}); \
         remove the file if that process is gone",
        path.display()
    )]
    Held {
        /// Location of the lock file.
        path: PathBuf,
        /// PID recorded by the holder, or `unknown` if unreadable.
        pid: String,
    },

    /// The lock file could not be created or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive guard over the `.ferry` tree. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    path: PathBuf,
}

impl InstallLock {
    /// Take the lock by creating `path` exclusively and stamping it with
    /// this process's PID.
    ///
    /// # Errors
    /// Returns [`LockError::Held`] when the file already exists, or an IO
    /// error when it cannot be created.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    let _ = std::fs::remove_file(path);
                    return Err(e.into());
                }
                tracing::debug!(path = %path.display(), "install lock acquired");
                Ok(Self { path: path.to_path_buf() })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let pid = std::fs::read_to_string(path)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                Err(LockError::Held { path: path.to_path_buf(), pid })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release install lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_stamps_the_holder_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("install.lock");

        let _lock = InstallLock::acquire(&path).unwrap();

        let recorded = std::fs::read_to_string(&path).unwrap();
        assert_eq!(recorded.trim(), std::process::id().to_string());
    }

    #[test]
    fn second_acquire_reports_the_holder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("install.lock");

        let _lock = InstallLock::acquire(&path).unwrap();
        let err = InstallLock::acquire(&path).unwrap_err();

        match err {
            LockError::Held { pid, .. } => {
                assert_eq!(pid, std::process::id().to_string());
            }
            other => panic!("expected Held, got {other:?}"),
        }
    }

    #[test]
    fn dropping_the_lock_releases_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("install.lock");

        {
            let _lock = InstallLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());

        let _again = InstallLock::acquire(&path).unwrap();
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".ferry/install.lock");

        let _lock = InstallLock::acquire(&path).unwrap();
        assert!(path.exists());
    }
}
