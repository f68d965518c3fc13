//! Single-writer lock file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Exclusive claim on a database directory for writing.
///
/// Held as a `LOCK` file created with `create_new`, so at most one writer can
/// own a directory at a time. The file is removed when the guard drops. A
/// process killed while writing leaves the file behind; it must then be
/// removed by hand.
#[derive(Debug)]
pub struct WriterLock {
    path: PathBuf,
}

impl WriterLock {
    /// Claims the lock file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another writer holds the lock, or an IO error if
    /// the file cannot be created.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let dir = path.parent().unwrap_or(path);
                return Err(Error::Locked(dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            let _ = fs::remove_file(path);
            return Err(e.into());
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release writer lock");
        }
    }
}
