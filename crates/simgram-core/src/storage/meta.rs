//! Database metadata file.
//!
//! `simgram.json` records the build options and how much of the corpus and
//! which buckets are committed. It is written last on close, through a temp
//! file and a rename: replacing it is the commit point of a write session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::IndexOptions;

/// Current metadata format version.
pub const FORMAT_VERSION: u32 = 1;

/// Persisted description of a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    /// Format version of the whole database directory.
    pub format_version: u32,
    /// Options the index was built with.
    pub options: IndexOptions,
    /// Number of committed strings.
    pub string_count: u32,
    /// Committed length of the corpus log in bytes.
    pub corpus_bytes: u64,
    /// Persisted length buckets: size to the string count of the commit
    /// that last wrote the bucket file.
    pub buckets: BTreeMap<u32, u32>,
}

impl DatabaseMeta {
    /// Metadata of a freshly created, empty database.
    #[must_use]
    pub fn new(options: IndexOptions) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            options,
            string_count: 0,
            corpus_bytes: 0,
            buckets: BTreeMap::new(),
        }
    }

    /// Reads and validates the metadata file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if the file cannot be parsed or describes an
    /// unsupported format.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let meta: Self = serde_json::from_slice(&data)
            .map_err(|e| Error::Corrupted(format!("{}: {e}", path.display())))?;

        if meta.format_version != FORMAT_VERSION {
            return Err(Error::Corrupted(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                meta.format_version
            )));
        }
        meta.options
            .validate()
            .map_err(|e| Error::Corrupted(format!("stored options: {e}")))?;
        Ok(meta)
    }

    /// Atomically replaces the metadata file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn store(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
