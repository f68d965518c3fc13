//! Append-only string corpus.
//!
//! Strings are stored back to back in `strings.log`:
//!
//! ```text
//! [Len: 4 bytes LE][UTF-8 bytes] [Len][bytes] ...
//! ```
//!
//! The string ID is the record's position in the log. Only the prefix
//! recorded in the metadata as committed is ever read; bytes past it belong
//! to a session that never closed and are discarded by the next writer.

use memmap2::{Mmap, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};

const LEN_PREFIX: u64 = 4;

/// Appends strings to the corpus log.
pub struct CorpusWriter {
    log: BufWriter<File>,
    /// Bytes in the log, committed or not.
    len: u64,
    count: u32,
    /// Set after a failed append; the log tail is unknown from then on.
    poisoned: bool,
}

impl CorpusWriter {
    /// Opens the log at `path` for appending after the committed prefix.
    ///
    /// Any uncommitted tail left by an interrupted session is truncated.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if the log is shorter than `committed_len`, or an
    /// IO error if it cannot be opened.
    pub fn open(path: &Path, committed_len: u64, committed_count: u32) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let actual = file.metadata()?.len();
        if actual < committed_len {
            return Err(Error::Corrupted(format!(
                "corpus log has {actual} bytes, {committed_len} committed"
            )));
        }
        if actual > committed_len {
            tracing::warn!(
                discarded_bytes = actual - committed_len,
                "Discarding uncommitted corpus tail"
            );
            file.set_len(committed_len)?;
        }
        file.seek(SeekFrom::Start(committed_len))?;

        Ok(Self {
            log: BufWriter::new(file),
            len: committed_len,
            count: committed_count,
            poisoned: false,
        })
    }

    /// Appends `text` and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for strings over 4 GiB, `Storage` once the
    /// ID space is exhausted or after an earlier failed append.
    pub fn append(&mut self, text: &str) -> Result<u32> {
        let (next, len) = self.admit(text)?;
        let id = self.count;

        let written = self
            .log
            .write_all(&len.to_le_bytes())
            .and_then(|()| self.log.write_all(text.as_bytes()));
        if let Err(e) = written {
            self.poisoned = true;
            return Err(e.into());
        }

        self.len += LEN_PREFIX + u64::from(len);
        self.count = next;
        Ok(id)
    }

    /// Checks that `text` can be appended without writing anything.
    ///
    /// # Errors
    ///
    /// Fails exactly when [`append`](Self::append) would fail before
    /// touching the log.
    pub fn check_append(&self, text: &str) -> Result<()> {
        self.admit(text).map(|_| ())
    }

    /// Next string count and the record length for `text`.
    fn admit(&self, text: &str) -> Result<(u32, u32)> {
        if self.poisoned {
            return Err(Error::Storage(
                "corpus log is in an unknown state after a failed write".to_string(),
            ));
        }
        let next = self
            .count
            .checked_add(1)
            .ok_or_else(|| Error::Storage("corpus is full".to_string()))?;
        let len = u32::try_from(text.len())
            .map_err(|_| Error::InvalidArgument("string exceeds 4 GiB".to_string()))?;
        Ok((next, len))
    }

    /// Flushes and syncs the log; returns `(bytes, strings)` now durable.
    ///
    /// # Errors
    ///
    /// Returns an IO error if flushing fails.
    pub fn commit(&mut self) -> Result<(u64, u32)> {
        if self.poisoned {
            return Err(Error::Storage(
                "refusing to commit a corpus log after a failed write".to_string(),
            ));
        }
        self.log.flush()?;
        self.log.get_ref().sync_data()?;
        Ok((self.len, self.count))
    }

    /// Number of strings, committed or not.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Log length in bytes, committed or not.
    #[must_use]
    pub fn len_bytes(&self) -> u64 {
        self.len
    }
}

/// Read-only view of the committed corpus.
pub struct CorpusReader {
    map: Option<Mmap>,
    /// Offset of each record's length prefix, indexed by string ID.
    offsets: Vec<usize>,
}

impl CorpusReader {
    /// Maps the committed prefix of the log at `path` and indexes its records.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if the log is missing, too short, or its record
    /// structure disagrees with `committed_count`.
    pub fn open(path: &Path, committed_len: u64, committed_count: u32) -> Result<Self> {
        if committed_count == 0 {
            return Ok(Self {
                map: None,
                offsets: Vec::new(),
            });
        }

        let file = File::open(path).map_err(|e| {
            Error::Corrupted(format!("corpus log {} unreadable: {e}", path.display()))
        })?;
        let actual = file.metadata()?.len();
        if actual < committed_len {
            return Err(Error::Corrupted(format!(
                "corpus log has {actual} bytes, {committed_len} committed"
            )));
        }
        let len = usize::try_from(committed_len)
            .map_err(|_| Error::Storage("corpus log too large to map".to_string()))?;

        // SAFETY: the committed prefix is never rewritten. Writers append past
        // it, and only truncate bytes beyond the latest committed length,
        // which is never shorter than this one.
        let map = unsafe { MmapOptions::new().len(len).map(&file)? };
        let offsets = Self::scan(&map, committed_count)?;

        Ok(Self {
            map: Some(map),
            offsets,
        })
    }

    fn scan(data: &[u8], expected: u32) -> Result<Vec<usize>> {
        let mut offsets = Vec::with_capacity(expected as usize);
        let mut pos = 0usize;
        while pos < data.len() {
            let len = read_len(data, pos)?;
            let end = pos + 4 + len;
            if end > data.len() {
                return Err(Error::Corrupted(format!(
                    "corpus record at offset {pos} overruns the committed log"
                )));
            }
            offsets.push(pos);
            pos = end;
        }
        if offsets.len() != expected as usize {
            return Err(Error::Corrupted(format!(
                "corpus log holds {} strings, metadata says {expected}",
                offsets.len()
            )));
        }
        Ok(offsets)
    }

    /// Number of committed strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Returns the string with `id`.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if `id` is out of range or the record is not UTF-8.
    pub fn get(&self, id: u32) -> Result<&str> {
        let (Some(map), Some(&offset)) = (self.map.as_ref(), self.offsets.get(id as usize)) else {
            return Err(Error::Corrupted(format!(
                "string id {id} out of range ({} strings)",
                self.offsets.len()
            )));
        };
        let len = read_len(map, offset)?;
        let bytes = &map[offset + 4..offset + 4 + len];
        std::str::from_utf8(bytes)
            .map_err(|e| Error::Corrupted(format!("string {id} is not valid UTF-8: {e}")))
    }

    /// Iterates over all committed strings in ID order.
    pub fn iter(&self) -> impl Iterator<Item = Result<&str>> + '_ {
        (0..self.offsets.len()).map(|id| self.get(id as u32))
    }
}

fn read_len(data: &[u8], pos: usize) -> Result<usize> {
    let bytes: [u8; 4] = data
        .get(pos..pos + 4)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            Error::Corrupted(format!("truncated corpus record header at offset {pos}"))
        })?;
    Ok(u32::from_le_bytes(bytes) as usize)
}
