//! Database handle.
//!
//! A [`Database`] is opened either for writing or for reading, never both:
//!
//! ```text
//! Closed ──open(Write)──▶ Writing ──close──▶ Closed
//! Closed ──open(Read)───▶ Reading ──close──▶ Closed
//! ```
//!
//! Inserts become visible to readers opened after the writer closes.

mod reader;
mod search;
mod types;
mod writer;


use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::measure::Measure;
use reader::ReadSession;
use writer::WriteSession;

pub use types::{DatabaseStats, IndexOptions, Match, OpenMode};

enum State {
    Closed,
    Writing(Box<WriteSession>),
    Reading(Box<ReadSession>),
}

/// Handle on a similarity database directory.
///
/// # Examples
///
/// ```rust,no_run
/// use simgram_core::{Database, IndexOptions, Measure};
///
/// # fn main() -> simgram_core::Result<()> {
/// let options = IndexOptions { pad: false, ..IndexOptions::default() };
/// let mut db = Database::open_writer("./names.db", &options)?;
/// db.insert("Barack Hussein Obama II")?;
/// db.insert("James Gordon Brown")?;
/// db.close()?;
///
/// let db = Database::open_reader("./names.db")?;
/// let found = db.retrieve("Barack Obama", Measure::Cosine, 0.6)?;
/// assert_eq!(found, vec!["Barack Hussein Obama II".to_string()]);
/// # Ok(())
/// # }
/// ```
pub struct Database {
    path: PathBuf,
    state: State,
}

impl Database {
    /// Opens the database at `path`.
    ///
    /// In write mode the directory is created if needed, and `options` must
    /// match those of an existing database. Read mode uses the stored options
    /// and ignores `options`.
    ///
    /// # Errors
    ///
    /// - `NotFound` when reading a path that holds no database
    /// - `Locked` when another writer is open
    /// - `OptionsMismatch` when `options` differ from the stored ones
    /// - `InvalidArgument` for invalid `options`
    /// - `Corrupted` or IO errors if the stored files are unusable
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode, options: &IndexOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match mode {
            OpenMode::Write => State::Writing(Box::new(WriteSession::open(&path, options)?)),
            OpenMode::Read => State::Reading(Box::new(ReadSession::open(&path)?)),
        };
        Ok(Self { path, state })
    }

    /// Opens `path` for writing.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_writer<P: AsRef<Path>>(path: P, options: &IndexOptions) -> Result<Self> {
        Self::open(path, OpenMode::Write, options)
    }

    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, OpenMode::Read, &IndexOptions::default())
    }

    /// Database directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current mode, or `None` once closed.
    #[must_use]
    pub fn mode(&self) -> Option<OpenMode> {
        match self.state {
            State::Closed => None,
            State::Writing(_) => Some(OpenMode::Write),
            State::Reading(_) => Some(OpenMode::Read),
        }
    }

    /// Whether the handle is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Closed)
    }

    /// Appends `text` and returns its ID.
    ///
    /// The string is durable once [`close`](Self::close) returns. Strings
    /// without n-grams (the empty string) get an ID but never match a query.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless open for writing.
    pub fn insert(&mut self, text: &str) -> Result<u32> {
        self.writer_mut()?.insert(text)
    }

    /// Inserts every string of `texts`; returns how many were inserted.
    ///
    /// # Errors
    ///
    /// Stops at the first failing insert. Strings before it stay inserted.
    pub fn insert_all<I, S>(&mut self, texts: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let writer = self.writer_mut()?;
        let mut inserted = 0;
        for text in texts {
            writer.insert(text.as_ref())?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Strings whose similarity to `query` under `measure` is at least
    /// `threshold`.
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless open for reading
    /// - `InvalidArgument` if `threshold` is outside `(0, 1]`
    /// - `Corrupted` if the index refers to a string that cannot be read
    pub fn retrieve(&self, query: &str, measure: Measure, threshold: f64) -> Result<Vec<String>> {
        Ok(self
            .retrieve_scored(query, measure, threshold)?
            .into_iter()
            .map(|m| m.text)
            .collect())
    }

    /// Like [`retrieve`](Self::retrieve), with IDs and scores.
    ///
    /// # Errors
    ///
    /// See [`retrieve`](Self::retrieve).
    pub fn retrieve_scored(
        &self,
        query: &str,
        measure: Measure,
        threshold: f64,
    ) -> Result<Vec<Match>> {
        self.reader()?.retrieve_scored(query, measure, threshold)
    }

    /// Whether any string reaches `threshold`. Stops at the first match.
    ///
    /// # Errors
    ///
    /// See [`retrieve`](Self::retrieve).
    pub fn check(&self, query: &str, measure: Measure, threshold: f64) -> Result<bool> {
        self.reader()?.check(query, measure, threshold)
    }

    /// Counts and settings of the open database.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` once closed.
    pub fn stats(&self) -> Result<DatabaseStats> {
        let (string_count, meta, index) = match &self.state {
            State::Writing(w) => (w.string_count(), w.meta(), w.index()),
            State::Reading(r) => (r.meta().string_count, r.meta(), r.index()),
            State::Closed => return Err(closed()),
        };
        Ok(DatabaseStats {
            string_count,
            bucket_count: index.bucket_count(),
            max_bucket: index.max_bucket(),
            ngram_size: meta.options.ngram_size,
            pad: meta.options.pad,
            case_insensitive: meta.options.case_insensitive,
        })
    }

    /// Commits pending inserts and releases the handle. Closing a closed
    /// handle does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if committing fails; the handle is closed anyway and
    /// the previous commit stays in effect.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Writing(writer) => writer.close(),
            State::Reading(_) => {
                tracing::debug!(path = %self.path.display(), "Closed reader");
                Ok(())
            }
            State::Closed => Ok(()),
        }
    }

    fn writer_mut(&mut self) -> Result<&mut WriteSession> {
        match &mut self.state {
            State::Writing(w) => Ok(w.as_mut()),
            State::Reading(_) => Err(Error::InvalidState(
                "database is open for reading, not writing".to_string(),
            )),
            State::Closed => Err(closed()),
        }
    }

    fn reader(&self) -> Result<&ReadSession> {
        match &self.state {
            State::Reading(r) => Ok(r.as_ref()),
            State::Writing(_) => Err(Error::InvalidState(
                "database is open for writing, reopen it for reading to query".to_string(),
            )),
            State::Closed => Err(closed()),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to close database on drop"
            );
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("mode", &self.mode())
            .finish()
    }
}

fn closed() -> Error {
    Error::InvalidState("database is closed".to_string())
}
