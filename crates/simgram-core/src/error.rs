//! Error types for `SimGram`.
//!
//! Every failure surfaces as an [`Error`] with a stable `SIMGRAM-XXX` code.
//! Variants are grouped into four coarse [`ErrorKind`]s that callers can
//! match on without caring about the exact storage failure.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for `SimGram` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation is not valid for the handle's current open mode.
    InvalidState,
    /// A caller-supplied value is out of range or malformed.
    InvalidArgument,
    /// Reading or writing persisted data failed, or the data is corrupt.
    Storage,
    /// The database does not exist.
    NotFound,
}

/// Errors that can occur in `SimGram` operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Operation not allowed in the current mode (SIMGRAM-001).
    #[error("[SIMGRAM-001] Invalid state: {0}")]
    InvalidState(String),

    /// Invalid argument (SIMGRAM-002).
    #[error("[SIMGRAM-002] Invalid argument: {0}")]
    InvalidArgument(String),

    /// Database not found (SIMGRAM-003).
    #[error("[SIMGRAM-003] Database not found at '{}'", .0.display())]
    NotFound(PathBuf),

    /// Open options conflict with the ones the database was built with (SIMGRAM-004).
    #[error("[SIMGRAM-004] Option '{option}' mismatch: database has {stored}, requested {requested}")]
    OptionsMismatch {
        /// Name of the conflicting option.
        option: &'static str,
        /// Value recorded in the database metadata.
        stored: String,
        /// Value passed to `open`.
        requested: String,
    },

    /// Storage error (SIMGRAM-005).
    #[error("[SIMGRAM-005] Storage error: {0}")]
    Storage(String),

    /// Persisted data failed validation (SIMGRAM-006).
    #[error("[SIMGRAM-006] Database corrupted: {0}")]
    Corrupted(String),

    /// Another writer holds the database (SIMGRAM-007).
    #[error("[SIMGRAM-007] Database at '{}' is locked by another writer", .0.display())]
    Locked(PathBuf),

    /// IO error (SIMGRAM-008).
    #[error("[SIMGRAM-008] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (SIMGRAM-009).
    #[error("[SIMGRAM-009] Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (SIMGRAM-010).
    #[error("[SIMGRAM-010] Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code (e.g., "SIMGRAM-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "SIMGRAM-001",
            Self::InvalidArgument(_) => "SIMGRAM-002",
            Self::NotFound(_) => "SIMGRAM-003",
            Self::OptionsMismatch { .. } => "SIMGRAM-004",
            Self::Storage(_) => "SIMGRAM-005",
            Self::Corrupted(_) => "SIMGRAM-006",
            Self::Locked(_) => "SIMGRAM-007",
            Self::Io(_) => "SIMGRAM-008",
            Self::Serialization(_) => "SIMGRAM-009",
            Self::Config(_) => "SIMGRAM-010",
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InvalidArgument(_) | Self::OptionsMismatch { .. } | Self::Config(_) => {
                ErrorKind::InvalidArgument
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_)
            | Self::Corrupted(_)
            | Self::Locked(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Storage,
        }
    }

    /// Returns true if retrying or fixing the call can succeed.
    ///
    /// Corruption is not recoverable without rebuilding the database.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corrupted(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
