//! # `SimGram` Core
//!
//! Approximate string matching over a persistent n-gram index.
//!
//! Strings are inserted once and queried many times: given a query, a
//! similarity measure and a threshold, the database returns every stored
//! string whose n-gram similarity to the query reaches the threshold. No
//! string is scored unless its n-gram count and overlap can still reach the
//! threshold, and no reachable string is missed.
//!
//! ## Features
//!
//! - **5 Measures**: Exact, Dice, Cosine, Jaccard, Overlap
//! - **Length buckets**: candidates are drawn only from n-gram counts that
//!   can reach the threshold
//! - **Roaring posting lists**: compressed, sorted ID sets per n-gram
//! - **Crash-consistent storage**: a metadata rename commits each session
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use simgram_core::{Database, IndexOptions, Measure};
//!
//! let mut db = Database::open_writer("./names.db", &IndexOptions::default())?;
//! db.insert("Barack Hussein Obama II")?;
//! db.insert("James Gordon Brown")?;
//! db.close()?;
//!
//! let db = Database::open_reader("./names.db")?;
//! for m in db.retrieve_scored("Gordon Brown", Measure::Cosine, 0.6)? {
//!     println!("{} {:.3}", m.text, m.score);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]

pub mod config;
pub mod database;
pub mod error;
pub mod index;
pub mod measure;
pub mod ngram;
pub mod storage;

pub use config::{ConfigError, IndexConfig, LoggingConfig, SearchConfig, SimgramConfig};
pub use database::{Database, DatabaseStats, IndexOptions, Match, OpenMode};
pub use error::{Error, ErrorKind, Result};
pub use measure::Measure;
pub use ngram::{NGram, NGramExtractor};
