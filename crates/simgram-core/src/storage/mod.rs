//! Persistence layer.
//!
//! A database is a directory:
//!
//! ```text
//! <db>/
//! ├── simgram.json          options and committed counts (commit point)
//! ├── strings.log           length-prefixed UTF-8 strings, ID = position
//! ├── LOCK                  present while a writer is open
//! └── postings/
//!     ├── bucket-1.bin      strings with 1 n-gram
//!     └── bucket-<c>.bin    strings with c n-grams
//! ```

mod bucket_file;
pub mod corpus;
pub mod lock;
mod memory;
pub mod meta;
mod traits;

pub use bucket_file::{decode_bucket, encode_bucket, BucketDir};
pub use corpus::{CorpusReader, CorpusWriter};
pub use lock::WriterLock;
pub use memory::MemoryBuckets;
pub use meta::DatabaseMeta;
pub use traits::BucketStorage;

/// Metadata file name.
pub const META_FILE: &str = "simgram.json";
/// Corpus log file name.
pub const CORPUS_FILE: &str = "strings.log";
/// Posting bucket directory name.
pub const POSTINGS_DIR: &str = "postings";
/// Writer lock file name.
pub const LOCK_FILE: &str = "LOCK";

#[cfg(test)]
mod bucket_file_tests;
