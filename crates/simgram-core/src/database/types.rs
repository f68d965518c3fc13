//! Public value types of the database API.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ngram::{NGramExtractor, MAX_NGRAM_SIZE};

/// How a database is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Query an existing database.
    Read,
    /// Create a database or append to one.
    Write,
}

/// Settings an index is built with.
///
/// Fixed when a database is created and stored alongside it. Reopening for
/// writing with different settings fails with `OptionsMismatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Characters per n-gram.
    pub ngram_size: usize,
    /// Surround strings with `n - 1` sentinels on each side.
    pub pad: bool,
    /// Lowercase strings before extracting n-grams.
    pub case_insensitive: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            ngram_size: 3,
            pad: true,
            case_insensitive: false,
        }
    }
}

impl IndexOptions {
    /// Checks that `ngram_size` lies in `1..=16`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 || self.ngram_size > MAX_NGRAM_SIZE {
            return Err(Error::InvalidArgument(format!(
                "ngram_size must be between 1 and {MAX_NGRAM_SIZE}, got {}",
                self.ngram_size
            )));
        }
        Ok(())
    }

    /// Builds the extractor for these settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the options are invalid.
    pub fn extractor(&self) -> Result<NGramExtractor> {
        NGramExtractor::new(self.ngram_size, self.pad, self.case_insensitive)
    }

    pub(crate) fn ensure_matches(&self, requested: &Self) -> Result<()> {
        let mismatch = |option: &'static str, stored: String, requested: String| {
            Err(Error::OptionsMismatch {
                option,
                stored,
                requested,
            })
        };
        if self.ngram_size != requested.ngram_size {
            return mismatch(
                "ngram_size",
                self.ngram_size.to_string(),
                requested.ngram_size.to_string(),
            );
        }
        if self.pad != requested.pad {
            return mismatch("pad", self.pad.to_string(), requested.pad.to_string());
        }
        if self.case_insensitive != requested.case_insensitive {
            return mismatch(
                "case_insensitive",
                self.case_insensitive.to_string(),
                requested.case_insensitive.to_string(),
            );
        }
        Ok(())
    }
}

/// A retrieved string with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// ID assigned at insertion.
    pub id: u32,
    /// The stored string.
    pub text: String,
    /// Similarity to the query under the requested measure.
    pub score: f64,
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    /// Strings in the database. Includes uncommitted inserts in write mode.
    pub string_count: u32,
    /// Number of length buckets.
    pub bucket_count: usize,
    /// Largest n-gram count of any indexed string.
    pub max_bucket: Option<u32>,
    /// Characters per n-gram.
    pub ngram_size: usize,
    /// Whether strings are padded.
    pub pad: bool,
    /// Whether case is folded.
    pub case_insensitive: bool,
}
