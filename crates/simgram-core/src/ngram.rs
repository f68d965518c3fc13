//! Character n-gram extraction.
//!
//! Strings are sliced into overlapping windows of `n` characters (Unicode
//! scalar values, not bytes). With padding enabled the string is framed by
//! `n - 1` [`SENTINEL`] characters on each side, so boundary characters take
//! part in as many n-grams as interior ones:
//!
//! ```text
//! n = 3, pad = true:  "obama" -> "\1\1o" "\1ob" "oba" "bam" "ama" "ma\1" "a\1\1"
//! n = 3, pad = false: "obama" -> "oba" "bam" "ama"
//! ```
//!
//! A repeated n-gram is tagged with its occurrence number, which turns the
//! multiset into a set: two strings sharing an n-gram `k` and `j` times share
//! exactly `min(k, j)` tagged n-grams.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Boundary marker used for padding.
pub const SENTINEL: char = '\u{1}';

/// Largest n-gram size accepted by [`NGramExtractor::new`].
pub const MAX_NGRAM_SIZE: usize = 16;

/// An n-gram tagged with its occurrence number inside the source string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NGram {
    gram: String,
    occurrence: u32,
}

impl NGram {
    /// Creates an n-gram; `occurrence` starts at 1.
    #[must_use]
    pub fn new(gram: impl Into<String>, occurrence: u32) -> Self {
        Self {
            gram: gram.into(),
            occurrence,
        }
    }

    /// The characters of the n-gram.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.gram
    }

    /// 1 for the first occurrence in the source string, 2 for the second, ...
    #[must_use]
    pub fn occurrence(&self) -> u32 {
        self.occurrence
    }
}

impl fmt::Display for NGram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self
            .gram
            .chars()
            .map(|c| if c == SENTINEL { '$' } else { c })
            .collect();
        if self.occurrence > 1 {
            write!(f, "{visible}#{}", self.occurrence)
        } else {
            f.write_str(&visible)
        }
    }
}

/// Extracts the n-grams of `text`.
///
/// The empty string yields nothing. Without padding, a non-empty string
/// shorter than `n` is filled up with [`SENTINEL`] and yields one n-gram.
#[must_use]
pub fn extract(text: &str, n: usize, pad: bool) -> Vec<NGram> {
    if text.is_empty() || n == 0 {
        return Vec::new();
    }

    let mut chars: Vec<char> = Vec::with_capacity(text.len() + 2 * (n - 1));
    if pad {
        chars.extend(std::iter::repeat(SENTINEL).take(n - 1));
        chars.extend(text.chars());
        chars.extend(std::iter::repeat(SENTINEL).take(n - 1));
    } else {
        chars.extend(text.chars());
        if chars.len() < n {
            chars.resize(n, SENTINEL);
        }
    }

    let mut seen: FxHashMap<String, u32> = FxHashMap::default();
    let mut ngrams = Vec::with_capacity(chars.len() + 1 - n);
    for window in chars.windows(n) {
        let gram: String = window.iter().collect();
        let count = seen.entry(gram.clone()).or_insert(0);
        *count += 1;
        ngrams.push(NGram::new(gram, *count));
    }
    ngrams
}

/// Extractor bound to the settings a database was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGramExtractor {
    n: usize,
    pad: bool,
    case_insensitive: bool,
}

impl NGramExtractor {
    /// Creates an extractor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `n` is 0 or larger than [`MAX_NGRAM_SIZE`].
    pub fn new(n: usize, pad: bool, case_insensitive: bool) -> Result<Self> {
        if !(1..=MAX_NGRAM_SIZE).contains(&n) {
            return Err(Error::InvalidArgument(format!(
                "n-gram size {n} is out of range [1, {MAX_NGRAM_SIZE}]"
            )));
        }
        Ok(Self {
            n,
            pad,
            case_insensitive,
        })
    }

    /// Characters per n-gram.
    #[must_use]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Whether boundary padding is applied.
    #[must_use]
    pub fn pad(&self) -> bool {
        self.pad
    }

    /// Whether text is lower-cased first.
    #[must_use]
    pub fn case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Extracts the n-grams of `text` under this extractor's settings.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<NGram> {
        if self.case_insensitive {
            extract(&text.to_lowercase(), self.n, self.pad)
        } else {
            extract(text, self.n, self.pad)
        }
    }
}
