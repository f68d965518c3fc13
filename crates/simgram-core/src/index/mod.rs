//! Inverted n-gram index, partitioned into length buckets.
//!
//! # Layout
//!
//! ```text
//! bucket 9  ─┬─ "$$b" → {0, 7}
//!            ├─ "$ba" → {0}
//!            └─ ...
//! bucket 25 ─┬─ "$$b" → {3}
//!            └─ ...
//! ```
//!
//! A string with `c` n-grams is indexed only in bucket `c`. Similarity
//! bounds depend on `c`, so retrieval visits just the buckets a threshold
//! allows and never touches the rest.

mod inverted;
mod posting;

pub use inverted::InvertedIndex;
pub use posting::PostingBucket;

#[cfg(test)]
mod tests;
