//! Length-bucketed inverted n-gram index.

use parking_lot::RwLock;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::PostingBucket;
use crate::error::{Error, Result};
use crate::ngram::NGram;
use crate::storage::BucketStorage;

/// Inverted index from n-grams to string IDs, partitioned by the n-gram
/// count of the indexed strings.
///
/// Buckets are loaded from `storage` on first touch and cached for the
/// lifetime of the index. Buckets modified by [`insert`](Self::insert) are
/// tracked as dirty until [`flush`](Self::flush) writes them back.
///
/// Each committed bucket is known with the watermark of the commit that
/// last wrote it. A bucket file carrying a newer watermark was written by a
/// session that never committed, and is cut back to the IDs below the
/// recorded watermark (and below the visible limit) as it loads.
pub struct InvertedIndex<S> {
    storage: S,
    visible: u32,
    /// All buckets that exist, persisted or not, with their committed
    /// watermark when one is recorded.
    known: BTreeMap<u32, Option<u32>>,
    cache: RwLock<FxHashMap<u32, Arc<PostingBucket>>>,
    dirty: BTreeSet<u32>,
}

impl<S: BucketStorage> InvertedIndex<S> {
    /// Creates an empty index on top of `storage`.
    pub fn new(storage: S) -> Self {
        Self::with_buckets(storage, [])
    }

    /// Creates an index whose `buckets` already exist in `storage`, with no
    /// recorded watermark.
    pub fn with_buckets(storage: S, buckets: impl IntoIterator<Item = u32>) -> Self {
        Self::from_known(storage, buckets.into_iter().map(|size| (size, None)).collect())
    }

    /// Creates an index over committed buckets, given as `(size, watermark)`
    /// pairs where `watermark` is the string count of the commit that last
    /// wrote the bucket.
    pub fn with_committed(storage: S, buckets: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self::from_known(
            storage,
            buckets
                .into_iter()
                .map(|(size, watermark)| (size, Some(watermark)))
                .collect(),
        )
    }

    fn from_known(storage: S, known: BTreeMap<u32, Option<u32>>) -> Self {
        Self {
            storage,
            visible: u32::MAX,
            known,
            cache: RwLock::new(FxHashMap::default()),
            dirty: BTreeSet::new(),
        }
    }

    /// Hides string IDs at or above `limit` in every bucket loaded from now on.
    #[must_use]
    pub fn with_visible_limit(mut self, limit: u32) -> Self {
        self.visible = limit;
        self
    }

    /// Adds string `id` to the posting lists of each of its n-grams, in the
    /// bucket matching `ngrams.len()`. Strings without n-grams are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the target bucket exists in storage and cannot be
    /// loaded.
    pub fn insert(&mut self, id: u32, ngrams: &[NGram]) -> Result<()> {
        if ngrams.is_empty() {
            return Ok(());
        }
        let size = u32::try_from(ngrams.len()).map_err(|_| {
            Error::InvalidArgument(format!("string has too many n-grams ({})", ngrams.len()))
        })?;

        let cache = self.cache.get_mut();
        let slot = match cache.entry(size) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let bucket = match self.known.get(&size) {
                    Some(&recorded) => load_checked(&self.storage, size, recorded, self.visible)?,
                    None => PostingBucket::new(size),
                };
                entry.insert(Arc::new(bucket))
            }
        };
        Arc::make_mut(slot).insert(id, ngrams);

        self.known.entry(size).or_insert(None);
        self.dirty.insert(size);
        Ok(())
    }

    /// Returns the bucket for strings with `size` n-grams, loading it on
    /// first access.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if a known bucket is missing from storage or
    /// fails validation.
    pub fn bucket(&self, size: u32) -> Result<Option<Arc<PostingBucket>>> {
        let Some(&recorded) = self.known.get(&size) else {
            return Ok(None);
        };
        if let Some(bucket) = self.cache.read().get(&size) {
            return Ok(Some(Arc::clone(bucket)));
        }

        let bucket = Arc::new(load_checked(&self.storage, size, recorded, self.visible)?);
        tracing::trace!(
            size,
            members = bucket.member_count(),
            ngrams = bucket.ngram_count(),
            "Loaded posting bucket"
        );
        let mut cache = self.cache.write();
        Ok(Some(Arc::clone(cache.entry(size).or_insert(bucket))))
    }

    /// Posting list of `ngram` within the bucket of `size`; empty if absent.
    ///
    /// # Errors
    ///
    /// Propagates bucket loading failures.
    pub fn lookup(&self, ngram: &NGram, size: u32) -> Result<RoaringBitmap> {
        Ok(self
            .bucket(size)?
            .and_then(|bucket| bucket.lookup(ngram).cloned())
            .unwrap_or_default())
    }

    /// Sizes of existing buckets within `[min, max]`, ascending.
    #[must_use]
    pub fn bucket_sizes_in(&self, min: usize, max: usize) -> Vec<u32> {
        let lo = u32::try_from(min).unwrap_or(u32::MAX);
        let hi = u32::try_from(max).unwrap_or(u32::MAX);
        if lo > hi {
            return Vec::new();
        }
        self.known.range(lo..=hi).map(|(&size, _)| size).collect()
    }

    /// Sizes of all existing buckets, ascending.
    pub fn bucket_sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.known.keys().copied()
    }

    /// Watermark of the last commit of every bucket that has one, as
    /// persisted in the metadata.
    #[must_use]
    pub fn committed_watermarks(&self) -> BTreeMap<u32, u32> {
        self.known
            .iter()
            .filter_map(|(&size, &watermark)| Some((size, watermark?)))
            .collect()
    }

    /// Number of existing buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.known.len()
    }

    /// Largest existing bucket size.
    #[must_use]
    pub fn max_bucket(&self) -> Option<u32> {
        self.known.last_key_value().map(|(&size, _)| size)
    }

    /// Number of buckets modified since the last flush.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Writes every dirty bucket to storage, stamped with `watermark`, and
    /// records `watermark` as its committed watermark.
    ///
    /// The caller commits the recorded watermarks only after `flush`
    /// returns.
    ///
    /// Returns the number of buckets written.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; buckets not yet written stay dirty.
    pub fn flush(&mut self, watermark: u32) -> Result<usize> {
        let cache = self.cache.get_mut();
        let mut written = 0;
        while let Some(size) = self.dirty.first().copied() {
            if let Some(bucket) = cache.get_mut(&size) {
                self.storage.store(&**bucket, watermark)?;
                Arc::make_mut(bucket).set_watermark(watermark);
                self.known.insert(size, Some(watermark));
                written += 1;
            }
            self.dirty.remove(&size);
        }
        Ok(written)
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn load_checked<S: BucketStorage>(
    storage: &S,
    size: u32,
    recorded: Option<u32>,
    visible: u32,
) -> Result<PostingBucket> {
    let mut bucket = storage
        .load(size)?
        .ok_or_else(|| Error::Corrupted(format!("posting bucket {size} is missing")))?;
    if bucket.size() != size {
        return Err(Error::Corrupted(format!(
            "posting bucket {size} holds strings of size {}",
            bucket.size()
        )));
    }
    if let Some(recorded) = recorded {
        if bucket.watermark() < recorded {
            return Err(Error::Corrupted(format!(
                "posting bucket {size} has watermark {}, older than its commit at {recorded}",
                bucket.watermark()
            )));
        }
    }
    let limit = recorded.map_or(visible, |recorded| recorded.min(visible));
    if bucket.watermark() > limit {
        tracing::debug!(
            size,
            watermark = bucket.watermark(),
            limit,
            "Hiding strings not committed with this bucket"
        );
        bucket.retain_below(limit);
    }
    Ok(bucket)
}
