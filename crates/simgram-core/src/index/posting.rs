//! Posting lists of one length bucket.

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ngram::NGram;

/// All posting lists for strings with exactly `size` n-grams.
///
/// Maps every n-gram occurring in a member string to the bitmap of member
/// IDs containing it. Roaring bitmaps keep IDs sorted, which the probe phase
/// of retrieval relies on for cheap membership tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingBucket {
    size: u32,
    postings: FxHashMap<NGram, RoaringBitmap>,
    members: RoaringBitmap,
    /// Total strings in the database when this bucket was last persisted.
    #[serde(skip)]
    watermark: u32,
}

impl PostingBucket {
    /// Creates an empty bucket for strings with `size` n-grams.
    #[must_use]
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// N-gram count shared by every member string.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Adds string `id` under each of its n-grams.
    ///
    /// `ngrams.len()` must equal [`size`](Self::size); the caller picks the
    /// bucket from the n-gram count.
    pub fn insert(&mut self, id: u32, ngrams: &[NGram]) {
        debug_assert_eq!(ngrams.len(), self.size as usize);
        for ngram in ngrams {
            if let Some(bitmap) = self.postings.get_mut(ngram) {
                bitmap.insert(id);
            } else {
                let mut bitmap = RoaringBitmap::new();
                bitmap.insert(id);
                self.postings.insert(ngram.clone(), bitmap);
            }
        }
        self.members.insert(id);
    }

    /// Posting list for `ngram`, if any member contains it.
    #[must_use]
    pub fn lookup(&self, ngram: &NGram) -> Option<&RoaringBitmap> {
        self.postings.get(ngram)
    }

    /// IDs of all member strings.
    #[must_use]
    pub fn members(&self) -> &RoaringBitmap {
        &self.members
    }

    /// Number of member strings.
    #[must_use]
    pub fn member_count(&self) -> u64 {
        self.members.len()
    }

    /// Number of distinct n-grams.
    #[must_use]
    pub fn ngram_count(&self) -> usize {
        self.postings.len()
    }

    /// Iterates over `(n-gram, posting list)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&NGram, &RoaringBitmap)> {
        self.postings.iter()
    }

    /// Drops every member with an ID at or above `limit`, along with the
    /// posting lists left empty.
    pub fn retain_below(&mut self, limit: u32) {
        self.members.remove_range(limit..);
        self.postings.retain(|_, bitmap| {
            bitmap.remove_range(limit..);
            !bitmap.is_empty()
        });
    }

    /// Database string count recorded when the bucket was persisted.
    #[must_use]
    pub fn watermark(&self) -> u32 {
        self.watermark
    }

    pub(crate) fn set_watermark(&mut self, watermark: u32) {
        self.watermark = watermark;
    }

    /// Approximate heap footprint in bytes.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        let keys: usize = self
            .postings
            .keys()
            .map(|k| k.as_str().len() + std::mem::size_of::<NGram>())
            .sum();
        let bitmaps: usize = self
            .postings
            .values()
            .map(RoaringBitmap::serialized_size)
            .sum();
        keys + bitmaps + self.members.serialized_size()
    }
}
