//! In-memory bucket storage.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::bucket_file::{decode_bucket, encode_bucket};
use super::traits::BucketStorage;
use crate::error::Result;
use crate::index::PostingBucket;

/// Keeps encoded buckets in memory.
///
/// Buckets go through the same encoding as [`BucketDir`](super::BucketDir),
/// which makes this backend a faithful stand-in for tests and benchmarks.
#[derive(Debug, Default)]
pub struct MemoryBuckets {
    buckets: RwLock<FxHashMap<u32, Vec<u8>>>,
}

impl MemoryBuckets {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.read().len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.read().is_empty()
    }

    /// Total encoded size in bytes.
    #[must_use]
    pub fn encoded_bytes(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }
}

impl BucketStorage for MemoryBuckets {
    fn load(&self, size: u32) -> Result<Option<PostingBucket>> {
        self.buckets
            .read()
            .get(&size)
            .map(|bytes| decode_bucket(bytes))
            .transpose()
    }

    fn store(&self, bucket: &PostingBucket, watermark: u32) -> Result<()> {
        let bytes = encode_bucket(bucket, watermark)?;
        self.buckets.write().insert(bucket.size(), bytes);
        Ok(())
    }
}
