//! Storage traits for posting buckets.

use crate::error::Result;
use crate::index::PostingBucket;

/// Persistence backend for length buckets.
///
/// Implementations must make [`store`](BucketStorage::store) atomic with
/// respect to [`load`](BucketStorage::load): a concurrent reader sees either
/// the previous bucket or the new one, never a torn write.
pub trait BucketStorage {
    /// Loads the bucket for strings with `size` n-grams.
    ///
    /// Returns `Ok(None)` if no bucket of that size was ever stored.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if the stored bytes fail validation, or an IO
    /// error if they cannot be read.
    fn load(&self, size: u32) -> Result<Option<PostingBucket>>;

    /// Persists `bucket`, stamping it with `watermark`, the total number of
    /// strings in the database at this commit.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    fn store(&self, bucket: &PostingBucket, watermark: u32) -> Result<()>;
}

impl<T: BucketStorage + ?Sized> BucketStorage for &T {
    fn load(&self, size: u32) -> Result<Option<PostingBucket>> {
        (**self).load(size)
    }

    fn store(&self, bucket: &PostingBucket, watermark: u32) -> Result<()> {
        (**self).store(bucket, watermark)
    }
}
