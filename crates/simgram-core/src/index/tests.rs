//! Tests for the inverted index.

use super::{InvertedIndex, PostingBucket};
use crate::error::{Error, Result};
use crate::ngram::{extract, NGram};
use crate::storage::{BucketStorage, MemoryBuckets};

fn grams(text: &str) -> Vec<NGram> {
    extract(text, 3, true)
}

// =========================================================================
// PostingBucket
// =========================================================================

#[test]
fn test_bucket_insert_tracks_members_and_postings() {
    let mut bucket = PostingBucket::new(5);

    bucket.insert(3, &grams("abc"));
    bucket.insert(9, &grams("abd"));

    assert_eq!(bucket.member_count(), 2);
    // $$a $ab abc bc$ c$$ abd bd$ d$$
    assert_eq!(bucket.ngram_count(), 8);
    let shared = bucket.lookup(&NGram::new("\u{1}ab", 1)).expect("posting");
    assert_eq!(shared.iter().collect::<Vec<_>>(), vec![3, 9]);
    assert!(bucket.lookup(&NGram::new("zzz", 1)).is_none());
}

#[test]
fn test_bucket_keeps_occurrences_apart() {
    let mut bucket = PostingBucket::new(3);
    // "aaaa" unpadded: aa#1 aa#2 aa#3
    bucket.insert(0, &extract("aaaa", 2, false));

    assert_eq!(bucket.ngram_count(), 3);
    assert!(bucket.lookup(&NGram::new("aa", 3)).is_some());
    assert!(bucket.lookup(&NGram::new("aa", 4)).is_none());
}

#[test]
fn test_bucket_memory_grows_with_content() {
    let mut bucket = PostingBucket::new(5);
    let empty = bucket.memory_bytes();

    bucket.insert(0, &grams("abc"));

    assert!(bucket.memory_bytes() > empty);
}

// =========================================================================
// InvertedIndex
// =========================================================================

#[test]
fn test_insert_routes_by_ngram_count() {
    // Arrange
    let storage = MemoryBuckets::new();
    let mut index = InvertedIndex::new(&storage);

    // Act
    index.insert(0, &grams("ab")).expect("insert");
    index.insert(1, &grams("abcd")).expect("insert");
    index.insert(2, &grams("xy")).expect("insert");

    // Assert
    assert_eq!(index.bucket_sizes().collect::<Vec<_>>(), vec![4, 6]);
    assert_eq!(index.bucket_count(), 2);
    assert_eq!(index.max_bucket(), Some(6));
    let small = index.bucket(4).expect("bucket").expect("present");
    assert_eq!(small.members().iter().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn test_insert_ignores_empty_ngram_list() {
    let mut index = InvertedIndex::new(MemoryBuckets::new());

    index.insert(0, &[]).expect("insert");

    assert_eq!(index.bucket_count(), 0);
    assert_eq!(index.dirty_count(), 0);
}

#[test]
fn test_lookup_returns_empty_for_unknown() {
    let mut index = InvertedIndex::new(MemoryBuckets::new());
    index.insert(0, &grams("abc")).expect("insert");

    assert!(index
        .lookup(&NGram::new("zzz", 1), 5)
        .expect("lookup")
        .is_empty());
    assert!(index
        .lookup(&NGram::new("abc", 1), 9)
        .expect("lookup")
        .is_empty());
    assert_eq!(index.lookup(&NGram::new("abc", 1), 5).expect("lookup").len(), 1);
}

#[test]
fn test_bucket_sizes_in_range() {
    let mut index = InvertedIndex::new(MemoryBuckets::new());
    for (id, text) in ["a", "abc", "abcde", "abcdefg"].iter().enumerate() {
        index.insert(id as u32, &grams(text)).expect("insert");
    }

    assert_eq!(index.bucket_sizes_in(4, 7), vec![5, 7]);
    assert_eq!(index.bucket_sizes_in(1, usize::MAX), vec![3, 5, 7, 9]);
    assert!(index.bucket_sizes_in(8, 4).is_empty());
}

#[test]
fn test_flush_persists_dirty_buckets() {
    // Arrange
    let storage = MemoryBuckets::new();
    let mut index = InvertedIndex::new(&storage);
    index.insert(0, &grams("abc")).expect("insert");
    index.insert(1, &grams("abcde")).expect("insert");

    // Act
    let written = index.flush(2).expect("flush");

    // Assert
    assert_eq!(written, 2);
    assert_eq!(index.dirty_count(), 0);
    assert_eq!(storage.len(), 2);
    let stored = storage.load(5).expect("load").expect("present");
    assert_eq!(stored.watermark(), 2);
    assert_eq!(index.flush(2).expect("second flush"), 0);
}

#[test]
fn test_reopened_index_loads_and_extends_buckets() {
    // Arrange
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.flush(1).expect("flush");
    }

    // Act
    let mut index = InvertedIndex::with_buckets(&storage, [5]);
    index.insert(1, &grams("abd")).expect("insert");
    index.flush(2).expect("flush");

    // Assert
    let bucket = storage.load(5).expect("load").expect("present");
    assert_eq!(bucket.members().iter().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_known_bucket_missing_from_storage_is_corrupted() {
    let index = InvertedIndex::with_buckets(MemoryBuckets::new(), [4]);

    let result = index.bucket(4);

    assert!(matches!(result, Err(Error::Corrupted(_))));
}

struct Mislabeled;

impl BucketStorage for Mislabeled {
    fn load(&self, _size: u32) -> Result<Option<PostingBucket>> {
        Ok(Some(PostingBucket::new(99)))
    }

    fn store(&self, _bucket: &PostingBucket, _watermark: u32) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_bucket_with_wrong_size_is_corrupted() {
    let index = InvertedIndex::with_buckets(Mislabeled, [4]);

    let err = index.bucket(4).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
    assert!(err.to_string().contains("99"));
}

#[test]
fn test_cached_bucket_is_shared() {
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.flush(1).expect("flush");
    }
    let index = InvertedIndex::with_buckets(&storage, [5]);

    let first = index.bucket(5).expect("bucket").expect("present");
    let second = index.bucket(5).expect("bucket").expect("present");

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.watermark(), 1);
}

#[test]
fn test_visible_limit_hides_newer_strings() {
    // Arrange
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.insert(1, &grams("abd")).expect("insert");
        index.insert(2, &grams("xyz")).expect("insert");
        index.flush(3).expect("flush");
    }

    // Act
    let index = InvertedIndex::with_buckets(&storage, [5]).with_visible_limit(1);
    let bucket = index.bucket(5).expect("bucket").expect("present");

    // Assert
    assert_eq!(bucket.members().iter().collect::<Vec<_>>(), vec![0]);
    assert!(bucket.lookup(&NGram::new("xyz", 1)).is_none());
    let shared = index.lookup(&NGram::new("\u{1}ab", 1), 5).expect("lookup");
    assert_eq!(shared.iter().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn test_visible_limit_keeps_buckets_from_older_commits() {
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.flush(1).expect("flush");
    }

    let index = InvertedIndex::with_buckets(&storage, [5]).with_visible_limit(4);

    let bucket = index.bucket(5).expect("bucket").expect("present");
    assert_eq!(bucket.member_count(), 1);
}

// =========================================================================
// Committed watermarks
// =========================================================================

#[test]
fn test_uncommitted_bucket_file_is_trimmed_to_its_commit() {
    // Arrange: bucket 5 committed at 1, then rewritten by a session that
    // flushed at 2 but never committed
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.flush(1).expect("flush");
        index.insert(1, &grams("abd")).expect("insert");
        index.flush(2).expect("flush");
    }

    // Act: later commits have raised the visible limit past the stale file
    let index = InvertedIndex::with_committed(&storage, [(5, 1)]).with_visible_limit(3);
    let bucket = index.bucket(5).expect("bucket").expect("present");

    // Assert
    assert_eq!(bucket.members().iter().collect::<Vec<_>>(), vec![0]);
    assert!(bucket.lookup(&NGram::new("abd", 1)).is_none());
}

#[test]
fn test_rewritten_bucket_records_new_watermark() {
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.insert(1, &grams("xyzzy")).expect("insert");
        index.flush(2).expect("flush");
    }
    let mut index = InvertedIndex::with_committed(&storage, [(5, 2), (7, 2)]);

    index.insert(2, &grams("abd")).expect("insert");
    index.flush(3).expect("flush");

    let committed = index.committed_watermarks();
    assert_eq!(committed.get(&5), Some(&3));
    assert_eq!(committed.get(&7), Some(&2));
}

#[test]
fn test_bucket_older_than_its_commit_is_corrupted() {
    let storage = MemoryBuckets::new();
    {
        let mut index = InvertedIndex::new(&storage);
        index.insert(0, &grams("abc")).expect("insert");
        index.flush(1).expect("flush");
    }
    let index = InvertedIndex::with_committed(&storage, [(5, 4)]);

    let err = index.bucket(5).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
}
