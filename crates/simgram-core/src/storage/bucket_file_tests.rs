//! Tests for `bucket_file` module

use super::bucket_file::{
    crc32_hash, decode_bucket, encode_bucket, BucketDir, BUCKET_MAGIC, BUCKET_VERSION,
};
use super::memory::MemoryBuckets;
use super::traits::BucketStorage;
use crate::error::Error;
use crate::index::PostingBucket;
use crate::ngram::{extract, NGram};

use tempfile::TempDir;

// -------------------------------------------------------------------------
// Helper functions
// -------------------------------------------------------------------------

fn sample_bucket() -> PostingBucket {
    let mut bucket = PostingBucket::new(5);
    bucket.insert(0, &extract("abc", 3, true));
    bucket.insert(7, &extract("abd", 3, true));
    bucket
}

// -------------------------------------------------------------------------
// Codec
// -------------------------------------------------------------------------

#[test]
fn test_crc32_known_value() {
    // Standard check value for the IEEE polynomial
    assert_eq!(crc32_hash(b"123456789"), 0xCBF4_3926);
}

#[test]
fn test_encode_writes_header() {
    let bytes = encode_bucket(&sample_bucket(), 12).expect("encode failed");

    assert_eq!(&bytes[0..4], BUCKET_MAGIC);
    assert_eq!(bytes[4], BUCKET_VERSION);
    assert_eq!(u32::from_le_bytes(bytes[5..9].try_into().unwrap()), 5);
    assert_eq!(u32::from_le_bytes(bytes[9..13].try_into().unwrap()), 12);
}

#[test]
fn test_decode_restores_postings_and_watermark() {
    // Arrange
    let bucket = sample_bucket();
    let bytes = encode_bucket(&bucket, 8).expect("encode failed");

    // Act
    let decoded = decode_bucket(&bytes).expect("decode failed");

    // Assert
    assert_eq!(decoded.size(), 5);
    assert_eq!(decoded.watermark(), 8);
    assert_eq!(decoded.member_count(), 2);
    let shared = decoded
        .lookup(&NGram::new("\u{1}\u{1}a", 1))
        .expect("shared gram missing");
    assert_eq!(shared.iter().collect::<Vec<_>>(), vec![0, 7]);
    let own = decoded.lookup(&NGram::new("abd", 1)).expect("gram missing");
    assert_eq!(own.iter().collect::<Vec<_>>(), vec![7]);
}

#[test]
fn test_decode_rejects_truncated_input() {
    let bytes = encode_bucket(&sample_bucket(), 2).expect("encode failed");

    for len in [0, 3, 20, bytes.len() - 1] {
        let result = decode_bucket(&bytes[..len]);
        assert!(
            matches!(result, Err(Error::Corrupted(_))),
            "length {len} should be rejected"
        );
    }
}

#[test]
fn test_decode_rejects_bad_magic() {
    let mut bytes = encode_bucket(&sample_bucket(), 2).expect("encode failed");
    bytes[0] = b'X';

    assert!(matches!(decode_bucket(&bytes), Err(Error::Corrupted(_))));
}

#[test]
fn test_decode_rejects_unknown_version() {
    let mut bytes = encode_bucket(&sample_bucket(), 2).expect("encode failed");
    bytes[4] = BUCKET_VERSION + 1;

    assert!(matches!(decode_bucket(&bytes), Err(Error::Corrupted(_))));
}

#[test]
fn test_decode_detects_flipped_payload_bit() {
    let mut bytes = encode_bucket(&sample_bucket(), 2).expect("encode failed");
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x01;

    let err = decode_bucket(&bytes).unwrap_err();
    assert!(err.to_string().contains("CRC"), "unexpected error: {err}");
}

#[test]
fn test_decode_rejects_inflated_payload_length() {
    let mut bytes = encode_bucket(&sample_bucket(), 2).expect("encode failed");
    bytes[13..21].copy_from_slice(&u64::MAX.to_le_bytes());

    assert!(matches!(decode_bucket(&bytes), Err(Error::Corrupted(_))));
}

// -------------------------------------------------------------------------
// BucketDir
// -------------------------------------------------------------------------

#[test]
fn test_bucket_dir_store_then_load() {
    // Arrange
    let temp = TempDir::new().expect("temp dir");
    let dir = BucketDir::create(temp.path().join("postings")).expect("create dir");

    // Act
    dir.store(&sample_bucket(), 3).expect("store failed");
    let loaded = dir.load(5).expect("load failed").expect("bucket missing");

    // Assert
    assert_eq!(loaded.member_count(), 2);
    assert_eq!(loaded.watermark(), 3);
    assert!(dir.file_path(5).exists());
    assert!(!dir.file_path(5).with_extension("bin.tmp").exists());
}

#[test]
fn test_bucket_dir_missing_bucket_is_none() {
    let temp = TempDir::new().expect("temp dir");
    let dir = BucketDir::create(temp.path()).expect("create dir");

    assert!(dir.load(42).expect("load failed").is_none());
}

#[test]
fn test_bucket_dir_store_replaces_previous_version() {
    let temp = TempDir::new().expect("temp dir");
    let dir = BucketDir::create(temp.path()).expect("create dir");
    let mut bucket = sample_bucket();
    dir.store(&bucket, 8).expect("first store");

    bucket.insert(9, &extract("xyz", 3, true));
    dir.store(&bucket, 10).expect("second store");

    let loaded = dir.load(5).expect("load").expect("bucket missing");
    assert_eq!(loaded.member_count(), 3);
    assert_eq!(loaded.watermark(), 10);
}

#[test]
fn test_bucket_dir_corruption_names_file() {
    let temp = TempDir::new().expect("temp dir");
    let dir = BucketDir::create(temp.path()).expect("create dir");
    std::fs::write(dir.file_path(5), b"not a bucket file at all").expect("write");

    let err = dir.load(5).unwrap_err();

    assert!(matches!(err, Error::Corrupted(_)));
    assert!(err.to_string().contains("bucket-5.bin"));
}

#[test]
fn test_bucket_dir_empty_file_is_corrupted() {
    let temp = TempDir::new().expect("temp dir");
    let dir = BucketDir::create(temp.path()).expect("create dir");
    std::fs::write(dir.file_path(3), b"").expect("write");

    assert!(matches!(dir.load(3), Err(Error::Corrupted(_))));
}

// -------------------------------------------------------------------------
// MemoryBuckets
// -------------------------------------------------------------------------

#[test]
fn test_memory_buckets_round_trip_through_codec() {
    let storage = MemoryBuckets::new();
    assert!(storage.is_empty());

    storage.store(&sample_bucket(), 4).expect("store");

    assert_eq!(storage.len(), 1);
    assert!(storage.encoded_bytes() > 0);
    let loaded = storage.load(5).expect("load").expect("bucket missing");
    assert_eq!(loaded.watermark(), 4);
    assert!(storage.load(6).expect("load").is_none());
}
