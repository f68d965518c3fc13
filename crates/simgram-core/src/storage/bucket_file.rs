//! On-disk posting buckets.
//!
//! Each length bucket lives in its own file, `postings/bucket-<size>.bin`.
//!
//! ## Format
//!
//! ```text
//! [Magic: "SGPB" 4 bytes]
//! [Version: 1 byte]
//! [Bucket size: 4 bytes]
//! [Watermark: 4 bytes]
//! [Payload length: 8 bytes]
//! [Payload: bincode-encoded PostingBucket]
//! [CRC32: 4 bytes]
//! ```
//!
//! All integers are little-endian. Files are replaced through a temp file and
//! a rename, so readers never observe a partial write.

use bincode::Options;
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::traits::BucketStorage;
use crate::error::{Error, Result};
use crate::index::PostingBucket;

/// Bucket file magic bytes.
pub(crate) const BUCKET_MAGIC: &[u8; 4] = b"SGPB";

/// Current bucket format version.
pub(crate) const BUCKET_VERSION: u8 = 1;

/// magic(4) + version(1) + size(4) + watermark(4) + payload length(8)
const HEADER_LEN: usize = 21;
const CRC_LEN: usize = 4;

/// Simple CRC32 implementation (IEEE 802.3 polynomial).
#[inline]
#[allow(clippy::cast_possible_truncation)] // Table index always 0-255
pub(crate) fn crc32_hash(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[idx];
    }
    !crc
}

/// Serializes `bucket` into the bucket file format.
///
/// # Errors
///
/// Returns a serialization error if bincode fails.
pub fn encode_bucket(bucket: &PostingBucket, watermark: u32) -> Result<Vec<u8>> {
    let payload = bincode::DefaultOptions::new().serialize(bucket)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
    buf.extend_from_slice(BUCKET_MAGIC);
    buf.push(BUCKET_VERSION);
    buf.extend_from_slice(&bucket.size().to_le_bytes());
    buf.extend_from_slice(&watermark.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(&payload);

    let crc = crc32_hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Parses a bucket file, validating header, length and checksum before the
/// payload is decoded.
///
/// # Errors
///
/// Returns `Corrupted` for any malformed input.
pub fn decode_bucket(data: &[u8]) -> Result<PostingBucket> {
    if data.len() < HEADER_LEN + CRC_LEN {
        return Err(corrupted("bucket file too small"));
    }
    if &data[0..4] != BUCKET_MAGIC {
        return Err(corrupted("invalid bucket magic"));
    }
    if data[4] != BUCKET_VERSION {
        return Err(corrupted("unsupported bucket version"));
    }

    let size = u32::from_le_bytes(read_array(data, 5)?);
    let watermark = u32::from_le_bytes(read_array(data, 9)?);
    let payload_len = u64::from_le_bytes(read_array(data, 13)?);

    // Validate the declared length against the actual data before slicing
    let available = (data.len() - HEADER_LEN - CRC_LEN) as u64;
    if payload_len != available {
        return Err(corrupted("bucket payload length mismatch"));
    }

    let crc_offset = data.len() - CRC_LEN;
    let stored_crc = u32::from_le_bytes(read_array(data, crc_offset)?);
    if stored_crc != crc32_hash(&data[..crc_offset]) {
        return Err(corrupted("bucket CRC mismatch"));
    }

    let payload = &data[HEADER_LEN..crc_offset];
    let mut bucket: PostingBucket = bincode::DefaultOptions::new()
        .with_limit(available)
        .deserialize(payload)
        .map_err(|e| Error::Corrupted(format!("bucket payload: {e}")))?;

    if bucket.size() != size {
        return Err(corrupted("bucket header and payload disagree on size"));
    }
    bucket.set_watermark(watermark);
    Ok(bucket)
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| corrupted("truncated bucket header"))
}

fn corrupted(message: &str) -> Error {
    Error::Corrupted(message.to_string())
}

/// Directory of bucket files.
#[derive(Debug, Clone)]
pub struct BucketDir {
    dir: PathBuf,
}

impl BucketDir {
    /// Uses `dir` for bucket files, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self::open(dir))
    }

    /// Uses `dir` for bucket files without touching the filesystem.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file holding bucket `size`.
    #[must_use]
    pub fn file_path(&self, size: u32) -> PathBuf {
        self.dir.join(format!("bucket-{size}.bin"))
    }
}

impl BucketStorage for BucketDir {
    fn load(&self, size: u32) -> Result<Option<PostingBucket>> {
        let path = self.file_path(size);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if file.metadata()?.len() == 0 {
            return Err(corrupted("empty bucket file"));
        }

        // SAFETY: bucket files are never modified in place; writers replace
        // them with a rename, which leaves this mapping's inode untouched.
        let mmap = unsafe { Mmap::map(&file)? };
        match decode_bucket(&mmap) {
            Ok(bucket) => Ok(Some(bucket)),
            Err(Error::Corrupted(message)) => Err(Error::Corrupted(format!(
                "{}: {message}",
                path.display()
            ))),
            Err(e) => Err(e),
        }
    }

    fn store(&self, bucket: &PostingBucket, watermark: u32) -> Result<()> {
        let buf = encode_bucket(bucket, watermark)?;
        let path = self.file_path(bucket.size());
        let temp_path = path.with_extension("bin.tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}
