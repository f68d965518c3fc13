//! Fuzz target for the posting bucket decoder.
//!
//! Bucket files are read back from disk, so every byte is untrusted. The
//! decoder must reject malformed input with an error: no panics, and no
//! allocation driven by a length field the checksum has not vouched for.

#![no_main]

use libfuzzer_sys::fuzz_target;
use simgram_core::storage::{decode_bucket, encode_bucket};

fuzz_target!(|data: &[u8]| {
    if let Ok(bucket) = decode_bucket(data) {
        // Anything accepted must re-encode to an equally valid file
        let bytes = encode_bucket(&bucket, bucket.watermark()).expect("re-encode");
        let again = decode_bucket(&bytes).expect("decode re-encoded bucket");
        assert_eq!(again.size(), bucket.size());
        assert_eq!(again.member_count(), bucket.member_count());
        assert_eq!(again.ngram_count(), bucket.ngram_count());
    }
});
