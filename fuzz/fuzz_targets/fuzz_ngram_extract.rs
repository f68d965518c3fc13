//! Fuzz target for n-gram extraction and the similarity bounds.
//!
//! Checks the n-gram count formula on arbitrary Unicode input, and that a
//! string always reaches the top score against itself.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use simgram_core::ngram::{extract, MAX_NGRAM_SIZE};
use simgram_core::Measure;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    n: u8,
    pad: bool,
}

fuzz_target!(|input: Input| {
    let n = usize::from(input.n) % MAX_NGRAM_SIZE + 1;
    let grams = extract(&input.text, n, input.pad);

    let chars = input.text.chars().count();
    let expected = match (chars, input.pad) {
        (0, _) => 0,
        (len, true) => len + n - 1,
        (len, false) => len.saturating_sub(n) + 1,
    };
    assert_eq!(grams.len(), expected);

    let q = grams.len();
    if q > 0 {
        for measure in Measure::ALL {
            assert!(measure.accepts(q, q, q, 1.0), "{measure} rejects identity");
            let (lo, hi) = measure.candidate_range(q, 1.0);
            assert!(lo <= q && q <= hi);
        }
    }
});
