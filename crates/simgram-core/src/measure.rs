//! Similarity measures over n-gram multisets and their threshold inversions.
//!
//! Every measure is a function of three counts: the query size `q`, the
//! candidate size `c` and the number of shared n-grams `s`. For a threshold
//! `t` each measure can be inverted into:
//!
//! - a range `[c_min, c_max]` of candidate sizes that can reach `t` at all
//!   (used to skip whole length buckets), and
//! - a minimum overlap `s_min(q, c, t)` a candidate of size `c` needs.
//!
//! | measure | score | c_min | c_max | s_min |
//! |---------|-------|-------|-------|-------|
//! | cosine  | s/√(qc) | ⌈t²q⌉ | ⌊q/t²⌋ | ⌈t√(qc)⌉ |
//! | dice    | 2s/(q+c) | ⌈tq/(2−t)⌉ | ⌊(2−t)q/t⌋ | ⌈t(q+c)/2⌉ |
//! | jaccard | s/(q+c−s) | ⌈tq⌉ | ⌊q/t⌋ | ⌈t(q+c)/(1+t)⌉ |
//! | overlap | s/min(q,c) | 1 | ∞ | ⌈t·min(q,c)⌉ |
//! | exact   | [q=c=s] | q | q | q |
//!
//! Rounding is done with a small tolerance toward the wider bound so that
//! float error (`0.6 * 5 = 3.0000000000000004`) never drops a true match.
//! Exact scoring with [`Measure::accepts`] removes the slack.

#![allow(clippy::cast_precision_loss)] // n-gram counts are far below 2^52
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Tolerance applied to threshold comparisons and bound rounding.
pub const EPSILON: f64 = 1e-9;

/// Similarity measure used for retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    /// Identical n-gram multisets only.
    Exact,
    /// Dice coefficient `2s / (q + c)`.
    Dice,
    /// Cosine coefficient `s / sqrt(q * c)`.
    Cosine,
    /// Jaccard coefficient `s / (q + c - s)`.
    Jaccard,
    /// Overlap (containment) coefficient `s / min(q, c)`.
    Overlap,
}

impl Measure {
    /// All measures, in declaration order.
    pub const ALL: [Measure; 5] = [
        Self::Exact,
        Self::Dice,
        Self::Cosine,
        Self::Jaccard,
        Self::Overlap,
    ];

    /// Lower-case name of the measure.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Dice => "dice",
            Self::Cosine => "cosine",
            Self::Jaccard => "jaccard",
            Self::Overlap => "overlap",
        }
    }

    /// Similarity of a candidate of size `c` sharing `s` n-grams with a
    /// query of size `q`. Returns 0 when either side is empty.
    #[must_use]
    pub fn score(&self, q: usize, c: usize, s: usize) -> f64 {
        if q == 0 || c == 0 {
            return 0.0;
        }
        let (qf, cf, sf) = (q as f64, c as f64, s as f64);
        match self {
            Self::Exact => {
                if q == c && s == q {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Dice => 2.0 * sf / (qf + cf),
            Self::Cosine => sf / (qf * cf).sqrt(),
            Self::Jaccard => sf / (qf + cf - sf),
            Self::Overlap => sf / q.min(c) as f64,
        }
    }

    /// Whether `score(q, c, s) >= threshold`, inclusive.
    #[must_use]
    pub fn accepts(&self, q: usize, c: usize, s: usize, threshold: f64) -> bool {
        self.score(q, c, s) + EPSILON >= threshold
    }

    /// Inclusive range of candidate sizes that can reach `threshold` for a
    /// query of size `q`. The upper bound is `usize::MAX` for overlap.
    #[must_use]
    pub fn candidate_range(&self, q: usize, threshold: f64) -> (usize, usize) {
        let qf = q as f64;
        let t = threshold;
        let (min, max) = match self {
            Self::Exact => return (q, q),
            Self::Dice => (
                ceil_tolerant(t * qf / (2.0 - t)),
                floor_tolerant((2.0 - t) * qf / t),
            ),
            Self::Cosine => (ceil_tolerant(t * t * qf), floor_tolerant(qf / (t * t))),
            Self::Jaccard => (ceil_tolerant(t * qf), floor_tolerant(qf / t)),
            Self::Overlap => return (1, usize::MAX),
        };
        (min.max(1), max)
    }

    /// Minimum number of shared n-grams a candidate of size `c` needs to
    /// reach `threshold` against a query of size `q`. Never below 1.
    #[must_use]
    pub fn min_overlap(&self, q: usize, c: usize, threshold: f64) -> usize {
        let (qf, cf) = (q as f64, c as f64);
        let t = threshold;
        let needed = match self {
            Self::Exact => q,
            Self::Dice => ceil_tolerant(0.5 * t * (qf + cf)),
            Self::Cosine => ceil_tolerant(t * (qf * cf).sqrt()),
            Self::Jaccard => ceil_tolerant(t * (qf + cf) / (1.0 + t)),
            Self::Overlap => ceil_tolerant(t * q.min(c) as f64),
        };
        needed.max(1)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "dice" => Ok(Self::Dice),
            "cosine" => Ok(Self::Cosine),
            "jaccard" => Ok(Self::Jaccard),
            "overlap" => Ok(Self::Overlap),
            other => Err(Error::InvalidArgument(format!(
                "unknown similarity measure '{other}', expected one of: exact, dice, cosine, jaccard, overlap"
            ))),
        }
    }
}

/// Checks that `threshold` lies in `(0, 1]`.
///
/// # Errors
///
/// Returns `InvalidArgument` for anything else, NaN included.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "threshold {threshold} is out of range (0, 1]"
        )))
    }
}

fn ceil_tolerant(x: f64) -> usize {
    let v = (x - EPSILON).ceil();
    if v <= 0.0 {
        0
    } else {
        v as usize
    }
}

fn floor_tolerant(x: f64) -> usize {
    let v = (x + EPSILON).floor();
    if v <= 0.0 {
        0
    } else {
        // `as` saturates for values beyond usize::MAX
        v as usize
    }
}
