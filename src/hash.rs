//! Content Fingerprints
//!
//! Cheap, deterministic change detection for source text and compiled output.
//! The accumulation mirrors the classic `(h << 5) - h + c` string hash over
//! UTF-16 code units with 32-bit signed overflow, so fingerprints agree with
//! the ones a browser host computes for the same text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-bit content fingerprint. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(i32);

impl Fingerprint {
    /// Fingerprint of the empty string.
    pub const ZERO: Fingerprint = Fingerprint(0);

    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Fingerprint {
    fn from(value: i32) -> Self {
        Fingerprint(value)
    }
}

/// Hash a string.
pub fn hash(text: &str) -> Fingerprint {
    Fingerprint(accumulate(0, text))
}

/// Hash several parts as if they were concatenated.
pub fn hash_all<'s, I>(parts: I) -> Fingerprint
where
    I: IntoIterator<Item = &'s str>,
{
    Fingerprint(parts.into_iter().fold(0, accumulate))
}

fn accumulate(seed: i32, text: &str) -> i32 {
    text.encode_utf16().fold(seed, |h, unit| {
        h.wrapping_shl(5).wrapping_sub(h).wrapping_add(i32::from(unit))
    })
}
