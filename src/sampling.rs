//! Random record selection.
//!
//! A raw random sample is widened and written out as base-36 digits; those
//! digits seed a second generator, and that generator picks the index.

use crate::errors::SamplingError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED_RADIX: u32 = 36;
const MAX_FRACTION_DIGITS: usize = 20;
// Leading fraction digits dropped from the seed string.
const SKIPPED_DIGITS: usize = 6;

/// Seed material for a single selection. Created fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSeed(String);

impl SelectionSeed {
    /// Derives a seed from a new non-cryptographic random sample.
    pub fn fresh() -> Self {
        Self::from_sample(rand::thread_rng().gen_range(0.0..1.0))
    }

    /// Derives a seed from `sample`, expected in `[0, 1)`.
    ///
    /// The sample is offset into `[1, 2)` and squared, then the base-36
    /// fraction digits of the result are truncated to form the seed string.
    pub fn from_sample(sample: f64) -> Self {
        let offset = sample + 1.0;
        let widened = offset * offset;
        let digits = fraction_digits(widened, SEED_RADIX, MAX_FRACTION_DIGITS);
        Self(digits.chars().skip(SKIPPED_DIGITS).collect())
    }

    pub fn from_string(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the seeded generator. Same seed, same sequence.
    pub fn generator(&self) -> StdRng {
        StdRng::seed_from_u64(fnv1a(self.0.as_bytes()))
    }
}

/// Picks an index in `[0, total_count)` from `seed`.
pub fn select_index(total_count: u64, seed: &SelectionSeed) -> Result<u64, SamplingError> {
    if total_count == 0 {
        return Err(SamplingError::NoRecords);
    }
    let draw: f64 = seed.generator().gen_range(0.0..1.0);
    let index = (draw * total_count as f64).floor() as u64;
    // float rounding can land on total_count for very large counts
    Ok(index.min(total_count - 1))
}

fn fraction_digits(value: f64, radix: u32, max_digits: usize) -> String {
    let mut fraction = value.fract();
    let mut digits = String::with_capacity(max_digits);
    while fraction > 0.0 && digits.len() < max_digits {
        fraction *= f64::from(radix);
        let digit = fraction.trunc() as u32;
        if let Some(c) = char::from_digit(digit, radix) {
            digits.push(c);
        }
        fraction -= f64::from(digit);
    }
    digits
}

// 64-bit FNV-1a; stable across platforms and releases, unlike DefaultHasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}
