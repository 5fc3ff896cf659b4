//! Seedable xorshift64* generator.
//! Deterministic across platforms so terrain layouts replay from a seed and
//! survive a save/load round trip.

use serde::{Deserialize, Serialize};

const OUTPUT_MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Any seed works; zero (a fixed point of xorshift) is remapped.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn advance(&mut self) -> u64 {
        let s = &mut self.state;
        *s ^= *s >> 12;
        *s ^= *s << 25;
        *s ^= *s >> 27;
        s.wrapping_mul(OUTPUT_MULTIPLIER)
    }

    /// Uniform in [0, upper_bound). Zero for an empty range.
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        match upper_bound {
            0 => 0,
            n => (self.advance() % u64::from(n)) as u32,
        }
    }

    /// Uniform integer in the inclusive range [lo, hi].
    pub fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u32 + 1;
        lo + self.next_int(span) as i32
    }

    /// Uniform float in [lo, hi).
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        // Top 24 bits fill an f32 mantissa exactly.
        let unit = (self.advance() >> 40) as f32 / (1u32 << 24) as f32;
        lo + (hi - lo) * unit
    }
}
