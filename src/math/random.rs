//! Deterministic hash-seeded xorshift stream
//!
//! Synthesis must be reproducible bit for bit across runs and platforms, so the
//! tile offsets come from this small generator rather than from an OS-seeded
//! source. Implements [`rand::RngCore`] so it can also drive `rand` APIs.

use rand::RngCore;

/// Replacement state for seeds that hash to zero (xorshift never leaves zero)
const NONZERO_STATE: u32 = 0x9E37_79B9;

/// Scale mapping the top 24 bits of a word into `[0, 1)`
const FLOAT_SCALE: f32 = 1.0 / 16_777_216.0;

/// Seeded 32-bit xorshift generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSource {
    state: u32,
}

impl RandomSource {
    /// Create a stream from an integer seed
    ///
    /// The seed is folded to 32 bits and avalanche-mixed so that adjacent
    /// seeds start from unrelated states.
    pub const fn seed(seed: i64) -> Self {
        let bits = seed as u64;
        let folded = (bits ^ (bits >> 32)) as u32;
        let state = avalanche(folded);
        Self {
            state: if state == 0 { NONZERO_STATE } else { state },
        }
    }

    /// Advance the stream and return the raw 32-bit word
    pub const fn next_word(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Next value uniformly distributed in `[0, 1)`
    pub fn next_float(&mut self) -> f32 {
        (self.next_word() >> 8) as f32 * FLOAT_SCALE
    }

    /// Uniform integer in `[0, bound)`, zero when `bound` is zero
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let scaled = (self.next_float() * bound as f32) as u32;
        scaled.min(bound - 1)
    }
}

// Integer hash finalizer; every input bit affects every output bit.
const fn avalanche(mut x: u32) -> u32 {
    x = ((x >> 16) ^ x).wrapping_mul(0x045D_9F3B);
    x = ((x >> 16) ^ x).wrapping_mul(0x045D_9F3B);
    (x >> 16) ^ x
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_word());
        let low = u64::from(self.next_word());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let word = self.next_word().to_le_bytes();
            for (byte, value) in chunk.iter_mut().zip(word) {
                *byte = value;
            }
        }
    }
}
