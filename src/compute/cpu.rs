//! Serial reference device
//!
//! Executes the exact pass schedule and blend formula of the GPU kernels one
//! element at a time. Selected explicitly by the caller; the pipeline never
//! falls back to it on its own.

use crate::compute::ComputeBackend;
use crate::compute::sort::{BitonicPass, SortBatch, pair_first_index, pair_is_ascending};
use crate::io::error::Result;
use crate::io::pixels::PixelBuffer;
use crate::spatial::border::blend_borders_reference;

/// Reference device running kernels on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Create the reference device
    pub const fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu-reference"
    }

    fn bitonic_sort(&self, batch: &mut SortBatch) -> Result<()> {
        let schedule = batch.schedule();
        let channels = batch.channels();
        let pairs = (batch.padded_len() / 2) as u32;
        let (keys, payload) = batch.parts_mut();
        for pass in schedule {
            compare_and_swap_pass(keys, payload, channels, pairs, pass);
        }
        Ok(())
    }

    fn blend_borders(&self, input: &PixelBuffer, border: u32) -> Result<PixelBuffer> {
        blend_borders_reference(input, border)
    }
}

// One dispatch worth of work: every pair is independent of the others
fn compare_and_swap_pass(
    keys: &mut [f32],
    payload: &mut [u32],
    channels: usize,
    pairs: u32,
    pass: BitonicPass,
) {
    for pair in 0..pairs {
        let first = pair_first_index(pair, pass.j);
        let second = first + pass.j;
        let ascending = pair_is_ascending(first, pass.k);
        for c in 0..channels {
            let a = first as usize * channels + c;
            let b = second as usize * channels + c;
            let (Some(&key_a), Some(&key_b)) = (keys.get(a), keys.get(b)) else {
                continue;
            };
            let out_of_order = if ascending {
                key_a > key_b
            } else {
                key_a < key_b
            };
            if out_of_order {
                keys.swap(a, b);
                payload.swap(a, b);
            }
        }
    }
}
