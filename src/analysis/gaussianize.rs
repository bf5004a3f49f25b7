//! Forward histogram transform into decorrelated Gaussian channels
//!
//! Pixels are projected onto the color principal axes, each axis is ranked
//! with the sorting network, and every pixel receives the standard normal
//! quantile of its rank. The rank tables are kept: they are the order
//! statistics the inverse transform maps back onto.

use bitvec::prelude::*;

use crate::compute::{ComputeBackend, ParallelRankSort, RankTable};
use crate::io::error::{Result, computation_error};
use crate::io::pixels::{CHANNELS, PixelBuffer};
use crate::math::eigen::EigenDecomposition;
use crate::math::probability::GaussianQuantiles;

/// Coordinates of every pixel along each eigenvector, one vector per axis
pub fn project_pixels(buffer: &PixelBuffer, basis: &EigenDecomposition) -> Vec<Vec<f32>> {
    let mut channels = vec![Vec::with_capacity(buffer.pixel_count()); 3];
    for px in buffer.pixels() {
        if let [r, g, b, ..] = px {
            let coords = basis.project([f64::from(*r), f64::from(*g), f64::from(*b)]);
            for (channel, value) in channels.iter_mut().zip(coords) {
                channel.push(value as f32);
            }
        }
    }
    channels
}

/// Gaussianized buffer together with the order statistics it was ranked by
#[derive(Debug, Clone)]
pub struct GaussianizedImage {
    buffer: PixelBuffer,
    targets: Vec<RankTable>,
}

impl GaussianizedImage {
    /// Per-axis standard normal values, alpha from the input
    pub const fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Sorted projected values per eigen axis
    pub fn targets(&self) -> &[RankTable] {
        &self.targets
    }

    /// Split into buffer and rank tables
    pub fn into_parts(self) -> (PixelBuffer, Vec<RankTable>) {
        (self.buffer, self.targets)
    }
}

/// Rank-based Gaussianization on a compute device
pub struct Gaussianizer<'a, B: ComputeBackend + ?Sized> {
    sorter: ParallelRankSort<'a, B>,
}

impl<'a, B: ComputeBackend + ?Sized> Gaussianizer<'a, B> {
    /// Rank on the given device
    pub const fn new(backend: &'a B) -> Self {
        Self {
            sorter: ParallelRankSort::new(backend),
        }
    }

    /// Replace each projected channel by the Gaussian quantile of its rank
    ///
    /// # Errors
    ///
    /// Returns an error if sorting fails or the rank tables do not cover
    /// every pixel exactly once per channel
    pub fn gaussianize(
        &self,
        input: &PixelBuffer,
        basis: &EigenDecomposition,
    ) -> Result<GaussianizedImage> {
        let n = input.pixel_count();
        let targets = self.sorter.sort(&project_pixels(input, basis))?;
        let quantiles = GaussianQuantiles::new(n);

        let source = input.data();
        let mut data = vec![0.0f32; n * CHANNELS];
        let mut alpha_written = bitvec![0; n];

        for (channel, table) in targets.iter().enumerate() {
            if table.len() != n {
                return Err(computation_error(
                    "gaussianize",
                    &format!("channel {channel} ranks {} of {n} pixels", table.len()),
                ));
            }
            let mut seen = bitvec![0; n];
            for (rank, (index, _)) in table.iter().enumerate() {
                let pixel = index as usize;
                if pixel >= n || seen.get(pixel).as_deref() == Some(&true) {
                    return Err(computation_error(
                        "gaussianize",
                        &format!("channel {channel} ranks pixel {pixel} twice or out of range"),
                    ));
                }
                seen.set(pixel, true);

                let base = pixel * CHANNELS;
                if let (Some(slot), Some(g)) = (data.get_mut(base + channel), quantiles.get(rank))
                {
                    *slot = g as f32;
                }
                if alpha_written.get(pixel).as_deref() == Some(&false) {
                    if let (Some(slot), Some(&a)) = (data.get_mut(base + 3), source.get(base + 3)) {
                        *slot = a;
                    }
                    alpha_written.set(pixel, true);
                }
            }
        }

        let buffer = PixelBuffer::new(data, input.width(), input.height())?;
        Ok(GaussianizedImage { buffer, targets })
    }
}
