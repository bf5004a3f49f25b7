//! Inverse histogram transform back to RGB
//!
//! Each channel of a Gaussian-domain buffer is pushed through the normal CDF,
//! the resulting quantile picks a rank in the target's sorted projected
//! values, and the three matched coordinates are rotated back with the
//! transpose of the eigenvector basis.

use crate::compute::RankTable;
use crate::io::error::{Result, SynthesisError, computation_error};
use crate::io::pixels::{CHANNELS, PixelBuffer};
use crate::math::eigen::EigenDecomposition;
use crate::math::probability::normal_cdf;

/// Maps Gaussian-domain pixels onto a target's order statistics
#[derive(Debug, Clone, Copy)]
pub struct DeGaussianizer<'a> {
    targets: &'a [RankTable],
    basis: &'a EigenDecomposition,
}

impl<'a> DeGaussianizer<'a> {
    /// Use the rank tables and basis from the forward transform
    ///
    /// # Errors
    ///
    /// Returns an error unless there are three non-empty tables of equal
    /// length
    pub fn new(targets: &'a [RankTable], basis: &'a EigenDecomposition) -> Result<Self> {
        let [first, ..] = targets else {
            return Err(computation_error("degaussianize", &"no target rank tables"));
        };
        if targets.len() != 3 {
            return Err(SynthesisError::LengthMismatch {
                expected: 3,
                actual: targets.len(),
            });
        }
        if first.is_empty() {
            return Err(computation_error("degaussianize", &"target rank tables are empty"));
        }
        if let Some(table) = targets.iter().find(|t| t.len() != first.len()) {
            return Err(SynthesisError::LengthMismatch {
                expected: first.len(),
                actual: table.len(),
            });
        }
        Ok(Self { targets, basis })
    }

    /// Target value for Gaussian-domain coordinate `v` on `channel`
    pub fn match_value(&self, channel: usize, v: f32) -> Option<f32> {
        let table = self.targets.get(channel)?;
        let n = table.len();
        let u = normal_cdf(f64::from(v));
        let rank = (u * n as f64).floor().clamp(0.0, (n - 1) as f64) as usize;
        table.value_at(rank)
    }

    /// Restore RGB for every pixel of `input`, copying alpha
    ///
    /// # Errors
    ///
    /// Returns an error if a channel has no target table
    pub fn degaussianize(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        let mut output = input.clone();
        for px in output.data_mut().chunks_exact_mut(CHANNELS) {
            let mut coords = [0.0f64; 3];
            for (channel, (coord, &v)) in coords.iter_mut().zip(px.iter()).enumerate() {
                let matched = self.match_value(channel, v).ok_or_else(|| {
                    computation_error("degaussianize", &format!("no target for channel {channel}"))
                })?;
                *coord = f64::from(matched);
            }
            let rgb = self.basis.unproject(coords);
            for (dst, value) in px.iter_mut().zip(rgb) {
                *dst = value as f32;
            }
        }
        Ok(output)
    }
}
