//! Wraparound border blending
//!
//! Pixels within `border` of an edge are mixed with their mirror image across
//! the opposite edge (`size - 1 - p`). At the very edge both partners carry
//! almost equal weight, so the left and right (top and bottom) columns
//! agree and the image wraps without a hard seam before quilting starts.

use crate::compute::ComputeBackend;
use crate::io::configuration::MIN_BORDER_PIXELS;
use crate::io::error::{Result, SynthesisError, invalid_geometry};
use crate::io::pixels::{CHANNELS, PixelBuffer};

/// Weight of a pixel's own value along one axis
///
/// `0.5` at the edge rising linearly to `1.0` at `border` pixels inside.
pub fn band_weight(p: u32, size: u32, border: u32) -> f32 {
    let centre = p as f32 + 0.5;
    let distance = centre.min(size as f32 - centre);
    let band = border as f32;
    if distance >= band {
        return 1.0;
    }
    0.5 + 0.5 * distance / band
}

/// Serial border blend with the same arithmetic as the GPU kernel
///
/// # Errors
///
/// Returns an error if the output buffer cannot be assembled
pub fn blend_borders_reference(input: &PixelBuffer, border: u32) -> Result<PixelBuffer> {
    let (width, height) = (input.width(), input.height());
    let mut output = input.clone();
    let samples = input.data();
    let row_len = width as usize * CHANNELS;

    for (y, row) in output.data_mut().chunks_exact_mut(row_len).enumerate() {
        let y = y as u32;
        let wy = band_weight(y, height, border);
        let my = height - 1 - y;
        for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let x = x as u32;
            let wx = band_weight(x, width, border);
            let mx = width - 1 - x;

            let weights = [
                wx * wy,
                (1.0 - wx) * wy,
                wx * (1.0 - wy),
                (1.0 - wx) * (1.0 - wy),
            ];
            let norm = weights.iter().map(|w| w * w).sum::<f32>().sqrt();
            let sources = [(x, y), (mx, y), (x, my), (mx, my)];

            for (c, out) in px.iter_mut().take(3).enumerate() {
                let mut sum = 0.0;
                for (&weight, &(sx, sy)) in weights.iter().zip(&sources) {
                    let index = (sy as usize * width as usize + sx as usize) * CHANNELS + c;
                    sum += weight * samples.get(index).copied().unwrap_or(0.0);
                }
                *out = sum / norm;
            }
        }
    }
    Ok(output)
}

/// Runs the border blend on a compute device
pub struct BorderBlender<'a, B: ComputeBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: ComputeBackend + ?Sized> BorderBlender<'a, B> {
    /// Blend on the given device
    pub const fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Blend the border bands of `input`, keeping its alpha
    ///
    /// # Errors
    ///
    /// Returns an error if `border` is below the minimum or wider than half
    /// the shorter side, or if the device fails
    pub fn blend(&self, input: &PixelBuffer, border: u32) -> Result<PixelBuffer> {
        let limit = input.width().min(input.height()) / 2;
        if border < MIN_BORDER_PIXELS || border > limit {
            return Err(invalid_geometry(
                "border",
                &border,
                &format!("must lie within {MIN_BORDER_PIXELS}..={limit} pixels"),
            ));
        }

        let mut output = self.backend.blend_borders(input, border)?;
        if output.width() != input.width() || output.height() != input.height() {
            return Err(SynthesisError::LengthMismatch {
                expected: input.data().len(),
                actual: output.data().len(),
            });
        }
        output.copy_alpha_from(input)?;
        Ok(output)
    }
}
