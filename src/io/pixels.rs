//! RGBA sample buffer exchanged with callers and between pipeline stages

use crate::io::error::{Result, SynthesisError, computation_error, invalid_geometry};
use ndarray::{ArrayView3, ArrayViewMut3};

/// Interleaved channels per pixel
pub const CHANNELS: usize = 4;

/// Contiguous RGBA samples in row-major order
///
/// Samples are stored as `f32` regardless of the source encoding. RGBA8 input
/// is normalized to `[0, 1]`; RGBA32F input is kept as is. The length always
/// equals `width * height * 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Wrap RGBA32F samples
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the sample count is
    /// not `width * height * 4`
    pub fn new(data: Vec<f32>, width: u32, height: u32) -> Result<Self> {
        let expected = sample_count(width, height)?;
        if data.len() != expected {
            return Err(SynthesisError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Create a buffer with every sample set to zero
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero
    pub fn zeroed(width: u32, height: u32) -> Result<Self> {
        let len = sample_count(width, height)?;
        Self::new(vec![0.0; len], width, height)
    }

    /// Decode RGBA8 samples into normalized floats
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the byte count is not
    /// `width * height * 4`
    pub fn from_rgba8(bytes: &[u8], width: u32, height: u32) -> Result<Self> {
        let data = bytes.iter().map(|&b| f32::from(b) / 255.0).collect();
        Self::new(data, width, height)
    }

    /// Quantize samples back to RGBA8, clamping out-of-range values
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| num_traits::clamp((v * 255.0).round(), 0.0, 255.0) as u8)
            .collect()
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw interleaved samples
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw interleaved samples
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the buffer, returning its samples
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Iterate pixels as `[r, g, b, a]`
    pub fn pixels(&self) -> impl Iterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(CHANNELS)
    }

    /// Fetch one pixel, `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let base = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let px = self.data.get(base..base + CHANNELS)?;
        Some([*px.first()?, *px.get(1)?, *px.get(2)?, *px.get(3)?])
    }

    /// View samples as a `(height, width, 4)` array
    ///
    /// # Errors
    ///
    /// Returns an error if the shape cannot be formed (unreachable for a
    /// buffer built through the validating constructors)
    pub fn view(&self) -> Result<ArrayView3<'_, f32>> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .map_err(|e| computation_error("pixel view", &e))
    }

    /// Mutable `(height, width, 4)` view of the samples
    ///
    /// # Errors
    ///
    /// Returns an error if the shape cannot be formed
    pub fn view_mut(&mut self) -> Result<ArrayViewMut3<'_, f32>> {
        let shape = (self.height as usize, self.width as usize, CHANNELS);
        ArrayViewMut3::from_shape(shape, &mut self.data)
            .map_err(|e| computation_error("pixel view", &e))
    }

    /// Replace this buffer's alpha channel with the alpha of `other`
    ///
    /// # Errors
    ///
    /// Returns an error if the two buffers differ in size
    pub fn copy_alpha_from(&mut self, other: &Self) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(SynthesisError::LengthMismatch {
                expected: self.data.len(),
                actual: other.data.len(),
            });
        }
        for (dst, src) in self
            .data
            .chunks_exact_mut(CHANNELS)
            .zip(other.data.chunks_exact(CHANNELS))
        {
            if let (Some(d), Some(s)) = (dst.get_mut(3), src.get(3)) {
                *d = *s;
            }
        }
        Ok(())
    }

    /// Check that every RGB sample is finite
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pixel holding NaN or infinity
    pub fn ensure_finite_rgb(&self) -> Result<()> {
        for (index, px) in self.pixels().enumerate() {
            if px.iter().take(3).any(|v| !v.is_finite()) {
                return Err(SynthesisError::InvalidSourceData {
                    reason: format!("pixel {index} holds a non-finite color sample"),
                });
            }
        }
        Ok(())
    }
}

fn sample_count(width: u32, height: u32) -> Result<usize> {
    if width == 0 {
        return Err(invalid_geometry("width", &width, &"must be positive"));
    }
    if height == 0 {
        return Err(invalid_geometry("height", &height, &"must be positive"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or_else(|| invalid_geometry("width", &width, &"image too large to address"))
}
