//! Stochastic tile quilting in the Gaussian domain
//!
//! Every tile of the [`TileGeometry`] copies a window at a random offset of
//! the source and adds it, weighted by [`blend_weight`], into the target.
//! Target and source coordinates both wrap, so the result is periodic.

use ndarray::Array3;

use crate::io::error::{Result, SynthesisError, computation_error};
use crate::io::pixels::{CHANNELS, PixelBuffer};
use crate::math::random::RandomSource;
use crate::spatial::geometry::{TileGeometry, TileSpan};
use crate::spatial::weights::{AxisWeight, axis_weight, blend_weight};

/// Where one tile lands and which source window it copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    /// Tile column
    pub tile_x: u32,
    /// Tile row
    pub tile_y: u32,
    /// Source column of the window's first pixel
    pub offset_x: u32,
    /// Source row of the window's first pixel
    pub offset_y: u32,
}

/// Places and accumulates the tiles of one geometry
#[derive(Debug, Clone, Copy)]
pub struct TileQuilter<'g> {
    geometry: &'g TileGeometry,
}

impl<'g> TileQuilter<'g> {
    /// Quilt into the layout described by `geometry`
    pub const fn new(geometry: &'g TileGeometry) -> Self {
        Self { geometry }
    }

    /// Draw a source offset for every tile
    ///
    /// Tiles are visited along anti-diagonals of the tile grid, starting at
    /// `(0, 0)`; each tile draws its x offset, then its y offset. A scan that
    /// starts one diagonal earlier and alternates row and column tiles
    /// consumes the stream in a different order, so its pixels differ from
    /// these for the same seed.
    pub fn placements(
        &self,
        source_width: u32,
        source_height: u32,
        rng: &mut RandomSource,
    ) -> Vec<TilePlacement> {
        let columns = self.geometry.tile_count_w;
        let rows = self.geometry.tile_count_h;
        let mut placements = Vec::with_capacity(self.geometry.tile_count() as usize);

        for diagonal in 0..columns + rows - 1 {
            let first = diagonal.saturating_sub(rows - 1);
            let last = diagonal.min(columns - 1);
            for tile_x in first..=last {
                let tile_y = diagonal - tile_x;
                let offset_x = rng.next_below(source_width);
                let offset_y = rng.next_below(source_height);
                placements.push(TilePlacement {
                    tile_x,
                    tile_y,
                    offset_x,
                    offset_y,
                });
            }
        }
        placements
    }

    /// Quilt `source` into a buffer of the geometry's size
    ///
    /// The alpha channel of the result is taken from `alpha`, which must
    /// already have the target size.
    ///
    /// # Errors
    ///
    /// Returns an error if `alpha` does not match the target size or the
    /// accumulator cannot be read back
    pub fn quilt(
        &self,
        source: &PixelBuffer,
        alpha: &PixelBuffer,
        rng: &mut RandomSource,
    ) -> Result<PixelBuffer> {
        let (width, height) = (self.geometry.width(), self.geometry.height());
        if alpha.width() != width || alpha.height() != height {
            return Err(SynthesisError::LengthMismatch {
                expected: width as usize * height as usize * CHANNELS,
                actual: alpha.data().len(),
            });
        }

        let placements = self.placements(source.width(), source.height(), rng);
        let _span = tracing::debug_span!("quilt", tiles = placements.len()).entered();

        let src = source.view()?;
        let (source_height, source_width) = (src.dim().0, src.dim().1);
        let mut accumulator = Array3::<f32>::zeros((height as usize, width as usize, 3));

        for placement in &placements {
            let span_x = self.geometry.horizontal().span(placement.tile_x);
            let span_y = self.geometry.vertical().span(placement.tile_y);
            let weights_x = axis_weights(&span_x);

            for (py, &wy) in axis_weights(&span_y).iter().enumerate() {
                let ty = (span_y.start as usize + py) % height as usize;
                let sy = (placement.offset_y as usize + py) % source_height;
                for (px, &wx) in weights_x.iter().enumerate() {
                    let weight = blend_weight(wx, wy);
                    let tx = (span_x.start as usize + px) % width as usize;
                    let sx = (placement.offset_x as usize + px) % source_width;
                    for c in 0..3 {
                        if let (Some(dst), Some(&value)) =
                            (accumulator.get_mut((ty, tx, c)), src.get((sy, sx, c)))
                        {
                            *dst += weight * value;
                        }
                    }
                }
            }
        }

        let rgb = accumulator
            .as_slice()
            .ok_or_else(|| computation_error("quilt", &"accumulator is not contiguous"))?;
        let mut data = alpha.data().to_vec();
        for (px, sum) in data.chunks_exact_mut(CHANNELS).zip(rgb.chunks_exact(3)) {
            for (dst, &value) in px.iter_mut().zip(sum) {
                *dst = value;
            }
        }
        PixelBuffer::new(data, width, height)
    }
}

fn axis_weights(span: &TileSpan) -> Vec<AxisWeight> {
    (0..span.footprint())
        .map(|pos| axis_weight(pos, span.radius, span.extended))
        .collect()
}
