//! Overlap weights for quilted tiles
//!
//! Along each axis a tile fades linearly from zero at its ends to one in its
//! middle, so the two tiles covering any pixel have complementary ramps
//! `λ` and `1 - λ`. The weights are then normalized by the root of the
//! summed squares of every contribution to the pixel: blended Gaussian noise
//! keeps unit variance instead of washing out in the overlaps.

/// Weight class of one tile-local coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisWeight {
    /// The one pixel seam of an extended tile; no other tile covers it
    Seam,
    /// Linear ramp value in `[0, 1]`
    Ramp(f32),
}

impl AxisWeight {
    /// Ramp value, one on a seam
    pub const fn lambda(self) -> f32 {
        match self {
            Self::Seam => 1.0,
            Self::Ramp(lambda) => lambda,
        }
    }
}

/// Triangular ramp at `pos` inside a tile of `extent` pixels
///
/// Zero at both ends, one on the two middle pixels.
pub fn axis_ramp(pos: u32, extent: u32) -> f32 {
    let half = extent as f32 / 2.0 - 1.0;
    if half <= 0.0 {
        return 1.0;
    }
    let centre = 0.5 * (extent as f32 - 1.0);
    let distance = (pos as f32 - centre).abs().floor();
    (1.0 - distance / half).clamp(0.0, 1.0)
}

/// Classify a tile-local position along one axis
///
/// Extended tiles are `2 * radius + 1` wide with the seam at `radius`;
/// positions after the seam ramp as if it were not there.
pub fn axis_weight(pos: u32, radius: u32, extended: bool) -> AxisWeight {
    if extended && pos == radius {
        return AxisWeight::Seam;
    }
    let pos = if extended && pos > radius { pos - 1 } else { pos };
    AxisWeight::Ramp(axis_ramp(pos, 2 * radius))
}

/// Energy-normalized blend weight of a tile at one pixel
pub fn blend_weight(x: AxisWeight, y: AxisWeight) -> f32 {
    match (x, y) {
        (AxisWeight::Seam, AxisWeight::Seam) => 1.0,
        (AxisWeight::Seam, AxisWeight::Ramp(lambda))
        | (AxisWeight::Ramp(lambda), AxisWeight::Seam) => {
            let partner = 1.0 - lambda;
            lambda / lambda.hypot(partner)
        }
        (AxisWeight::Ramp(lx), AxisWeight::Ramp(ly)) => {
            let w00 = (1.0 - lx) * (1.0 - ly);
            let w10 = lx * (1.0 - ly);
            let w01 = (1.0 - lx) * ly;
            let w11 = lx * ly;
            let norm = (w00 * w00 + w10 * w10 + w01 * w01 + w11 * w11).sqrt();
            w11 / norm
        }
    }
}
