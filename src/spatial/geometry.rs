//! Tile layout covering the target image with overlapping patches
//!
//! Each axis is cut into `count` cells of `radius` pixels. The `rest` pixels
//! that do not divide evenly are handed out one per cell, spread evenly
//! along the axis; a cell that receives one is "extended" and its tile gets a
//! one pixel wide seam in the middle. A tile spans two cells, so every pixel
//! off the seams is covered by exactly two tiles per axis (wrapping around).

use crate::io::configuration::MIN_BORDER_PIXELS;
use crate::io::error::{Result, invalid_geometry};

/// One tile's extent along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    /// Tile index along the axis
    pub index: u32,
    /// First target pixel covered by the tile
    pub start: u32,
    /// Half the tile size, excluding the seam
    pub radius: u32,
    /// Whether the tile carries a seam pixel at position `radius`
    pub extended: bool,
}

impl TileSpan {
    /// Pixels of the cell this tile owns (distance to the next tile's start)
    pub const fn cell_len(&self) -> u32 {
        self.radius + self.extended as u32
    }

    /// Pixels covered by the whole tile
    pub const fn footprint(&self) -> u32 {
        2 * self.radius + self.extended as u32
    }
}

/// Cell layout of a single axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisTiling {
    dim: u32,
    count: u32,
    radius: u32,
    rest: u32,
}

impl AxisTiling {
    /// Lay out `dim` pixels in cells of at least `border` pixels
    ///
    /// # Errors
    ///
    /// Returns an error if `dim` or `border` is zero or the axis fits no cell
    pub fn new(parameter: &'static str, dim: u32, border: u32) -> Result<Self> {
        if dim == 0 {
            return Err(invalid_geometry(parameter, &dim, &"must be positive"));
        }
        if border == 0 {
            return Err(invalid_geometry("border", &border, &"must be positive"));
        }
        let count = dim / border;
        if count == 0 {
            return Err(invalid_geometry(
                parameter,
                &dim,
                &format!("smaller than the {border} pixel border, no tiles fit"),
            ));
        }
        let radius = dim / count;
        Ok(Self {
            dim,
            count,
            radius,
            rest: dim - count * radius,
        })
    }

    /// Pixels along the axis
    pub const fn dim(&self) -> u32 {
        self.dim
    }

    /// Number of tiles
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Cell size without extension
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Pixels distributed as seams
    pub const fn rest(&self) -> u32 {
        self.rest
    }

    // Seams handed out before cell `t`
    const fn seams_before(&self, t: u32) -> u32 {
        ((t as u64 * self.rest as u64) / self.count as u64) as u32
    }

    /// Whether cell `t` absorbs one of the rest pixels
    pub const fn is_extended(&self, t: u32) -> bool {
        self.seams_before(t + 1) > self.seams_before(t)
    }

    /// First pixel of cell `t`
    pub const fn start(&self, t: u32) -> u32 {
        t * self.radius + self.seams_before(t)
    }

    /// Full span of tile `t`
    pub const fn span(&self, t: u32) -> TileSpan {
        TileSpan {
            index: t,
            start: self.start(t),
            radius: self.radius,
            extended: self.is_extended(t),
        }
    }

    /// Every tile span in order
    pub fn spans(&self) -> impl Iterator<Item = TileSpan> + '_ {
        (0..self.count).map(|t| self.span(t))
    }
}

/// Tile layout of a target image for a given border size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// Tiles per row
    pub tile_count_w: u32,
    /// Tiles per column
    pub tile_count_h: u32,
    /// Horizontal cell size
    pub tile_radius_w: u32,
    /// Vertical cell size
    pub tile_radius_h: u32,
    /// Tile width without seam
    pub tile_w: u32,
    /// Tile height without seam
    pub tile_h: u32,
    /// Horizontal pixels absorbed by seams
    pub rest_w: u32,
    /// Vertical pixels absorbed by seams
    pub rest_h: u32,
    horizontal: AxisTiling,
    vertical: AxisTiling,
}

impl TileGeometry {
    /// Derive the layout for a `width x height` target
    ///
    /// # Errors
    ///
    /// Returns [`crate::SynthesisError::InvalidGeometry`] if a dimension is
    /// zero, `border` is below the minimum, or `border` exceeds half the
    /// shorter side
    pub fn new(width: u32, height: u32, border: u32) -> Result<Self> {
        if border < MIN_BORDER_PIXELS {
            return Err(invalid_geometry(
                "border",
                &border,
                &format!("must be at least {MIN_BORDER_PIXELS} pixels"),
            ));
        }
        let horizontal = AxisTiling::new("width", width, border)?;
        let vertical = AxisTiling::new("height", height, border)?;
        let limit = width.min(height) / 2;
        if border > limit {
            return Err(invalid_geometry(
                "border",
                &border,
                &format!("exceeds half the shorter side ({limit} pixels)"),
            ));
        }

        Ok(Self {
            tile_count_w: horizontal.count(),
            tile_count_h: vertical.count(),
            tile_radius_w: horizontal.radius(),
            tile_radius_h: vertical.radius(),
            tile_w: 2 * horizontal.radius(),
            tile_h: 2 * vertical.radius(),
            rest_w: horizontal.rest(),
            rest_h: vertical.rest(),
            horizontal,
            vertical,
        })
    }

    /// Target width
    pub const fn width(&self) -> u32 {
        self.horizontal.dim()
    }

    /// Target height
    pub const fn height(&self) -> u32 {
        self.vertical.dim()
    }

    /// Layout along x
    pub const fn horizontal(&self) -> &AxisTiling {
        &self.horizontal
    }

    /// Layout along y
    pub const fn vertical(&self) -> &AxisTiling {
        &self.vertical
    }

    /// Total number of tiles placed
    pub const fn tile_count(&self) -> u64 {
        self.tile_count_w as u64 * self.tile_count_h as u64
    }
}
