//! Spatial stages of the synthesis pipeline
//!
//! This module contains:
//! - Wraparound border blending
//! - Tile layout and overlap weights
//! - Stochastic quilting of the tiles

/// Mirrored border band blending
pub mod border;
/// Tile layout derived from target size and border
pub mod geometry;
/// Random tile placement with weighted accumulation
pub mod quilting;
/// Energy-normalized overlap weights
pub mod weights;

pub use border::BorderBlender;
pub use geometry::TileGeometry;
pub use quilting::TileQuilter;
