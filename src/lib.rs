//! Histogram-preserving tileable texture synthesis
//!
//! A photograph is decorrelated along its color principal axes, each axis is
//! Gaussianized by rank, border bands are blended across the wraparound and
//! randomly offset tiles are quilted with energy-normalized weights. Mapping
//! the result back through the source's order statistics restores its color
//! histogram, so the output tiles seamlessly yet keeps the look of the input.
//!
//! The data-parallel kernels run on an injected [`compute::ComputeBackend`]:
//! [`compute::WgpuBackend`] on a GPU, or [`compute::CpuBackend`] as the serial
//! reference device.

#![forbid(unsafe_code)]

/// Pipeline orchestration, options and stages
pub mod algorithm;
/// Color statistics and the forward and inverse histogram transforms
pub mod analysis;
/// Compute devices, GPU resources and the sorting network
pub mod compute;
/// Pixel buffers, errors, configuration and file I/O
pub mod io;
/// Eigen decomposition, probability functions and the seeded random stream
pub mod math;
/// Border blending, tile layout and quilting
pub mod spatial;

pub use algorithm::{Stage, SynthesisOptions, TileableSynthesizer};
pub use io::error::{Result, SynthesisError};
pub use io::pixels::PixelBuffer;
