//! Compute devices executing the data-parallel kernels of the pipeline
//!
//! The synthesis core never creates a device itself. Callers inject anything
//! implementing [`ComputeBackend`]: the wgpu device for production use or the
//! serial reference device for tests and headless machines.

use crate::io::error::Result;
use crate::io::pixels::PixelBuffer;

/// Scoped GPU buffer ownership
pub mod arena;
/// Serial reference device running the same kernels on the CPU
pub mod cpu;
/// wgpu device context and kernel dispatch
pub mod gpu;
/// WGSL kernel sources
pub mod shaders;
/// Bitonic key-value sorting network and rank tables
pub mod sort;

pub use cpu::CpuBackend;
pub use gpu::{GpuContext, WgpuBackend};
pub use sort::{ParallelRankSort, RankTable, SortBatch};

/// A device able to run the pipeline's parallel kernels
///
/// Every call is a hard synchronization point: results are fully
/// materialized in host memory when the method returns and no device
/// resources outlive the call.
pub trait ComputeBackend {
    /// Short device description for logs
    fn name(&self) -> &str;

    /// Run the full bitonic schedule over every channel of the batch
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot allocate, dispatch or read back
    fn bitonic_sort(&self, batch: &mut SortBatch) -> Result<()>;

    /// Blend mirrored border bands so opposite edges meet continuously
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot allocate, dispatch or read back
    fn blend_borders(&self, input: &PixelBuffer, border: u32) -> Result<PixelBuffer>;
}

impl<B: ComputeBackend + ?Sized> ComputeBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn bitonic_sort(&self, batch: &mut SortBatch) -> Result<()> {
        (**self).bitonic_sort(batch)
    }

    fn blend_borders(&self, input: &PixelBuffer, border: u32) -> Result<PixelBuffer> {
        (**self).blend_borders(input, border)
    }
}
