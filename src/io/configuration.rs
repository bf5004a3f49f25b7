//! Algorithm constants and runtime configuration defaults

// Default values for configurable parameters
/// Fixed seed for reproducible synthesis
pub const DEFAULT_SEED: i64 = 4256;

/// Default border band as a percentage of half the shorter image side
pub const DEFAULT_BORDER_PERCENT: f32 = 25.0;

/// Smallest border band (and tile radius) the blend weights are defined for
pub const MIN_BORDER_PIXELS: u32 = 2;

// Eigen decomposition of the 3x3 color covariance
/// Full Jacobi sweeps before giving up on convergence
pub const JACOBI_MAX_SWEEPS: usize = 10;
/// Off-diagonal magnitude treated as converged
pub const JACOBI_TOLERANCE: f64 = 1e-10;

// Compute kernel launch parameters
/// Invocations per workgroup of the bitonic compare-and-swap kernel
pub const SORT_WORKGROUP_SIZE: u32 = 256;
/// Edge length of the square workgroup used by the border blend kernel
pub const BORDER_WORKGROUP_SIZE: u32 = 16;
/// Maximum workgroups per dispatch dimension guaranteed by WebGPU
pub const MAX_WORKGROUPS_PER_DIMENSION: u32 = 65_535;
/// Bytes occupied by one bitonic pass parameter block
pub const SORT_PARAMS_SIZE: u64 = 32;
/// Maximum time spent waiting for a buffer readback
pub const READBACK_TIMEOUT_MS: u64 = 120_000;

// Output settings
/// Suffix added to synthesized output filenames
pub const OUTPUT_SUFFIX: &str = "_tileable";
/// Suffix added to the repeated preview filenames
pub const PREVIEW_SUFFIX: &str = "_preview";
/// Repetitions per axis in the preview image
pub const PREVIEW_REPEAT: u32 = 2;
/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";

// Progress display settings
/// Files shown with their own bar before switching to a batch bar
pub const MAX_INDIVIDUAL_PROGRESS_BARS: usize = 5;
