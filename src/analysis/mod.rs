//! Color statistics and the histogram-preserving transforms built on them

/// Inverse transform from the Gaussian domain back to RGB
pub mod degaussianize;
/// Forward transform into decorrelated Gaussian channels
pub mod gaussianize;
/// Color covariance and its principal axes
pub mod pca;

pub use degaussianize::DeGaussianizer;
pub use gaussianize::{GaussianizedImage, Gaussianizer};
pub use pca::ColorPca;
