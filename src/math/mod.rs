//! Numerical building blocks

/// Jacobi eigen decomposition of symmetric 3x3 matrices
pub mod eigen;
/// Error function, normal distribution and Gaussian quantile tables
pub mod probability;
/// Deterministic seeded random stream
pub mod random;
