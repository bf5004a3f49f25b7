//! Principal axes of an image's color distribution

use crate::io::error::{Result, SynthesisError};
use crate::io::pixels::PixelBuffer;
use crate::math::eigen::{EigenDecomposition, EigenSolver, Matrix3};

/// Single-pass mean and covariance accumulator over RGB samples
///
/// Uses the incremental (Welford) update so that summing millions of pixels
/// does not lose precision to a large running sum of squares.
#[derive(Debug, Clone, Default)]
pub struct CovarianceAccumulator {
    count: u64,
    mean: [f64; 3],
    // Co-moments RR, RG, RB, GG, GB, BB
    comoment: [f64; 6],
}

/// Mean color and covariance matrix of a sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStatistics {
    /// Number of samples accumulated
    pub count: u64,
    /// Per-channel mean
    pub mean: [f64; 3],
    /// Symmetric sample covariance, normalized by `count - 1`
    pub covariance: Matrix3,
}

impl CovarianceAccumulator {
    /// Start an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one RGB sample
    pub fn push(&mut self, rgb: [f64; 3]) {
        self.count += 1;
        let n = self.count as f64;

        let mut before = [0.0; 3];
        for ((delta, mean), value) in before.iter_mut().zip(&mut self.mean).zip(rgb) {
            *delta = value - *mean;
            *mean += *delta / n;
        }
        let after = [
            rgb[0] - self.mean[0],
            rgb[1] - self.mean[1],
            rgb[2] - self.mean[2],
        ];

        self.comoment[0] += before[0] * after[0];
        self.comoment[1] += before[0] * after[1];
        self.comoment[2] += before[0] * after[2];
        self.comoment[3] += before[1] * after[1];
        self.comoment[4] += before[1] * after[2];
        self.comoment[5] += before[2] * after[2];
    }

    /// Number of samples seen so far
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Finish accumulation
    ///
    /// A single sample has no spread; its covariance is reported as zero.
    pub fn finish(&self) -> ColorStatistics {
        let norm = (self.count.saturating_sub(1)).max(1) as f64;
        let [rr, rg, rb, gg, gb, bb] = self.comoment.map(|c| c / norm);
        ColorStatistics {
            count: self.count,
            mean: self.mean,
            covariance: [[rr, rg, rb], [rg, gg, gb], [rb, gb, bb]],
        }
    }
}

/// Color principal component analysis driving the eigen solver
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorPca {
    solver: EigenSolver,
}

impl ColorPca {
    /// Use a specific solver configuration
    pub const fn with_solver(solver: EigenSolver) -> Self {
        Self { solver }
    }

    /// Mean and covariance of the RGB channels
    pub fn statistics(buffer: &PixelBuffer) -> ColorStatistics {
        let mut acc = CovarianceAccumulator::new();
        for px in buffer.pixels() {
            if let [r, g, b, ..] = px {
                acc.push([f64::from(*r), f64::from(*g), f64::from(*b)]);
            }
        }
        acc.finish()
    }

    /// Eigen decomposition of the color covariance
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer holds non-finite color samples or the
    /// resulting basis is not orthonormal
    pub fn analyze(&self, buffer: &PixelBuffer) -> Result<EigenDecomposition> {
        buffer.ensure_finite_rgb()?;
        let stats = Self::statistics(buffer);
        let decomposition = self.solver.decompose(&stats.covariance);

        let error = decomposition.orthonormality_error();
        if !error.is_finite() || error > 1e-6 {
            return Err(SynthesisError::Computation {
                operation: "color PCA",
                reason: format!("eigenvectors deviate from orthonormal by {error:e}"),
            });
        }

        tracing::debug!(
            mean = ?stats.mean,
            eigenvalues = ?decomposition.values,
            "color principal axes"
        );
        Ok(decomposition)
    }
}
