//! Cyclic Jacobi eigen decomposition of symmetric 3x3 matrices
//!
//! Repeatedly applies plane (Givens) rotations that annihilate one
//! off-diagonal entry at a time until the matrix is diagonal. For 3x3 input
//! convergence is quadratic and a handful of sweeps reaches machine precision.

use crate::io::configuration::{JACOBI_MAX_SWEEPS, JACOBI_TOLERANCE};

/// Row-major 3x3 matrix
pub type Matrix3 = [[f64; 3]; 3];

/// 3x3 identity
pub const IDENTITY: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

// Upper-triangle index pairs visited by one cyclic sweep
const OFF_DIAGONAL: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Eigenvalues with their orthonormal eigenvectors
///
/// `vectors[k]` is the eigenvector belonging to `values[k]`. Pairs are
/// ordered by descending eigenvalue, so `vectors[0]` is the principal axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDecomposition {
    /// Eigenvalues, largest first
    pub values: [f64; 3],
    /// Unit eigenvectors stored as rows
    pub vectors: Matrix3,
}

impl EigenDecomposition {
    /// Coordinates of `rgb` along each eigenvector
    pub fn project(&self, rgb: [f64; 3]) -> [f64; 3] {
        self.vectors.map(|v| dot(v, rgb))
    }

    /// Rotate eigen-space coordinates back with the transpose of the basis
    pub fn unproject(&self, coords: [f64; 3]) -> [f64; 3] {
        let mut rgb = [0.0; 3];
        for (coord, vector) in coords.iter().zip(&self.vectors) {
            for (out, component) in rgb.iter_mut().zip(vector) {
                *out = coord.mul_add(*component, *out);
            }
        }
        rgb
    }

    /// Largest deviation of `vectors * vectorsᵀ` from the identity
    pub fn orthonormality_error(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for (i, a) in self.vectors.iter().enumerate() {
            for (j, b) in self.vectors.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((dot(*a, *b) - expected).abs());
            }
        }
        worst
    }
}

/// Jacobi rotation solver for symmetric 3x3 matrices
#[derive(Debug, Clone, Copy)]
pub struct EigenSolver {
    max_sweeps: usize,
    tolerance: f64,
}

impl Default for EigenSolver {
    fn default() -> Self {
        Self::new(JACOBI_MAX_SWEEPS, JACOBI_TOLERANCE)
    }
}

impl EigenSolver {
    /// Create a solver with an explicit sweep budget and off-diagonal tolerance
    pub const fn new(max_sweeps: usize, tolerance: f64) -> Self {
        Self {
            max_sweeps,
            tolerance,
        }
    }

    /// Diagonalize a symmetric matrix
    ///
    /// Only the upper triangle is read; the lower triangle is assumed to
    /// mirror it. A matrix that is already diagonal (including the all-zero
    /// covariance of a flat-color image) yields the identity basis.
    pub fn decompose(&self, matrix: &Matrix3) -> EigenDecomposition {
        let mut a = symmetrized(matrix);
        let mut v = IDENTITY;

        for _ in 0..self.max_sweeps {
            if off_diagonal_norm(&a) <= self.tolerance {
                break;
            }
            for &(p, q) in &OFF_DIAGONAL {
                if entry(&a, p, q).abs() > self.tolerance {
                    rotate(&mut a, &mut v, p, q);
                }
            }
        }

        // Columns of v are the eigenvectors; store them as rows
        let mut pairs: Vec<(f64, [f64; 3])> = (0..3)
            .map(|k| (entry(&a, k, k), [entry(&v, 0, k), entry(&v, 1, k), entry(&v, 2, k)]))
            .collect();
        pairs.sort_by(|x, y| y.0.total_cmp(&x.0));

        let mut values = [0.0; 3];
        let mut vectors = IDENTITY;
        for ((value, vector), (dst_value, dst_vector)) in pairs
            .into_iter()
            .zip(values.iter_mut().zip(vectors.iter_mut()))
        {
            *dst_value = value;
            *dst_vector = vector;
        }

        EigenDecomposition { values, vectors }
    }
}

// A <- SᵀAS, V <- VS with the rotation zeroing A[p][q]
fn rotate(a: &mut Matrix3, v: &mut Matrix3, p: usize, q: usize) {
    let apq = entry(a, p, q);
    let app = entry(a, p, p);
    let aqq = entry(a, q, q);

    // atan2(0, 0) is 0, so a degenerate pair becomes the identity rotation
    let phi = 0.5 * (2.0 * apq).atan2(aqq - app);
    let (s, c) = phi.sin_cos();

    let mut rotation = IDENTITY;
    set(&mut rotation, p, p, c);
    set(&mut rotation, q, q, c);
    set(&mut rotation, p, q, s);
    set(&mut rotation, q, p, -s);

    *a = multiply(&multiply(&transpose(&rotation), a), &rotation);
    *v = multiply(v, &rotation);

    // Remove round-off so the annihilated pair stays exactly symmetric zero
    set(a, p, q, 0.0);
    set(a, q, p, 0.0);
}

fn symmetrized(m: &Matrix3) -> Matrix3 {
    let mut out = *m;
    for &(p, q) in &OFF_DIAGONAL {
        let upper = entry(m, p, q);
        set(&mut out, q, p, upper);
    }
    out
}

fn off_diagonal_norm(a: &Matrix3) -> f64 {
    OFF_DIAGONAL
        .iter()
        .map(|&(p, q)| entry(a, p, q).abs())
        .fold(0.0, f64::max)
}

/// Dot product of two 3-vectors
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0].mul_add(b[0], a[1].mul_add(b[1], a[2] * b[2]))
}

/// Matrix product `a * b`
pub fn multiply(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| entry(a, i, k) * entry(b, k, j)).sum();
        }
    }
    out
}

/// Matrix transpose
pub fn transpose(m: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = entry(m, j, i);
        }
    }
    out
}

fn entry(m: &Matrix3, row: usize, col: usize) -> f64 {
    m.get(row).and_then(|r| r.get(col)).copied().unwrap_or(0.0)
}

fn set(m: &mut Matrix3, row: usize, col: usize, value: f64) {
    if let Some(cell) = m.get_mut(row).and_then(|r| r.get_mut(col)) {
        *cell = value;
    }
}
