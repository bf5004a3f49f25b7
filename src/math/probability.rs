//! Normal distribution functions and the rank-to-quantile table
//!
//! Rank matching needs `Φ` and `Φ⁻¹` accurate far beyond what a texture can
//! resolve: a quantile error larger than the spacing between adjacent ranks
//! would map a pixel onto its neighbour's value on the way back.

use std::f64::consts::{FRAC_2_SQRT_PI, SQRT_2};

// Series/continued fraction crossover for erf
const ERF_SERIES_LIMIT: f64 = 2.5;
const ERF_SERIES_TERMS: usize = 60;
const ERFC_FRACTION_TERMS: usize = 60;

// Acklam's rational approximation of the normal quantile
const QUANTILE_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const QUANTILE_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const QUANTILE_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const QUANTILE_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const QUANTILE_TAIL: f64 = 0.024_25;

/// Error function
///
/// Maclaurin series near the origin, Laplace continued fraction for the
/// complement in the tails; both accurate to roughly 1e-14.
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x.abs() < ERF_SERIES_LIMIT {
        erf_series(x)
    } else {
        x.signum() * (1.0 - erfc_fraction(x.abs()))
    }
}

/// Complementary error function `1 - erf(x)` without cancellation in the tail
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= ERF_SERIES_LIMIT {
        erfc_fraction(x)
    } else if x <= -ERF_SERIES_LIMIT {
        2.0 - erfc_fraction(-x)
    } else {
        1.0 - erf_series(x)
    }
}

fn erf_series(x: f64) -> f64 {
    // erf(x) = 2/√π Σ (-1)ⁿ x^(2n+1) / (n! (2n+1))
    let x2 = x * x;
    let mut power = x;
    let mut sum = x;
    for n in 1..ERF_SERIES_TERMS {
        let nf = n as f64;
        power *= -x2 / nf;
        let term = power / 2.0f64.mul_add(nf, 1.0);
        sum += term;
        if term.abs() < 1e-17 * sum.abs() {
            break;
        }
    }
    FRAC_2_SQRT_PI * sum
}

fn erfc_fraction(x: f64) -> f64 {
    // erfc(x) = e^(-x²)/√π · 1/(x + (1/2)/(x + 1/(x + (3/2)/(x + ...))))
    let mut tail = x;
    for n in (1..=ERFC_FRACTION_TERMS).rev() {
        tail = x + (n as f64 * 0.5) / tail;
    }
    (-x * x).exp() * FRAC_2_SQRT_PI * 0.5 / tail
}

/// Standard normal cumulative distribution `Φ(x) = ½ + ½·erf(x/√2)`
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal quantile `Φ⁻¹(p)`
///
/// Rational first guess refined by one Halley step. Returns `-∞`/`+∞` at the
/// closed ends and NaN outside `[0, 1]`.
pub fn normal_quantile(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let guess = if p < QUANTILE_TAIL {
        let q = (-2.0 * p.ln()).sqrt();
        tail_ratio(q)
    } else if p > 1.0 - QUANTILE_TAIL {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -tail_ratio(q)
    } else {
        let q = p - 0.5;
        let r = q * q;
        let [a0, a1, a2, a3, a4, a5] = QUANTILE_A;
        let [b0, b1, b2, b3, b4] = QUANTILE_B;
        let num = a0.mul_add(r, a1).mul_add(r, a2).mul_add(r, a3).mul_add(r, a4).mul_add(r, a5);
        let den = b0.mul_add(r, b1).mul_add(r, b2).mul_add(r, b3).mul_add(r, b4).mul_add(r, 1.0);
        num * q / den
    };

    // Halley refinement against the accurate CDF
    let e = normal_cdf(guess) - p;
    let u = e * (2.0 * std::f64::consts::PI).sqrt() * (guess * guess / 2.0).exp();
    guess - u / (guess * u).mul_add(0.5, 1.0)
}

fn tail_ratio(q: f64) -> f64 {
    let [c0, c1, c2, c3, c4, c5] = QUANTILE_C;
    let [d0, d1, d2, d3] = QUANTILE_D;
    let num = c0.mul_add(q, c1).mul_add(q, c2).mul_add(q, c3).mul_add(q, c4).mul_add(q, c5);
    let den = d0.mul_add(q, d1).mul_add(q, d2).mul_add(q, d3).mul_add(q, 1.0);
    num / den
}

/// Inverse error function on `(-1, 1)`
pub fn erfinv(y: f64) -> f64 {
    normal_quantile(0.5f64.mul_add(y, 0.5)) / SQRT_2
}

/// Gaussian value assigned to each rank of an `N`-sample distribution
///
/// `g[r] = √2·erfinv(2(r+½)/N − 1)`, i.e. the normal quantile at the centre
/// of the rank's probability cell. The table is strictly increasing and
/// exactly antisymmetric (`g[r] == -g[N-1-r]`).
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianQuantiles {
    table: Vec<f64>,
}

impl GaussianQuantiles {
    /// Build the table for `n` ranks
    pub fn new(n: usize) -> Self {
        let mut table = vec![0.0; n];
        let total = n as f64;
        let half = n / 2;
        for rank in 0..half {
            let value = normal_quantile((rank as f64 + 0.5) / total);
            if let Some(low) = table.get_mut(rank) {
                *low = value;
            }
            if let Some(high) = table.get_mut(n - 1 - rank) {
                *high = -value;
            }
        }
        // Odd n leaves the median at exactly zero
        Self { table }
    }

    /// Number of ranks
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Quantile for a rank, `None` past the end
    pub fn get(&self, rank: usize) -> Option<f64> {
        self.table.get(rank).copied()
    }

    /// The full table in rank order
    pub fn as_slice(&self) -> &[f64] {
        &self.table
    }
}
