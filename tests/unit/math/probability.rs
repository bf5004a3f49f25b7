//! Tests for the error function, normal distribution and quantile table

#[cfg(test)]
mod tests {
    use tilesynth::math::probability::{
        GaussianQuantiles, erf, erfc, erfinv, normal_cdf, normal_quantile,
    };

    // Tests erf against reference values on both sides of the series crossover
    // Verified by truncating the series after a few terms
    #[test]
    fn test_erf_reference_values() {
        assert!(erf(0.0).abs() < f64::EPSILON);
        assert!((erf(0.5) - 0.520_499_877_813_046_5).abs() < 1e-13);
        assert!((erf(1.0) - 0.842_700_792_949_714_9).abs() < 1e-13);
        assert!((erf(2.0) - 0.995_322_265_018_952_7).abs() < 1e-13);
        assert!((erf(3.0) - 0.999_977_909_503_001_4).abs() < 1e-12);
        assert!((erf(-1.0) + erf(1.0)).abs() < f64::EPSILON);
        assert!(erf(f64::NAN).is_nan());
    }

    // Tests that erfc keeps relative accuracy deep in the tail
    // Verified by computing erfc as 1 - erf
    #[test]
    fn test_erfc_tail_relative_accuracy() {
        let expected = 1.537_459_794_428_034_8e-12;
        assert!(((erfc(5.0) - expected) / expected).abs() < 1e-9);
        assert!((erfc(-5.0) - 2.0).abs() < 1e-11);
        assert!((erfc(0.0) - 1.0).abs() < f64::EPSILON);
    }

    // Tests Φ and Φ⁻¹ at textbook points and that they invert each other
    // Verified by dropping the Halley refinement step
    #[test]
    fn test_normal_cdf_and_quantile() {
        let z975 = 1.959_963_984_540_054;
        assert!((normal_cdf(z975) - 0.975).abs() < 1e-13);
        assert!((normal_quantile(0.975) - z975).abs() < 1e-12);
        assert!(normal_quantile(0.5).abs() < 1e-15);
        assert!((normal_quantile(0.001) + 3.090_232_306_167_813_5).abs() < 1e-10);

        for p in [1e-9, 0.01, 0.2, 0.5, 0.8, 0.99, 1.0 - 1e-9] {
            let back = normal_cdf(normal_quantile(p));
            assert!((back - p).abs() < 1e-12 * p.max(1e-3), "Round trip failed at p={p}");
        }
    }

    // Tests the closed ends and invalid probabilities
    // Verified by clamping p into (0, 1)
    #[test]
    fn test_normal_quantile_domain() {
        assert_eq!(normal_quantile(0.0), f64::NEG_INFINITY);
        assert_eq!(normal_quantile(1.0), f64::INFINITY);
        assert!(normal_quantile(-0.1).is_nan());
        assert!(normal_quantile(1.5).is_nan());
    }

    // Tests erfinv as the inverse of erf
    // Verified by omitting the 1/√2 scaling
    #[test]
    fn test_erfinv_inverts_erf() {
        for x in [-2.0, -0.7, 0.0, 0.3, 1.1, 2.4] {
            assert!((erfinv(erf(x)) - x).abs() < 1e-9, "erfinv(erf({x})) drifted");
        }
    }

    // Tests the rank quantile table: strictly increasing and exactly antisymmetric
    // Verified by evaluating the upper half independently of the lower half
    #[test]
    fn test_gaussian_quantiles_shape() {
        for n in [2usize, 7, 64, 1000] {
            let table = GaussianQuantiles::new(n);
            assert_eq!(table.len(), n);
            let values = table.as_slice();
            assert!(values.windows(2).all(|w| w[0] < w[1]), "n={n} not increasing");
            for (low, high) in values.iter().zip(values.iter().rev()) {
                assert_eq!(*low, -*high);
            }
        }

        let table = GaussianQuantiles::new(4);
        let expected = normal_quantile(0.125);
        assert_eq!(table.get(0), Some(expected));
        assert_eq!(table.get(3), Some(-expected));
        assert_eq!(table.get(4), None);
    }

    // Tests degenerate table sizes
    // Verified by filling the median with the quantile of 0.5 computed numerically
    #[test]
    fn test_gaussian_quantiles_small_sizes() {
        assert!(GaussianQuantiles::new(0).is_empty());
        assert_eq!(GaussianQuantiles::new(1).as_slice(), &[0.0]);
        assert_eq!(GaussianQuantiles::new(3).get(1), Some(0.0));
    }
}
