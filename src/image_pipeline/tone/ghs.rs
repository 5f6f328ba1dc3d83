use crate::image_pipeline::tone::types::StretchParameters;

/// Generalized Hyperbolic Stretch of one normalized sample.
///
/// `y = s + k·d / (1 + L·|d|)` with `d = x - s`. The curve is anchored at
/// `(s, s)` and non-decreasing for `k, L >= 0`; its denominator never drops
/// below 1. The result is not clipped.
#[inline]
pub fn ghs_map(x: f64, params: &StretchParameters) -> f64 {
    let d = x - params.s;
    params.s + params.k * d / (1.0 + params.l * d.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn anchor_is_a_fixed_point() {
        for &(k, l, s) in &[(2.0, 5.0, 0.25), (0.5, 0.0, 0.8), (10.0, 100.0, 0.0), (1.0, 3.0, 1.0)] {
            let params = StretchParameters { k, l, s };
            assert_eq!(ghs_map(s, &params), s);
        }
    }

    #[test]
    fn curve_is_monotonic_on_dense_grid() {
        for &(k, l) in &[(2.0, 5.0), (0.0, 5.0), (1.0, 0.0), (7.5, 40.0)] {
            let params = StretchParameters { k, l, s: 0.25 };
            let mut previous = f64::NEG_INFINITY;
            for i in 0..=10_000 {
                let y = ghs_map(i as f64 / 10_000.0, &params);
                assert!(y >= previous, "k={k} L={l} decreases at step {i}");
                previous = y;
            }
        }
    }

    #[test]
    fn default_curve_values() {
        let params = StretchParameters::default();
        // d = -0.25: 0.25 - 0.5 / 2.25
        assert_relative_eq!(ghs_map(0.0, &params), 0.25 - 0.5 / 2.25, epsilon = 1e-12);
        // d = 0.75: 0.25 + 1.5 / 4.75
        assert_relative_eq!(ghs_map(1.0, &params), 0.25 + 1.5 / 4.75, epsilon = 1e-12);
    }

    #[test]
    fn larger_contrast_factor_pulls_towards_anchor() {
        let soft = StretchParameters { k: 2.0, l: 1.0, s: 0.25 };
        let hard = StretchParameters { k: 2.0, l: 20.0, s: 0.25 };
        let x = 0.9;
        assert!((ghs_map(x, &hard) - 0.25).abs() < (ghs_map(x, &soft) - 0.25).abs());
    }
}
