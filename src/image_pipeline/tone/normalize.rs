//! Percentile normalization to the unit interval.

use std::cmp::Ordering;

use ndarray::ArrayView2;
use tracing::debug;

use crate::image_pipeline::plane::IntensityPlane;
use crate::image_pipeline::tone::types::{PercentileRange, PercentileWindow};

/// Value at percentile `pct` (0..=100) with linear interpolation between
/// closest ranks. Reorders `values`; an empty slice yields 0.
pub fn percentile(values: &mut [f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let rank = pct.clamp(0.0, 100.0) / 100.0 * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let frac = rank - lower as f64;

    let (_, pivot, above) = values.select_nth_unstable_by(lower, total_order);
    let lo_val = *pivot;
    if frac == 0.0 || above.is_empty() {
        return lo_val;
    }
    let hi_val = above.iter().copied().reduce(f64::min).unwrap_or(lo_val);
    lo_val + (hi_val - lo_val) * frac
}

fn total_order(a: &f64, b: &f64) -> Ordering {
    a.total_cmp(b)
}

/// Resolves the normalization window for a plane.
///
/// Falls back to the global min/max when the percentile window collapses,
/// and to `[lo, lo + 1]` when the plane is constant. Past 2^53 the unit
/// widening is replaced by one relative epsilon so that `hi > lo` holds.
pub fn resolve_window(plane: ArrayView2<f64>, range: PercentileRange) -> PercentileWindow {
    let mut scratch: Vec<f64> = plane.iter().copied().collect();
    let mut lo = percentile(&mut scratch, range.lower);
    let mut hi = percentile(&mut scratch, range.upper);

    if hi <= lo {
        lo = scratch.iter().copied().reduce(f64::min).unwrap_or(0.0);
        hi = scratch.iter().copied().reduce(f64::max).unwrap_or(0.0);
        debug!(lo, hi, "Percentile window collapsed, using min/max");
        if hi <= lo {
            hi = lo + 1.0f64.max(lo.abs() * f64::EPSILON);
            debug!(lo, hi, "Constant plane, widening window");
        }
    }
    PercentileWindow { lo, hi }
}

/// Maps `plane` onto [0, 1] in place and returns the window used.
pub fn normalize_in_place(plane: &mut IntensityPlane, range: PercentileRange) -> PercentileWindow {
    let window = resolve_window(plane.view(), range);
    let span = window.hi - window.lo;
    plane.mapv_inplace(|v| {
        let n = ((v - window.lo) / span).clamp(0.0, 1.0);
        if n.is_nan() { 0.0 } else { n }
    });
    window
}
