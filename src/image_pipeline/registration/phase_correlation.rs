//! Translation-only registration by phase correlation.
//!
//! Both planes are mean-subtracted and transformed with a 2D FFT; the inverse
//! transform of the normalized cross-power spectrum peaks at the integer
//! offset between them. The peak is accepted only when it stands out from the
//! rest of the correlation surface by `min_peak_ratio`.

use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::debug;

use crate::image_pipeline::registration::aligner::{AlignError, Aligner};

/// Magnitudes below this are treated as zero.
const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct PhaseCorrelationAligner {
    /// Required ratio of the correlation peak to the mean absolute correlation
    pub min_peak_ratio: f64,
}

impl Default for PhaseCorrelationAligner {
    fn default() -> Self {
        Self {
            min_peak_ratio: 10.0,
        }
    }
}

impl PhaseCorrelationAligner {
    pub fn new(min_peak_ratio: f64) -> Self {
        Self { min_peak_ratio }
    }

    /// Offset `(dy, dx)` such that `source[y - dy][x - dx]` lands on
    /// `reference[y][x]`.
    ///
    /// Planes of different sizes are zero-padded to a common grid before
    /// correlating.
    pub fn estimate_offset(
        &self,
        source: ArrayView2<f32>,
        reference: ArrayView2<f32>,
    ) -> Result<(isize, isize), AlignError> {
        let (src_h, src_w) = source.dim();
        let (ref_h, ref_w) = reference.dim();
        let (height, width) = (src_h.max(ref_h), src_w.max(ref_w));
        if source.dim() != reference.dim() {
            debug!(
                source = ?source.dim(),
                reference = ?reference.dim(),
                "Padding planes to {}x{} for correlation",
                height,
                width
            );
        }
        let mut planner = FftPlanner::<f64>::new();

        let src = spectrum(source, (height, width), &mut planner)
            .ok_or_else(|| AlignError::NoFeatures("source plane is flat".to_string()))?;
        let refr = spectrum(reference, (height, width), &mut planner)
            .ok_or_else(|| AlignError::NoFeatures("reference plane is flat".to_string()))?;

        let mut surface: Vec<Complex<f64>> = refr
            .iter()
            .zip(&src)
            .map(|(r, s)| {
                let cross = r * s.conj();
                let magnitude = cross.norm();
                if magnitude > EPSILON {
                    cross / magnitude
                } else {
                    Complex::new(0.0, 0.0)
                }
            })
            .collect();
        fft2d(&mut surface, width, height, &mut planner, true);

        let (peak_index, peak) = surface
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, c)| {
                if c.re > best.1 { (i, c.re) } else { best }
            });
        let mean_abs = surface.iter().map(|c| c.re.abs()).sum::<f64>() / surface.len() as f64;
        let ratio = if mean_abs > EPSILON { peak / mean_abs } else { 0.0 };

        if !(ratio >= self.min_peak_ratio) {
            return Err(AlignError::WeakCorrelation {
                ratio,
                required: self.min_peak_ratio,
            });
        }

        let dy = wrap_signed(peak_index / width, height);
        let dx = wrap_signed(peak_index % width, width);
        debug!(dy, dx, ratio, "Phase correlation peak");
        Ok((dy, dx))
    }
}

impl Aligner for PhaseCorrelationAligner {
    fn align(
        &self,
        source: ArrayView2<f32>,
        reference: ArrayView2<f32>,
    ) -> Result<Array2<f32>, AlignError> {
        let (dy, dx) = self.estimate_offset(source, reference)?;
        Ok(translate_onto(source, dy, dx, reference.dim()))
    }
}

/// Index on a circular axis of length `len`, mapped to `(-len/2, len/2]`.
fn wrap_signed(index: usize, len: usize) -> isize {
    if index > len / 2 {
        index as isize - len as isize
    } else {
        index as isize
    }
}

/// Shifts a plane by `(dy, dx)`; uncovered pixels become 0.
pub fn translate(plane: ArrayView2<f32>, dy: isize, dx: isize) -> Array2<f32> {
    translate_onto(plane, dy, dx, plane.dim())
}

/// Shifts a plane by `(dy, dx)` onto a grid of `shape`, cropping what falls
/// outside and zero-filling what is not covered.
pub fn translate_onto(plane: ArrayView2<f32>, dy: isize, dx: isize, shape: (usize, usize)) -> Array2<f32> {
    let (height, width) = plane.dim();
    Array2::from_shape_fn(shape, |(y, x)| {
        let sy = y as isize - dy;
        let sx = x as isize - dx;
        if sy >= 0 && sx >= 0 && (sy as usize) < height && (sx as usize) < width {
            plane[[sy as usize, sx as usize]]
        } else {
            0.0
        }
    })
}

/// Forward spectrum of the mean-subtracted plane, zero-padded to `shape`;
/// `None` when the plane has no variation at all.
fn spectrum(
    plane: ArrayView2<f32>,
    shape: (usize, usize),
    planner: &mut FftPlanner<f64>,
) -> Option<Vec<Complex<f64>>> {
    let (height, width) = shape;
    let n = plane.len() as f64;
    if n == 0.0 {
        return None;
    }
    let mean = plane.iter().map(|&v| v as f64).sum::<f64>() / n;
    if plane.iter().all(|&v| (v as f64 - mean).abs() < EPSILON) {
        return None;
    }

    let mut buffer = vec![Complex::new(0.0, 0.0); height * width];
    for ((y, x), &v) in plane.indexed_iter() {
        buffer[y * width + x] = Complex::new(v as f64 - mean, 0.0);
    }

    fft2d(&mut buffer, width, height, planner, false);
    Some(buffer)
}

/// In-place row-major 2D FFT (unnormalized in both directions).
fn fft2d(
    buffer: &mut [Complex<f64>],
    width: usize,
    height: usize,
    planner: &mut FftPlanner<f64>,
    inverse: bool,
) {
    let (row_fft, col_fft) = if inverse {
        (planner.plan_fft_inverse(width), planner.plan_fft_inverse(height))
    } else {
        (planner.plan_fft_forward(width), planner.plan_fft_forward(height))
    };

    // Every row at once: the buffer is a sequence of width-long transforms.
    row_fft.process(buffer);

    let mut columns = vec![Complex::new(0.0, 0.0); buffer.len()];
    for y in 0..height {
        for x in 0..width {
            columns[x * height + y] = buffer[y * width + x];
        }
    }
    col_fft.process(&mut columns);
    for x in 0..width {
        for y in 0..height {
            buffer[y * width + x] = columns[x * height + y];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star_field(height: usize, width: usize, stars: &[(f32, f32, f32)]) -> Array2<f32> {
        Array2::from_shape_fn((height, width), |(y, x)| {
            stars
                .iter()
                .map(|&(sy, sx, amp)| {
                    let d2 = (y as f32 - sy).powi(2) + (x as f32 - sx).powi(2);
                    amp * (-d2 / 4.0).exp()
                })
                .sum()
        })
    }

    const STARS: [(f32, f32, f32); 5] = [
        (20.0, 18.0, 1.0),
        (31.0, 44.0, 0.7),
        (45.0, 25.0, 0.9),
        (16.0, 40.0, 0.5),
        (40.0, 36.0, 0.8),
    ];

    #[test]
    fn recovers_known_translation() {
        let reference = star_field(64, 64, &STARS);
        let source = translate(reference.view(), 3, -5);

        let aligner = PhaseCorrelationAligner::default();
        let offset = aligner.estimate_offset(source.view(), reference.view()).unwrap();
        assert_eq!(offset, (-3, 5));

        let aligned = aligner.align(source.view(), reference.view()).unwrap();
        let max_error = aligned
            .iter()
            .zip(reference.iter())
            .map(|(a, r)| (a - r).abs())
            .fold(0.0f32, f32::max);
        assert!(max_error < 1e-3, "max error {max_error}");
    }

    #[test]
    fn identical_planes_need_no_shift() {
        let reference = star_field(48, 40, &STARS[..3]);
        let offset = PhaseCorrelationAligner::default()
            .estimate_offset(reference.view(), reference.view())
            .unwrap();
        assert_eq!(offset, (0, 0));
    }

    #[test]
    fn flat_planes_fail_without_panicking() {
        let flat = Array2::from_elem((32, 32), 0.4f32);
        let result = PhaseCorrelationAligner::default().align(flat.view(), flat.view());
        assert!(matches!(result, Err(AlignError::NoFeatures(_))));
    }

    #[test]
    fn wider_source_is_aligned_onto_reference_grid() {
        let reference = star_field(64, 64, &STARS);
        let shifted: Vec<(f32, f32, f32)> = STARS.iter().map(|&(y, x, a)| (y + 2.0, x + 3.0, a)).collect();
        let source = star_field(64, 66, &shifted);

        let aligner = PhaseCorrelationAligner::default();
        assert_eq!(aligner.estimate_offset(source.view(), reference.view()).unwrap(), (-2, -3));

        let aligned = aligner.align(source.view(), reference.view()).unwrap();
        assert_eq!(aligned.dim(), (64, 64));
        let max_error = aligned
            .iter()
            .zip(reference.iter())
            .map(|(a, r)| (a - r).abs())
            .fold(0.0f32, f32::max);
        assert!(max_error < 1e-3, "max error {max_error}");
    }

    #[test]
    fn empty_plane_has_no_features() {
        let empty = Array2::<f32>::zeros((0, 8));
        let reference = star_field(16, 16, &[(8.0, 8.0, 1.0)]);
        let result = PhaseCorrelationAligner::default().align(empty.view(), reference.view());
        assert!(matches!(result, Err(AlignError::NoFeatures(_))));
    }

    #[test]
    fn translate_onto_crops_and_pads() {
        let plane = Array2::from_shape_fn((2, 3), |(r, c)| (r * 3 + c + 1) as f32);
        let taller = translate_onto(plane.view(), 0, 0, (3, 2));
        assert_eq!(taller, ndarray::array![[1.0, 2.0], [4.0, 5.0], [0.0, 0.0]]);
    }

    #[test]
    fn unrelated_planes_are_rejected_by_strict_threshold() {
        let reference = star_field(32, 32, &[(8.0, 8.0, 1.0)]);
        let other = Array2::from_shape_fn((32, 32), |(y, x)| ((y * 7 + x * 13) % 5) as f32 / 5.0);
        let aligner = PhaseCorrelationAligner::new(1.0e6);
        let result = aligner.align(other.view(), reference.view());
        assert!(matches!(result, Err(AlignError::WeakCorrelation { .. })));
    }

    #[test]
    fn translate_fills_uncovered_pixels_with_zero() {
        let plane = Array2::from_elem((4, 4), 1.0f32);
        let moved = translate(plane.view(), 1, 2);
        assert_eq!(moved[[0, 0]], 0.0);
        assert_eq!(moved[[1, 1]], 0.0);
        assert_eq!(moved[[1, 2]], 1.0);
        assert_eq!(moved[[3, 3]], 1.0);
    }
}
