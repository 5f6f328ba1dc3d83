//! Reduction of decoded arrays to one sanitized intensity plane.

use ndarray::{Array2, ArrayD, ArrayView3, Ix2, Zip};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::plane::types::IntensityPlane;

/// Reduces an N-dimensional array (N >= 2) to one 2D plane.
///
/// Arrays with leading axes are collapsed with a per-pixel maximum over every
/// slice, which keeps faint point sources that show up in only some
/// sub-exposures. Non-finite samples are then replaced by the smallest finite
/// sample of the plane (or 0 when the plane has none).
pub fn select_plane(data: ArrayD<f64>) -> Result<IntensityPlane> {
    let shape = data.shape().to_vec();
    if shape.len() < 2 || shape.contains(&0) {
        return Err(PipelineError::InvalidDimensions(shape));
    }

    let mut plane = if shape.len() == 2 {
        data.into_dimensionality::<Ix2>()
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?
    } else {
        let height = shape[shape.len() - 2];
        let width = shape[shape.len() - 1];
        let layers: usize = shape[..shape.len() - 2].iter().product();
        debug!(layers, height, width, "Max-projecting leading axes");

        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        let stack = data
            .into_shape_with_order((layers, height, width))
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;
        max_projection(stack.view())
    };

    sanitize_non_finite(&mut plane);
    Ok(plane)
}

/// Per-pixel maximum over the first axis, ignoring non-finite samples.
///
/// A pixel with no finite sample in any slice stays NaN.
pub fn max_projection(stack: ArrayView3<f64>) -> IntensityPlane {
    let (_, height, width) = stack.dim();
    let mut out = Array2::from_elem((height, width), f64::NAN);

    for layer in stack.outer_iter() {
        Zip::from(&mut out).and(&layer).for_each(|acc, &v| {
            if v.is_finite() && (acc.is_nan() || v > *acc) {
                *acc = v;
            }
        });
    }
    out
}

/// Replaces NaN and ±inf with the plane's minimum finite value, or 0.
///
/// Returns the number of samples that were replaced.
pub fn sanitize_non_finite(plane: &mut IntensityPlane) -> usize {
    let fill = plane
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::min)
        .unwrap_or(0.0);

    let mut replaced = 0;
    plane.mapv_inplace(|v| {
        if v.is_finite() {
            v
        } else {
            replaced += 1;
            fill
        }
    });

    if replaced > 0 {
        debug!(replaced, fill, "Replaced non-finite samples");
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn, array};

    #[test]
    fn two_dimensional_input_passes_through() {
        let data = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let plane = select_plane(data).unwrap();
        assert_eq!(plane, array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn three_layers_reduce_to_pixelwise_maximum() {
        let mut stack = Array3::<f64>::zeros((3, 2, 2));
        stack[[0, 0, 0]] = 5.0;
        stack[[1, 0, 1]] = 7.0;
        stack[[2, 1, 0]] = 9.0;
        stack[[0, 1, 1]] = 1.0;
        stack[[2, 1, 1]] = 2.0;

        let plane = select_plane(stack.into_dyn()).unwrap();
        assert_eq!(plane, array![[5.0, 7.0], [9.0, 2.0]]);
    }

    #[test]
    fn nan_in_one_layer_does_not_leak() {
        let mut stack = Array3::<f64>::from_elem((3, 2, 2), 1.0);
        stack[[1, 0, 0]] = f64::NAN;
        stack[[2, 0, 0]] = 3.0;

        let plane = select_plane(stack.into_dyn()).unwrap();
        assert_eq!(plane[[0, 0]], 3.0);
        assert!(plane.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn pixels_without_finite_samples_take_plane_minimum() {
        let mut stack = Array3::<f64>::from_elem((2, 2, 2), 4.0);
        stack[[0, 1, 1]] = f64::NAN;
        stack[[1, 1, 1]] = f64::INFINITY;
        stack[[0, 0, 1]] = -2.0;
        stack[[1, 0, 1]] = -2.0;

        let plane = select_plane(stack.into_dyn()).unwrap();
        assert_eq!(plane[[1, 1]], -2.0);
    }

    #[test]
    fn all_non_finite_plane_becomes_zero() {
        let mut plane = Array2::from_elem((3, 3), f64::NAN);
        plane[[1, 1]] = f64::NEG_INFINITY;
        assert_eq!(sanitize_non_finite(&mut plane), 9);
        assert!(plane.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn four_dimensional_input_flattens_leading_axes() {
        let mut data = ArrayD::<f64>::zeros(IxDyn(&[2, 2, 3, 3]));
        data[IxDyn(&[1, 1, 2, 2])] = 8.0;
        let plane = select_plane(data).unwrap();
        assert_eq!(plane.dim(), (3, 3));
        assert_eq!(plane[[2, 2]], 8.0);
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        let line = ArrayD::<f64>::zeros(IxDyn(&[5]));
        assert!(matches!(
            select_plane(line),
            Err(PipelineError::InvalidDimensions(_))
        ));
        let empty = ArrayD::<f64>::zeros(IxDyn(&[0, 4]));
        assert!(select_plane(empty).is_err());
    }
}
