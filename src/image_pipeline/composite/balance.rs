//! Display color balance and 8-bit quantization.

use ndarray::{Array2, Array3, ArrayView2, Axis, stack};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::composite::types::{BalanceMethod, Channel};
use crate::image_pipeline::tone::percentile;

/// Channel ranges narrower than this are left as they are.
const MIN_SPAN: f64 = 1e-6;

/// Balances three aligned channels jointly and quantizes them to 8 bits.
///
/// All three views must have the same shape. Output is `(height, width, 3)`
/// in R, G, B order.
pub fn balance<'a>(
    method: BalanceMethod,
    red: ArrayView2<'a, f32>,
    green: ArrayView2<'a, f32>,
    blue: ArrayView2<'a, f32>,
) -> Result<Array3<u8>> {
    let channels = [red, green, blue];
    let balanced: Vec<Array2<f32>> = match method {
        BalanceMethod::PercentileMatch { lower, upper } => Channel::ALL
            .iter()
            .zip(channels)
            .map(|(channel, plane)| match_points(*channel, plane, lower, upper))
            .collect(),
        BalanceMethod::GrayWorld => gray_world(channels),
        BalanceMethod::Clip => channels.iter().map(|plane| plane.mapv(clip_unit)).collect(),
    };

    let views: Vec<ArrayView2<f32>> = balanced.iter().map(|plane| plane.view()).collect();
    let rgb = stack(Axis(2), &views)
        .map_err(|_| PipelineError::InvalidDimensions(red.shape().to_vec()))?;
    Ok(rgb.mapv(quantize))
}

/// Rounds a unit-range sample to 0..=255.
#[inline]
pub fn quantize(v: f32) -> u8 {
    (clip_unit(v) * 255.0).round() as u8
}

#[inline]
fn clip_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn match_points(channel: Channel, plane: ArrayView2<f32>, lower: f64, upper: f64) -> Array2<f32> {
    let mut scratch: Vec<f64> = plane.iter().map(|&v| clip_unit(v) as f64).collect();
    let black = percentile(&mut scratch, lower);
    let white = percentile(&mut scratch, upper);
    let span = white - black;

    if span < MIN_SPAN {
        debug!("{} channel has no usable range, leaving as is", channel);
        return plane.mapv(clip_unit);
    }
    debug!(black, white, "{} channel black/white points", channel);
    plane.mapv(|v| clip_unit(((clip_unit(v) as f64 - black) / span) as f32))
}

fn gray_world(channels: [ArrayView2<'_, f32>; 3]) -> Vec<Array2<f32>> {
    let means: Vec<f64> = channels
        .iter()
        .map(|plane| {
            let n = plane.len().max(1) as f64;
            plane.iter().map(|&v| clip_unit(v) as f64).sum::<f64>() / n
        })
        .collect();
    let target = means.iter().sum::<f64>() / means.len() as f64;

    channels
        .iter()
        .zip(&means)
        .map(|(plane, &mean)| {
            let gain = if mean > MIN_SPAN { (target / mean) as f32 } else { 1.0 };
            plane.mapv(|v| clip_unit(clip_unit(v) * gain))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(scale: f32) -> Array2<f32> {
        Array2::from_shape_fn((50, 50), |(r, c)| scale * (r * 50 + c) as f32 / 2499.0)
    }

    fn channel_mean(rgb: &Array3<u8>, c: usize) -> f64 {
        let plane = rgb.index_axis(Axis(2), c);
        plane.iter().map(|&v| v as f64).sum::<f64>() / plane.len() as f64
    }

    #[test]
    fn quantize_rounds_and_clips() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(quantize(-3.0), 0);
        assert_eq!(quantize(7.0), 255);
        assert_eq!(quantize(f32::NAN), 0);
    }

    #[test]
    fn percentile_match_removes_exposure_cast() {
        let (r, g, b) = (gradient(0.5), gradient(1.0), gradient(0.2));
        let rgb = balance(BalanceMethod::default(), r.view(), g.view(), b.view()).unwrap();

        assert_eq!(rgb.dim(), (50, 50, 3));
        let means: Vec<f64> = (0..3).map(|c| channel_mean(&rgb, c)).collect();
        assert!((means[0] - means[1]).abs() < 2.0, "{:?}", means);
        assert!((means[2] - means[1]).abs() < 2.0, "{:?}", means);
    }

    #[test]
    fn gray_world_equalizes_means() {
        let (r, g, b) = (gradient(0.4), gradient(0.6), gradient(0.5));
        let rgb = balance(BalanceMethod::GrayWorld, r.view(), g.view(), b.view()).unwrap();
        let means: Vec<f64> = (0..3).map(|c| channel_mean(&rgb, c)).collect();
        assert!((means[0] - means[1]).abs() < 1.0, "{:?}", means);
        assert!((means[0] - means[2]).abs() < 1.0, "{:?}", means);
    }

    #[test]
    fn constant_channels_stay_gray_under_every_method() {
        let plane = Array2::from_elem((10, 10), 0.3f32);
        for method in [BalanceMethod::default(), BalanceMethod::GrayWorld, BalanceMethod::Clip] {
            let rgb = balance(method, plane.view(), plane.view(), plane.view()).unwrap();
            assert!(rgb.iter().all(|&v| v == rgb[[0, 0, 0]]), "{:?}", method);
        }
    }

    #[test]
    fn mismatched_channels_are_an_error() {
        let a = Array2::<f32>::zeros((4, 4));
        let b = Array2::<f32>::zeros((4, 5));
        assert!(balance(BalanceMethod::Clip, a.view(), a.view(), b.view()).is_err());
    }

    #[test]
    fn clip_is_plain_quantization() {
        let r = Array2::from_elem((2, 2), 1.5f32);
        let g = Array2::from_elem((2, 2), 0.2f32);
        let b = Array2::from_elem((2, 2), -0.1f32);
        let rgb = balance(BalanceMethod::Clip, r.view(), g.view(), b.view()).unwrap();
        assert_eq!(rgb[[1, 1, 0]], 255);
        assert_eq!(rgb[[1, 1, 1]], 51);
        assert_eq!(rgb[[1, 1, 2]], 0);
    }
}
