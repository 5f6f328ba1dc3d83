use ndarray::ArrayD;
use tracing::debug;

use crate::image_pipeline::common::error::Result;

/// Returns the first layer, in container order, that holds a usable image.
///
/// A layer is usable when it has at least two axes and no empty axis. Layers
/// reported as `None` (no pixel data) are skipped, and the iterator is not
/// advanced past the winning layer, so later layers are never decoded. A
/// decode error on any visited layer aborts the scan.
pub fn first_data_layer<I>(layers: I) -> Result<Option<(usize, ArrayD<f64>)>>
where
    I: IntoIterator<Item = Result<Option<ArrayD<f64>>>>,
{
    for (index, layer) in layers.into_iter().enumerate() {
        match layer? {
            Some(data) if data.ndim() >= 2 && !data.shape().contains(&0) => {
                debug!(index, shape = ?data.shape(), "Selected data layer");
                return Ok(Some((index, data)));
            }
            Some(data) => debug!(index, shape = ?data.shape(), "Skipping layer without a 2D image"),
            None => debug!(index, "Skipping empty layer"),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::common::error::PipelineError;
    use ndarray::IxDyn;

    fn layer(shape: &[usize]) -> Result<Option<ArrayD<f64>>> {
        Ok(Some(ArrayD::zeros(IxDyn(shape))))
    }

    #[test]
    fn first_matching_layer_wins() {
        let layers = vec![Ok(None), layer(&[16]), layer(&[4, 5]), layer(&[8, 8])];
        let (index, data) = first_data_layer(layers).unwrap().unwrap();
        assert_eq!(index, 2);
        assert_eq!(data.shape(), &[4, 5]);
    }

    #[test]
    fn empty_container_yields_none() {
        let layers = vec![Ok(None), layer(&[0, 3])];
        assert!(first_data_layer(layers).unwrap().is_none());
    }

    #[test]
    fn layers_after_the_winner_are_not_visited() {
        let layers = vec![
            layer(&[2, 2]),
            Err(PipelineError::DecodeError("should not be reached".to_string())),
        ];
        assert!(first_data_layer(layers).unwrap().is_some());
    }

    #[test]
    fn decode_error_before_a_match_is_fatal() {
        let layers = vec![
            Ok(None),
            Err(PipelineError::DecodeError("corrupt directory".to_string())),
            layer(&[2, 2]),
        ];
        assert!(matches!(
            first_data_layer(layers),
            Err(PipelineError::DecodeError(_))
        ));
    }
}
