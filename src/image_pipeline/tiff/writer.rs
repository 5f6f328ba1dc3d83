use std::io::Write;

use ndarray::{ArrayView2, ArrayView3};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::tiff::types::ConversionConfig;

/// Encodes pipeline products. RGB images are `(height, width, 3)`.
pub trait TiffWriter {
    fn write_gray_f32(&self, plane: ArrayView2<f32>, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
    fn write_rgb_f32(&self, image: ArrayView3<f32>, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
    fn write_rgb8(&self, image: ArrayView3<u8>, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
