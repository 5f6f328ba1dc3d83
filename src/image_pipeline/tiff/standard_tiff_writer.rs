use std::io::{Cursor, Write};

use ndarray::{ArrayView, ArrayView2, ArrayView3, Dimension};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, TiffValue};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::tiff::types::{ConversionConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::TiffWriter;

pub struct StandardTiffWriter;

fn encode_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::EncodeError(e.to_string())
}

fn compression(config: &ConversionConfig) -> Compression {
    match config.compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

/// Encodes one image to memory, then hands the finished bytes to `output`.
fn encode<C, D>(
    image: ArrayView<C::Inner, D>,
    width: usize,
    height: usize,
    output: &mut dyn Write,
    config: &ConversionConfig,
) -> Result<()>
where
    C: ColorType,
    C::Inner: Clone,
    [C::Inner]: TiffValue,
    D: Dimension,
{
    debug!("Encoding TIFF image: {}x{}", width, height);

    let width = u32::try_from(width).map_err(encode_error)?;
    let height = u32::try_from(height).map_err(encode_error)?;
    let standard = image.as_standard_layout();
    let samples = standard
        .as_slice()
        .ok_or_else(|| encode_error("image is not contiguous"))?;

    let mut buffer = Vec::new();
    TiffEncoder::new(Cursor::new(&mut buffer))
        .map_err(encode_error)?
        .with_compression(compression(config))
        .write_image::<C>(width, height, samples)
        .map_err(encode_error)?;

    output.write_all(&buffer)?;
    debug!("TIFF encoding complete, {} bytes", buffer.len());
    Ok(())
}

impl TiffWriter for StandardTiffWriter {
    fn write_gray_f32(&self, plane: ArrayView2<f32>, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        let (height, width) = plane.dim();
        encode::<colortype::Gray32Float, _>(plane, width, height, output, config)
    }

    fn write_rgb_f32(&self, image: ArrayView3<f32>, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        let (height, width, _) = image.dim();
        encode::<colortype::RGB32Float, _>(image, width, height, output, config)
    }

    fn write_rgb8(&self, image: ArrayView3<u8>, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        let (height, width, _) = image.dim();
        encode::<colortype::RGB8, _>(image, width, height, output, config)
    }
}
