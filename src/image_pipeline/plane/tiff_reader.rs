//! Plane reader for (multi-page) TIFF containers using the tiff crate.
//!
//! Every image directory is a candidate layer. Directories are visited in file
//! order and the first one with a supported photometric layout wins; samples
//! keep their stored values (no rescaling), because normalization happens
//! later on percentile statistics.

use std::io::{Cursor, Read, Seek};

use ndarray::{Array2, Array3, ArrayD};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::plane::layers::first_data_layer;
use crate::image_pipeline::plane::reader::PlaneReader;
use crate::image_pipeline::plane::types::{DecodedArray, SourceFormat};

/// Upper bound for any single decoding buffer; large mosaics exceed the crate default.
const DECODING_LIMIT_BYTES: usize = 1024 * 1024 * 1024;

pub struct TiffPlaneReader;

fn decode_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::DecodeError(e.to_string())
}

impl PlaneReader for TiffPlaneReader {
    fn supports(&self, format: SourceFormat) -> bool {
        format == SourceFormat::Tiff
    }

    fn read_plane(&self, data: &[u8]) -> Result<Option<DecodedArray>> {
        debug!("Decoding TIFF container, {} bytes", data.len());

        let mut limits = Limits::default();
        limits.decoding_buffer_size = DECODING_LIMIT_BYTES;
        limits.ifd_value_size = DECODING_LIMIT_BYTES;
        limits.intermediate_buffer_size = DECODING_LIMIT_BYTES;

        let decoder = Decoder::new(Cursor::new(data))
            .map_err(decode_error)?
            .with_limits(limits);

        let directories = Directories {
            decoder,
            started: false,
            done: false,
        };

        Ok(first_data_layer(directories)?
            .map(|(layer_index, data)| DecodedArray { data, layer_index }))
    }
}

/// Lazily walks the image directories of one TIFF stream.
struct Directories<R: Read + Seek> {
    decoder: Decoder<R>,
    started: bool,
    done: bool,
}

impl<R: Read + Seek> Iterator for Directories<R> {
    type Item = Result<Option<ArrayD<f64>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started {
            if !self.decoder.more_images() {
                self.done = true;
                return None;
            }
            if let Err(e) = self.decoder.next_image() {
                self.done = true;
                return Some(Err(decode_error(e)));
            }
        }
        self.started = true;
        Some(read_directory(&mut self.decoder))
    }
}

fn read_directory<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<ArrayD<f64>>> {
    let (width, height) = decoder.dimensions().map_err(decode_error)?;
    let color_type = decoder.colortype().map_err(decode_error)?;

    let samples = match color_type {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) => 4,
        other => {
            debug!("Skipping directory with color type {:?}", other);
            return Ok(None);
        }
    };
    if width == 0 || height == 0 {
        return Ok(None);
    }

    let values = widen(decoder.read_image().map_err(decode_error)?)?;
    let (width, height) = (width as usize, height as usize);

    let data = if samples == 1 {
        Array2::from_shape_vec((height, width), values)
            .map_err(decode_error)?
            .into_dyn()
    } else {
        // Interleaved samples become a leading layer axis.
        Array3::from_shape_vec((height, width, samples), values)
            .map_err(decode_error)?
            .permuted_axes([2, 0, 1])
            .as_standard_layout()
            .into_owned()
            .into_dyn()
    };
    Ok(Some(data))
}

trait Sample: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(impl Sample for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        })*
    };
}

impl_sample!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

fn to_f64_vec<T: Sample>(buf: Vec<T>) -> Vec<f64> {
    buf.into_iter().map(Sample::to_f64).collect()
}

fn widen(result: DecodingResult) -> Result<Vec<f64>> {
    #[allow(unreachable_patterns)]
    let values = match result {
        DecodingResult::U8(buf) => to_f64_vec(buf),
        DecodingResult::U16(buf) => to_f64_vec(buf),
        DecodingResult::U32(buf) => to_f64_vec(buf),
        DecodingResult::U64(buf) => to_f64_vec(buf),
        DecodingResult::I8(buf) => to_f64_vec(buf),
        DecodingResult::I16(buf) => to_f64_vec(buf),
        DecodingResult::I32(buf) => to_f64_vec(buf),
        DecodingResult::I64(buf) => to_f64_vec(buf),
        DecodingResult::F32(buf) => to_f64_vec(buf),
        DecodingResult::F64(buf) => to_f64_vec(buf),
        _ => {
            return Err(PipelineError::UnsupportedFormat(
                "TIFF sample format".to_string(),
            ));
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;
    use tiff::encoder::{TiffEncoder, colortype};

    fn encode_pages(pages: &[(u32, u32, Vec<f32>)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer)).unwrap();
            for (width, height, data) in pages {
                encoder
                    .write_image::<colortype::Gray32Float>(*width, *height, data)
                    .unwrap();
            }
        }
        buffer
    }

    #[test]
    fn grayscale_float_page_keeps_values_and_shape() {
        let data: Vec<f32> = (0..12).map(|v| v as f32 * 1.5).collect();
        let bytes = encode_pages(&[(4, 3, data)]);

        let decoded = TiffPlaneReader.read_plane(&bytes).unwrap().unwrap();
        assert_eq!(decoded.layer_index, 0);
        assert_eq!(decoded.shape(), &[3, 4]);
        assert_eq!(decoded.data[IxDyn(&[2, 3])], 16.5);
    }

    #[test]
    fn rgb_samples_become_leading_axis() {
        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer)).unwrap();
            let pixels: Vec<u8> = vec![10, 20, 30, 40, 50, 60];
            encoder
                .write_image::<colortype::RGB8>(2, 1, &pixels)
                .unwrap();
        }

        let decoded = TiffPlaneReader.read_plane(&buffer).unwrap().unwrap();
        assert_eq!(decoded.shape(), &[3, 1, 2]);
        assert_eq!(decoded.data[IxDyn(&[0, 0, 1])], 40.0);
        assert_eq!(decoded.data[IxDyn(&[2, 0, 0])], 30.0);
    }

    #[test]
    fn first_page_wins_in_multipage_file() {
        let bytes = encode_pages(&[(2, 2, vec![1.0; 4]), (3, 3, vec![2.0; 9])]);
        let decoded = TiffPlaneReader.read_plane(&bytes).unwrap().unwrap();
        assert_eq!(decoded.shape(), &[2, 2]);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let result = TiffPlaneReader.read_plane(b"definitely not a tiff");
        assert!(matches!(result, Err(PipelineError::DecodeError(_))));
    }

    #[test]
    fn only_tiff_is_supported() {
        assert!(TiffPlaneReader.supports(SourceFormat::Tiff));
        assert!(!TiffPlaneReader.supports(SourceFormat::Fits));
    }
}
