//! TIFF writing module
//!
//! Encodes grayscale float, RGB float and RGB8 products with the configured compression.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, TiffCompression};
pub use writer::TiffWriter;
