//! Plane data types

use std::path::Path;

use ndarray::{Array2, ArrayD};

use crate::image_pipeline::common::error::{PipelineError, Result};

/// A single 2D plane of intensity samples, rows first.
pub type IntensityPlane = Array2<f64>;

/// Container formats recognised by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Tiff,
    Fits,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "tif" | "tiff" => Ok(Self::Tiff),
            "fits" | "fit" | "fts" => Ok(Self::Fits),
            _ => Err(PipelineError::UnsupportedFormat(format!(
                "{} (extension '.{}')",
                path.display(),
                ext
            ))),
        }
    }
}

/// Numeric samples decoded from one layer of an input container
#[derive(Debug, Clone)]
pub struct DecodedArray {
    /// Samples with the two spatial axes last (`[.., height, width]`)
    pub data: ArrayD<f64>,
    /// Position of the layer inside the container
    pub layer_index: usize,
}

impl DecodedArray {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}
