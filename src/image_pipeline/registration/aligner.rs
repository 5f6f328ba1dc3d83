use ndarray::{Array2, ArrayView2};
use thiserror::Error;

/// Why an alignment attempt produced no transform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("no usable structure: {0}")]
    NoFeatures(String),

    #[error("no reliable transform (peak ratio {ratio:.2}, need {required:.2})")]
    WeakCorrelation { ratio: f64, required: f64 },

    /// The capability itself is broken; retrying other channels is pointless.
    #[error("{0}")]
    Fatal(String),
}

impl AlignError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AlignError::Fatal(_))
    }
}

/// Geometric registration capability: warp `source` onto the grid of
/// `reference`. The returned plane always has the reference's shape.
pub trait Aligner {
    fn align(
        &self,
        source: ArrayView2<f32>,
        reference: ArrayView2<f32>,
    ) -> Result<Array2<f32>, AlignError>;
}
