//! Pipeline conversions module
//!
//! Orchestration of the grayscale stretch and the three-channel color composite.

mod color_composite;
mod grayscale;
mod source;


pub use color_composite::{ColorCompositePipeline, CompositeProducts, CompositeReport};
pub use grayscale::{GrayscaleReport, GrayscaleStretchPipeline};
