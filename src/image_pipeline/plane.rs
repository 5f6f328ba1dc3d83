//! Plane selection module
//!
//! This module turns decoded containers into one sanitized 2D intensity plane:
//! container layer selection, max-projection of extra axes and replacement of
//! non-finite samples.

mod layers;
mod reader;
mod selector;
mod tiff_reader;
pub mod types;

pub use layers::first_data_layer;
pub use reader::PlaneReader;
pub use selector::{max_projection, sanitize_non_finite, select_plane};
pub use tiff_reader::TiffPlaneReader;
pub use types::{DecodedArray, IntensityPlane, SourceFormat};
