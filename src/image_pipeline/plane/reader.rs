use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::plane::types::{DecodedArray, SourceFormat};

pub trait PlaneReader {
    fn supports(&self, format: SourceFormat) -> bool;

    /// Decodes the first usable layer of a container, or `None` when the
    /// container holds no image data at all.
    fn read_plane(&self, data: &[u8]) -> Result<Option<DecodedArray>>;
}
