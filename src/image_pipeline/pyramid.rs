//! Deep Zoom pyramid module
//!
//! Tiles a finished product for web viewing by driving the external `vips` tool.

mod types;
mod vips;

pub use types::{PyramidConfig, TileFormat};
pub use vips::{VipsPyramidBuilder, build_pyramid, dzsave_args};
