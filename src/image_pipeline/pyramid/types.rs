//! Pyramid tiling configuration

use std::fmt;
use std::str::FromStr;

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Image format of the generated tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl TileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TileFormat::Jpeg => "jpeg",
            TileFormat::Png => "png",
            TileFormat::Webp => "webp",
        }
    }

    /// Whether the tiler accepts a quality setting for this format.
    pub fn is_lossy(self) -> bool {
        matches!(self, TileFormat::Jpeg | TileFormat::Webp)
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TileFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(TileFormat::Jpeg),
            "png" => Ok(TileFormat::Png),
            "webp" => Ok(TileFormat::Webp),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown tile format '{}' (expected jpeg, png or webp)",
                other
            ))),
        }
    }
}

/// Deep Zoom pyramid options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidConfig {
    /// Tile edge in pixels
    pub tile_size: u32,
    /// Pixels shared between neighbouring tiles
    pub overlap: u32,
    pub format: TileFormat,
    /// 1..=100, only used by lossy formats
    pub quality: u8,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            tile_size: 256,
            overlap: 1,
            format: TileFormat::Jpeg,
            quality: 90,
        }
    }
}

impl PyramidConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(PipelineError::InvalidConfig("tile size must be positive".to_string()));
        }
        if self.overlap >= self.tile_size {
            return Err(PipelineError::InvalidConfig(format!(
                "overlap {} must be smaller than the tile size {}",
                self.overlap, self.tile_size
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(PipelineError::InvalidConfig(format!(
                "quality must be in 1..=100 (got {})",
                self.quality
            )));
        }
        Ok(())
    }
}
