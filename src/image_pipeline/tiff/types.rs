//! Output and run configuration types

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::composite::BalanceMethod;
use crate::image_pipeline::tone::ToneConfig;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Configuration shared by the grayscale and composite pipelines
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Percentiles, stretch and protection applied to every channel
    pub tone: ToneConfig,
    /// Balance used for the 8-bit display product
    pub balance: BalanceMethod,
    /// Compression method to use for every written TIFF
    pub compression: TiffCompression,
    /// Whether to enforce `max_dimension` on decoded planes
    pub validate_dimensions: bool,
    /// Largest accepted plane height or width
    pub max_dimension: Option<usize>,
}

/// Default size guard; wider planes exceed what common TIFF viewers open.
pub const DEFAULT_MAX_DIMENSION: usize = 65_535;

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tone: ToneConfig::default(),
            balance: BalanceMethod::default(),
            compression: TiffCompression::None,
            validate_dimensions: true,
            max_dimension: Some(DEFAULT_MAX_DIMENSION),
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == Some(0) {
            return Err(PipelineError::InvalidConfig("max dimension must be positive".to_string()));
        }
        self.tone.validate()
    }

    /// Size limit actually in force, `None` when validation is off.
    pub fn dimension_limit(&self) -> Option<usize> {
        if self.validate_dimensions { self.max_dimension } else { None }
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    tone: Option<ToneConfig>,
    balance: Option<BalanceMethod>,
    compression: Option<TiffCompression>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
}

impl ConversionConfigBuilder {
    pub fn tone(mut self, tone: ToneConfig) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn balance(mut self, balance: BalanceMethod) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max_dimension: Option<usize>) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            tone: self.tone.unwrap_or(default.tone),
            balance: self.balance.unwrap_or(default.balance),
            compression: self.compression.unwrap_or(default.compression),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::tone::StretchParameters;

    #[test]
    fn builder_falls_back_to_defaults() {
        let config = ConversionConfig::builder()
            .compression(TiffCompression::DeflateBest)
            .build();

        assert_eq!(config.compression, TiffCompression::DeflateBest);
        assert_eq!(config.balance, BalanceMethod::default());
        assert_eq!(config.tone, ToneConfig::default());
        assert!(config.validate_dimensions);
        assert_eq!(config.dimension_limit(), Some(DEFAULT_MAX_DIMENSION));
    }

    #[test]
    fn dimension_limit_follows_validation_flag() {
        let config = ConversionConfig::builder()
            .max_dimension(Some(100))
            .validate_dimensions(false)
            .build();
        assert_eq!(config.dimension_limit(), None);

        let config = ConversionConfig::builder().max_dimension(Some(100)).build();
        assert_eq!(config.dimension_limit(), Some(100));

        let config = ConversionConfig::builder().max_dimension(Some(0)).build();
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn validate_checks_tone_parameters() {
        let tone = ToneConfig::builder()
            .stretch(StretchParameters { k: 2.0, l: 5.0, s: 1.5 })
            .build();
        let config = ConversionConfig::builder().tone(tone).build();
        assert!(config.validate().is_err());
        assert!(ConversionConfig::default().validate().is_ok());
    }
}
