//! Tone mapping configuration types

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Generalized Hyperbolic Stretch curve parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchParameters {
    /// Stretch strength
    pub k: f64,
    /// Local contrast factor; larger values flatten the curve away from `s`
    pub l: f64,
    /// Symmetry point in [0, 1], mapped onto itself
    pub s: f64,
}

impl Default for StretchParameters {
    fn default() -> Self {
        Self {
            k: 2.0,
            l: 5.0,
            s: 0.25,
        }
    }
}

/// How much of the stretch is rolled back near black and near white
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectionParameters {
    /// Normalized level at or below which shadows are protected; 0 disables
    pub shadow_point: f64,
    /// Normalized level at or above which highlights are compressed; 1 disables
    pub highlight_point: f64,
    pub shadow_blend_strength: f64,
    pub highlight_compress_strength: f64,
}

impl Default for ProtectionParameters {
    fn default() -> Self {
        Self {
            shadow_point: 0.01,
            highlight_point: 0.98,
            shadow_blend_strength: 0.9,
            highlight_compress_strength: 0.92,
        }
    }
}

impl ProtectionParameters {
    /// Parameters under which protection is a pass-through.
    pub fn disabled() -> Self {
        Self {
            shadow_point: 0.0,
            highlight_point: 1.0,
            ..Self::default()
        }
    }
}

/// Requested lower/upper percentiles, in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileRange {
    pub lower: f64,
    pub upper: f64,
}

impl Default for PercentileRange {
    fn default() -> Self {
        Self {
            lower: 0.5,
            upper: 99.5,
        }
    }
}

/// Intensity window actually used for normalization; `hi > lo` always holds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileWindow {
    pub lo: f64,
    pub hi: f64,
}

/// Everything the per-channel tone pipeline needs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToneConfig {
    pub percentiles: PercentileRange,
    pub stretch: StretchParameters,
    pub protection: ProtectionParameters,
}

impl ToneConfig {
    pub fn builder() -> ToneConfigBuilder {
        ToneConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(PipelineError::InvalidConfig(msg)) };
        let p = &self.percentiles;
        let st = &self.stretch;
        let pr = &self.protection;

        if !(0.0..=100.0).contains(&p.lower) || !(0.0..=100.0).contains(&p.upper) || p.lower >= p.upper {
            return invalid(format!(
                "percentiles must satisfy 0 <= lower < upper <= 100 (got {} / {})",
                p.lower, p.upper
            ));
        }
        if !(st.k >= 0.0 && st.l >= 0.0) {
            return invalid(format!("stretch k and L must be >= 0 (got {} / {})", st.k, st.l));
        }
        if !(0.0..=1.0).contains(&st.s) {
            return invalid(format!("symmetry point must lie in [0, 1] (got {})", st.s));
        }
        if !(0.0..=1.0).contains(&pr.shadow_point)
            || !(0.0..=1.0).contains(&pr.highlight_point)
            || pr.shadow_point >= pr.highlight_point
        {
            return invalid(format!(
                "protection points must satisfy 0 <= sp < hp <= 1 (got {} / {})",
                pr.shadow_point, pr.highlight_point
            ));
        }
        Ok(())
    }
}

/// Builder for ToneConfig
#[derive(Default)]
pub struct ToneConfigBuilder {
    percentiles: Option<PercentileRange>,
    stretch: Option<StretchParameters>,
    protection: Option<ProtectionParameters>,
}

impl ToneConfigBuilder {
    pub fn percentiles(mut self, lower: f64, upper: f64) -> Self {
        self.percentiles = Some(PercentileRange { lower, upper });
        self
    }

    pub fn stretch(mut self, stretch: StretchParameters) -> Self {
        self.stretch = Some(stretch);
        self
    }

    pub fn protection(mut self, protection: ProtectionParameters) -> Self {
        self.protection = Some(protection);
        self
    }

    pub fn build(self) -> ToneConfig {
        let default = ToneConfig::default();
        ToneConfig {
            percentiles: self.percentiles.unwrap_or(default.percentiles),
            stretch: self.stretch.unwrap_or(default.stretch),
            protection: self.protection.unwrap_or(default.protection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ToneConfig::default();
        assert_eq!(config.stretch, StretchParameters { k: 2.0, l: 5.0, s: 0.25 });
        assert_eq!(config.protection.shadow_point, 0.01);
        assert_eq!(config.protection.highlight_point, 0.98);
        assert_eq!(config.percentiles, PercentileRange { lower: 0.5, upper: 99.5 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides_only_what_is_set() {
        let config = ToneConfig::builder().percentiles(1.0, 99.0).build();
        assert_eq!(config.percentiles.lower, 1.0);
        assert_eq!(config.stretch, StretchParameters::default());
    }

    #[test]
    fn inverted_protection_points_are_rejected() {
        let config = ToneConfig::builder()
            .protection(ProtectionParameters {
                shadow_point: 0.5,
                highlight_point: 0.4,
                ..ProtectionParameters::default()
            })
            .build();
        assert!(matches!(config.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn negative_contrast_is_rejected() {
        let config = ToneConfig::builder()
            .stretch(StretchParameters { k: 2.0, l: -1.0, s: 0.25 })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabled_protection_still_validates() {
        let config = ToneConfig::builder()
            .protection(ProtectionParameters::disabled())
            .build();
        assert!(config.validate().is_ok());
    }
}
