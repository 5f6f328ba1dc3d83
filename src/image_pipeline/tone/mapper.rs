use ndarray::Array2;
use tracing::{debug, instrument};

use crate::image_pipeline::plane::IntensityPlane;
use crate::image_pipeline::tone::ghs::ghs_map;
use crate::image_pipeline::tone::normalize::normalize_in_place;
use crate::image_pipeline::tone::protect::protect;
use crate::image_pipeline::tone::types::{PercentileWindow, ToneConfig};

/// Display-ready single-precision plane plus the window it was normalized with
#[derive(Debug, Clone)]
pub struct ToneMapped {
    pub plane: Array2<f32>,
    pub window: PercentileWindow,
}

/// Normalize, stretch, protect and clip one channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneMapper {
    config: ToneConfig,
}

impl ToneMapper {
    pub fn new(config: ToneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    /// Consumes the plane; normalization happens in place and stretch,
    /// protection and the final clip are fused into the f32 conversion.
    #[instrument(skip_all, fields(shape = ?plane.dim()))]
    pub fn map(&self, mut plane: IntensityPlane) -> ToneMapped {
        let window = normalize_in_place(&mut plane, self.config.percentiles);
        debug!(lo = window.lo, hi = window.hi, "Normalized");

        let stretch = self.config.stretch;
        let protection = self.config.protection;
        let plane = plane.mapv(|x| {
            let y = ghs_map(x, &stretch);
            protect(x, y, &protection, stretch.s).clamp(0.0, 1.0) as f32
        });

        ToneMapped { plane, window }
    }
}
