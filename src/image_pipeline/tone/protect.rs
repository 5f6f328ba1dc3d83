use crate::image_pipeline::tone::types::ProtectionParameters;

const EPSILON: f64 = 1e-12;

/// Exponent of the highlight roll-off; below 1 so attenuation ramps up
/// quickly right above the highlight point.
const HIGHLIGHT_ROLLOFF: f64 = 0.8;

/// Rolls the stretched value `y` back near the extremes of the original `x`.
///
/// At or below the shadow point the output blends toward `x` with weight
/// `1 - x/sp`; at or above the highlight point the output is compressed toward
/// the stretch anchor. Samples strictly between both points return `y` as is.
#[inline]
pub fn protect(x: f64, y: f64, params: &ProtectionParameters, anchor: f64) -> f64 {
    let mut out = y;

    let sp = params.shadow_point;
    if sp > 0.0 && x <= sp {
        let w = 1.0 - x / (sp + EPSILON);
        let blend = w * params.shadow_blend_strength;
        out = blend * x + (1.0 - blend) * out;
    }

    let hp = params.highlight_point;
    if hp < 1.0 && x >= hp {
        let rel = ((x - hp) / (1.0 - hp + EPSILON)).max(0.0);
        let attenuation = 1.0 - params.highlight_compress_strength * rel.powf(HIGHLIGHT_ROLLOFF);
        out = anchor + (out - anchor) * attenuation;
    }

    out
}
