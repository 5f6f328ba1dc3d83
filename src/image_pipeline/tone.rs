//! Tone mapping module
//!
//! Percentile normalization, the Generalized Hyperbolic Stretch and
//! shadow/highlight protection, chained per channel by [`ToneMapper`].

mod ghs;
mod mapper;
mod normalize;
mod protect;
pub mod types;

pub use ghs::ghs_map;
pub use mapper::{ToneMapped, ToneMapper};
pub use normalize::{normalize_in_place, percentile, resolve_window};
pub use protect::protect;
pub use types::{
    PercentileRange, PercentileWindow, ProtectionParameters, StretchParameters, ToneConfig,
    ToneConfigBuilder,
};
