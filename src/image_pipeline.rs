//! Image processing pipeline module
//!
//! Tone mapping of astronomical intensity planes with the Generalized
//! Hyperbolic Stretch, registration and compositing of three filters into a
//! color image, TIFF output and Deep Zoom tiling.

pub mod common;
pub mod composite;
pub mod conversions;
pub mod plane;
pub mod pyramid;
pub mod registration;
pub mod tiff;
pub mod tone;

pub use self::common::{PipelineError, PipelineTimings, Result};

pub use self::plane::{IntensityPlane, PlaneReader, SourceFormat, TiffPlaneReader};

pub use self::tone::{
    PercentileRange, PercentileWindow, ProtectionParameters, StretchParameters, ToneConfig, ToneMapper,
};

pub use self::registration::{AlignError, Aligner, AlignmentOutcome, PhaseCorrelationAligner, Registrar};

pub use self::composite::{BalanceMethod, Channel, CompositeImage, Compositor};

pub use self::tiff::{ConversionConfig, ConversionConfigBuilder, StandardTiffWriter, TiffCompression, TiffWriter};

pub use self::pyramid::{PyramidConfig, TileFormat, VipsPyramidBuilder, build_pyramid};

pub use self::conversions::{ColorCompositePipeline, CompositeReport, GrayscaleReport, GrayscaleStretchPipeline};
