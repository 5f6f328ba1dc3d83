//! Three-filter color composite.
//!
//! Each channel is decoded and tone mapped independently (in parallel), red and
//! blue are registered onto green, and the stack is written twice: a clipped
//! linear float TIFF and a balanced 8-bit preview.

use std::path::{Path, PathBuf};

use tracing::{info, info_span, instrument};

use crate::image_pipeline::{
    common::{error::Result, output::write_atomically, timing::PipelineTimings},
    composite::{Channel, CompositeImage, Compositor},
    conversions::source::{load_plane, output_path},
    plane::{IntensityPlane, PlaneReader, TiffPlaneReader},
    registration::{Aligner, PhaseCorrelationAligner, Registrar},
    tiff::{ConversionConfig, StandardTiffWriter, TiffWriter},
    tone::{PercentileWindow, ToneMapper},
};

const LINEAR_SUFFIX: &str = "_color_32bit.tiff";
const DISPLAY_SUFFIX: &str = "_color_8bit_preview.tiff";

/// In-memory result of compositing three planes
#[derive(Debug, Clone)]
pub struct CompositeProducts {
    pub image: CompositeImage,
    /// Normalization windows in R, G, B order
    pub windows: [PercentileWindow; 3],
    pub red_aligned: bool,
    pub blue_aligned: bool,
}

/// Outcome of one composite run
#[derive(Debug)]
pub struct CompositeReport {
    pub linear_output: PathBuf,
    pub display_output: PathBuf,
    pub dimensions: (usize, usize),
    pub windows: [PercentileWindow; 3],
    pub red_aligned: bool,
    pub blue_aligned: bool,
    pub timings: PipelineTimings,
}

pub struct ColorCompositePipeline<R: PlaneReader, W: TiffWriter, A: Aligner> {
    reader: R,
    writer: W,
    registrar: Registrar<A>,
    config: ConversionConfig,
}

impl ColorCompositePipeline<TiffPlaneReader, StandardTiffWriter, PhaseCorrelationAligner> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: TiffPlaneReader,
            writer: StandardTiffWriter,
            registrar: Registrar::new(PhaseCorrelationAligner::default()),
            config,
        }
    }
}

impl<R: PlaneReader, W: TiffWriter, A: Aligner> ColorCompositePipeline<R, W, A> {
    pub fn with_custom(reader: R, writer: W, aligner: A, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            registrar: Registrar::new(aligner),
            config,
        }
    }

    /// Tone maps, registers and stacks three decoded planes.
    #[instrument(skip_all)]
    pub fn compose_planes(
        &self,
        red: IntensityPlane,
        green: IntensityPlane,
        blue: IntensityPlane,
    ) -> Result<CompositeProducts> {
        self.config.validate()?;
        let mapper = ToneMapper::new(self.config.tone);

        let (red, (green, blue)) = {
            let _span = info_span!("tone_map_channels").entered();
            rayon::join(
                move || mapper.map(red),
                move || rayon::join(move || mapper.map(green), move || mapper.map(blue)),
            )
        };
        let windows = [red.window, green.window, blue.window];
        for (channel, window) in Channel::ALL.iter().zip(&windows) {
            info!(lo = window.lo, hi = window.hi, "{} percentile window", channel);
        }

        let registered = self.registrar.register(red.plane, green.plane, blue.plane)?;

        let image = Compositor::new(self.config.balance).compose(
            registered.red.plane().view(),
            registered.green.view(),
            registered.blue.plane().view(),
        )?;

        Ok(CompositeProducts {
            image,
            windows,
            red_aligned: registered.red.is_aligned(),
            blue_aligned: registered.blue.is_aligned(),
        })
    }

    /// Writes `<output_base>_color_32bit.tiff` and
    /// `<output_base>_color_8bit_preview.tiff`.
    #[instrument(skip_all, fields(output_base = %output_base.as_ref().display()))]
    pub fn convert_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        red_path: P,
        green_path: P,
        blue_path: P,
        output_base: Q,
    ) -> Result<CompositeReport> {
        let output_base = output_base.as_ref();
        self.config.validate()?;

        let mut timings = PipelineTimings::new();
        let limit = self.config.dimension_limit();
        let red = timings.time("load_red", || load_plane(&self.reader, red_path.as_ref(), limit))?;
        let green = timings.time("load_green", || load_plane(&self.reader, green_path.as_ref(), limit))?;
        let blue = timings.time("load_blue", || load_plane(&self.reader, blue_path.as_ref(), limit))?;

        let products = timings.time("compose", || self.compose_planes(red, green, blue))?;
        let image = &products.image;

        let linear_output = output_path(output_base, LINEAR_SUFFIX);
        timings.time("write_linear", || {
            write_atomically(&linear_output, |w| self.writer.write_rgb_f32(image.linear.view(), w, &self.config))
        })?;
        info!(path = %linear_output.display(), "Saved 32-bit composite");

        let display_output = output_path(output_base, DISPLAY_SUFFIX);
        timings.time("write_display", || {
            write_atomically(&display_output, |w| self.writer.write_rgb8(image.display.view(), w, &self.config))
        })?;
        info!(path = %display_output.display(), "Saved 8-bit preview");

        timings.log_summary();
        Ok(CompositeReport {
            linear_output,
            display_output,
            dimensions: image.dimensions(),
            windows: products.windows,
            red_aligned: products.red_aligned,
            blue_aligned: products.blue_aligned,
            timings,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn registrar(&self) -> &Registrar<A> {
        &self.registrar
    }
}
