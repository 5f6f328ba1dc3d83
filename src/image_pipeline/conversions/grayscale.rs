use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, instrument};

use crate::image_pipeline::{
    common::{
        error::{PipelineError, Result},
        output::write_atomically,
        timing::PipelineTimings,
    },
    conversions::source::{decode_plane, output_path, read_source},
    plane::{PlaneReader, TiffPlaneReader},
    tiff::{ConversionConfig, StandardTiffWriter, TiffWriter},
    tone::{PercentileWindow, ToneMapper},
};

const GRAYSCALE_SUFFIX: &str = "_grayscale.tif";

/// Outcome of one grayscale stretch
#[derive(Debug)]
pub struct GrayscaleReport {
    pub output: PathBuf,
    pub window: PercentileWindow,
    pub dimensions: (usize, usize),
    pub timings: PipelineTimings,
}

/// Stretches a single container into a 32-bit float grayscale TIFF.
pub struct GrayscaleStretchPipeline<R: PlaneReader, W: TiffWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
}

impl GrayscaleStretchPipeline<TiffPlaneReader, StandardTiffWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: TiffPlaneReader,
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<R: PlaneReader, W: TiffWriter> GrayscaleStretchPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self { reader, writer, config }
    }

    /// Decodes `input_data`, tone maps it and encodes the result to `output`.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<(PercentileWindow, (usize, usize))> {
        self.config.validate()?;

        let plane = decode_plane(&self.reader, input_data, self.config.dimension_limit())?
            .ok_or_else(|| PipelineError::DecodeError("container holds no image data".to_string()))?;
        let dimensions = plane.dim();

        let mapped = {
            let _span = info_span!("tone_map", height = dimensions.0, width = dimensions.1).entered();
            ToneMapper::new(self.config.tone).map(plane)
        };

        {
            let _span = info_span!("encode_tiff").entered();
            self.writer.write_gray_f32(mapped.plane.view(), output, &self.config)?;
        }

        Ok((mapped.window, dimensions))
    }

    /// Writes `<output_base>_grayscale.tif`.
    #[instrument(skip(self, input_path, output_base))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input_path: P, output_base: Q) -> Result<GrayscaleReport> {
        let input_path = input_path.as_ref();
        let output = output_path(output_base.as_ref(), GRAYSCALE_SUFFIX);
        self.config.validate()?;

        info!(
            input = %input_path.display(),
            output = %output.display(),
            "Stretching file"
        );

        let mut timings = PipelineTimings::new();
        let input_data = timings.time("read_input", || read_source(&self.reader, input_path))?;

        let plane = timings
            .time("decode", || decode_plane(&self.reader, &input_data, self.config.dimension_limit()))?
            .ok_or_else(|| PipelineError::NoImageData(input_path.to_path_buf()))?;
        drop(input_data);
        let dimensions = plane.dim();

        let mapped = timings.time("tone_map", || ToneMapper::new(self.config.tone).map(plane));
        info!(
            lo = mapped.window.lo,
            hi = mapped.window.hi,
            "Percentile window"
        );

        timings.time("write_output", || {
            write_atomically(&output, |w| self.writer.write_gray_f32(mapped.plane.view(), w, &self.config))
        })?;
        timings.log_summary();

        info!(
            height = dimensions.0,
            width = dimensions.1,
            "Grayscale stretch complete"
        );
        Ok(GrayscaleReport {
            output,
            window: mapped.window,
            dimensions,
            timings,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ConversionConfig) {
        self.config = config;
    }
}
