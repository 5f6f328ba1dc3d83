use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::plane::{DecodedArray, IntensityPlane, PlaneReader, SourceFormat, select_plane};

/// `<base><suffix>`, keeping every character of `base` (dots included).
pub(crate) fn output_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Checks the container type and reads the raw bytes of `path`.
pub(crate) fn read_source<R: PlaneReader>(reader: &R, path: &Path) -> Result<Vec<u8>> {
    let format = SourceFormat::from_path(path)?;
    if !reader.supports(format) {
        return Err(PipelineError::UnsupportedFormat(format!(
            "{}: {:?} containers cannot be decoded",
            path.display(),
            format
        )));
    }

    let _span = info_span!("read_input_file", path = %path.display()).entered();
    std::fs::read(path).map_err(|e| PipelineError::InputReadError(format!("{}: {}", path.display(), e)))
}

/// Decodes one container into a sanitized 2D plane.
pub(crate) fn decode_plane<R: PlaneReader>(
    reader: &R,
    input_data: &[u8],
    max_dimension: Option<usize>,
) -> Result<Option<IntensityPlane>> {
    let decoded = {
        let _span = info_span!("decode_plane", input_size = input_data.len()).entered();
        reader.read_plane(input_data)?
    };
    let Some(DecodedArray { data, layer_index }) = decoded else {
        return Ok(None);
    };
    debug!(layer_index, shape = ?data.shape(), "Selected container layer");

    if let (Some(max), [.., height, width]) = (max_dimension, data.shape()) {
        if *height > max || *width > max {
            return Err(PipelineError::InvalidDimensions(data.shape().to_vec()));
        }
    }

    let plane = {
        let _span = info_span!("select_plane").entered();
        select_plane(data)?
    };
    Ok(Some(plane))
}

/// Reads and decodes `path`; a container without image data is an error
/// naming the file.
pub(crate) fn load_plane<R: PlaneReader>(reader: &R, path: &Path, max_dimension: Option<usize>) -> Result<IntensityPlane> {
    let bytes = read_source(reader, path)?;
    decode_plane(reader, &bytes, max_dimension)?.ok_or_else(|| PipelineError::NoImageData(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_appends_to_dotted_bases() {
        assert_eq!(
            output_path(Path::new("out/ngc.3372"), "_grayscale.tif"),
            PathBuf::from("out/ngc.3372_grayscale.tif")
        );
    }
}
