//! Deep Zoom pyramid generation through the `vips` command-line tool.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::pyramid::types::PyramidConfig;

const DEFAULT_PROGRAM: &str = "vips";

pub struct VipsPyramidBuilder {
    program: OsString,
}

impl Default for VipsPyramidBuilder {
    fn default() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }
}

impl VipsPyramidBuilder {
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Runs `<program> --version`, returning the reported version line.
    pub fn check_version(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(|e| PipelineError::ExternalToolMissing {
                tool: self.tool_name(),
                reason: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(PipelineError::ExternalToolMissing {
                tool: self.tool_name(),
                reason: format!("version check exited with {}", output.status),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Tiles `input` into `<output_dir>/<stem>/` and returns the path of the
    /// `.dzi` descriptor. A previous pyramid of the same name is replaced only
    /// once the tool succeeded; a failed run leaves nothing behind.
    #[instrument(skip(self, input, output_dir), fields(input = %input.as_ref().display()))]
    pub fn build<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output_dir: Q,
        config: &PyramidConfig,
    ) -> Result<PathBuf> {
        let input = input.as_ref();
        let output_dir = output_dir.as_ref();
        config.validate()?;

        if !input.is_file() {
            return Err(PipelineError::InputReadError(format!(
                "Input file not found: {}",
                input.display()
            )));
        }
        let version = self.check_version()?;
        info!(version = %version, "Tiling tool found");
        info!(
            tile_size = config.tile_size,
            overlap = config.overlap,
            format = %config.format,
            quality = config.quality,
            "Starting pyramid creation"
        );

        let stem = input.file_stem().ok_or_else(|| {
            PipelineError::InputReadError(format!("{}: no file name", input.display()))
        })?;
        let image_dir = output_dir.join(stem);
        let output_error =
            |path: &Path, e: std::io::Error| PipelineError::OutputWriteError(format!("{}: {}", path.display(), e));
        std::fs::create_dir_all(output_dir).map_err(|e| output_error(output_dir, e))?;

        // Tiles land in a staging directory that is removed on drop unless
        // the run succeeds and it is renamed into place.
        let staging = tempfile::Builder::new()
            .prefix(".dzsave-")
            .tempdir_in(output_dir)
            .map_err(|e| output_error(output_dir, e))?;

        let args = dzsave_args(input, &staging.path().join(stem), config);
        debug!("Executing: {} {:?}", self.tool_name(), args);
        self.run(&args)?;

        if image_dir.exists() {
            debug!(path = %image_dir.display(), "Replacing previous pyramid");
            std::fs::remove_dir_all(&image_dir).map_err(|e| output_error(&image_dir, e))?;
        }
        std::fs::rename(staging.path(), &image_dir).map_err(|e| output_error(&image_dir, e))?;

        let mut descriptor = stem.to_os_string();
        descriptor.push(".dzi");
        let descriptor = image_dir.join(descriptor);
        info!(descriptor = %descriptor.display(), "Pyramid created");
        Ok(descriptor)
    }

    /// Streams the tool's stdout into the log and fails with its captured
    /// stderr on a non-zero exit.
    fn run(&self, args: &[OsString]) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::ExternalToolMissing {
                tool: self.tool_name(),
                reason: e.to_string(),
            })?;

        // Drained on its own thread so a chatty stderr cannot block stdout.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut captured = String::new();
                let _ = stderr.read_to_string(&mut captured);
                captured
            })
        });

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => info!("{}", line),
                    Err(_) => break,
                }
            }
        }

        let status = child.wait()?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(PipelineError::ExternalToolFailed {
                tool: self.tool_name(),
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            debug!("{}", stderr.trim());
        }
        Ok(())
    }
}

/// Arguments for `dzsave`. Lossy formats carry their quality as a `[Q=..]`
/// suffix on the output base.
pub fn dzsave_args(input: &Path, output_base: &Path, config: &PyramidConfig) -> Vec<OsString> {
    let mut target = output_base.as_os_str().to_os_string();
    if config.format.is_lossy() {
        target.push(format!("[Q={}]", config.quality));
    }

    vec![
        OsString::from("dzsave"),
        input.as_os_str().to_os_string(),
        target,
        OsString::from("--tile-size"),
        OsString::from(config.tile_size.to_string()),
        OsString::from("--overlap"),
        OsString::from(config.overlap.to_string()),
        OsString::from("--suffix"),
        OsString::from(format!(".{}", config.format.extension())),
    ]
}

/// Builds a pyramid with the `vips` found on `PATH`.
pub fn build_pyramid<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    config: &PyramidConfig,
) -> Result<PathBuf> {
    VipsPyramidBuilder::default().build(input, output_dir, config)
}
