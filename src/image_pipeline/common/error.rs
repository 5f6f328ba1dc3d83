use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Unsupported input file type: {0}")]
    UnsupportedFormat(String),

    #[error("No image data found in {}", .0.display())]
    NoImageData(PathBuf),

    #[error("Invalid image dimensions: {0:?}")]
    InvalidDimensions(Vec<usize>),

    #[error("{channel} channel is {found:?} but the reference is {expected:?}")]
    ChannelShapeMismatch {
        channel: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Alignment aborted: {0}")]
    Alignment(String),

    #[error("External tool '{tool}' not available: {reason}")]
    ExternalToolMissing { tool: String, reason: String },

    #[error("External tool '{tool}' exited with {status}:\n{stderr}")]
    ExternalToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
