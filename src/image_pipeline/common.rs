//! Common utilities module
//!
//! This module contains shared utilities used across the image pipeline.

pub mod error;
pub mod output;
pub mod timing;

pub use error::{PipelineError, Result};
pub use output::write_atomically;
pub use timing::{PipelineTimings, StepTiming, Timer};
