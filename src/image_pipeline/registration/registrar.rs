use ndarray::{Array2, ArrayView2};
use tracing::{debug, info, instrument, warn};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::composite::Channel;
use crate::image_pipeline::registration::aligner::{AlignError, Aligner};
use crate::image_pipeline::registration::phase_correlation::translate_onto;

/// Result of trying to register one channel
#[derive(Debug, Clone)]
pub enum AlignmentOutcome {
    /// The aligner produced a transformed plane
    Aligned(Array2<f32>),
    /// The aligner gave up; the original plane is kept, cropped or
    /// zero-filled to the reference grid when its size differs
    Fallback { plane: Array2<f32>, reason: AlignError },
}

impl AlignmentOutcome {
    pub fn is_aligned(&self) -> bool {
        matches!(self, AlignmentOutcome::Aligned(_))
    }

    pub fn plane(&self) -> &Array2<f32> {
        match self {
            AlignmentOutcome::Aligned(plane) => plane,
            AlignmentOutcome::Fallback { plane, .. } => plane,
        }
    }

    pub fn into_plane(self) -> Array2<f32> {
        match self {
            AlignmentOutcome::Aligned(plane) => plane,
            AlignmentOutcome::Fallback { plane, .. } => plane,
        }
    }
}

/// Channels after registration onto the green reference
#[derive(Debug, Clone)]
pub struct RegisteredChannels {
    pub red: AlignmentOutcome,
    pub green: Array2<f32>,
    pub blue: AlignmentOutcome,
}

/// Registers red and blue onto green, never failing on a recoverable
/// alignment error.
pub struct Registrar<A: Aligner> {
    aligner: A,
}

impl<A: Aligner> Registrar<A> {
    pub fn new(aligner: A) -> Self {
        Self { aligner }
    }

    pub fn aligner(&self) -> &A {
        &self.aligner
    }

    /// Attempts to align one channel. Only a fatal aligner error is returned
    /// as `Err`; any other failure keeps `plane` untouched.
    pub fn align_channel(
        &self,
        channel: Channel,
        plane: Array2<f32>,
        reference: ArrayView2<f32>,
    ) -> Result<AlignmentOutcome> {
        match self.aligner.align(plane.view(), reference) {
            Ok(aligned) => {
                info!("{} channel aligned", channel);
                Ok(AlignmentOutcome::Aligned(aligned))
            }
            Err(reason) if reason.is_recoverable() => {
                warn!("Alignment failed for {} channel: {}. Using unaligned channel.", channel, reason);
                let plane = if plane.dim() == reference.dim() {
                    plane
                } else {
                    debug!(from = ?plane.dim(), to = ?reference.dim(), "Fitting {} channel to reference grid", channel);
                    translate_onto(plane.view(), 0, 0, reference.dim())
                };
                Ok(AlignmentOutcome::Fallback { plane, reason })
            }
            Err(reason) => Err(PipelineError::Alignment(format!("{} channel: {}", channel, reason))),
        }
    }

    /// Blue is attempted before red; each attempt is independent.
    #[instrument(skip_all)]
    pub fn register(
        &self,
        red: Array2<f32>,
        green: Array2<f32>,
        blue: Array2<f32>,
    ) -> Result<RegisteredChannels> {
        let blue = self.align_channel(Channel::Blue, blue, green.view())?;
        let red = self.align_channel(Channel::Red, red, green.view())?;
        Ok(RegisteredChannels { red, green, blue })
    }
}
