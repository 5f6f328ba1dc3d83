//! Channel registration module
//!
//! Aligns the red and blue planes onto the green reference. The alignment
//! algorithm sits behind the [`Aligner`] trait; failures fall back to the
//! unaligned plane instead of aborting the composite.

mod aligner;
mod phase_correlation;
mod registrar;

pub use aligner::{AlignError, Aligner};
pub use phase_correlation::{PhaseCorrelationAligner, translate, translate_onto};
pub use registrar::{AlignmentOutcome, RegisteredChannels, Registrar};
