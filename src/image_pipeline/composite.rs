//! Color composite module
//!
//! Stacks three registered, tone-mapped channels into a clipped linear float
//! product and a balanced 8-bit display product.

mod balance;
mod compositor;
mod types;

pub use balance::{balance, quantize};
pub use compositor::Compositor;
pub use types::{BalanceMethod, Channel, CompositeImage};
