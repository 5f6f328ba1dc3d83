//! Composite types

use std::fmt;

use ndarray::Array3;

/// Color channel of a three-filter composite; green is the registration reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    /// Channels in composite (R, G, B) order
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
    pub const REFERENCE: Channel = Channel::Green;
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        };
        f.write_str(name)
    }
}

/// Algorithm used to balance channels before 8-bit quantization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceMethod {
    /// Stretch each channel between its own lower/upper percentile so black
    /// and white points coincide across channels
    PercentileMatch { lower: f64, upper: f64 },
    /// Scale each channel so its mean equals the average of the channel means
    GrayWorld,
    /// Clip and quantize without any balancing
    Clip,
}

impl Default for BalanceMethod {
    fn default() -> Self {
        BalanceMethod::PercentileMatch {
            lower: 0.5,
            upper: 99.5,
        }
    }
}

/// The two composite products, both `(height, width, 3)` in R, G, B order
#[derive(Debug, Clone)]
pub struct CompositeImage {
    /// Clipped linear float product
    pub linear: Array3<f32>,
    /// Balanced 8-bit display product
    pub display: Array3<u8>,
}

impl CompositeImage {
    pub fn dimensions(&self) -> (usize, usize) {
        let (height, width, _) = self.linear.dim();
        (height, width)
    }
}
