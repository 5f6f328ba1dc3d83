use ndarray::{Array3, ArrayView2, Axis, stack};
use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::composite::balance::balance;
use crate::image_pipeline::composite::types::{BalanceMethod, Channel, CompositeImage};

/// Stacks registered channels into the linear and display products.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor {
    balance: BalanceMethod,
}

impl Compositor {
    pub fn new(balance: BalanceMethod) -> Self {
        Self { balance }
    }

    pub fn balance_method(&self) -> BalanceMethod {
        self.balance
    }

    #[instrument(skip_all, fields(method = ?self.balance))]
    pub fn compose<'a>(
        &self,
        red: ArrayView2<'a, f32>,
        green: ArrayView2<'a, f32>,
        blue: ArrayView2<'a, f32>,
    ) -> Result<CompositeImage> {
        check_shapes(red, green, blue)?;

        let linear = stack_linear(red, green, blue)?;
        let display = balance(self.balance, red, green, blue)?;
        debug!(shape = ?linear.dim(), "Composite stacked");

        Ok(CompositeImage { linear, display })
    }
}

/// Every channel must match the green reference's shape.
fn check_shapes<'a>(red: ArrayView2<'a, f32>, green: ArrayView2<'a, f32>, blue: ArrayView2<'a, f32>) -> Result<()> {
    let expected = green.dim();
    for (channel, plane) in [(Channel::Red, red), (Channel::Blue, blue)] {
        if plane.dim() != expected {
            return Err(PipelineError::ChannelShapeMismatch {
                channel: channel.to_string(),
                expected,
                found: plane.dim(),
            });
        }
    }
    Ok(())
}

/// `(height, width, 3)` float stack with every sample clipped to `[0, 1]`.
fn stack_linear<'a>(
    red: ArrayView2<'a, f32>,
    green: ArrayView2<'a, f32>,
    blue: ArrayView2<'a, f32>,
) -> Result<Array3<f32>> {
    let mut rgb = stack(Axis(2), &[red, green, blue])
        .map_err(|_| PipelineError::InvalidDimensions(green.shape().to_vec()))?;
    rgb.mapv_inplace(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) });
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn gray_channels_give_gray_composite() {
        let plane = Array2::from_elem((100, 100), 0.4f32);
        let image = Compositor::default()
            .compose(plane.view(), plane.view(), plane.view())
            .unwrap();

        assert_eq!(image.linear.dim(), (100, 100, 3));
        assert_eq!(image.display.dim(), (100, 100, 3));
        assert_eq!(image.dimensions(), (100, 100));
        assert!(image.linear.iter().all(|&v| v == 0.4));
        let first = image.display[[0, 0, 0]];
        assert!(image.display.iter().all(|&v| v == first));
    }

    #[test]
    fn linear_product_is_clipped() {
        let red = Array2::from_elem((3, 3), 1.7f32);
        let green = Array2::from_elem((3, 3), -0.2f32);
        let mut blue = Array2::from_elem((3, 3), 0.25f32);
        blue[[1, 1]] = f32::NAN;

        let image = Compositor::new(BalanceMethod::Clip)
            .compose(red.view(), green.view(), blue.view())
            .unwrap();

        assert_eq!(image.linear[[0, 0, 0]], 1.0);
        assert_eq!(image.linear[[0, 0, 1]], 0.0);
        assert_eq!(image.linear[[0, 0, 2]], 0.25);
        assert_eq!(image.linear[[1, 1, 2]], 0.0);
        assert_eq!(image.display[[0, 0, 0]], 255);
        assert_eq!(image.display[[0, 0, 1]], 0);
    }

    #[test]
    fn channel_order_is_red_green_blue() {
        let red = Array2::from_elem((2, 2), 0.1f32);
        let green = Array2::from_elem((2, 2), 0.5f32);
        let blue = Array2::from_elem((2, 2), 0.9f32);
        let image = Compositor::new(BalanceMethod::Clip)
            .compose(red.view(), green.view(), blue.view())
            .unwrap();
        assert_eq!(image.linear[[1, 0, 0]], 0.1);
        assert_eq!(image.linear[[1, 0, 1]], 0.5);
        assert_eq!(image.linear[[1, 0, 2]], 0.9);
    }

    #[test]
    fn mismatched_blue_is_named() {
        let green = Array2::<f32>::zeros((8, 8));
        let blue = Array2::<f32>::zeros((8, 9));
        let result = Compositor::default().compose(green.view(), green.view(), blue.view());

        match result {
            Err(PipelineError::ChannelShapeMismatch {
                channel,
                expected,
                found,
            }) => {
                assert_eq!(channel, "Blue");
                assert_eq!(expected, (8, 8));
                assert_eq!(found, (8, 9));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
