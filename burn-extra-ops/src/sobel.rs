//! # Sobel Gradient Operator
//!
//! A fixed (non-learned) depthwise filter pair producing an edge-magnitude map.
//! The kernels are compile-time constants and are materialised on the input's
//! device at every call, so they never show up as trainable parameters.

use burn::{
    prelude::*,
    tensor::{module::conv2d, ops::ConvOptions},
};
use thiserror::Error;

/// Horizontal derivative kernel.
pub const SOBEL_X: [[f32; 3]; 3] = [[1.0, 0.0, -1.0], [2.0, 0.0, -2.0], [1.0, 0.0, -1.0]];

/// Vertical derivative kernel, the transpose of [`SOBEL_X`].
pub const SOBEL_Y: [[f32; 3]; 3] = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]];

/// Border handling applied before filtering.
#[derive(Config, Debug, PartialEq)]
pub enum SobelPadding {
    /// Zero padding. A constant image produces a response along the border.
    Zeros,
    /// Edge replication. A constant image produces exactly zero everywhere.
    Replicate,
}

/// Input whose channel count differs from the one the operator was built for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Sobel operator built for {expected} channels, got input of shape {actual:?}")]
pub struct ChannelMismatch {
    /// Configured channel count.
    pub expected: usize,
    /// Shape of the rejected input.
    pub actual: [usize; 4],
}

/// Configuration for the `Sobel` module.
#[derive(Config, Debug)]
pub struct SobelConfig {
    /// Number of channels filtered, one depthwise kernel pair each.
    pub channels: usize,
    /// Border handling.
    #[config(default = "SobelPadding::Replicate")]
    pub padding: SobelPadding,
}

impl SobelConfig {
    /// Initializes a new `Sobel` module.
    pub fn init<B: Backend>(&self) -> Sobel<B> {
        Sobel {
            channels: self.channels,
            replicate: self.padding == SobelPadding::Replicate,
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Depthwise Sobel operator: `|Gx * x| + |Gy * x|` per channel.
///
/// No cross-channel mixing and no bias.
#[derive(Module, Debug)]
pub struct Sobel<B: Backend> {
    channels: usize,
    replicate: bool,
    _phantom: std::marker::PhantomData<B>,
}

impl<B: Backend> Sobel<B> {
    /// Channel count the operator accepts.
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the configured border handling.
    pub const fn padding(&self) -> SobelPadding {
        if self.replicate {
            SobelPadding::Replicate
        } else {
            SobelPadding::Zeros
        }
    }

    /// Applies the operator.
    ///
    /// # Shapes
    /// - input: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, channels, height, width]`
    ///
    /// # Errors
    ///
    /// Returns `ChannelMismatch` if the input does not carry `channels` channels.
    pub fn forward(&self, x: Tensor<B, 4>) -> Result<Tensor<B, 4>, ChannelMismatch> {
        let dims = x.dims();
        if dims[1] != self.channels {
            return Err(ChannelMismatch {
                expected: self.channels,
                actual: dims,
            });
        }

        Ok(sobel_magnitude(x, self.replicate))
    }
}

/// Functional form of [`Sobel`].
pub fn sobel_magnitude<B: Backend>(x: Tensor<B, 4>, replicate: bool) -> Tensor<B, 4> {
    let [_, channels, _, _] = x.dims();
    let device = x.device();

    let (x, padding) = if replicate {
        (pad_replicate(x), 0)
    } else {
        (x, 1)
    };
    let options = ConvOptions::new([1, 1], [padding, padding], [1, 1], channels);

    let grad_x = conv2d(
        x.clone(),
        depthwise_kernel(SOBEL_X, channels, &device),
        None,
        options.clone(),
    );
    let grad_y = conv2d(
        x,
        depthwise_kernel(SOBEL_Y, channels, &device),
        None,
        options,
    );

    grad_x.abs() + grad_y.abs()
}

/// Broadcasts a 3x3 kernel to the `[channels, 1, 3, 3]` depthwise weight layout.
fn depthwise_kernel<B: Backend>(
    kernel: [[f32; 3]; 3],
    channels: usize,
    device: &B::Device,
) -> Tensor<B, 4> {
    Tensor::<B, 2>::from_floats(kernel, device)
        .reshape([1, 1, 3, 3])
        .repeat_dim(0, channels)
}

/// Pads one pixel on every side of the spatial dims by repeating the edge.
fn pad_replicate<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [_, _, height, width] = x.dims();

    let top = x.clone().narrow(2, 0, 1);
    let bottom = x.clone().narrow(2, height - 1, 1);
    let x = Tensor::cat(vec![top, x, bottom], 2);

    let left = x.clone().narrow(3, 0, 1);
    let right = x.clone().narrow(3, width - 1, 1);
    Tensor::cat(vec![left, x, right], 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    fn values(x: Tensor<TestBackend, 4>) -> Vec<f32> {
        x.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn constant_image_gives_zero_everywhere() {
        let device = Default::default();
        for channels in [1, 3, 16] {
            let sobel = SobelConfig::new(channels).init::<TestBackend>();

            for value in [0.0, 0.25, -3.0, 1000.0] {
                let x = Tensor::<TestBackend, 4>::full([2, channels, 7, 5], value, &device);
                let y = sobel.forward(x).unwrap();

                assert_eq!(y.dims(), [2, channels, 7, 5]);
                assert!(values(y).iter().all(|v| *v == 0.0));
            }
        }
    }

    #[test]
    fn zero_padding_keeps_interior_zero_on_constant_image() {
        let device = Default::default();
        let sobel = SobelConfig::new(1)
            .with_padding(SobelPadding::Zeros)
            .init::<TestBackend>();
        assert_eq!(sobel.padding(), SobelPadding::Zeros);

        let x = Tensor::<TestBackend, 4>::ones([1, 1, 6, 6], &device);
        let y = sobel.forward(x).unwrap();

        let interior = values(y.clone().narrow(2, 1, 4).narrow(3, 1, 4));
        assert!(interior.iter().all(|v| *v == 0.0));
        // border sees the zero padding
        assert!(values(y).iter().any(|v| *v != 0.0));
    }

    #[test]
    fn single_pixel_response_is_localized() {
        let device = Default::default();
        let sobel = SobelConfig::new(1).init::<TestBackend>();

        let (height, width) = (9, 9);
        let mut data = vec![0.5f32; height * width];
        data[4 * width + 4] = 1.5;
        let x = Tensor::<TestBackend, 1>::from_floats(data.as_slice(), &device)
            .reshape([1, 1, height, width]);

        let y = values(sobel.forward(x).unwrap());

        for row in 0..height {
            for col in 0..width {
                let v = y[row * width + col];
                let near = row.abs_diff(4) <= 1 && col.abs_diff(4) <= 1;
                if near && (row, col) != (4, 4) {
                    assert!(v > 0.0, "expected response at ({row}, {col})");
                }
                if !near {
                    assert_eq!(v, 0.0, "unexpected response at ({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn channels_are_filtered_independently() {
        let device = Default::default();
        let sobel = SobelConfig::new(2).init::<TestBackend>();

        let ramp = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 2.0, 3.0, 4.0], &device)
            .reshape([1, 1, 1, 5])
            .repeat_dim(2, 5);
        let flat = Tensor::<TestBackend, 4>::full([1, 1, 5, 5], 2.0, &device);
        let x = Tensor::cat(vec![flat, ramp], 1);

        let y = sobel.forward(x).unwrap();

        assert!(values(y.clone().narrow(1, 0, 1)).iter().all(|v| *v == 0.0));
        // interior of a unit ramp: |Gx| = 8, Gy = 0
        let ramp_out = values(y.narrow(1, 1, 1).narrow(2, 1, 3).narrow(3, 1, 3));
        assert!(ramp_out.iter().all(|v| (*v - 8.0).abs() < 1e-5));
    }

    #[test]
    fn output_is_non_negative() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::random([2, 4, 8, 8], Distribution::Normal(0.0, 1.0), &device);

        let y = sobel_magnitude(x, false);

        assert!(values(y).iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn rejects_unexpected_channel_count() {
        let device = Default::default();
        let sobel = SobelConfig::new(16).init::<TestBackend>();
        assert_eq!(sobel.channels(), 16);

        let x = Tensor::<TestBackend, 4>::zeros([2, 8, 4, 4], &device);

        assert_eq!(
            sobel.forward(x).unwrap_err(),
            ChannelMismatch {
                expected: 16,
                actual: [2, 8, 4, 4],
            }
        );
    }
}
