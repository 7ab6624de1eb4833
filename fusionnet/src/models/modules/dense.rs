//! # Dense Feature Block
//!
//! Grows channel depth by concatenation: `C -> 2C -> 3C`, with newly computed
//! features always appended after the ones they were computed from.

use burn::prelude::*;

use super::convs::{ConvLeakyRelu2d, ConvLeakyRelu2dConfig};
use super::utils::expect_channels;
use crate::error::FusionResult;

/// Configuration for the `DenseBlock` module.
#[derive(Config, Debug)]
pub struct DenseBlockConfig {
    /// Number of input channels.
    pub channels: usize,
}

impl DenseBlockConfig {
    /// Initializes a new `DenseBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<DenseBlock<B>> {
        Ok(DenseBlock {
            conv1: ConvLeakyRelu2dConfig::new(self.channels, self.channels).init(device)?,
            conv2: ConvLeakyRelu2dConfig::new(2 * self.channels, self.channels).init(device)?,
            channels: self.channels,
        })
    }
}

/// Two-stage dense concatenation block.
#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    pub(crate) conv1: ConvLeakyRelu2d<B>,
    pub(crate) conv2: ConvLeakyRelu2d<B>,
    channels: usize,
}

impl<B: Backend> DenseBlock<B> {
    /// Input channel count.
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// # Shapes
    /// - input: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, 3 * channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        expect_channels("DenseBlock", &x, self.channels)?;

        let x = Tensor::cat(vec![x.clone(), self.conv1.forward(x)?], 1);
        let x = Tensor::cat(vec![x.clone(), self.conv2.forward(x)?], 1);

        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    #[test]
    fn output_has_three_times_the_channels() {
        let device = Default::default();

        for channels in [1, 2, 5, 16] {
            let block = DenseBlockConfig::new(channels)
                .init::<TestBackend>(&device)
                .unwrap();
            let x = Tensor::<TestBackend, 4>::random(
                [2, channels, 6, 5],
                Distribution::Uniform(0.0, 1.0),
                &device,
            );

            let y = block.forward(x).unwrap();

            assert_eq!(y.dims(), [2, 3 * channels, 6, 5]);
        }
    }

    #[test]
    fn input_features_come_first() {
        let device = Default::default();
        let block = DenseBlockConfig::new(3).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::random([1, 3, 4, 4], Distribution::Normal(0.0, 1.0), &device);

        let y = block.forward(x.clone()).unwrap();

        let head = y.clone().narrow(1, 0, 3).into_data().to_vec::<f32>().unwrap();
        assert_eq!(head, x.clone().into_data().to_vec::<f32>().unwrap());

        let stage1 = block.conv1.forward(x).unwrap();
        let middle = y.narrow(1, 3, 3).into_data().to_vec::<f32>().unwrap();
        assert_eq!(middle, stage1.into_data().to_vec::<f32>().unwrap());
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let device = Default::default();
        let block = DenseBlockConfig::new(4).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::zeros([1, 2, 4, 4], &device);

        assert!(block.forward(x).is_err());
    }
}
