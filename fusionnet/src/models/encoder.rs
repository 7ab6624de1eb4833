//! # Encoder Tower
//!
//! One modality's encoder: an entry convolution followed by two fusion blocks.
//! The network builds two towers from the same configuration, so they share
//! topology but never parameters.

use burn::prelude::*;
use burn_extra_ops::SobelPadding;

use super::modules::{ConvLeakyRelu2d, ConvLeakyRelu2dConfig, RGBDConfig, RGBD};
use crate::config::{ENCODER_CHANNELS, TOWER_INPUT_CHANNELS};
use crate::error::FusionResult;

/// Configuration for the `EncoderTower` module.
#[derive(Config, Debug)]
pub struct EncoderTowerConfig {
    /// Stage widths: entry, first fusion block, second fusion block.
    #[config(default = "ENCODER_CHANNELS")]
    pub channels: [usize; 3],
    /// Border handling of the fusion blocks' gradient branch.
    #[config(default = "SobelPadding::Replicate")]
    pub sobel_padding: SobelPadding,
}

impl EncoderTowerConfig {
    /// Initializes a new `EncoderTower` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<EncoderTower<B>> {
        let [c0, c1, c2] = self.channels;

        Ok(EncoderTower {
            conv: ConvLeakyRelu2dConfig::new(TOWER_INPUT_CHANNELS, c0).init(device)?,
            rgbd1: RGBDConfig::new(c0, c1)
                .with_sobel_padding(self.sobel_padding.clone())
                .init(device)?,
            rgbd2: RGBDConfig::new(c1, c2)
                .with_sobel_padding(self.sobel_padding.clone())
                .init(device)?,
        })
    }
}

/// Single-modality encoder.
#[derive(Module, Debug)]
pub struct EncoderTower<B: Backend> {
    pub(crate) conv: ConvLeakyRelu2d<B>,
    pub(crate) rgbd1: RGBD<B>,
    pub(crate) rgbd2: RGBD<B>,
}

impl<B: Backend> EncoderTower<B> {
    /// Returns every stage's output, shallowest first.
    ///
    /// # Shapes
    /// - input: `[batch_size, 1, height, width]`
    /// - output: `[batch_size, c_i, height, width]` for each stage width `c_i`
    pub fn forward_features(&self, x: Tensor<B, 4>) -> FusionResult<[Tensor<B, 4>; 3]> {
        let x0 = self.conv.forward(x)?;
        let x1 = self.rgbd1.forward(x0.clone())?;
        let x2 = self.rgbd2.forward(x1.clone())?;

        Ok([x0, x1, x2])
    }

    /// Returns the deepest feature map.
    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        let x = self.conv.forward(x)?;
        let x = self.rgbd1.forward(x)?;

        self.rgbd2.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    #[test]
    fn pyramid_follows_channel_schedule() {
        let device = Default::default();
        let tower = EncoderTowerConfig::new().init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::random([2, 1, 9, 6], Distribution::Uniform(0.0, 1.0), &device);

        let [x0, x1, x2] = tower.forward_features(x.clone()).unwrap();

        assert_eq!(x0.dims(), [2, 16, 9, 6]);
        assert_eq!(x1.dims(), [2, 32, 9, 6]);
        assert_eq!(x2.dims(), [2, 48, 9, 6]);

        let deepest = tower.forward(x).unwrap();
        let diff = (deepest - x2).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }

    #[test]
    fn towers_do_not_share_parameters() {
        let device = Default::default();
        let config = EncoderTowerConfig::new();
        let vis = config.init::<TestBackend>(&device).unwrap();
        let inf = config.init::<TestBackend>(&device).unwrap();

        assert_ne!(vis.conv.conv.weight.id, inf.conv.conv.weight.id);

        let x = Tensor::<TestBackend, 4>::random([1, 1, 5, 5], Distribution::Uniform(0.0, 1.0), &device);
        let diff = (vis.forward(x.clone()).unwrap() - inf.forward(x).unwrap())
            .abs()
            .max()
            .into_scalar();
        assert!(diff > 0.0);
    }

    #[test]
    fn rejects_multi_channel_input() {
        let device = Default::default();
        let tower = EncoderTowerConfig::new().init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 4, 4], &device);

        assert!(tower.forward(x).is_err());
    }
}
