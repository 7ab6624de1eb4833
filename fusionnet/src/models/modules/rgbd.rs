//! # Dual-Path Fusion Block
//!
//! `RGBD` runs two branches on the same input and merges them:
//!
//! - dense path: `DenseBlock` (in -> 3·in) then a 1x1 projection to `out_channels`;
//! - gradient path: the fixed Sobel operator (in -> in) then a 1x1 projection to `out_channels`.
//!
//! The sum goes through a leaky ReLU with slope 0.1.

use burn::{prelude::*, tensor::activation::leaky_relu};
use burn_extra_ops::{Sobel, SobelConfig, SobelPadding};

use super::convs::{Conv1, Conv1Config};
use super::dense::{DenseBlock, DenseBlockConfig};
use super::utils::expect_channels;
use crate::error::FusionResult;

/// Negative slope applied after the branch merge.
pub const MERGE_NEGATIVE_SLOPE: f64 = 0.1;

/// Configuration for the `RGBD` module.
#[derive(Config, Debug)]
pub struct RGBDConfig {
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    /// Border handling of the gradient branch.
    #[config(default = "SobelPadding::Replicate")]
    pub sobel_padding: SobelPadding,
}

impl RGBDConfig {
    /// Initializes a new `RGBD` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<RGBD<B>> {
        let dense = DenseBlockConfig::new(self.in_channels).init(device)?;
        let convdown = Conv1Config::new(3 * self.in_channels, self.out_channels).init(device)?;
        let sobelconv = SobelConfig::new(self.in_channels)
            .with_padding(self.sobel_padding.clone())
            .init();
        let convup = Conv1Config::new(self.in_channels, self.out_channels).init(device)?;

        Ok(RGBD {
            dense,
            convdown,
            sobelconv,
            convup,
        })
    }
}

/// Fusion block combining dense features and gradient magnitude.
#[derive(Module, Debug)]
pub struct RGBD<B: Backend> {
    pub(crate) dense: DenseBlock<B>,
    pub(crate) convdown: Conv1<B>,
    pub(crate) sobelconv: Sobel<B>,
    pub(crate) convup: Conv1<B>,
}

impl<B: Backend> RGBD<B> {
    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, out_channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        expect_channels("RGBD", &x, self.dense.channels())?;

        let dense = self.convdown.forward(self.dense.forward(x.clone())?)?;
        let gradient = self.convup.forward(self.sobelconv.forward(x)?)?;

        Ok(leaky_relu(dense + gradient, MERGE_NEGATIVE_SLOPE))
    }
}
