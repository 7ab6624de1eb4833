//! # Convolutional Primitives
//!
//! Each primitive wraps exactly one learned convolution followed by an optional
//! batch norm and a fixed activation. All of them preserve spatial size.

use burn::{
    nn::{conv::Conv2d, BatchNorm, BatchNormConfig},
    prelude::*,
    tensor::activation::leaky_relu,
};
use burn_extra_ops::squash;

use super::utils::{expect_channels, ConvGeometry};
use crate::error::FusionResult;

/// Negative slope used after every convolution.
pub const CONV_NEGATIVE_SLOPE: f64 = 0.2;

/// Configuration for the `ConvBnLeakyRelu2d` module.
#[derive(Config, Debug)]
pub struct ConvBnLeakyRelu2dConfig {
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    #[config(default = "3")]
    pub kernel_size: usize,
    #[config(default = "1")]
    pub padding: usize,
    #[config(default = "1")]
    pub stride: usize,
    #[config(default = "1")]
    pub dilation: usize,
    #[config(default = "1")]
    pub groups: usize,
}

impl ConvBnLeakyRelu2dConfig {
    /// Initializes a new `ConvBnLeakyRelu2d` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<ConvBnLeakyRelu2d<B>> {
        let conv = ConvGeometry {
            in_channels: self.in_channels,
            out_channels: self.out_channels,
            kernel_size: self.kernel_size,
            padding: self.padding,
            stride: self.stride,
            dilation: self.dilation,
            groups: self.groups,
        }
        .init(ConvBnLeakyRelu2d::<B>::NAME, device)?;

        Ok(ConvBnLeakyRelu2d {
            conv,
            bn: BatchNormConfig::new(self.out_channels).init(device),
        })
    }
}

/// Convolution, batch normalization, leaky ReLU (slope 0.2).
#[derive(Module, Debug)]
pub struct ConvBnLeakyRelu2d<B: Backend> {
    pub(crate) conv: Conv2d<B>,
    pub(crate) bn: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBnLeakyRelu2d<B> {
    pub(crate) const NAME: &'static str = "ConvBnLeakyRelu2d";

    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, out_channels, height, width]`
    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        expect_channels(Self::NAME, &x, ConvGeometry::of(&self.conv).in_channels)?;
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);

        Ok(leaky_relu(x, CONV_NEGATIVE_SLOPE))
    }
}

/// Configuration for the `ConvBnTanh2d` module.
#[derive(Config, Debug)]
pub struct ConvBnTanh2dConfig {
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    #[config(default = "3")]
    pub kernel_size: usize,
    #[config(default = "1")]
    pub padding: usize,
    #[config(default = "1")]
    pub stride: usize,
    #[config(default = "1")]
    pub dilation: usize,
    #[config(default = "1")]
    pub groups: usize,
}

impl ConvBnTanh2dConfig {
    /// Initializes a new `ConvBnTanh2d` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<ConvBnTanh2d<B>> {
        let conv = ConvGeometry {
            in_channels: self.in_channels,
            out_channels: self.out_channels,
            kernel_size: self.kernel_size,
            padding: self.padding,
            stride: self.stride,
            dilation: self.dilation,
            groups: self.groups,
        }
        .init(ConvBnTanh2d::<B>::NAME, device)?;

        Ok(ConvBnTanh2d {
            conv,
            bn: BatchNormConfig::new(self.out_channels).init(device),
        })
    }
}

/// Convolution, batch normalization, then `tanh(x) / 2 + 0.5`.
#[derive(Module, Debug)]
pub struct ConvBnTanh2d<B: Backend> {
    pub(crate) conv: Conv2d<B>,
    pub(crate) bn: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBnTanh2d<B> {
    pub(crate) const NAME: &'static str = "ConvBnTanh2d";

    /// # Shapes
    /// - input: `[batch_size, in_channels, height, width]`
    /// - output: `[batch_size, out_channels, height, width]`, values in `(0, 1)`
    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        expect_channels(Self::NAME, &x, ConvGeometry::of(&self.conv).in_channels)?;
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);

        Ok(squash(x))
    }
}

/// Configuration for the `ConvLeakyRelu2d` module.
#[derive(Config, Debug)]
pub struct ConvLeakyRelu2dConfig {
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    #[config(default = "3")]
    pub kernel_size: usize,
    #[config(default = "1")]
    pub padding: usize,
    #[config(default = "1")]
    pub stride: usize,
    #[config(default = "1")]
    pub dilation: usize,
    #[config(default = "1")]
    pub groups: usize,
}

impl ConvLeakyRelu2dConfig {
    /// Initializes a new `ConvLeakyRelu2d` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<ConvLeakyRelu2d<B>> {
        let conv = ConvGeometry {
            in_channels: self.in_channels,
            out_channels: self.out_channels,
            kernel_size: self.kernel_size,
            padding: self.padding,
            stride: self.stride,
            dilation: self.dilation,
            groups: self.groups,
        }
        .init(ConvLeakyRelu2d::<B>::NAME, device)?;

        Ok(ConvLeakyRelu2d { conv })
    }
}

/// Convolution followed by leaky ReLU (slope 0.2), no normalization.
#[derive(Module, Debug)]
pub struct ConvLeakyRelu2d<B: Backend> {
    pub(crate) conv: Conv2d<B>,
}

impl<B: Backend> ConvLeakyRelu2d<B> {
    pub(crate) const NAME: &'static str = "ConvLeakyRelu2d";

    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        expect_channels(Self::NAME, &x, ConvGeometry::of(&self.conv).in_channels)?;

        Ok(leaky_relu(self.conv.forward(x), CONV_NEGATIVE_SLOPE))
    }
}

/// Configuration for the `Conv1` channel projector.
#[derive(Config, Debug)]
pub struct Conv1Config {
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    #[config(default = "1")]
    pub kernel_size: usize,
    #[config(default = "0")]
    pub padding: usize,
    #[config(default = "1")]
    pub stride: usize,
    #[config(default = "1")]
    pub dilation: usize,
    #[config(default = "1")]
    pub groups: usize,
}

impl Conv1Config {
    /// Initializes a new `Conv1` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<Conv1<B>> {
        let conv = ConvGeometry {
            in_channels: self.in_channels,
            out_channels: self.out_channels,
            kernel_size: self.kernel_size,
            padding: self.padding,
            stride: self.stride,
            dilation: self.dilation,
            groups: self.groups,
        }
        .init(Conv1::<B>::NAME, device)?;

        Ok(Conv1 { conv })
    }
}

/// Bare convolution, 1x1 by default: changes channel count without spatial mixing.
#[derive(Module, Debug)]
pub struct Conv1<B: Backend> {
    pub(crate) conv: Conv2d<B>,
}

impl<B: Backend> Conv1<B> {
    pub(crate) const NAME: &'static str = "Conv1";

    pub fn forward(&self, x: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        expect_channels(Self::NAME, &x, ConvGeometry::of(&self.conv).in_channels)?;

        Ok(self.conv.forward(x))
    }
}
