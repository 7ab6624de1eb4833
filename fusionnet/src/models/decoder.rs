//! # Decoder
//!
//! Merges the two deepest encoder maps and halves the channel width stage by
//! stage down to the fused image. There are no skip connections.

use burn::prelude::*;

use super::modules::{
    ConvBnLeakyRelu2d, ConvBnLeakyRelu2dConfig, ConvBnTanh2d, ConvBnTanh2dConfig,
};
use super::modules::utils::expect_channels;
use crate::config::{ENCODER_CHANNELS, FUSED_CHANNELS};
use crate::error::{FusionError, FusionResult};

/// Configuration for the `Decoder` module.
#[derive(Config, Debug)]
pub struct DecoderConfig {
    /// Encoder widths the decoder mirrors.
    #[config(default = "ENCODER_CHANNELS")]
    pub encoder_channels: [usize; 3],
    /// Fused image channels.
    #[config(default = "FUSED_CHANNELS")]
    pub output: usize,
}

impl DecoderConfig {
    /// Stage widths: `[c2 + c2, c1 + c1, c0 + c0, c0, output]`.
    pub const fn channels(&self) -> [usize; 5] {
        let [c0, c1, c2] = self.encoder_channels;
        [c2 * 2, c1 * 2, c0 * 2, c0, self.output]
    }

    /// Initializes a new `Decoder` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<Decoder<B>> {
        if self.output == 0 {
            return Err(FusionError::config("Decoder output channels must be positive"));
        }
        let [c4, c3, c2, c1, out] = self.channels();

        Ok(Decoder {
            decode4: ConvBnLeakyRelu2dConfig::new(c4, c3).init(device)?,
            decode3: ConvBnLeakyRelu2dConfig::new(c3, c2).init(device)?,
            decode2: ConvBnLeakyRelu2dConfig::new(c2, c1).init(device)?,
            decode1: ConvBnTanh2dConfig::new(c1, out).init(device)?,
            in_channels: c4,
        })
    }
}

/// Channel-reducing decoder cascade.
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub(crate) decode4: ConvBnLeakyRelu2d<B>,
    pub(crate) decode3: ConvBnLeakyRelu2d<B>,
    pub(crate) decode2: ConvBnLeakyRelu2d<B>,
    pub(crate) decode1: ConvBnTanh2d<B>,
    in_channels: usize,
}

impl<B: Backend> Decoder<B> {
    /// Decodes the visible and infrared feature maps into the fused image.
    ///
    /// # Shapes
    /// - vis, inf: `[batch_size, c, height, width]` with `2c` equal to the decoder input width
    /// - output: `[batch_size, output, height, width]`, values in `(0, 1)`
    pub fn forward(&self, vis: Tensor<B, 4>, inf: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        let [vb, _, vh, vw] = vis.dims();
        let [ib, _, ih, iw] = inf.dims();
        if (vb, vh, vw) != (ib, ih, iw) {
            return Err(FusionError::InvalidTensorShape {
                layer: "Decoder".to_string(),
                expected: format!("[{vb}, C, {vh}, {vw}]"),
                actual: format!("{:?}", inf.dims()),
            });
        }

        let x = Tensor::cat(vec![vis, inf], 1);
        expect_channels("Decoder", &x, self.in_channels)?;

        let x = self.decode4.forward(x)?;
        let x = self.decode3.forward(x)?;
        let x = self.decode2.forward(x)?;

        self.decode1.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    #[test]
    fn default_schedule() {
        assert_eq!(DecoderConfig::new().channels(), [96, 64, 32, 16, 1]);
    }

    #[test]
    fn decodes_to_single_bounded_channel() {
        let device = Default::default();
        let decoder = DecoderConfig::new().init::<TestBackend>(&device).unwrap();
        let vis = Tensor::<TestBackend, 4>::random([2, 48, 4, 6], Distribution::Uniform(0.0, 1.0), &device);
        let inf = Tensor::<TestBackend, 4>::random([2, 48, 4, 6], Distribution::Uniform(0.0, 1.0), &device);

        let y = decoder.forward(vis, inf).unwrap();

        assert_eq!(y.dims(), [2, 1, 4, 6]);
        let values = y.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| *v > 0.0 && *v < 1.0));
    }

    #[test]
    fn rejects_wrong_feature_width() {
        let device = Default::default();
        let decoder = DecoderConfig::new().init::<TestBackend>(&device).unwrap();
        let vis = Tensor::<TestBackend, 4>::zeros([1, 32, 4, 4], &device);
        let inf = Tensor::<TestBackend, 4>::zeros([1, 32, 4, 4], &device);

        match decoder.forward(vis, inf) {
            Err(FusionError::InvalidTensorShape { layer, .. }) => assert_eq!(layer, "Decoder"),
            _ => panic!("Expected InvalidTensorShape error"),
        }
    }

    #[test]
    fn rejects_zero_output() {
        let device = Default::default();

        assert!(DecoderConfig::new()
            .with_output(0)
            .init::<TestBackend>(&device)
            .is_err());
    }
}
