//! # FusionNet Model Implementation
//!
//! This module defines the main `FusionNet` model, which encodes a visible and an
//! infrared image with two independent towers and decodes their deepest features
//! into a single fused grayscale image.
//!
//! ## Core Components
//!
//! - `FusionNetConfig`: A configuration struct to initialize the `FusionNet` model.
//! - `FusionNet`: The main model struct, which validates the input pair and
//!   orchestrates the forward pass through both towers and the decoder.

use burn::prelude::*;

use super::{Decoder, DecoderConfig, EncoderTower, EncoderTowerConfig};
use crate::{
    config::{ModelConfig, FUSED_CHANNELS, TOWER_INPUT_CHANNELS},
    error::{FusionError, FusionResult},
};

/// Configuration for the `FusionNet` model.
#[derive(Config, Debug)]
pub struct FusionNetConfig {
    /// The detailed model configuration.
    config: ModelConfig,
}

impl FusionNetConfig {
    /// Initializes a `FusionNet` model with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `device` - The device to create the model on.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> FusionResult<FusionNet<B>> {
        self.config.validate()?;

        if self.config.output != FUSED_CHANNELS {
            tracing::warn!(
                requested = self.config.output,
                built = FUSED_CHANNELS,
                "output channel count is fixed, ignoring requested value"
            );
        }

        let tower = EncoderTowerConfig::new()
            .with_channels(self.config.encoder_channels())
            .with_sobel_padding(self.config.sobel_padding.clone());
        let decoder = DecoderConfig::new()
            .with_encoder_channels(self.config.encoder_channels())
            .with_output(self.config.output_channels());

        let model = FusionNet {
            vis: tower.init(device)?,
            inf: tower.init(device)?,
            decoder: decoder.init(device)?,
        };

        let summary = model.summary();
        tracing::debug!(
            params = summary.total_params(),
            running_stats = summary.total_buffers(),
            sobel_padding = ?self.config.sobel_padding,
            "fusion network initialized"
        );

        Ok(model)
    }
}

/// The main FusionNet model.
#[derive(Module, Debug)]
pub struct FusionNet<B: Backend> {
    /// The visible-light encoder tower.
    pub(crate) vis: EncoderTower<B>,
    /// The infrared encoder tower.
    pub(crate) inf: EncoderTower<B>,
    /// The decoder merging both towers.
    pub(crate) decoder: Decoder<B>,
}

impl<B: Backend> FusionNet<B> {
    /// Fuses a visible and an infrared image.
    ///
    /// Only channel 0 of the visible image is used.
    ///
    /// # Arguments
    ///
    /// * `image_vis` - Visible image of shape `[B, C >= 1, H, W]`.
    /// * `image_ir` - Infrared image of shape `[B, 1, H, W]`.
    ///
    /// # Returns
    ///
    /// The fused image of shape `[B, 1, H, W]` with values in `(0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTensorShape` if the inputs are incompatible.
    pub fn fuse(&self, image_vis: Tensor<B, 4>, image_ir: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        check_inputs(image_vis.dims(), image_ir.dims())?;

        let x_vis = image_vis.narrow(1, 0, TOWER_INPUT_CHANNELS);

        let x_vis = self.vis.forward(x_vis)?;
        let x_inf = self.inf.forward(image_ir)?;

        self.decoder.forward(x_vis, x_inf)
    }

    /// Same as [`FusionNet::fuse`].
    pub fn forward(&self, image_vis: Tensor<B, 4>, image_ir: Tensor<B, 4>) -> FusionResult<Tensor<B, 4>> {
        self.fuse(image_vis, image_ir)
    }

    /// Runs both towers and returns their feature pyramids, shallowest first.
    pub fn forward_enc(
        &self,
        image_vis: Tensor<B, 4>,
        image_ir: Tensor<B, 4>,
    ) -> FusionResult<([Tensor<B, 4>; 3], [Tensor<B, 4>; 3])> {
        check_inputs(image_vis.dims(), image_ir.dims())?;

        let vis = self
            .vis
            .forward_features(image_vis.narrow(1, 0, TOWER_INPUT_CHANNELS))?;
        let inf = self.inf.forward_features(image_ir)?;

        Ok((vis, inf))
    }
}

fn check_inputs(vis: [usize; 4], ir: [usize; 4]) -> FusionResult<()> {
    let [vb, vc, vh, vw] = vis;
    let [ib, ic, ih, iw] = ir;

    let mismatch = |expected: String, actual: [usize; 4]| FusionError::InvalidTensorShape {
        layer: "FusionNet".to_string(),
        expected,
        actual: format!("{actual:?}"),
    };

    if vc < TOWER_INPUT_CHANNELS || vh == 0 || vw == 0 || vb == 0 {
        return Err(mismatch("visible [B >= 1, C >= 1, H >= 1, W >= 1]".into(), vis));
    }
    if ic != TOWER_INPUT_CHANNELS {
        return Err(mismatch(
            format!("infrared [B, {TOWER_INPUT_CHANNELS}, H, W]"),
            ir,
        ));
    }
    if (ib, ih, iw) != (vb, vh, vw) {
        return Err(mismatch(format!("infrared [{vb}, 1, {vh}, {vw}]"), ir));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    fn model() -> FusionNet<TestBackend> {
        FusionNetConfig::new(ModelConfig::new())
            .init(&Default::default())
            .unwrap()
    }

    fn image(shape: [usize; 4]) -> Tensor<TestBackend, 4> {
        Tensor::random(shape, Distribution::Uniform(0.0, 1.0), &Default::default())
    }

    fn values(x: Tensor<TestBackend, 4>) -> Vec<f32> {
        x.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn fused_image_has_one_channel_and_same_size() {
        let model = model();

        let y = model.fuse(image([2, 3, 12, 10]), image([2, 1, 12, 10])).unwrap();

        assert_eq!(y.dims(), [2, 1, 12, 10]);
        assert!(values(y).iter().all(|v| *v > 0.0 && *v < 1.0));
    }

    #[test]
    fn forward_is_deterministic() {
        let model = model();
        let vis = image([1, 1, 8, 8]);
        let ir = image([1, 1, 8, 8]);

        let a = values(model.forward(vis.clone(), ir.clone()).unwrap());
        let b = values(model.forward(vis, ir).unwrap());

        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() <= 1e-6);
        }
    }

    #[test]
    fn only_first_visible_channel_matters() {
        let model = model();
        let vis = image([1, 3, 6, 6]);
        let ir = image([1, 1, 6, 6]);
        let altered = Tensor::cat(
            vec![vis.clone().narrow(1, 0, 1), image([1, 2, 6, 6])],
            1,
        );

        let a = values(model.fuse(vis, ir.clone()).unwrap());
        let b = values(model.fuse(altered, ir).unwrap());

        assert_eq!(a, b);
    }

    #[test]
    fn encoder_pyramids_keep_resolution() {
        let model = model();

        let (vis, inf) = model
            .forward_enc(image([1, 3, 7, 5]), image([1, 1, 7, 5]))
            .unwrap();

        for (features, channels) in [(vis, [16, 32, 48]), (inf, [16, 32, 48])] {
            for (x, c) in features.iter().zip(channels) {
                assert_eq!(x.dims(), [1, c, 7, 5]);
            }
        }
    }

    #[test]
    fn requested_output_channels_are_ignored() {
        let model = FusionNetConfig::new(ModelConfig::new().with_output(3))
            .init::<TestBackend>(&Default::default())
            .unwrap();

        let y = model.fuse(image([1, 1, 4, 4]), image([1, 1, 4, 4])).unwrap();

        assert_eq!(y.dims(), [1, 1, 4, 4]);
    }

    #[test]
    fn rejects_multi_channel_infrared() {
        let model = model();

        match model.fuse(image([1, 3, 4, 4]), image([1, 3, 4, 4])) {
            Err(FusionError::InvalidTensorShape { layer, expected, .. }) => {
                assert_eq!(layer, "FusionNet");
                assert!(expected.contains("infrared"));
            }
            _ => panic!("Expected InvalidTensorShape error"),
        }
    }

    #[test]
    fn rejects_mismatched_resolution() {
        let model = model();

        assert!(model.fuse(image([1, 1, 4, 4]), image([1, 1, 4, 5])).is_err());
        assert!(model.fuse(image([1, 1, 4, 4]), image([2, 1, 4, 4])).is_err());
    }

    #[test]
    fn zero_output_configuration_fails() {
        let result = FusionNetConfig::new(ModelConfig::new().with_output(0))
            .init::<TestBackend>(&Default::default());

        assert!(matches!(result, Err(FusionError::InvalidConfiguration { .. })));
    }

    #[test]
    #[ignore = "full 640x480 forward pass on the CPU backend is slow"]
    fn full_resolution_pair() {
        let model = model();

        let y = model
            .fuse(image([2, 3, 640, 480]), image([2, 1, 640, 480]))
            .unwrap();

        assert_eq!(y.dims(), [2, 1, 640, 480]);
        assert!(values(y).iter().all(|v| *v > 0.0 && *v < 1.0));
    }
}
