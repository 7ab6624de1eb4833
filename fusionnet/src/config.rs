//! Model-level configuration and the fixed channel schedule.

use burn::prelude::*;
use burn_extra_ops::SobelPadding;

use crate::error::{FusionError, FusionResult};

/// Encoder stage widths, shared by the visible and infrared towers.
pub const ENCODER_CHANNELS: [usize; 3] = [16, 32, 48];

/// Channel count of the fused image.
pub const FUSED_CHANNELS: usize = 1;

/// Channel count each tower consumes from its modality.
pub const TOWER_INPUT_CHANNELS: usize = 1;

/// Main configuration for the fusion network.
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Requested output channel count.
    ///
    /// Accepted for compatibility with existing configurations; the network
    /// always produces [`FUSED_CHANNELS`] channels.
    #[config(default = "1")]
    pub output: usize,
    /// Border handling of the Sobel operator inside every fusion block.
    #[config(default = "SobelPadding::Replicate")]
    pub sobel_padding: SobelPadding,
}

impl ModelConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the requested output channel count is zero.
    pub fn validate(&self) -> FusionResult<()> {
        if self.output == 0 {
            return Err(FusionError::config(
                "Output channel count must be positive, got 0",
            ));
        }

        Ok(())
    }

    /// Output channel count actually built.
    pub const fn output_channels(&self) -> usize {
        FUSED_CHANNELS
    }

    /// Encoder widths: entry, first fusion block, second fusion block.
    pub const fn encoder_channels(&self) -> [usize; 3] {
        ENCODER_CHANNELS
    }

    /// Decoder widths from the concatenated input down to the fused output.
    ///
    /// Each stage pairs the visible and infrared widths of one encoder level:
    /// `[48+48, 32+32, 16+16, 16, 1]`.
    pub const fn decoder_channels(&self) -> [usize; 5] {
        let [c0, c1, c2] = ENCODER_CHANNELS;
        [c2 * 2, c1 * 2, c0 * 2, c0, FUSED_CHANNELS]
    }
}
