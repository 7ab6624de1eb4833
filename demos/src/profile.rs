//! Forward-pass smoke run with parameter and cost attribution.

use std::time::Instant;

use anyhow::Result;
use burn::tensor::{backend::Backend, Distribution, ElementConversion, Tensor};
use fusionnet_burn::{FusionNetConfig, ModelConfig, ModelSummary};

/// Input geometry of a profiling run.
#[derive(Debug, Clone, Copy)]
pub struct ProfileConfig {
    /// Images per forward pass.
    pub batch: usize,
    /// Channels of the visible input; only the first is used.
    pub visible_channels: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            batch: 2,
            visible_channels: 3,
            height: 640,
            width: 480,
        }
    }
}

/// What a profiling run measured.
#[derive(Debug, Clone)]
pub struct ProfileReport {
    /// Shape of the fused output.
    pub output_dims: [usize; 4],
    /// Layer table of the profiled model.
    pub summary: ModelSummary,
    /// Multiply-accumulates for the whole batch.
    pub total_macs: u64,
    /// Smallest fused value.
    pub min: f32,
    /// Largest fused value.
    pub max: f32,
}

/// Runs one forward pass on uniform random input and collects the report.
pub fn run_profile<B: Backend>(config: ProfileConfig, device: &B::Device) -> Result<ProfileReport> {
    let ProfileConfig {
        batch,
        visible_channels,
        height,
        width,
    } = config;

    let model = FusionNetConfig::new(ModelConfig::new()).init::<B>(device)?;
    let visible = Tensor::<B, 4>::random(
        [batch, visible_channels, height, width],
        Distribution::Uniform(0.0, 1.0),
        device,
    );
    let infrared = Tensor::<B, 4>::random(
        [batch, 1, height, width],
        Distribution::Uniform(0.0, 1.0),
        device,
    );

    let start = Instant::now();
    let fused = model.fuse(visible, infrared)?;
    let output_dims = fused.dims();
    let min = fused.clone().min().into_scalar().elem::<f32>();
    let max = fused.max().into_scalar().elem::<f32>();
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "forward pass finished");

    anyhow::ensure!(
        output_dims == [batch, 1, height, width],
        "unexpected output shape {output_dims:?}"
    );
    anyhow::ensure!(
        min > 0.0 && max < 1.0,
        "output escaped (0, 1): min {min}, max {max}"
    );

    let summary = model.summary();
    let total_macs = summary.total_macs(height, width) * batch as u64;

    Ok(ProfileReport {
        output_dims,
        summary,
        total_macs,
        min,
        max,
    })
}
