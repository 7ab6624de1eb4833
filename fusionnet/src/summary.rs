//! # Structural Summary
//!
//! Layer-by-layer description of a built `FusionNet`: hierarchical names, channel
//! counts, kernel geometry, learned parameter counts and batch-norm running
//! statistics, read back from the module's own tensors. Learned parameters plus
//! running statistics is what Burn's `num_params()` reports. `ModelSummary::macs` attributes multiply-accumulate
//! cost per layer for a given resolution, which is what an external profiler
//! needs to report cost per component.

use core::fmt;

use burn::{
    nn::{conv::Conv2d, BatchNorm},
    prelude::*,
};

use crate::models::{
    modules::{utils::ConvGeometry, Conv1, ConvBnLeakyRelu2d, ConvBnTanh2d, ConvLeakyRelu2d, RGBD},
    Decoder, EncoderTower, FusionNet,
};

/// What a summarized layer computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Convolution, batch norm, leaky ReLU.
    ConvBnLeakyRelu,
    /// Convolution, leaky ReLU.
    ConvLeakyRelu,
    /// Convolution, batch norm, squash.
    ConvBnTanh,
    /// Bare 1x1 channel projection.
    Projector,
    /// Fixed Sobel filter pair.
    Sobel,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConvBnLeakyRelu => "conv+bn+lrelu",
            Self::ConvLeakyRelu => "conv+lrelu",
            Self::ConvBnTanh => "conv+bn+tanh",
            Self::Projector => "conv1x1",
            Self::Sobel => "sobel",
        };
        f.write_str(name)
    }
}

/// One leaf layer of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    /// Dotted path matching the record field names, e.g. `vis.rgbd1.dense.conv2`.
    pub name: String,
    /// What the layer computes; the `ConvBn*` kinds are the normalised ones.
    pub kind: LayerKind,
    /// Input channel count.
    pub in_channels: usize,
    /// Output channel count.
    pub out_channels: usize,
    /// Square kernel side.
    pub kernel_size: usize,
    /// Convolution groups; equal to the channel count for the depthwise Sobel pair.
    pub groups: usize,
    /// Learned parameters: convolution weight and bias plus batch norm scale and shift.
    pub params: usize,
    /// Batch norm running mean and variance. Stored in the record, never trained.
    pub buffers: usize,
}

impl LayerSummary {
    fn conv<B: Backend>(
        name: String,
        kind: LayerKind,
        conv: &Conv2d<B>,
        bn: Option<&BatchNorm<B, 2>>,
    ) -> Self {
        let geometry = ConvGeometry::of(conv);
        let weight: usize = conv.weight.dims().iter().product();
        let bias = conv.bias.as_ref().map_or(0, |bias| bias.dims()[0]);
        let norm = bn.map_or(0, |bn| bn.gamma.dims()[0] + bn.beta.dims()[0]);
        let buffers = bn.map_or(0, |bn| {
            bn.running_mean.value().dims()[0] + bn.running_var.value().dims()[0]
        });

        Self {
            name,
            kind,
            in_channels: geometry.in_channels,
            out_channels: geometry.out_channels,
            kernel_size: geometry.kernel_size,
            groups: geometry.groups,
            params: weight + bias + norm,
            buffers,
        }
    }

    /// Multiply-accumulate count for one image of `height x width`.
    ///
    /// The Sobel layer counts as two depthwise 3x3 convolutions.
    pub const fn macs(&self, height: usize, width: usize) -> u64 {
        let per_pixel = self.out_channels * (self.in_channels / self.groups)
            * self.kernel_size
            * self.kernel_size;
        let per_pixel = match self.kind {
            LayerKind::Sobel => 2 * per_pixel,
            _ => per_pixel,
        };

        (per_pixel * height * width) as u64
    }
}

/// Ordered list of every leaf layer in forward order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    /// Total learned parameters.
    pub fn total_params(&self) -> usize {
        self.layers.iter().map(|layer| layer.params).sum()
    }

    /// Total batch norm running-statistic values.
    pub fn total_buffers(&self) -> usize {
        self.layers.iter().map(|layer| layer.buffers).sum()
    }

    /// Every stored value, as counted by `Module::num_params`.
    pub fn total_values(&self) -> usize {
        self.total_params() + self.total_buffers()
    }

    /// Per-layer multiply-accumulate counts for one image of `height x width`.
    pub fn macs(&self, height: usize, width: usize) -> Vec<(&str, u64)> {
        self.layers
            .iter()
            .map(|layer| (layer.name.as_str(), layer.macs(height, width)))
            .collect()
    }

    /// Total multiply-accumulate count for one image of `height x width`.
    pub fn total_macs(&self, height: usize, width: usize) -> u64 {
        self.layers
            .iter()
            .map(|layer| layer.macs(height, width))
            .sum()
    }

    /// Layers whose name starts with `prefix`, e.g. `"vis."` or `"decoder."`.
    pub fn component<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a LayerSummary> {
        self.layers
            .iter()
            .filter(move |layer| layer.name.starts_with(prefix))
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<28} {:<14} {:>5} {:>5} {:>3} {:>9}",
            "layer", "kind", "in", "out", "k", "params"
        )?;
        for layer in &self.layers {
            writeln!(
                f,
                "{:<28} {:<14} {:>5} {:>5} {:>3} {:>9}",
                layer.name,
                layer.kind.to_string(),
                layer.in_channels,
                layer.out_channels,
                layer.kernel_size,
                layer.params
            )?;
        }
        writeln!(f, "total learned parameters: {}", self.total_params())?;
        write!(f, "batch norm running statistics: {}", self.total_buffers())
    }
}

impl<B: Backend> FusionNet<B> {
    /// Describes every leaf layer, visible tower first, then infrared, then decoder.
    pub fn summary(&self) -> ModelSummary {
        let mut layers = Vec::new();
        self.vis.summarize("vis", &mut layers);
        self.inf.summarize("inf", &mut layers);
        self.decoder.summarize("decoder", &mut layers);

        ModelSummary { layers }
    }
}

impl<B: Backend> EncoderTower<B> {
    fn summarize(&self, prefix: &str, out: &mut Vec<LayerSummary>) {
        self.conv.summarize(format!("{prefix}.conv"), out);
        self.rgbd1.summarize(&format!("{prefix}.rgbd1"), out);
        self.rgbd2.summarize(&format!("{prefix}.rgbd2"), out);
    }
}

impl<B: Backend> RGBD<B> {
    fn summarize(&self, prefix: &str, out: &mut Vec<LayerSummary>) {
        self.dense.conv1.summarize(format!("{prefix}.dense.conv1"), out);
        self.dense.conv2.summarize(format!("{prefix}.dense.conv2"), out);
        self.convdown.summarize(format!("{prefix}.convdown"), out);

        let channels = self.sobelconv.channels();
        out.push(LayerSummary {
            name: format!("{prefix}.sobelconv"),
            kind: LayerKind::Sobel,
            in_channels: channels,
            out_channels: channels,
            kernel_size: 3,
            groups: channels,
            params: 0,
            buffers: 0,
        });

        self.convup.summarize(format!("{prefix}.convup"), out);
    }
}

impl<B: Backend> Decoder<B> {
    fn summarize(&self, prefix: &str, out: &mut Vec<LayerSummary>) {
        self.decode4.summarize(format!("{prefix}.decode4"), out);
        self.decode3.summarize(format!("{prefix}.decode3"), out);
        self.decode2.summarize(format!("{prefix}.decode2"), out);
        self.decode1.summarize(format!("{prefix}.decode1"), out);
    }
}

impl<B: Backend> ConvLeakyRelu2d<B> {
    fn summarize(&self, name: String, out: &mut Vec<LayerSummary>) {
        out.push(LayerSummary::conv(name, LayerKind::ConvLeakyRelu, &self.conv, None));
    }
}

impl<B: Backend> ConvBnLeakyRelu2d<B> {
    fn summarize(&self, name: String, out: &mut Vec<LayerSummary>) {
        out.push(LayerSummary::conv(
            name,
            LayerKind::ConvBnLeakyRelu,
            &self.conv,
            Some(&self.bn),
        ));
    }
}

impl<B: Backend> ConvBnTanh2d<B> {
    fn summarize(&self, name: String, out: &mut Vec<LayerSummary>) {
        out.push(LayerSummary::conv(
            name,
            LayerKind::ConvBnTanh,
            &self.conv,
            Some(&self.bn),
        ));
    }
}

impl<B: Backend> Conv1<B> {
    fn summarize(&self, name: String, out: &mut Vec<LayerSummary>) {
        out.push(LayerSummary::conv(name, LayerKind::Projector, &self.conv, None));
    }
}
