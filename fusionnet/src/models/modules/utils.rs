use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        PaddingConfig2d,
    },
    prelude::*,
};

use crate::error::{FusionError, FusionResult};

/// Geometry of a single stride-1 convolution.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConvGeometry {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub padding: usize,
    pub stride: usize,
    pub dilation: usize,
    pub groups: usize,
}

impl ConvGeometry {
    /// Checks the geometry and builds the convolution.
    ///
    /// Only shape-preserving geometries are accepted:
    /// `2 * padding == dilation * (kernel_size - 1)` with stride 1.
    pub fn init<B: Backend>(self, layer: &str, device: &Device<B>) -> FusionResult<Conv2d<B>> {
        let Self {
            in_channels,
            out_channels,
            kernel_size,
            padding,
            stride,
            dilation,
            groups,
        } = self;

        if in_channels == 0 || out_channels == 0 {
            return Err(FusionError::config(format!(
                "{layer}: channel counts must be positive, got {in_channels} -> {out_channels}"
            )));
        }
        if kernel_size == 0 || dilation == 0 {
            return Err(FusionError::config(format!(
                "{layer}: kernel size and dilation must be positive"
            )));
        }
        if groups == 0 || in_channels % groups != 0 || out_channels % groups != 0 {
            return Err(FusionError::config(format!(
                "{layer}: groups {groups} must divide both {in_channels} and {out_channels}"
            )));
        }
        if stride != 1 || 2 * padding != dilation * (kernel_size - 1) {
            return Err(FusionError::config(format!(
                "{layer}: kernel {kernel_size}, padding {padding}, stride {stride}, \
                 dilation {dilation} does not preserve spatial size"
            )));
        }

        Ok(
            Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(padding, padding))
                .with_dilation([dilation, dilation])
                .with_groups(groups)
                .init(device),
        )
    }

    /// Reads the geometry back from a built convolution.
    pub fn of<B: Backend>(conv: &Conv2d<B>) -> Self {
        let [out_channels, in_per_group, kernel_size, _] = conv.weight.dims();
        let padding = match conv.padding.0 {
            PaddingConfig2d::Explicit(padding, _) => padding,
            _ => 0,
        };

        Self {
            in_channels: in_per_group * conv.groups,
            out_channels,
            kernel_size,
            padding,
            stride: conv.stride[0],
            dilation: conv.dilation[0],
            groups: conv.groups,
        }
    }
}

/// Fails unless `x` carries `expected` channels.
pub(crate) fn expect_channels<B: Backend>(
    layer: &str,
    x: &Tensor<B, 4>,
    expected: usize,
) -> FusionResult<()> {
    let dims = x.dims();
    if dims[1] == expected {
        Ok(())
    } else {
        Err(FusionError::channels(layer, expected, dims))
    }
}
