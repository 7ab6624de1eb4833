//! Image <-> tensor conversion for the fusion driver.
//!
//! The visible image is converted to YCbCr with luma in channel 0, which is the
//! only channel the network reads; the chroma planes are kept so the fused
//! luma can be recoloured. The infrared image is read as single-channel luma.

use std::path::Path;

use anyhow::{Context, Result};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Extensions accepted when walking input directories.
const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Returns true when `path` has a supported image extension (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Visible image split into BT.601 YCbCr planes, each in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct YCbCrPlanes {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Luma, row-major.
    pub y: Vec<f32>,
    /// Blue-difference chroma, centred on 0.5.
    pub cb: Vec<f32>,
    /// Red-difference chroma, centred on 0.5.
    pub cr: Vec<f32>,
}

impl YCbCrPlanes {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let len = (width * height) as usize;
        let (mut y, mut cb, mut cr) = (
            Vec::with_capacity(len),
            Vec::with_capacity(len),
            Vec::with_capacity(len),
        );

        for Rgb([r, g, b]) in image.pixels() {
            let (r, g, b) = (
                f32::from(*r) / 255.0,
                f32::from(*g) / 255.0,
                f32::from(*b) / 255.0,
            );
            let luma = 0.299 * r + 0.587 * g + 0.114 * b;
            y.push(luma);
            cb.push(((b - luma) * 0.564 + 0.5).clamp(0.0, 1.0));
            cr.push(((r - luma) * 0.713 + 0.5).clamp(0.0, 1.0));
        }

        Self {
            width,
            height,
            y,
            cb,
            cr,
        }
    }

    /// `[1, 3, H, W]` tensor with Y, Cb, Cr channels.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 4> {
        let mut data = Vec::with_capacity(self.y.len() * 3);
        data.extend_from_slice(&self.y);
        data.extend_from_slice(&self.cb);
        data.extend_from_slice(&self.cr);

        Tensor::from_data(
            TensorData::new(data, [1, 3, self.height as usize, self.width as usize]),
            device,
        )
    }

    /// Recombines a fused luma plane with this image's chroma.
    ///
    /// Fails if `luma` does not hold exactly `width * height` values.
    pub fn colorize(&self, luma: &[f32]) -> Result<RgbImage> {
        anyhow::ensure!(
            luma.len() == self.cb.len(),
            "fused plane has {} values, image has {} pixels",
            luma.len(),
            self.cb.len()
        );

        let pixels = luma
            .iter()
            .zip(self.cb.iter().zip(&self.cr))
            .flat_map(|(&y, (&cb, &cr))| {
                let r = y + 1.403 * (cr - 0.5);
                let g = y - 0.714 * (cr - 0.5) - 0.344 * (cb - 0.5);
                let b = y + 1.773 * (cb - 0.5);
                [to_u8(r), to_u8(g), to_u8(b)]
            })
            .collect();

        RgbImage::from_raw(self.width, self.height, pixels)
            .context("plane size does not match image dimensions")
    }
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Loads the visible image of a pair.
pub fn load_visible(path: &Path) -> Result<YCbCrPlanes> {
    let image = image::open(path)
        .with_context(|| format!("failed to open visible image {}", path.display()))?;

    Ok(YCbCrPlanes::from_rgb(&image.to_rgb8()))
}

/// Loads the infrared image of a pair as a `[1, 1, H, W]` tensor in `[0, 1]`.
pub fn load_infrared<B: Backend>(path: &Path, device: &B::Device) -> Result<Tensor<B, 4>> {
    let image = image::open(path)
        .with_context(|| format!("failed to open infrared image {}", path.display()))?
        .to_luma8();
    let (width, height) = image.dimensions();
    let data: Vec<f32> = image.pixels().map(|Luma([v])| f32::from(*v) / 255.0).collect();

    Ok(Tensor::from_data(
        TensorData::new(data, [1, 1, height as usize, width as usize]),
        device,
    ))
}

/// Extracts the single plane of a `[1, 1, H, W]` tensor.
pub fn tensor_to_plane<B: Backend>(tensor: Tensor<B, 4>) -> Result<Vec<f32>> {
    let [batch, channels, _, _] = tensor.dims();
    anyhow::ensure!(
        batch == 1 && channels == 1,
        "expected a [1, 1, H, W] tensor, got {:?}",
        tensor.dims()
    );

    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("failed to read tensor data: {e:?}"))
}

/// Builds an 8-bit grayscale image from a plane in `[0, 1]`.
pub fn plane_to_gray(plane: &[f32], width: u32, height: u32) -> Result<GrayImage> {
    GrayImage::from_raw(width, height, plane.iter().map(|v| to_u8(*v)).collect())
        .context("plane size does not match image dimensions")
}
