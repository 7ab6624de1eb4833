//! Fuses visible/infrared image pairs from files or directories.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use burn::{config::Config, tensor::backend::Backend};
use fusionnet_burn::{load_weights, FusionNet, FusionNetConfig, ModelConfig};
use walkdir::WalkDir;

use crate::images::{
    is_supported_image, load_infrared, load_visible, plane_to_gray, tensor_to_plane,
};

/// Fusion run configuration.
#[derive(Debug, Clone)]
pub struct FuseConfig {
    /// Visible image, or directory of visible images.
    pub visible: PathBuf,
    /// Infrared image, or directory holding infrared images under the same relative names.
    pub infrared: PathBuf,
    /// Output file for a single pair, output directory otherwise.
    pub output: PathBuf,
    /// Optional checkpoint (`.mpk`, or `.pth` with the `pretrained` feature).
    pub weights: Option<PathBuf>,
    /// Recolour the fused luma with the visible image's chroma.
    pub color: bool,
    /// Model configuration file (JSON).
    pub model_config: Option<PathBuf>,
}

/// A visible/infrared pair and where its result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub visible: PathBuf,
    pub infrared: PathBuf,
    pub output: PathBuf,
}

/// Builds the model, optionally loading weights.
pub fn build_model<B: Backend>(
    model_config: Option<&Path>,
    weights: Option<&Path>,
    device: &B::Device,
) -> Result<FusionNet<B>> {
    let config = match model_config {
        Some(path) => ModelConfig::load(path)
            .with_context(|| format!("failed to read model config {}", path.display()))?,
        None => ModelConfig::new(),
    };
    let model = FusionNetConfig::new(config).init::<B>(device)?;

    match weights {
        Some(path) => Ok(load_weights(model, path, device)?),
        None => {
            tracing::warn!("no weights given, using randomly initialized parameters");
            Ok(model)
        }
    }
}

/// Resolves the pairs to process.
///
/// A single visible file pairs with the infrared file. A visible directory is
/// walked recursively; each supported image pairs with the infrared file at the
/// same relative path, and pairs with a missing infrared image are skipped.
pub fn collect_pairs(visible: &Path, infrared: &Path, output: &Path) -> Result<Vec<ImagePair>> {
    if visible.is_file() {
        anyhow::ensure!(
            infrared.is_file(),
            "visible input is a file but infrared input {} is not",
            infrared.display()
        );
        return Ok(vec![ImagePair {
            visible: visible.to_path_buf(),
            infrared: infrared.to_path_buf(),
            output: output.to_path_buf(),
        }]);
    }

    anyhow::ensure!(
        visible.is_dir() && infrared.is_dir(),
        "inputs must be two files or two directories: {} / {}",
        visible.display(),
        infrared.display()
    );

    let mut pairs = Vec::new();
    for entry in WalkDir::new(visible).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported_image(path) {
            continue;
        }

        let relative = path.strip_prefix(visible)?;
        let ir_path = infrared.join(relative);
        if !ir_path.is_file() {
            tracing::warn!(visible = %path.display(), "no matching infrared image, skipping");
            continue;
        }

        pairs.push(ImagePair {
            visible: path.to_path_buf(),
            infrared: ir_path,
            output: output.join(relative).with_extension("png"),
        });
    }

    Ok(pairs)
}

/// Runs fusion over every pair described by `config`.
pub fn run_fuse<B: Backend>(config: &FuseConfig, device: &B::Device) -> Result<()> {
    tracing::info!(
        visible = %config.visible.display(),
        infrared = %config.infrared.display(),
        output = %config.output.display(),
        "running fusion",
    );

    let model = build_model::<B>(
        config.model_config.as_deref(),
        config.weights.as_deref(),
        device,
    )?;
    let pairs = collect_pairs(&config.visible, &config.infrared, &config.output)?;
    anyhow::ensure!(!pairs.is_empty(), "no image pairs found");

    let mut failures = 0usize;
    for pair in &pairs {
        if let Err(e) = fuse_pair(&model, pair, config.color, device) {
            failures += 1;
            tracing::error!(visible = %pair.visible.display(), error = %e, "failed to fuse pair");
        }
    }

    tracing::info!(pairs = pairs.len(), failures, "fusion completed");
    anyhow::ensure!(failures == 0, "{failures} of {} pairs failed", pairs.len());
    Ok(())
}

fn fuse_pair<B: Backend>(
    model: &FusionNet<B>,
    pair: &ImagePair,
    color: bool,
    device: &B::Device,
) -> Result<()> {
    let start = Instant::now();

    let visible = load_visible(&pair.visible)?;
    let infrared = load_infrared::<B>(&pair.infrared, device)?;

    let fused = model.fuse(visible.to_tensor::<B>(device), infrared)?;
    let plane = tensor_to_plane(fused)?;

    if let Some(parent) = pair.output.parent() {
        fs::create_dir_all(parent)?;
    }
    if color {
        visible.colorize(&plane)?.save(&pair.output)?;
    } else {
        plane_to_gray(&plane, visible.width, visible.height)?.save(&pair.output)?;
    }

    tracing::info!(
        path = %pair.output.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "saved fused image"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fusionnet-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch_png(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::GrayImage::new(2, 2).save(path).unwrap();
    }

    #[test]
    fn pairs_files_by_relative_name() {
        let root = scratch("pairs");
        let (vis, ir, out) = (root.join("vi"), root.join("ir"), root.join("out"));
        touch_png(&vis.join("001.png"));
        touch_png(&vis.join("sub/002.png"));
        touch_png(&vis.join("003.png"));
        touch_png(&ir.join("001.png"));
        touch_png(&ir.join("sub/002.png"));
        fs::write(vis.join("readme.txt"), "x").unwrap();

        let pairs = collect_pairs(&vis, &ir, &out).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].infrared, ir.join("001.png"));
        assert_eq!(pairs[0].output, out.join("001.png"));
        assert_eq!(pairs[1].output, out.join("sub/002.png"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn single_file_pair_uses_output_as_is() {
        let root = scratch("single");
        touch_png(&root.join("vis.png"));
        touch_png(&root.join("ir.png"));

        let pairs = collect_pairs(&root.join("vis.png"), &root.join("ir.png"), &root.join("f.png"))
            .unwrap();

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].output, root.join("f.png"));

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn mixed_inputs_are_rejected() {
        let root = scratch("mixed");
        touch_png(&root.join("vis.png"));

        assert!(collect_pairs(&root.join("vis.png"), &root, &root.join("o.png")).is_err());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn fuses_a_pair_end_to_end() {
        use burn::backend::NdArray;

        let root = scratch("e2e");
        let visible = root.join("vis.png");
        let infrared = root.join("ir.png");
        image::RgbImage::from_pixel(6, 4, image::Rgb([200, 100, 50]))
            .save(&visible)
            .unwrap();
        image::GrayImage::from_pixel(6, 4, image::Luma([30]))
            .save(&infrared)
            .unwrap();

        let config = FuseConfig {
            visible,
            infrared,
            output: root.join("fused.png"),
            weights: None,
            color: false,
            model_config: None,
        };
        run_fuse::<NdArray>(&config, &Default::default()).unwrap();

        let fused = image::open(root.join("fused.png")).unwrap().to_luma8();
        assert_eq!(fused.dimensions(), (6, 4));

        fs::remove_dir_all(&root).ok();
    }
}
