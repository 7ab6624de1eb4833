//! # Weight Loading
//!
//! The parameter collection itself is Burn's derived `FusionNetRecord`; this
//! module only picks a recorder by file extension. Native checkpoints use
//! named MessagePack. PyTorch state dicts with the flat `vis_*`/`inf_*` naming
//! need the `pretrained` feature and are remapped onto the two-tower layout:
//!
//! | PyTorch key        | Record key        |
//! |--------------------|-------------------|
//! | `vis_conv.*`       | `vis.conv.*`      |
//! | `vis_rgbdN.*`      | `vis.rgbdN.*`     |
//! | `inf_conv.*`       | `inf.conv.*`      |
//! | `inf_rgbdN.*`      | `inf.rgbdN.*`     |
//! | `decodeN.*`        | `decoder.decodeN.*` |
//!
//! The Sobel kernels stored under `*.sobelconv.*` are constants here and are
//! not read, and neither is the batch norm `num_batches_tracked` counter.

use std::path::Path;

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};

use crate::{
    error::{FusionError, FusionResult},
    models::FusionNet,
};

/// PyTorch key prefix and the record prefix it is rewritten to.
///
/// Prefixes are anchored at the start of the key and include the trailing
/// dot, so `decode1.` never matches `decode4.*`.
pub const PYTORCH_KEY_REMAP: [(&str, &str); 10] = [
    ("vis_conv.", "vis.conv."),
    ("vis_rgbd1.", "vis.rgbd1."),
    ("vis_rgbd2.", "vis.rgbd2."),
    ("inf_conv.", "inf.conv."),
    ("inf_rgbd1.", "inf.rgbd1."),
    ("inf_rgbd2.", "inf.rgbd2."),
    ("decode4.", "decoder.decode4."),
    ("decode3.", "decoder.decode3."),
    ("decode2.", "decoder.decode2."),
    ("decode1.", "decoder.decode1."),
];

/// Rewrites a PyTorch state-dict key onto the record layout.
///
/// Keys without a known prefix are returned unchanged.
pub fn remap_pytorch_key(key: &str) -> String {
    PYTORCH_KEY_REMAP
        .iter()
        .find_map(|(from, to)| key.strip_prefix(from).map(|rest| format!("{to}{rest}")))
        .unwrap_or_else(|| key.to_string())
}

/// Checkpoint formats understood by [`load_weights`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// Burn named MessagePack (`.mpk`).
    NamedMpk,
    /// PyTorch state dict (`.pth`, `.pt`).
    PyTorch,
}

impl WeightFormat {
    /// Guesses the format from the file extension.
    pub fn from_path(path: &Path) -> FusionResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("mpk") => Ok(Self::NamedMpk),
            Some("pth" | "pt") => Ok(Self::PyTorch),
            other => Err(FusionError::WeightLoadingFailed {
                reason: format!("unsupported weight file extension: {other:?}"),
            }),
        }
    }
}

/// Loads weights from `path` into `model`.
///
/// # Errors
///
/// Returns `WeightLoadingFailed` if the format is unknown or unavailable, or the
/// recorder rejects the file.
pub fn load_weights<B: Backend>(
    model: FusionNet<B>,
    path: &Path,
    device: &Device<B>,
) -> FusionResult<FusionNet<B>> {
    let format = WeightFormat::from_path(path)?;
    tracing::info!(path = %path.display(), ?format, "loading weights");

    match format {
        WeightFormat::NamedMpk => {
            let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
            model
                .load_file(path.to_path_buf(), &recorder, device)
                .map_err(|e| FusionError::WeightLoadingFailed {
                    reason: format!("MessagePack model loading failed: {e}"),
                })
        }
        WeightFormat::PyTorch => load_pytorch(model, path, device),
    }
}

/// Saves `model` as a named MessagePack checkpoint (the extension is added by the recorder).
///
/// # Errors
///
/// Returns `WeightLoadingFailed` if the recorder cannot write the file.
pub fn save_weights<B: Backend>(model: FusionNet<B>, path: &Path) -> FusionResult<()> {
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .save_file(path.to_path_buf(), &recorder)
        .map_err(|e| FusionError::WeightLoadingFailed {
            reason: format!("MessagePack model saving failed: {e}"),
        })
}

#[cfg(feature = "pretrained")]
fn load_pytorch<B: Backend>(
    model: FusionNet<B>,
    path: &Path,
    device: &Device<B>,
) -> FusionResult<FusionNet<B>> {
    use burn::record::Recorder;
    use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};

    use crate::models::FusionNetRecord;

    let load_args = PYTORCH_KEY_REMAP.iter().fold(
        LoadArgs::new(path.to_path_buf()),
        |args, (from, to)| args.with_key_remap(&format!("^{}", from.replace('.', "\\.")), to),
    );

    let recorder = PyTorchFileRecorder::<FullPrecisionSettings>::default();
    let record: FusionNetRecord<B> =
        recorder
            .load(load_args, device)
            .map_err(|e| FusionError::WeightLoadingFailed {
                reason: format!("PyTorch model loading failed: {e}"),
            })?;

    Ok(model.load_record(record))
}

#[cfg(not(feature = "pretrained"))]
fn load_pytorch<B: Backend>(
    _model: FusionNet<B>,
    path: &Path,
    _device: &Device<B>,
) -> FusionResult<FusionNet<B>> {
    Err(FusionError::WeightLoadingFailed {
        reason: format!(
            "{} is a PyTorch checkpoint; rebuild with the `pretrained` feature",
            path.display()
        ),
    })
}
