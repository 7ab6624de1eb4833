//! `FusionNet`: visible/infrared image fusion with Burn.
//!
//! Two encoder towers, one per modality, extract dense and gradient-aware
//! features; a decoder merges the deepest maps of both into a single fused
//! grayscale image with values in `(0, 1)`.
//!
//! ```no_run
//! use burn::{backend::NdArray, prelude::*};
//! use fusionnet_burn::{FusionNetConfig, ModelConfig};
//!
//! let device = Default::default();
//! let model = FusionNetConfig::new(ModelConfig::new()).init::<NdArray>(&device)?;
//!
//! let visible = Tensor::<NdArray, 4>::zeros([1, 3, 64, 64], &device);
//! let infrared = Tensor::<NdArray, 4>::zeros([1, 1, 64, 64], &device);
//! let fused = model.fuse(visible, infrared)?;
//! assert_eq!(fused.dims(), [1, 1, 64, 64]);
//! # Ok::<(), fusionnet_burn::FusionError>(())
//! ```

mod config;
mod error;
mod models;
mod summary;
mod weights;


pub use config::*;
pub use error::{FusionError, FusionResult};
pub use models::modules::*;
pub use models::*;
pub use summary::{LayerKind, LayerSummary, ModelSummary};
pub use weights::{
    load_weights, remap_pytorch_key, save_weights, WeightFormat, PYTORCH_KEY_REMAP,
};

#[doc(inline)]
pub use burn_extra_ops::SobelPadding;
