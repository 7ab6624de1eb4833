//! # Model Architectures
//!
//! This module aggregates the components of the fusion network:
//!
//! - `modules`: Convolution primitives, the dense block and the RGBD fusion block.
//! - `encoder`: The single-modality encoder tower.
//! - `decoder`: The channel-reducing decoder.
//! - `fusionnet`: The main `FusionNet` model tying two towers to the decoder.

mod decoder;
mod encoder;
mod fusionnet;
pub mod modules;

pub use decoder::*;
pub use encoder::*;
pub use fusionnet::*;
