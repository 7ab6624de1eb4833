//! Additional operations for the Burn deep learning framework
//!
//! This crate provides fixed, parameter-free operations used by image fusion
//! networks that are not available in the core Burn framework.

mod sobel;
mod squash;

// Convenient re-exports
pub use sobel::{
    sobel_magnitude, ChannelMismatch, Sobel, SobelConfig, SobelPadding, SOBEL_X, SOBEL_Y,
};
pub use squash::{squash, Squash};
