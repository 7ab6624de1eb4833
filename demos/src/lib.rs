//! Command-line driving code for `fusionnet-burn`.
//!
//! - `fuse`: fuse a visible/infrared pair, or two directories of same-named pairs.
//! - `profile`: run one forward pass on random input and report shapes,
//!   parameter counts and per-layer multiply-accumulates.

pub mod backend;
pub mod fuse;
pub mod images;
pub mod profile;

pub use backend::{default_device, FusionBackend, FusionDevice, BACKEND_NAME};
pub use fuse::{run_fuse, FuseConfig};
pub use profile::{run_profile, ProfileConfig, ProfileReport};
