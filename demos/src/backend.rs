//! Compile-time backend selection: `cuda`, then `wgpu`, then the default `ndarray`.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "cuda")] {
        pub type FusionBackend = burn::backend::Cuda;
        pub const BACKEND_NAME: &str = "CUDA (NVIDIA GPU)";
    } else if #[cfg(feature = "wgpu")] {
        pub type FusionBackend = burn::backend::Wgpu;
        pub const BACKEND_NAME: &str = "WGPU (GPU)";
    } else {
        pub type FusionBackend = burn::backend::NdArray;
        pub const BACKEND_NAME: &str = "NdArray (CPU)";
    }
}

/// Device of the selected backend.
pub type FusionDevice = <FusionBackend as burn::tensor::backend::Backend>::Device;

/// The backend's default device.
pub fn default_device() -> FusionDevice {
    FusionDevice::default()
}
