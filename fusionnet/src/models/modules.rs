mod convs;
mod dense;
mod rgbd;
pub(crate) mod utils;

pub use convs::*;
pub use dense::*;
pub use rgbd::*;
