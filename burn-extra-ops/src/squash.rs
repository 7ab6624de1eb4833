//! Saturating squash activation

use burn::{prelude::*, tensor::activation::sigmoid};

/// Applies `tanh(x) / 2 + 0.5`, mapping the real line onto `(0, 1)`.
///
/// Evaluated as the identical `sigmoid(2x)`: the `tanh` form rounds to exactly
/// `0.0` in `f32` from about `x < -9`, the sigmoid form stays positive down to
/// about `x < -44`.
pub fn squash<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Tensor<B, D> {
    sigmoid(tensor.mul_scalar(2.0))
}

/// Module wrapper around [`squash`].
#[derive(Module, Clone, Debug, Default)]
pub struct Squash;

impl Squash {
    /// Create new Squash module
    pub const fn new() -> Self {
        Self
    }

    /// Forward pass
    ///
    /// # Shapes
    /// - input: `[..., any]`
    /// - output: `[..., any]`
    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        squash(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn squash_maps_zero_to_one_half() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::zeros([4], &device);

        let y = Squash::new().forward(x).into_data().to_vec::<f32>().unwrap();

        for value in y {
            assert!((value - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn squash_stays_inside_unit_interval() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-6.0, -2.0, -0.5, 0.5, 2.0, 6.0], &device);

        let y = squash(x).into_data().to_vec::<f32>().unwrap();

        for value in &y {
            assert!(*value > 0.0 && *value < 1.0, "value {value} escaped (0, 1)");
        }
        // monotone
        for pair in y.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn squash_matches_tanh_form() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-3.0, -0.7, 0.0, 0.4, 2.5], &device);

        let expected = burn::tensor::activation::tanh(x.clone())
            .div_scalar(2.0)
            .add_scalar(0.5)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        let y = squash(x).into_data().to_vec::<f32>().unwrap();

        for (got, want) in y.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn large_negative_inputs_stay_above_zero() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-12.0, -20.0, -40.0], &device);

        let y = squash(x).into_data().to_vec::<f32>().unwrap();

        assert!(y.iter().all(|v| *v > 0.0), "{y:?}");
        assert!(y[0] > y[1] && y[1] > y[2]);
    }

    #[test]
    fn squash_is_symmetric_around_one_half() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([1.5], &device);

        let pos = squash(x.clone()).into_scalar();
        let neg = squash(x.neg()).into_scalar();

        assert!((pos + neg - 1.0).abs() < 1e-6);
    }
}
