//! ndarray adapters.
//!
//! Conversions between [`Tensor`] and `ArrayD`, plus a Jacobian helper that takes
//! and returns dynamic-rank arrays.

use ndarray::{ArrayD, IxDyn};

use crate::error::Result;
use crate::float::Float;
use crate::reverse::Reverse;
use crate::shape::Shape;
use crate::tape::TapeThreadLocal;
use crate::tensor::Tensor;

impl<F: Float> Tensor<F> {
    /// Copy into an `ArrayD` with the same shape.
    pub fn to_ndarray(&self) -> Result<ArrayD<F>> {
        Ok(ArrayD::from_shape_vec(
            IxDyn(self.dims()),
            self.as_slice().to_vec(),
        )?)
    }

    /// Copy from any `ArrayD`, whatever its memory layout.
    pub fn from_ndarray(array: &ArrayD<F>) -> Result<Self> {
        Tensor::from_shape_vec(array.shape(), array.iter().copied().collect())
    }
}

/// Record `f` at `x` and return its Jacobian as an `ArrayD` of shape
/// `output_shape ++ x.shape()`.
pub fn jacobian_ndarray<F: TapeThreadLocal>(
    f: impl FnOnce(&[Reverse<F>]) -> Vec<Reverse<F>>,
    x: &ArrayD<F>,
    output_shape: impl Into<Shape>,
) -> Result<ArrayD<F>> {
    let x = Tensor::from_ndarray(x)?;
    let (_, jac) = crate::api::jacobian(f, &x, output_shape)?;
    jac.to_ndarray()
}
