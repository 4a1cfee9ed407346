use crate::error::Result;
use crate::oracle::VjpOracle;
use crate::recorded::{RetainPolicy, TapeOracle};
use crate::reverse::Reverse;
use crate::shape::Shape;
use crate::sweep::compute_jacobian;
use crate::tape::TapeThreadLocal;
use crate::tensor::Tensor;

/// Record `f` at `x` and sweep its full Jacobian.
///
/// Returns `(f(x), J)` where `J` has shape `output_shape ++ x.shape()`.
///
/// ```
/// use jacsweep::Tensor;
///
/// // f(x, y) = [x + y, x * y] at (2, 3); J = [[1, 1], [3, 2]].
/// let x = Tensor::from_shape_vec([2], vec![2.0_f64, 3.0]).unwrap();
/// let (values, jac) = jacsweep::jacobian(|v| vec![v[0] + v[1], v[0] * v[1]], &x, [2]).unwrap();
/// assert_eq!(values.as_slice(), &[5.0, 6.0]);
/// assert_eq!(jac.as_slice(), &[1.0, 1.0, 3.0, 2.0]);
/// ```
pub fn jacobian<F: TapeThreadLocal>(
    f: impl FnOnce(&[Reverse<F>]) -> Vec<Reverse<F>>,
    x: &Tensor<F>,
    output_shape: impl Into<Shape>,
) -> Result<(Tensor<F>, Tensor<F>)> {
    let mut oracle = TapeOracle::record(x, output_shape, f)?.with_policy(RetainPolicy::Retain);
    let jac = compute_jacobian(
        oracle.output_shape().clone(),
        x.shape().clone(),
        &mut oracle,
    )?;
    oracle.release();
    Ok((oracle.values().clone(), jac))
}

/// Vector-Jacobian product `seedᵀ · J` from a single reverse sweep.
///
/// Returns `(f(x), seedᵀ · J)`. The tape is released after the sweep.
pub fn vjp<F: TapeThreadLocal>(
    f: impl FnOnce(&[Reverse<F>]) -> Vec<Reverse<F>>,
    x: &Tensor<F>,
    output_shape: impl Into<Shape>,
    seed: &Tensor<F>,
) -> Result<(Tensor<F>, Tensor<F>)> {
    let mut oracle = TapeOracle::record(x, output_shape, f)?;
    let grad = oracle.vjp(seed)?;
    Ok((oracle.values().clone(), grad))
}

/// Gradient of a scalar-valued `f` at `x`.
///
/// Returns `(f(x), ∇f(x))` with the gradient shaped like `x`.
pub fn grad<F: TapeThreadLocal>(
    f: impl FnOnce(&[Reverse<F>]) -> Reverse<F>,
    x: &Tensor<F>,
) -> Result<(F, Tensor<F>)> {
    let mut oracle = TapeOracle::record(x, Shape::scalar(), |v| vec![f(v)])?;
    let value = oracle.values().as_slice()[0];
    let grad = oracle.vjp(&Tensor::scalar(F::one()))?;
    Ok((value, grad))
}
