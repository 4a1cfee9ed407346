//! The vector-Jacobian product oracle consumed by the sweeper.

use crate::error::Result;
use crate::float::Float;
use crate::tensor::Tensor;

/// Computes `Jᵀ · seed` for a mapping fixed at some input point.
///
/// `seed` has the mapping's output shape; the returned gradient must have its
/// input shape. Calls are issued one at a time, so an oracle may keep mutable
/// retained state (a recorded tape, say) between them without any `Sync` bound.
///
/// An oracle that has released the state it needs to answer returns
/// [`Error::OracleExhausted`](crate::Error::OracleExhausted) rather than
/// recomputing silently.
pub trait VjpOracle<F: Float> {
    fn vjp(&mut self, seed: &Tensor<F>) -> Result<Tensor<F>>;
}

/// Any `FnMut(&Tensor<F>) -> Result<Tensor<F>>` is an oracle.
///
/// ```
/// use jacsweep::{compute_jacobian, Tensor};
///
/// // f(x) = 3x, so the oracle scales the seed.
/// let mut oracle = |seed: &Tensor<f64>| -> jacsweep::Result<Tensor<f64>> {
///     Tensor::from_shape_vec(seed.shape().clone(), seed.iter().map(|&s| 3.0 * s).collect())
/// };
/// let jac = compute_jacobian([2], [2], &mut oracle).unwrap();
/// assert_eq!(jac.as_slice(), &[3.0, 0.0, 0.0, 3.0]);
/// ```
impl<F, C> VjpOracle<F> for C
where
    F: Float,
    C: FnMut(&Tensor<F>) -> Result<Tensor<F>>,
{
    #[inline]
    fn vjp(&mut self, seed: &Tensor<F>) -> Result<Tensor<F>> {
        self(seed)
    }
}
