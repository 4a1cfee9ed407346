//! A VJP oracle backed by a recorded reverse tape.

use log::debug;

use crate::error::{Error, Result};
use crate::oracle::VjpOracle;
use crate::reverse::Reverse;
use crate::shape::Shape;
use crate::tape::{Tape, TapeGuard, TapeThreadLocal, CONSTANT};
use crate::tensor::Tensor;

/// What a [`TapeOracle`] does with its tape after answering a VJP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetainPolicy {
    /// Keep the tape; the oracle answers any number of calls.
    Retain,
    /// Drop the tape after the first call. Later calls fail with
    /// [`Error::OracleExhausted`].
    #[default]
    Release,
}

/// A mapping recorded once at a fixed input point.
///
/// Each [`vjp`](VjpOracle::vjp) runs one reverse sweep over the recorded tape.
/// Whether the tape survives the call is governed by [`RetainPolicy`]. A full
/// Jacobian sweep needs [`RetainPolicy::Retain`] whenever the output has more
/// than one element.
///
/// ```
/// use jacsweep::{compute_jacobian, RetainPolicy, Shape, TapeOracle, Tensor};
///
/// let x = Tensor::scalar(2.0_f64);
/// let mut oracle = TapeOracle::record(&x, [2], |v| vec![v[0] * v[0], v[0].powi(3)])
///     .unwrap()
///     .with_policy(RetainPolicy::Retain);
/// let jac = compute_jacobian([2], Shape::scalar(), &mut oracle).unwrap();
/// assert_eq!(jac.as_slice(), &[4.0, 12.0]);
/// assert_eq!(oracle.calls(), 2);
/// ```
#[derive(Debug)]
pub struct TapeOracle<F: TapeThreadLocal> {
    tape: Option<Tape<F>>,
    outputs: Vec<u32>,
    values: Tensor<F>,
    input_shape: Shape,
    policy: RetainPolicy,
    calls: usize,
}

impl<F: TapeThreadLocal> TapeOracle<F> {
    /// Record `f` at `x`.
    ///
    /// `f` receives one variable per element of `x` in row-major order and must
    /// return one value per element of `output_shape`, also row-major.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidShape`] for an invalid `output_shape`.
    /// - [`Error::DataLength`] if `f` returns the wrong number of outputs.
    /// - [`Error::UnrecordedOutput`] if an output is a variable that was not
    ///   recorded on this tape.
    pub fn record(
        x: &Tensor<F>,
        output_shape: impl Into<Shape>,
        f: impl FnOnce(&[Reverse<F>]) -> Vec<Reverse<F>>,
    ) -> Result<Self> {
        let output_shape = output_shape.into();
        output_shape.validate()?;

        let n = x.len();
        let mut tape = Tape::with_capacity(n * 10);
        let inputs: Vec<Reverse<F>> = x
            .iter()
            .map(|&val| Reverse::from_tape(val, tape.new_input()))
            .collect();

        let guard = TapeGuard::new(tape);
        let outputs = f(&inputs);
        let tape = guard.finish();

        let num_variables = tape.num_variables();
        if let Some((output, r)) = outputs
            .iter()
            .enumerate()
            .find(|(_, r)| r.index != CONSTANT && r.index as usize >= num_variables)
        {
            debug!("output {} carries foreign variable {}", output, r.index);
            return Err(Error::UnrecordedOutput {
                output,
                index: r.index,
                num_variables,
            });
        }

        let values = Tensor::from_shape_vec(
            output_shape,
            outputs.iter().map(|r| r.value).collect(),
        )?;
        debug!(
            "recorded {} operation(s): input {} output {}",
            tape.len(),
            x.shape(),
            values.shape()
        );

        Ok(TapeOracle {
            tape: Some(tape),
            outputs: outputs.iter().map(|r| r.index).collect(),
            values,
            input_shape: x.shape().clone(),
            policy: RetainPolicy::default(),
            calls: 0,
        })
    }

    /// Set the retain policy for subsequent calls.
    pub fn with_policy(mut self, policy: RetainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RetainPolicy {
        self.policy
    }

    /// Primal outputs from the recording pass.
    pub fn values(&self) -> &Tensor<F> {
        &self.values
    }

    pub fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    pub fn output_shape(&self) -> &Shape {
        self.values.shape()
    }

    /// Number of VJPs answered so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Whether the tape has been released.
    pub fn is_exhausted(&self) -> bool {
        self.tape.is_none()
    }

    /// Discard the tape. Every later call fails with [`Error::OracleExhausted`].
    pub fn release(&mut self) {
        if self.tape.take().is_some() {
            debug!("tape released after {} call(s)", self.calls);
        }
    }
}

impl<F: TapeThreadLocal> VjpOracle<F> for TapeOracle<F> {
    fn vjp(&mut self, seed: &Tensor<F>) -> Result<Tensor<F>> {
        let tape = self
            .tape
            .as_ref()
            .ok_or(Error::OracleExhausted { calls: self.calls })?;
        if seed.shape() != self.values.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.values.dims().to_vec(),
                got: seed.dims().to_vec(),
            });
        }

        let seeds: Vec<(u32, F)> = self
            .outputs
            .iter()
            .zip(seed.iter())
            .map(|(&idx, &w)| (idx, w))
            .collect();
        let grad = tape.reverse_seeded(&seeds);
        self.calls += 1;

        if self.policy == RetainPolicy::Release {
            self.release();
        }
        Tensor::from_shape_vec(self.input_shape.clone(), grad)
    }
}
