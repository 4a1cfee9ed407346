//! Full and partial Jacobians from one-hot seeded vector-Jacobian products.
//!
//! [`compute_jacobian`] drives any [`VjpOracle`] once per output coordinate and
//! assembles the answers into a [`Tensor`] of shape `output ++ input`.
//! [`compute_rows`] does the same for a chosen subset of rows. [`TapeOracle`]
//! is a ready-made oracle that records a closure on a reverse-mode tape.

pub mod api;
pub mod error;
pub mod float;
pub mod oracle;
pub mod recorded;
pub mod reverse;
pub mod shape;
pub mod sweep;
pub mod tape;
pub mod tensor;
mod ops;

#[cfg(feature = "ndarray")]
pub mod ndarray_support;

pub use api::{grad, jacobian, vjp};
pub use error::{Error, Result};
pub use float::Float;
pub use oracle::VjpOracle;
pub use recorded::{RetainPolicy, TapeOracle};
pub use reverse::Reverse;
pub use shape::{Coords, Shape};
pub use sweep::{assemble_rows, compute_jacobian, compute_rows};
pub use tensor::Tensor;

/// Type alias for reverse-mode variables over `f64`.
pub type Reverse64 = Reverse<f64>;
/// Type alias for reverse-mode variables over `f32`.
pub type Reverse32 = Reverse<f32>;
