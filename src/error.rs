//! Error types for jacsweep.

use thiserror::Error;

/// Result type alias using jacsweep's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building containers or sweeping an oracle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A gradient or seed did not have the shape the sweep declared for it.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Declared shape.
        expected: Vec<usize>,
        /// Shape actually received.
        got: Vec<usize>,
    },

    /// The oracle released its retained state and cannot answer another VJP.
    ///
    /// This is never retried: re-recording is the caller's decision.
    #[error("oracle exhausted after {calls} call(s); its retained state was released")]
    OracleExhausted {
        /// Number of calls the oracle answered before it was exhausted.
        calls: usize,
    },

    /// A shape contained a zero extent, or its element count overflows `usize`.
    #[error("invalid shape {shape:?}: extents must be positive and their product must fit in usize")]
    InvalidShape {
        /// The rejected shape.
        shape: Vec<usize>,
    },

    /// Flat data length disagrees with the element count of its shape.
    #[error("data length mismatch: shape needs {expected} element(s), got {got}")]
    DataLength {
        /// Element count implied by the shape.
        expected: usize,
        /// Length of the data supplied.
        got: usize,
    },

    /// A coordinate has the wrong rank or lies outside its shape.
    #[error("coordinate {coordinate:?} is out of bounds for shape {shape:?}")]
    CoordinateOutOfBounds {
        /// The offending coordinate.
        coordinate: Vec<usize>,
        /// Shape it was checked against.
        shape: Vec<usize>,
    },

    /// A recorded output refers to a variable that is not on the recording tape.
    ///
    /// Typically a variable created outside the recording closure, or leaked
    /// from a nested recording.
    #[error("output {output} refers to variable {index}, but the tape holds only {num_variables}")]
    UnrecordedOutput {
        /// Row-major position of the output.
        output: usize,
        /// Tape index the output carries.
        index: u32,
        /// Number of variables on the tape.
        num_variables: usize,
    },

    /// A row needed to assemble a Jacobian was not supplied.
    #[error("no row supplied for output coordinate {coordinate:?}")]
    MissingRow {
        /// Output coordinate without a row.
        coordinate: Vec<usize>,
    },

    /// Conversion to or from an `ndarray` array failed.
    #[cfg(feature = "ndarray")]
    #[error("ndarray shape error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),
}
