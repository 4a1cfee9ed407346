//! Element types for tensors, seeds and tape values.

use std::fmt::{Debug, Display};

use num_traits::{Float as NumFloat, FromPrimitive};

/// A real scalar the sweeper can seed with and the tape can differentiate.
///
/// Implemented for `f32` and `f64` only.
pub trait Float: NumFloat + FromPrimitive + Debug + Display + 'static {
    /// Type name shown in log messages.
    const NAME: &'static str;

    /// The constant 2, used by derivative rules such as `d/dx sqrt(x)`.
    #[inline]
    fn two() -> Self {
        Self::one() + Self::one()
    }

    /// `n` as a multiplier, or NaN if `n` has no exact representation.
    #[inline]
    fn from_exponent(n: i32) -> Self {
        Self::from_i32(n).unwrap_or_else(Self::nan)
    }
}

impl Float for f32 {
    const NAME: &'static str = "f32";
}

impl Float for f64 {
    const NAME: &'static str = "f64";
}
