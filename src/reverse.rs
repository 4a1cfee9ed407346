use std::fmt::{self, Display};

use crate::float::Float;
use crate::tape::{self, TapeThreadLocal, CONSTANT};

/// Reverse-mode AD variable.
///
/// Just a value and a tape index. `Copy` because the tape lives in a
/// thread-local slot, not inside this struct.
#[derive(Clone, Copy, Debug)]
pub struct Reverse<F: Float> {
    pub(crate) value: F,
    pub(crate) index: u32,
}

impl<F: Float> Reverse<F> {
    /// Create a constant (not tracked on tape).
    #[inline]
    pub fn constant(value: F) -> Self {
        Reverse {
            value,
            index: CONSTANT,
        }
    }

    /// Create a variable from a tape allocation.
    #[inline]
    pub fn from_tape(value: F, index: u32) -> Self {
        Reverse { value, index }
    }

    /// Primal value.
    #[inline]
    pub fn value(&self) -> F {
        self.value
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.index == CONSTANT
    }
}

/// Record a unary elemental on the active tape.
#[inline]
fn rev_unary<F: TapeThreadLocal>(x: Reverse<F>, f_val: F, f_deriv: F) -> Reverse<F> {
    let index = tape::with_active_tape(|t| t.push_unary(x.index, f_deriv));
    Reverse {
        value: f_val,
        index,
    }
}

/// Record a binary elemental on the active tape.
#[inline]
fn rev_binary<F: TapeThreadLocal>(
    x: Reverse<F>,
    y: Reverse<F>,
    f_val: F,
    dx: F,
    dy: F,
) -> Reverse<F> {
    let index = tape::with_active_tape(|t| t.push_binary(x.index, dx, y.index, dy));
    Reverse {
        value: f_val,
        index,
    }
}

// Elementals. Each records its value and local derivative.
impl<F: TapeThreadLocal> Reverse<F> {
    pub fn powi(self, n: i32) -> Self {
        let deriv = F::from_exponent(n) * self.value.powi(n - 1);
        rev_unary(self, self.value.powi(n), deriv)
    }

    pub fn powf(self, n: Self) -> Self {
        let val = self.value.powf(n.value);
        let dx = n.value * self.value.powf(n.value - F::one());
        let dy = val * self.value.ln();
        rev_binary(self, n, val, dx, dy)
    }

    pub fn sqrt(self) -> Self {
        let s = self.value.sqrt();
        rev_unary(self, s, F::one() / (F::two() * s))
    }

    pub fn exp(self) -> Self {
        let e = self.value.exp();
        rev_unary(self, e, e)
    }

    pub fn ln(self) -> Self {
        rev_unary(self, self.value.ln(), F::one() / self.value)
    }

    pub fn sin(self) -> Self {
        rev_unary(self, self.value.sin(), self.value.cos())
    }

    pub fn cos(self) -> Self {
        rev_unary(self, self.value.cos(), -self.value.sin())
    }

    pub fn tan(self) -> Self {
        let t = self.value.tan();
        rev_unary(self, t, F::one() + t * t)
    }

    pub fn tanh(self) -> Self {
        let t = self.value.tanh();
        rev_unary(self, t, F::one() - t * t)
    }

    pub fn recip(self) -> Self {
        let inv = F::one() / self.value;
        rev_unary(self, inv, -inv * inv)
    }

    /// Uses `signum` as the derivative, so `abs` at zero has slope 1.
    pub fn abs(self) -> Self {
        rev_unary(self, self.value.abs(), self.value.signum())
    }
}

impl<F: Float> Display for Reverse<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<F: Float> Default for Reverse<F> {
    fn default() -> Self {
        Reverse::constant(F::zero())
    }
}

impl<F: Float> PartialEq for Reverse<F> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<F: Float> PartialOrd for Reverse<F> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.value.partial_cmp(&other.value)
    }
}
