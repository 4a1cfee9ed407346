//! Operator overloads for [`Reverse`].

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::reverse::Reverse;
use crate::tape::{self, TapeThreadLocal};

impl<F: TapeThreadLocal> Add for Reverse<F> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let value = self.value + rhs.value;
        let index =
            tape::with_active_tape(|t| t.push_binary(self.index, F::one(), rhs.index, F::one()));
        Reverse { value, index }
    }
}

impl<F: TapeThreadLocal> Sub for Reverse<F> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let value = self.value - rhs.value;
        let index =
            tape::with_active_tape(|t| t.push_binary(self.index, F::one(), rhs.index, -F::one()));
        Reverse { value, index }
    }
}

impl<F: TapeThreadLocal> Mul for Reverse<F> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let value = self.value * rhs.value;
        let index =
            tape::with_active_tape(|t| t.push_binary(self.index, rhs.value, rhs.index, self.value));
        Reverse { value, index }
    }
}

impl<F: TapeThreadLocal> Div for Reverse<F> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = F::one() / rhs.value;
        let value = self.value * inv;
        let index = tape::with_active_tape(|t| {
            t.push_binary(self.index, inv, rhs.index, -self.value * inv * inv)
        });
        Reverse { value, index }
    }
}

impl<F: TapeThreadLocal> Neg for Reverse<F> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        let value = -self.value;
        let index = tape::with_active_tape(|t| t.push_unary(self.index, -F::one()));
        Reverse { value, index }
    }
}

macro_rules! impl_assign_ops {
    ($($trait:ident :: $method:ident => $op:tt),*) => {
        $(
            impl<F: TapeThreadLocal> $trait for Reverse<F> {
                #[inline]
                fn $method(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

impl_assign_ops!(
    AddAssign::add_assign => +,
    SubAssign::sub_assign => -,
    MulAssign::mul_assign => *,
    DivAssign::div_assign => /
);

// Mixed ops with a primitive float: the float side is a constant, so only one
// partial is recorded.
macro_rules! impl_reverse_scalar_ops {
    ($f:ty) => {
        impl Add<$f> for Reverse<$f> {
            type Output = Reverse<$f>;
            #[inline]
            fn add(self, rhs: $f) -> Reverse<$f> {
                let index = tape::with_active_tape(|t| t.push_unary(self.index, 1.0));
                Reverse { value: self.value + rhs, index }
            }
        }

        impl Add<Reverse<$f>> for $f {
            type Output = Reverse<$f>;
            #[inline]
            fn add(self, rhs: Reverse<$f>) -> Reverse<$f> {
                rhs + self
            }
        }

        impl Sub<$f> for Reverse<$f> {
            type Output = Reverse<$f>;
            #[inline]
            fn sub(self, rhs: $f) -> Reverse<$f> {
                let index = tape::with_active_tape(|t| t.push_unary(self.index, 1.0));
                Reverse { value: self.value - rhs, index }
            }
        }

        impl Sub<Reverse<$f>> for $f {
            type Output = Reverse<$f>;
            #[inline]
            fn sub(self, rhs: Reverse<$f>) -> Reverse<$f> {
                let index = tape::with_active_tape(|t| t.push_unary(rhs.index, -1.0));
                Reverse { value: self - rhs.value, index }
            }
        }

        impl Mul<$f> for Reverse<$f> {
            type Output = Reverse<$f>;
            #[inline]
            fn mul(self, rhs: $f) -> Reverse<$f> {
                let index = tape::with_active_tape(|t| t.push_unary(self.index, rhs));
                Reverse { value: self.value * rhs, index }
            }
        }

        impl Mul<Reverse<$f>> for $f {
            type Output = Reverse<$f>;
            #[inline]
            fn mul(self, rhs: Reverse<$f>) -> Reverse<$f> {
                rhs * self
            }
        }

        impl Div<$f> for Reverse<$f> {
            type Output = Reverse<$f>;
            #[inline]
            fn div(self, rhs: $f) -> Reverse<$f> {
                let inv: $f = 1.0 / rhs;
                let index = tape::with_active_tape(|t| t.push_unary(self.index, inv));
                Reverse { value: self.value * inv, index }
            }
        }

        impl Div<Reverse<$f>> for $f {
            type Output = Reverse<$f>;
            #[inline]
            fn div(self, rhs: Reverse<$f>) -> Reverse<$f> {
                let inv: $f = 1.0 / rhs.value;
                let index = tape::with_active_tape(|t| t.push_unary(rhs.index, -self * inv * inv));
                Reverse { value: self * inv, index }
            }
        }
    };
}

impl_reverse_scalar_ops!(f32);
impl_reverse_scalar_ops!(f64);
