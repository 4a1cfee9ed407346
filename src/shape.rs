//! Axis extents and row-major coordinate enumeration.
//!
//! Every container in the crate is laid out row-major: the last axis varies
//! fastest. [`Shape::coords`] enumerates coordinates in that same order, which is
//! the order Jacobian rows are produced in.

use std::fmt;
use std::iter::FusedIterator;

use crate::error::{Error, Result};

/// Ordered extents of a container's axes.
///
/// The empty shape `()` describes a scalar: it has one element, addressed by the
/// empty coordinate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a shape from its extents.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// The scalar shape `()`.
    pub fn scalar() -> Self {
        Shape { dims: Vec::new() }
    }

    /// Extents of each axis.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of axes.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (1 for the scalar shape).
    ///
    /// Saturates at `usize::MAX`; a shape that passed [`validate`](Self::validate)
    /// never does.
    #[inline]
    pub fn numel(&self) -> usize {
        self.checked_numel().unwrap_or(usize::MAX)
    }

    /// Total number of elements, or `None` if it does not fit in `usize`.
    pub fn checked_numel(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Whether this is the scalar shape.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Reject shapes with a zero extent or an element count that overflows `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.dims.contains(&0) || self.checked_numel().is_none() {
            return Err(Error::InvalidShape {
                shape: self.dims.clone(),
            });
        }
        Ok(())
    }

    /// Row-major strides, in elements.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![0; self.dims.len()];
        let mut stride = 1;
        for (s, &d) in strides.iter_mut().zip(self.dims.iter()).rev() {
            *s = stride;
            stride *= d;
        }
        strides
    }

    /// Whether `coord` has the right rank and lies inside every extent.
    pub fn contains(&self, coord: &[usize]) -> bool {
        coord.len() == self.dims.len() && coord.iter().zip(&self.dims).all(|(&c, &d)| c < d)
    }

    /// Flat row-major offset of `coord`, or `None` if it is out of bounds.
    pub fn offset(&self, coord: &[usize]) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        Some(
            coord
                .iter()
                .zip(self.strides())
                .map(|(&c, s)| c * s)
                .sum(),
        )
    }

    /// Like [`offset`](Self::offset) but reports the failure as an [`Error`].
    pub fn checked_offset(&self, coord: &[usize]) -> Result<usize> {
        self.offset(coord).ok_or_else(|| Error::CoordinateOutOfBounds {
            coordinate: coord.to_vec(),
            shape: self.dims.clone(),
        })
    }

    /// Concatenate axes: `self ++ other`.
    pub fn concat(&self, other: &Shape) -> Shape {
        let mut dims = Vec::with_capacity(self.ndim() + other.ndim());
        dims.extend_from_slice(&self.dims);
        dims.extend_from_slice(&other.dims);
        Shape { dims }
    }

    /// Iterate over every coordinate in lexicographic (row-major) order.
    pub fn coords(&self) -> Coords {
        Coords::new(self.dims.clone())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        if self.dims.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape { dims }
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}

/// Odometer over the Cartesian product of axis ranges, last axis fastest.
///
/// Yields a single empty coordinate for the scalar shape and nothing at all if
/// any extent is zero.
#[derive(Clone, Debug)]
pub struct Coords {
    dims: Vec<usize>,
    next: Option<Vec<usize>>,
    remaining: usize,
}

impl Coords {
    fn new(dims: Vec<usize>) -> Self {
        let remaining = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .unwrap_or(usize::MAX);
        let next = (remaining > 0).then(|| vec![0; dims.len()]);
        Coords {
            dims,
            next,
            remaining,
        }
    }
}

impl Iterator for Coords {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        self.remaining -= 1;

        let mut succ = current.clone();
        for axis in (0..self.dims.len()).rev() {
            succ[axis] += 1;
            if succ[axis] < self.dims[axis] {
                self.next = Some(succ);
                return Some(current);
            }
            succ[axis] = 0;
        }
        // Every axis wrapped: enumeration is complete.
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Coords {}

impl FusedIterator for Coords {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shape_has_one_empty_coordinate() {
        let s = Shape::scalar();
        assert_eq!(s.numel(), 1);
        let all: Vec<_> = s.coords().collect();
        assert_eq!(all, vec![Vec::<usize>::new()]);
        assert_eq!(s.offset(&[]), Some(0));
    }

    #[test]
    fn coords_are_lexicographic() {
        let s = Shape::from([2, 3]);
        let all: Vec<_> = s.coords().collect();
        assert_eq!(
            all,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn coords_agree_with_offsets() {
        let s = Shape::from([2, 1, 3, 2]);
        for (i, c) in s.coords().enumerate() {
            assert_eq!(s.offset(&c), Some(i));
        }
    }

    #[test]
    fn coords_report_exact_size() {
        let s = Shape::from([4, 5]);
        let mut it = s.coords();
        assert_eq!(it.len(), 20);
        it.next();
        assert_eq!(it.len(), 19);
        assert_eq!(it.count(), 19);
    }

    #[test]
    fn zero_extent_yields_nothing_and_fails_validation() {
        let s = Shape::from([3, 0]);
        assert_eq!(s.coords().count(), 0);
        assert_eq!(s.validate(), Err(Error::InvalidShape { shape: vec![3, 0] }));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn overflowing_element_count_fails_validation() {
        let s = Shape::from([1 << 32, 1 << 32]);
        assert_eq!(s.checked_numel(), None);
        assert_eq!(s.numel(), usize::MAX);
        assert_eq!(
            s.validate(),
            Err(Error::InvalidShape {
                shape: vec![1 << 32, 1 << 32]
            })
        );
        assert!(Shape::from([1 << 16, 1 << 16]).validate().is_ok());
    }

    #[test]
    fn strides_are_row_major() {
        assert_eq!(Shape::from([2, 3, 4]).strides(), vec![12, 4, 1]);
        assert!(Shape::scalar().strides().is_empty());
    }

    #[test]
    fn offset_rejects_bad_rank_and_range() {
        let s = Shape::from([2, 2]);
        assert_eq!(s.offset(&[1]), None);
        assert_eq!(s.offset(&[0, 2]), None);
        assert!(matches!(
            s.checked_offset(&[2, 0]),
            Err(Error::CoordinateOutOfBounds { .. })
        ));
    }

    #[test]
    fn concat_appends_axes() {
        let j = Shape::from([2]).concat(&Shape::from([3, 4]));
        assert_eq!(j.dims(), &[2, 3, 4]);
        assert_eq!(Shape::scalar().concat(&Shape::from([5])).dims(), &[5]);
    }

    #[test]
    fn display_matches_tuple_notation() {
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::from([3]).to_string(), "(3,)");
        assert_eq!(Shape::from([2, 3]).to_string(), "(2, 3)");
    }
}
