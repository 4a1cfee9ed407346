//! Immutable n-dimensional container of floats.

use crate::error::{Error, Result};
use crate::float::Float;
use crate::shape::Shape;

/// A row-major n-dimensional array of `F`.
///
/// Once built a tensor is never modified in place. Every derived value
/// ([`reshape`](Self::reshape), [`subtensor`](Self::subtensor)) is a new tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<F: Float> {
    shape: Shape,
    data: Vec<F>,
}

impl<F: Float> Tensor<F> {
    /// Build a tensor from a shape and row-major data.
    ///
    /// ```
    /// let t = jacsweep::Tensor::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(3.0));
    /// ```
    pub fn from_shape_vec(shape: impl Into<Shape>, data: Vec<F>) -> Result<Self> {
        let shape = shape.into();
        shape.validate()?;
        if data.len() != shape.numel() {
            return Err(Error::DataLength {
                expected: shape.numel(),
                got: data.len(),
            });
        }
        Ok(Tensor { shape, data })
    }

    /// A 0-dimensional tensor holding `value`.
    pub fn scalar(value: F) -> Self {
        Tensor {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    /// A tensor of zeros.
    pub fn zeros(shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        shape.validate()?;
        let data = vec![F::zero(); shape.numel()];
        Ok(Tensor { shape, data })
    }

    /// A tensor of zeros with a single one at `coord`.
    pub fn one_hot(shape: impl Into<Shape>, coord: &[usize]) -> Result<Self> {
        let shape = shape.into();
        shape.validate()?;
        let pos = shape.checked_offset(coord)?;
        let mut data = vec![F::zero(); shape.numel()];
        data[pos] = F::one();
        Ok(Tensor { shape, data })
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`: zero extents are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major element data.
    #[inline]
    pub fn as_slice(&self) -> &[F] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, F> {
        self.data.iter()
    }

    pub fn into_vec(self) -> Vec<F> {
        self.data
    }

    /// Element at `coord`, or `None` if the coordinate is out of bounds.
    pub fn get(&self, coord: &[usize]) -> Option<F> {
        self.shape.offset(coord).map(|pos| self.data[pos])
    }

    /// The single value of a one-element tensor.
    pub fn item(&self) -> Option<F> {
        match self.data.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Same data under a new shape with the same element count.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Self> {
        Self::from_shape_vec(shape, self.data.clone())
    }

    /// Slice at a fixed prefix of leading coordinates.
    ///
    /// For a Jacobian of shape `out ++ in`, `subtensor(c)` with `c` an output
    /// coordinate is the gradient of output `c` with respect to every input.
    pub fn subtensor(&self, leading: &[usize]) -> Result<Self> {
        let dims = self.shape.dims();
        if leading.len() > dims.len() {
            return Err(self.out_of_bounds(leading));
        }
        let (head, tail) = dims.split_at(leading.len());
        let head = Shape::from(head);
        let row = head
            .offset(leading)
            .ok_or_else(|| self.out_of_bounds(leading))?;
        let tail = Shape::from(tail);
        let len = tail.numel();
        let start = row * len;
        Ok(Tensor {
            shape: tail,
            data: self.data[start..start + len].to_vec(),
        })
    }

    fn out_of_bounds(&self, coord: &[usize]) -> Error {
        Error::CoordinateOutOfBounds {
            coordinate: coord.to_vec(),
            shape: self.shape.dims().to_vec(),
        }
    }
}

impl<'a, F: Float> IntoIterator for &'a Tensor<F> {
    type Item = &'a F;
    type IntoIter = std::slice::Iter<'a, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
