//! Jacobians by repeated one-hot seeded VJP calls.
//!
//! A one-hot seed `e_c` selects row `c` of the Jacobian: `Jᵀ · e_c` is the
//! gradient of output coordinate `c` with respect to every input. Sweeping `c`
//! over the output shape in row-major order yields the whole Jacobian, laid out
//! as `output_shape ++ input_shape`.
//!
//! The sweep is sequential and stateless. Any error aborts it immediately and no
//! partial result is returned.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::float::Float;
use crate::oracle::VjpOracle;
use crate::shape::Shape;
use crate::tensor::Tensor;

/// Compute the full Jacobian of the mapping behind `oracle`.
///
/// Issues exactly `output_shape.numel()` oracle calls, seeded in lexicographic
/// order of output coordinates. The result has shape `output_shape ++ input_shape`.
///
/// # Errors
///
/// - [`Error::InvalidShape`] if either shape has a zero extent, or the Jacobian
///   `output_shape ++ input_shape` has more elements than fit in `usize`.
/// - [`Error::ShapeMismatch`] if the oracle returns a gradient whose shape is not
///   `input_shape`.
/// - Any error the oracle returns, notably [`Error::OracleExhausted`], unchanged.
///
/// ```
/// use jacsweep::{compute_jacobian, Tensor};
///
/// // f(x) = [x², x³] at x = 2.
/// let x = 2.0_f64;
/// let mut oracle = |seed: &Tensor<f64>| -> jacsweep::Result<Tensor<f64>> {
///     let s = seed.as_slice();
///     Ok(Tensor::scalar(s[0] * 2.0 * x + s[1] * 3.0 * x * x))
/// };
/// let jac = compute_jacobian([2], jacsweep::Shape::scalar(), &mut oracle).unwrap();
/// assert_eq!(jac.as_slice(), &[4.0, 12.0]);
/// ```
pub fn compute_jacobian<F, O>(
    output_shape: impl Into<Shape>,
    input_shape: impl Into<Shape>,
    oracle: &mut O,
) -> Result<Tensor<F>>
where
    F: Float,
    O: VjpOracle<F> + ?Sized,
{
    let output_shape = output_shape.into();
    let input_shape = input_shape.into();
    let jacobian_shape = validated_jacobian_shape(&output_shape, &input_shape)?;

    let rows = output_shape.numel();
    debug!(
        "jacobian sweep ({}): {} row(s), output {} input {}",
        F::NAME,
        rows,
        output_shape,
        input_shape
    );

    let mut data = Vec::with_capacity(jacobian_shape.numel());
    for coord in output_shape.coords() {
        let grad = seeded_row(&output_shape, &input_shape, &coord, oracle)?;
        data.extend_from_slice(grad.as_slice());
    }

    debug!("jacobian sweep complete: {} oracle call(s)", rows);
    Tensor::from_shape_vec(jacobian_shape, data)
}

/// Compute only the Jacobian rows at `coordinates`.
///
/// Rows are computed in the order given. Every coordinate is bounds-checked
/// before the first oracle call. A coordinate listed twice is computed once.
/// The map is keyed by coordinate, so iterating it visits rows in row-major order.
///
/// # Errors
///
/// Same as [`compute_jacobian`], plus [`Error::CoordinateOutOfBounds`] for a
/// coordinate outside `output_shape`.
pub fn compute_rows<F, O, I, C>(
    coordinates: I,
    output_shape: impl Into<Shape>,
    input_shape: impl Into<Shape>,
    oracle: &mut O,
) -> Result<BTreeMap<Vec<usize>, Tensor<F>>>
where
    F: Float,
    O: VjpOracle<F> + ?Sized,
    I: IntoIterator<Item = C>,
    C: AsRef<[usize]>,
{
    let output_shape = output_shape.into();
    let input_shape = input_shape.into();
    validated_jacobian_shape(&output_shape, &input_shape)?;

    let coordinates: Vec<Vec<usize>> = coordinates
        .into_iter()
        .map(|c| c.as_ref().to_vec())
        .collect();
    for coord in &coordinates {
        output_shape.checked_offset(coord)?;
    }

    debug!(
        "row sweep: {} requested row(s), output {} input {}",
        coordinates.len(),
        output_shape,
        input_shape
    );

    let mut rows = BTreeMap::new();
    for coord in coordinates {
        if let Entry::Vacant(slot) = rows.entry(coord) {
            let grad = seeded_row(&output_shape, &input_shape, slot.key(), oracle)?;
            slot.insert(grad);
        }
    }
    Ok(rows)
}

/// Reassemble a full Jacobian from a complete set of rows.
///
/// `assemble_rows(&compute_rows(all, ..)?, ..)` equals `compute_jacobian(..)`
/// exactly. Extra rows outside `output_shape` are ignored.
///
/// # Errors
///
/// [`Error::MissingRow`] if some output coordinate has no row and
/// [`Error::ShapeMismatch`] if a row does not have `input_shape`.
pub fn assemble_rows<F: Float>(
    rows: &BTreeMap<Vec<usize>, Tensor<F>>,
    output_shape: impl Into<Shape>,
    input_shape: impl Into<Shape>,
) -> Result<Tensor<F>> {
    let output_shape = output_shape.into();
    let input_shape = input_shape.into();
    let jacobian_shape = validated_jacobian_shape(&output_shape, &input_shape)?;

    let mut data = Vec::with_capacity(jacobian_shape.numel());
    for coord in output_shape.coords() {
        let row = rows
            .get(&coord)
            .ok_or(Error::MissingRow { coordinate: coord })?;
        check_gradient_shape(&input_shape, row)?;
        data.extend_from_slice(row.as_slice());
    }
    Tensor::from_shape_vec(jacobian_shape, data)
}

/// Validate both shapes and the Jacobian layout they imply.
fn validated_jacobian_shape(output_shape: &Shape, input_shape: &Shape) -> Result<Shape> {
    output_shape.validate()?;
    input_shape.validate()?;
    let jacobian_shape = output_shape.concat(input_shape);
    jacobian_shape.validate()?;
    Ok(jacobian_shape)
}

/// One oracle call seeded at `coord`. The seed is dropped when the call returns.
fn seeded_row<F, O>(
    output_shape: &Shape,
    input_shape: &Shape,
    coord: &[usize],
    oracle: &mut O,
) -> Result<Tensor<F>>
where
    F: Float,
    O: VjpOracle<F> + ?Sized,
{
    trace!("seeding output coordinate {:?}", coord);
    let seed = Tensor::one_hot(output_shape, coord)?;
    let grad = oracle.vjp(&seed).map_err(|e| {
        debug!("oracle failed at output coordinate {:?}: {}", coord, e);
        e
    })?;
    check_gradient_shape(input_shape, &grad).map_err(|e| {
        debug!("bad gradient at output coordinate {:?}: {}", coord, e);
        e
    })?;
    Ok(grad)
}

fn check_gradient_shape<F: Float>(input_shape: &Shape, grad: &Tensor<F>) -> Result<()> {
    if grad.shape() != input_shape {
        return Err(Error::ShapeMismatch {
            expected: input_shape.dims().to_vec(),
            got: grad.dims().to_vec(),
        });
    }
    Ok(())
}
