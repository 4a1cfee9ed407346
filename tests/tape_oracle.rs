//! Sweeping a recorded tape: retention, exhaustion, and hand-derived Jacobians.

use approx::assert_relative_eq;
use jacsweep::{
    compute_jacobian, compute_rows, Error, RetainPolicy, Reverse, Shape, TapeOracle, Tensor,
    VjpOracle,
};

fn square_and_cube(v: &[Reverse<f64>]) -> Vec<Reverse<f64>> {
    vec![v[0] * v[0], v[0] * v[0] * v[0]]
}

#[test]
fn retained_tape_answers_every_row() {
    let x = Tensor::scalar(2.0);
    let mut oracle = TapeOracle::record(&x, [2], square_and_cube)
        .unwrap()
        .with_policy(RetainPolicy::Retain);

    assert_eq!(oracle.values().as_slice(), &[4.0, 8.0]);
    let jac = compute_jacobian([2], Shape::scalar(), &mut oracle).unwrap();
    assert_relative_eq!(jac.as_slice()[0], 4.0, max_relative = 1e-12);
    assert_relative_eq!(jac.as_slice()[1], 12.0, max_relative = 1e-12);
    assert_eq!(oracle.calls(), 2);
    assert!(!oracle.is_exhausted());
}

#[test]
fn released_tape_exhausts_on_second_row() {
    let x = Tensor::scalar(2.0);
    let mut oracle = TapeOracle::record(&x, [2], square_and_cube).unwrap();
    assert_eq!(oracle.policy(), RetainPolicy::Release);

    let err = compute_jacobian([2], Shape::scalar(), &mut oracle).unwrap_err();
    assert_eq!(err, Error::OracleExhausted { calls: 1 });
    assert!(oracle.is_exhausted());
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn released_tape_is_enough_for_scalar_output() {
    let x = Tensor::from_shape_vec([2], vec![1.5, -0.5]).unwrap();
    let mut oracle = TapeOracle::record(&x, Shape::scalar(), |v| vec![v[0] + v[1]]).unwrap();
    let jac = compute_jacobian(Shape::scalar(), [2], &mut oracle).unwrap();
    assert_eq!(jac.as_slice(), &[1.0, 1.0]);
    assert!(oracle.is_exhausted());
}

#[test]
fn explicit_release_discards_retained_tape() {
    let x = Tensor::scalar(3.0);
    let mut oracle = TapeOracle::record(&x, [2], square_and_cube)
        .unwrap()
        .with_policy(RetainPolicy::Retain);
    oracle.vjp(&Tensor::one_hot([2], &[0]).unwrap()).unwrap();
    oracle.release();
    let err = oracle.vjp(&Tensor::one_hot([2], &[1]).unwrap()).unwrap_err();
    assert_eq!(err, Error::OracleExhausted { calls: 1 });
}

#[test]
fn seed_shape_is_checked() {
    let x = Tensor::scalar(3.0);
    let mut oracle = TapeOracle::record(&x, [2], square_and_cube)
        .unwrap()
        .with_policy(RetainPolicy::Retain);
    let err = oracle.vjp(&Tensor::one_hot([3], &[0]).unwrap()).unwrap_err();
    assert_eq!(
        err,
        Error::ShapeMismatch {
            expected: vec![2],
            got: vec![3]
        }
    );
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn wrong_output_count_fails_recording() {
    let x = Tensor::scalar(3.0);
    let err = TapeOracle::record(&x, [3], square_and_cube).unwrap_err();
    assert_eq!(
        err,
        Error::DataLength {
            expected: 3,
            got: 2
        }
    );
}

#[test]
fn unrecorded_output_fails_recording() {
    let x = Tensor::from_shape_vec([2], vec![1.0, 2.0]).unwrap();
    let err = TapeOracle::record(&x, [2], |v| vec![v[0] + v[1], Reverse::from_tape(5.0, 99)])
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnrecordedOutput {
            output: 1,
            index: 99,
            num_variables: 3,
        }
    );
}

#[test]
fn variable_leaked_from_inner_recording_is_rejected() {
    let x = Tensor::scalar(2.0);
    let err = TapeOracle::record(&x, Shape::scalar(), |_| {
        let mut leaked = None;
        TapeOracle::record(&Tensor::scalar(5.0), Shape::scalar(), |w| {
            let y = w[0] * w[0] * w[0];
            leaked = Some(y);
            vec![y]
        })
        .unwrap();
        vec![leaked.unwrap()]
    })
    .unwrap_err();
    assert!(matches!(err, Error::UnrecordedOutput { output: 0, .. }));
}

#[test]
fn dense_seed_is_weighted_row_sum() {
    // f(x, y) = [x + y, x * y] at (2, 3); J = [[1, 1], [3, 2]].
    let x = Tensor::from_shape_vec([2], vec![2.0, 3.0]).unwrap();
    let mut oracle = TapeOracle::record(&x, [2], |v| vec![v[0] + v[1], v[0] * v[1]])
        .unwrap()
        .with_policy(RetainPolicy::Retain);
    let w = Tensor::from_shape_vec([2], vec![0.5, 2.0]).unwrap();
    let g = oracle.vjp(&w).unwrap();
    assert_relative_eq!(g.as_slice()[0], 0.5 * 1.0 + 2.0 * 3.0, max_relative = 1e-12);
    assert_relative_eq!(g.as_slice()[1], 0.5 * 1.0 + 2.0 * 2.0, max_relative = 1e-12);
}

#[test]
fn matrix_input_and_output() {
    // Y = X ∘ X elementwise on a 2x2 input: dY[i,j]/dX[k,l] = 2 X[i,j] δ.
    let x = Tensor::from_shape_vec([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut oracle = TapeOracle::record(&x, [2, 2], |v| v.iter().map(|&a| a * a).collect())
        .unwrap()
        .with_policy(RetainPolicy::Retain);
    let jac = compute_jacobian([2, 2], [2, 2], &mut oracle).unwrap();
    assert_eq!(jac.dims(), &[2, 2, 2, 2]);

    for out in Shape::from([2, 2]).coords() {
        for inp in Shape::from([2, 2]).coords() {
            let mut coord = out.clone();
            coord.extend_from_slice(&inp);
            let expected = if out == inp {
                2.0 * x.get(&inp).unwrap()
            } else {
                0.0
            };
            assert_relative_eq!(jac.get(&coord).unwrap(), expected, max_relative = 1e-12);
        }
    }
}

#[test]
fn shared_intermediate_across_outputs() {
    // y = x0 * x1, outputs [y, y.sin(), x0]
    let x = Tensor::from_shape_vec([2], vec![0.7, 1.3]).unwrap();
    let mut oracle = TapeOracle::record(&x, [3], |v| {
        let y = v[0] * v[1];
        vec![y, y.sin(), v[0]]
    })
    .unwrap()
    .with_policy(RetainPolicy::Retain);
    let jac = compute_jacobian([3], [2], &mut oracle).unwrap();

    let (x0, x1) = (0.7_f64, 1.3_f64);
    let c = (x0 * x1).cos();
    let expected = [x1, x0, c * x1, c * x0, 1.0, 0.0];
    for (got, want) in jac.iter().zip(expected.iter()) {
        assert_relative_eq!(*got, *want, max_relative = 1e-12);
    }
}

#[test]
fn constant_output_has_zero_row() {
    let x = Tensor::from_shape_vec([2], vec![1.0, 2.0]).unwrap();
    let mut oracle = TapeOracle::record(&x, [2], |v| vec![v[0] * v[1], Reverse::constant(5.0)])
        .unwrap()
        .with_policy(RetainPolicy::Retain);
    let jac = compute_jacobian([2], [2], &mut oracle).unwrap();
    assert_eq!(jac.subtensor(&[1]).unwrap().as_slice(), &[0.0, 0.0]);
    assert_eq!(jac.subtensor(&[0]).unwrap().as_slice(), &[2.0, 1.0]);
}

#[test]
fn selected_rows_from_retained_tape() {
    let x = Tensor::from_shape_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
    let mut oracle = TapeOracle::record(&x, [3], |v| {
        vec![v[0] * v[1], v[1] * v[2], v[2] * v[0]]
    })
    .unwrap()
    .with_policy(RetainPolicy::Retain);
    let rows = compute_rows([[2_usize]], [3], [3], &mut oracle).unwrap();
    assert_eq!(oracle.calls(), 1);
    assert_eq!(rows[&vec![2_usize]].as_slice(), &[3.0, 0.0, 1.0]);
}

#[test]
fn f32_recording() {
    let x = Tensor::from_shape_vec([2], vec![2.0_f32, 0.5]).unwrap();
    let mut oracle = TapeOracle::record(&x, [1], |v| vec![v[0] / v[1]])
        .unwrap()
        .with_policy(RetainPolicy::Retain);
    let jac = compute_jacobian([1], [2], &mut oracle).unwrap();
    assert_relative_eq!(jac.as_slice()[0], 2.0_f32, max_relative = 1e-6);
    assert_relative_eq!(jac.as_slice()[1], -8.0_f32, max_relative = 1e-6);
}
