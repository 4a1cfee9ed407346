//! Adept-style two-stack tape for reverse-mode AD.
//!
//! Stores precomputed partial derivatives (multipliers) and operand indices while
//! a closure runs. The reverse sweep is a single multiply-accumulate loop with
//! zero-adjoint skipping. It reads the tape without consuming it, so a recorded
//! tape can answer any number of seeded sweeps.

use std::cell::RefCell;
use std::thread::LocalKey;

use crate::float::Float;

/// Sentinel index for constants, which are never recorded.
pub const CONSTANT: u32 = u32::MAX;

/// A recorded operation: its result lives at `lhs_index`, and its operands'
/// multipliers/indices span `[prev.end_plus_one .. self.end_plus_one)`.
#[derive(Clone, Copy, Debug)]
struct Statement {
    lhs_index: u32,
    end_plus_one: u32,
}

/// Two-stack tape: one statement per operation, plus flat multiplier and
/// operand-index stacks shared by all statements.
#[derive(Clone, Debug)]
pub struct Tape<F: Float> {
    statements: Vec<Statement>,
    multipliers: Vec<F>,
    indices: Vec<u32>,
    num_variables: u32,
    num_inputs: u32,
}

impl<F: Float> Default for Tape<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Tape<F> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a tape with room for roughly `est_ops` operations.
    pub fn with_capacity(est_ops: usize) -> Self {
        let mut statements = Vec::with_capacity(est_ops + 1);
        // Sentinel so that `statements[i - 1].end_plus_one` is valid for i >= 1.
        statements.push(Statement {
            lhs_index: 0,
            end_plus_one: 0,
        });
        Tape {
            statements,
            multipliers: Vec::with_capacity(est_ops * 2),
            indices: Vec::with_capacity(est_ops * 2),
            num_variables: 0,
            num_inputs: 0,
        }
    }

    /// Register an independent variable and return its adjoint index.
    ///
    /// Inputs must be registered before any operation is recorded, so that
    /// their adjoints occupy `0..num_inputs`.
    #[inline]
    pub fn new_input(&mut self) -> u32 {
        debug_assert_eq!(
            self.num_inputs, self.num_variables,
            "inputs must be registered before operations"
        );
        let idx = self.num_variables;
        self.num_variables += 1;
        self.num_inputs += 1;
        idx
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs as usize
    }

    #[inline]
    pub fn num_variables(&self) -> usize {
        self.num_variables as usize
    }

    /// Number of recorded operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.statements.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `result = f(operand)` with `multiplier = df/d(operand)`.
    #[inline]
    pub fn push_unary(&mut self, operand_idx: u32, multiplier: F) -> u32 {
        let result_idx = self.num_variables;
        self.num_variables += 1;

        if operand_idx != CONSTANT {
            self.multipliers.push(multiplier);
            self.indices.push(operand_idx);
        }

        self.statements.push(Statement {
            lhs_index: result_idx,
            end_plus_one: self.multipliers.len() as u32,
        });
        result_idx
    }

    /// Record a binary operation with its two partial derivatives.
    #[inline]
    pub fn push_binary(&mut self, lhs_idx: u32, lhs_mult: F, rhs_idx: u32, rhs_mult: F) -> u32 {
        let result_idx = self.num_variables;
        self.num_variables += 1;

        if lhs_idx != CONSTANT {
            self.multipliers.push(lhs_mult);
            self.indices.push(lhs_idx);
        }
        if rhs_idx != CONSTANT {
            self.multipliers.push(rhs_mult);
            self.indices.push(rhs_idx);
        }

        self.statements.push(Statement {
            lhs_index: result_idx,
            end_plus_one: self.multipliers.len() as u32,
        });
        result_idx
    }

    /// Reverse sweep with adjoint seeds `(index, weight)`; repeated indices add.
    ///
    /// Returns the adjoints of the inputs only. Seeds on [`CONSTANT`] are skipped.
    pub fn reverse_seeded(&self, seeds: &[(u32, F)]) -> Vec<F> {
        let mut adjoints = vec![F::zero(); self.num_variables as usize];
        for &(idx, seed) in seeds {
            if idx != CONSTANT {
                adjoints[idx as usize] = adjoints[idx as usize] + seed;
            }
        }

        for i in (1..self.statements.len()).rev() {
            let stmt = self.statements[i];
            let a = adjoints[stmt.lhs_index as usize];
            if a != F::zero() {
                adjoints[stmt.lhs_index as usize] = F::zero();
                let start = self.statements[i - 1].end_plus_one as usize;
                let end = stmt.end_plus_one as usize;
                for j in start..end {
                    let k = self.indices[j] as usize;
                    adjoints[k] = adjoints[k] + self.multipliers[j] * a;
                }
            }
        }

        adjoints.truncate(self.num_inputs as usize);
        adjoints
    }
}

// Thread-local recording slot, one per float type.
thread_local! {
    static TAPE_F32: RefCell<Option<Tape<f32>>> = const { RefCell::new(None) };
    static TAPE_F64: RefCell<Option<Tape<f64>>> = const { RefCell::new(None) };
}

/// Selects the thread-local recording slot for a float type.
pub trait TapeThreadLocal: Float {
    fn slot() -> &'static LocalKey<RefCell<Option<Tape<Self>>>>;
}

impl TapeThreadLocal for f32 {
    fn slot() -> &'static LocalKey<RefCell<Option<Tape<Self>>>> {
        &TAPE_F32
    }
}

impl TapeThreadLocal for f64 {
    fn slot() -> &'static LocalKey<RefCell<Option<Tape<Self>>>> {
        &TAPE_F64
    }
}

/// Run `f` on the tape currently recording on this thread.
///
/// # Panics
///
/// If no recording is active. Arithmetic on [`Reverse`](crate::Reverse)
/// variables is only meaningful inside a recording such as
/// [`TapeOracle::record`](crate::TapeOracle::record).
#[inline]
pub fn with_active_tape<F: TapeThreadLocal, R>(f: impl FnOnce(&mut Tape<F>) -> R) -> R {
    F::slot().with(|slot| {
        let mut slot = slot.borrow_mut();
        match slot.as_mut() {
            Some(tape) => f(tape),
            None => panic!("no active tape: record through jacsweep::TapeOracle::record"),
        }
    })
}

/// RAII guard that installs a tape as this thread's recording tape and puts
/// the previous one back when finished or dropped.
pub struct TapeGuard<F: TapeThreadLocal> {
    prev: Option<Option<Tape<F>>>,
}

impl<F: TapeThreadLocal> TapeGuard<F> {
    pub fn new(tape: Tape<F>) -> Self {
        let prev = F::slot().with(|slot| slot.replace(Some(tape)));
        TapeGuard { prev: Some(prev) }
    }

    /// Stop recording and hand back the recorded tape.
    pub fn finish(mut self) -> Tape<F> {
        let prev = self.prev.take().flatten();
        F::slot()
            .with(|slot| slot.replace(prev))
            .unwrap_or_default()
    }
}

impl<F: TapeThreadLocal> Drop for TapeGuard<F> {
    fn drop(&mut self) {
        if let Some(prev) = self.prev.take() {
            F::slot().with(|slot| {
                slot.replace(prev);
            });
        }
    }
}
