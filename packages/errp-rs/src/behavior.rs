//! Behavioral task log: intended/actual state codes and recorded actions.

use crate::error::{ErrpError, Result};
use ndarray::{Array2, ArrayView1};

/// Per-trial state codes (row 0 intended outcome, row 1 actual outcome) and
/// the action sequence, aligned by trial index.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorRecord {
    states: Array2<i64>,
    actions: Vec<i64>,
}

impl BehaviorRecord {
    pub fn new(states: Array2<i64>, actions: Vec<i64>) -> Result<Self> {
        if states.nrows() != 2 {
            return Err(ErrpError::InvalidParameter(format!(
                "State matrix must have 2 rows (intended, actual), got {}",
                states.nrows()
            )));
        }
        Ok(Self { states, actions })
    }

    /// Build from `[intended..., actual...]` rows
    pub fn from_rows(intended: &[i64], actual: &[i64], actions: Vec<i64>) -> Result<Self> {
        if intended.len() != actual.len() {
            return Err(ErrpError::InvalidParameter(format!(
                "Intended ({}) and actual ({}) rows differ in length",
                intended.len(),
                actual.len()
            )));
        }
        let states = Array2::from_shape_fn((2, intended.len()), |(row, col)| match row {
            0 => intended[col],
            _ => actual[col],
        });
        Self::new(states, actions)
    }

    pub fn states(&self) -> &Array2<i64> {
        &self.states
    }

    pub fn actions(&self) -> &[i64] {
        &self.actions
    }

    pub fn intended(&self) -> ArrayView1<'_, i64> {
        self.states.row(0)
    }

    pub fn actual(&self) -> ArrayView1<'_, i64> {
        self.states.row(1)
    }

    /// Number of state columns, including any leading calibration column
    pub fn num_state_columns(&self) -> usize {
        self.states.ncols()
    }

    /// Number of recorded trials (length of the action sequence)
    pub fn num_trials(&self) -> usize {
        self.actions.len()
    }
}
