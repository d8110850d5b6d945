//! Full signal assignment produced by the witness evaluator.

use crate::{ConstraintSystem, R1CSError};
use groth16_field::FieldLike;

/// Dense assignment of every signal, signal 0 fixed to one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness<F: FieldLike> {
    values: Vec<F>,
}

impl<F: FieldLike> Witness<F> {
    /// Wrap an assignment, checking the constant signal
    pub fn new(values: Vec<F>) -> Result<Self, R1CSError> {
        match values.first() {
            Some(first) if <F as FieldLike>::is_one(first) => Ok(Self { values }),
            _ => Err(R1CSError::InvalidConstantVariable),
        }
    }

    /// All signal values
    pub fn values(&self) -> &[F] {
        &self.values
    }

    /// Number of signals assigned
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: a witness holds at least the constant signal
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a single signal
    pub fn get(&self, index: usize) -> Option<&F> {
        self.values.get(index)
    }

    /// Public signals (`1..=num_public`) of this witness; empty if the witness is too short
    pub fn public_inputs(&self, num_public: usize) -> &[F] {
        self.values.get(1..=num_public).unwrap_or(&[])
    }

    /// Check `|witness| == num_signals` for `cs`
    pub fn check_length(&self, cs: &ConstraintSystem<F>) -> Result<(), R1CSError> {
        if self.values.len() != cs.num_signals {
            return Err(R1CSError::InvalidAssignmentSize {
                expected: cs.num_signals,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Consume into the raw value vector
    pub fn into_values(self) -> Vec<F> {
        self.values
    }
}
