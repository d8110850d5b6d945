//! R1CS (Rank-1 Constraint System) implementation for the Groth16 pipeline.
//!
//! This crate provides the constraint system data structures, the builder API
//! used by hand-written circuits, and the circom-compatible `.r1cs` binary
//! loader and writer. Constraints have the form `<a, z> * <b, z> = <c, z>`
//! where `z` is the full signal vector laid out as
//! `[1 | public outputs | public inputs | private inputs | intermediates]`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use groth16_field::{FieldError, FieldLike};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

pub mod digest;
pub mod loader;
pub mod witness;
pub mod writer;

pub use digest::CircuitDigest;
pub use groth16_field;
pub use loader::{load_r1cs, read_header, read_r1cs, LoadError, LoadOptions, Malformation, R1csHeader};
pub use witness::Witness;
pub use writer::write_r1cs;

/// Variable index in the constraint system
///
/// Index 0 is the constant one; see the crate docs for the rest of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub usize);

impl Variable {
    /// Create a new variable with given index
    pub fn new(index: usize) -> Self {
        Variable(index)
    }

    /// Get the index of this variable
    pub fn index(&self) -> usize {
        self.0
    }

    /// The constant variable (always has value 1)
    pub const ONE: Variable = Variable(0);
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Linear combination of variables with field coefficients
///
/// Terms are kept sorted by variable index so that iteration, encoding and
/// digests are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCombination<F: FieldLike> {
    /// Sparse representation: variable -> coefficient, zero coefficients omitted
    pub terms: BTreeMap<Variable, F>,
}

impl<F: FieldLike> LinearCombination<F> {
    /// Create a new empty linear combination
    pub fn new() -> Self {
        Self { terms: BTreeMap::new() }
    }

    /// Create a linear combination from a single variable
    pub fn from_variable(var: Variable) -> Self {
        let mut lc = Self::new();
        lc.add_term(var, <F as FieldLike>::one());
        lc
    }

    /// Create a linear combination from a constant
    pub fn from_constant(constant: F) -> Self {
        let mut lc = Self::new();
        lc.add_term(Variable::ONE, constant);
        lc
    }

    /// Add a term (variable * coefficient) to this linear combination
    pub fn add_term(&mut self, var: Variable, coeff: F) {
        if <F as FieldLike>::is_zero(&coeff) {
            return;
        }

        match self.terms.get_mut(&var) {
            Some(existing_coeff) => {
                *existing_coeff += coeff;
                if <F as FieldLike>::is_zero(existing_coeff) {
                    self.terms.remove(&var);
                }
            }
            None => {
                self.terms.insert(var, coeff);
            }
        }
    }

    /// Multiply this linear combination by a scalar
    pub fn mul_scalar(&mut self, scalar: F) {
        if <F as FieldLike>::is_zero(&scalar) {
            self.terms.clear();
            return;
        }

        for coeff in self.terms.values_mut() {
            *coeff *= scalar;
        }
    }

    /// Add another linear combination to this one
    pub fn add_lc(&mut self, other: &LinearCombination<F>) {
        for (&var, &coeff) in &other.terms {
            self.add_term(var, coeff);
        }
    }

    /// Subtract another linear combination from this one
    pub fn sub_lc(&mut self, other: &LinearCombination<F>) {
        for (&var, &coeff) in &other.terms {
            self.add_term(var, -coeff);
        }
    }

    /// Check if this linear combination is zero
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluate this linear combination given variable assignments
    pub fn evaluate(&self, assignments: &[F]) -> Result<F, R1CSError> {
        let mut result = <F as FieldLike>::zero();

        for (&var, &coeff) in &self.terms {
            let value = assignments.get(var.index()).ok_or(R1CSError::VariableOutOfBounds {
                var_index: var.index(),
                num_vars: assignments.len(),
            })?;
            result += coeff * value;
        }

        Ok(result)
    }

    /// Number of non-zero terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Largest variable index referenced, if any
    pub fn max_index(&self) -> Option<usize> {
        self.terms.keys().next_back().map(Variable::index)
    }

    /// Iterate over `(variable, coefficient)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &F)> + '_ {
        self.terms.iter().map(|(&var, coeff)| (var, coeff))
    }
}

impl<F: FieldLike> Default for LinearCombination<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FieldLike> std::ops::Add for LinearCombination<F> {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.add_lc(&other);
        self
    }
}

impl<F: FieldLike> std::ops::Sub for LinearCombination<F> {
    type Output = Self;

    fn sub(mut self, other: Self) -> Self {
        self.sub_lc(&other);
        self
    }
}

impl<F: FieldLike> std::ops::Mul<F> for LinearCombination<F> {
    type Output = Self;

    fn mul(mut self, scalar: F) -> Self {
        self.mul_scalar(scalar);
        self
    }
}

impl<F: FieldLike> fmt::Display for LinearCombination<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }
        for (i, (var, coeff)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            if <F as FieldLike>::is_one(coeff) {
                write!(f, "{var}")?;
            } else {
                write!(f, "{}·{var}", coeff.to_decimal_string())?;
            }
        }
        Ok(())
    }
}

/// R1CS constraint: <A, z> * <B, z> = <C, z>
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint<F: FieldLike> {
    /// Left linear combination (A)
    pub a: LinearCombination<F>,
    /// Right linear combination (B)
    pub b: LinearCombination<F>,
    /// Output linear combination (C)
    pub c: LinearCombination<F>,
}

impl<F: FieldLike> Constraint<F> {
    /// Create a new constraint
    pub fn new(a: LinearCombination<F>, b: LinearCombination<F>, c: LinearCombination<F>) -> Self {
        Self { a, b, c }
    }

    /// Check if this constraint is satisfied by the given variable assignments
    pub fn is_satisfied(&self, assignments: &[F]) -> Result<bool, R1CSError> {
        let a_val = self.a.evaluate(assignments)?;
        let b_val = self.b.evaluate(assignments)?;
        let c_val = self.c.evaluate(assignments)?;

        Ok(a_val * b_val == c_val)
    }

    /// Largest variable index referenced by any of the three combinations
    pub fn max_index(&self) -> Option<usize> {
        [self.a.max_index(), self.b.max_index(), self.c.max_index()]
            .into_iter()
            .flatten()
            .max()
    }
}

impl<F: FieldLike> fmt::Display for Constraint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) · ({}) = {}", self.a, self.b, self.c)
    }
}

/// Rank-1 constraint system with circom's signal layout
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSystem<F: FieldLike> {
    /// All constraints in the system
    pub constraints: Vec<Constraint<F>>,
    /// Number of public outputs (signals `1..=num_public_outputs`)
    pub num_public_outputs: usize,
    /// Number of public inputs, following the outputs
    pub num_public_inputs: usize,
    /// Number of private inputs, following the public inputs
    pub num_private_inputs: usize,
    /// Total number of signals including the constant, inputs, outputs and intermediates
    pub num_signals: usize,
    /// Optional wire -> label mapping carried by `.r1cs` files
    pub labels: Option<Vec<u64>>,
}

impl<F: FieldLike> ConstraintSystem<F> {
    /// Create an empty system with the given primary signal counts
    pub fn new(num_public_outputs: usize, num_public_inputs: usize, num_private_inputs: usize) -> Self {
        Self {
            constraints: Vec::new(),
            num_public_outputs,
            num_public_inputs,
            num_private_inputs,
            num_signals: 1 + num_public_outputs + num_public_inputs + num_private_inputs,
            labels: None,
        }
    }

    /// Number of public signals (outputs followed by public inputs)
    pub fn num_public(&self) -> usize {
        self.num_public_outputs + self.num_public_inputs
    }

    /// Handle of the `i`-th public output
    pub fn public_output(&self, i: usize) -> Variable {
        debug_assert!(i < self.num_public_outputs);
        Variable::new(1 + i)
    }

    /// Handle of the `i`-th public input
    pub fn public_input(&self, i: usize) -> Variable {
        debug_assert!(i < self.num_public_inputs);
        Variable::new(1 + self.num_public_outputs + i)
    }

    /// Handle of the `i`-th private input
    pub fn private_input(&self, i: usize) -> Variable {
        debug_assert!(i < self.num_private_inputs);
        Variable::new(1 + self.num_public() + i)
    }

    /// Allocate a new intermediate variable and return its handle
    pub fn allocate_variable(&mut self) -> Variable {
        let var = Variable::new(self.num_signals);
        self.num_signals += 1;
        var
    }

    /// Add a constraint to the system: A * B = C
    pub fn add_constraint(&mut self, a: LinearCombination<F>, b: LinearCombination<F>, c: LinearCombination<F>) {
        self.constraints.push(Constraint::new(a, b, c));
    }

    /// Convenience method to enforce equality: left = right
    pub fn enforce_equal(&mut self, left: LinearCombination<F>, right: LinearCombination<F>) {
        // (left - right) * 1 = 0
        let mut diff = left;
        diff.sub_lc(&right);
        self.add_constraint(
            diff,
            LinearCombination::from_constant(<F as FieldLike>::one()),
            LinearCombination::new(),
        );
    }

    /// Convenience method to enforce multiplication: left * right = output
    pub fn enforce_multiplication(
        &mut self,
        left: LinearCombination<F>,
        right: LinearCombination<F>,
        output: LinearCombination<F>,
    ) {
        self.add_constraint(left, right, output);
    }

    /// Get the number of constraints
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check the structural invariants: primary counts fit in the signal
    /// count and every referenced index is in bounds.
    pub fn validate(&self) -> Result<(), R1CSError> {
        let primary = 1 + self.num_public() + self.num_private_inputs;
        if primary > self.num_signals {
            return Err(R1CSError::InconsistentCounts {
                primary,
                num_signals: self.num_signals,
            });
        }

        for (row, constraint) in self.constraints.iter().enumerate() {
            if let Some(max) = constraint.max_index() {
                if max >= self.num_signals {
                    return Err(R1CSError::SignalOutOfBounds {
                        row,
                        signal: max,
                        num_signals: self.num_signals,
                    });
                }
            }
        }

        if let Some(labels) = &self.labels {
            if labels.len() != self.num_signals {
                return Err(R1CSError::InvalidAssignmentSize {
                    expected: self.num_signals,
                    actual: labels.len(),
                });
            }
        }

        Ok(())
    }

    /// Index of the first row not satisfied by `assignment`, checked in parallel.
    ///
    /// The assignment length must already equal `num_signals`.
    pub fn first_unsatisfied(&self, assignment: &[F]) -> Option<usize> {
        self.constraints
            .par_iter()
            .position_first(|constraint| !matches!(constraint.is_satisfied(assignment), Ok(true)))
    }

    /// Check if all constraints are satisfied by the given assignment
    pub fn is_satisfied(&self, assignment: &[F]) -> Result<(), R1CSError> {
        if assignment.len() != self.num_signals {
            return Err(R1CSError::InvalidAssignmentSize {
                expected: self.num_signals,
                actual: assignment.len(),
            });
        }

        if !<F as FieldLike>::is_one(&assignment[0]) {
            return Err(R1CSError::InvalidConstantVariable);
        }

        match self.first_unsatisfied(assignment) {
            Some(constraint_index) => Err(R1CSError::UnsatisfiedConstraint { constraint_index }),
            None => Ok(()),
        }
    }

    /// Public signal handles, outputs first
    pub fn public_variables(&self) -> Vec<Variable> {
        (1..=self.num_public()).map(Variable::new).collect()
    }

    /// Content digest binding keys to this exact system
    pub fn digest(&self) -> CircuitDigest {
        digest::circuit_digest(self)
    }
}

impl<F: FieldLike> Default for ConstraintSystem<F> {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl<F: FieldLike> fmt::Display for ConstraintSystem<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "R1CS over {}:", F::CURVE)?;
        writeln!(f, "  Total signals: {}", self.num_signals)?;
        writeln!(f, "  Public outputs: {}", self.num_public_outputs)?;
        writeln!(f, "  Public inputs: {}", self.num_public_inputs)?;
        writeln!(f, "  Private inputs: {}", self.num_private_inputs)?;
        write!(f, "  Constraints: {}", self.num_constraints())?;

        for (i, constraint) in self.constraints.iter().enumerate().take(3) {
            write!(f, "\n  #{i}: {constraint}")?;
        }
        if self.constraints.len() > 3 {
            write!(f, "\n  ... and {} more constraints", self.constraints.len() - 3)?;
        }
        Ok(())
    }
}

/// Errors that can occur in R1CS operations
#[derive(Debug, thiserror::Error)]
pub enum R1CSError {
    /// Variable index out of bounds
    #[error("Variable index {var_index} out of bounds (have {num_vars} variables)")]
    VariableOutOfBounds {
        /// Index of the variable that was out of bounds
        var_index: usize,
        /// Total number of variables available
        num_vars: usize,
    },

    /// A constraint references a signal beyond the signal count
    #[error("Constraint {row} references signal {signal} but only {num_signals} signals exist")]
    SignalOutOfBounds {
        /// Row of the offending constraint
        row: usize,
        /// Offending signal index
        signal: usize,
        /// Declared signal count
        num_signals: usize,
    },

    /// Primary signal counts exceed the total signal count
    #[error("{primary} primary signals declared but only {num_signals} signals exist")]
    InconsistentCounts {
        /// Constant plus all declared inputs and outputs
        primary: usize,
        /// Declared signal count
        num_signals: usize,
    },

    /// Invalid assignment size
    #[error("Invalid assignment size: expected {expected}, got {actual}")]
    InvalidAssignmentSize {
        /// Expected number of variables
        expected: usize,
        /// Actual number of variables provided
        actual: usize,
    },

    /// Constraint not satisfied
    #[error("Constraint {constraint_index} not satisfied")]
    UnsatisfiedConstraint {
        /// Index of the constraint that failed
        constraint_index: usize,
    },

    /// Invalid constant variable (should always be 1)
    #[error("Invalid constant variable: should always be 1")]
    InvalidConstantVariable,

    /// Field operation error
    #[error("Field error: {0}")]
    FieldError(#[from] FieldError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use groth16_field::F;
    use proptest::prelude::*;

    fn one() -> F {
        <F as FieldLike>::one()
    }

    #[test]
    fn test_linear_combination_basic() {
        let mut lc = LinearCombination::<F>::new();
        lc.add_term(Variable::new(1), F::from(2u64));
        lc.add_term(Variable::new(2), F::from(3u64));

        // 2*5 + 3*7 = 31
        let assignment = vec![one(), F::from(5u64), F::from(7u64)];
        assert_eq!(lc.evaluate(&assignment).unwrap(), F::from(31u64));
    }

    #[test]
    fn test_linear_combination_cancels_terms() {
        let var = Variable::new(1);
        let mut lc = LinearCombination::<F>::from_variable(var);
        lc.sub_lc(&LinearCombination::from_variable(var));
        assert!(lc.is_zero());
        assert_eq!(lc.to_string(), "0");
    }

    #[test]
    fn test_linear_combination_out_of_bounds() {
        let lc = LinearCombination::<F>::from_variable(Variable::new(9));
        assert!(matches!(
            lc.evaluate(&[one()]),
            Err(R1CSError::VariableOutOfBounds { var_index: 9, num_vars: 1 })
        ));
    }

    #[test]
    fn test_constraint_display() {
        let mut a = LinearCombination::<F>::from_variable(Variable::new(1));
        a.add_term(Variable::new(3), F::from(2u64));
        let constraint = Constraint::new(
            a,
            LinearCombination::from_variable(Variable::new(2)),
            LinearCombination::new(),
        );
        assert_eq!(constraint.to_string(), "(x1 + 2·x3) · (x2) = 0");
    }

    #[test]
    fn test_signal_layout() {
        let cs = ConstraintSystem::<F>::new(1, 2, 3);
        assert_eq!(cs.num_signals, 7);
        assert_eq!(cs.num_public(), 3);
        assert_eq!(cs.public_output(0), Variable(1));
        assert_eq!(cs.public_input(1), Variable(3));
        assert_eq!(cs.private_input(0), Variable(4));
        assert_eq!(cs.public_variables(), vec![Variable(1), Variable(2), Variable(3)]);
    }

    #[test]
    fn test_constraint_system_satisfaction() {
        // out = x * y + x, with x public and y private
        let mut cs = ConstraintSystem::<F>::new(1, 1, 1);
        let out = cs.public_output(0);
        let x = cs.public_input(0);
        let y = cs.private_input(0);
        let xy = cs.allocate_variable();

        cs.enforce_multiplication(
            LinearCombination::from_variable(x),
            LinearCombination::from_variable(y),
            LinearCombination::from_variable(xy),
        );
        cs.enforce_equal(
            LinearCombination::from_variable(xy) + LinearCombination::from_variable(x),
            LinearCombination::from_variable(out),
        );
        cs.validate().unwrap();

        // [1, out, x, y, xy]
        let good = vec![one(), F::from(15u64), F::from(3u64), F::from(4u64), F::from(12u64)];
        cs.is_satisfied(&good).unwrap();

        let mut bad = good.clone();
        bad[1] = F::from(16u64);
        assert!(matches!(
            cs.is_satisfied(&bad),
            Err(R1CSError::UnsatisfiedConstraint { constraint_index: 1 })
        ));

        let mut no_constant = good.clone();
        no_constant[0] = F::from(2u64);
        assert!(matches!(cs.is_satisfied(&no_constant), Err(R1CSError::InvalidConstantVariable)));

        assert!(matches!(
            cs.is_satisfied(&good[..4]),
            Err(R1CSError::InvalidAssignmentSize { expected: 5, actual: 4 })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let mut cs = ConstraintSystem::<F>::new(0, 1, 0);
        cs.enforce_multiplication(
            LinearCombination::from_variable(Variable::new(1)),
            LinearCombination::from_variable(Variable::new(1)),
            LinearCombination::from_variable(Variable::new(5)),
        );
        assert!(matches!(
            cs.validate(),
            Err(R1CSError::SignalOutOfBounds { row: 0, signal: 5, num_signals: 2 })
        ));
    }

    proptest! {
        #[test]
        fn prop_lc_evaluation_is_linear(coeffs in proptest::collection::vec(any::<u64>(), 1..8), k in any::<u64>()) {
            let assignment: Vec<F> = (0..coeffs.len()).map(|i| F::from(i as u64 + 1)).collect();
            let mut lc = LinearCombination::<F>::new();
            for (i, &c) in coeffs.iter().enumerate() {
                lc.add_term(Variable::new(i), F::from(c));
            }

            let base = lc.evaluate(&assignment).unwrap();
            let scaled = (lc * F::from(k)).evaluate(&assignment).unwrap();
            prop_assert_eq!(scaled, base * F::from(k));
        }
    }
}
