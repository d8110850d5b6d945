//! QAP (Quadratic Arithmetic Program) reduction for Groth16.
//!
//! The constraint system is never interpolated into per-signal polynomials.
//! Setup only needs every `u_i(τ), v_i(τ), w_i(τ)` at the secret point,
//! which [`QAP::instance_map_at`] gets from the Lagrange basis at `τ`. The
//! prover only needs the coefficients of `H = (A·B − C) / Z`, which
//! [`QAP::witness_map`] computes with FFTs over a coset of the domain.
//!
//! The domain holds one row per constraint plus one row `z_i · 1 = 0` for
//! every public signal `i` (including the constant). Those rows make the
//! `u_i` of public signals linearly independent so a proof cannot be
//! replayed with different public inputs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use ark_ff::{FftField, Field};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use groth16_field::FieldLike;
use groth16_r1cs::{ConstraintSystem, R1CSError};
use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

pub use groth16_field;
pub use groth16_r1cs;

/// QAP view of a constraint system
#[derive(Debug, Clone)]
pub struct QAP<'a, F: FieldLike> {
    cs: &'a ConstraintSystem<F>,
    /// Evaluation domain `H` of size `2^k`
    pub domain: Radix2EvaluationDomain<F>,
}

/// Evaluations of every signal's `u_i, v_i, w_i` at one point
#[derive(Debug, Clone, PartialEq)]
pub struct QAPInstance<F: FieldLike> {
    /// `u_i(τ)` per signal
    pub a: Vec<F>,
    /// `v_i(τ)` per signal
    pub b: Vec<F>,
    /// `w_i(τ)` per signal
    pub c: Vec<F>,
    /// `Z(τ)`
    pub zt: F,
}

/// `A(x), B(x), C(x), Z(x)` for one assignment at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QAPEvaluation<F: FieldLike> {
    /// `Σ z_i u_i(x)`
    pub a: F,
    /// `Σ z_i v_i(x)`
    pub b: F,
    /// `Σ z_i w_i(x)`
    pub c: F,
    /// `Z(x)`
    pub z: F,
}

impl<F: FieldLike> QAPEvaluation<F> {
    /// Check `A·B − C = H·Z` for a quotient value `h`
    pub fn holds_with(&self, h: F) -> bool {
        self.a * self.b - self.c == h * self.z
    }
}

/// Errors that can occur during QAP operations
#[derive(Debug, thiserror::Error)]
pub enum QAPError {
    /// No radix-2 domain of the required size exists in the field
    #[error("Circuit needs a domain of {required} points, larger than the field supports")]
    DomainTooLarge {
        /// Rows that must fit in the domain
        required: usize,
    },

    /// Assignment length differs from the signal count
    #[error("Assignment has {actual} values, expected {expected}")]
    AssignmentLength {
        /// Signal count
        expected: usize,
        /// Values supplied
        actual: usize,
    },

    /// Error evaluating a constraint row
    #[error("R1CS error: {0}")]
    R1CS(#[from] R1CSError),
}

/// Rows the QAP domain must hold for `cs`
pub fn required_rows<F: FieldLike>(cs: &ConstraintSystem<F>) -> usize {
    cs.num_constraints() + cs.num_public() + 1
}

/// Multiply `values[i]` by `g^i`, in parallel chunks.
fn distribute_powers<F: FieldLike>(values: &mut [F], g: F) {
    let chunk = (values.len() / rayon::current_num_threads()).max(1024);
    values.par_chunks_mut(chunk).enumerate().for_each(|(i, chunk_values)| {
        let mut power = g.pow([(i * chunk) as u64]);
        for value in chunk_values {
            *value *= power;
            power *= g;
        }
    });
}

impl<'a, F: FieldLike> QAP<'a, F> {
    /// Build the QAP view, choosing the smallest domain that fits.
    pub fn new(cs: &'a ConstraintSystem<F>) -> Result<Self, QAPError> {
        let required = required_rows(cs);
        let domain = Radix2EvaluationDomain::<F>::new(required).ok_or(QAPError::DomainTooLarge { required })?;
        debug!(rows = required, domain = domain.size(), "built QAP domain");
        Ok(Self { cs, domain })
    }

    /// The underlying constraint system
    pub fn constraint_system(&self) -> &ConstraintSystem<F> {
        self.cs
    }

    /// Size of the evaluation domain
    pub fn domain_size(&self) -> usize {
        self.domain.size()
    }

    /// Number of quotient coefficients produced by [`QAP::witness_map`]
    pub fn quotient_len(&self) -> usize {
        self.domain_size() - 1
    }

    /// Evaluate every signal's `u_i, v_i, w_i` at `tau`.
    pub fn instance_map_at(&self, tau: F) -> QAPInstance<F> {
        let lagrange = self.domain.evaluate_all_lagrange_coefficients(tau);
        let n = self.cs.num_signals;
        let zero = <F as FieldLike>::zero();
        let (mut a, mut b, mut c) = (vec![zero; n], vec![zero; n], vec![zero; n]);

        for (constraint, l) in self.cs.constraints.iter().zip(&lagrange) {
            for (var, coeff) in constraint.a.iter() {
                a[var.index()] += *coeff * l;
            }
            for (var, coeff) in constraint.b.iter() {
                b[var.index()] += *coeff * l;
            }
            for (var, coeff) in constraint.c.iter() {
                c[var.index()] += *coeff * l;
            }
        }

        let offset = self.cs.num_constraints();
        for i in 0..=self.cs.num_public() {
            a[i] += lagrange[offset + i];
        }

        QAPInstance {
            a,
            b,
            c,
            zt: self.domain.evaluate_vanishing_polynomial(tau),
        }
    }

    fn check_length(&self, z: &[F]) -> Result<(), QAPError> {
        if z.len() != self.cs.num_signals {
            return Err(QAPError::AssignmentLength {
                expected: self.cs.num_signals,
                actual: z.len(),
            });
        }
        Ok(())
    }

    /// Row evaluations `(<A_j, z>, <B_j, z>, <C_j, z>)` padded to the domain size
    fn row_evaluations(&self, z: &[F]) -> Result<(Vec<F>, Vec<F>, Vec<F>), QAPError> {
        let rows = self
            .cs
            .constraints
            .par_iter()
            .map(|constraint| {
                Ok((
                    constraint.a.evaluate(z)?,
                    constraint.b.evaluate(z)?,
                    constraint.c.evaluate(z)?,
                ))
            })
            .collect::<Result<Vec<_>, R1CSError>>()?;

        let size = self.domain_size();
        let zero = <F as FieldLike>::zero();
        let mut a = Vec::with_capacity(size);
        let mut b = Vec::with_capacity(size);
        let mut c = Vec::with_capacity(size);
        for (av, bv, cv) in rows {
            a.push(av);
            b.push(bv);
            c.push(cv);
        }
        a.extend_from_slice(&z[..=self.cs.num_public()]);
        a.resize(size, zero);
        b.resize(size, zero);
        c.resize(size, zero);
        Ok((a, b, c))
    }

    /// Coefficients of the quotient `H(x)` for assignment `z`.
    ///
    /// The result only divides exactly when `z` satisfies every row; the
    /// caller is expected to have checked that.
    pub fn witness_map(&self, z: &[F]) -> Result<Vec<F>, QAPError> {
        self.check_length(z)?;
        let (mut a, mut b, mut c) = self.row_evaluations(z)?;
        let domain = self.domain;
        let g = F::GENERATOR;

        let to_coset = |values: &mut Vec<F>| {
            domain.ifft_in_place(values);
            distribute_powers(values, g);
            domain.fft_in_place(values);
        };
        rayon::join(|| to_coset(&mut a), || rayon::join(|| to_coset(&mut b), || to_coset(&mut c)));

        // Z is the constant g^n - 1 on the whole coset.
        let z_inv = <F as FieldLike>::inverse(&domain.evaluate_vanishing_polynomial(g))
            .ok_or(QAPError::DomainTooLarge { required: domain.size() })?;
        a.par_iter_mut().zip(b.par_iter()).zip(c.par_iter()).for_each(|((a, b), c)| {
            *a = (*a * b - c) * z_inv;
        });

        domain.ifft_in_place(&mut a);
        let g_inv = <F as FieldLike>::inverse(&g).ok_or(QAPError::DomainTooLarge { required: domain.size() })?;
        distribute_powers(&mut a, g_inv);

        a.truncate(self.quotient_len());
        debug!(coefficients = a.len(), "computed quotient polynomial");
        Ok(a)
    }

    /// Evaluate `A, B, C, Z` for assignment `z` at `point`
    pub fn evaluate_at(&self, z: &[F], point: F) -> Result<QAPEvaluation<F>, QAPError> {
        self.check_length(z)?;
        let instance = self.instance_map_at(point);
        let dot = |column: &[F]| column.iter().zip(z).fold(<F as FieldLike>::zero(), |acc, (u, v)| acc + *u * v);
        Ok(QAPEvaluation {
            a: dot(&instance.a),
            b: dot(&instance.b),
            c: dot(&instance.c),
            z: instance.zt,
        })
    }
}

/// Utility functions for QAP operations
pub mod utils {
    use super::*;

    /// Sample a point outside the domain, where `Z` does not vanish
    pub fn random_evaluation_point<F: FieldLike + FftField, R: Rng + ?Sized>(
        domain: &Radix2EvaluationDomain<F>,
        rng: &mut R,
    ) -> F {
        loop {
            let point = F::random(rng);
            if !<F as FieldLike>::is_zero(&domain.evaluate_vanishing_polynomial(point)) {
                return point;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groth16_field::{utils::evaluate_polynomial, F};
    use groth16_witness::{CircuitBuilder, InputAssignment, WitnessCalculator};
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// out = x^3 + x + 5 with x private
    fn cubic() -> (ConstraintSystem<F>, WitnessCalculator<F>) {
        let mut builder = CircuitBuilder::<F>::new();
        let x = builder.private_input("x");
        let out = builder.public_output("out");
        let x2 = builder.mul(x, x);
        let x3 = builder.mul(x2, x);
        let five = builder.constant(F::from(5u64));
        let t = builder.add(x3, x);
        let sum = builder.add(t, five);
        builder.assign(out, sum);
        let (cs, program) = builder.finish();
        (cs, WitnessCalculator::new(program).unwrap())
    }

    fn witness_for(calc: &WitnessCalculator<F>, x: u64) -> Vec<F> {
        let mut inputs = InputAssignment::new();
        inputs.insert("x", vec![F::from(x)]);
        calc.calculate(&inputs).unwrap().into_values()
    }

    #[test]
    fn test_domain_includes_public_rows() {
        let (cs, _) = cubic();
        let qap = QAP::new(&cs).unwrap();
        // 6 constraints + 1 public + constant = 8 rows
        assert_eq!(required_rows(&cs), 8);
        assert_eq!(qap.domain_size(), 8);
        assert_eq!(qap.quotient_len(), 7);
    }

    #[test]
    fn test_satisfied_rows_vanish_on_domain() {
        let (cs, calc) = cubic();
        let qap = QAP::new(&cs).unwrap();
        let z = witness_for(&calc, 3);

        for omega in qap.domain.elements().take(cs.num_constraints()) {
            let eval = qap.evaluate_at(&z, omega).unwrap();
            assert_eq!(eval.a * eval.b, eval.c);
        }
    }

    #[test]
    fn test_divisibility_identity_at_random_point() {
        let (cs, calc) = cubic();
        let qap = QAP::new(&cs).unwrap();
        let z = witness_for(&calc, 7);
        let h = qap.witness_map(&z).unwrap();
        assert_eq!(h.len(), qap.quotient_len());

        let mut rng = StdRng::seed_from_u64(1);
        let point = utils::random_evaluation_point(&qap.domain, &mut rng);
        let eval = qap.evaluate_at(&z, point).unwrap();
        assert!(eval.holds_with(evaluate_polynomial(&h, &point)));
    }

    #[test]
    fn test_unsatisfying_assignment_breaks_identity() {
        let (cs, calc) = cubic();
        let qap = QAP::new(&cs).unwrap();
        let mut z = witness_for(&calc, 2);
        z[1] += F::from(1u64);

        let h = qap.witness_map(&z).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let point = utils::random_evaluation_point(&qap.domain, &mut rng);
        let eval = qap.evaluate_at(&z, point).unwrap();
        assert!(!eval.holds_with(evaluate_polynomial(&h, &point)));
    }

    #[test]
    fn test_length_check() {
        let (cs, _) = cubic();
        let qap = QAP::new(&cs).unwrap();
        assert!(matches!(
            qap.witness_map(&[F::from(1u64)]),
            Err(QAPError::AssignmentLength { actual: 1, .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn prop_identity_holds_for_any_input(x in any::<u64>(), seed in any::<u64>()) {
            let (cs, calc) = cubic();
            let qap = QAP::new(&cs).unwrap();
            let z = witness_for(&calc, x);
            let h = qap.witness_map(&z).unwrap();

            let mut rng = StdRng::seed_from_u64(seed);
            let point = utils::random_evaluation_point(&qap.domain, &mut rng);
            let eval = qap.evaluate_at(&z, point).unwrap();
            prop_assert!(eval.holds_with(evaluate_polynomial(&h, &point)));
        }
    }
}
