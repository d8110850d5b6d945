//! Workloads for the pipeline benchmarks.
//!
//! [`power_chain`] scales a circuit to any number of multiplication rows so
//! that each stage can be timed at several sizes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use ark_bn254::{Fr, G1Affine, G1Projective};
use ark_ec::CurveGroup;
use ark_ff::UniformRand;
use groth16_field::FieldLike;
use groth16_r1cs::{write_r1cs, ConstraintSystem};
use groth16_witness::{CircuitBuilder, InputAssignment, WitnessProgram};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Circuit sizes the benchmarks sweep over
pub const SIZES: [usize; 3] = [64, 512, 4096];

/// A circuit together with an input that satisfies it
pub struct Workload<F: FieldLike> {
    /// Constraint system
    pub cs: ConstraintSystem<F>,
    /// Witness program
    pub program: WitnessProgram<F>,
    /// Input assignment
    pub inputs: InputAssignment<F>,
}

/// `out <== x^(rows + 1)` as `rows` chained multiplications, `rows >= 1`
pub fn power_chain<F: FieldLike>(rows: usize) -> Workload<F> {
    let mut builder = CircuitBuilder::<F>::new();
    let out = builder.public_output("out");
    let x = builder.private_input("x");
    let mut acc = x;
    for _ in 1..rows {
        acc = builder.mul(acc, x);
    }
    builder.mul_into(out, acc, x);
    let (cs, program) = builder.finish();

    let mut inputs = InputAssignment::new();
    inputs.insert("x", vec![F::from_u64(3)]);
    Workload { cs, program, inputs }
}

/// The `.r1cs` encoding of `cs`, for loader benchmarks
pub fn r1cs_bytes<F: FieldLike>(cs: &ConstraintSystem<F>) -> Vec<u8> {
    let mut bytes = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_r1cs(cs, &mut bytes);
    bytes
}

/// `n` random BN254 G1 bases and scalars from a fixed seed
pub fn msm_inputs(n: usize) -> (Vec<G1Affine>, Vec<Fr>) {
    let mut rng = ChaCha20Rng::seed_from_u64(12345);
    let bases = (0..n).map(|_| G1Projective::rand(&mut rng).into_affine()).collect();
    let scalars = (0..n).map(|_| Fr::rand(&mut rng)).collect();
    (bases, scalars)
}
