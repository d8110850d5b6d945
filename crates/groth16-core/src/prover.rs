//! Groth16 prover.

use crate::msm::msm;
use crate::{Proof, ProofError};
use ark_ec::{pairing::Pairing, CurveGroup};
use ark_ff::UniformRand;
use groth16_field::FieldLike;
use groth16_qap::QAP;
use groth16_r1cs::ConstraintSystem;
use groth16_setup::ProvingKey;
use rand::Rng;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Groth16 prover
pub struct Prover;

impl Prover {
    /// Prove that `witness` satisfies `cs`.
    ///
    /// Returns the proof together with the public signals `z[1..=num_public]`
    /// that the verifier needs. Runs on the current rayon pool.
    pub fn prove<E, R>(
        pk: &ProvingKey<E>,
        cs: &ConstraintSystem<E::ScalarField>,
        witness: &[E::ScalarField],
        rng: &mut R,
    ) -> Result<(Proof<E>, Vec<E::ScalarField>), ProofError>
    where
        E: Pairing,
        E::ScalarField: FieldLike,
        R: Rng + ?Sized,
    {
        create_proof(pk, cs, witness, rng)
    }
}

fn check_key_shape<E: Pairing>(pk: &ProvingKey<E>, cs: &ConstraintSystem<E::ScalarField>, quotient_len: usize) -> Result<(), ProofError>
where
    E::ScalarField: FieldLike,
{
    let private = cs.num_signals - cs.num_public() - 1;
    let shapes = [
        ("a_query", pk.a_query.len(), cs.num_signals),
        ("b_g1_query", pk.b_g1_query.len(), cs.num_signals),
        ("b_g2_query", pk.b_g2_query.len(), cs.num_signals),
        ("l_query", pk.l_query.len(), private),
        ("h_query", pk.h_query.len(), quotient_len),
    ];
    for (name, actual, expected) in shapes {
        if actual != expected {
            return Err(ProofError::ParameterSetMismatch(format!(
                "{name} has {actual} points, circuit needs {expected}"
            )));
        }
    }
    Ok(())
}

/// Create a Groth16 proof. See [`Prover::prove`].
#[instrument(skip_all, fields(signals = cs.num_signals, constraints = cs.num_constraints()))]
pub fn create_proof<E, R>(
    pk: &ProvingKey<E>,
    cs: &ConstraintSystem<E::ScalarField>,
    witness: &[E::ScalarField],
    rng: &mut R,
) -> Result<(Proof<E>, Vec<E::ScalarField>), ProofError>
where
    E: Pairing,
    E::ScalarField: FieldLike,
    R: Rng + ?Sized,
{
    let start = Instant::now();

    if witness.len() != cs.num_signals {
        return Err(ProofError::WitnessLengthMismatch {
            expected: cs.num_signals,
            actual: witness.len(),
        });
    }
    if witness.first().map_or(true, |one| !<E::ScalarField as FieldLike>::is_one(one)) {
        return Err(ProofError::InvalidConstantSignal);
    }
    if let Some(reason) = pk.vk.mismatch(cs) {
        return Err(ProofError::ParameterSetMismatch(reason));
    }

    let qap = QAP::new(cs)?;
    check_key_shape(pk, cs, qap.quotient_len())?;

    if let Some(row) = cs.first_unsatisfied(witness) {
        return Err(ProofError::WitnessConstraintMismatch { row });
    }

    let h = qap.witness_map(witness)?;
    debug!(quotient = h.len(), "computed quotient coefficients");

    let r = E::ScalarField::rand(rng);
    let s = E::ScalarField::rand(rng);
    let private = &witness[cs.num_public() + 1..];

    let ((a_acc, b1_acc), (b2_acc, (l_acc, h_acc))) = rayon::join(
        || {
            rayon::join(
                || msm::<E::G1>(&pk.a_query, witness),
                || msm::<E::G1>(&pk.b_g1_query, witness),
            )
        },
        || {
            rayon::join(
                || msm::<E::G2>(&pk.b_g2_query, witness),
                || {
                    rayon::join(
                        || msm::<E::G1>(&pk.l_query, private),
                        || msm::<E::G1>(&pk.h_query, &h),
                    )
                },
            )
        },
    );

    let a = a_acc? + pk.vk.alpha_g1 + pk.delta_g1 * r;
    let b2 = b2_acc? + pk.vk.beta_g2 + pk.vk.delta_g2 * s;
    let b1 = b1_acc? + pk.beta_g1 + pk.delta_g1 * s;
    let c = l_acc? + h_acc? + a * s + b1 * r - pk.delta_g1 * (r * s);

    let proof = Proof {
        a: a.into_affine(),
        b: b2.into_affine(),
        c: c.into_affine(),
    };
    let public = witness[1..=cs.num_public()].to_vec();

    info!(
        public = public.len(),
        domain = qap.domain_size(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "created Groth16 proof"
    );
    Ok((proof, public))
}
