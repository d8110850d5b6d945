//! Circuit-specific trusted setup for Groth16.
//!
//! [`generate_parameters`] samples toxic waste, evaluates the QAP at `τ`
//! and commits to everything the prover and verifier need. The trapdoor
//! is zeroed as soon as the keys exist. Keys record the digest of the
//! constraint system they were built for so the prover can reject a key
//! from another circuit.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use ark_ec::{pairing::Pairing, CurveGroup, Group};
use ark_serialize::SerializationError;
use groth16_field::FieldLike;
use groth16_qap::{QAPError, QAP};
use groth16_r1cs::{ConstraintSystem, R1CSError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

pub mod keys;
pub mod toxic_waste;

pub use groth16_field;
pub use groth16_qap;
pub use groth16_r1cs;
pub use keys::{load_key, read_key, save_key, write_key, ProvingKey, VerifyingKey};
pub use toxic_waste::ToxicWaste;

/// Errors raised during setup or key I/O
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The constraint system failed structural validation
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(#[from] R1CSError),

    /// QAP reduction failed
    #[error("QAP error: {0}")]
    QAP(#[from] QAPError),

    /// A trapdoor value had no inverse
    #[error("Degenerate setup parameter {0}")]
    DegenerateParameter(&'static str),

    /// Key (de)serialization failed
    #[error("Key serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Key file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deterministic RNG for a seed, or an entropy-seeded one
pub fn seeded_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    }
}

/// `[s_i]` for every scalar, normalized to affine in one batch
fn commit_all<G: CurveGroup>(generator: G, scalars: &[G::ScalarField]) -> Vec<G::Affine> {
    let points: Vec<G> = scalars.par_iter().map(|s| generator * s).collect();
    G::normalize_batch(&points)
}

/// Run the setup for `cs` with fresh toxic waste.
pub fn generate_parameters<E, R>(cs: &ConstraintSystem<E::ScalarField>, rng: &mut R) -> Result<ProvingKey<E>, SetupError>
where
    E: Pairing,
    E::ScalarField: FieldLike,
    R: Rng + ?Sized,
{
    cs.validate()?;
    let qap = QAP::new(cs)?;
    let toxic = ToxicWaste::sample(&qap, rng);
    generate_parameters_with(&qap, &toxic)
}

/// Run the setup for `qap` with caller-supplied toxic waste.
pub fn generate_parameters_with<E>(
    qap: &QAP<'_, E::ScalarField>,
    toxic: &ToxicWaste<E::ScalarField>,
) -> Result<ProvingKey<E>, SetupError>
where
    E: Pairing,
    E::ScalarField: FieldLike,
{
    let start = Instant::now();
    let cs = qap.constraint_system();
    let num_public = cs.num_public();

    let gamma_inv = <E::ScalarField as FieldLike>::inverse(&toxic.gamma).ok_or(SetupError::DegenerateParameter("gamma"))?;
    let delta_inv = <E::ScalarField as FieldLike>::inverse(&toxic.delta).ok_or(SetupError::DegenerateParameter("delta"))?;

    let instance = qap.instance_map_at(toxic.tau);
    debug!(signals = cs.num_signals, "evaluated QAP at tau");

    let combined: Vec<E::ScalarField> = (0..cs.num_signals)
        .into_par_iter()
        .map(|i| toxic.beta * instance.a[i] + toxic.alpha * instance.b[i] + instance.c[i])
        .collect();
    let gamma_abc: Vec<_> = combined[..=num_public].iter().map(|v| *v * gamma_inv).collect();
    let l: Vec<_> = combined[num_public + 1..].iter().map(|v| *v * delta_inv).collect();

    let mut h = Vec::with_capacity(qap.quotient_len());
    let mut power = instance.zt * delta_inv;
    for _ in 0..qap.quotient_len() {
        h.push(power);
        power *= toxic.tau;
    }

    let g1 = E::G1::generator();
    let g2 = E::G2::generator();

    let vk = VerifyingKey {
        alpha_g1: (g1 * toxic.alpha).into_affine(),
        beta_g2: (g2 * toxic.beta).into_affine(),
        gamma_g2: (g2 * toxic.gamma).into_affine(),
        delta_g2: (g2 * toxic.delta).into_affine(),
        gamma_abc_g1: commit_all(g1, &gamma_abc),
        circuit_digest: cs.digest().as_bytes().to_vec(),
        num_signals: cs.num_signals as u64,
    };

    let pk = ProvingKey {
        vk,
        beta_g1: (g1 * toxic.beta).into_affine(),
        delta_g1: (g1 * toxic.delta).into_affine(),
        a_query: commit_all(g1, &instance.a),
        b_g1_query: commit_all(g1, &instance.b),
        b_g2_query: commit_all(g2, &instance.b),
        h_query: commit_all(g1, &h),
        l_query: commit_all(g1, &l),
    };

    info!(
        constraints = cs.num_constraints(),
        public = num_public,
        domain = qap.domain_size(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generated Groth16 parameters"
    );
    Ok(pk)
}
