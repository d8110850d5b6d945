//! Groth16 verification, single and batched.
//!
//! Checks `e(A, B) = e(α, β) · e(IC, γ) · e(C, δ)` where
//! `IC = Σ x_i · gamma_abc_i` over the constant and the public inputs. The
//! prepared key caches `e(α, β)` and the negated `γ`, `δ` so a check is one
//! multi-pairing.

use crate::msm::msm;
use crate::{Proof, ProofError};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{UniformRand, Zero};
use groth16_field::FieldLike;
use groth16_setup::VerifyingKey;
use rand::Rng;
use tracing::{debug, instrument};

/// Verifying key with its pairing-side precomputation
#[derive(Clone, Debug)]
pub struct PreparedVerifyingKey<E: Pairing> {
    /// The key itself
    pub vk: VerifyingKey<E>,
    /// `e(α, β)`
    pub alpha_g1_beta_g2: PairingOutput<E>,
    /// `-γ` prepared for pairing
    pub gamma_g2_neg_pc: E::G2Prepared,
    /// `-δ` prepared for pairing
    pub delta_g2_neg_pc: E::G2Prepared,
}

/// Precompute the pairing-side data of `vk`
pub fn prepare_verifying_key<E: Pairing>(vk: &VerifyingKey<E>) -> PreparedVerifyingKey<E> {
    PreparedVerifyingKey {
        vk: vk.clone(),
        alpha_g1_beta_g2: E::pairing(vk.alpha_g1, vk.beta_g2),
        gamma_g2_neg_pc: (-vk.gamma_g2.into_group()).into_affine().into(),
        delta_g2_neg_pc: (-vk.delta_g2.into_group()).into_affine().into(),
    }
}

fn check_input_count<E: Pairing>(vk: &VerifyingKey<E>, public: &[E::ScalarField]) -> Result<(), ProofError> {
    // gamma_abc_0 carries the constant signal and must always be present
    if vk.gamma_abc_g1.is_empty() {
        return Err(ProofError::ParameterSetMismatch(
            "verifying key has no input commitment bases".into(),
        ));
    }
    if public.len() != vk.num_public() {
        return Err(ProofError::PublicInputCount {
            expected: vk.num_public(),
            actual: public.len(),
        });
    }
    Ok(())
}

/// `IC = gamma_abc_0 + Σ x_i · gamma_abc_{i+1}`
fn input_commitment<E: Pairing>(vk: &VerifyingKey<E>, public: &[E::ScalarField]) -> Result<E::G1, ProofError> {
    check_input_count(vk, public)?;
    let tail: E::G1 = msm(&vk.gamma_abc_g1[1..], public)?;
    Ok(tail + vk.gamma_abc_g1[0])
}

/// Verify `proof` against the public inputs.
///
/// `Ok(false)` means the pairing check failed; errors are reserved for
/// inputs that cannot be checked at all.
#[instrument(skip_all, fields(public = public.len()))]
pub fn verify_proof<E>(pvk: &PreparedVerifyingKey<E>, proof: &Proof<E>, public: &[E::ScalarField]) -> Result<bool, ProofError>
where
    E: Pairing,
    E::ScalarField: FieldLike,
{
    let ic = input_commitment(&pvk.vk, public)?.into_affine();
    let lhs = E::multi_pairing(
        [proof.a, ic, proof.c],
        [
            E::G2Prepared::from(proof.b),
            pvk.gamma_g2_neg_pc.clone(),
            pvk.delta_g2_neg_pc.clone(),
        ],
    );
    let valid = lhs == pvk.alpha_g1_beta_g2;
    debug!(valid, "verified Groth16 proof");
    Ok(valid)
}

/// Groth16 verifier
pub struct Verifier;

impl Verifier {
    /// Verify a proof with an unprepared key
    pub fn verify<E>(vk: &VerifyingKey<E>, proof: &Proof<E>, public: &[E::ScalarField]) -> Result<bool, ProofError>
    where
        E: Pairing,
        E::ScalarField: FieldLike,
    {
        check_input_count(vk, public)?;
        verify_proof(&prepare_verifying_key(vk), proof, public)
    }
}

/// Batch verification for multiple proofs under one key
pub struct BatchVerifier;

impl BatchVerifier {
    /// Verify all proofs at once with a random linear combination.
    ///
    /// Checks `Σ r_i·e(A_i, B_i) = (Σ r_i)·e(α, β) + e(Σ r_i·IC_i, γ) + e(Σ r_i·C_i, δ)`
    /// in the additive notation of the target group. One bad proof makes
    /// the whole batch fail, except with negligible probability.
    #[instrument(skip_all, fields(proofs = proofs_and_inputs.len()))]
    pub fn verify_batch<E, R>(
        pvk: &PreparedVerifyingKey<E>,
        proofs_and_inputs: &[(Proof<E>, Vec<E::ScalarField>)],
        rng: &mut R,
    ) -> Result<bool, ProofError>
    where
        E: Pairing,
        E::ScalarField: FieldLike,
        R: Rng + ?Sized,
    {
        if proofs_and_inputs.is_empty() {
            return Ok(true);
        }

        let mut r_sum = <E::ScalarField as Zero>::zero();
        let mut ic_acc = E::G1::zero();
        let mut c_acc = E::G1::zero();
        let mut scaled_a = Vec::with_capacity(proofs_and_inputs.len());
        let mut b_points = Vec::with_capacity(proofs_and_inputs.len() + 2);

        for (proof, public) in proofs_and_inputs {
            let r = E::ScalarField::rand(rng);
            r_sum += r;
            ic_acc += input_commitment(&pvk.vk, public)? * r;
            c_acc += proof.c * r;
            scaled_a.push(proof.a * r);
            b_points.push(E::G2Prepared::from(proof.b));
        }

        let mut g1_points = E::G1::normalize_batch(&scaled_a);
        g1_points.push(ic_acc.into_affine());
        g1_points.push(c_acc.into_affine());
        b_points.push(pvk.gamma_g2_neg_pc.clone());
        b_points.push(pvk.delta_g2_neg_pc.clone());

        let lhs = E::multi_pairing(g1_points, b_points);
        let valid = lhs == pvk.alpha_g1_beta_g2 * r_sum;
        debug!(valid, "verified Groth16 batch");
        Ok(valid)
    }
}
