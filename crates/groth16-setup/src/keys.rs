//! Groth16 proving and verifying keys.

use crate::SetupError;
use ark_ec::pairing::Pairing;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use groth16_field::FieldLike;
use groth16_r1cs::{CircuitDigest, ConstraintSystem};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Verifying key
#[derive(Debug, Clone, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct VerifyingKey<E: Pairing> {
    /// `[α]₁`
    pub alpha_g1: E::G1Affine,
    /// `[β]₂`
    pub beta_g2: E::G2Affine,
    /// `[γ]₂`
    pub gamma_g2: E::G2Affine,
    /// `[δ]₂`
    pub delta_g2: E::G2Affine,
    /// `[(β·u_i + α·v_i + w_i)/γ]₁` for the constant and each public signal
    pub gamma_abc_g1: Vec<E::G1Affine>,
    /// Digest of the constraint system the key was generated for
    pub circuit_digest: Vec<u8>,
    /// Signal count of that system
    pub num_signals: u64,
}

impl<E: Pairing> VerifyingKey<E> {
    /// Number of public signals the key expects
    pub fn num_public(&self) -> usize {
        self.gamma_abc_g1.len().saturating_sub(1)
    }

    /// Recorded circuit digest
    pub fn digest(&self) -> Option<CircuitDigest> {
        CircuitDigest::from_slice(&self.circuit_digest)
    }

    /// Why this key does not belong to `cs`, if it does not
    pub fn mismatch(&self, cs: &ConstraintSystem<E::ScalarField>) -> Option<String>
    where
        E::ScalarField: FieldLike,
    {
        if self.num_signals != cs.num_signals as u64 {
            return Some(format!(
                "key built for {} signals, circuit has {}",
                self.num_signals, cs.num_signals
            ));
        }
        if self.num_public() != cs.num_public() {
            return Some(format!(
                "key built for {} public signals, circuit has {}",
                self.num_public(),
                cs.num_public()
            ));
        }
        let expected = cs.digest();
        if self.digest() != Some(expected) {
            return Some(format!("key digest differs from circuit digest {expected}"));
        }
        None
    }
}

/// Proving key; embeds the verifying key
#[derive(Debug, Clone, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProvingKey<E: Pairing> {
    /// Matching verifying key
    pub vk: VerifyingKey<E>,
    /// `[β]₁`
    pub beta_g1: E::G1Affine,
    /// `[δ]₁`
    pub delta_g1: E::G1Affine,
    /// `[u_i(τ)]₁` per signal
    pub a_query: Vec<E::G1Affine>,
    /// `[v_i(τ)]₁` per signal
    pub b_g1_query: Vec<E::G1Affine>,
    /// `[v_i(τ)]₂` per signal
    pub b_g2_query: Vec<E::G2Affine>,
    /// `[τ^k·Z(τ)/δ]₁` for `k < n − 1`
    pub h_query: Vec<E::G1Affine>,
    /// `[(β·u_i + α·v_i + w_i)/δ]₁` per private signal
    pub l_query: Vec<E::G1Affine>,
}

impl<E: Pairing> ProvingKey<E> {
    /// The embedded verifying key
    pub fn verifying_key(&self) -> &VerifyingKey<E> {
        &self.vk
    }
}

/// Serialize a key (compressed points).
pub fn write_key<T: CanonicalSerialize, W: Write>(key: &T, writer: W) -> Result<(), SetupError> {
    key.serialize_compressed(writer)?;
    Ok(())
}

/// Deserialize a key, checking every point.
pub fn read_key<T: CanonicalDeserialize, R: Read>(reader: R) -> Result<T, SetupError> {
    Ok(T::deserialize_compressed(reader)?)
}

/// Write a key file.
pub fn save_key<T: CanonicalSerialize, P: AsRef<Path>>(key: &T, path: P) -> Result<(), SetupError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_key(key, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a key file.
pub fn load_key<T: CanonicalDeserialize, P: AsRef<Path>>(path: P) -> Result<T, SetupError> {
    read_key(BufReader::new(File::open(path)?))
}
