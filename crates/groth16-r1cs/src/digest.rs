//! BLAKE2s content digest of a constraint system.
//!
//! Proving keys record the digest of the system they were generated for so
//! the prover can refuse a key built for a different circuit.

use crate::ConstraintSystem;
use blake2::{Blake2s256, Digest};
use groth16_field::{bytes::to_le_bytes, FieldLike};
use std::fmt;

/// 32-byte circuit digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircuitDigest(pub [u8; 32]);

impl CircuitDigest {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Rebuild a digest from a byte slice, if it has the right length
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(CircuitDigest)
    }
}

impl fmt::Display for CircuitDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

const DOMAIN_TAG: &[u8] = b"groth16-r1cs-digest-v1";

pub(crate) fn circuit_digest<F: FieldLike>(cs: &ConstraintSystem<F>) -> CircuitDigest {
    let n8 = F::byte_len();
    let mut hasher = Blake2s256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update(F::modulus_le_bytes());

    for count in [
        cs.num_signals,
        cs.num_public_outputs,
        cs.num_public_inputs,
        cs.num_private_inputs,
        cs.num_constraints(),
    ] {
        hasher.update((count as u64).to_le_bytes());
    }

    for constraint in &cs.constraints {
        for lc in [&constraint.a, &constraint.b, &constraint.c] {
            hasher.update((lc.len() as u32).to_le_bytes());
            for (var, coeff) in lc.iter() {
                hasher.update((var.index() as u32).to_le_bytes());
                hasher.update(to_le_bytes(coeff, n8));
            }
        }
    }

    CircuitDigest(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use crate::{ConstraintSystem, LinearCombination};
    use groth16_field::{Bls12381Fr, FieldLike, F};

    fn square<F: FieldLike>() -> ConstraintSystem<F> {
        let mut cs = ConstraintSystem::<F>::new(1, 0, 1);
        let x = LinearCombination::from_variable(cs.private_input(0));
        cs.enforce_multiplication(x.clone(), x, LinearCombination::from_variable(cs.public_output(0)));
        cs
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(square::<F>().digest(), square::<F>().digest());
        assert_eq!(square::<F>().digest().to_string().len(), 64);
    }

    #[test]
    fn test_digest_tracks_content() {
        let base = square::<F>();

        let mut extra_row = base.clone();
        extra_row.enforce_equal(
            LinearCombination::from_variable(extra_row.public_output(0)),
            LinearCombination::from_variable(extra_row.public_output(0)),
        );
        assert_ne!(base.digest(), extra_row.digest());

        let mut more_public = base.clone();
        more_public.num_public_inputs += 1;
        assert_ne!(base.digest(), more_public.digest());

        // Same topology over a different field is a different circuit.
        assert_ne!(base.digest().0, square::<Bls12381Fr>().digest().0);
    }
}
