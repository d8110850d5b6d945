//! Field operations and traits for the Groth16 proving pipeline.
//!
//! This crate provides the field arithmetic foundation shared by every
//! pipeline stage. Two scalar fields are supported: BN254 (the default
//! field of circom circuits) and BLS12-381. Circuit artifacts carry their
//! field prime, and [`Curve::from_prime_le`] maps that prime back to the
//! curve the prover must use.
//!
//! Besides the [`FieldLike`] trait the crate holds the two pieces of
//! field plumbing every binary format needs: canonical little-endian
//! element codecs ([`bytes`]) and range-checked parsing of decimal or hex
//! literals ([`literal`]).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use ark_ff::{BigInteger, FftField, Field, One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

pub mod bytes;
pub mod literal;

pub use ark_bls12_381::Fr as Bls12381Fr;
pub use ark_bn254::Fr as Bn254Fr;
pub use literal::{parse_literal, LiteralError};

/// Alias for the default field used across tests and examples: the BN254 scalar field
pub type F = Bn254Fr;

/// Trait representing field-like operations needed by the pipeline
///
/// This trait provides a convenient abstraction over arkworks field operations
/// and ensures compatibility with our constraint system, witness evaluator and
/// polynomial operations.
pub trait FieldLike:
    Field + PrimeField + FftField + CanonicalSerialize + CanonicalDeserialize + Debug + Display + Send + Sync + 'static
{
    /// The curve whose scalar field this is
    const CURVE: Curve;

    /// Returns the zero element of the field
    fn zero() -> Self {
        <Self as Zero>::zero()
    }

    /// Returns the one element of the field
    fn one() -> Self {
        <Self as One>::one()
    }

    /// Check if the element is zero
    fn is_zero(&self) -> bool {
        <Self as Zero>::is_zero(self)
    }

    /// Check if the element is one
    fn is_one(&self) -> bool {
        <Self as One>::is_one(self)
    }

    /// Compute the multiplicative inverse
    fn inverse(&self) -> Option<Self> {
        <Self as Field>::inverse(self)
    }

    /// Generate a random field element
    fn random<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self::rand(rng)
    }

    /// Convert from a u64 value
    fn from_u64(val: u64) -> Self {
        Self::from(val)
    }

    /// Size in bytes of a serialized element, rounded up to whole 64-bit limbs
    /// (the `n8` of the circom file formats).
    fn byte_len() -> usize {
        (Self::MODULUS_BIT_SIZE as usize + 63) / 64 * 8
    }

    /// The field modulus as an unbounded integer
    fn modulus_biguint() -> BigUint {
        BigUint::from_bytes_le(&Self::MODULUS.to_bytes_le())
    }

    /// The field modulus encoded little-endian in [`FieldLike::byte_len`] bytes
    fn modulus_le_bytes() -> Vec<u8> {
        let mut bytes = Self::MODULUS.to_bytes_le();
        bytes.resize(Self::byte_len(), 0);
        bytes
    }

    /// Canonical integer value of the element
    fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.into_bigint().to_bytes_le())
    }

    /// Converts an integer to a field element, rejecting values `>= p`
    fn from_biguint_checked(value: &BigUint) -> Option<Self> {
        if value >= &Self::modulus_biguint() {
            return None;
        }
        Some(Self::from_le_bytes_mod_order(&value.to_bytes_le()))
    }

    /// Decimal representation of the canonical value (used for `public.json`)
    fn to_decimal_string(&self) -> String {
        self.to_biguint().to_string()
    }
}

impl FieldLike for Bn254Fr {
    const CURVE: Curve = Curve::Bn254;
}

impl FieldLike for Bls12381Fr {
    const CURVE: Curve = Curve::Bls12_381;
}

/// Pairing-friendly curves whose scalar fields the pipeline supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Curve {
    /// BN254 (alt_bn128), circom's default prime
    Bn254,
    /// BLS12-381
    #[serde(rename = "bls12-381")]
    Bls12_381,
}

impl Curve {
    /// Identify a curve from the little-endian field prime stored in an artifact header.
    ///
    /// Trailing zero bytes are ignored so that primes padded to a wider `n8`
    /// still match.
    pub fn from_prime_le(prime: &[u8]) -> Option<Self> {
        let prime = BigUint::from_bytes_le(prime);
        if prime == Bn254Fr::modulus_biguint() {
            Some(Curve::Bn254)
        } else if prime == Bls12381Fr::modulus_biguint() {
            Some(Curve::Bls12_381)
        } else {
            None
        }
    }

    /// Human readable curve name
    pub fn name(&self) -> &'static str {
        match self {
            Curve::Bn254 => "bn254",
            Curve::Bls12_381 => "bls12-381",
        }
    }
}

impl Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur in field operations
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Encoded element is not below the modulus
    #[error("Non-canonical field element encoding")]
    NonCanonical,

    /// Encoded element width does not match the field
    #[error("Field element width {actual} bytes, expected {expected}")]
    WidthMismatch {
        /// Width required by the field
        expected: usize,
        /// Width found in the input
        actual: usize,
    },

    /// Underlying reader failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Utility functions for field operations
pub mod utils {
    use super::*;

    /// Create a vector from a slice of u64 values
    pub fn field_vec_from_u64<F: FieldLike>(values: &[u64]) -> Vec<F> {
        values.iter().map(|&x| F::from_u64(x)).collect()
    }

    /// Evaluate a polynomial at a given point using Horner's method
    pub fn evaluate_polynomial<F: FieldLike>(coeffs: &[F], point: &F) -> F {
        if coeffs.is_empty() {
            return <F as FieldLike>::zero();
        }

        let mut result = coeffs[coeffs.len() - 1];
        for coeff in coeffs.iter().rev().skip(1) {
            result = result * point + coeff;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_basic_operations() {
        let a = F::from(5u64);
        let b = F::from(3u64);

        assert_eq!(a + b, F::from(8u64));
        assert_eq!(a * b, F::from(15u64));
        assert_eq!(a - b, F::from(2u64));

        assert!(!<F as FieldLike>::is_zero(&a));
        assert!(<F as FieldLike>::is_zero(&<F as FieldLike>::zero()));
        assert!(<F as FieldLike>::is_one(&<F as FieldLike>::one()));
    }

    #[test]
    fn test_field_inverse() {
        let a = F::from(5u64);
        let inv_a = <F as FieldLike>::inverse(&a).unwrap();
        assert_eq!(a * inv_a, <F as FieldLike>::one());
    }

    #[test]
    fn test_polynomial_evaluation() {
        // 2x^2 + 3x + 1 at x = 2 is 15
        let coeffs = utils::field_vec_from_u64::<F>(&[1, 3, 2]);
        let result = utils::evaluate_polynomial(&coeffs, &F::from(2u64));
        assert_eq!(result, F::from(15u64));
    }

    #[test]
    fn test_byte_len_matches_circom() {
        assert_eq!(<Bn254Fr as FieldLike>::byte_len(), 32);
        assert_eq!(<Bls12381Fr as FieldLike>::byte_len(), 32);
    }

    #[test]
    fn test_curve_detection() {
        assert_eq!(Curve::from_prime_le(&Bn254Fr::modulus_le_bytes()), Some(Curve::Bn254));
        assert_eq!(
            Curve::from_prime_le(&Bls12381Fr::modulus_le_bytes()),
            Some(Curve::Bls12_381)
        );

        let mut padded = Bn254Fr::modulus_le_bytes();
        padded.extend_from_slice(&[0u8; 8]);
        assert_eq!(Curve::from_prime_le(&padded), Some(Curve::Bn254));

        assert_eq!(Curve::from_prime_le(&[7u8; 32]), None);
    }

    #[test]
    fn test_biguint_checked_boundary() {
        let p = F::modulus_biguint();
        assert!(F::from_biguint_checked(&p).is_none());

        let p_minus_one = &p - 1u32;
        let element = F::from_biguint_checked(&p_minus_one).unwrap();
        assert_eq!(element, -<F as FieldLike>::one());
        assert_eq!(element.to_biguint(), p_minus_one);
    }
}
