//! Little-endian field element codecs shared by the `.r1cs`, `.wtns` and
//! witness program formats.

use crate::{FieldError, FieldLike};
use ark_ff::{BigInteger, PrimeField};
use std::io::{Read, Write};

/// Encode `value` into exactly `n8` little-endian bytes.
pub fn to_le_bytes<F: FieldLike>(value: &F, n8: usize) -> Vec<u8> {
    let mut bytes = value.into_bigint().to_bytes_le();
    bytes.resize(n8, 0);
    bytes
}

/// Decode a canonical element from little-endian bytes.
///
/// Values `>= p` are rejected rather than reduced.
pub fn from_le_bytes<F: FieldLike>(bytes: &[u8]) -> Result<F, FieldError> {
    let value = num_bigint::BigUint::from_bytes_le(bytes);
    F::from_biguint_checked(&value).ok_or(FieldError::NonCanonical)
}

/// Read one `n8`-byte element from a reader.
pub fn read_element<F: FieldLike, R: Read>(reader: &mut R, n8: usize) -> Result<F, FieldError> {
    let mut buf = vec![0u8; n8];
    reader.read_exact(&mut buf)?;
    from_le_bytes(&buf)
}

/// Write one element as `n8` bytes.
pub fn write_element<F: FieldLike, W: Write>(writer: &mut W, value: &F, n8: usize) -> Result<(), FieldError> {
    if n8 < F::byte_len() {
        return Err(FieldError::WidthMismatch {
            expected: F::byte_len(),
            actual: n8,
        });
    }
    writer.write_all(&to_le_bytes(value, n8))?;
    Ok(())
}
