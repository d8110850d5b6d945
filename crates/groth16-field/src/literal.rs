//! Range-checked parsing of integer literals into field elements.
//!
//! Accepted forms are decimal (`"42"`), hex (`"0x2a"`) and negated decimal
//! or hex (`"-1"`, which maps to `p - 1`). Literals are never reduced
//! modulo `p`: a magnitude `>= p` is an error.

use crate::FieldLike;
use num_bigint::BigUint;

/// Errors produced while parsing a literal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    /// The text is not an integer literal
    #[error("invalid integer literal `{0}`")]
    Invalid(String),

    /// The literal's magnitude is not below the field modulus
    #[error("literal `{0}` is not below the field modulus")]
    OutOfRange(String),
}

/// Parse a literal into an unbounded integer magnitude plus sign.
fn parse_magnitude(text: &str) -> Result<(bool, BigUint), LiteralError> {
    let invalid = || LiteralError::Invalid(text.to_string());
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (digits, radix) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (body, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let magnitude = BigUint::parse_bytes(digits.as_bytes(), radix).ok_or_else(invalid)?;
    Ok((negative, magnitude))
}

/// Parse a decimal or hex literal into a field element.
pub fn parse_literal<F: FieldLike>(text: &str) -> Result<F, LiteralError> {
    let (negative, magnitude) = parse_magnitude(text)?;
    let value = F::from_biguint_checked(&magnitude).ok_or_else(|| LiteralError::OutOfRange(text.to_string()))?;
    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bls12381Fr, F};
    use proptest::prelude::*;

    #[test]
    fn test_decimal_and_hex() {
        assert_eq!(parse_literal::<F>("42").unwrap(), F::from(42u64));
        assert_eq!(parse_literal::<F>("0x2a").unwrap(), F::from(42u64));
        assert_eq!(parse_literal::<F>(" 7 ").unwrap(), F::from(7u64));
        assert_eq!(parse_literal::<F>("-1").unwrap(), -F::from(1u64));
        assert_eq!(parse_literal::<F>("-0").unwrap(), F::from(0u64));
    }

    #[test]
    fn test_rejects_garbage() {
        for text in ["", "-", "0x", "12a", "1.5", "1e3", "+3", "1_000"] {
            assert!(
                matches!(parse_literal::<F>(text), Err(LiteralError::Invalid(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_modulus_boundary() {
        let p = F::modulus_biguint();
        let at_modulus = p.to_string();
        let below_modulus = (&p - 1u32).to_string();

        assert!(matches!(
            parse_literal::<F>(&at_modulus),
            Err(LiteralError::OutOfRange(_))
        ));
        assert_eq!(parse_literal::<F>(&below_modulus).unwrap(), -F::from(1u64));
        assert!(matches!(
            parse_literal::<F>(&format!("-{at_modulus}")),
            Err(LiteralError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_boundary_depends_on_field() {
        // The BN254 modulus is below the BLS12-381 one, so it is a valid BLS12-381 literal.
        let bn_modulus = F::modulus_biguint().to_string();
        assert!(parse_literal::<F>(&bn_modulus).is_err());
        assert!(parse_literal::<Bls12381Fr>(&bn_modulus).is_ok());
    }

    proptest! {
        #[test]
        fn prop_u64_literals_roundtrip(x in any::<u64>()) {
            prop_assert_eq!(parse_literal::<F>(&x.to_string()).unwrap(), F::from(x));
            prop_assert_eq!(parse_literal::<F>(&format!("{x:#x}")).unwrap(), F::from(x));
        }
    }
}
