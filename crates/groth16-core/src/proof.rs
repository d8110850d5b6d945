//! Proof object and its encodings.
//!
//! Binary form is the compressed `ark-serialize` encoding of `(A, B, C)`.
//! The JSON form carries the same compressed points as hex strings plus
//! the curve name, and public inputs travel as a JSON array of decimal
//! strings.

use crate::ProofError;
use ark_ec::pairing::Pairing;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use groth16_field::{parse_literal, FieldLike};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A Groth16 proof
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Proof<E: Pairing> {
    /// π_A in G1
    pub a: E::G1Affine,
    /// π_B in G2
    pub b: E::G2Affine,
    /// π_C in G1
    pub c: E::G1Affine,
}

/// JSON view of a proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofJson {
    /// Always `groth16`
    pub protocol: String,
    /// Curve the points live on
    pub curve: String,
    /// Compressed π_A, hex
    pub pi_a: String,
    /// Compressed π_B, hex
    pub pi_b: String,
    /// Compressed π_C, hex
    pub pi_c: String,
}

fn point_hex<T: CanonicalSerialize>(point: &T) -> Result<String, ProofError> {
    let mut bytes = Vec::with_capacity(point.compressed_size());
    point.serialize_compressed(&mut bytes)?;
    Ok(hex::encode(bytes))
}

fn point_from_hex<T: CanonicalDeserialize>(field: &str, text: &str) -> Result<T, ProofError> {
    let bytes = hex::decode(text).map_err(|err| ProofError::InvalidEncoding(format!("{field}: {err}")))?;
    Ok(T::deserialize_compressed(&bytes[..])?)
}

impl<E: Pairing> Proof<E>
where
    E::ScalarField: FieldLike,
{
    /// Compressed binary encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        let mut bytes = Vec::with_capacity(self.compressed_size());
        self.serialize_compressed(&mut bytes)?;
        Ok(bytes)
    }

    /// Decode [`Proof::to_bytes`] output, checking every point
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        Ok(Self::deserialize_compressed(bytes)?)
    }

    /// JSON view with hex points
    pub fn to_json(&self) -> Result<ProofJson, ProofError> {
        Ok(ProofJson {
            protocol: "groth16".to_string(),
            curve: <E::ScalarField as FieldLike>::CURVE.name().to_string(),
            pi_a: point_hex(&self.a)?,
            pi_b: point_hex(&self.b)?,
            pi_c: point_hex(&self.c)?,
        })
    }

    /// Rebuild a proof from its JSON view
    pub fn from_json(json: &ProofJson) -> Result<Self, ProofError> {
        if json.protocol != "groth16" {
            return Err(ProofError::InvalidEncoding(format!("unsupported protocol {}", json.protocol)));
        }
        let curve = <E::ScalarField as FieldLike>::CURVE.name();
        if json.curve != curve {
            return Err(ProofError::InvalidEncoding(format!(
                "proof is for {}, expected {curve}",
                json.curve
            )));
        }
        Ok(Self {
            a: point_from_hex("pi_a", &json.pi_a)?,
            b: point_from_hex("pi_b", &json.pi_b)?,
            c: point_from_hex("pi_c", &json.pi_c)?,
        })
    }

    /// Write the JSON view to `path`
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ProofError> {
        let text = serde_json::to_string_pretty(&self.to_json()?)
            .map_err(|err| ProofError::InvalidEncoding(err.to_string()))?;
        fs::write(path, text).map_err(|err| ProofError::InvalidEncoding(err.to_string()))
    }

    /// Read a proof saved with [`Proof::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ProofError> {
        let text = fs::read_to_string(path).map_err(|err| ProofError::InvalidEncoding(err.to_string()))?;
        let json: ProofJson = serde_json::from_str(&text).map_err(|err| ProofError::InvalidEncoding(err.to_string()))?;
        Self::from_json(&json)
    }
}

/// Public inputs as a JSON array of decimal strings
pub fn public_inputs_to_json<F: FieldLike>(values: &[F]) -> String {
    let strings: Vec<String> = values.iter().map(FieldLike::to_decimal_string).collect();
    serde_json::Value::from(strings).to_string()
}

/// Parse a JSON array of decimal strings or integers into field elements
pub fn public_inputs_from_json<F: FieldLike>(text: &str) -> Result<Vec<F>, ProofError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| ProofError::InvalidEncoding(err.to_string()))?;
    let items = value
        .as_array()
        .ok_or_else(|| ProofError::InvalidEncoding("public inputs must be a JSON array".to_string()))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let literal = match item {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ProofError::InvalidEncoding(format!(
                        "public input {i} is not a number: {other}"
                    )))
                }
            };
            parse_literal(&literal).map_err(|err| ProofError::InvalidEncoding(format!("public input {i}: {err}")))
        })
        .collect()
}
