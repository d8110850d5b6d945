//! Named circuit inputs parsed from JSON.
//!
//! The document is an object mapping input names to a literal or a nested
//! array of literals, for example `{"a": "1", "b": [2, "0x3"]}`. Literals
//! are JSON integers or strings holding a decimal, `0x` hex or negated
//! value. Nested arrays are flattened row-major. No literal is reduced
//! modulo the field prime.

use crate::{program::WitnessProgram, WitnessError};
use groth16_field::{parse_literal, FieldLike, LiteralError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Flattened values per input name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputAssignment<F: FieldLike> {
    values: BTreeMap<String, Vec<F>>,
}

impl<F: FieldLike> InputAssignment<F> {
    /// Empty assignment
    pub fn new() -> Self {
        Self { values: BTreeMap::new() }
    }

    /// Set (or replace) the values for `name`
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<F>) {
        self.values.insert(name.into(), values);
    }

    /// Values assigned to `name`
    pub fn get(&self, name: &str) -> Option<&[F]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Iterate over names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, WitnessError> {
        let document: Value = serde_json::from_str(text).map_err(|err| WitnessError::InvalidInputJson(err.to_string()))?;
        let Value::Object(map) = document else {
            return Err(WitnessError::InvalidInputJson("top level must be an object".into()));
        };

        let mut assignment = Self::new();
        for (name, value) in &map {
            let mut flat = Vec::new();
            flatten(name, value, &mut flat)?;
            assignment.insert(name.clone(), flat);
        }
        Ok(assignment)
    }

    /// Read and parse a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, WitnessError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check the assignment against a program's declared inputs.
    ///
    /// Missing inputs are reported before unknown ones, each in declaration
    /// or name order, so the first error is deterministic.
    pub fn check_against(&self, program: &WitnessProgram<F>) -> Result<(), WitnessError> {
        for range in &program.inputs {
            let values = self
                .get(&range.name)
                .ok_or_else(|| WitnessError::UnassignedInputSignal(range.name.clone()))?;
            if values.len() != range.len {
                return Err(WitnessError::InputLengthMismatch {
                    name: range.name.clone(),
                    expected: range.len,
                    actual: values.len(),
                });
            }
        }

        if let Some(unknown) = self.names().find(|name| program.input(name).is_none()) {
            return Err(WitnessError::UnknownInputSignal(unknown.to_string()));
        }
        Ok(())
    }
}

fn flatten<F: FieldLike>(name: &str, value: &Value, out: &mut Vec<F>) -> Result<(), WitnessError> {
    let literal = match value {
        Value::Array(items) => {
            for item in items {
                flatten(name, item, out)?;
            }
            return Ok(());
        }
        // With `arbitrary_precision` the number keeps its source text.
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    let element = parse_literal::<F>(&literal).map_err(|err| match err {
        LiteralError::Invalid(_) => WitnessError::InvalidLiteral {
            name: name.to_string(),
            literal: literal.clone(),
        },
        LiteralError::OutOfRange(_) => WitnessError::FieldElementOutOfRange {
            name: name.to_string(),
            literal: literal.clone(),
        },
    })?;
    out.push(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::SignalRange;
    use groth16_field::F;

    fn program(inputs: Vec<SignalRange>) -> WitnessProgram<F> {
        WitnessProgram {
            num_signals: 8,
            inputs,
            outputs: vec![],
            constants: vec![],
            instructions: vec![],
        }
    }

    #[test]
    fn test_scalars_and_nested_arrays() {
        let inputs = InputAssignment::<F>::from_json_str(r#"{"a": 1, "b": "0x10", "m": [[1, 2], ["-1", "4"]]}"#).unwrap();
        assert_eq!(inputs.get("a"), Some(&[F::from(1u64)][..]));
        assert_eq!(inputs.get("b"), Some(&[F::from(16u64)][..]));
        assert_eq!(
            inputs.get("m").unwrap(),
            &[F::from(1u64), F::from(2u64), -F::from(1u64), F::from(4u64)]
        );
        assert_eq!(inputs.names().collect::<Vec<_>>(), vec!["a", "b", "m"]);
    }

    #[test]
    fn test_big_integers_keep_precision() {
        // 2^100 does not fit any native JSON number type
        let inputs = InputAssignment::<F>::from_json_str(r#"{"x": 1267650600228229401496703205376}"#).unwrap();
        let expected = F::from(1u64 << 50) * F::from(1u64 << 50);
        assert_eq!(inputs.get("x"), Some(&[expected][..]));
    }

    #[test]
    fn test_modulus_boundary() {
        let p = F::modulus_biguint();
        let below = format!(r#"{{"x": "{}"}}"#, &p - 1u32);
        let at = format!(r#"{{"x": {p}}}"#);

        let inputs = InputAssignment::<F>::from_json_str(&below).unwrap();
        assert_eq!(inputs.get("x"), Some(&[-F::from(1u64)][..]));

        assert!(matches!(
            InputAssignment::<F>::from_json_str(&at),
            Err(WitnessError::FieldElementOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_documents() {
        for text in ["[1, 2]", "not json", r#""a""#] {
            assert!(matches!(
                InputAssignment::<F>::from_json_str(text),
                Err(WitnessError::InvalidInputJson(_))
            ));
        }
        for text in [r#"{"a": 1.5}"#, r#"{"a": true}"#, r#"{"a": "TODO"}"#, r#"{"a": null}"#] {
            assert!(matches!(
                InputAssignment::<F>::from_json_str(text),
                Err(WitnessError::InvalidLiteral { .. })
            ));
        }
    }

    #[test]
    fn test_check_against_program() {
        let program = program(vec![SignalRange::new("a", 2, 1), SignalRange::new("b", 3, 2)]);

        let ok = InputAssignment::<F>::from_json_str(r#"{"a": 1, "b": [1, 0]}"#).unwrap();
        ok.check_against(&program).unwrap();

        let missing = InputAssignment::<F>::from_json_str(r#"{"a": 1}"#).unwrap();
        assert!(matches!(
            missing.check_against(&program),
            Err(WitnessError::UnassignedInputSignal(name)) if name == "b"
        ));

        let short = InputAssignment::<F>::from_json_str(r#"{"a": 1, "b": [1]}"#).unwrap();
        assert!(matches!(
            short.check_against(&program),
            Err(WitnessError::InputLengthMismatch { expected: 2, actual: 1, .. })
        ));

        let extra = InputAssignment::<F>::from_json_str(r#"{"a": 1, "b": [1, 0], "c": 5}"#).unwrap();
        assert!(matches!(
            extra.check_against(&program),
            Err(WitnessError::UnknownInputSignal(name)) if name == "c"
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("AND_gate_input.json");
        std::fs::write(&path, r#"{"a": "1", "b": "0"}"#).unwrap();
        let inputs = InputAssignment::<F>::from_path(&path).unwrap();
        assert_eq!(inputs.get("b"), Some(&[F::from(0u64)][..]));
    }
}
