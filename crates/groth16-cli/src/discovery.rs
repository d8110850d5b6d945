//! Circuit discovery under a circuits directory.
//!
//! A circuit `X` is known by any of its three artifacts. It is ready only
//! when all three exist and the input document does not carry the
//! placeholder marker.

use crate::PipelineError;
use groth16_examples::FixturePaths;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Why a circuit is not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// `X_input.json` does not exist
    MissingInput,
    /// `X_input.json` contains the placeholder marker
    PlaceholderInput(String),
    /// `X_js/X.wasm` does not exist
    MissingWitnessProgram,
    /// `X.r1cs` does not exist
    MissingConstraints,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingInput => f.write_str("input JSON not found"),
            SkipReason::PlaceholderInput(marker) => write!(f, "input JSON contains placeholder `{marker}`"),
            SkipReason::MissingWitnessProgram => f.write_str("witness program not found"),
            SkipReason::MissingConstraints => f.write_str("constraint system not found"),
        }
    }
}

/// A circuit found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCircuit {
    /// Artifact paths
    pub paths: FixturePaths,
    /// `None` when the circuit can run
    pub skip: Option<SkipReason>,
}

fn contains_marker(bytes: &[u8], marker: &str) -> bool {
    let marker = marker.as_bytes();
    !marker.is_empty() && bytes.windows(marker.len()).any(|window| window == marker)
}

/// Decide whether the circuit at `paths` can run.
///
/// Checks the input first, then the witness program, then the constraints.
/// An input that exists but cannot be read is not a skip: the circuit runs
/// and fails at the witness stage like any other malformed input.
pub fn check_circuit(paths: &FixturePaths, skip_marker: &str) -> Option<SkipReason> {
    if !paths.input.is_file() {
        return Some(SkipReason::MissingInput);
    }
    match fs::read(&paths.input) {
        Ok(bytes) if contains_marker(&bytes, skip_marker) => {
            return Some(SkipReason::PlaceholderInput(skip_marker.to_string()));
        }
        Ok(_) => {}
        Err(err) => debug!(circuit = %paths.name, %err, "input not readable"),
    }
    if !paths.wasm.is_file() {
        return Some(SkipReason::MissingWitnessProgram);
    }
    if !paths.r1cs.is_file() {
        return Some(SkipReason::MissingConstraints);
    }
    None
}

fn circuit_name(file_name: &str, is_dir: bool) -> Option<&str> {
    if is_dir {
        return file_name.strip_suffix("_js");
    }
    file_name
        .strip_suffix("_input.json")
        .or_else(|| file_name.strip_suffix(".r1cs"))
}

/// List every circuit under `dir`, sorted by name.
pub fn discover(dir: &Path, skip_marker: &str) -> Result<Vec<DiscoveredCircuit>, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|err| PipelineError::io(dir, err))?;
    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|err| PipelineError::io(dir, err))?;
        let is_dir = entry.file_type().map_err(|err| PipelineError::io(entry.path(), err))?.is_dir();
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(name) = circuit_name(file_name, is_dir).filter(|n| !n.is_empty()) {
            names.insert(name.to_string());
        }
    }

    let mut circuits = Vec::with_capacity(names.len());
    for name in names {
        let paths = FixturePaths::new(dir, &name);
        let skip = check_circuit(&paths, skip_marker);
        match &skip {
            Some(reason) => warn!(circuit = %name, %reason, "skipping circuit"),
            None => debug!(circuit = %name, "found circuit"),
        }
        circuits.push(DiscoveredCircuit { paths, skip });
    }
    Ok(circuits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groth16_examples::{and_gate, cubic, multiplier, write_fixture, write_placeholder};
    use groth16_field::F;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_discovers_and_classifies() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), &and_gate::<F>()).unwrap();
        write_placeholder(dir.path(), &cubic::<F>()).unwrap();

        let mult = write_fixture(dir.path(), &multiplier::<F>()).unwrap();
        fs::remove_file(&mult.wasm).unwrap();

        fs::write(dir.path().join("orphan.r1cs"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let found = discover(dir.path(), "TODO").unwrap();
        let summary: Vec<_> = found.iter().map(|c| (c.paths.name.as_str(), c.skip.clone())).collect();
        assert_eq!(
            summary,
            vec![
                ("AND_gate", None),
                ("cubic", Some(SkipReason::PlaceholderInput("TODO".into()))),
                ("multiplier", Some(SkipReason::MissingWitnessProgram)),
                ("orphan", Some(SkipReason::MissingInput)),
            ]
        );
        assert!(logs_contain("skipping circuit"));
    }

    #[test]
    fn test_missing_constraints() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path(), &and_gate::<F>()).unwrap();
        fs::remove_file(&paths.r1cs).unwrap();
        assert_eq!(
            check_circuit(&paths, "TODO"),
            Some(SkipReason::MissingConstraints)
        );
        // the circuit is still found through its other artifacts
        assert_eq!(discover(dir.path(), "TODO").unwrap().len(), 1);
    }

    #[test]
    fn test_custom_marker() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_placeholder(dir.path(), &and_gate::<F>()).unwrap();
        assert_eq!(check_circuit(&paths, "FIXME"), None);
        assert!(discover(&dir.path().join("absent"), "TODO").is_err());
    }

    #[test]
    fn test_non_utf8_input_is_not_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path(), &multiplier::<F>()).unwrap();
        fs::write(&paths.input, [0xff, 0xfe, b'{', b'}']).unwrap();
        assert_eq!(check_circuit(&paths, "TODO"), None);

        fs::write(&paths.input, [0xff, b'T', b'O', b'D', b'O']).unwrap();
        assert_eq!(
            check_circuit(&paths, "TODO"),
            Some(SkipReason::PlaceholderInput("TODO".into()))
        );
        assert_eq!(discover(dir.path(), "TODO").unwrap().len(), 1);
    }

    #[test]
    fn test_contains_marker() {
        assert!(contains_marker(b"{\"x\": \"TODO\"}", "TODO"));
        assert!(!contains_marker(b"TOD", "TODO"));
        assert!(!contains_marker(b"TODO", ""));
    }
}
