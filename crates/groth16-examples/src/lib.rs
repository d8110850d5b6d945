//! Reference circuits and on-disk fixtures for the Groth16 pipeline.
//!
//! Each circuit is described once with [`CircuitBuilder`], which yields the
//! constraint system and the witness program together, and ships with a
//! default input document. [`write_fixture`] lays a circuit out the way the
//! benchmark driver expects to find it:
//!
//! ```text
//! <dir>/X.r1cs
//! <dir>/X_js/X.wasm
//! <dir>/X_input.json
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use anyhow::{Context, Result};
use groth16_field::FieldLike;
use groth16_r1cs::{write_r1cs, ConstraintSystem};
use groth16_witness::{CircuitBuilder, WitnessProgram};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub use groth16_witness;

/// A circuit with both artifacts and a default input
#[derive(Debug, Clone)]
pub struct ReferenceCircuit<F: FieldLike> {
    /// File stem used in the fixture layout
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Constraint system
    pub constraint_system: ConstraintSystem<F>,
    /// Witness program
    pub program: WitnessProgram<F>,
    /// Default input document
    pub input: Value,
}

impl<F: FieldLike> ReferenceCircuit<F> {
    fn new(name: &'static str, description: &'static str, builder: CircuitBuilder<F>, input: Value) -> Self {
        let (constraint_system, program) = builder.finish();
        Self {
            name,
            description,
            constraint_system,
            program,
            input,
        }
    }
}

/// `out <== a * b` with `a`, `b` constrained to bits
pub fn and_gate<F: FieldLike>() -> ReferenceCircuit<F> {
    let mut builder = CircuitBuilder::new();
    let out = builder.public_output("out");
    let a = builder.private_input("a");
    let b = builder.private_input("b");
    builder.assert_boolean(a);
    builder.assert_boolean(b);
    builder.mul_into(out, a, b);
    ReferenceCircuit::new("AND_gate", "boolean AND of two private bits", builder, json!({"a": 1, "b": 1}))
}

/// `c <== a * b`
pub fn multiplier<F: FieldLike>() -> ReferenceCircuit<F> {
    let mut builder = CircuitBuilder::new();
    let c = builder.public_output("c");
    let a = builder.private_input("a");
    let b = builder.private_input("b");
    builder.mul_into(c, a, b);
    ReferenceCircuit::new("multiplier", "product of two private factors", builder, json!({"a": "3", "b": "11"}))
}

/// `out <== x³ + x + 5`
pub fn cubic<F: FieldLike>() -> ReferenceCircuit<F> {
    let mut builder = CircuitBuilder::new();
    let out = builder.public_output("out");
    let x = builder.private_input("x");
    let x2 = builder.mul(x, x);
    let x3 = builder.mul(x2, x);
    let sum = builder.add(x3, x);
    let five = builder.constant(F::from_u64(5));
    let total = builder.add(sum, five);
    builder.assign(out, total);
    ReferenceCircuit::new("cubic", "x^3 + x + 5 for a private x", builder, json!({"x": 3}))
}

/// `out <== in == 0` for a public `in`
pub fn is_zero<F: FieldLike>() -> ReferenceCircuit<F> {
    let mut builder = CircuitBuilder::new();
    let out = builder.public_output("out");
    let input = builder.public_input("in");
    let flag = builder.is_zero(input);
    builder.assign(out, flag);
    ReferenceCircuit::new("is_zero", "zero test of a public input", builder, json!({"in": 0}))
}

/// Every entry of `in` fits in 8 bits; `out` counts the entries below 200
pub fn range_check<F: FieldLike>() -> ReferenceCircuit<F> {
    const BITS: usize = 8;
    let mut builder = CircuitBuilder::new();
    let out = builder.public_output("out");
    let values = builder.private_inputs("in", 4);
    let limit = builder.constant(F::from_u64(200));

    let mut count = builder.constant(<F as FieldLike>::zero());
    for value in values {
        builder.num2bits(value, BITS);
        let below = builder.less_than(value, limit, BITS);
        count = builder.add(count, below);
    }
    builder.assign(out, count);
    ReferenceCircuit::new(
        "range_check",
        "8-bit range proof and comparison over four private values",
        builder,
        json!({"in": [[7, 199], ["200", "0xff"]]}),
    )
}

/// All reference circuits
pub fn reference_circuits<F: FieldLike>() -> Vec<ReferenceCircuit<F>> {
    vec![and_gate(), multiplier(), cubic(), is_zero(), range_check()]
}

/// Reference circuit by name
pub fn reference_circuit<F: FieldLike>(name: &str) -> Option<ReferenceCircuit<F>> {
    reference_circuits().into_iter().find(|c| c.name == name)
}

/// Artifact paths of one circuit in the fixture layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePaths {
    /// Circuit name
    pub name: String,
    /// `X.r1cs`
    pub r1cs: PathBuf,
    /// `X_js/X.wasm`
    pub wasm: PathBuf,
    /// `X_input.json`
    pub input: PathBuf,
}

impl FixturePaths {
    /// Paths for circuit `name` under `dir`
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            r1cs: dir.join(format!("{name}.r1cs")),
            wasm: dir.join(format!("{name}_js")).join(format!("{name}.wasm")),
            input: dir.join(format!("{name}_input.json")),
        }
    }
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Write both artifacts of `circuit` and the given input document.
pub fn write_fixture_with_input<F: FieldLike>(dir: &Path, circuit: &ReferenceCircuit<F>, input: &Value) -> Result<FixturePaths> {
    let paths = FixturePaths::new(dir, circuit.name);
    if let Some(parent) = paths.wasm.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut writer = BufWriter::new(File::create(&paths.r1cs).with_context(|| format!("creating {}", paths.r1cs.display()))?);
    write_r1cs(&circuit.constraint_system, &mut writer)?;
    writer.flush()?;

    circuit
        .program
        .save(&paths.wasm)
        .with_context(|| format!("writing {}", paths.wasm.display()))?;
    write_json(&paths.input, input)?;

    info!(circuit = circuit.name, dir = %dir.display(), "wrote fixture");
    Ok(paths)
}

/// Write `circuit` with its default input.
pub fn write_fixture<F: FieldLike>(dir: &Path, circuit: &ReferenceCircuit<F>) -> Result<FixturePaths> {
    write_fixture_with_input(dir, circuit, &circuit.input)
}

/// Write `circuit` with an input that still carries the `TODO` placeholder.
pub fn write_placeholder<F: FieldLike>(dir: &Path, circuit: &ReferenceCircuit<F>) -> Result<FixturePaths> {
    let placeholder: serde_json::Map<String, Value> = circuit
        .program
        .inputs
        .iter()
        .map(|range| (range.name.clone(), Value::from("TODO")))
        .collect();
    write_fixture_with_input(dir, circuit, &Value::Object(placeholder))
}

/// Write every reference circuit under `dir`.
pub fn write_all<F: FieldLike>(dir: &Path) -> Result<Vec<FixturePaths>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    reference_circuits::<F>()
        .iter()
        .map(|circuit| write_fixture(dir, circuit))
        .collect()
}
