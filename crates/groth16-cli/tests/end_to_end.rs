//! Full pipeline over the reference circuits with the Groth16 backend.

use groth16_cli::{BenchmarkRunner, Groth16Backend, PipelineConfig, ProofBundle, ProvingBackend, RunStatus};
use groth16_core::{public_inputs_from_json, Proof, Verifier};
use groth16_examples::{and_gate, cubic, multiplier, write_all, write_fixture, write_fixture_with_input, write_placeholder};
use groth16_field::{Bn254Fr, FieldLike};
use serde_json::json;

fn config() -> PipelineConfig {
    PipelineConfig {
        threads: Some(2),
        seed: Some(42),
        ..PipelineConfig::default()
    }
}

fn prove_and_gate(a: u64, b: u64) -> ProofBundle {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture_with_input(dir.path(), &and_gate::<Bn254Fr>(), &json!({"a": a, "b": b})).unwrap();
    let runner = BenchmarkRunner::new(Groth16Backend::new(&config()).unwrap(), config());
    let outcome = runner.run_circuit(&paths);
    assert!(outcome.error.is_none(), "{:?}", outcome.error);
    assert_eq!(outcome.run.status, RunStatus::Success);
    outcome.proof.unwrap()
}

#[test]
fn test_and_gate_true() {
    let bundle = prove_and_gate(1, 1);
    assert_eq!(bundle.public_json(), r#"["1"]"#);

    let ProofBundle::Bn254(proof) = bundle else {
        panic!("AND_gate is a BN254 circuit");
    };
    assert!(Verifier::verify(&proof.vk, &proof.proof, &proof.public).unwrap());

    // the JSON forms are enough to verify
    let json = proof.proof.to_json().unwrap();
    let decoded = Proof::from_json(&json).unwrap();
    let public = public_inputs_from_json::<Bn254Fr>(r#"["1"]"#).unwrap();
    assert!(Verifier::verify(&proof.vk, &decoded, &public).unwrap());
    let lie = public_inputs_from_json::<Bn254Fr>(r#"["0"]"#).unwrap();
    assert!(!Verifier::verify(&proof.vk, &decoded, &lie).unwrap());
}

#[test]
fn test_and_gate_false() {
    let bundle = prove_and_gate(1, 0);
    assert_eq!(bundle.public_json(), r#"["0"]"#);
    let ProofBundle::Bn254(proof) = bundle else {
        panic!("AND_gate is a BN254 circuit");
    };
    assert_eq!(proof.public, vec![<Bn254Fr as FieldLike>::zero()]);
}

#[test]
fn test_unsatisfying_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture_with_input(dir.path(), &and_gate::<Bn254Fr>(), &json!({"a": 2, "b": 1})).unwrap();
    let runner = BenchmarkRunner::new(Groth16Backend::new(&config()).unwrap(), config());
    let outcome = runner.run_circuit(&paths);
    assert_eq!(outcome.run.status, RunStatus::Failed);
    // the evaluator has no bit check; the prover catches the bad row
    assert_eq!(outcome.run.category.as_deref(), Some("internal-consistency"));
    assert!(outcome.error.unwrap().is_fatal());
    assert!(outcome.witness.is_some());
    assert!(outcome.proof.is_none());
}

#[test]
fn test_witness_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_fixture_with_input(dir.path(), &cubic::<Bn254Fr>(), &json!({"x": 3})).unwrap();
    let backend = Groth16Backend::new(&config()).unwrap();
    let circuit = backend.load_constraints(&paths.r1cs).unwrap();

    let first = dir.path().join("first.wtns");
    let second = dir.path().join("second.wtns");
    backend.evaluate_witness(&circuit, &paths.wasm, &paths.input).unwrap().save_wtns(&first).unwrap();
    backend.evaluate_witness(&circuit, &paths.wasm, &paths.input).unwrap().save_wtns(&second).unwrap();
    assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
}

#[test]
fn test_bench_reference_directory() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_all::<Bn254Fr>(dir.path()).unwrap();
    let mut placeholder = and_gate::<Bn254Fr>();
    placeholder.name = "AND_gate_todo";
    write_placeholder(dir.path(), &placeholder).unwrap();

    let config = config();
    let backend = Groth16Backend::new(&config).unwrap();
    let threads = backend.threads();
    let runner = BenchmarkRunner::new(backend, config);
    let report = runner.run_dir(dir.path(), threads).unwrap();

    assert_eq!(report.threads, 2);
    assert_eq!(report.count(RunStatus::Success), written.len());
    assert_eq!(report.count(RunStatus::Skipped), 1);
    for run in report.runs.iter().filter(|r| r.status == RunStatus::Success) {
        assert_eq!(run.curve.as_deref(), Some("bn254"));
        assert!(run.metrics.wall_seconds > 0.0);
    }
    assert!(dir.path().join("benchmark_results.json").is_file());
}

#[test]
fn test_undecodable_input_fails_alone() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), &and_gate::<Bn254Fr>()).unwrap();
    let bad = write_fixture(dir.path(), &multiplier::<Bn254Fr>()).unwrap();
    std::fs::write(&bad.input, [0xff, 0xfe, b'{', b'}']).unwrap();

    let config = config();
    let runner = BenchmarkRunner::new(Groth16Backend::new(&config).unwrap(), config);
    let report = runner.run_dir(dir.path(), 2).unwrap();

    assert_eq!(report.run("AND_gate").unwrap().status, RunStatus::Success);
    let failed = report.run("multiplier").unwrap();
    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.category.as_deref(), Some("malformed-input"));
    assert!(dir.path().join("benchmark_results.json").is_file());
}
