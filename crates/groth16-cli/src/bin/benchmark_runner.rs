//! `benchmark-runner`: push one circuit through load, witness, prove and
//! verify, printing the per-stage metrics as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use groth16_cli::discovery::check_circuit;
use groth16_cli::{init_tracing, BenchmarkRunner, Groth16Backend, PipelineConfig};
use groth16_examples::FixturePaths;
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser)]
#[command(name = "benchmark-runner")]
#[command(about = "Benchmark a single Groth16 circuit")]
struct Args {
    /// Constraint system (`X.r1cs`)
    r1cs: PathBuf,
    /// Witness program (`X_js/X.wasm`)
    wasm: PathBuf,
    /// Input JSON (`X_input.json`)
    input: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,
    /// Deterministic seed (testing only)
    #[arg(long)]
    seed: Option<u64>,
    /// Write the proof JSON here
    #[arg(long)]
    proof_out: Option<PathBuf>,
    /// Write the public signals JSON here
    #[arg(long)]
    public_out: Option<PathBuf>,
    /// Write the witness as `.wtns` here
    #[arg(long)]
    witness_out: Option<PathBuf>,
    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = PipelineConfig::load_or_default(args.config.as_deref())?;
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let name = args
        .r1cs
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "circuit".to_string());
    let paths = FixturePaths {
        name,
        r1cs: args.r1cs,
        wasm: args.wasm,
        input: args.input,
    };
    if let Some(reason) = check_circuit(&paths, &config.skip_marker) {
        warn!(circuit = %paths.name, %reason, "skipping circuit");
        return Ok(());
    }

    let backend = Groth16Backend::new(&config)?;
    let runner = BenchmarkRunner::new(backend, config);
    let outcome = runner.run_circuit(&paths);
    println!("{}", serde_json::to_string_pretty(&outcome.run)?);

    if let Some(err) = outcome.error {
        return Err(err).with_context(|| format!("circuit {} failed", paths.name));
    }
    if let (Some(path), Some(witness)) = (&args.witness_out, &outcome.witness) {
        witness.save_wtns(path)?;
    }
    if let (Some(path), Some(proof)) = (&args.proof_out, &outcome.proof) {
        proof.save_proof(path)?;
    }
    if let (Some(path), Some(proof)) = (&args.public_out, &outcome.proof) {
        proof.save_public(path)?;
    }
    Ok(())
}
