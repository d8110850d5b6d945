//! `groth16-cli`: inspect circuits, run single pipeline stages and drive
//! benchmark batches.

use anyhow::{anyhow, bail, Context, Result};
use ark_bls12_381::Bls12_381;
use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use clap::{Parser, Subcommand, ValueEnum};
use groth16_cli::backend::{evaluate_witness_for, load_constraint_system, read_r1cs_header};
use groth16_cli::inspect::describe_r1cs;
use groth16_cli::{init_tracing, BenchmarkRunner, Groth16Backend, PipelineConfig, RunStatus};
use groth16_core::{create_proof, public_inputs_from_json, public_inputs_to_json, thread_pool, Proof, ProofJson, Verifier};
use groth16_examples::{reference_circuits, write_all, write_placeholder};
use groth16_field::{Bls12381Fr, Bn254Fr, Curve, FieldLike};
use groth16_r1cs::LoadOptions;
use groth16_setup::{generate_parameters, load_key, save_key, seeded_rng, ProvingKey, VerifyingKey};
use groth16_witness::{read_program_curve, write_wtns, InputAssignment, WitnessCalculator, WitnessProgram};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "groth16-cli")]
#[command(about = "Groth16 circuit pipeline: inspect, witness, setup, prove, verify, bench")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CurveArg {
    Bn254,
    #[value(name = "bls12-381")]
    Bls12_381,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header counts, digest and first constraints of an .r1cs file
    Info {
        /// Constraint system
        r1cs: PathBuf,
    },
    /// Evaluate a witness program and write a .wtns file
    Witness {
        /// Witness program (`X_js/X.wasm`)
        wasm: PathBuf,
        /// Input JSON
        input: PathBuf,
        /// Output witness file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate proving and verifying keys for a circuit
    Setup {
        /// Constraint system
        r1cs: PathBuf,
        /// Proving key output
        #[arg(long)]
        pk: PathBuf,
        /// Verifying key output
        #[arg(long)]
        vk: PathBuf,
        /// Deterministic seed (testing only)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Evaluate the witness and create a proof
    Prove {
        /// Constraint system
        r1cs: PathBuf,
        /// Witness program
        wasm: PathBuf,
        /// Input JSON
        input: PathBuf,
        /// Proving key from `setup`
        #[arg(long)]
        pk: PathBuf,
        /// Proof JSON output
        #[arg(long)]
        proof: PathBuf,
        /// Public signals JSON output
        #[arg(long)]
        public: PathBuf,
        /// Worker threads
        #[arg(long)]
        threads: Option<usize>,
        /// Deterministic seed (testing only)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check a proof against a verifying key and public signals
    Verify {
        /// Verifying key from `setup`
        #[arg(long)]
        vk: PathBuf,
        /// Proof JSON
        #[arg(long)]
        proof: PathBuf,
        /// Public signals JSON
        #[arg(long)]
        public: PathBuf,
    },
    /// Benchmark every circuit in a directory
    Bench {
        /// Circuits directory
        dir: PathBuf,
        /// Report output, defaults to `<dir>/benchmark_results.json`
        #[arg(long)]
        results: Option<PathBuf>,
        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Worker threads
        #[arg(long)]
        threads: Option<usize>,
        /// Deterministic seed (testing only)
        #[arg(long)]
        seed: Option<u64>,
        /// Skip self-verification of each proof
        #[arg(long)]
        no_verify: bool,
    },
    /// Write the reference circuits in the circuits directory layout
    Examples {
        /// Output directory
        dir: PathBuf,
        /// Field of the circuits
        #[arg(long, value_enum, default_value = "bn254")]
        curve: CurveArg,
        /// Write `TODO` input documents instead of real inputs
        #[arg(long)]
        placeholder: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { r1cs } => {
            let text = describe_r1cs(&r1cs, &LoadOptions::default())
                .with_context(|| format!("failed to read {}", r1cs.display()))?;
            println!("{text}");
        }
        Commands::Witness { wasm, input, output } => {
            let curve = program_curve(&wasm)?;
            let count = match curve {
                Curve::Bn254 => witness_on::<Bn254Fr>(&wasm, &input, &output)?,
                Curve::Bls12_381 => witness_on::<Bls12381Fr>(&wasm, &input, &output)?,
            };
            println!("wrote {count} signals to {}", output.display());
        }
        Commands::Setup { r1cs, pk, vk, seed } => {
            match r1cs_curve(&r1cs)? {
                Curve::Bn254 => setup_on::<Bn254>(&r1cs, &pk, &vk, seed)?,
                Curve::Bls12_381 => setup_on::<Bls12_381>(&r1cs, &pk, &vk, seed)?,
            }
            println!("wrote {} and {}", pk.display(), vk.display());
        }
        Commands::Prove {
            r1cs,
            wasm,
            input,
            pk,
            proof,
            public,
            threads,
            seed,
        } => {
            let pool = thread_pool(threads)?;
            let artifacts = ProveArtifacts {
                r1cs: &r1cs,
                wasm: &wasm,
                input: &input,
                pk: &pk,
                proof: &proof,
                public: &public,
            };
            pool.install(|| match r1cs_curve(&r1cs)? {
                Curve::Bn254 => prove_on::<Bn254>(&artifacts, seed),
                Curve::Bls12_381 => prove_on::<Bls12_381>(&artifacts, seed),
            })?;
            println!("wrote {} and {}", proof.display(), public.display());
        }
        Commands::Verify { vk, proof, public } => {
            let text = fs::read_to_string(&proof).with_context(|| format!("failed to read {}", proof.display()))?;
            let json: ProofJson = serde_json::from_str(&text).context("invalid proof JSON")?;
            let valid = match json.curve.as_str() {
                "bn254" => verify_on::<Bn254>(&vk, &json, &public)?,
                "bls12-381" => verify_on::<Bls12_381>(&vk, &json, &public)?,
                other => bail!("unsupported curve `{other}` in {}", proof.display()),
            };
            if !valid {
                bail!("proof {} is invalid", proof.display());
            }
            println!("OK");
        }
        Commands::Bench {
            dir,
            results,
            config,
            threads,
            seed,
            no_verify,
        } => {
            let mut config = PipelineConfig::load_or_default(config.as_deref())?;
            if results.is_some() {
                config.results_path = results;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if no_verify {
                config.verify_proofs = false;
            }
            let backend = Groth16Backend::new(&config)?;
            let threads = backend.threads();
            let runner = BenchmarkRunner::new(backend, config);
            let report = runner
                .run_dir(&dir, threads)
                .with_context(|| format!("benchmark of {} aborted", dir.display()))?;
            println!(
                "{} succeeded, {} failed, {} skipped; results in {}",
                report.count(RunStatus::Success),
                report.count(RunStatus::Failed),
                report.count(RunStatus::Skipped),
                runner.results_path(&dir).display()
            );
        }
        Commands::Examples { dir, curve, placeholder } => {
            fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
            let written = match curve {
                CurveArg::Bn254 => write_examples::<Bn254Fr>(&dir, placeholder)?,
                CurveArg::Bls12_381 => write_examples::<Bls12381Fr>(&dir, placeholder)?,
            };
            println!("wrote {written} circuits to {}", dir.display());
        }
    }
    Ok(())
}

fn r1cs_curve(path: &Path) -> Result<Curve> {
    let header = read_r1cs_header(path)?;
    header
        .curve()
        .ok_or_else(|| anyhow!("{} targets an unsupported field", path.display()))
}

fn program_curve(path: &Path) -> Result<Curve> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_program_curve(&mut BufReader::new(file))?
        .ok_or_else(|| anyhow!("{} targets an unsupported field", path.display()))
}

fn witness_on<F: FieldLike>(wasm: &Path, input: &Path, output: &Path) -> Result<usize> {
    let program = WitnessProgram::<F>::load(wasm)?;
    let inputs = InputAssignment::from_path(input)?;
    let witness = WitnessCalculator::new(program)?.calculate(&inputs)?;
    let mut writer = BufWriter::new(File::create(output).with_context(|| format!("failed to create {}", output.display()))?);
    write_wtns(&witness, &mut writer)?;
    writer.flush()?;
    Ok(witness.len())
}

fn setup_on<E: Pairing>(r1cs: &Path, pk_path: &Path, vk_path: &Path, seed: Option<u64>) -> Result<()>
where
    E::ScalarField: FieldLike,
{
    let cs = load_constraint_system::<E::ScalarField>(r1cs, &LoadOptions::default())?;
    let mut rng = seeded_rng(seed);
    let pk = generate_parameters::<E, _>(&cs, &mut rng)?;
    save_key(&pk, pk_path)?;
    save_key(&pk.vk, vk_path)?;
    info!(constraints = cs.num_constraints(), "wrote keys");
    Ok(())
}

struct ProveArtifacts<'a> {
    r1cs: &'a Path,
    wasm: &'a Path,
    input: &'a Path,
    pk: &'a Path,
    proof: &'a Path,
    public: &'a Path,
}

fn prove_on<E: Pairing>(artifacts: &ProveArtifacts<'_>, seed: Option<u64>) -> Result<()>
where
    E::ScalarField: FieldLike,
{
    let cs = load_constraint_system::<E::ScalarField>(artifacts.r1cs, &LoadOptions::default())?;
    let witness = evaluate_witness_for(&cs, artifacts.wasm, artifacts.input)?;
    let pk: ProvingKey<E> = load_key(artifacts.pk).with_context(|| format!("failed to load {}", artifacts.pk.display()))?;
    let mut rng = seeded_rng(seed);
    let (proof, public) = create_proof(&pk, &cs, witness.values(), &mut rng)?;
    proof.save_json(artifacts.proof)?;
    fs::write(artifacts.public, public_inputs_to_json(&public))
        .with_context(|| format!("failed to write {}", artifacts.public.display()))?;
    Ok(())
}

fn verify_on<E: Pairing>(vk_path: &Path, json: &ProofJson, public_path: &Path) -> Result<bool>
where
    E::ScalarField: FieldLike,
{
    let vk: VerifyingKey<E> = load_key(vk_path).with_context(|| format!("failed to load {}", vk_path.display()))?;
    let proof = Proof::<E>::from_json(json)?;
    let text = fs::read_to_string(public_path).with_context(|| format!("failed to read {}", public_path.display()))?;
    let public = public_inputs_from_json::<E::ScalarField>(&text)?;
    Ok(Verifier::verify(&vk, &proof, &public)?)
}

fn write_examples<F: FieldLike>(dir: &Path, placeholder: bool) -> Result<usize> {
    if !placeholder {
        return Ok(write_all::<F>(dir)?.len());
    }
    let circuits = reference_circuits::<F>();
    for circuit in &circuits {
        write_placeholder(dir, circuit)?;
    }
    Ok(circuits.len())
}
