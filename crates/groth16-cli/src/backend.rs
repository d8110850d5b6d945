//! Proving backends.
//!
//! The runner only talks to a [`ProvingBackend`], so it can be driven by
//! an in-process fake in tests. [`Groth16Backend`] is the real one: it
//! reads the field prime from each `.r1cs` header and runs the whole
//! pipeline on BN254 or BLS12-381 accordingly.

use crate::{PipelineConfig, PipelineError};
use ark_bls12_381::Bls12_381;
use ark_bn254::Bn254;
use ark_ec::pairing::Pairing;
use groth16_core::{create_proof, public_inputs_to_json, thread_pool, Proof, ProofJson, Verifier};
use groth16_field::{Bls12381Fr, Bn254Fr, Curve, FieldLike};
use groth16_r1cs::{read_header, read_r1cs, ConstraintSystem, LoadOptions, R1csHeader, Witness};
use groth16_setup::{generate_parameters, save_key, seeded_rng, VerifyingKey};
use groth16_witness::{write_wtns, InputAssignment, ProgramLimits, WitnessCalculator, WitnessError, WitnessProgram};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, instrument};

/// Size of a loaded circuit, for run records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitShape {
    /// Curve name
    pub curve: String,
    /// Number of constraints
    pub constraints: usize,
    /// Number of signals
    pub signals: usize,
}

/// The four pipeline capabilities the benchmark runner needs
pub trait ProvingBackend {
    /// Loaded constraint system
    type Constraints;
    /// Evaluated witness
    type Witness;
    /// Proof plus whatever verification needs
    type Proof;

    /// Parse the `.r1cs` file
    fn load_constraints(&self, r1cs: &Path) -> Result<Self::Constraints, PipelineError>;

    /// Counts reported in the run record
    fn shape(&self, constraints: &Self::Constraints) -> CircuitShape;

    /// Run the witness program against the input document
    fn evaluate_witness(&self, constraints: &Self::Constraints, wasm: &Path, input: &Path) -> Result<Self::Witness, PipelineError>;

    /// Prove the witness
    fn prove(&self, constraints: &Self::Constraints, witness: &Self::Witness) -> Result<Self::Proof, PipelineError>;

    /// Check a proof from public data only
    fn verify(&self, proof: &Self::Proof) -> Result<bool, PipelineError>;
}

/// Read the header of an `.r1cs` file
pub fn read_r1cs_header(path: &Path) -> Result<R1csHeader, PipelineError> {
    let file = File::open(path).map_err(|err| PipelineError::io(path, err))?;
    Ok(read_header(&mut BufReader::new(file))?)
}

/// Curve an `.r1cs` file targets
pub fn detect_curve(path: &Path) -> Result<Curve, PipelineError> {
    read_r1cs_header(path)?
        .curve()
        .ok_or_else(|| PipelineError::UnsupportedField(path.to_path_buf()))
}

/// Load an `.r1cs` file over a known field
pub fn load_constraint_system<F: FieldLike>(path: &Path, options: &LoadOptions) -> Result<ConstraintSystem<F>, PipelineError> {
    let file = File::open(path).map_err(|err| PipelineError::io(path, err))?;
    Ok(read_r1cs(&mut BufReader::new(file), options)?)
}

/// Evaluate the witness program at `wasm` against the inputs at `input`
pub fn evaluate_witness_for<F: FieldLike>(
    cs: &ConstraintSystem<F>,
    wasm: &Path,
    input: &Path,
) -> Result<Witness<F>, PipelineError> {
    // the header count is compared before the program allocates anything
    let limits = ProgramLimits::expecting(cs.num_signals);
    let program = WitnessProgram::<F>::load_with_limits(wasm, &limits).map_err(|err| match err {
        WitnessError::SignalCountMismatch { expected, found } => PipelineError::ArtifactMismatch(format!(
            "witness program has {found} signals, constraint system has {expected}"
        )),
        other => other.into(),
    })?;
    let inputs = InputAssignment::from_path(input)?;
    let witness = WitnessCalculator::new(program)?.calculate(&inputs)?;
    Ok(witness)
}

/// Proof, public signals and the verifying key on one curve
#[derive(Debug, Clone)]
pub struct CurveProof<E: Pairing> {
    /// The proof
    pub proof: Proof<E>,
    /// Public signals `z[1..=num_public]`
    pub public: Vec<E::ScalarField>,
    /// Key the proof verifies under
    pub vk: VerifyingKey<E>,
}

impl<E: Pairing> CurveProof<E>
where
    E::ScalarField: FieldLike,
{
    /// Setup then prove on the current rayon pool
    pub fn create(cs: &ConstraintSystem<E::ScalarField>, witness: &Witness<E::ScalarField>, seed: Option<u64>) -> Result<Self, PipelineError> {
        let mut rng = seeded_rng(seed);
        let pk = generate_parameters::<E, _>(cs, &mut rng)?;
        let (proof, public) = create_proof(&pk, cs, witness.values(), &mut rng)?;
        Ok(Self { proof, public, vk: pk.vk })
    }

    /// Pairing check with the bundled key
    pub fn verify(&self) -> Result<bool, PipelineError> {
        Ok(Verifier::verify(&self.vk, &self.proof, &self.public)?)
    }
}

/// Constraint system on whichever curve its file targets
#[derive(Debug, Clone)]
pub enum LoadedCircuit {
    /// BN254 scalar field
    Bn254(ConstraintSystem<Bn254Fr>),
    /// BLS12-381 scalar field
    Bls12_381(ConstraintSystem<Bls12381Fr>),
}

impl LoadedCircuit {
    /// Curve of the circuit
    pub fn curve(&self) -> Curve {
        match self {
            LoadedCircuit::Bn254(_) => Curve::Bn254,
            LoadedCircuit::Bls12_381(_) => Curve::Bls12_381,
        }
    }
}

/// Witness on one curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitWitness {
    /// BN254 scalar field
    Bn254(Witness<Bn254Fr>),
    /// BLS12-381 scalar field
    Bls12_381(Witness<Bls12381Fr>),
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<(), PipelineError>) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|err| PipelineError::io(path, err))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer.flush().map_err(|err| PipelineError::io(path, err))
}

impl CircuitWitness {
    /// Number of signals
    pub fn len(&self) -> usize {
        match self {
            CircuitWitness::Bn254(w) => w.len(),
            CircuitWitness::Bls12_381(w) => w.len(),
        }
    }

    /// Never true for an evaluated witness
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write a circom `.wtns` file
    pub fn save_wtns(&self, path: &Path) -> Result<(), PipelineError> {
        write_file(path, |writer| {
            match self {
                CircuitWitness::Bn254(w) => write_wtns(w, writer)?,
                CircuitWitness::Bls12_381(w) => write_wtns(w, writer)?,
            }
            Ok(())
        })
    }
}

/// Proof on one curve
#[derive(Debug, Clone)]
pub enum ProofBundle {
    /// BN254
    Bn254(CurveProof<Bn254>),
    /// BLS12-381
    Bls12_381(CurveProof<Bls12_381>),
}

impl ProofBundle {
    /// Curve of the proof
    pub fn curve(&self) -> Curve {
        match self {
            ProofBundle::Bn254(_) => Curve::Bn254,
            ProofBundle::Bls12_381(_) => Curve::Bls12_381,
        }
    }

    /// Hex JSON view of the proof
    pub fn proof_json(&self) -> Result<ProofJson, PipelineError> {
        Ok(match self {
            ProofBundle::Bn254(p) => p.proof.to_json()?,
            ProofBundle::Bls12_381(p) => p.proof.to_json()?,
        })
    }

    /// Public signals as a JSON array of decimal strings
    pub fn public_json(&self) -> String {
        match self {
            ProofBundle::Bn254(p) => public_inputs_to_json(&p.public),
            ProofBundle::Bls12_381(p) => public_inputs_to_json(&p.public),
        }
    }

    /// Write the proof JSON
    pub fn save_proof(&self, path: &Path) -> Result<(), PipelineError> {
        let text = serde_json::to_string_pretty(&self.proof_json()?)?;
        fs::write(path, text).map_err(|err| PipelineError::io(path, err))
    }

    /// Write the public signals JSON
    pub fn save_public(&self, path: &Path) -> Result<(), PipelineError> {
        fs::write(path, self.public_json()).map_err(|err| PipelineError::io(path, err))
    }

    /// Write the verifying key
    pub fn save_verifying_key(&self, path: &Path) -> Result<(), PipelineError> {
        match self {
            ProofBundle::Bn254(p) => save_key(&p.vk, path)?,
            ProofBundle::Bls12_381(p) => save_key(&p.vk, path)?,
        }
        Ok(())
    }
}

/// In-process Groth16 backend
pub struct Groth16Backend {
    options: LoadOptions,
    seed: Option<u64>,
    pool: rayon::ThreadPool,
}

impl Groth16Backend {
    /// Backend with its own worker pool sized by `config.threads`
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            options: config.load_options(),
            seed: config.seed,
            pool: thread_pool(config.threads)?,
        })
    }

    /// Workers in the proving pool
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

fn curve_mismatch(circuit: Curve, witness: &CircuitWitness) -> PipelineError {
    let witness_curve = match witness {
        CircuitWitness::Bn254(_) => Curve::Bn254,
        CircuitWitness::Bls12_381(_) => Curve::Bls12_381,
    };
    PipelineError::ArtifactMismatch(format!("circuit is on {circuit}, witness on {witness_curve}"))
}

impl ProvingBackend for Groth16Backend {
    type Constraints = LoadedCircuit;
    type Witness = CircuitWitness;
    type Proof = ProofBundle;

    #[instrument(skip(self))]
    fn load_constraints(&self, r1cs: &Path) -> Result<LoadedCircuit, PipelineError> {
        let circuit = match detect_curve(r1cs)? {
            Curve::Bn254 => LoadedCircuit::Bn254(load_constraint_system(r1cs, &self.options)?),
            Curve::Bls12_381 => LoadedCircuit::Bls12_381(load_constraint_system(r1cs, &self.options)?),
        };
        debug!(curve = %circuit.curve(), "loaded constraint system");
        Ok(circuit)
    }

    fn shape(&self, constraints: &LoadedCircuit) -> CircuitShape {
        let (constraints_len, signals) = match constraints {
            LoadedCircuit::Bn254(cs) => (cs.num_constraints(), cs.num_signals),
            LoadedCircuit::Bls12_381(cs) => (cs.num_constraints(), cs.num_signals),
        };
        CircuitShape {
            curve: constraints.curve().to_string(),
            constraints: constraints_len,
            signals,
        }
    }

    #[instrument(skip(self, constraints))]
    fn evaluate_witness(&self, constraints: &LoadedCircuit, wasm: &Path, input: &Path) -> Result<CircuitWitness, PipelineError> {
        Ok(match constraints {
            LoadedCircuit::Bn254(cs) => CircuitWitness::Bn254(evaluate_witness_for(cs, wasm, input)?),
            LoadedCircuit::Bls12_381(cs) => CircuitWitness::Bls12_381(evaluate_witness_for(cs, wasm, input)?),
        })
    }

    fn prove(&self, constraints: &LoadedCircuit, witness: &CircuitWitness) -> Result<ProofBundle, PipelineError> {
        self.pool.install(|| match (constraints, witness) {
            (LoadedCircuit::Bn254(cs), CircuitWitness::Bn254(w)) => Ok(ProofBundle::Bn254(CurveProof::create(cs, w, self.seed)?)),
            (LoadedCircuit::Bls12_381(cs), CircuitWitness::Bls12_381(w)) => {
                Ok(ProofBundle::Bls12_381(CurveProof::create(cs, w, self.seed)?))
            }
            (circuit, witness) => Err(curve_mismatch(circuit.curve(), witness)),
        })
    }

    fn verify(&self, proof: &ProofBundle) -> Result<bool, PipelineError> {
        self.pool.install(|| match proof {
            ProofBundle::Bn254(p) => p.verify(),
            ProofBundle::Bls12_381(p) => p.verify(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groth16_examples::{cubic, write_fixture, FixturePaths};
    use groth16_r1cs::write_r1cs;
    use groth16_witness::{read_wtns, CircuitBuilder};

    fn backend() -> Groth16Backend {
        let config = PipelineConfig {
            threads: Some(2),
            seed: Some(17),
            ..PipelineConfig::default()
        };
        Groth16Backend::new(&config).unwrap()
    }

    #[test]
    fn test_bn254_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path(), &cubic::<Bn254Fr>()).unwrap();
        let backend = backend();
        assert_eq!(backend.threads(), 2);

        let circuit = backend.load_constraints(&paths.r1cs).unwrap();
        assert_eq!(circuit.curve(), Curve::Bn254);
        assert_eq!(backend.shape(&circuit).curve, "bn254");

        let witness = backend.evaluate_witness(&circuit, &paths.wasm, &paths.input).unwrap();
        let proof = backend.prove(&circuit, &witness).unwrap();
        assert!(backend.verify(&proof).unwrap());
        assert_eq!(proof.public_json(), "[\"35\"]");

        let wtns = dir.path().join("cubic.wtns");
        witness.save_wtns(&wtns).unwrap();
        let read: Witness<Bn254Fr> = read_wtns(&mut BufReader::new(File::open(&wtns).unwrap())).unwrap();
        assert_eq!(CircuitWitness::Bn254(read), witness);
    }

    #[test]
    fn test_bls12_381_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path(), &cubic::<Bls12381Fr>()).unwrap();
        let backend = backend();

        let circuit = backend.load_constraints(&paths.r1cs).unwrap();
        assert_eq!(circuit.curve(), Curve::Bls12_381);
        let witness = backend.evaluate_witness(&circuit, &paths.wasm, &paths.input).unwrap();
        let proof = backend.prove(&circuit, &witness).unwrap();
        assert_eq!(proof.curve(), Curve::Bls12_381);
        assert!(backend.verify(&proof).unwrap());
    }

    #[test]
    fn test_mismatched_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path(), &cubic::<Bn254Fr>()).unwrap();

        // a different circuit's constraints next to cubic's program
        let mut builder = CircuitBuilder::<Bn254Fr>::new();
        let out = builder.public_output("out");
        let x = builder.private_input("x");
        builder.mul_into(out, x, x);
        let (cs, _) = builder.finish();
        let other = FixturePaths::new(dir.path(), "square");
        write_r1cs(&cs, &mut File::create(&other.r1cs).unwrap()).unwrap();

        let backend = backend();
        let circuit = backend.load_constraints(&other.r1cs).unwrap();
        let err = backend.evaluate_witness(&circuit, &paths.wasm, &paths.input).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactMismatch(_)));
    }

    #[test]
    fn test_oversized_program_header() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_fixture(dir.path(), &cubic::<Bn254Fr>()).unwrap();

        // signal count sits after magic, version, n8 and the prime
        let mut bytes = fs::read(&paths.wasm).unwrap();
        let at = 12 + Bn254Fr::byte_len();
        bytes[at..at + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        fs::write(&paths.wasm, &bytes).unwrap();

        let backend = backend();
        let circuit = backend.load_constraints(&paths.r1cs).unwrap();
        let err = backend.evaluate_witness(&circuit, &paths.wasm, &paths.input).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactMismatch(_)), "{err}");
        assert!(err.to_string().contains(&u32::MAX.to_string()));
    }

    #[test]
    fn test_unsupported_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.r1cs");
        fs::write(&path, b"not an r1cs file").unwrap();
        let err = backend().load_constraints(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }
}
