//! Batch benchmark driver.

use crate::backend::ProvingBackend;
use crate::discovery::discover;
use crate::metrics::measure;
use crate::report::{BenchmarkReport, BenchmarkRun, RunStatus};
use crate::{PipelineConfig, PipelineError};
use groth16_examples::FixturePaths;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};

/// Stage names used in run records
pub mod stage {
    /// Constraint system loading
    pub const LOAD: &str = "load";
    /// Witness evaluation
    pub const WITNESS: &str = "witness";
    /// Setup and proof generation
    pub const PROVE: &str = "prove";
    /// Proof verification
    pub const VERIFY: &str = "verify";
}

/// Result of running one circuit
pub struct CircuitOutcome<B: ProvingBackend> {
    /// The run record
    pub run: BenchmarkRun,
    /// The witness, if evaluation succeeded
    pub witness: Option<B::Witness>,
    /// The proof, if proving succeeded
    pub proof: Option<B::Proof>,
    /// The error that ended the run early
    pub error: Option<PipelineError>,
}

/// Drives circuits through a backend and records what each stage cost
pub struct BenchmarkRunner<B> {
    backend: B,
    config: PipelineConfig,
}

impl<B: ProvingBackend> BenchmarkRunner<B> {
    /// Runner over `backend`
    pub fn new(backend: B, config: PipelineConfig) -> Self {
        Self { backend, config }
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load, evaluate, prove and (optionally) verify one circuit.
    ///
    /// Never returns early with an error: a failing stage is recorded in
    /// the outcome and the remaining stages are not run.
    pub fn run_circuit(&self, paths: &FixturePaths) -> CircuitOutcome<B> {
        let _span = info_span!("circuit", name = %paths.name).entered();
        let mut outcome = CircuitOutcome {
            run: BenchmarkRun::started(&paths.name),
            witness: None,
            proof: None,
            error: None,
        };
        if let Err(err) = self.run_stages(paths, &mut outcome) {
            outcome.run.fail(&err);
            outcome.error = Some(err);
        } else {
            outcome.run.succeed();
        }
        outcome
    }

    fn run_stages(&self, paths: &FixturePaths, outcome: &mut CircuitOutcome<B>) -> Result<(), PipelineError> {
        let run = &mut outcome.run;

        let (constraints, metrics) = measure(|| self.backend.load_constraints(&paths.r1cs));
        run.record_stage(stage::LOAD, metrics);
        let constraints = constraints?;
        let shape = self.backend.shape(&constraints);
        info!(curve = %shape.curve, constraints = shape.constraints, signals = shape.signals, "loaded circuit");
        run.curve = Some(shape.curve);
        run.constraints = Some(shape.constraints);
        run.signals = Some(shape.signals);

        let (witness, metrics) = measure(|| self.backend.evaluate_witness(&constraints, &paths.wasm, &paths.input));
        run.record_stage(stage::WITNESS, metrics);
        let witness = outcome.witness.insert(witness?);

        let (proof, metrics) = measure(|| self.backend.prove(&constraints, witness));
        run.record_stage(stage::PROVE, metrics);
        info!(wall_seconds = metrics.wall_seconds, cpu_percent = metrics.cpu_percent, "proved");
        let proof = outcome.proof.insert(proof?);

        if self.config.verify_proofs {
            let (valid, metrics) = measure(|| self.backend.verify(proof));
            run.record_stage(stage::VERIFY, metrics);
            if !valid? {
                return Err(PipelineError::ProofRejected {
                    circuit: paths.name.clone(),
                    curve: run.curve.clone().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// Where the report for a run over `dir` goes
    pub fn results_path(&self, dir: &Path) -> PathBuf {
        self.config
            .results_path
            .clone()
            .unwrap_or_else(|| dir.join("benchmark_results.json"))
    }

    /// Run every circuit under `dir` and write the report.
    ///
    /// Malformed inputs and exhausted resources fail only their own
    /// circuit. An internal consistency error stops the batch; the report
    /// is still written with the runs so far before the error is returned.
    pub fn run_dir(&self, dir: &Path, threads: usize) -> Result<BenchmarkReport, PipelineError> {
        let circuits = discover(dir, &self.config.skip_marker)?;
        let results_path = self.results_path(dir);
        let mut report = BenchmarkReport::new(threads);
        info!(dir = %dir.display(), circuits = circuits.len(), threads, "starting benchmark");

        for circuit in circuits {
            if let Some(reason) = circuit.skip {
                report.push(BenchmarkRun::skipped(&circuit.paths.name, reason.to_string()));
                continue;
            }
            let outcome = self.run_circuit(&circuit.paths);
            report.push(outcome.run);
            if let Some(err) = outcome.error {
                if err.is_fatal() {
                    error!(circuit = %circuit.paths.name, %err, "aborting benchmark");
                    report.write(&results_path)?;
                    return Err(err);
                }
                warn!(circuit = %circuit.paths.name, category = %err.category(), %err, "circuit failed");
            }
        }

        report.write(&results_path)?;
        info!(
            succeeded = report.count(RunStatus::Success),
            failed = report.count(RunStatus::Failed),
            skipped = report.count(RunStatus::Skipped),
            results = %results_path.display(),
            "benchmark finished"
        );
        Ok(report)
    }
}
