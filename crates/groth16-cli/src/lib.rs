//! Benchmark driver and command-line plumbing for the Groth16 pipeline.
//!
//! A circuits directory holds, per circuit `X`, the constraint system
//! `X.r1cs`, the witness program `X_js/X.wasm` and the input document
//! `X_input.json`. The [`BenchmarkRunner`] discovers those triples, pushes
//! each through a [`ProvingBackend`] and writes a JSON report of per-stage
//! wall time, CPU use and peak memory.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod config;
pub mod discovery;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod metrics;
pub mod report;
pub mod runner;

pub use backend::{detect_curve, CircuitShape, CircuitWitness, Groth16Backend, LoadedCircuit, ProofBundle, ProvingBackend};
pub use config::PipelineConfig;
pub use discovery::{check_circuit, discover, DiscoveredCircuit, SkipReason};
pub use error::PipelineError;
pub use groth16_core::ErrorCategory;
pub use logging::init_tracing;
pub use metrics::{measure, Metrics};
pub use report::{BenchmarkReport, BenchmarkRun, RunStatus};
pub use runner::{BenchmarkRunner, CircuitOutcome};
