//! Core Groth16 prover and verifier implementation.
//!
//! The prover is generic over the pairing. Its heavy lifting (the quotient
//! FFTs and five multi-scalar multiplications) runs on the caller's rayon
//! pool; [`thread_pool`] builds one sized to the machine. Before any group
//! work the prover re-checks every constraint row so an unsatisfying
//! witness can never turn into a proof.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use ark_serialize::SerializationError;
use groth16_qap::QAPError;
use std::fmt;

pub mod msm;
pub mod proof;
pub mod prover;
pub mod verifier;

pub use groth16_field;
pub use groth16_qap;
pub use groth16_r1cs;
pub use groth16_setup;
pub use proof::{public_inputs_from_json, public_inputs_to_json, Proof, ProofJson};
pub use prover::{create_proof, Prover};
pub use verifier::{prepare_verifying_key, verify_proof, BatchVerifier, PreparedVerifyingKey, Verifier};

/// How a failure should be treated by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad artifacts or inputs: report, mark the run failed, no retry
    MalformedInput,
    /// Limits or OS resources: fatal to the current run only
    ResourceExhaustion,
    /// A broken invariant: always fatal
    InternalConsistency,
}

impl ErrorCategory {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::MalformedInput => "malformed-input",
            ErrorCategory::ResourceExhaustion => "resource-exhaustion",
            ErrorCategory::InternalConsistency => "internal-consistency",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during proving or verification
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// Witness length differs from the signal count
    #[error("Witness has {actual} values, circuit has {expected} signals")]
    WitnessLengthMismatch {
        /// Signal count
        expected: usize,
        /// Witness length
        actual: usize,
    },

    /// Signal 0 of the witness is not one
    #[error("Witness signal 0 must be one")]
    InvalidConstantSignal,

    /// The witness fails a constraint row
    #[error("Witness does not satisfy constraint {row}")]
    WitnessConstraintMismatch {
        /// First failing row
        row: usize,
    },

    /// The proving key belongs to another circuit
    #[error("Proving key does not match the circuit: {0}")]
    ParameterSetMismatch(String),

    /// Wrong number of public inputs handed to the verifier
    #[error("Expected {expected} public inputs, got {actual}")]
    PublicInputCount {
        /// Count recorded in the verifying key
        expected: usize,
        /// Count supplied
        actual: usize,
    },

    /// MSM bases and scalars differ in length
    #[error("MSM over {bases} bases and {scalars} scalars")]
    MsmLength {
        /// Number of bases
        bases: usize,
        /// Number of scalars
        scalars: usize,
    },

    /// QAP error
    #[error("QAP error: {0}")]
    QAP(#[from] QAPError),

    /// Worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Proof bytes did not decode
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    /// Proof or public-input JSON did not decode
    #[error("Invalid proof encoding: {0}")]
    InvalidEncoding(String),
}

impl ProofError {
    /// Category used by drivers to decide whether to continue
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProofError::WitnessConstraintMismatch { .. } | ProofError::MsmLength { .. } => {
                ErrorCategory::InternalConsistency
            }
            ProofError::QAP(QAPError::DomainTooLarge { .. }) | ProofError::ThreadPool(_) => {
                ErrorCategory::ResourceExhaustion
            }
            ProofError::QAP(QAPError::R1CS(_)) => ErrorCategory::InternalConsistency,
            ProofError::WitnessLengthMismatch { .. }
            | ProofError::InvalidConstantSignal
            | ProofError::ParameterSetMismatch(_)
            | ProofError::PublicInputCount { .. }
            | ProofError::QAP(QAPError::AssignmentLength { .. })
            | ProofError::Serialization(_)
            | ProofError::InvalidEncoding(_) => ErrorCategory::MalformedInput,
        }
    }
}

/// Build a worker pool with `threads` workers, defaulting to the number of
/// hardware threads.
pub fn thread_pool(threads: Option<usize>) -> Result<rayon::ThreadPool, ProofError> {
    let threads = threads
        .filter(|&n| n > 0)
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("groth16-worker-{i}"))
        .build()
        .map_err(|err| ProofError::ThreadPool(err.to_string()))
}
