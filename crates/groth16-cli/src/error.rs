//! Pipeline-level errors and their categories.

use groth16_core::{ErrorCategory, ProofError};
use groth16_r1cs::LoadError;
use groth16_setup::SetupError;
use groth16_witness::WitnessError;
use std::io;
use std::path::PathBuf;

/// Errors raised while driving a circuit through the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Constraint system could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Witness program, inputs or evaluation failed
    #[error(transparent)]
    Witness(#[from] WitnessError),

    /// Key generation or key I/O failed
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Proving or verification failed
    #[error(transparent)]
    Proof(#[from] ProofError),

    /// The artifact's field prime is not one of the supported curves
    #[error("{0} targets an unsupported field")]
    UnsupportedField(PathBuf),

    /// Two artifacts of one circuit disagree
    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// A freshly created proof did not verify
    #[error("proof for `{circuit}` on {curve} failed self-verification")]
    ProofRejected {
        /// Circuit name
        circuit: String,
        /// Curve the proof was made on
        curve: String,
    },

    /// Configuration file is invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Report could not be encoded
    #[error("report encoding failed: {0}")]
    Report(#[from] serde_json::Error),

    /// File system error outside the artifact loaders
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

impl PipelineError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// How the driver must react to this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Load(LoadError::ResourceLimit { .. }) => ErrorCategory::ResourceExhaustion,
            PipelineError::Load(_) => ErrorCategory::MalformedInput,
            PipelineError::Witness(WitnessError::ResourceLimit { .. }) => ErrorCategory::ResourceExhaustion,
            PipelineError::Witness(_) => ErrorCategory::MalformedInput,
            PipelineError::Setup(SetupError::InvalidCircuit(_)) => ErrorCategory::MalformedInput,
            PipelineError::Setup(SetupError::QAP(_)) => ErrorCategory::ResourceExhaustion,
            PipelineError::Setup(SetupError::DegenerateParameter(_)) => ErrorCategory::InternalConsistency,
            PipelineError::Setup(_) => ErrorCategory::MalformedInput,
            PipelineError::Proof(err) => err.category(),
            PipelineError::UnsupportedField(_) | PipelineError::ArtifactMismatch(_) => ErrorCategory::MalformedInput,
            PipelineError::ProofRejected { .. } => ErrorCategory::InternalConsistency,
            PipelineError::Config(_) | PipelineError::Io { .. } => ErrorCategory::MalformedInput,
            PipelineError::Report(_) => ErrorCategory::ResourceExhaustion,
        }
    }

    /// True when the batch must stop
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::InternalConsistency
    }
}
