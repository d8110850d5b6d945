//! Pipeline configuration.
//!
//! Read from a JSON file; every field is optional and command-line flags
//! override whatever the file sets.

use crate::PipelineError;
use groth16_r1cs::LoadOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by every binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Worker threads for proving; `None` uses every hardware thread
    pub threads: Option<usize>,
    /// Seed for setup and proof randomness; `None` draws from the OS
    pub seed: Option<u64>,
    /// Substring marking a placeholder input document
    pub skip_marker: String,
    /// Where the batch report is written
    pub results_path: Option<PathBuf>,
    /// Check every proof after creating it
    pub verify_proofs: bool,
    /// Reject constraint systems with more rows than this
    pub max_constraints: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threads: None,
            seed: None,
            skip_marker: "TODO".to_string(),
            results_path: None,
            verify_proofs: true,
            max_constraints: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document
    pub fn from_json_str(text: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(text).map_err(|err| PipelineError::Config(err.to_string()))
    }

    /// Read a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| PipelineError::io(path, err))?;
        Self::from_json_str(&text)
    }

    /// File contents if a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, PipelineError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Loader limits implied by this configuration
    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::default();
        if let Some(max) = self.max_constraints {
            options.max_constraints = max;
        }
        options
    }
}
