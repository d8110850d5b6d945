//! Human-readable summary of an `.r1cs` file.

use crate::backend::{load_constraint_system, read_r1cs_header};
use crate::PipelineError;
use groth16_field::{Bls12381Fr, Bn254Fr, Curve, FieldLike};
use groth16_r1cs::{ConstraintSystem, LoadOptions};
use std::fmt::Write;
use std::path::Path;

fn describe_system<F: FieldLike>(cs: &ConstraintSystem<F>) -> String {
    let mut out = cs.to_string();
    let _ = write!(out, "\n  Digest: {}", cs.digest());
    out
}

/// Counts, digest and the first constraints of the system at `path`
pub fn describe_r1cs(path: &Path, options: &LoadOptions) -> Result<String, PipelineError> {
    let header = read_r1cs_header(path)?;
    let Some(curve) = header.curve() else {
        return Err(PipelineError::UnsupportedField(path.to_path_buf()));
    };
    let body = match curve {
        Curve::Bn254 => describe_system(&load_constraint_system::<Bn254Fr>(path, options)?),
        Curve::Bls12_381 => describe_system(&load_constraint_system::<Bls12381Fr>(path, options)?),
    };
    Ok(format!("{}\n  Field size: {} bytes\n  Labels: {}\n{body}", path.display(), header.field_size, header.n_labels))
}
