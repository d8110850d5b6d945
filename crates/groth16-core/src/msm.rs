//! Multi-scalar multiplication split across the current rayon pool.

use crate::ProofError;
use ark_ec::VariableBaseMSM;
use rayon::prelude::*;

/// `Σ scalars[i] · bases[i]`, one Pippenger chunk per worker.
pub fn msm<G: VariableBaseMSM>(bases: &[G::MulBase], scalars: &[G::ScalarField]) -> Result<G, ProofError> {
    if bases.len() != scalars.len() {
        return Err(ProofError::MsmLength {
            bases: bases.len(),
            scalars: scalars.len(),
        });
    }
    if bases.is_empty() {
        return Ok(G::zero());
    }

    let threads = rayon::current_num_threads().max(1);
    let chunk = (bases.len() + threads - 1) / threads;
    Ok(bases
        .par_chunks(chunk)
        .zip(scalars.par_chunks(chunk))
        .map(|(b, s)| G::msm_unchecked(b, s))
        .reduce(G::zero, |acc, part| acc + part))
}
