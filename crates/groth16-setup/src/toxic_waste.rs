//! Setup trapdoor.

use groth16_field::FieldLike;
use groth16_qap::{utils::random_evaluation_point, QAP};
use rand::Rng;

/// Secret setup values; zeroed on drop
#[derive(Debug, Clone)]
pub struct ToxicWaste<F: FieldLike> {
    /// Evaluation point, never in the QAP domain
    pub tau: F,
    /// α
    pub alpha: F,
    /// β
    pub beta: F,
    /// γ
    pub gamma: F,
    /// δ
    pub delta: F,
}

fn nonzero<F: FieldLike, R: Rng + ?Sized>(rng: &mut R) -> F {
    loop {
        let value = F::random(rng);
        if !<F as FieldLike>::is_zero(&value) {
            return value;
        }
    }
}

impl<F: FieldLike> ToxicWaste<F> {
    /// Sample fresh toxic waste for `qap`
    pub fn sample<R: Rng + ?Sized>(qap: &QAP<'_, F>, rng: &mut R) -> Self {
        Self {
            tau: random_evaluation_point(&qap.domain, rng),
            alpha: nonzero(rng),
            beta: nonzero(rng),
            gamma: nonzero(rng),
            delta: nonzero(rng),
        }
    }

    /// Overwrite every secret with zero
    pub fn destroy(&mut self) {
        let zero = <F as FieldLike>::zero();
        self.tau = zero;
        self.alpha = zero;
        self.beta = zero;
        self.gamma = zero;
        self.delta = zero;
    }

    /// True once [`ToxicWaste::destroy`] has run
    pub fn is_destroyed(&self) -> bool {
        [self.tau, self.alpha, self.beta, self.gamma, self.delta]
            .iter()
            .all(<F as FieldLike>::is_zero)
    }
}

impl<F: FieldLike> Drop for ToxicWaste<F> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_poly::EvaluationDomain;
    use groth16_field::F;
    use groth16_r1cs::ConstraintSystem;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sample_and_destroy() {
        let cs = ConstraintSystem::<F>::new(1, 0, 1);
        let qap = QAP::new(&cs).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let mut waste = ToxicWaste::sample(&qap, &mut rng);
        assert!(!<F as FieldLike>::is_zero(&qap.domain.evaluate_vanishing_polynomial(waste.tau)));
        assert!(!waste.is_destroyed());

        waste.destroy();
        assert!(waste.is_destroyed());
    }
}
