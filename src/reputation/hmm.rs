//! Hidden-Markov latent health belief.
//!
//! Three hidden states in fixed order: Trustworthy, Suspicious, Malicious.
//! Each observation runs one predict step (transition matrix) followed by an
//! emission update and renormalisation. The malicious component is always
//! computed by subtraction so the triple sums to exactly `HMM_SCALE`.

use serde::{Deserialize, Serialize};

use super::observation::Observation;

/// Fixed-point scale of the belief triple
pub const HMM_SCALE: u64 = 1_000_000;

/// Transition matrix, rows = from-state, columns = to-state
pub const TRANSITION: [[u64; 3]; 3] = [
    [900_000, 80_000, 20_000],
    [100_000, 800_000, 100_000],
    [20_000, 80_000, 900_000],
];

/// Emission matrix, rows = hidden state, columns = observation class
pub const EMISSION: [[u64; 3]; 3] = [
    [850_000, 120_000, 30_000],
    [200_000, 600_000, 200_000],
    [30_000, 120_000, 850_000],
];

/// Latent health distribution `(p_trust, p_suspect, p_malicious)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBelief {
    pub p_trust: u64,
    pub p_suspect: u64,
    pub p_malicious: u64,
}

impl HealthBelief {
    /// Near-uniform distribution with an exact sum
    pub fn uniform() -> Self {
        let third = HMM_SCALE / 3;
        Self {
            p_trust: third,
            p_suspect: third,
            p_malicious: HMM_SCALE - 2 * third,
        }
    }

    pub fn sum(&self) -> u64 {
        self.p_trust + self.p_suspect + self.p_malicious
    }

    /// Predict with `TRANSITION`, weight by `EMISSION[.][obs]`, renormalise.
    pub fn update(&self, observation: Observation) -> Self {
        let prior = [self.p_trust, self.p_suspect, self.p_malicious];
        let obs = observation.index();

        let mut predicted = [0u64; 3];
        for (to, slot) in predicted.iter_mut().enumerate() {
            let mass: u64 = (0..3).map(|from| prior[from] * TRANSITION[from][to]).sum();
            *slot = mass / HMM_SCALE;
        }

        let mut weighted = [0u64; 3];
        for (state, slot) in weighted.iter_mut().enumerate() {
            *slot = predicted[state] * EMISSION[state][obs] / HMM_SCALE;
        }

        let sum: u64 = weighted.iter().sum();
        if sum == 0 {
            return Self::uniform();
        }

        let p_trust = weighted[0] * HMM_SCALE / sum;
        let p_suspect = weighted[1] * HMM_SCALE / sum;
        Self {
            p_trust,
            p_suspect,
            p_malicious: HMM_SCALE - p_trust - p_suspect,
        }
    }
}

impl Default for HealthBelief {
    fn default() -> Self {
        Self::uniform()
    }
}
