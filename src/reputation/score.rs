//! Subjective-Logic Opinion and Governance Thresholds
//!
//! Evidence counters (r positive, s negative) are turned into a
//! belief/disbelief/uncertainty opinion with a Dirichlet prior of weight 2.
//! All values are integers scaled by `FP_SCALE`; no floating point is used.
//! The scalar score is the projected probability `b + u/2`.

use serde::{Deserialize, Serialize};

/// Fixed-point scale for opinion fields and scores
pub const FP_SCALE: u64 = 1_000_000;

/// Dirichlet prior strength
pub const PRIOR_WEIGHT: u64 = 2;

/// Default score below which a governance proposal is opened (0.30)
pub const DEFAULT_PROPOSAL_THRESHOLD: u64 = FP_SCALE * 3 / 10;

/// Subjective-logic opinion, every field scaled by `FP_SCALE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectiveOpinion {
    pub belief: u64,
    pub disbelief: u64,
    pub uncertainty: u64,
}

impl SubjectiveOpinion {
    /// Opinion with no evidence at all (b=0, d=0, u=1)
    pub fn vacuous() -> Self {
        Self {
            belief: 0,
            disbelief: 0,
            uncertainty: FP_SCALE,
        }
    }

    /// Recompute the opinion from cumulative evidence.
    ///
    /// Pure and idempotent: the same `(positive, negative)` pair always yields
    /// the same opinion regardless of the history that produced it.
    pub fn from_evidence(positive: u64, negative: u64) -> Self {
        let total = positive
            .saturating_add(negative)
            .saturating_add(PRIOR_WEIGHT);
        if total == 0 {
            return Self::vacuous();
        }

        Self {
            belief: fp_div(positive, total),
            disbelief: fp_div(negative, total),
            uncertainty: fp_div(PRIOR_WEIGHT, total),
        }
    }

    /// Projected probability `b + u/2`
    pub fn score(&self) -> u64 {
        self.belief + self.uncertainty / 2
    }
}

impl Default for SubjectiveOpinion {
    fn default() -> Self {
        Self::vacuous()
    }
}

/// `a / b` in fixed point, truncating. Zero divisor yields zero.
fn fp_div(a: u64, b: u64) -> u64 {
    if b == 0 {
        return 0;
    }
    ((a as u128 * FP_SCALE as u128) / b as u128) as u64
}

/// Governance-configurable thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationThresholds {
    /// Score strictly below which a corrective proposal is opened
    pub proposal_threshold: u64,
}

impl Default for ReputationThresholds {
    fn default() -> Self {
        Self {
            proposal_threshold: DEFAULT_PROPOSAL_THRESHOLD,
        }
    }
}

impl ReputationThresholds {
    pub fn is_breached(&self, score: u64) -> bool {
        score < self.proposal_threshold
    }
}
