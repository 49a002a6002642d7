//! Scored edge participant.

use serde::{Deserialize, Serialize};

use super::hmm::HealthBelief;
use super::score::SubjectiveOpinion;

/// Operational status of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeStatus {
    Active,
    TaskFrozen,
    ConsensusFrozen,
}

impl EdgeStatus {
    /// Whether the edge may receive and report on tasks
    pub fn accepts_tasks(&self) -> bool {
        !matches!(self, EdgeStatus::TaskFrozen)
    }
}

/// Raw event counters, never used for scoring directly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounters {
    pub on_time: u64,
    pub correct: u64,
    pub timeouts: u64,
    pub resource_anomalies: u64,
    pub anomalies: u64,
    pub complaints: u64,
    pub missed_votes: u64,
    pub double_signs: u64,
    /// Latest reported value, not cumulative
    pub participation_permille: u64,
}

/// A scored participant keyed by its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub address: String,
    pub creator: String,
    pub region: String,
    pub status: EdgeStatus,

    /// Monotonic evidence counters (Good vs Anomaly/Malicious)
    pub evidence_pos: u64,
    pub evidence_neg: u64,

    /// Always recomputed from the evidence counters
    pub opinion: SubjectiveOpinion,
    pub score: u64,

    pub belief: HealthBelief,
    pub counters: EdgeCounters,

    /// At most one pending proposal per edge
    pub pending_proposal_id: Option<String>,

    pub registered_at: i64,
    pub updated_at: i64,
}

impl Edge {
    /// New edge with full uncertainty and a near-uniform latent belief
    pub fn new(address: String, creator: String, region: String, now: i64) -> Self {
        let opinion = SubjectiveOpinion::vacuous();
        Self {
            address,
            creator,
            region,
            status: EdgeStatus::Active,
            evidence_pos: 0,
            evidence_neg: 0,
            score: opinion.score(),
            opinion,
            belief: HealthBelief::uniform(),
            counters: EdgeCounters::default(),
            pending_proposal_id: None,
            registered_at: now,
            updated_at: now,
        }
    }

    pub fn total_evidence(&self) -> u64 {
        self.evidence_pos + self.evidence_neg
    }

    pub fn has_pending_proposal(&self) -> bool {
        self.pending_proposal_id.is_some()
    }
}
