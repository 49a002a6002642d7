//! Reputation Manager - applies classified observations to edges
//!
//! Each channel method bumps the raw counters for that channel, classifies the
//! report and then runs the shared update: evidence, opinion, latent belief and
//! timestamp. Governance decisions are left to the caller.

use tracing::debug;

use crate::crypto::snapshot_hash;
use crate::reputation::{
    classify_feedback, ConsensusReport, Edge, LogStage, Observation, ObservationSource,
    ReputationThresholds, ResourceUsage, SubjectiveOpinion, TaskReport,
};

/// Result of applying one observation to an edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationUpdate {
    pub observation: Observation,
    pub source: ObservationSource,
    pub previous_score: u64,
    pub score: u64,
    /// Digest of the edge state right after the update
    pub snapshot_hash: String,
}

/// Main reputation manager
#[derive(Debug, Clone, Default)]
pub struct ReputationManager {
    thresholds: ReputationThresholds,
}

impl ReputationManager {
    pub fn new(thresholds: ReputationThresholds) -> Self {
        Self { thresholds }
    }

    /// Get current thresholds
    pub fn get_thresholds(&self) -> &ReputationThresholds {
        &self.thresholds
    }

    /// Consensus participation channel
    pub fn record_consensus(
        &self,
        edge: &mut Edge,
        report: &ConsensusReport,
        now: i64,
    ) -> ReputationUpdate {
        let counters = &mut edge.counters;
        counters.missed_votes = counters.missed_votes.saturating_add(report.missed_votes);
        counters.double_signs = counters.double_signs.saturating_add(report.double_signs);
        counters.participation_permille = report.participation_permille;

        self.apply_observation(edge, report.classify(), ObservationSource::Consensus, now)
    }

    /// Task-execution channel
    pub fn record_task_event(
        &self,
        edge: &mut Edge,
        report: &TaskReport,
        now: i64,
    ) -> ReputationUpdate {
        let counters = &mut edge.counters;
        if report.on_time {
            counters.on_time = counters.on_time.saturating_add(1);
        }
        if report.correct {
            counters.correct = counters.correct.saturating_add(1);
        }
        if report.resource_anomaly {
            counters.resource_anomalies = counters.resource_anomalies.saturating_add(1);
            counters.anomalies = counters.anomalies.saturating_add(1);
        }
        if report.timeout {
            counters.timeouts = counters.timeouts.saturating_add(1);
        }

        self.apply_observation(edge, report.classify(), ObservationSource::TaskEvent, now)
    }

    /// Telemetry channel. Correctness is unknown at the RESULT stage, so only
    /// the on-time counter moves there.
    pub fn record_log_summary(
        &self,
        edge: &mut Edge,
        usage: &ResourceUsage,
        stage: LogStage,
        now: i64,
    ) -> ReputationUpdate {
        let observation = usage.classify();
        let counters = &mut edge.counters;
        match observation {
            Observation::Malicious => counters.timeouts = counters.timeouts.saturating_add(1),
            Observation::Anomaly => counters.anomalies = counters.anomalies.saturating_add(1),
            Observation::Good => {}
        }
        if stage == LogStage::Result {
            counters.on_time = counters.on_time.saturating_add(1);
        }

        self.apply_observation(edge, observation, ObservationSource::LogSummary(stage), now)
    }

    /// Client-feedback channel
    pub fn record_feedback(&self, edge: &mut Edge, accepted: bool, now: i64) -> ReputationUpdate {
        let counters = &mut edge.counters;
        if accepted {
            counters.correct = counters.correct.saturating_add(1);
        } else {
            counters.complaints = counters.complaints.saturating_add(1);
        }

        self.apply_observation(
            edge,
            classify_feedback(accepted),
            ObservationSource::Feedback,
            now,
        )
    }

    /// Shared update: one unit of evidence, recomputed opinion, HMM step.
    pub fn apply_observation(
        &self,
        edge: &mut Edge,
        observation: Observation,
        source: ObservationSource,
        now: i64,
    ) -> ReputationUpdate {
        let previous_score = edge.score;

        if observation.is_positive() {
            edge.evidence_pos = edge.evidence_pos.saturating_add(1);
        } else {
            edge.evidence_neg = edge.evidence_neg.saturating_add(1);
        }

        edge.opinion = SubjectiveOpinion::from_evidence(edge.evidence_pos, edge.evidence_neg);
        edge.score = edge.opinion.score();
        edge.belief = edge.belief.update(observation);
        edge.updated_at = now;

        let snapshot_hash = snapshot_hash(edge);

        debug!(
            edge_id = %edge.address,
            observation = ?observation,
            source = %source,
            previous_score = previous_score,
            score = edge.score,
            p_malicious = edge.belief.p_malicious,
            snapshot = %snapshot_hash,
            "Applied observation"
        );

        ReputationUpdate {
            observation,
            source,
            previous_score,
            score: edge.score,
            snapshot_hash,
        }
    }
}
