//! Governance Trigger
//!
//! Runs after every reputation update. Opens a Pending proposal when the new
//! score is strictly below the threshold and the edge has no pending proposal.
//! While one is pending, further breaches are suppressed.

use tracing::info;

use crate::governance::proposal::{
    CorrectiveAction, GovernanceProposal, ProposalStatus, GOVERNANCE_MODULE,
};
use crate::protocol::BlockContext;
use crate::reputation::{Edge, ObservationSource, ReputationThresholds};

/// Score that crossed the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdBreach {
    pub score: u64,
    pub threshold: u64,
}

/// Deterministic proposal id from the host-provided sequence
pub fn proposal_id(edge_id: &str, sequence: u64) -> String {
    format!("P-{}-{}", edge_id, sequence)
}

pub struct GovernanceTrigger<'a> {
    thresholds: &'a ReputationThresholds,
}

impl<'a> GovernanceTrigger<'a> {
    pub fn new(thresholds: &'a ReputationThresholds) -> Self {
        Self { thresholds }
    }

    /// `None` when a proposal is already pending or the score is acceptable
    pub fn evaluate(&self, edge: &Edge) -> Option<ThresholdBreach> {
        if edge.has_pending_proposal() || !self.thresholds.is_breached(edge.score) {
            return None;
        }

        Some(ThresholdBreach {
            score: edge.score,
            threshold: self.thresholds.proposal_threshold,
        })
    }

    /// Build the Pending proposal and link it to the edge
    pub fn open(
        &self,
        edge: &mut Edge,
        breach: ThresholdBreach,
        cause: ObservationSource,
        proposal_id: String,
        block: &BlockContext,
    ) -> GovernanceProposal {
        let reason = format!(
            "auto: score<thr (score={}, thr={}); {}",
            breach.score, breach.threshold, cause
        );
        let action = CorrectiveAction::for_source(cause);

        info!(
            edge_id = %edge.address,
            proposal_id = %proposal_id,
            score = breach.score,
            threshold = breach.threshold,
            action = ?action,
            "Opening governance proposal"
        );

        edge.pending_proposal_id = Some(proposal_id.clone());

        GovernanceProposal {
            proposal_id,
            edge_id: edge.address.clone(),
            status: ProposalStatus::Pending,
            action,
            cause,
            trigger_score: breach.score,
            threshold: breach.threshold,
            reasons: vec![reason],
            creator: GOVERNANCE_MODULE.to_string(),
            created_height: block.height,
            created_at: block.time,
            decided_by: None,
            decided_at: None,
        }
    }
}
