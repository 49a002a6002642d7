//! Governance proposals and their lifecycle.
//!
//! ```text
//! Pending ──approve──► Approved
//!    │
//!    └────reject────► Rejected
//! ```
//!
//! Both outcomes are terminal. A resolved proposal is never reopened and
//! never resolved again.

use serde::{Deserialize, Serialize};

use crate::error::{TrustError, TrustResult};
use crate::reputation::{Edge, EdgeStatus, ObservationSource};

/// Creator recorded on proposals opened by the trigger
pub const GOVERNANCE_MODULE: &str = "governance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
}

/// Recommended corrective action, advisory only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrectiveAction {
    WeightDown,
    TaskFreeze,
    ConsensusFreeze,
}

impl CorrectiveAction {
    pub fn for_source(source: ObservationSource) -> Self {
        match source {
            ObservationSource::Consensus => CorrectiveAction::ConsensusFreeze,
            ObservationSource::TaskEvent | ObservationSource::LogSummary(_) => {
                CorrectiveAction::TaskFreeze
            }
            ObservationSource::Feedback => CorrectiveAction::WeightDown,
        }
    }
}

/// Append-only corrective-action record against an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceProposal {
    pub proposal_id: String,
    pub edge_id: String,
    pub status: ProposalStatus,
    pub action: CorrectiveAction,
    pub cause: ObservationSource,
    pub trigger_score: u64,
    pub threshold: u64,
    /// Ordered reason trail: trigger reason first, then decision notes
    pub reasons: Vec<String>,
    pub creator: String,
    pub created_height: u64,
    pub created_at: i64,
    pub decided_by: Option<String>,
    pub decided_at: Option<i64>,
}

impl GovernanceProposal {
    pub fn is_pending(&self) -> bool {
        self.status == ProposalStatus::Pending
    }

    /// Reason trail rendered as one line
    pub fn reason(&self) -> String {
        self.reasons.join(" | ")
    }

    /// Pending → Approved
    pub fn approve(&mut self, decider: &str, now: i64) -> TrustResult<()> {
        self.resolve(ProposalStatus::Approved, decider, now)
    }

    /// Pending → Rejected. A non-empty reason is appended to the trail.
    pub fn reject(&mut self, decider: &str, reason: &str, now: i64) -> TrustResult<()> {
        self.resolve(ProposalStatus::Rejected, decider, now)?;
        let reason = reason.trim();
        if !reason.is_empty() {
            self.reasons.push(format!("reject: {}", reason));
        }
        Ok(())
    }

    fn resolve(&mut self, outcome: ProposalStatus, decider: &str, now: i64) -> TrustResult<()> {
        if !self.is_pending() {
            return Err(TrustError::InvalidState(format!(
                "proposal {} is {:?}, not pending",
                self.proposal_id, self.status
            )));
        }
        self.status = outcome;
        self.decided_by = Some(decider.to_string());
        self.decided_at = Some(now);
        Ok(())
    }

    /// Edge-side cleanup after resolution.
    ///
    /// Clears the edge's pending reference only when it still points at this
    /// proposal; otherwise a silent no-op. Approval also returns the edge to
    /// Active. Returns whether the edge was touched.
    pub fn release_edge(&self, edge: &mut Edge, now: i64) -> bool {
        if edge.pending_proposal_id.as_deref() != Some(self.proposal_id.as_str()) {
            return false;
        }

        edge.pending_proposal_id = None;
        if self.status == ProposalStatus::Approved {
            edge.status = EdgeStatus::Active;
            edge.updated_at = now;
        }
        true
    }
}
