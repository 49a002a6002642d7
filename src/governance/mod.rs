//! Corrective Governance
//!
//! Low trust opens a proposal; a single admin decision closes it.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ ReputationUpdate │────►│ GovernanceTrigger│────►│ GovernanceProposal│
//! │ (new score)      │     │ (score < thr and │     │ (Pending)         │
//! └──────────────────┘     │  none pending)   │     └────────┬─────────┘
//!                          └──────────────────┘              │ admin
//!                                                            ▼
//!                                                  Approved / Rejected
//!                                                  (edge reference cleared)
//! ```

pub mod proposal;
pub mod trigger;

pub use proposal::{CorrectiveAction, GovernanceProposal, ProposalStatus, GOVERNANCE_MODULE};
pub use trigger::{proposal_id, GovernanceTrigger, ThresholdBreach};
