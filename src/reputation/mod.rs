//! Reputation Scoring for Edges
//!
//! Converts per-channel monitoring evidence into a trust opinion and a latent
//! health belief. Two models run side by side on every observation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Channel report  │────►│ Observation       │────►│ ReputationManager│
//! │ (consensus,     │     │ (Good / Anomaly / │     │ (updates Edge)   │
//! │  task, log, fb) │     │  Malicious)       │     └────────┬─────────┘
//! └─────────────────┘     └───────────────────┘              │
//!                                              ┌─────────────┴─────────────┐
//!                                              ▼                           ▼
//!                                     ┌──────────────────┐       ┌──────────────────┐
//!                                     │ SubjectiveOpinion│       │ HealthBelief     │
//!                                     │ (b, d, u, score) │       │ (pT, pS, pM)     │
//!                                     └──────────────────┘       └──────────────────┘
//! ```
//!
//! ## Score Model
//!
//! - Good adds one unit of positive evidence, Anomaly/Malicious one unit of negative
//! - Opinion is recomputed from `(evidence_pos, evidence_neg)` with prior weight 2
//! - Score = belief + uncertainty / 2, fixed point scale 1,000,000
//! - A fresh edge scores 500,000; proposals open below 300,000

mod edge;
mod hmm;
mod manager;
mod observation;
mod score;

pub use edge::{Edge, EdgeCounters, EdgeStatus};
pub use hmm::{HealthBelief, EMISSION, HMM_SCALE, TRANSITION};
pub use manager::{ReputationManager, ReputationUpdate};
pub use observation::{
    classify_feedback, ConsensusReport, LogStage, Observation, ObservationSource, ResourceUsage,
    TaskReport,
};
pub use score::{
    ReputationThresholds, SubjectiveOpinion, DEFAULT_PROPOSAL_THRESHOLD, FP_SCALE, PRIOR_WEIGHT,
};
