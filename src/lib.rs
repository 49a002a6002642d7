//! Edge Trust Engine
//!
//! Deterministic trust scoring and corrective governance for the edges of a
//! replicated ledger. Monitoring evidence from several channels becomes a
//! subjective-logic opinion and a hidden-Markov health belief; low trust opens
//! a governance proposal that a single admin approves or rejects.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - HTTP host entrypoint
//! ├── config.rs      - Environment configuration
//! ├── error.rs       - Transition error taxonomy
//! ├── engine.rs      - Operations as atomic state transitions
//! ├── reputation/    - Scoring models
//! │   ├── observation.rs - Per-channel observation classifier
//! │   ├── score.rs       - Subjective-logic opinion & thresholds
//! │   ├── hmm.rs         - Latent health belief tracker
//! │   ├── edge.rs        - Edge entity
//! │   └── manager.rs     - Applies observations to edges
//! ├── governance/    - Corrective proposals
//! │   ├── trigger.rs  - Opens proposals on low scores
//! │   └── proposal.rs - Proposal lifecycle
//! ├── crypto/        - Reputation snapshot digest
//! ├── protocol/      - Host interfaces (clock, admins) and messages
//! ├── database/      - Entity store and staged transactions
//! └── api/           - HTTP endpoints
//! ```

pub mod api;
pub mod config;
pub mod crypto;
pub mod database;
pub mod engine;
pub mod error;
pub mod governance;
pub mod protocol;
pub mod reputation;

pub use config::TrustConfig;
pub use engine::{ObservationOutcome, TrustEngine};
pub use error::{ErrorKind, TrustError, TrustResult};

// Re-export storage types
pub use database::{EntityStore, MemoryStore, StagedStore};

// Re-export governance types
pub use governance::{CorrectiveAction, GovernanceProposal, GovernanceTrigger, ProposalStatus};

// Re-export reputation types
pub use reputation::{
    ConsensusReport, Edge, EdgeStatus, HealthBelief, LogStage, Observation, ObservationSource,
    ReputationManager, ReputationThresholds, ReputationUpdate, ResourceUsage, SubjectiveOpinion,
    TaskReport, FP_SCALE, HMM_SCALE,
};

// Re-export host interfaces
pub use protocol::{AdminSet, BlockClock, BlockContext, IntervalClock, ManualClock, StaticAdminSet};
