//! Host Protocol Integration
//!
//! Narrow interfaces the engine consumes from its host runtime, plus the
//! messages and records exchanged with it:
//! - Block clock (height, time) for every written timestamp
//! - Admin membership check for governance actions
//! - Request messages and stored records
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Host runtime   │
//! │ (transactions)  │
//! └────────┬────────┘
//!          │ messages
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ TrustEngine     │────►│ BlockClock      │
//! │                 │────►│ AdminSet        │
//! └────────┬────────┘     └─────────────────┘
//!          │
//!          ▼
//!   EntityStore (records)
//! ```

pub mod admin;
pub mod clock;
pub mod types;

pub use admin::{AdminSet, StaticAdminSet};
pub use clock::{BlockClock, BlockContext, IntervalClock, ManualClock};
pub use types::*;
