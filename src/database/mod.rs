//! Entity Storage Module
//!
//! Typed access to the host key-value store and per-transition write staging.

pub mod store;
pub mod transaction;

pub use store::{EntityStore, MemoryStore};
pub use transaction::StagedStore;
