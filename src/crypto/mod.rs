//! Cryptographic utilities for the trust engine
//!
//! Provides the deterministic reputation snapshot digest used by propagation
//! records and update logs.

pub mod snapshot;

pub use snapshot::{snapshot_hash, snapshot_payload};
