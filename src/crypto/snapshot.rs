//! Reputation snapshot digest.
//!
//! SHA-256 over a fixed-order, pipe-delimited rendering of the edge's
//! scoring state. Field order is part of the digest format.

use sha2::{Digest, Sha256};

use crate::reputation::Edge;

/// Canonical payload hashed by [`snapshot_hash`]
pub fn snapshot_payload(edge: &Edge) -> String {
    format!(
        "edge={}|b={}|d={}|u={}|score={}|pT={}|pS={}|pM={}|ePos={}|eNeg={}|t={}",
        edge.address,
        edge.opinion.belief,
        edge.opinion.disbelief,
        edge.opinion.uncertainty,
        edge.score,
        edge.belief.p_trust,
        edge.belief.p_suspect,
        edge.belief.p_malicious,
        edge.evidence_pos,
        edge.evidence_neg,
        edge.updated_at,
    )
}

/// Hex-encoded SHA-256 of the edge's reputation state
pub fn snapshot_hash(edge: &Edge) -> String {
    let mut hasher = Sha256::new();
    hasher.update(snapshot_payload(edge).as_bytes());
    format!("{:x}", hasher.finalize())
}
