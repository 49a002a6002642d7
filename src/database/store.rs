//! Entity store abstraction and the in-memory implementation.
//!
//! The engine only sees [`EntityStore`]: typed get/put per entity kind plus
//! named monotonic sequences. Listings are ordered by key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::governance::GovernanceProposal;
use crate::protocol::{LogSummary, ReputationPropagation, Task};
use crate::reputation::Edge;

/// Host key-value store as seen by the engine
pub trait EntityStore {
    fn edge(&self, address: &str) -> Option<Edge>;
    fn put_edge(&mut self, edge: Edge);
    fn edges(&self) -> Vec<Edge>;

    fn proposal(&self, proposal_id: &str) -> Option<GovernanceProposal>;
    fn put_proposal(&mut self, proposal: GovernanceProposal);
    fn proposals(&self) -> Vec<GovernanceProposal>;

    fn task(&self, task_id: &str) -> Option<Task>;
    fn put_task(&mut self, task: Task);

    fn log_summary(&self, log_hash: &str) -> Option<LogSummary>;
    fn put_log_summary(&mut self, summary: LogSummary);

    fn propagation(&self, id: u64) -> Option<ReputationPropagation>;
    fn put_propagation(&mut self, propagation: ReputationPropagation);
    fn propagations(&self) -> Vec<ReputationPropagation>;

    /// Last value handed out for `name` (0 if never used)
    fn sequence(&self, name: &str) -> u64;
    fn set_sequence(&mut self, name: &str, value: u64);

    fn next_sequence(&mut self, name: &str) -> u64 {
        let next = self.sequence(name) + 1;
        self.set_sequence(name, next);
        next
    }
}

/// Ordered in-memory store, serializable as one JSON document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    edges: BTreeMap<String, Edge>,
    proposals: BTreeMap<String, GovernanceProposal>,
    tasks: BTreeMap<String, Task>,
    log_summaries: BTreeMap<String, LogSummary>,
    propagations: BTreeMap<u64, ReputationPropagation>,
    sequences: BTreeMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize store")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse store snapshot")
    }

    /// Load a snapshot file; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No state file at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        let store = Self::from_json(&raw)?;
        info!(
            "Loaded state from {}: {} edges, {} proposals",
            path.display(),
            store.edges.len(),
            store.proposals.len()
        );
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = self.to_json()?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write state file {}", path.display()))?;
        info!("Saved state to {}", path.display());
        Ok(())
    }
}

impl EntityStore for MemoryStore {
    fn edge(&self, address: &str) -> Option<Edge> {
        self.edges.get(address).cloned()
    }

    fn put_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.address.clone(), edge);
    }

    fn edges(&self) -> Vec<Edge> {
        self.edges.values().cloned().collect()
    }

    fn proposal(&self, proposal_id: &str) -> Option<GovernanceProposal> {
        self.proposals.get(proposal_id).cloned()
    }

    fn put_proposal(&mut self, proposal: GovernanceProposal) {
        self.proposals
            .insert(proposal.proposal_id.clone(), proposal);
    }

    fn proposals(&self) -> Vec<GovernanceProposal> {
        self.proposals.values().cloned().collect()
    }

    fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks.get(task_id).cloned()
    }

    fn put_task(&mut self, task: Task) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    fn log_summary(&self, log_hash: &str) -> Option<LogSummary> {
        self.log_summaries.get(log_hash).cloned()
    }

    fn put_log_summary(&mut self, summary: LogSummary) {
        self.log_summaries.insert(summary.log_hash.clone(), summary);
    }

    fn propagation(&self, id: u64) -> Option<ReputationPropagation> {
        self.propagations.get(&id).cloned()
    }

    fn put_propagation(&mut self, propagation: ReputationPropagation) {
        self.propagations.insert(propagation.id, propagation);
    }

    fn propagations(&self) -> Vec<ReputationPropagation> {
        self.propagations.values().cloned().collect()
    }

    fn sequence(&self, name: &str) -> u64 {
        self.sequences.get(name).copied().unwrap_or(0)
    }

    fn set_sequence(&mut self, name: &str, value: u64) {
        self.sequences.insert(name.to_string(), value);
    }
}
