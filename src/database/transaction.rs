//! Staged writes over an [`EntityStore`].
//!
//! Reads fall through to the base store unless the key was written in this
//! transaction. Nothing reaches the base store until [`StagedStore::commit`];
//! dropping the overlay discards every write.

use std::collections::BTreeMap;

use crate::database::store::EntityStore;
use crate::governance::GovernanceProposal;
use crate::protocol::{LogSummary, ReputationPropagation, Task};
use crate::reputation::Edge;

pub struct StagedStore<'a, S: EntityStore> {
    base: &'a mut S,
    edges: BTreeMap<String, Edge>,
    proposals: BTreeMap<String, GovernanceProposal>,
    tasks: BTreeMap<String, Task>,
    log_summaries: BTreeMap<String, LogSummary>,
    propagations: BTreeMap<u64, ReputationPropagation>,
    sequences: BTreeMap<String, u64>,
}

impl<'a, S: EntityStore> StagedStore<'a, S> {
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            edges: BTreeMap::new(),
            proposals: BTreeMap::new(),
            tasks: BTreeMap::new(),
            log_summaries: BTreeMap::new(),
            propagations: BTreeMap::new(),
            sequences: BTreeMap::new(),
        }
    }

    /// Number of staged entity writes
    pub fn pending_writes(&self) -> usize {
        self.edges.len()
            + self.proposals.len()
            + self.tasks.len()
            + self.log_summaries.len()
            + self.propagations.len()
    }

    /// Flush every staged write into the base store
    pub fn commit(self) -> usize {
        let written = self.pending_writes();
        let base = self.base;

        for (name, value) in self.sequences {
            base.set_sequence(&name, value);
        }
        for edge in self.edges.into_values() {
            base.put_edge(edge);
        }
        for proposal in self.proposals.into_values() {
            base.put_proposal(proposal);
        }
        for task in self.tasks.into_values() {
            base.put_task(task);
        }
        for summary in self.log_summaries.into_values() {
            base.put_log_summary(summary);
        }
        for propagation in self.propagations.into_values() {
            base.put_propagation(propagation);
        }

        written
    }
}

impl<S: EntityStore> EntityStore for StagedStore<'_, S> {
    fn edge(&self, address: &str) -> Option<Edge> {
        self.edges
            .get(address)
            .cloned()
            .or_else(|| self.base.edge(address))
    }

    fn put_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.address.clone(), edge);
    }

    fn edges(&self) -> Vec<Edge> {
        let mut merged: BTreeMap<String, Edge> = self
            .base
            .edges()
            .into_iter()
            .map(|e| (e.address.clone(), e))
            .collect();
        merged.extend(self.edges.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.into_values().collect()
    }

    fn proposal(&self, proposal_id: &str) -> Option<GovernanceProposal> {
        self.proposals
            .get(proposal_id)
            .cloned()
            .or_else(|| self.base.proposal(proposal_id))
    }

    fn put_proposal(&mut self, proposal: GovernanceProposal) {
        self.proposals
            .insert(proposal.proposal_id.clone(), proposal);
    }

    fn proposals(&self) -> Vec<GovernanceProposal> {
        let mut merged: BTreeMap<String, GovernanceProposal> = self
            .base
            .proposals()
            .into_iter()
            .map(|p| (p.proposal_id.clone(), p))
            .collect();
        merged.extend(self.proposals.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.into_values().collect()
    }

    fn task(&self, task_id: &str) -> Option<Task> {
        self.tasks
            .get(task_id)
            .cloned()
            .or_else(|| self.base.task(task_id))
    }

    fn put_task(&mut self, task: Task) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    fn log_summary(&self, log_hash: &str) -> Option<LogSummary> {
        self.log_summaries
            .get(log_hash)
            .cloned()
            .or_else(|| self.base.log_summary(log_hash))
    }

    fn put_log_summary(&mut self, summary: LogSummary) {
        self.log_summaries.insert(summary.log_hash.clone(), summary);
    }

    fn propagation(&self, id: u64) -> Option<ReputationPropagation> {
        self.propagations
            .get(&id)
            .cloned()
            .or_else(|| self.base.propagation(id))
    }

    fn put_propagation(&mut self, propagation: ReputationPropagation) {
        self.propagations.insert(propagation.id, propagation);
    }

    fn propagations(&self) -> Vec<ReputationPropagation> {
        let mut merged: BTreeMap<u64, ReputationPropagation> = self
            .base
            .propagations()
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        merged.extend(self.propagations.iter().map(|(k, v)| (*k, v.clone())));
        merged.into_values().collect()
    }

    fn sequence(&self, name: &str) -> u64 {
        self.sequences
            .get(name)
            .copied()
            .unwrap_or_else(|| self.base.sequence(name))
    }

    fn set_sequence(&mut self, name: &str, value: u64) {
        self.sequences.insert(name.to_string(), value);
    }
}
