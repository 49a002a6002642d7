//! Trust Engine
//!
//! Every operation is one state transition: read the block context, stage all
//! writes over the store, run the checks and updates, then commit. Any error
//! drops the staged writes, so a rejected transition leaves no trace.
//!
//! ```text
//! message ──► checks ──► ReputationManager ──► GovernanceTrigger ──► commit
//!                │                                                     ▲
//!                └──────────── TrustError (staged writes dropped) ─────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::database::{EntityStore, StagedStore};
use crate::error::{TrustError, TrustResult};
use crate::governance::{proposal_id, GovernanceProposal, GovernanceTrigger, ProposalStatus};
use crate::protocol::{
    AdminSet, ApproveProposal, BlockClock, BlockContext, CreateTask, LogSummary,
    PropagateReputation, RegisterEdge, RejectProposal, ReportConsensusEvent, ReportTaskEvent,
    ReputationPropagation, SetEdgeStatus, SubmitLogSummary, SubmitTaskFeedback, Task,
    TaskFeedback, TaskStatus,
};
use crate::reputation::{Edge, LogStage, Observation, ReputationManager, ReputationUpdate};

const PROPOSAL_SEQUENCE: &str = "proposal";
const PROPAGATION_SEQUENCE: &str = "propagation";
const TASK_SEQUENCE: &str = "task";

/// Result of one reputation update, including any proposal it opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationOutcome {
    pub edge_id: String,
    pub observation: Observation,
    pub previous_score: u64,
    pub score: u64,
    pub snapshot_hash: String,
    pub opened_proposal: Option<String>,
}

/// Read-only context shared by the steps of one transition
struct Transition<'a, A> {
    block: BlockContext,
    admins: &'a A,
    reputation: &'a ReputationManager,
}

impl<A: AdminSet> Transition<'_, A> {
    fn require_admin(&self, caller: &str) -> TrustResult<()> {
        if self.admins.is_member(caller) {
            Ok(())
        } else {
            Err(TrustError::NotAuthorized(format!("{} is not an admin", caller)))
        }
    }

    /// Run the governance trigger on the updated edge and stage the results
    fn settle<T: EntityStore>(
        &self,
        tx: &mut T,
        mut edge: Edge,
        update: ReputationUpdate,
    ) -> ObservationOutcome {
        let trigger = GovernanceTrigger::new(self.reputation.get_thresholds());

        let opened_proposal = trigger.evaluate(&edge).map(|breach| {
            let id = proposal_id(&edge.address, tx.next_sequence(PROPOSAL_SEQUENCE));
            let proposal = trigger.open(&mut edge, breach, update.source, id, &self.block);
            let id = proposal.proposal_id.clone();
            tx.put_proposal(proposal);
            id
        });

        let outcome = ObservationOutcome {
            edge_id: edge.address.clone(),
            observation: update.observation,
            previous_score: update.previous_score,
            score: update.score,
            snapshot_hash: update.snapshot_hash,
            opened_proposal,
        };
        tx.put_edge(edge);
        outcome
    }
}

fn require_field(name: &str, value: &str) -> TrustResult<()> {
    if value.trim().is_empty() {
        return Err(TrustError::InvalidRequest(format!("{} must not be empty", name)));
    }
    Ok(())
}

fn load_edge<T: EntityStore>(tx: &T, edge_id: &str) -> TrustResult<Edge> {
    tx.edge(edge_id)
        .ok_or_else(|| TrustError::edge_not_found(edge_id))
}

fn load_task<T: EntityStore>(tx: &T, task_id: &str) -> TrustResult<Task> {
    tx.task(task_id)
        .ok_or_else(|| TrustError::task_not_found(task_id))
}

/// Highest score first, then smallest address
fn select_edge(candidates: Vec<Edge>, region: &str) -> Option<Edge> {
    candidates
        .into_iter()
        .filter(|e| e.region == region && e.status.accepts_tasks())
        .min_by(|a, b| b.score.cmp(&a.score).then_with(|| a.address.cmp(&b.address)))
}

/// Deterministic trust-scoring and governance engine over injected host services
pub struct TrustEngine<S, C, A> {
    store: S,
    clock: C,
    admins: A,
    reputation: ReputationManager,
}

impl<S, C, A> TrustEngine<S, C, A>
where
    S: EntityStore,
    C: BlockClock,
    A: AdminSet,
{
    pub fn new(store: S, clock: C, admins: A, reputation: ReputationManager) -> Self {
        Self {
            store,
            clock,
            admins,
            reputation,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn reputation(&self) -> &ReputationManager {
        &self.reputation
    }

    /// Apply `step` as one all-or-nothing transition
    fn transact<T, F>(&mut self, operation: &'static str, step: F) -> TrustResult<T>
    where
        F: FnOnce(&mut StagedStore<'_, S>, &Transition<'_, A>) -> TrustResult<T>,
    {
        let block = self.clock.block();
        let ctx = Transition {
            block,
            admins: &self.admins,
            reputation: &self.reputation,
        };
        let mut tx = StagedStore::new(&mut self.store);

        match step(&mut tx, &ctx) {
            Ok(value) => {
                let written = tx.commit();
                debug!(operation, height = block.height, written, "Committed transition");
                Ok(value)
            }
            Err(err) => {
                warn!(operation, height = block.height, error = %err, "Transition aborted");
                Err(err)
            }
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    pub fn register_edge(&mut self, msg: RegisterEdge) -> TrustResult<Edge> {
        self.transact("register_edge", |tx, ctx| {
            require_field("edge_id", &msg.edge_id)?;
            require_field("region", &msg.region)?;
            if tx.edge(&msg.edge_id).is_some() {
                return Err(TrustError::AlreadyExists(format!("edge {}", msg.edge_id)));
            }

            let edge = Edge::new(msg.edge_id, msg.creator, msg.region, ctx.block.time);
            info!(
                edge_id = %edge.address,
                region = %edge.region,
                creator = %edge.creator,
                "Registered edge"
            );
            tx.put_edge(edge.clone());
            Ok(edge)
        })
    }

    pub fn report_consensus_event(
        &mut self,
        msg: ReportConsensusEvent,
    ) -> TrustResult<ObservationOutcome> {
        self.transact("report_consensus_event", |tx, ctx| {
            let mut edge = load_edge(tx, &msg.edge_id)?;
            let update = ctx
                .reputation
                .record_consensus(&mut edge, &msg.report, ctx.block.time);
            Ok(ctx.settle(tx, edge, update))
        })
    }

    pub fn report_task_event(&mut self, msg: ReportTaskEvent) -> TrustResult<ObservationOutcome> {
        self.transact("report_task_event", |tx, ctx| {
            let mut edge = load_edge(tx, &msg.edge_id)?;
            let update = ctx
                .reputation
                .record_task_event(&mut edge, &msg.report, ctx.block.time);
            Ok(ctx.settle(tx, edge, update))
        })
    }

    /// Assign a task to the named edge, or to the best eligible edge of the region
    pub fn create_task(&mut self, msg: CreateTask) -> TrustResult<Task> {
        self.transact("create_task", |tx, ctx| {
            require_field("creator", &msg.creator)?;
            require_field("region", &msg.region)?;

            let edge = match msg.edge_id.as_deref().filter(|id| !id.trim().is_empty()) {
                Some(edge_id) => {
                    let edge = load_edge(tx, edge_id)?;
                    if edge.region != msg.region {
                        return Err(TrustError::InvalidRequest(format!(
                            "edge {} serves region {}, not {}",
                            edge.address, edge.region, msg.region
                        )));
                    }
                    if !edge.status.accepts_tasks() {
                        return Err(TrustError::InvalidState(format!(
                            "edge {} is task frozen",
                            edge.address
                        )));
                    }
                    edge
                }
                None => select_edge(tx.edges(), &msg.region).ok_or_else(|| {
                    TrustError::NotFound(format!("eligible edge in region {}", msg.region))
                })?,
            };

            let task_id = format!("T-{}", tx.next_sequence(TASK_SEQUENCE));
            let task = Task {
                task_id,
                requester: msg.creator,
                region: msg.region,
                task_type: msg.task_type,
                edge_id: edge.address,
                status: TaskStatus::Assigned,
                log_hashes: Vec::new(),
                result_hash: None,
                feedback: None,
                created_at: ctx.block.time,
                updated_at: ctx.block.time,
            };

            info!(
                task_id = %task.task_id,
                edge_id = %task.edge_id,
                region = %task.region,
                "Created task"
            );
            tx.put_task(task.clone());
            Ok(task)
        })
    }

    pub fn submit_log_summary(&mut self, msg: SubmitLogSummary) -> TrustResult<ObservationOutcome> {
        self.transact("submit_log_summary", |tx, ctx| {
            require_field("log_hash", &msg.log_hash)?;
            let stage = LogStage::parse(&msg.stage).ok_or_else(|| {
                TrustError::InvalidRequest(format!("unknown log stage {:?}", msg.stage))
            })?;

            let mut task = load_task(tx, &msg.task_id)?;
            if task.edge_id != msg.creator {
                return Err(TrustError::NotAuthorized(format!(
                    "{} is not the edge assigned to task {}",
                    msg.creator, task.task_id
                )));
            }
            let mut edge = load_edge(tx, &task.edge_id)?;
            if !edge.status.accepts_tasks() {
                return Err(TrustError::InvalidState(format!(
                    "edge {} is task frozen",
                    edge.address
                )));
            }
            if tx.log_summary(&msg.log_hash).is_some() {
                return Err(TrustError::AlreadyExists(format!(
                    "log summary {}",
                    msg.log_hash
                )));
            }

            let result_hash = msg.result_hash.filter(|h| !h.trim().is_empty());

            task.log_hashes.push(msg.log_hash.clone());
            match stage {
                LogStage::Recv if task.status != TaskStatus::Finished => {
                    task.status = TaskStatus::Running;
                }
                LogStage::Result => {
                    task.status = TaskStatus::Finished;
                    if result_hash.is_some() {
                        task.result_hash = result_hash.clone();
                    }
                }
                _ => {}
            }
            task.updated_at = ctx.block.time;

            let update =
                ctx.reputation
                    .record_log_summary(&mut edge, &msg.usage, stage, ctx.block.time);

            tx.put_log_summary(LogSummary {
                log_hash: msg.log_hash,
                task_id: task.task_id.clone(),
                edge_id: edge.address.clone(),
                stage,
                reported_ts: msg.ts,
                usage: msg.usage,
                result_hash,
                observation: update.observation,
                height: ctx.block.height,
                recorded_at: ctx.block.time,
            });
            tx.put_task(task);

            Ok(ctx.settle(tx, edge, update))
        })
    }

    /// Record the requester's verdict. `None` when the assigned edge is gone
    /// and no reputation update took place.
    pub fn submit_task_feedback(
        &mut self,
        msg: SubmitTaskFeedback,
    ) -> TrustResult<Option<ObservationOutcome>> {
        self.transact("submit_task_feedback", |tx, ctx| {
            let mut task = load_task(tx, &msg.task_id)?;
            if task.requester != msg.creator {
                return Err(TrustError::NotAuthorized(format!(
                    "{} did not request task {}",
                    msg.creator, task.task_id
                )));
            }
            if task.feedback.is_some() {
                return Err(TrustError::InvalidState(format!(
                    "task {} already has feedback",
                    task.task_id
                )));
            }

            task.feedback = Some(TaskFeedback {
                accepted: msg.accepted,
                reason: msg.reason,
                submitted_at: ctx.block.time,
            });
            task.updated_at = ctx.block.time;

            let outcome = match tx.edge(&task.edge_id) {
                Some(mut edge) => {
                    let update =
                        ctx.reputation
                            .record_feedback(&mut edge, msg.accepted, ctx.block.time);
                    Some(ctx.settle(tx, edge, update))
                }
                None => {
                    debug!(
                        task_id = %task.task_id,
                        edge_id = %task.edge_id,
                        "Assigned edge missing, feedback recorded without update"
                    );
                    None
                }
            };

            tx.put_task(task);
            Ok(outcome)
        })
    }

    pub fn propagate_reputation(
        &mut self,
        msg: PropagateReputation,
    ) -> TrustResult<ReputationPropagation> {
        self.transact("propagate_reputation", |tx, ctx| {
            let edge = load_edge(tx, &msg.edge_id)?;

            let propagation = ReputationPropagation {
                id: tx.next_sequence(PROPAGATION_SEQUENCE),
                edge_id: edge.address.clone(),
                from_region: msg.from_region,
                to_region: msg.to_region,
                snapshot_hash: crate::crypto::snapshot_hash(&edge),
                reason: msg.reason,
                height: ctx.block.height,
                created_at: ctx.block.time,
            };

            info!(
                edge_id = %propagation.edge_id,
                id = propagation.id,
                from = %propagation.from_region,
                to = %propagation.to_region,
                snapshot = %propagation.snapshot_hash,
                "Propagated reputation"
            );
            tx.put_propagation(propagation.clone());
            Ok(propagation)
        })
    }

    pub fn approve_proposal(&mut self, msg: ApproveProposal) -> TrustResult<GovernanceProposal> {
        self.transact("approve_proposal", |tx, ctx| {
            ctx.require_admin(&msg.creator)?;
            let mut proposal = tx
                .proposal(&msg.proposal_id)
                .ok_or_else(|| TrustError::proposal_not_found(&msg.proposal_id))?;
            proposal.approve(&msg.creator, ctx.block.time)?;

            release_edge(tx, &proposal, ctx.block.time);
            info!(
                proposal_id = %proposal.proposal_id,
                edge_id = %proposal.edge_id,
                admin = %msg.creator,
                "Approved proposal"
            );
            tx.put_proposal(proposal.clone());
            Ok(proposal)
        })
    }

    pub fn reject_proposal(&mut self, msg: RejectProposal) -> TrustResult<GovernanceProposal> {
        self.transact("reject_proposal", |tx, ctx| {
            ctx.require_admin(&msg.creator)?;
            let mut proposal = tx
                .proposal(&msg.proposal_id)
                .ok_or_else(|| TrustError::proposal_not_found(&msg.proposal_id))?;
            proposal.reject(&msg.creator, &msg.reason, ctx.block.time)?;

            release_edge(tx, &proposal, ctx.block.time);
            info!(
                proposal_id = %proposal.proposal_id,
                edge_id = %proposal.edge_id,
                admin = %msg.creator,
                "Rejected proposal"
            );
            tx.put_proposal(proposal.clone());
            Ok(proposal)
        })
    }

    /// Admin override of an edge's operational status
    pub fn set_edge_status(&mut self, msg: SetEdgeStatus) -> TrustResult<Edge> {
        self.transact("set_edge_status", |tx, ctx| {
            ctx.require_admin(&msg.creator)?;
            let mut edge = load_edge(tx, &msg.edge_id)?;

            info!(
                edge_id = %edge.address,
                from = ?edge.status,
                to = ?msg.status,
                admin = %msg.creator,
                "Changed edge status"
            );
            edge.status = msg.status;
            edge.updated_at = ctx.block.time;
            tx.put_edge(edge.clone());
            Ok(edge)
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn edge(&self, edge_id: &str) -> Option<Edge> {
        self.store.edge(edge_id)
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.store.edges()
    }

    pub fn proposal(&self, proposal_id: &str) -> Option<GovernanceProposal> {
        self.store.proposal(proposal_id)
    }

    pub fn proposals(&self, status: Option<ProposalStatus>) -> Vec<GovernanceProposal> {
        self.store
            .proposals()
            .into_iter()
            .filter(|p| status.is_none() || status == Some(p.status))
            .collect()
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.store.task(task_id)
    }

    pub fn log_summary(&self, log_hash: &str) -> Option<LogSummary> {
        self.store.log_summary(log_hash)
    }

    pub fn propagations(&self) -> Vec<ReputationPropagation> {
        self.store.propagations()
    }

    pub fn snapshot_hash(&self, edge_id: &str) -> TrustResult<String> {
        let edge = load_edge(&self.store, edge_id)?;
        Ok(crate::crypto::snapshot_hash(&edge))
    }
}

/// Best-effort: a missing edge or a stale pending reference is a no-op
fn release_edge<T: EntityStore>(tx: &mut T, proposal: &GovernanceProposal, now: i64) {
    if let Some(mut edge) = tx.edge(&proposal.edge_id) {
        if proposal.release_edge(&mut edge, now) {
            tx.put_edge(edge);
        }
    }
}
