//! Ledger API Endpoints
//!
//! Exposes the engine's operations and queries over HTTP. Every write handler
//! runs exactly one transition in the next block under the engine's write
//! lock. A rejected transition gives its block back.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::database::MemoryStore;
use crate::engine::{ObservationOutcome, TrustEngine};
use crate::error::{ErrorKind, TrustError, TrustResult};
use crate::governance::{GovernanceProposal, ProposalStatus};
use crate::protocol::{
    ApproveProposal, BlockClock, CreateTask, IntervalClock, PropagateReputation, RegisterEdge,
    RejectProposal, ReportConsensusEvent, ReportTaskEvent, ReputationPropagation, SetEdgeStatus,
    StaticAdminSet, SubmitLogSummary, SubmitTaskFeedback, Task,
};
use crate::reputation::{ConsensusReport, Edge, EdgeStatus, ResourceUsage, TaskReport};

/// Engine as hosted by the binary
pub type HostEngine = TrustEngine<MemoryStore, IntervalClock, StaticAdminSet>;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// API state for ledger endpoints
#[derive(Clone)]
pub struct LedgerApiState {
    pub engine: Arc<RwLock<HostEngine>>,
}

impl LedgerApiState {
    pub fn new(engine: HostEngine) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
        }
    }
}

/// Map a rejected transition to an HTTP status
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotAuthorized => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists | ErrorKind::InvalidState => StatusCode::CONFLICT,
    }
}

fn rejected(err: TrustError) -> (StatusCode, String) {
    (status_for(err.kind()), err.to_string())
}

/// Run one transition in the next block; the clock only stays there on success
fn in_next_block<T>(
    engine: &mut HostEngine,
    transition: impl FnOnce(&mut HostEngine) -> TrustResult<T>,
) -> Result<T, (StatusCode, String)> {
    engine.clock_mut().advance();
    transition(engine).map_err(|err| {
        engine.clock_mut().rewind();
        rejected(err)
    })
}

fn not_found(what: &str, id: &str) -> (StatusCode, String) {
    rejected(TrustError::NotFound(format!("{} {}", what, id)))
}

// Request types (ids taken from the path)

#[derive(Debug, Deserialize)]
pub struct ConsensusEventRequest {
    #[serde(flatten)]
    pub report: ConsensusReport,
}

#[derive(Debug, Deserialize)]
pub struct TaskEventRequest {
    #[serde(flatten)]
    pub report: TaskReport,
}

#[derive(Debug, Deserialize)]
pub struct PropagationRequest {
    pub from_region: String,
    pub to_region: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct EdgeStatusRequest {
    pub creator: String,
    pub status: EdgeStatus,
}

#[derive(Debug, Deserialize)]
pub struct LogSummaryRequest {
    pub creator: String,
    pub stage: String,
    #[serde(default)]
    pub ts: i64,
    #[serde(flatten)]
    pub usage: ResourceUsage,
    #[serde(default)]
    pub result_hash: Option<String>,
    pub log_hash: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub creator: String,
    pub accepted: bool,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub creator: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ProposalQuery {
    pub status: Option<ProposalStatus>,
}

// Response types

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub height: u64,
    /// RFC 3339 time of the current block
    pub block_time: Option<String>,
    pub edges: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub edge_id: String,
    pub snapshot_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub task_id: String,
    /// Absent when the assigned edge no longer exists
    pub update: Option<ObservationOutcome>,
}

// Endpoints

/// GET /health
pub async fn health(State(state): State<LedgerApiState>) -> Json<HealthResponse> {
    let engine = state.engine.read().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        height: engine.clock().height(),
        block_time: engine.clock().block().datetime().map(|t| t.to_rfc3339()),
        edges: engine.edges().len(),
    })
}

/// POST /edges
pub async fn register_edge(
    State(state): State<LedgerApiState>,
    Json(request): Json<RegisterEdge>,
) -> Result<(StatusCode, Json<Edge>), (StatusCode, String)> {
    let mut engine = state.engine.write().await;
    let edge = in_next_block(&mut engine, |e| e.register_edge(request))?;
    Ok((StatusCode::CREATED, Json(edge)))
}

/// GET /edges
pub async fn list_edges(State(state): State<LedgerApiState>) -> Json<Vec<Edge>> {
    Json(state.engine.read().await.edges())
}

/// GET /edges/{edge_id}
pub async fn get_edge(
    State(state): State<LedgerApiState>,
    Path(edge_id): Path<String>,
) -> ApiResult<Edge> {
    let engine = state.engine.read().await;
    engine
        .edge(&edge_id)
        .map(Json)
        .ok_or_else(|| not_found("edge", &edge_id))
}

/// GET /edges/{edge_id}/snapshot
pub async fn get_snapshot(
    State(state): State<LedgerApiState>,
    Path(edge_id): Path<String>,
) -> ApiResult<SnapshotResponse> {
    let engine = state.engine.read().await;
    let snapshot_hash = engine.snapshot_hash(&edge_id).map_err(rejected)?;
    Ok(Json(SnapshotResponse {
        edge_id,
        snapshot_hash,
    }))
}

/// POST /edges/{edge_id}/consensus-events
pub async fn report_consensus_event(
    State(state): State<LedgerApiState>,
    Path(edge_id): Path<String>,
    Json(request): Json<ConsensusEventRequest>,
) -> ApiResult<ObservationOutcome> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.report_consensus_event(ReportConsensusEvent {
            edge_id,
            report: request.report,
        })
    })
    .map(Json)
}

/// POST /edges/{edge_id}/task-events
pub async fn report_task_event(
    State(state): State<LedgerApiState>,
    Path(edge_id): Path<String>,
    Json(request): Json<TaskEventRequest>,
) -> ApiResult<ObservationOutcome> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.report_task_event(ReportTaskEvent {
            edge_id,
            report: request.report,
        })
    })
    .map(Json)
}

/// POST /edges/{edge_id}/propagations
pub async fn propagate_reputation(
    State(state): State<LedgerApiState>,
    Path(edge_id): Path<String>,
    Json(request): Json<PropagationRequest>,
) -> ApiResult<ReputationPropagation> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.propagate_reputation(PropagateReputation {
            edge_id,
            from_region: request.from_region,
            to_region: request.to_region,
            reason: request.reason,
        })
    })
    .map(Json)
}

/// POST /edges/{edge_id}/status - admin only
pub async fn set_edge_status(
    State(state): State<LedgerApiState>,
    Path(edge_id): Path<String>,
    Json(request): Json<EdgeStatusRequest>,
) -> ApiResult<Edge> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.set_edge_status(SetEdgeStatus {
            creator: request.creator,
            edge_id,
            status: request.status,
        })
    })
    .map(Json)
}

/// POST /tasks
pub async fn create_task(
    State(state): State<LedgerApiState>,
    Json(request): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, String)> {
    let mut engine = state.engine.write().await;
    let task = in_next_block(&mut engine, |e| e.create_task(request))?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /tasks/{task_id}
pub async fn get_task(
    State(state): State<LedgerApiState>,
    Path(task_id): Path<String>,
) -> ApiResult<Task> {
    let engine = state.engine.read().await;
    engine
        .task(&task_id)
        .map(Json)
        .ok_or_else(|| not_found("task", &task_id))
}

/// POST /tasks/{task_id}/logs
pub async fn submit_log_summary(
    State(state): State<LedgerApiState>,
    Path(task_id): Path<String>,
    Json(request): Json<LogSummaryRequest>,
) -> ApiResult<ObservationOutcome> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.submit_log_summary(SubmitLogSummary {
            creator: request.creator,
            task_id,
            stage: request.stage,
            ts: request.ts,
            usage: request.usage,
            result_hash: request.result_hash,
            log_hash: request.log_hash,
        })
    })
    .map(Json)
}

/// POST /tasks/{task_id}/feedback
pub async fn submit_task_feedback(
    State(state): State<LedgerApiState>,
    Path(task_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<FeedbackResponse> {
    let mut engine = state.engine.write().await;
    let update = in_next_block(&mut engine, |e| {
        e.submit_task_feedback(SubmitTaskFeedback {
            creator: request.creator,
            task_id: task_id.clone(),
            accepted: request.accepted,
            reason: request.reason,
        })
    })?;
    Ok(Json(FeedbackResponse { task_id, update }))
}

/// GET /proposals?status=PENDING
pub async fn list_proposals(
    State(state): State<LedgerApiState>,
    Query(query): Query<ProposalQuery>,
) -> Json<Vec<GovernanceProposal>> {
    Json(state.engine.read().await.proposals(query.status))
}

/// GET /proposals/{proposal_id}
pub async fn get_proposal(
    State(state): State<LedgerApiState>,
    Path(proposal_id): Path<String>,
) -> ApiResult<GovernanceProposal> {
    let engine = state.engine.read().await;
    engine
        .proposal(&proposal_id)
        .map(Json)
        .ok_or_else(|| not_found("proposal", &proposal_id))
}

/// POST /proposals/{proposal_id}/approve - admin only
pub async fn approve_proposal(
    State(state): State<LedgerApiState>,
    Path(proposal_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<GovernanceProposal> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.approve_proposal(ApproveProposal {
            creator: request.creator,
            proposal_id,
        })
    })
    .map(Json)
}

/// POST /proposals/{proposal_id}/reject - admin only
pub async fn reject_proposal(
    State(state): State<LedgerApiState>,
    Path(proposal_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<GovernanceProposal> {
    let mut engine = state.engine.write().await;
    in_next_block(&mut engine, |e| {
        e.reject_proposal(RejectProposal {
            creator: request.creator,
            proposal_id,
            reason: request.reason,
        })
    })
    .map(Json)
}

/// GET /propagations
pub async fn list_propagations(
    State(state): State<LedgerApiState>,
) -> Json<Vec<ReputationPropagation>> {
    Json(state.engine.read().await.propagations())
}

/// Create the ledger API router
pub fn create_router(state: LedgerApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Edges
        .route("/edges", get(list_edges).post(register_edge))
        .route("/edges/{edge_id}", get(get_edge))
        .route("/edges/{edge_id}/snapshot", get(get_snapshot))
        .route("/edges/{edge_id}/consensus-events", post(report_consensus_event))
        .route("/edges/{edge_id}/task-events", post(report_task_event))
        .route("/edges/{edge_id}/propagations", post(propagate_reputation))
        .route("/edges/{edge_id}/status", post(set_edge_status))
        // Tasks
        .route("/tasks", post(create_task))
        .route("/tasks/{task_id}", get(get_task))
        .route("/tasks/{task_id}/logs", post(submit_log_summary))
        .route("/tasks/{task_id}/feedback", post(submit_task_feedback))
        // Governance
        .route("/proposals", get(list_proposals))
        .route("/proposals/{proposal_id}", get(get_proposal))
        .route("/proposals/{proposal_id}/approve", post(approve_proposal))
        .route("/proposals/{proposal_id}/reject", post(reject_proposal))
        .route("/propagations", get(list_propagations))
        .with_state(state)
}

// ============================================================================
// Tests
// ============================================================================
