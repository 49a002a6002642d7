//! Request messages and host-stored records.
//!
//! Messages are what handlers hand to the engine; records are what the
//! engine writes back into the host store.

use serde::{Deserialize, Serialize};

use crate::reputation::{
    ConsensusReport, EdgeStatus, LogStage, Observation, ResourceUsage, TaskReport,
};

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEdge {
    pub creator: String,
    pub edge_id: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConsensusEvent {
    pub edge_id: String,
    #[serde(flatten)]
    pub report: ConsensusReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTaskEvent {
    pub edge_id: String,
    #[serde(flatten)]
    pub report: TaskReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub creator: String,
    pub region: String,
    #[serde(default)]
    pub task_type: String,
    /// Explicit assignment; the best eligible edge of the region otherwise
    #[serde(default)]
    pub edge_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitLogSummary {
    pub creator: String,
    pub task_id: String,
    /// Wire stage name, parsed case-insensitively
    pub stage: String,
    /// Timestamp reported by the edge (informational)
    #[serde(default)]
    pub ts: i64,
    #[serde(flatten)]
    pub usage: ResourceUsage,
    #[serde(default)]
    pub result_hash: Option<String>,
    pub log_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTaskFeedback {
    pub creator: String,
    pub task_id: String,
    pub accepted: bool,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagateReputation {
    pub edge_id: String,
    pub from_region: String,
    pub to_region: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveProposal {
    pub creator: String,
    pub proposal_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectProposal {
    pub creator: String,
    pub proposal_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEdgeStatus {
    pub creator: String,
    pub edge_id: String,
    pub status: EdgeStatus,
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Assigned,
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFeedback {
    pub accepted: bool,
    pub reason: String,
    pub submitted_at: i64,
}

/// Unit of work assigned to one edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub requester: String,
    pub region: String,
    pub task_type: String,
    pub edge_id: String,
    pub status: TaskStatus,
    /// Log hashes in submission order
    pub log_hashes: Vec<String>,
    pub result_hash: Option<String>,
    pub feedback: Option<TaskFeedback>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Telemetry record keyed by its log hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub log_hash: String,
    pub task_id: String,
    pub edge_id: String,
    pub stage: LogStage,
    pub reported_ts: i64,
    pub usage: ResourceUsage,
    pub result_hash: Option<String>,
    pub observation: Observation,
    pub height: u64,
    pub recorded_at: i64,
}

/// Append-only audit record of a reputation snapshot sent across regions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationPropagation {
    pub id: u64,
    pub edge_id: String,
    pub from_region: String,
    pub to_region: String,
    pub snapshot_hash: String,
    pub reason: String,
    pub height: u64,
    pub created_at: i64,
}
