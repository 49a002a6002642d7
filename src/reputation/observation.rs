//! Observation Classifier
//!
//! Maps raw per-channel telemetry into one of three discrete classes. Every
//! function here is pure; counters are updated by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete outcome of a monitored event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Observation {
    Good = 0,
    Anomaly = 1,
    Malicious = 2,
}

impl Observation {
    /// Column index into the emission matrix
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_positive(self) -> bool {
        self == Observation::Good
    }
}

/// Resource limits applied to log summaries
pub const CPU_MS_LIMIT: u64 = 5_000;
pub const MEM_PEAK_MB_LIMIT: u64 = 800;
pub const NET_KB_LIMIT: u64 = 5_000;
pub const LATENCY_MS_LIMIT: u64 = 2_000;
pub const TIMEOUT_LATENCY_MS: u64 = 4_000;

/// Missed votes above which a consensus report is anomalous
pub const MISSED_VOTES_LIMIT: u64 = 5;

/// Participation (per mille) below which a consensus report is anomalous
pub const MIN_PARTICIPATION_PERMILLE: u64 = 200;

/// Consensus participation report for one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusReport {
    pub missed_votes: u64,
    pub double_signs: u64,
    pub participation_permille: u64,
}

impl ConsensusReport {
    pub fn classify(&self) -> Observation {
        if self.double_signs > 0 {
            Observation::Malicious
        } else if self.missed_votes > MISSED_VOTES_LIMIT
            || self.participation_permille < MIN_PARTICIPATION_PERMILLE
        {
            Observation::Anomaly
        } else {
            Observation::Good
        }
    }
}

/// Task-execution outcome reported for one edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    pub on_time: bool,
    pub correct: bool,
    pub resource_anomaly: bool,
    pub timeout: bool,
}

impl TaskReport {
    pub fn classify(&self) -> Observation {
        if self.timeout || !self.correct {
            Observation::Malicious
        } else if self.resource_anomaly {
            Observation::Anomaly
        } else {
            Observation::Good
        }
    }
}

/// Resource telemetry carried by a log summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu_ms: u64,
    pub mem_mb_peak: u64,
    pub net_kb: u64,
    pub latency_ms: u64,
}

impl ResourceUsage {
    pub fn is_resource_anomaly(&self) -> bool {
        self.cpu_ms > CPU_MS_LIMIT
            || self.mem_mb_peak > MEM_PEAK_MB_LIMIT
            || self.net_kb > NET_KB_LIMIT
            || self.latency_ms > LATENCY_MS_LIMIT
    }

    pub fn is_timeout(&self) -> bool {
        self.latency_ms > TIMEOUT_LATENCY_MS
    }

    pub fn classify(&self) -> Observation {
        if self.is_timeout() {
            Observation::Malicious
        } else if self.is_resource_anomaly() {
            Observation::Anomaly
        } else {
            Observation::Good
        }
    }
}

/// Client verdict on a finished task
pub fn classify_feedback(accepted: bool) -> Observation {
    if accepted {
        Observation::Good
    } else {
        Observation::Malicious
    }
}

/// Stage of a task reported in a log summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogStage {
    Recv,
    Exec,
    Result,
}

impl LogStage {
    /// Case-insensitive parse of the wire name
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RECV" => Some(LogStage::Recv),
            "EXEC" => Some(LogStage::Exec),
            "RESULT" => Some(LogStage::Result),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogStage::Recv => "RECV",
            LogStage::Exec => "EXEC",
            LogStage::Result => "RESULT",
        }
    }
}

/// Monitoring channel that produced an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "channel", content = "stage")]
pub enum ObservationSource {
    Consensus,
    TaskEvent,
    LogSummary(LogStage),
    Feedback,
}

impl fmt::Display for ObservationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationSource::Consensus => write!(f, "consensus"),
            ObservationSource::TaskEvent => write!(f, "taskEvent"),
            ObservationSource::LogSummary(stage) => write!(f, "log:{}", stage.as_str()),
            ObservationSource::Feedback => write!(f, "clientFeedback"),
        }
    }
}
