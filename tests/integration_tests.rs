//! Integration tests for the edge trust engine
//!
//! These tests drive the engine end to end through its public operations:
//! registration, observation channels, governance proposals, tasks and
//! telemetry, propagation, determinism and transactional abort.

use edge_trust::database::{EntityStore, MemoryStore};
use edge_trust::protocol::{
    ApproveProposal, CreateTask, PropagateReputation, RegisterEdge, RejectProposal,
    ReportConsensusEvent, ReportTaskEvent, SetEdgeStatus, SubmitLogSummary, SubmitTaskFeedback,
    Task, TaskStatus,
};
use edge_trust::{
    ConsensusReport, CorrectiveAction, EdgeStatus, ErrorKind, ManualClock, Observation,
    ProposalStatus, ReputationManager, ResourceUsage, StaticAdminSet, TaskReport, TrustEngine,
    HMM_SCALE,
};

type Engine = TrustEngine<MemoryStore, ManualClock, StaticAdminSet>;

// ============================================================================
// Test Helpers
// ============================================================================

const ADMIN: &str = "admin";
const REQUESTER: &str = "vehicle1";

/// Engine at height 1, time 1000, with a single admin
fn create_engine() -> Engine {
    create_engine_on(MemoryStore::new())
}

fn create_engine_on(store: MemoryStore) -> Engine {
    TrustEngine::new(
        store,
        ManualClock::new(1, 1_000),
        StaticAdminSet::single(ADMIN),
        ReputationManager::default(),
    )
}

fn register(engine: &mut Engine, edge_id: &str, region: &str) {
    engine
        .register_edge(RegisterEdge {
            creator: "operator".to_string(),
            edge_id: edge_id.to_string(),
            region: region.to_string(),
        })
        .unwrap();
}

fn consensus(edge_id: &str, missed_votes: u64, double_signs: u64) -> ReportConsensusEvent {
    ReportConsensusEvent {
        edge_id: edge_id.to_string(),
        report: ConsensusReport {
            missed_votes,
            double_signs,
            participation_permille: 950,
        },
    }
}

fn task_event(edge_id: &str, correct: bool) -> ReportTaskEvent {
    ReportTaskEvent {
        edge_id: edge_id.to_string(),
        report: TaskReport {
            on_time: true,
            correct,
            resource_anomaly: false,
            timeout: false,
        },
    }
}

fn light_usage() -> ResourceUsage {
    ResourceUsage {
        cpu_ms: 120,
        mem_mb_peak: 64,
        net_kb: 10,
        latency_ms: 300,
    }
}

fn log(task_id: &str, creator: &str, stage: &str, log_hash: &str) -> SubmitLogSummary {
    SubmitLogSummary {
        creator: creator.to_string(),
        task_id: task_id.to_string(),
        stage: stage.to_string(),
        ts: 0,
        usage: light_usage(),
        result_hash: None,
        log_hash: log_hash.to_string(),
    }
}

fn create_task(engine: &mut Engine, region: &str, edge_id: Option<&str>) -> Task {
    engine
        .create_task(CreateTask {
            creator: REQUESTER.to_string(),
            region: region.to_string(),
            task_type: "inference".to_string(),
            edge_id: edge_id.map(str::to_string),
        })
        .unwrap()
}

/// Drive edge1 into its first proposal with two double-signs
fn breach(engine: &mut Engine, edge_id: &str) -> String {
    engine.report_consensus_event(consensus(edge_id, 0, 1)).unwrap();
    engine.clock_mut().advance(5);
    engine
        .report_consensus_event(consensus(edge_id, 0, 1))
        .unwrap()
        .opened_proposal
        .unwrap()
}

// ============================================================================
// Registration
// ============================================================================

mod registration {
    use super::*;

    #[test]
    fn test_register_creates_vacuous_edge() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.status, EdgeStatus::Active);
        assert_eq!(edge.opinion.belief, 0);
        assert_eq!(edge.opinion.disbelief, 0);
        assert_eq!(edge.opinion.uncertainty, 1_000_000);
        assert_eq!(edge.score, 500_000);
        assert_eq!(edge.belief.sum(), HMM_SCALE);
        assert_eq!(edge.registered_at, 1_000);
        assert_eq!(edge.updated_at, 1_000);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let err = engine
            .register_edge(RegisterEdge {
                creator: "someone".to_string(),
                edge_id: "edge1".to_string(),
                region: "B".to_string(),
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(engine.edge("edge1").unwrap().region, "A");
    }

    #[test]
    fn test_missing_region_rejected() {
        let mut engine = create_engine();
        let err = engine
            .register_edge(RegisterEdge {
                creator: "operator".to_string(),
                edge_id: "edge1".to_string(),
                region: String::new(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_edges_listed_in_address_order() {
        let mut engine = create_engine();
        register(&mut engine, "edge2", "A");
        register(&mut engine, "edge1", "B");

        let ids: Vec<_> = engine.edges().into_iter().map(|e| e.address).collect();
        assert_eq!(ids, vec!["edge1", "edge2"]);
    }
}

// ============================================================================
// Observation Channels
// ============================================================================

mod observations {
    use super::*;

    #[test]
    fn test_double_sign_scenario() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let first = engine.report_consensus_event(consensus("edge1", 0, 1)).unwrap();
        assert_eq!(first.observation, Observation::Malicious);
        assert_eq!(first.previous_score, 500_000);
        assert_eq!(first.score, 333_333);
        assert!(first.opened_proposal.is_none());

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.opinion.disbelief, 333_333);
        assert_eq!(edge.opinion.uncertainty, 666_666);

        let second = engine.report_consensus_event(consensus("edge1", 0, 1)).unwrap();
        assert_eq!(second.score, 250_000);
        assert_eq!(second.opened_proposal.as_deref(), Some("P-edge1-1"));

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.opinion.disbelief, 500_000);
        assert_eq!(edge.opinion.uncertainty, 500_000);
        assert_eq!(edge.pending_proposal_id.as_deref(), Some("P-edge1-1"));
        assert_eq!(edge.counters.double_signs, 2);
    }

    #[test]
    fn test_missed_votes_count_as_anomaly() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let outcome = engine.report_consensus_event(consensus("edge1", 6, 0)).unwrap();
        assert_eq!(outcome.observation, Observation::Anomaly);
        assert_eq!(engine.edge("edge1").unwrap().evidence_neg, 1);
    }

    #[test]
    fn test_huge_missed_vote_reports_saturate() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let first = engine.report_consensus_event(consensus("edge1", u64::MAX, 0));
        assert_eq!(first.unwrap().score, 333_333);
        let second = engine.report_consensus_event(consensus("edge1", u64::MAX, 0));
        assert!(second.is_ok());

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.counters.missed_votes, u64::MAX);
        assert_eq!(edge.evidence_neg, 2);
    }

    #[test]
    fn test_good_task_events_raise_score() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        for _ in 0..3 {
            engine.report_task_event(task_event("edge1", true)).unwrap();
        }

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.evidence_pos, 3);
        // b = 3/5, u = 2/5 -> 600000 + 200000
        assert_eq!(edge.score, 800_000);
        assert!(edge.belief.p_trust > edge.belief.p_malicious);
        assert_eq!(edge.counters.on_time, 3);
    }

    #[test]
    fn test_unknown_edge_is_not_found() {
        let mut engine = create_engine();
        let err = engine.report_task_event(task_event("ghost", true)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = engine.report_consensus_event(consensus("ghost", 0, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_update_time_comes_from_block_clock() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        engine.clock_mut().set(40, 9_999);

        engine.report_task_event(task_event("edge1", true)).unwrap();
        assert_eq!(engine.edge("edge1").unwrap().updated_at, 9_999);
    }
}

// ============================================================================
// Governance Lifecycle
// ============================================================================

mod governance {
    use super::*;

    #[test]
    fn test_proposal_records_trigger() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let proposal_id = breach(&mut engine, "edge1");

        let proposal = engine.proposal(&proposal_id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.edge_id, "edge1");
        assert_eq!(proposal.action, CorrectiveAction::ConsensusFreeze);
        assert_eq!(proposal.trigger_score, 250_000);
        assert_eq!(proposal.created_height, 2);
        assert_eq!(proposal.created_at, 1_005);
        assert_eq!(
            proposal.reason(),
            "auto: score<thr (score=250000, thr=300000); consensus"
        );
    }

    #[test]
    fn test_pending_proposal_suppresses_new_ones() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        breach(&mut engine, "edge1");

        for _ in 0..5 {
            let outcome = engine.report_consensus_event(consensus("edge1", 0, 1)).unwrap();
            assert!(outcome.opened_proposal.is_none());
        }

        assert_eq!(engine.proposals(None).len(), 1);
        assert_eq!(engine.proposals(Some(ProposalStatus::Pending)).len(), 1);
    }

    #[test]
    fn test_approve_unfreezes_edge() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let proposal_id = breach(&mut engine, "edge1");
        engine
            .set_edge_status(SetEdgeStatus {
                creator: ADMIN.to_string(),
                edge_id: "edge1".to_string(),
                status: EdgeStatus::ConsensusFrozen,
            })
            .unwrap();
        engine.clock_mut().set(10, 2_000);

        let proposal = engine
            .approve_proposal(ApproveProposal {
                creator: ADMIN.to_string(),
                proposal_id: proposal_id.clone(),
            })
            .unwrap();

        assert_eq!(proposal.status, ProposalStatus::Approved);
        assert_eq!(proposal.decided_by.as_deref(), Some(ADMIN));
        assert_eq!(proposal.decided_at, Some(2_000));

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.status, EdgeStatus::Active);
        assert!(edge.pending_proposal_id.is_none());
        assert_eq!(edge.updated_at, 2_000);
    }

    #[test]
    fn test_reject_keeps_status_and_appends_reason() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let proposal_id = breach(&mut engine, "edge1");
        engine
            .set_edge_status(SetEdgeStatus {
                creator: ADMIN.to_string(),
                edge_id: "edge1".to_string(),
                status: EdgeStatus::TaskFrozen,
            })
            .unwrap();

        let proposal = engine
            .reject_proposal(RejectProposal {
                creator: ADMIN.to_string(),
                proposal_id: proposal_id.clone(),
                reason: "validator was offline for maintenance".to_string(),
            })
            .unwrap();

        assert_eq!(proposal.status, ProposalStatus::Rejected);
        assert_eq!(proposal.reasons.len(), 2);
        assert_eq!(
            proposal.reasons[1],
            "reject: validator was offline for maintenance"
        );

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.status, EdgeStatus::TaskFrozen);
        assert!(edge.pending_proposal_id.is_none());
    }

    #[test]
    fn test_new_breach_after_resolution_opens_next_proposal() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let first = breach(&mut engine, "edge1");
        engine
            .reject_proposal(RejectProposal {
                creator: ADMIN.to_string(),
                proposal_id: first,
                reason: String::new(),
            })
            .unwrap();

        let outcome = engine.report_consensus_event(consensus("edge1", 0, 1)).unwrap();
        assert_eq!(outcome.score, 200_000);
        assert_eq!(outcome.opened_proposal.as_deref(), Some("P-edge1-2"));
    }

    #[test]
    fn test_resolution_checks_in_order() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let proposal_id = breach(&mut engine, "edge1");

        let not_admin = engine
            .approve_proposal(ApproveProposal {
                creator: "mallory".to_string(),
                proposal_id: "P-missing-9".to_string(),
            })
            .unwrap_err();
        assert_eq!(not_admin.kind(), ErrorKind::NotAuthorized);

        let missing = engine
            .reject_proposal(RejectProposal {
                creator: ADMIN.to_string(),
                proposal_id: "P-missing-9".to_string(),
                reason: String::new(),
            })
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        engine
            .approve_proposal(ApproveProposal {
                creator: ADMIN.to_string(),
                proposal_id: proposal_id.clone(),
            })
            .unwrap();

        let twice = engine
            .reject_proposal(RejectProposal {
                creator: ADMIN.to_string(),
                proposal_id: proposal_id.clone(),
                reason: "late".to_string(),
            })
            .unwrap_err();
        assert_eq!(twice.kind(), ErrorKind::InvalidState);
        assert_eq!(
            engine.proposal(&proposal_id).unwrap().status,
            ProposalStatus::Approved
        );
    }

    #[test]
    fn test_status_change_requires_admin() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let err = engine
            .set_edge_status(SetEdgeStatus {
                creator: "operator".to_string(),
                edge_id: "edge1".to_string(),
                status: EdgeStatus::TaskFrozen,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);

        let err = engine
            .set_edge_status(SetEdgeStatus {
                creator: ADMIN.to_string(),
                edge_id: "ghost".to_string(),
                status: EdgeStatus::TaskFrozen,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

// ============================================================================
// Tasks, Telemetry and Feedback
// ============================================================================

mod tasks {
    use super::*;

    #[test]
    fn test_auto_assignment_prefers_best_edge() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        register(&mut engine, "edge2", "A");
        register(&mut engine, "edge3", "B");
        engine.report_task_event(task_event("edge2", true)).unwrap();

        let task = create_task(&mut engine, "A", None);
        assert_eq!(task.task_id, "T-1");
        assert_eq!(task.edge_id, "edge2");
        assert_eq!(task.status, TaskStatus::Assigned);

        let task = create_task(&mut engine, "B", None);
        assert_eq!(task.task_id, "T-2");
        assert_eq!(task.edge_id, "edge3");
    }

    #[test]
    fn test_assignment_rejections() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");

        let wrong_region = engine
            .create_task(CreateTask {
                creator: REQUESTER.to_string(),
                region: "B".to_string(),
                task_type: String::new(),
                edge_id: Some("edge1".to_string()),
            })
            .unwrap_err();
        assert_eq!(wrong_region.kind(), ErrorKind::InvalidRequest);

        let empty_region = engine
            .create_task(CreateTask {
                creator: REQUESTER.to_string(),
                region: "C".to_string(),
                task_type: String::new(),
                edge_id: None,
            })
            .unwrap_err();
        assert_eq!(empty_region.kind(), ErrorKind::NotFound);

        engine
            .set_edge_status(SetEdgeStatus {
                creator: ADMIN.to_string(),
                edge_id: "edge1".to_string(),
                status: EdgeStatus::TaskFrozen,
            })
            .unwrap();

        let frozen = engine
            .create_task(CreateTask {
                creator: REQUESTER.to_string(),
                region: "A".to_string(),
                task_type: String::new(),
                edge_id: Some("edge1".to_string()),
            })
            .unwrap_err();
        assert_eq!(frozen.kind(), ErrorKind::InvalidState);
        assert!(engine.task("T-1").is_none());
    }

    #[test]
    fn test_log_stages_drive_task_status() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let task = create_task(&mut engine, "A", Some("edge1"));

        engine
            .submit_log_summary(log(&task.task_id, "edge1", "recv", "h1"))
            .unwrap();
        assert_eq!(engine.task(&task.task_id).unwrap().status, TaskStatus::Running);

        engine
            .submit_log_summary(log(&task.task_id, "edge1", "EXEC", "h2"))
            .unwrap();

        let mut result = log(&task.task_id, "edge1", "RESULT", "h3");
        result.result_hash = Some("r-42".to_string());
        let outcome = engine.submit_log_summary(result).unwrap();
        assert_eq!(outcome.observation, Observation::Good);

        let task = engine.task(&task.task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Finished);
        assert_eq!(task.result_hash.as_deref(), Some("r-42"));
        assert_eq!(task.log_hashes, vec!["h1", "h2", "h3"]);

        let edge = engine.edge("edge1").unwrap();
        assert_eq!(edge.evidence_pos, 3);
        assert_eq!(edge.counters.on_time, 1);

        let summary = engine.log_summary("h3").unwrap();
        assert_eq!(summary.edge_id, "edge1");
        assert_eq!(summary.height, 1);
    }

    #[test]
    fn test_stalled_log_is_malicious() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let task = create_task(&mut engine, "A", None);

        let mut stalled = log(&task.task_id, "edge1", "EXEC", "h1");
        stalled.usage.latency_ms = 4_001;
        let outcome = engine.submit_log_summary(stalled).unwrap();

        assert_eq!(outcome.observation, Observation::Malicious);
        assert_eq!(engine.edge("edge1").unwrap().counters.timeouts, 1);
    }

    #[test]
    fn test_log_summary_rejections() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let task = create_task(&mut engine, "A", None);
        engine
            .submit_log_summary(log(&task.task_id, "edge1", "RECV", "h1"))
            .unwrap();

        let cases = [
            (log(&task.task_id, "edge1", "RECV", ""), ErrorKind::InvalidRequest),
            (log(&task.task_id, "edge1", "DONE", "h2"), ErrorKind::InvalidRequest),
            (log("T-99", "edge1", "RECV", "h2"), ErrorKind::NotFound),
            (log(&task.task_id, "edge2", "RECV", "h2"), ErrorKind::NotAuthorized),
            (log(&task.task_id, "edge1", "EXEC", "h1"), ErrorKind::AlreadyExists),
        ];
        for (msg, kind) in cases {
            assert_eq!(engine.submit_log_summary(msg).unwrap_err().kind(), kind);
        }

        engine
            .set_edge_status(SetEdgeStatus {
                creator: ADMIN.to_string(),
                edge_id: "edge1".to_string(),
                status: EdgeStatus::TaskFrozen,
            })
            .unwrap();
        let frozen = engine
            .submit_log_summary(log(&task.task_id, "edge1", "EXEC", "h2"))
            .unwrap_err();
        assert_eq!(frozen.kind(), ErrorKind::InvalidState);

        assert_eq!(engine.task(&task.task_id).unwrap().log_hashes, vec!["h1"]);
        assert_eq!(engine.edge("edge1").unwrap().total_evidence(), 1);
    }

    #[test]
    fn test_feedback_updates_assigned_edge_once() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let task = create_task(&mut engine, "A", None);

        let stranger = engine
            .submit_task_feedback(SubmitTaskFeedback {
                creator: "vehicle2".to_string(),
                task_id: task.task_id.clone(),
                accepted: true,
                reason: String::new(),
            })
            .unwrap_err();
        assert_eq!(stranger.kind(), ErrorKind::NotAuthorized);

        let outcome = engine
            .submit_task_feedback(SubmitTaskFeedback {
                creator: REQUESTER.to_string(),
                task_id: task.task_id.clone(),
                accepted: false,
                reason: "wrong answer".to_string(),
            })
            .unwrap()
            .unwrap();
        assert_eq!(outcome.observation, Observation::Malicious);
        assert_eq!(engine.edge("edge1").unwrap().counters.complaints, 1);

        let feedback = engine.task(&task.task_id).unwrap().feedback.unwrap();
        assert!(!feedback.accepted);
        assert_eq!(feedback.reason, "wrong answer");

        let again = engine
            .submit_task_feedback(SubmitTaskFeedback {
                creator: REQUESTER.to_string(),
                task_id: task.task_id.clone(),
                accepted: true,
                reason: String::new(),
            })
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::InvalidState);
        assert_eq!(engine.edge("edge1").unwrap().total_evidence(), 1);
    }

    #[test]
    fn test_feedback_for_missing_edge_is_recorded_only() {
        let mut store = MemoryStore::new();
        store.put_task(Task {
            task_id: "T-7".to_string(),
            requester: REQUESTER.to_string(),
            region: "A".to_string(),
            task_type: String::new(),
            edge_id: "retired".to_string(),
            status: TaskStatus::Finished,
            log_hashes: Vec::new(),
            result_hash: None,
            feedback: None,
            created_at: 0,
            updated_at: 0,
        });
        let mut engine = create_engine_on(store);

        let outcome = engine
            .submit_task_feedback(SubmitTaskFeedback {
                creator: REQUESTER.to_string(),
                task_id: "T-7".to_string(),
                accepted: true,
                reason: String::new(),
            })
            .unwrap();

        assert!(outcome.is_none());
        assert!(engine.task("T-7").unwrap().feedback.is_some());
        assert!(engine.edges().is_empty());
    }
}

// ============================================================================
// Propagation
// ============================================================================

mod propagation {
    use super::*;

    #[test]
    fn test_propagation_records_snapshot() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        engine.report_task_event(task_event("edge1", true)).unwrap();
        engine.clock_mut().set(12, 1_060);

        let record = engine
            .propagate_reputation(PropagateReputation {
                edge_id: "edge1".to_string(),
                from_region: "A".to_string(),
                to_region: "B".to_string(),
                reason: "handover".to_string(),
            })
            .unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.snapshot_hash, engine.snapshot_hash("edge1").unwrap());
        assert_eq!(record.snapshot_hash.len(), 64);
        assert_eq!(record.height, 12);
        assert_eq!(record.created_at, 1_060);
    }

    #[test]
    fn test_propagation_ids_are_sequential() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        register(&mut engine, "edge2", "A");

        for edge_id in ["edge1", "edge2", "edge1"] {
            engine
                .propagate_reputation(PropagateReputation {
                    edge_id: edge_id.to_string(),
                    from_region: "A".to_string(),
                    to_region: "C".to_string(),
                    reason: String::new(),
                })
                .unwrap();
        }

        let ids: Vec<_> = engine.propagations().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_propagating_unknown_edge_fails() {
        let mut engine = create_engine();
        let err = engine
            .propagate_reputation(PropagateReputation {
                edge_id: "ghost".to_string(),
                from_region: "A".to_string(),
                to_region: "B".to_string(),
                reason: String::new(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(engine.propagations().is_empty());
    }

    #[test]
    fn test_snapshot_tracks_reputation_changes() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let before = engine.snapshot_hash("edge1").unwrap();

        engine.report_task_event(task_event("edge1", false)).unwrap();
        assert_ne!(engine.snapshot_hash("edge1").unwrap(), before);
        assert_eq!(
            engine.snapshot_hash("ghost").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}

// ============================================================================
// Determinism and Transactional Abort
// ============================================================================

mod determinism {
    use super::*;

    fn replay() -> MemoryStore {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        register(&mut engine, "edge2", "A");
        breach(&mut engine, "edge1");
        let task = create_task(&mut engine, "A", None);
        engine.clock_mut().advance(5);
        engine
            .submit_log_summary(log(&task.task_id, &task.edge_id, "RESULT", "h1"))
            .unwrap();
        engine
            .propagate_reputation(PropagateReputation {
                edge_id: "edge1".to_string(),
                from_region: "A".to_string(),
                to_region: "B".to_string(),
                reason: String::new(),
            })
            .unwrap();
        engine.into_store()
    }

    #[test]
    fn test_same_inputs_same_state() {
        let a = replay();
        let b = replay();
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_rejected_operations_leave_store_untouched() {
        let mut engine = create_engine();
        register(&mut engine, "edge1", "A");
        let proposal_id = breach(&mut engine, "edge1");
        let task = create_task(&mut engine, "A", None);
        let before = engine.store().clone();

        assert!(engine
            .submit_log_summary(log(&task.task_id, "intruder", "RECV", "h1"))
            .is_err());
        assert!(engine
            .approve_proposal(ApproveProposal {
                creator: "intruder".to_string(),
                proposal_id,
            })
            .is_err());
        assert!(engine.create_task(CreateTask {
            creator: REQUESTER.to_string(),
            region: "Z".to_string(),
            task_type: String::new(),
            edge_id: None,
        })
        .is_err());

        assert_eq!(engine.store(), &before);
    }

    #[test]
    fn test_state_survives_json_snapshot() {
        let store = replay();
        let restored = MemoryStore::from_json(&store.to_json().unwrap()).unwrap();
        let mut engine = create_engine_on(restored);

        // Sequences continue where the snapshot left off
        let task = create_task(&mut engine, "A", None);
        assert_eq!(task.task_id, "T-2");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod properties {
    use super::*;
    use edge_trust::{Edge, ObservationSource, SubjectiveOpinion};
    use proptest::prelude::*;

    fn observation(code: u8) -> Observation {
        match code % 3 {
            0 => Observation::Good,
            1 => Observation::Anomaly,
            _ => Observation::Malicious,
        }
    }

    proptest! {
        #[test]
        fn hmm_belief_always_sums_to_scale(codes in proptest::collection::vec(0u8..3, 0..200)) {
            let manager = ReputationManager::default();
            let mut edge = Edge::new("edge1".into(), "op".into(), "A".into(), 0);
            for (i, code) in codes.iter().enumerate() {
                manager.apply_observation(&mut edge, observation(*code), ObservationSource::TaskEvent, i as i64);
                prop_assert_eq!(edge.belief.sum(), HMM_SCALE);
            }
        }

        #[test]
        fn evidence_grows_by_one_per_observation(codes in proptest::collection::vec(0u8..3, 1..100)) {
            let manager = ReputationManager::default();
            let mut edge = Edge::new("edge1".into(), "op".into(), "A".into(), 0);
            for code in codes {
                let before = edge.total_evidence();
                manager.apply_observation(&mut edge, observation(code), ObservationSource::Feedback, 0);
                prop_assert_eq!(edge.total_evidence(), before + 1);
            }
        }

        #[test]
        fn score_depends_only_on_evidence(pos in 0u64..60, neg in 0u64..60) {
            let manager = ReputationManager::default();
            let mut goods_first = Edge::new("a".into(), "op".into(), "A".into(), 0);
            let mut bads_first = Edge::new("b".into(), "op".into(), "A".into(), 0);

            for _ in 0..pos {
                manager.apply_observation(&mut goods_first, Observation::Good, ObservationSource::TaskEvent, 0);
            }
            for _ in 0..neg {
                manager.apply_observation(&mut goods_first, Observation::Anomaly, ObservationSource::TaskEvent, 0);
                manager.apply_observation(&mut bads_first, Observation::Malicious, ObservationSource::Consensus, 0);
            }
            for _ in 0..pos {
                manager.apply_observation(&mut bads_first, Observation::Good, ObservationSource::Consensus, 0);
            }

            prop_assert_eq!(goods_first.opinion, bads_first.opinion);
            prop_assert_eq!(goods_first.score, bads_first.score);
            prop_assert_eq!(goods_first.opinion, SubjectiveOpinion::from_evidence(pos, neg));
        }
    }
}
