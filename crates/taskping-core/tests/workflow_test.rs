// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scenario tests for the assignment workflow engine.
//!
//! All collaborators are faked: a scripted snapshot store (one queued
//! snapshot per read, so the two reads of a run can disagree), a recording
//! mailer, a recording scheduler and a manual clock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use taskping_core::{
    AssignmentEvent, AssignmentWorkflow, Assignee, Clock, Mailer, NotificationPayload,
    PhaseOutcome, ProjectRef, ReminderOutcome, ReminderTicket, SkipReason, SnapshotStore,
    StorageError, Suspension, TaskSnapshot, TaskStatus, TransportError, WakeScheduler,
    WorkflowError, ScheduleError,
};

// ============================================================================
// Fakes
// ============================================================================

/// Returns one queued snapshot per read; panics when the script runs dry.
struct ScriptedStore {
    reads: Mutex<VecDeque<Option<TaskSnapshot>>>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    fn new(reads: Vec<Option<TaskSnapshot>>) -> Self {
        Self {
            reads: Mutex::new(reads.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for ScriptedStore {
    async fn load_task_snapshot(
        &self,
        _task_id: &str,
    ) -> Result<Option<TaskSnapshot>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .reads
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted store exhausted: unexpected snapshot read");
        Ok(next)
    }
}

struct RecordingMailer {
    sent: Mutex<Vec<NotificationPayload>>,
    fail_with: Mutex<Option<TransportError>>,
}

impl RecordingMailer {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
        }
    }

    fn failing(error: TransportError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Mutex::new(Some(error)),
        }
    }

    fn sent(&self) -> Vec<NotificationPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, payload: &NotificationPayload) -> Result<(), TransportError> {
        if let Some(error) = self.fail_with.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Records suspension requests and answers with a fixed mode.
struct RecordingScheduler {
    mode: Suspension,
    requests: Mutex<Vec<ReminderTicket>>,
}

impl RecordingScheduler {
    fn elapsing() -> Self {
        Self {
            mode: Suspension::Elapsed,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn deferring() -> Self {
        Self {
            mode: Suspension::Deferred,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ReminderTicket> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WakeScheduler for RecordingScheduler {
    async fn suspend_until(&self, ticket: &ReminderTicket) -> Result<Suspension, ScheduleError> {
        self.requests.lock().unwrap().push(ticket.clone());
        Ok(self.mode)
    }
}

struct ManualClock {
    now: DateTime<Utc>,
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 10, 9, 0, 0).unwrap()
}

fn snapshot(task_id: &str, status: TaskStatus, due_at: Option<DateTime<Utc>>) -> TaskSnapshot {
    TaskSnapshot {
        id: task_id.to_string(),
        title: "Ship the billing fix".to_string(),
        description: Some("Customers on annual plans are double-charged.".to_string()),
        status,
        due_at,
        assignee: Some(Assignee {
            id: "u-alice".to_string(),
            name: Some("Alice".to_string()),
            email: "alice@x.com".to_string(),
        }),
        project: Some(ProjectRef {
            id: "p-billing".to_string(),
            name: "Billing".to_string(),
        }),
    }
}

fn engine(
    store: Arc<ScriptedStore>,
    mailer: Arc<RecordingMailer>,
    scheduler: Arc<RecordingScheduler>,
) -> AssignmentWorkflow {
    AssignmentWorkflow::new(
        store,
        mailer,
        scheduler,
        Arc::new(ManualClock { now: now() }),
    )
}

// ============================================================================
// Scenarios
// ============================================================================

/// Scenario A: due tomorrow, still TODO at both reads - assignment then
/// reminder, both sent.
#[tokio::test]
async fn test_full_run_sends_assignment_and_reminder() {
    let due = now() + Duration::days(1);
    let store = Arc::new(ScriptedStore::new(vec![
        Some(snapshot("T1", TaskStatus::Todo, Some(due))),
        Some(snapshot("T1", TaskStatus::Todo, Some(due))),
    ]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store.clone(), mailer.clone(), scheduler.clone());

    let run = workflow.run(&AssignmentEvent::new("T1")).await.unwrap();

    assert_eq!(run.immediate, PhaseOutcome::Sent);
    assert_eq!(run.reminder, ReminderOutcome::Sent);
    assert_eq!(store.call_count(), 2);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "alice@x.com");
    assert!(sent[0].subject.starts_with("New task assigned:"));
    assert!(sent[1].subject.starts_with("Reminder:"));

    let requests = scheduler.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].task_id, "T1");
    assert_eq!(requests[0].wake_at, due);
}

/// Scenario B: completed while suspended - reminder skipped, one email only.
#[tokio::test]
async fn test_completion_during_suspension_skips_reminder() {
    let due = now() + Duration::days(1);
    let store = Arc::new(ScriptedStore::new(vec![
        Some(snapshot("T2", TaskStatus::Todo, Some(due))),
        Some(snapshot("T2", TaskStatus::Done, Some(due))),
    ]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store.clone(), mailer.clone(), scheduler);

    let run = workflow.run(&AssignmentEvent::new("T2")).await.unwrap();

    assert_eq!(run.immediate, PhaseOutcome::Sent);
    assert_eq!(
        run.reminder,
        ReminderOutcome::Skipped(SkipReason::AlreadyComplete)
    );
    assert_eq!(mailer.sent().len(), 1);
}

/// Scenario C: no assignee - skipped, no dispatch, no suspension, no phase 2.
#[tokio::test]
async fn test_no_assignee_skips_whole_run() {
    let mut unassigned = snapshot("T3", TaskStatus::Todo, Some(now() + Duration::days(1)));
    unassigned.assignee = None;
    let store = Arc::new(ScriptedStore::new(vec![Some(unassigned)]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store.clone(), mailer.clone(), scheduler.clone());

    let run = workflow.run(&AssignmentEvent::new("T3")).await.unwrap();

    assert_eq!(
        run.immediate,
        PhaseOutcome::Skipped(SkipReason::NoAssignee)
    );
    assert_eq!(run.reminder, ReminderOutcome::NotRun);
    assert!(mailer.sent().is_empty());
    assert!(scheduler.requests().is_empty());
    assert_eq!(store.call_count(), 1);
}

/// Scenario D: due date exactly equal to now counts as not-future; no
/// suspension happens.
#[tokio::test]
async fn test_due_date_equal_to_now_is_not_future() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T4",
        TaskStatus::Todo,
        Some(now()),
    ))]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler.clone());

    let run = workflow.run(&AssignmentEvent::new("T4")).await.unwrap();

    assert_eq!(run.immediate, PhaseOutcome::Sent);
    assert_eq!(
        run.reminder,
        ReminderOutcome::Skipped(SkipReason::NoFutureDueDate)
    );
    assert_eq!(mailer.sent().len(), 1);
    assert!(scheduler.requests().is_empty());
}

/// Scenario E: missing task id fails validation before any collaborator call.
#[tokio::test]
async fn test_missing_task_id_is_validation_error() {
    let store = Arc::new(ScriptedStore::new(vec![]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store.clone(), mailer.clone(), scheduler.clone());

    let err = workflow
        .run(&AssignmentEvent::new("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Validation("missing task id")));
    assert_eq!(store.call_count(), 0);
    assert!(mailer.sent().is_empty());
    assert!(scheduler.requests().is_empty());
}

#[tokio::test]
async fn test_past_due_date_skips_reminder() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T5",
        TaskStatus::Todo,
        Some(now() - Duration::hours(2)),
    ))]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler.clone());

    let run = workflow.run(&AssignmentEvent::new("T5")).await.unwrap();

    assert_eq!(
        run.reminder,
        ReminderOutcome::Skipped(SkipReason::NoFutureDueDate)
    );
    assert!(scheduler.requests().is_empty());
}

#[tokio::test]
async fn test_no_due_date_skips_reminder() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T6",
        TaskStatus::Todo,
        None,
    ))]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler.clone());

    let run = workflow.run(&AssignmentEvent::new("T6")).await.unwrap();

    assert_eq!(run.immediate, PhaseOutcome::Sent);
    assert_eq!(
        run.reminder,
        ReminderOutcome::Skipped(SkipReason::NoFutureDueDate)
    );
    assert!(scheduler.requests().is_empty());
}

#[tokio::test]
async fn test_due_override_wins_over_snapshot_due_date() {
    let override_due = now() + Duration::days(3);
    let store = Arc::new(ScriptedStore::new(vec![
        Some(snapshot("T7", TaskStatus::Todo, Some(now() - Duration::days(1)))),
    ]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::deferring());
    let workflow = engine(store, mailer, scheduler.clone());

    let mut event = AssignmentEvent::new("T7");
    event.due_override = Some(override_due);
    let run = workflow.run(&event).await.unwrap();

    assert_eq!(
        run.reminder,
        ReminderOutcome::Scheduled {
            wake_at: override_due
        }
    );
    assert_eq!(scheduler.requests()[0].wake_at, override_due);
}

#[tokio::test]
async fn test_deferred_suspension_reports_scheduled() {
    let due = now() + Duration::days(30);
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T8",
        TaskStatus::Todo,
        Some(due),
    ))]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::deferring());
    let workflow = engine(store.clone(), mailer.clone(), scheduler.clone());

    let mut event = AssignmentEvent::new("T8");
    event.origin = Some("https://app.example.com".to_string());
    let run = workflow.run(&event).await.unwrap();

    assert_eq!(run.immediate, PhaseOutcome::Sent);
    assert_eq!(run.reminder, ReminderOutcome::Scheduled { wake_at: due });
    // Only the immediate email went out; the worker owns the rest.
    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(store.call_count(), 1);
    // The ticket carries everything resumption needs.
    let ticket = &scheduler.requests()[0];
    assert_eq!(ticket.task_id, "T8");
    assert_eq!(ticket.origin.as_deref(), Some("https://app.example.com"));
    assert_eq!(ticket.wake_at, due);
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let store = Arc::new(ScriptedStore::new(vec![None]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler);

    let err = workflow.run(&AssignmentEvent::new("ghost")).await.unwrap_err();

    assert!(matches!(err, WorkflowError::TaskNotFound { ref task_id } if task_id == "ghost"));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_missing_project_is_not_found() {
    let mut orphan = snapshot("T9", TaskStatus::Todo, None);
    orphan.project = None;
    let store = Arc::new(ScriptedStore::new(vec![Some(orphan)]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler);

    let err = workflow.run(&AssignmentEvent::new("T9")).await.unwrap_err();

    assert!(matches!(err, WorkflowError::ProjectNotFound { ref task_id } if task_id == "T9"));
    assert!(mailer.sent().is_empty());
}

/// A phase 1 dispatch failure aborts the run: no suspension is scheduled.
#[tokio::test]
async fn test_dispatch_failure_aborts_before_scheduling() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T10",
        TaskStatus::Todo,
        Some(now() + Duration::days(1)),
    ))]));
    let mailer = Arc::new(RecordingMailer::failing(TransportError::Unavailable(
        "connection reset".to_string(),
    )));
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer, scheduler.clone());

    let err = workflow.run(&AssignmentEvent::new("T10")).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Transport(_)));
    assert!(scheduler.requests().is_empty());
}

// ============================================================================
// Resumed reminder phase (worker path)
// ============================================================================

fn ticket(task_id: &str) -> ReminderTicket {
    ReminderTicket {
        task_id: task_id.to_string(),
        origin: None,
        wake_at: now(),
    }
}

#[tokio::test]
async fn test_resumed_reminder_sends_when_still_open() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T11",
        TaskStatus::InProgress,
        Some(now()),
    ))]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler);

    let outcome = workflow.run_reminder(&ticket("T11")).await.unwrap();

    assert_eq!(outcome, PhaseOutcome::Sent);
    assert_eq!(mailer.sent().len(), 1);
    assert!(mailer.sent()[0].subject.starts_with("Reminder:"));
}

#[tokio::test]
async fn test_resumed_reminder_skips_vanished_task() {
    let store = Arc::new(ScriptedStore::new(vec![None]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler);

    let outcome = workflow.run_reminder(&ticket("T12")).await.unwrap();

    assert_eq!(outcome, PhaseOutcome::Skipped(SkipReason::DataUnavailable));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_resumed_reminder_skips_unassigned_task() {
    let mut unassigned = snapshot("T13", TaskStatus::Todo, Some(now()));
    unassigned.assignee = None;
    let store = Arc::new(ScriptedStore::new(vec![Some(unassigned)]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler);

    let outcome = workflow.run_reminder(&ticket("T13")).await.unwrap();

    assert_eq!(outcome, PhaseOutcome::Skipped(SkipReason::DataUnavailable));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_resumed_reminder_skips_done_task() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T14",
        TaskStatus::Done,
        Some(now()),
    ))]));
    let mailer = Arc::new(RecordingMailer::new());
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer.clone(), scheduler);

    let outcome = workflow.run_reminder(&ticket("T14")).await.unwrap();

    assert_eq!(outcome, PhaseOutcome::Skipped(SkipReason::AlreadyComplete));
    assert!(mailer.sent().is_empty());
}

/// A reminder dispatch failure surfaces as a transport error on its own; it
/// never rewinds the already-sent phase 1.
#[tokio::test]
async fn test_resumed_reminder_dispatch_failure_surfaces() {
    let store = Arc::new(ScriptedStore::new(vec![Some(snapshot(
        "T15",
        TaskStatus::Todo,
        Some(now()),
    ))]));
    let mailer = Arc::new(RecordingMailer::failing(TransportError::Rejected(
        "mailbox full".to_string(),
    )));
    let scheduler = Arc::new(RecordingScheduler::elapsing());
    let workflow = engine(store, mailer, scheduler);

    let err = workflow.run_reminder(&ticket("T15")).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Transport(_)));
}
