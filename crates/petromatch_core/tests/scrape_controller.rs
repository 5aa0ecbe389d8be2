use std::time::Duration;

use chrono::{TimeZone, Utc};
use petromatch_core::{
    ApiError, FailureKind, PollPolicy, PollStep, ScrapeController, ScrapePhase, ScrapeTask,
    TaskStatus,
};

fn task(task_id: u64, status: TaskStatus) -> ScrapeTask {
    ScrapeTask {
        task_id,
        status,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
    }
}

fn polling_controller(task_id: u64) -> ScrapeController {
    let mut controller = ScrapeController::new(PollPolicy::default());
    controller.begin(&[1]).unwrap();
    let step = controller.submitted(task(task_id, TaskStatus::Pending));
    assert_eq!(
        step,
        PollStep::Continue {
            delay: Duration::from_secs(2)
        }
    );
    controller
}

#[test]
fn empty_board_selection_is_rejected_without_state_change() {
    let mut controller = ScrapeController::new(PollPolicy::default());
    let err = controller.begin(&[]).unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidArgument);
    assert_eq!(controller.phase(), &ScrapePhase::Idle);
}

#[test]
fn pending_and_running_keep_polling_at_fixed_cadence() {
    let mut controller = polling_controller(4);

    for status in [TaskStatus::Running, TaskStatus::Pending, TaskStatus::Running] {
        let step = controller.observe(task(4, status));
        assert_eq!(
            step,
            PollStep::Continue {
                delay: Duration::from_secs(2)
            }
        );
    }
    match controller.phase() {
        ScrapePhase::Polling { task, .. } => assert_eq!(task.status, TaskStatus::Running),
        other => panic!("unexpected phase {other:?}"),
    }
}

#[test]
fn terminal_states_ignore_stale_responses() {
    let mut controller = polling_controller(4);
    assert_eq!(
        controller.observe(task(4, TaskStatus::Completed)),
        PollStep::Completed(4)
    );

    // A late "running" response must not reopen the task.
    assert_eq!(
        controller.observe(task(4, TaskStatus::Running)),
        PollStep::Ignored
    );
    assert_eq!(
        controller.observe(task(4, TaskStatus::Failed)),
        PollStep::Ignored
    );
    assert!(matches!(controller.phase(), ScrapePhase::Completed(t) if t.task_id == 4));
}

#[test]
fn failed_status_stops_polling() {
    let mut controller = polling_controller(9);
    assert_eq!(
        controller.observe(task(9, TaskStatus::Failed)),
        PollStep::Failed(9)
    );
    assert_eq!(
        controller.phase(),
        &ScrapePhase::Failed {
            task_id: Some(9),
            error: None
        }
    );
}

#[test]
fn responses_for_other_tasks_are_ignored() {
    let mut controller = polling_controller(9);
    assert_eq!(
        controller.observe(task(10, TaskStatus::Completed)),
        PollStep::Ignored
    );
    assert!(controller.phase().is_busy());
}

#[test]
fn transient_errors_back_off_then_abandon() {
    let policy = PollPolicy {
        interval: Duration::from_secs(2),
        backoff_ceiling: Duration::from_secs(10),
        max_consecutive_failures: 4,
    };
    let mut controller = ScrapeController::new(policy);
    controller.begin(&[1]).unwrap();
    controller.submitted(task(3, TaskStatus::Running));

    let delays: Vec<_> = (0..3)
        .map(|_| controller.poll_failed(3, ApiError::unavailable("connection reset")))
        .collect();
    assert_eq!(
        delays,
        vec![
            PollStep::Continue {
                delay: Duration::from_secs(4)
            },
            PollStep::Continue {
                delay: Duration::from_secs(8)
            },
            PollStep::Continue {
                delay: Duration::from_secs(10)
            },
        ]
    );

    let step = controller.poll_failed(3, ApiError::server_fault(502, "bad gateway"));
    assert!(matches!(step, PollStep::Abandoned { task_id: 3, .. }));
    assert!(matches!(
        controller.phase(),
        ScrapePhase::Failed { task_id: Some(3), error: Some(_) }
    ));
}

#[test]
fn success_resets_failure_counter() {
    let policy = PollPolicy {
        max_consecutive_failures: 2,
        ..PollPolicy::default()
    };
    let mut controller = ScrapeController::new(policy);
    controller.begin(&[1]).unwrap();
    controller.submitted(task(3, TaskStatus::Running));

    assert!(matches!(
        controller.poll_failed(3, ApiError::unavailable("timeout")),
        PollStep::Continue { .. }
    ));
    controller.observe(task(3, TaskStatus::Running));
    assert!(matches!(
        controller.poll_failed(3, ApiError::unavailable("timeout")),
        PollStep::Continue { .. }
    ));
}

#[test]
fn rejected_poll_is_fatal() {
    let mut controller = polling_controller(5);
    let step = controller.poll_failed(5, ApiError::rejected(404, "Task not found"));

    assert_eq!(
        step,
        PollStep::Abandoned {
            task_id: 5,
            error: ApiError::rejected(404, "Task not found"),
        }
    );
}

#[test]
fn submission_can_complete_immediately() {
    let mut controller = ScrapeController::new(PollPolicy::default());
    controller.begin(&[2]).unwrap();

    assert_eq!(
        controller.submitted(task(8, TaskStatus::Completed)),
        PollStep::Completed(8)
    );
}

#[test]
fn failed_submission_records_the_error_without_a_task() {
    let mut controller = ScrapeController::new(PollPolicy::default());
    controller.begin(&[1, 2]).unwrap();
    controller.submit_failed(ApiError::server_fault(502, "Bad Gateway"));

    assert_eq!(
        controller.phase(),
        &ScrapePhase::Failed {
            task_id: None,
            error: Some(ApiError::server_fault(502, "Bad Gateway")),
        }
    );
    assert!(!controller.phase().is_busy());
    assert_eq!(
        controller.submitted(task(9, TaskStatus::Pending)),
        PollStep::Ignored
    );
}
