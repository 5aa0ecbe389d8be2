use chrono::{DateTime, Utc};

use crate::{JobBoard, MatchPhase, ResultsView, ScrapePhase, TaskId, TaskStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardView {
    pub scan: ScanView,
    pub active_task_id: Option<TaskId>,
    pub results: ResultsView,
    pub matching: MatchPhase,
    pub loading: bool,
    pub can_find_matches: bool,
    pub boards: Vec<JobBoard>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanView {
    #[default]
    Idle,
    Submitting,
    Running {
        task_id: TaskId,
        status: TaskStatus,
        started: DateTime<Utc>,
    },
    Completed {
        task_id: TaskId,
        started: DateTime<Utc>,
    },
    Failed {
        task_id: Option<TaskId>,
        reason: Option<String>,
    },
}

impl ScanView {
    pub fn from_phase(phase: &ScrapePhase) -> Self {
        match phase {
            ScrapePhase::Idle => ScanView::Idle,
            ScrapePhase::Submitting => ScanView::Submitting,
            ScrapePhase::Polling { task, .. } => ScanView::Running {
                task_id: task.task_id,
                status: task.status,
                started: task.created_at,
            },
            ScrapePhase::Completed(task) => ScanView::Completed {
                task_id: task.task_id,
                started: task.created_at,
            },
            ScrapePhase::Failed { task_id, error } => ScanView::Failed {
                task_id: *task_id,
                reason: error.as_ref().map(ToString::to_string),
            },
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, ScanView::Submitting | ScanView::Running { .. })
    }
}
