use std::time::Duration;

use crate::{BoardId, Epoch, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitScrape {
        epoch: Epoch,
        board_ids: Vec<BoardId>,
    },
    PollStatus {
        epoch: Epoch,
        task_id: TaskId,
        delay: Duration,
    },
    FetchRawResults { epoch: Epoch, task_id: TaskId },
    CheckMatches { epoch: Epoch, task_id: TaskId },
    TriggerMatch { epoch: Epoch, task_id: TaskId },
    FollowUpMatches {
        epoch: Epoch,
        task_id: TaskId,
        delay: Duration,
    },
    /// Stop every activity started under `epoch`.
    Cancel { epoch: Epoch },
    Emit(Event),
}

/// Outcomes surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ScanStarted { task_id: TaskId },
    /// Emitted exactly once per task.
    ScanCompleted { task_id: TaskId },
    ScanFailed { task_id: Option<TaskId> },
    MatchingSettled { task_id: TaskId, match_count: usize },
    MatchingFailed { task_id: TaskId },
    Notice(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing toast text. Has no bearing on state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }
}
