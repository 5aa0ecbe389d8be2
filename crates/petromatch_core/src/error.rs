use std::fmt;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidArgument, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RemoteUnavailable, message)
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::RemoteRejected(status), message)
    }

    pub fn server_fault(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::RemoteServerFault(status), message)
    }

    /// Wraps the error of a failed trigger call. The task keeps its idempotency mark.
    pub fn match_trigger_failed(task_id: TaskId, cause: &ApiError) -> Self {
        Self::new(
            FailureKind::MatchTriggerFailed,
            format!("task {task_id}: {cause}"),
        )
    }

    /// Transport faults and 5xx responses may clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::RemoteUnavailable | FailureKind::RemoteServerFault(_)
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidArgument,
    RemoteUnavailable,
    RemoteRejected(u16),
    RemoteServerFault(u16),
    MatchTriggerFailed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidArgument => write!(f, "invalid argument"),
            FailureKind::RemoteUnavailable => write!(f, "remote unavailable"),
            FailureKind::RemoteRejected(status) => write!(f, "remote rejected ({status})"),
            FailureKind::RemoteServerFault(status) => write!(f, "remote server fault ({status})"),
            FailureKind::MatchTriggerFailed => write!(f, "match trigger failed"),
        }
    }
}
