use std::time::Duration;

use crate::{ApiError, BoardId, ScrapeTask, TaskId, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Cadence while the backend answers normally.
    pub interval: Duration,
    /// Upper bound for the backoff applied after transient failures.
    pub backoff_ceiling: Duration,
    /// Transient failures in a row before polling is abandoned.
    pub max_consecutive_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            backoff_ceiling: Duration::from_secs(30),
            max_consecutive_failures: 5,
        }
    }
}

impl PollPolicy {
    /// Delay before the next poll after `failures` transient errors in a row.
    pub fn delay_after(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures.min(16)).unwrap_or(u32::MAX);
        self.interval
            .checked_mul(factor)
            .unwrap_or(self.backoff_ceiling)
            .min(self.backoff_ceiling.max(self.interval))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScrapePhase {
    #[default]
    Idle,
    Submitting,
    Polling {
        task: ScrapeTask,
        consecutive_failures: u32,
    },
    Completed(ScrapeTask),
    Failed {
        task_id: Option<TaskId>,
        error: Option<ApiError>,
    },
}

impl ScrapePhase {
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            ScrapePhase::Polling { task, .. } | ScrapePhase::Completed(task) => Some(task.task_id),
            ScrapePhase::Failed { task_id, .. } => *task_id,
            ScrapePhase::Idle | ScrapePhase::Submitting => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ScrapePhase::Submitting | ScrapePhase::Polling { .. })
    }
}

/// What the driver should do after a controller transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Issue the next status poll after `delay`.
    Continue { delay: Duration },
    Completed(TaskId),
    Failed(TaskId),
    /// Polling stopped because the backend kept failing or rejected the task.
    Abandoned { task_id: TaskId, error: ApiError },
    /// Response did not apply (terminal task, foreign task id, not polling).
    Ignored,
}

/// Lifecycle of one scrape task: `Idle -> Submitting -> Polling -> {Completed | Failed}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScrapeController {
    phase: ScrapePhase,
    policy: PollPolicy,
}

impl ScrapeController {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            phase: ScrapePhase::Idle,
            policy,
        }
    }

    pub fn phase(&self) -> &ScrapePhase {
        &self.phase
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Starts a submission, replacing whatever task was active.
    ///
    /// An empty board selection is rejected and leaves the phase untouched.
    pub fn begin(&mut self, board_ids: &[BoardId]) -> Result<(), ApiError> {
        if board_ids.is_empty() {
            return Err(ApiError::invalid_argument(
                "at least one job board must be selected",
            ));
        }
        self.phase = ScrapePhase::Submitting;
        Ok(())
    }

    /// Records the task returned by the submission and applies its initial status.
    pub fn submitted(&mut self, task: ScrapeTask) -> PollStep {
        if self.phase != ScrapePhase::Submitting {
            return PollStep::Ignored;
        }
        self.phase = ScrapePhase::Polling {
            task: task.clone(),
            consecutive_failures: 0,
        };
        self.observe(task)
    }

    /// The submission was refused or never reached the backend; no task exists.
    pub fn submit_failed(&mut self, error: ApiError) {
        if self.phase == ScrapePhase::Submitting {
            self.phase = ScrapePhase::Failed {
                task_id: None,
                error: Some(error),
            };
        }
    }

    /// Applies a status poll response.
    pub fn observe(&mut self, update: ScrapeTask) -> PollStep {
        let ScrapePhase::Polling { task, .. } = &self.phase else {
            return PollStep::Ignored;
        };
        if task.task_id != update.task_id {
            return PollStep::Ignored;
        }
        let task_id = update.task_id;
        match update.status {
            TaskStatus::Pending | TaskStatus::Running => {
                self.phase = ScrapePhase::Polling {
                    task: update,
                    consecutive_failures: 0,
                };
                PollStep::Continue {
                    delay: self.policy.interval,
                }
            }
            TaskStatus::Completed => {
                self.phase = ScrapePhase::Completed(update);
                PollStep::Completed(task_id)
            }
            TaskStatus::Failed => {
                self.phase = ScrapePhase::Failed {
                    task_id: Some(task_id),
                    error: None,
                };
                PollStep::Failed(task_id)
            }
        }
    }

    /// Applies a failed status poll: transient errors back off, anything else stops polling.
    pub fn poll_failed(&mut self, task_id: TaskId, error: ApiError) -> PollStep {
        let ScrapePhase::Polling {
            task,
            consecutive_failures,
        } = &mut self.phase
        else {
            return PollStep::Ignored;
        };
        if task.task_id != task_id {
            return PollStep::Ignored;
        }

        *consecutive_failures += 1;
        let failures = *consecutive_failures;
        if error.is_transient() && failures < self.policy.max_consecutive_failures {
            return PollStep::Continue {
                delay: self.policy.delay_after(failures),
            };
        }

        self.phase = ScrapePhase::Failed {
            task_id: Some(task_id),
            error: Some(error.clone()),
        };
        PollStep::Abandoned { task_id, error }
    }

    pub fn reset(&mut self) {
        self.phase = ScrapePhase::Idle;
    }
}
