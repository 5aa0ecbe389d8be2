use std::collections::BTreeSet;

use crate::{JobListing, MatchResult, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPhase {
    /// No active task.
    #[default]
    Idle,
    /// Task is active but matching waits for the scrape to complete.
    AwaitingScan,
    Checking,
    Triggering,
    /// Trigger accepted; waiting out the settle delay before the follow-up fetch.
    Settling,
    Settled,
    Failed,
}

impl MatchPhase {
    pub fn is_loading(self) -> bool {
        matches!(
            self,
            MatchPhase::Checking | MatchPhase::Triggering | MatchPhase::Settling
        )
    }
}

/// Client-side orchestration state for the active task.
///
/// `triggered` outlives task switches: once a task id is in it, automatic
/// matching is never requested again for that id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrchestrationState {
    active_task_id: Option<TaskId>,
    triggered: BTreeSet<TaskId>,
    listings: Vec<JobListing>,
    matches: Vec<MatchResult>,
    matching: MatchPhase,
}

impl OrchestrationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_task_id(&self) -> Option<TaskId> {
        self.active_task_id
    }

    pub fn listings(&self) -> &[JobListing] {
        &self.listings
    }

    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    pub fn matching(&self) -> MatchPhase {
        self.matching
    }

    pub fn has_triggered(&self, task_id: TaskId) -> bool {
        self.triggered.contains(&task_id)
    }

    pub fn triggered_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.triggered.iter().copied()
    }

    /// Makes `task_id` the active task, dropping the previous task's results.
    pub fn activate(&mut self, task_id: TaskId) {
        self.active_task_id = Some(task_id);
        self.listings.clear();
        self.matches.clear();
        self.matching = MatchPhase::Idle;
    }

    pub fn deactivate(&mut self) {
        self.active_task_id = None;
        self.listings.clear();
        self.matches.clear();
        self.matching = MatchPhase::Idle;
    }

    /// Marks `task_id` as triggered. Returns `false` if it already was.
    pub fn claim_trigger(&mut self, task_id: TaskId) -> bool {
        self.triggered.insert(task_id)
    }

    pub(crate) fn set_matching(&mut self, phase: MatchPhase) {
        self.matching = phase;
    }

    pub(crate) fn set_listings(&mut self, listings: Vec<JobListing>) {
        self.listings = listings;
    }

    pub(crate) fn set_matches(&mut self, matches: Vec<MatchResult>) {
        self.matches = matches;
    }
}
