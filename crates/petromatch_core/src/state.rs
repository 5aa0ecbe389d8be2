use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::orchestration::MatchPhase;
use crate::reconcile::reconcile;
use crate::view_model::{DashboardView, ScanView};
use crate::{
    Epoch, JobBoard, JobListing, MatchResult, OrchestrationState, PollPolicy, ScrapeController,
    ScrapePhase, TaskId,
};

/// When the match check runs relative to the scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStart {
    /// As soon as the task id is known, concurrently with status polling.
    #[default]
    OnSubmit,
    /// Only once the scrape reports `completed`.
    OnCompletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub poll: PollPolicy,
    /// Wait between a successful trigger and the single follow-up match fetch.
    pub settle_delay: Duration,
    pub match_start: MatchStart,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            settle_delay: Duration::from_secs(2),
            match_start: MatchStart::OnSubmit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    settings: DashboardSettings,
    epoch: Epoch,
    scrape: ScrapeController,
    orchestration: OrchestrationState,
    boards: Vec<JobBoard>,
    dirty: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::with_settings(DashboardSettings::default())
    }

    pub fn with_settings(settings: DashboardSettings) -> Self {
        Self {
            settings,
            epoch: Epoch::default(),
            scrape: ScrapeController::new(settings.poll),
            orchestration: OrchestrationState::new(),
            boards: Vec::new(),
            dirty: false,
        }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn scrape_phase(&self) -> &ScrapePhase {
        self.scrape.phase()
    }

    pub fn orchestration(&self) -> &OrchestrationState {
        &self.orchestration
    }

    pub fn boards(&self) -> &[JobBoard] {
        &self.boards
    }

    pub fn active_task_id(&self) -> Option<TaskId> {
        self.orchestration.active_task_id()
    }

    /// True when a response requested under `epoch` for `task_id` may still be applied.
    pub fn is_current(&self, epoch: Epoch, task_id: TaskId) -> bool {
        self.epoch == epoch && self.orchestration.active_task_id() == Some(task_id)
    }

    pub fn view(&self) -> DashboardView {
        let orchestration = &self.orchestration;
        DashboardView {
            scan: ScanView::from_phase(self.scrape.phase()),
            active_task_id: orchestration.active_task_id(),
            results: reconcile(orchestration),
            matching: orchestration.matching(),
            loading: orchestration.matching().is_loading(),
            can_find_matches: self.can_find_matches(),
            boards: self.boards.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn can_find_matches(&self) -> bool {
        self.orchestration.active_task_id().is_some()
            && self.orchestration.matches().is_empty()
            && !self.orchestration.matching().is_loading()
    }

    /// Starts a new epoch, returning the one it replaced.
    pub(crate) fn advance_epoch(&mut self) -> Epoch {
        let previous = self.epoch;
        self.epoch = previous.next();
        previous
    }

    pub(crate) fn scrape_mut(&mut self) -> &mut ScrapeController {
        &mut self.scrape
    }

    pub(crate) fn orchestration_mut(&mut self) -> &mut OrchestrationState {
        &mut self.orchestration
    }

    pub(crate) fn set_boards(&mut self, boards: Vec<JobBoard>) {
        self.boards = boards;
    }

    pub(crate) fn set_listings(&mut self, listings: Vec<JobListing>) {
        self.orchestration.set_listings(listings);
    }

    pub(crate) fn set_matches(&mut self, matches: Vec<MatchResult>) {
        self.orchestration.set_matches(matches);
    }

    pub(crate) fn set_matching(&mut self, phase: MatchPhase) {
        self.orchestration.set_matching(phase);
    }
}
