//! PetroMatch core: pure scan/match orchestration state machine and view-model helpers.
mod effect;
mod error;
mod msg;
mod orchestration;
mod reconcile;
mod scrape;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::{Effect, Event, Notice, NoticeLevel};
pub use error::{ApiError, FailureKind};
pub use msg::Msg;
pub use orchestration::{MatchPhase, OrchestrationState};
pub use reconcile::{reconcile, ResultsView};
pub use scrape::{PollPolicy, PollStep, ScrapeController, ScrapePhase};
pub use state::{DashboardSettings, DashboardState, MatchStart};
pub use types::{
    timestamp, BoardId, Epoch, JobBoard, JobListing, ListingId, MatchId, MatchResult, ScoreBand,
    ScrapeTask, TaskId, TaskStatus,
};
pub use update::update;
pub use view_model::{DashboardView, ScanView};
