use crate::{ApiError, BoardId, Epoch, JobBoard, JobListing, MatchResult, ScrapeTask, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Board metadata fetched once at startup.
    BoardsLoaded(Result<Vec<JobBoard>, ApiError>),
    /// User asked to scan the given boards.
    ScanRequested { board_ids: Vec<BoardId> },
    /// Response to the scrape submission.
    ScrapeSubmitted {
        epoch: Epoch,
        result: Result<ScrapeTask, ApiError>,
    },
    /// Response to one status poll.
    StatusPolled {
        epoch: Epoch,
        task_id: TaskId,
        result: Result<ScrapeTask, ApiError>,
    },
    /// A task id was handed to the dashboard from outside (e.g. reopening an earlier scan).
    TaskActivated { task_id: TaskId },
    RawResultsLoaded {
        epoch: Epoch,
        task_id: TaskId,
        result: Result<Vec<JobListing>, ApiError>,
    },
    /// Response to the existing-matches check.
    MatchesChecked {
        epoch: Epoch,
        task_id: TaskId,
        result: Result<Vec<MatchResult>, ApiError>,
    },
    MatchTriggered {
        epoch: Epoch,
        task_id: TaskId,
        result: Result<(), ApiError>,
    },
    /// The single follow-up fetch issued after the settle delay.
    FollowUpLoaded {
        epoch: Epoch,
        task_id: TaskId,
        result: Result<Vec<MatchResult>, ApiError>,
    },
    /// User clicked "Find Matches".
    FindMatchesClicked,
    /// Owning view was torn down.
    Disposed,
    NoOp,
}
