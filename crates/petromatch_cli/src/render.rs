//! Plain-text rendering of the dashboard view.

use petromatch_core::{
    DashboardView, Event, JobBoard, JobListing, MatchPhase, MatchResult, Notice, NoticeLevel,
    ResultsView, ScanView,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub fn boards(boards: &[JobBoard]) -> Vec<String> {
    if boards.is_empty() {
        return vec!["No job boards configured".to_string()];
    }
    let mut lines = vec![format!("{:<6} {:<32} {}", "ID", "Board", "URL")];
    lines.extend(boards.iter().map(|board| {
        let login = if board.login_required {
            " (login required)"
        } else {
            ""
        };
        format!("{:<6} {:<32} {}{}", board.id, board.name, board.base_url, login)
    }));
    lines
}

pub fn dashboard(view: &DashboardView) -> Vec<String> {
    let mut lines = vec![scan_line(&view.scan)];
    if let Some(line) = matching_line(view) {
        lines.push(line);
    }
    lines.push(String::new());
    lines.push(view.results.label());

    match &view.results {
        ResultsView::Matches { matches, .. } => {
            lines.extend(matches.iter().enumerate().flat_map(|(rank, m)| match_lines(rank, m)));
        }
        ResultsView::Listings(listings) => lines.extend(listings.iter().map(listing_line)),
        ResultsView::Empty => {}
    }
    lines
}

/// One-line progress output for an event, if it warrants one.
pub fn event(event: &Event) -> Option<String> {
    match event {
        Event::Notice(Notice { level, text }) => {
            let tag = match level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Warning => "warn",
                NoticeLevel::Error => "error",
            };
            Some(format!("[{tag}] {text}"))
        }
        // Scan and matching outcomes already arrive as notices.
        _ => None,
    }
}

fn scan_line(scan: &ScanView) -> String {
    match scan {
        ScanView::Idle => "Scan: none".to_string(),
        ScanView::Submitting => "Scan: submitting".to_string(),
        ScanView::Running {
            task_id,
            status,
            started,
        } => format!(
            "Scan: task {task_id} {status} (started {})",
            started.format(TIME_FORMAT)
        ),
        ScanView::Completed { task_id, started } => format!(
            "Scan: task {task_id} completed (started {})",
            started.format(TIME_FORMAT)
        ),
        ScanView::Failed { task_id, reason } => {
            let subject = task_id.map_or_else(|| "submission".to_string(), |id| format!("task {id}"));
            match reason {
                Some(reason) => format!("Scan: {subject} failed: {reason}"),
                None => format!("Scan: {subject} failed"),
            }
        }
    }
}

fn matching_line(view: &DashboardView) -> Option<String> {
    let line = match view.matching {
        MatchPhase::Idle | MatchPhase::Settled => return None,
        MatchPhase::AwaitingScan => "Matching: waiting for the scan to finish",
        MatchPhase::Checking => "Matching: checking for existing matches",
        MatchPhase::Triggering => "Matching: starting",
        MatchPhase::Settling => "Matching: in progress",
        MatchPhase::Failed => "Matching: failed to start; run `matches <task-id>` to retry",
    };
    Some(line.to_string())
}

fn match_lines(rank: usize, result: &MatchResult) -> [String; 2] {
    let listing = &result.listing;
    [
        format!(
            "{:>3}. {:>3}% {:<6} {} at {} ({})",
            rank + 1,
            result.percent(),
            result.band(),
            listing.title,
            listing.company,
            listing.location
        ),
        format!("     {}", listing.url),
    ]
}

fn listing_line(listing: &JobListing) -> String {
    format!(
        "  - {} at {} ({})",
        listing.title, listing.company, listing.location
    )
}
