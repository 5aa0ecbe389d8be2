use chrono::{TimeZone, Utc};
use petromatch_core::{
    reconcile, update, DashboardState, JobListing, MatchResult, Msg, OrchestrationState,
    ResultsView, ScoreBand,
};

fn listing(id: u64) -> JobListing {
    JobListing {
        id,
        title: format!("Process Engineer {id}"),
        company: "Gulf Petroleum".to_string(),
        location: "Houston".to_string(),
        url: format!("https://jobs.example.com/{id}"),
        description: "Refinery process optimisation".to_string(),
    }
}

fn match_result(id: u64, score: f64) -> MatchResult {
    MatchResult {
        id,
        listing: listing(id),
        score,
        matched_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
    }
}

fn state_with(listings: Vec<JobListing>, matches: Vec<MatchResult>) -> DashboardState {
    let (state, _) = update(DashboardState::new(), Msg::TaskActivated { task_id: 1 });
    let epoch = state.epoch();
    let (state, _) = update(
        state,
        Msg::RawResultsLoaded {
            epoch,
            task_id: 1,
            result: Ok(listings),
        },
    );
    let (state, _) = update(
        state,
        Msg::MatchesChecked {
            epoch,
            task_id: 1,
            result: Ok(matches),
        },
    );
    state
}

#[test]
fn matches_take_precedence_over_listings() {
    let m1 = match_result(1, 0.85);
    let state = state_with(vec![listing(1), listing(2)], vec![m1.clone()]);

    assert_eq!(
        reconcile(state.orchestration()),
        ResultsView::Matches {
            matches: vec![m1],
            total_listings: 2,
        }
    );
}

#[test]
fn listings_shown_when_no_matches() {
    let state = state_with(vec![listing(1), listing(2)], Vec::new());
    let view = reconcile(state.orchestration());

    assert_eq!(view, ResultsView::Listings(vec![listing(1), listing(2)]));
    assert!(view.label().contains("matching has not run yet"));
}

#[test]
fn empty_state_when_nothing_arrived() {
    assert_eq!(reconcile(&OrchestrationState::new()), ResultsView::Empty);
    assert!(ResultsView::Empty.is_empty());
}

#[test]
fn backend_order_is_preserved() {
    let unsorted = vec![
        match_result(1, 0.4),
        match_result(2, 0.95),
        match_result(3, 0.6),
    ];
    let state = state_with(Vec::new(), unsorted.clone());

    match reconcile(state.orchestration()) {
        ResultsView::Matches { matches, .. } => assert_eq!(matches, unsorted),
        other => panic!("unexpected view {other:?}"),
    }
}

#[test]
fn score_bands_and_percentages() {
    assert_eq!(match_result(1, 0.8).band(), ScoreBand::High);
    assert_eq!(match_result(1, 0.6).band(), ScoreBand::Medium);
    assert_eq!(match_result(1, 0.59).band(), ScoreBand::Low);
    assert_eq!(match_result(1, 0.875).percent(), 88);
    assert_eq!(
        ResultsView::Matches {
            matches: vec![match_result(1, 0.9)],
            total_listings: 5,
        }
        .label(),
        "Showing top 1 AI-matched jobs from 5 total jobs found"
    );
}
