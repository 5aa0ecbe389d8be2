use crate::{JobListing, MatchResult, OrchestrationState};

/// What the results panel shows for the active task.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultsView {
    /// Ranked matches, in backend order. Raw listings are only counted.
    Matches {
        matches: Vec<MatchResult>,
        total_listings: usize,
    },
    /// Raw scrape output; matching has not produced anything yet.
    Listings(Vec<JobListing>),
    #[default]
    Empty,
}

impl ResultsView {
    pub fn len(&self) -> usize {
        match self {
            ResultsView::Matches { matches, .. } => matches.len(),
            ResultsView::Listings(listings) => listings.len(),
            ResultsView::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn label(&self) -> String {
        match self {
            ResultsView::Matches {
                matches,
                total_listings,
            } => format!(
                "Showing top {} AI-matched jobs from {} total jobs found",
                matches.len(),
                total_listings
            ),
            ResultsView::Listings(listings) => format!(
                "{} total jobs from scan (matching has not run yet)",
                listings.len()
            ),
            ResultsView::Empty => "No jobs found yet".to_string(),
        }
    }
}

/// Matches always win over raw listings; raw listings win over nothing.
pub fn reconcile(state: &OrchestrationState) -> ResultsView {
    if !state.matches().is_empty() {
        ResultsView::Matches {
            matches: state.matches().to_vec(),
            total_listings: state.listings().len(),
        }
    } else if !state.listings().is_empty() {
        ResultsView::Listings(state.listings().to_vec())
    } else {
        ResultsView::Empty
    }
}
