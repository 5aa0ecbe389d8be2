#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use petromatch_core::{
    ApiError, BoardId, Event, JobBoard, JobListing, MatchResult, ScrapeTask, TaskId, TaskStatus,
};
use petromatch_engine::{EventStream, TaskClient};

pub fn listing(id: u64) -> JobListing {
    JobListing {
        id,
        title: format!("Subsea Engineer {id}"),
        company: "Orion Offshore".to_string(),
        location: "Aberdeen".to_string(),
        url: format!("https://jobs.example.com/{id}"),
        description: "Subsea pipeline commissioning".to_string(),
    }
}

pub fn match_result(id: u64, score: f64) -> MatchResult {
    MatchResult {
        id,
        listing: listing(1000 + id),
        score,
        matched_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
    }
}

/// In-memory backend with scripted responses and call recording.
#[derive(Default)]
pub struct ScriptedClient {
    next_task_ids: Mutex<VecDeque<TaskId>>,
    statuses: Mutex<HashMap<TaskId, VecDeque<TaskStatus>>>,
    status_delays: Mutex<HashMap<TaskId, Duration>>,
    listings: Mutex<HashMap<TaskId, Vec<JobListing>>>,
    matches: Mutex<HashMap<TaskId, Vec<MatchResult>>>,
    matches_after_trigger: Mutex<HashMap<TaskId, Vec<MatchResult>>>,
    match_delay: Mutex<Duration>,
    trigger_error: Mutex<Option<ApiError>>,
    pub submitted: Mutex<Vec<Vec<BoardId>>>,
    pub status_calls: Mutex<Vec<TaskId>>,
    pub raw_calls: Mutex<Vec<TaskId>>,
    pub match_calls: Mutex<Vec<TaskId>>,
    pub triggers: Mutex<Vec<TaskId>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next submission returns `task_id`; status polls walk through `statuses`,
    /// repeating the last one.
    pub fn with_task(self, task_id: TaskId, statuses: &[TaskStatus]) -> Self {
        self.next_task_ids.lock().unwrap().push_back(task_id);
        self.statuses
            .lock()
            .unwrap()
            .insert(task_id, statuses.iter().copied().collect());
        self
    }

    pub fn with_status_delay(self, task_id: TaskId, delay: Duration) -> Self {
        self.status_delays.lock().unwrap().insert(task_id, delay);
        self
    }

    pub fn with_listings(self, task_id: TaskId, count: u64) -> Self {
        let listings = (1..=count).map(listing).collect();
        self.listings.lock().unwrap().insert(task_id, listings);
        self
    }

    pub fn with_matches(self, task_id: TaskId, matches: Vec<MatchResult>) -> Self {
        self.matches.lock().unwrap().insert(task_id, matches);
        self
    }

    pub fn with_matches_after_trigger(self, task_id: TaskId, matches: Vec<MatchResult>) -> Self {
        self.matches_after_trigger
            .lock()
            .unwrap()
            .insert(task_id, matches);
        self
    }

    pub fn with_match_delay(self, delay: Duration) -> Self {
        *self.match_delay.lock().unwrap() = delay;
        self
    }

    pub fn failing_trigger(self, error: ApiError) -> Self {
        *self.trigger_error.lock().unwrap() = Some(error);
        self
    }

    pub fn status_calls_for(&self, task_id: TaskId) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == task_id)
            .count()
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.lock().unwrap().len()
    }

    fn task(task_id: TaskId, status: TaskStatus) -> ScrapeTask {
        ScrapeTask {
            task_id,
            status,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }
}

#[async_trait::async_trait]
impl TaskClient for ScriptedClient {
    async fn list_boards(&self) -> Result<Vec<JobBoard>, ApiError> {
        Ok(vec![JobBoard {
            id: 1,
            name: "Rigzone".to_string(),
            login_required: false,
            base_url: "https://www.rigzone.com".to_string(),
        }])
    }

    async fn submit_scrape(&self, board_ids: &[BoardId]) -> Result<ScrapeTask, ApiError> {
        if board_ids.is_empty() {
            return Err(ApiError::invalid_argument("no boards"));
        }
        self.submitted.lock().unwrap().push(board_ids.to_vec());
        let task_id = self
            .next_task_ids
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::server_fault(500, "no scripted task"))?;
        Ok(Self::task(task_id, TaskStatus::Pending))
    }

    async fn get_task_status(&self, task_id: TaskId) -> Result<ScrapeTask, ApiError> {
        self.status_calls.lock().unwrap().push(task_id);
        let delay = self.status_delays.lock().unwrap().get(&task_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let status = {
            let mut statuses = self.statuses.lock().unwrap();
            let script = statuses
                .get_mut(&task_id)
                .ok_or_else(|| ApiError::rejected(404, "Task not found"))?;
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            }
        };
        status
            .map(|status| Self::task(task_id, status))
            .ok_or_else(|| ApiError::server_fault(500, "empty status script"))
    }

    async fn get_raw_results(&self, task_id: TaskId) -> Result<Vec<JobListing>, ApiError> {
        self.raw_calls.lock().unwrap().push(task_id);
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(&task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_matches(&self, task_id: TaskId) -> Result<Vec<MatchResult>, ApiError> {
        self.match_calls.lock().unwrap().push(task_id);
        let delay = *self.match_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let triggered = self.triggers.lock().unwrap().contains(&task_id);
        let source = if triggered {
            &self.matches_after_trigger
        } else {
            &self.matches
        };
        Ok(source
            .lock()
            .unwrap()
            .get(&task_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn trigger_match(&self, task_id: TaskId) -> Result<(), ApiError> {
        self.triggers.lock().unwrap().push(task_id);
        match self.trigger_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Collects events until `done` matches one, failing after a generous timeout.
pub async fn wait_for(events: &mut EventStream, done: impl Fn(&Event) -> bool) -> Vec<Event> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(300), events.next())
            .await
            .expect("timed out waiting for event")
            .expect("event stream closed");
        let finished = done(&event);
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

/// Drains whatever events are already queued.
pub fn drain(events: &mut EventStream) -> Vec<Event> {
    std::iter::from_fn(|| events.try_next()).collect()
}
