use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use petromatch_core::{
    update, ApiError, BoardId, DashboardSettings, DashboardState, DashboardView, Effect, Epoch,
    Event, JobBoard, Msg, NoticeLevel, TaskId,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};

use crate::client::TaskClient;
use crate::scope::{until_cancelled, EpochScope};
use crate::settings::EngineError;

/// Receiving side of the orchestrator's event feed.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventStream {
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

/// Runs the dashboard state machine against a backend.
///
/// Messages go through the pure `update` under a mutex that is never held
/// across an `.await`; the resulting effects are executed here. Every remote
/// activity is bound to the epoch it was started under and stops when that
/// epoch is cancelled. Dropping the orchestrator cancels everything.
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<dyn TaskClient>,
    state: Mutex<DashboardState>,
    scope: Mutex<EpochScope>,
    events: mpsc::UnboundedSender<Event>,
    runtime: Handle,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn TaskClient>,
        settings: DashboardSettings,
    ) -> Result<(Self, EventStream), EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            client,
            state: Mutex::new(DashboardState::with_settings(settings)),
            scope: Mutex::new(EpochScope::new()),
            events,
            runtime,
        });
        Ok((Self { inner }, EventStream { rx }))
    }

    /// Fetches board metadata once and stores it in the dashboard state.
    pub async fn load_boards(&self) -> Result<Vec<JobBoard>, ApiError> {
        let result = self.inner.client.list_boards().await;
        if let Err(err) = &result {
            engine_warn!("Failed to fetch job boards: {}", err);
        }
        self.dispatch(Msg::BoardsLoaded(result.clone()));
        result
    }

    /// Submits a scrape for `board_ids`, replacing any active task.
    ///
    /// Polling and matching continue in the background; progress arrives on
    /// the event stream.
    pub fn start_scan(&self, board_ids: &[BoardId]) -> Result<(), ApiError> {
        self.dispatch(Msg::ScanRequested {
            board_ids: board_ids.to_vec(),
        });
        if board_ids.is_empty() {
            return Err(ApiError::invalid_argument(
                "at least one job board must be selected",
            ));
        }
        Ok(())
    }

    /// Makes an existing task the active one and starts fetching its results.
    pub fn activate(&self, task_id: TaskId) {
        self.dispatch(Msg::TaskActivated { task_id });
    }

    /// Runs the match check for the active task and waits for everything it
    /// sets off (trigger and follow-up fetch) to finish.
    pub async fn check_matches(&self, task_id: TaskId) -> Result<(), ApiError> {
        let epoch = self.epoch_for(task_id)?;
        Arc::clone(&self.inner)
            .drive(vec![Effect::CheckMatches { epoch, task_id }])
            .await;
        Ok(())
    }

    /// Re-fetches the raw listings of the active task and waits for them.
    pub async fn refresh_results(&self) -> Result<(), ApiError> {
        let task_id = self
            .inner
            .state()
            .active_task_id()
            .ok_or_else(|| ApiError::invalid_argument("no active task"))?;
        let epoch = self.epoch_for(task_id)?;
        Arc::clone(&self.inner)
            .drive(vec![Effect::FetchRawResults { epoch, task_id }])
            .await;
        Ok(())
    }

    fn epoch_for(&self, task_id: TaskId) -> Result<Epoch, ApiError> {
        let state = self.inner.state();
        if state.active_task_id() != Some(task_id) {
            return Err(ApiError::invalid_argument(format!(
                "task {task_id} is not the active task"
            )));
        }
        Ok(state.epoch())
    }

    /// Explicit user retry of matching for the active task.
    pub fn find_matches(&self) {
        self.dispatch(Msg::FindMatchesClicked);
    }

    /// Tears down the active task; in-flight responses are discarded.
    pub fn dispose(&self) {
        self.dispatch(Msg::Disposed);
    }

    /// Applies a message and runs its effects in the background.
    pub fn dispatch(&self, msg: Msg) {
        let effects = self.inner.apply(msg);
        let remote = self.inner.run_immediate(effects);
        if !remote.is_empty() {
            let inner = Arc::clone(&self.inner);
            self.inner.runtime.spawn(inner.drive(remote));
        }
    }

    pub fn view(&self) -> DashboardView {
        self.inner.state().view()
    }

    /// The current view if anything changed since the last call.
    pub fn view_if_dirty(&self) -> Option<DashboardView> {
        let mut state = self.inner.state();
        let view = state.view();
        state.consume_dirty().then_some(view)
    }

    pub fn state(&self) -> DashboardState {
        self.inner.state().clone()
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.inner.scope().cancel_all();
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn scope(&self) -> MutexGuard<'_, EpochScope> {
        self.scope.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `update` atomically; no other activity observes a half-applied message.
    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.state();
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg);
        *guard = state;
        effects
    }

    /// Executes synchronous effects in place and returns the ones that need IO.
    fn run_immediate(&self, effects: Vec<Effect>) -> Vec<Effect> {
        effects
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Cancel { epoch } => {
                    engine_debug!("Cancelling activities of epoch {}", epoch);
                    self.scope().cancel(epoch);
                    None
                }
                Effect::Emit(event) => {
                    self.emit(event);
                    None
                }
                remote => Some(remote),
            })
            .collect()
    }

    /// Drives `effects` and every effect they lead to until all have finished.
    async fn drive(self: Arc<Self>, effects: Vec<Effect>) {
        let mut pending: FuturesUnordered<BoxFuture<'static, Vec<Effect>>> =
            FuturesUnordered::new();
        for effect in self.run_immediate(effects) {
            pending.push(Arc::clone(&self).run_remote(effect));
        }
        while let Some(next) = pending.next().await {
            for effect in self.run_immediate(next) {
                pending.push(Arc::clone(&self).run_remote(effect));
            }
        }
    }

    fn run_remote(self: Arc<Self>, effect: Effect) -> BoxFuture<'static, Vec<Effect>> {
        async move {
            let Some(epoch) = effect_epoch(&effect) else {
                return Vec::new();
            };
            let token = self.scope().token_for(epoch);
            let Some(token) = token else {
                engine_debug!("Skipping {:?}: epoch {} is over", effect, epoch);
                return Vec::new();
            };
            let client = Arc::clone(&self.client);

            let msg = match effect {
                Effect::SubmitScrape { epoch, board_ids } => {
                    engine_info!("Submitting scrape for boards {:?}", board_ids);
                    until_cancelled(&token, client.submit_scrape(&board_ids))
                        .await
                        .map(|result| Msg::ScrapeSubmitted { epoch, result })
                }
                Effect::PollStatus {
                    epoch,
                    task_id,
                    delay,
                } => until_cancelled(&token, async {
                    tokio::time::sleep(delay).await;
                    client.get_task_status(task_id).await
                })
                .await
                .map(|result| {
                    match &result {
                        Ok(task) => engine_debug!("Task {} is {}", task_id, task.status),
                        Err(err) => engine_warn!("Status poll for task {} failed: {}", task_id, err),
                    }
                    Msg::StatusPolled {
                        epoch,
                        task_id,
                        result,
                    }
                }),
                Effect::FetchRawResults { epoch, task_id } => {
                    until_cancelled(&token, client.get_raw_results(task_id))
                        .await
                        .map(|result| {
                            if let Err(err) = &result {
                                engine_warn!("Raw results for task {} failed: {}", task_id, err);
                            }
                            Msg::RawResultsLoaded {
                                epoch,
                                task_id,
                                result,
                            }
                        })
                }
                Effect::CheckMatches { epoch, task_id } => {
                    until_cancelled(&token, client.get_matches(task_id))
                        .await
                        .map(|result| {
                            if let Err(err) = &result {
                                engine_debug!(
                                    "Match check for task {} failed, treating as empty: {}",
                                    task_id,
                                    err
                                );
                            }
                            Msg::MatchesChecked {
                                epoch,
                                task_id,
                                result,
                            }
                        })
                }
                Effect::TriggerMatch { epoch, task_id } => {
                    engine_info!("Triggering matching for task {}", task_id);
                    until_cancelled(&token, client.trigger_match(task_id))
                        .await
                        .map(|result| Msg::MatchTriggered {
                            epoch,
                            task_id,
                            result,
                        })
                }
                Effect::FollowUpMatches {
                    epoch,
                    task_id,
                    delay,
                } => until_cancelled(&token, async {
                    tokio::time::sleep(delay).await;
                    client.get_matches(task_id).await
                })
                .await
                .map(|result| Msg::FollowUpLoaded {
                    epoch,
                    task_id,
                    result,
                }),
                Effect::Cancel { .. } | Effect::Emit(_) => None,
            };

            match msg {
                Some(msg) => self.apply(msg),
                None => {
                    engine_debug!("Discarded response for cancelled epoch {}", epoch);
                    Vec::new()
                }
            }
        }
        .boxed()
    }

    fn emit(&self, event: Event) {
        match &event {
            Event::Notice(notice) => match notice.level {
                NoticeLevel::Info | NoticeLevel::Success => engine_info!("{}", notice.text),
                NoticeLevel::Warning => engine_warn!("{}", notice.text),
                NoticeLevel::Error => engine_error!("{}", notice.text),
            },
            other => engine_debug!("Event {:?}", other),
        }
        // The receiver may be gone when the UI has shut down.
        let _ = self.events.send(event);
    }
}

fn effect_epoch(effect: &Effect) -> Option<Epoch> {
    match effect {
        Effect::SubmitScrape { epoch, .. }
        | Effect::PollStatus { epoch, .. }
        | Effect::FetchRawResults { epoch, .. }
        | Effect::CheckMatches { epoch, .. }
        | Effect::TriggerMatch { epoch, .. }
        | Effect::FollowUpMatches { epoch, .. } => Some(*epoch),
        Effect::Cancel { .. } | Effect::Emit(_) => None,
    }
}
