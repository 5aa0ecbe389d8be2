use crate::{
    ApiError, BoardId, DashboardState, Effect, Epoch, Event, MatchPhase, MatchResult, MatchStart,
    Msg, Notice, PollStep, TaskId,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every remote response is checked against the current epoch and active task
/// first; anything requested for a task that has since been replaced or
/// disposed is dropped without touching state.
pub fn update(mut state: DashboardState, msg: Msg) -> (DashboardState, Vec<Effect>) {
    let effects = match msg {
        Msg::BoardsLoaded(Ok(boards)) => {
            state.set_boards(boards);
            state.mark_dirty();
            Vec::new()
        }
        Msg::BoardsLoaded(Err(err)) => vec![notice(Notice::error(format!(
            "Failed to fetch job boards: {err}"
        )))],
        Msg::ScanRequested { board_ids } => scan_requested(&mut state, board_ids),
        Msg::ScrapeSubmitted { epoch, result } => {
            if epoch != state.epoch() {
                return (state, Vec::new());
            }
            match result {
                Ok(task) => {
                    let task_id = task.task_id;
                    let step = state.scrape_mut().submitted(task);
                    if step == PollStep::Ignored {
                        return (state, Vec::new());
                    }
                    state.orchestration_mut().activate(task_id);
                    state.mark_dirty();

                    let mut effects = vec![
                        Effect::Emit(Event::ScanStarted { task_id }),
                        notice(Notice::success(format!(
                            "Job scan started! Task ID: {task_id}"
                        ))),
                    ];
                    let match_start = state.settings().match_start;
                    match match_start {
                        MatchStart::OnSubmit => {
                            effects.extend(begin_matching(&mut state, epoch, task_id));
                        }
                        MatchStart::OnCompletion => state.set_matching(MatchPhase::AwaitingScan),
                    }
                    // Listings were just requested; completion needs no second fetch.
                    let refresh = match_start == MatchStart::OnCompletion;
                    effects.extend(poll_step(&mut state, epoch, step, refresh));
                    effects
                }
                Err(err) => {
                    let notice_text = format!("Failed to start scan: {err}");
                    state.scrape_mut().submit_failed(err);
                    state.mark_dirty();
                    vec![
                        Effect::Emit(Event::ScanFailed { task_id: None }),
                        notice(Notice::error(notice_text)),
                    ]
                }
            }
        }
        Msg::StatusPolled {
            epoch,
            task_id,
            result,
        } => {
            if !state.is_current(epoch, task_id) {
                return (state, Vec::new());
            }
            let step = match result {
                Ok(task) => state.scrape_mut().observe(task),
                Err(err) => state.scrape_mut().poll_failed(task_id, err),
            };
            poll_step(&mut state, epoch, step, true)
        }
        Msg::TaskActivated { task_id } => {
            if state.active_task_id() == Some(task_id) {
                return (state, Vec::new());
            }
            let previous = state.advance_epoch();
            if state.scrape_phase().task_id() != Some(task_id) {
                state.scrape_mut().reset();
            }
            state.orchestration_mut().activate(task_id);
            state.mark_dirty();

            let epoch = state.epoch();
            let mut effects = vec![Effect::Cancel { epoch: previous }];
            effects.extend(begin_matching(&mut state, epoch, task_id));
            effects
        }
        Msg::RawResultsLoaded {
            epoch,
            task_id,
            result,
        } => {
            if !state.is_current(epoch, task_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(listings) => {
                    state.set_listings(listings);
                    state.mark_dirty();
                    Vec::new()
                }
                Err(err) => vec![notice(Notice::warning(format!(
                    "Failed to fetch job results: {err}"
                )))],
            }
        }
        Msg::MatchesChecked {
            epoch,
            task_id,
            result,
        } => {
            if !state.is_current(epoch, task_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(matches) if !matches.is_empty() => {
                    // Existing matches satisfy the task just like a trigger would.
                    state.orchestration_mut().claim_trigger(task_id);
                    adopt_matches(&mut state, task_id, matches)
                }
                // Empty or failed check: trigger, guarded by the idempotency mark.
                other => {
                    if state.orchestration_mut().claim_trigger(task_id) {
                        state.set_matching(MatchPhase::Triggering);
                        state.mark_dirty();
                        return (state, vec![Effect::TriggerMatch { epoch, task_id }]);
                    }
                    // Triggered earlier. A trigger already in flight settles on its own;
                    // otherwise this check is the last word until the user retries.
                    if state.orchestration().matching() != MatchPhase::Checking {
                        return (state, Vec::new());
                    }
                    adopt_matches(&mut state, task_id, other.unwrap_or_default())
                }
            }
        }
        Msg::MatchTriggered {
            epoch,
            task_id,
            result,
        } => {
            if !state.is_current(epoch, task_id) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.set_matching(MatchPhase::Settling);
                    vec![
                        notice(Notice::success("Matching started!")),
                        Effect::FollowUpMatches {
                            epoch,
                            task_id,
                            delay: state.settings().settle_delay,
                        },
                    ]
                }
                Err(err) => {
                    // The mark stays set; only an explicit user action retries.
                    state.set_matching(MatchPhase::Failed);
                    let failure = ApiError::match_trigger_failed(task_id, &err);
                    vec![
                        Effect::Emit(Event::MatchingFailed { task_id }),
                        notice(Notice::error(format!("Failed to start matching: {failure}"))),
                    ]
                }
            }
        }
        Msg::FollowUpLoaded {
            epoch,
            task_id,
            result,
        } => {
            if !state.is_current(epoch, task_id) {
                return (state, Vec::new());
            }
            match result {
                Ok(matches) => adopt_matches(&mut state, task_id, matches),
                Err(_) => {
                    state.set_matching(MatchPhase::Settled);
                    state.mark_dirty();
                    let match_count = state.orchestration().matches().len();
                    vec![Effect::Emit(Event::MatchingSettled {
                        task_id,
                        match_count,
                    })]
                }
            }
        }
        Msg::FindMatchesClicked => {
            let Some(task_id) = state.active_task_id() else {
                return (state, Vec::new());
            };
            if !state.can_find_matches() {
                return (state, Vec::new());
            }
            state.orchestration_mut().claim_trigger(task_id);
            state.set_matching(MatchPhase::Triggering);
            state.mark_dirty();
            vec![Effect::TriggerMatch {
                epoch: state.epoch(),
                task_id,
            }]
        }
        Msg::Disposed => {
            let previous = state.advance_epoch();
            state.scrape_mut().reset();
            state.orchestration_mut().deactivate();
            state.mark_dirty();
            vec![Effect::Cancel { epoch: previous }]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn scan_requested(state: &mut DashboardState, mut board_ids: Vec<BoardId>) -> Vec<Effect> {
    board_ids.sort_unstable();
    board_ids.dedup();
    if state.scrape_mut().begin(&board_ids).is_err() {
        return vec![notice(Notice::error("Please select at least one job board"))];
    }

    // A new scan overrides whatever task was active.
    let previous = state.advance_epoch();
    state.orchestration_mut().deactivate();
    state.mark_dirty();
    vec![
        Effect::Cancel { epoch: previous },
        Effect::SubmitScrape {
            epoch: state.epoch(),
            board_ids,
        },
    ]
}

fn begin_matching(state: &mut DashboardState, epoch: Epoch, task_id: TaskId) -> Vec<Effect> {
    state.set_matching(MatchPhase::Checking);
    vec![
        Effect::FetchRawResults { epoch, task_id },
        Effect::CheckMatches { epoch, task_id },
    ]
}

fn poll_step(
    state: &mut DashboardState,
    epoch: Epoch,
    step: PollStep,
    refresh_on_completion: bool,
) -> Vec<Effect> {
    match step {
        PollStep::Continue { delay } => {
            state.mark_dirty();
            match state.scrape_phase().task_id() {
                Some(task_id) => vec![Effect::PollStatus {
                    epoch,
                    task_id,
                    delay,
                }],
                None => Vec::new(),
            }
        }
        PollStep::Completed(task_id) => {
            state.mark_dirty();
            let mut effects = vec![
                Effect::Emit(Event::ScanCompleted { task_id }),
                notice(Notice::success("Job scan completed!")),
            ];
            match state.settings().match_start {
                MatchStart::OnCompletion => {
                    effects.extend(begin_matching(state, epoch, task_id));
                }
                MatchStart::OnSubmit if refresh_on_completion => {
                    effects.push(Effect::FetchRawResults { epoch, task_id });
                }
                MatchStart::OnSubmit => {}
            }
            effects
        }
        PollStep::Failed(task_id) => {
            state.mark_dirty();
            if state.orchestration().matching() == MatchPhase::AwaitingScan {
                state.set_matching(MatchPhase::Idle);
            }
            vec![
                Effect::Emit(Event::ScanFailed {
                    task_id: Some(task_id),
                }),
                notice(Notice::error("Job scan failed")),
            ]
        }
        PollStep::Abandoned { task_id, error } => {
            state.mark_dirty();
            if state.orchestration().matching() == MatchPhase::AwaitingScan {
                state.set_matching(MatchPhase::Idle);
            }
            vec![
                Effect::Emit(Event::ScanFailed {
                    task_id: Some(task_id),
                }),
                notice(Notice::error(format!(
                    "Stopped checking scan {task_id}: {error}"
                ))),
            ]
        }
        PollStep::Ignored => Vec::new(),
    }
}

fn adopt_matches(
    state: &mut DashboardState,
    task_id: TaskId,
    matches: Vec<MatchResult>,
) -> Vec<Effect> {
    let match_count = matches.len();
    state.set_matches(matches);
    state.set_matching(MatchPhase::Settled);
    state.mark_dirty();
    vec![Effect::Emit(Event::MatchingSettled {
        task_id,
        match_count,
    })]
}

fn notice(notice: Notice) -> Effect {
    Effect::Emit(Event::Notice(notice))
}
