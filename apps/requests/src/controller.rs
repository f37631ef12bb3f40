//! Lifecycle of the feed: owns the filter state, issues fetches, applies
//! their results and forwards decisions.
//!
//! Every fetch takes a sequence number when it is issued. A response is
//! applied only if its number is still the latest one issued, so an older
//! fetch that resolves late can never overwrite a newer result. In-flight
//! calls are never aborted; teardown and token changes invalidate them
//! instead.

use crate::actor::StationActor;
use crate::dispatcher::{DEFAULT_RETRY_DELAY, Decision, VoteDispatcher};
use crate::domains::Domain;
use crate::error::FeedError;
use crate::fetcher::RequestFetcher;
use crate::filters::{DEFAULT_PAGE_SIZE, FilterChange, FilterState, StatusPreset};
use crate::models::{PaginationSummary, Request};
use crate::notify::Notifier;
use crate::token::TokenId;
use daopad_orbit::RequestStatusCode;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};
use utils::errors::LIST_REQUESTS_FAILED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    /// No token selected.
    #[default]
    Idle,
    Polling,
    TornDown,
}

/// What happened to a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the visible list.
    Applied,
    /// A newer fetch was issued (or the feed was torn down) before the
    /// response arrived; it was dropped.
    Stale,
    /// Nothing was fetched: no token, or the feed is torn down.
    Skipped,
    /// The fetch failed; the previous list is still shown.
    Failed,
}

/// Everything a view needs to render the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub token: Option<TokenId>,
    pub domain: Domain,
    pub filters: FilterState,
    pub requests: Vec<Request>,
    pub pagination: PaginationSummary,
    pub loading: bool,
    pub error: Option<String>,
    pub phase: FeedPhase,
    pub selection: BTreeSet<String>,
}

impl FeedSnapshot {
    pub fn page_count(&self) -> u64 {
        self.pagination.page_count(self.filters.limit())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub page_size: u16,
    /// Periodic refresh while a token is selected. `None` disables it.
    pub refresh_interval: Option<Duration>,
    pub retry_delay: Duration,
    pub send_sort: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval: None,
            retry_delay: DEFAULT_RETRY_DELAY,
            send_sort: true,
        }
    }
}

struct FeedState {
    token: Option<TokenId>,
    domain: Domain,
    filters: FilterState,
    requests: Vec<Request>,
    pagination: PaginationSummary,
    loading: bool,
    error: Option<String>,
    phase: FeedPhase,
    selection: BTreeSet<String>,
    latest_seq: u64,
    timer: Option<JoinHandle<()>>,
}

impl FeedState {
    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            token: self.token.clone(),
            domain: self.domain,
            filters: self.filters.clone(),
            requests: self.requests.clone(),
            pagination: self.pagination,
            loading: self.loading,
            error: self.error.clone(),
            phase: self.phase,
            selection: self.selection.clone(),
        }
    }

    fn clear_results(&mut self) {
        self.requests.clear();
        self.pagination = PaginationSummary::default();
        self.error = None;
        self.loading = false;
        self.selection.clear();
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Inner {
    fetcher: RequestFetcher,
    dispatcher: VoteDispatcher,
    notifier: Arc<dyn Notifier>,
    refresh_interval: Option<Duration>,
    sequence: AtomicU64,
    state: Mutex<FeedState>,
    snapshots: watch::Sender<FeedSnapshot>,
    shutdown: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct FeedController {
    inner: Arc<Inner>,
}

impl FeedController {
    pub fn new(
        actor: Arc<dyn StationActor>,
        notifier: Arc<dyn Notifier>,
        options: ControllerOptions,
    ) -> Result<Self, FeedError> {
        let filters = FilterState::with_page_size(options.page_size)?;
        let (shutdown, shutdown_rx) = watch::channel(false);

        let fetcher = RequestFetcher::new(actor.clone()).with_sort(options.send_sort);
        let dispatcher = VoteDispatcher::new(actor, notifier.clone(), shutdown_rx)
            .with_retry_delay(options.retry_delay);

        let state = FeedState {
            token: None,
            domain: Domain::All,
            filters,
            requests: Vec::new(),
            pagination: PaginationSummary::default(),
            loading: false,
            error: None,
            phase: FeedPhase::Idle,
            selection: BTreeSet::new(),
            latest_seq: 0,
            timer: None,
        };
        let (snapshots, _) = watch::channel(state.snapshot());

        Ok(Self {
            inner: Arc::new(Inner {
                fetcher,
                dispatcher,
                notifier,
                refresh_interval: options.refresh_interval,
                sequence: AtomicU64::new(0),
                state: Mutex::new(state),
                snapshots,
                shutdown,
            }),
        })
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Receives a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.inner.snapshots.subscribe()
    }

    fn publish(&self, state: &FeedState) {
        self.inner.snapshots.send_replace(state.snapshot());
    }

    fn next_seq(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Selects the token whose requests are listed. Selecting a token
    /// starts polling and fetches at once; clearing it empties the feed
    /// without calling the backend.
    #[instrument(skip(self, token), fields(token_id = ?token.as_ref().map(TokenId::as_str)))]
    pub async fn set_token(&self, token: Option<TokenId>) -> FetchOutcome {
        {
            let mut state = self.inner.state.lock().await;
            if state.phase == FeedPhase::TornDown || state.token == token {
                return FetchOutcome::Skipped;
            }

            state.token = token;
            state.clear_results();
            // Whatever is in flight belongs to the previous token.
            state.latest_seq = self.next_seq();

            if state.token.is_none() {
                state.phase = FeedPhase::Idle;
                state.stop_timer();
                info!("Token cleared, feed idle");
                self.publish(&state);
                return FetchOutcome::Skipped;
            }

            state.phase = FeedPhase::Polling;
            if state.timer.is_none() {
                state.timer = self.spawn_refresh_timer();
            }
            self.publish(&state);
        }
        self.fetch().await
    }

    /// Switches domain. Statuses go back to the domain's defaults.
    pub async fn set_domain(&self, domain: Domain) -> FetchOutcome {
        self.mutate(|state| {
            state.domain = domain;
            state.filters.switch_domain(domain);
            Ok(())
        })
        .await
        .unwrap_or(FetchOutcome::Skipped)
    }

    /// Merges a filter change. An invalid change leaves the filters as
    /// they were and nothing is fetched.
    pub async fn apply_filters(&self, change: FilterChange) -> Result<FetchOutcome, FeedError> {
        self.mutate(|state| state.filters.apply(change)).await
    }

    pub async fn set_statuses(
        &self,
        statuses: Vec<RequestStatusCode>,
    ) -> Result<FetchOutcome, FeedError> {
        self.mutate(|state| state.filters.set_statuses(statuses)).await
    }

    pub async fn toggle_status(&self, status: RequestStatusCode) -> Result<FetchOutcome, FeedError> {
        self.mutate(|state| state.filters.toggle_status(status)).await
    }

    pub async fn select_all_statuses(&self) -> FetchOutcome {
        self.mutate(|state| {
            state.filters.select_all_statuses();
            Ok(())
        })
        .await
        .unwrap_or(FetchOutcome::Skipped)
    }

    pub async fn reset_statuses(&self) -> FetchOutcome {
        self.mutate(|state| {
            state.filters.reset_statuses();
            Ok(())
        })
        .await
        .unwrap_or(FetchOutcome::Skipped)
    }

    /// Shows only requests still waiting on a decision or execution.
    pub async fn pending_only(&self) -> FetchOutcome {
        self.apply_preset(StatusPreset::PendingOnly).await
    }

    /// Shows only requests that reached a final status.
    pub async fn resolved_only(&self) -> FetchOutcome {
        self.apply_preset(StatusPreset::ResolvedOnly).await
    }

    pub async fn apply_preset(&self, preset: StatusPreset) -> FetchOutcome {
        self.mutate(|state| {
            state.filters.apply_preset(preset);
            Ok(())
        })
        .await
        .unwrap_or(FetchOutcome::Skipped)
    }

    pub async fn set_page(&self, page: u64) -> FetchOutcome {
        self.mutate(|state| {
            state.filters.set_page(page);
            Ok(())
        })
        .await
        .unwrap_or(FetchOutcome::Skipped)
    }

    /// Moves forward only while the last response reported more requests.
    pub async fn next_page(&self) -> FetchOutcome {
        {
            let mut state = self.inner.state.lock().await;
            if state.phase == FeedPhase::TornDown {
                return FetchOutcome::Skipped;
            }
            let pagination = state.pagination;
            if !state.filters.next_page(&pagination) {
                debug!(page = state.filters.page(), "Already on the last page");
                return FetchOutcome::Skipped;
            }
            self.publish(&state);
        }
        self.fetch().await
    }

    pub async fn previous_page(&self) -> FetchOutcome {
        self.mutate(|state| {
            state.filters.previous_page();
            Ok(())
        })
        .await
        .unwrap_or(FetchOutcome::Skipped)
    }

    /// Fetches again with the current state. Older fetches still in flight
    /// are not cancelled; their responses are dropped.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch().await
    }

    async fn mutate<F>(&self, change: F) -> Result<FetchOutcome, FeedError>
    where
        F: FnOnce(&mut FeedState) -> Result<(), FeedError>,
    {
        {
            let mut state = self.inner.state.lock().await;
            if state.phase == FeedPhase::TornDown {
                return Ok(FetchOutcome::Skipped);
            }
            change(&mut state)?;
            self.publish(&state);
        }
        Ok(self.fetch().await)
    }

    async fn fetch(&self) -> FetchOutcome {
        let (seq, token, domain, filters) = {
            let mut state = self.inner.state.lock().await;
            if state.phase == FeedPhase::TornDown {
                return FetchOutcome::Skipped;
            }
            let Some(token) = state.token.clone() else {
                return FetchOutcome::Skipped;
            };
            let seq = self.next_seq();
            state.latest_seq = seq;
            state.loading = true;
            self.publish(&state);
            (seq, token, state.domain, state.filters.clone())
        };

        debug!(seq, domain = %domain, page = filters.page(), "Issuing fetch");
        let result = self
            .inner
            .fetcher
            .fetch(Some(&token), domain, &filters)
            .await;

        let mut state = self.inner.state.lock().await;
        if state.phase == FeedPhase::TornDown || state.latest_seq != seq {
            debug!(seq, latest = state.latest_seq, "Dropping stale response");
            return FetchOutcome::Stale;
        }

        state.loading = false;
        let outcome = match result {
            Ok(page) => {
                state.requests = page.requests;
                state.pagination = page.pagination;
                state.error = None;
                state.selection.clear();
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch requests");
                state.error = Some(e.to_string());
                self.inner.notifier.error(LIST_REQUESTS_FAILED);
                FetchOutcome::Failed
            }
        };
        self.publish(&state);
        outcome
    }

    /// Votes on or decides a request, then refetches once with whatever
    /// filters are current when the decision lands.
    #[instrument(skip(self, reason))]
    pub async fn decide(
        &self,
        request_id: &str,
        decision: Decision,
        reason: Option<&str>,
    ) -> Result<FetchOutcome, FeedError> {
        let token = {
            let state = self.inner.state.lock().await;
            if state.phase == FeedPhase::TornDown {
                return Err(FeedError::Cancelled);
            }
            state.token.clone().ok_or(FeedError::NoToken)?
        };

        let reason = if decision.is_vote() { None } else { reason };
        match self
            .inner
            .dispatcher
            .dispatch(&token, request_id, decision, reason)
            .await
        {
            Ok(()) => Ok(self.fetch().await),
            Err(FeedError::Cancelled) => Err(FeedError::Cancelled),
            Err(e) => {
                let mut state = self.inner.state.lock().await;
                if state.phase != FeedPhase::TornDown {
                    state.error = Some(e.to_string());
                    self.publish(&state);
                    self.inner.notifier.error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Returns whether the request is selected afterwards.
    pub async fn toggle_selection(&self, request_id: &str) -> bool {
        let mut state = self.inner.state.lock().await;
        let selected = if state.selection.remove(request_id) {
            false
        } else {
            state.selection.insert(request_id.to_string());
            true
        };
        self.publish(&state);
        selected
    }

    /// Selects every visible request still waiting on a decision. Returns
    /// the number selected.
    pub async fn select_all_pending(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let pending: BTreeSet<String> = state
            .requests
            .iter()
            .filter(|r| r.status.is_pending())
            .map(|r| r.id.clone())
            .collect();
        let count = pending.len();
        state.selection = pending;
        self.publish(&state);
        count
    }

    pub async fn clear_selection(&self) {
        let mut state = self.inner.state.lock().await;
        state.selection.clear();
        self.publish(&state);
    }

    /// Stops the feed for good. Timers and pending retry waits are
    /// cancelled; calls already on the wire finish but their results are
    /// ignored.
    pub async fn teardown(&self) {
        let mut state = self.inner.state.lock().await;
        if state.phase == FeedPhase::TornDown {
            return;
        }
        state.phase = FeedPhase::TornDown;
        state.loading = false;
        state.stop_timer();
        self.inner.shutdown.send_replace(true);
        self.publish(&state);
        info!("Feed torn down");
    }

    fn spawn_refresh_timer(&self) -> Option<JoinHandle<()>> {
        let period = self.inner.refresh_interval?;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        info!(period_secs = period.as_secs(), "Starting periodic refresh");

        Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let controller = FeedController { inner };
                // Fetches run on their own task so stopping the timer never
                // aborts one midway.
                tokio::spawn(async move {
                    controller.refresh().await;
                });
            }
        }))
    }
}
