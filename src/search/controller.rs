use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{watch, Mutex};

use crate::recipes::{Recipe, RecipeSource};
use super::debounce::Debouncer;

/// Quiet period a typing burst must observe before a debounced search fires.
pub const DEBOUNCE_QUIET_PERIOD: Duration = Duration::from_millis(700);

/// The one user-facing failure message; internals stay in the log.
pub const SEARCH_ERROR_MESSAGE: &str =
    "Oops! Couldn't load recipes. Check your connection or try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Nothing searched yet; the display shows suggestions.
    Idle,
    Loading,
    Success,
    /// A search resolved with no results; distinct from Idle in display.
    Empty,
    Error,
}

/// Renderable copy of the controller state.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub query: String,
    pub phase: SearchPhase,
    pub results: Vec<Recipe>,
    pub has_searched: bool,
    pub error: Option<String>,
}

impl Default for SearchSnapshot {
    fn default() -> Self {
        Self {
            query: String::new(),
            phase: SearchPhase::Idle,
            results: Vec::new(),
            has_searched: false,
            error: None,
        }
    }
}

struct ControllerState {
    query: String,
    phase: SearchPhase,
    results: Vec<Recipe>,
    has_searched: bool,
    error: Option<String>,
    debounce: Debouncer,
}

struct Inner<S> {
    source: Arc<S>,
    state: Mutex<ControllerState>,
    updates: watch::Sender<SearchSnapshot>,
    // Monotonically increasing request token; only the request holding the
    // newest token may commit its resolution.
    latest: AtomicU64,
    quiet_period: Duration,
}

/// Owns the search text and request lifecycle: debounced firing on typed
/// input, immediate firing on submit, and latest-request-wins commits.
pub struct SearchController<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for SearchController<S> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<S> SearchController<S>
where
    S: RecipeSource + 'static,
{
    pub fn new(source: S) -> Self {
        Self::with_quiet_period(source, DEBOUNCE_QUIET_PERIOD)
    }

    pub fn with_quiet_period(source: S, quiet_period: Duration) -> Self {
        let (updates, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                source: Arc::new(source),
                state: Mutex::new(ControllerState {
                    query: String::new(),
                    phase: SearchPhase::Idle,
                    results: Vec::new(),
                    has_searched: false,
                    error: None,
                    debounce: Debouncer::new(),
                }),
                updates,
                latest: AtomicU64::new(0),
                quiet_period,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.updates.subscribe()
    }

    pub async fn snapshot(&self) -> SearchSnapshot {
        let state = self.inner.state.lock().await;
        Inner::<S>::snapshot_of(&state)
    }

    /// A keystroke in the search field. While focused with non-empty text,
    /// (re)schedules the debounced search; clearing the text resets straight
    /// to Idle without firing.
    pub async fn input(&self, text: &str, focused: bool) {
        let mut state = self.inner.state.lock().await;
        state.query = text.to_string();
        state.debounce.cancel();

        if text.is_empty() {
            Inner::<S>::reset_to_idle(&mut state);
            self.inner.publish(&state);
        } else if focused {
            let inner = self.inner.clone();
            let query = text.to_string();
            state.debounce.schedule(self.inner.quiet_period, async move {
                Inner::run_search(inner, query).await;
            });
        }
    }

    /// Explicit submit: cancels any pending debounce and fires immediately
    /// for the current query text.
    pub async fn submit(&self) {
        let query = {
            let mut state = self.inner.state.lock().await;
            state.debounce.cancel();
            state.query.clone()
        };
        if query.is_empty() {
            return;
        }
        Inner::run_search(self.inner.clone(), query).await;
    }

    /// Programmatic search, e.g. a tapped suggestion: adopts the text and
    /// submits in one step.
    pub async fn submit_query(&self, text: &str) {
        {
            let mut state = self.inner.state.lock().await;
            state.query = text.to_string();
            state.debounce.cancel();
        }
        if text.is_empty() {
            return;
        }
        Inner::run_search(self.inner.clone(), text.to_string()).await;
    }

    /// Retry after an error: re-enters Loading with the same query text.
    pub async fn retry(&self) {
        self.submit().await;
    }

    pub async fn clear(&self) {
        let mut state = self.inner.state.lock().await;
        state.debounce.cancel();
        state.query.clear();
        Inner::<S>::reset_to_idle(&mut state);
        self.inner.publish(&state);
    }
}

impl<S> Inner<S>
where
    S: RecipeSource + 'static,
{
    fn snapshot_of(state: &ControllerState) -> SearchSnapshot {
        SearchSnapshot {
            query: state.query.clone(),
            phase: state.phase,
            results: state.results.clone(),
            has_searched: state.has_searched,
            error: state.error.clone(),
        }
    }

    fn reset_to_idle(state: &mut ControllerState) {
        state.phase = SearchPhase::Idle;
        state.results.clear();
        state.has_searched = false;
        state.error = None;
    }

    fn publish(&self, state: &ControllerState) {
        let _ = self.updates.send(Self::snapshot_of(state));
    }

    async fn run_search(inner: Arc<Self>, query: String) {
        let token = inner.latest.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = inner.state.lock().await;
            state.phase = SearchPhase::Loading;
            state.results.clear();
            state.has_searched = true;
            state.error = None;
            inner.publish(&state);
        }

        let outcome = inner.source.generate(&query).await;

        let mut state = inner.state.lock().await;
        if inner.latest.load(Ordering::SeqCst) != token {
            // A newer request owns the state now.
            log::debug!("discarding stale search result for {:?}", query);
            return;
        }

        match outcome {
            Ok(results) if !results.is_empty() => {
                state.results = results;
                state.phase = SearchPhase::Success;
            }
            Ok(_) => {
                state.phase = SearchPhase::Empty;
            }
            Err(e) => {
                log::error!("search for {:?} failed: {}", query, e);
                state.error = Some(SEARCH_ERROR_MESSAGE.to_string());
                state.phase = SearchPhase::Error;
            }
        }
        inner.publish(&state);
    }
}
