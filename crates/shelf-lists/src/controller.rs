use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use shelf_client::{FetchError, ListFetcher};
use shelf_query::{FilterValue, ListQuery, ListRequest, ListResult, SortDirection};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ScreenConfig;
use crate::error::ListError;
use crate::view::{ListView, Phase};

/// Handle to an issued fetch. Awaiting it is optional; the outcome is also
/// reflected in the controller's view.
pub type Refresh = JoinHandle<Outcome>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    /// The fetch failed; carries the message shown to the user.
    Failed(String),
    /// A later request was issued before this one resolved.
    Superseded,
}

struct State<T> {
    query: ListQuery,
    result: Option<Arc<ListResult<T>>>,
    error: Option<String>,
    /// Generation of the latest issued request.
    generation: u64,
    /// Whether the latest issued request is still outstanding.
    fetching: bool,
    /// The latest issued request.
    issued: Option<ListRequest>,
    debounce_token: u64,
    debounce: Option<JoinHandle<()>>,
}

impl<T> State<T> {
    fn new(query: ListQuery) -> Self {
        Self {
            query,
            result: None,
            error: None,
            generation: 0,
            fetching: false,
            issued: None,
            debounce_token: 0,
            debounce: None,
        }
    }

    fn phase(&self) -> Phase {
        if self.debounce.is_some() {
            Phase::Debouncing
        } else if self.fetching {
            Phase::Fetching
        } else {
            Phase::Idle
        }
    }

    fn view(&self) -> ListView<T> {
        ListView {
            query: self.query.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            phase: self.phase(),
            generation: self.generation,
        }
    }

    fn cancel_debounce(&mut self) {
        self.debounce_token += 1;
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }
}

struct Inner<F: ListFetcher> {
    config: ScreenConfig,
    fetcher: F,
    state: Mutex<State<F::Item>>,
    view: watch::Sender<ListView<F::Item>>,
}

impl<F: ListFetcher> Inner<F> {
    fn lock(&self) -> MutexGuard<'_, State<F::Item>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State<F::Item>) {
        self.view.send_replace(state.view());
    }

    /// Issue a fetch for the current query under a fresh generation.
    fn issue(self: &Arc<Self>, state: &mut State<F::Item>) -> Refresh {
        state.generation += 1;
        state.fetching = true;
        let generation = state.generation;
        let request = state.query.to_request();
        debug!(
            screen = %self.config.id,
            generation,
            page = request.page_number,
            search = request.search.as_deref().unwrap_or(""),
            "issuing list request"
        );
        state.issued = Some(request.clone());
        let pending = self.fetcher.fetch(request);
        self.publish(state);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = pending.await;
            inner.commit(generation, outcome)
        })
    }

    fn commit(
        &self,
        generation: u64,
        outcome: Result<ListResult<F::Item>, FetchError>,
    ) -> Outcome {
        let mut state = self.lock();
        if generation != state.generation {
            debug!(
                screen = %self.config.id,
                generation,
                latest = state.generation,
                "discarding superseded response"
            );
            return Outcome::Superseded;
        }

        state.fetching = false;
        let outcome = match outcome {
            Ok(result) => {
                // Typing since the request went out has already moved the
                // query back to page 1.
                let unchanged = state.issued.as_ref() == Some(&state.query.to_request());
                if unchanged && result.page_number >= 1 {
                    state.query.set_page(result.page_number);
                }
                state.result = Some(Arc::new(result));
                state.error = None;
                Outcome::Committed
            }
            Err(e) => {
                warn!(screen = %self.config.id, generation, error = %e, "list fetch failed");
                let message = e.user_message(&self.config.failure_message);
                state.error = Some(message.clone());
                Outcome::Failed(message)
            }
        };
        self.publish(&state);
        outcome
    }

    /// Restart the quiet-period timer. Only the last keystroke's timer fires.
    fn schedule_debounced(self: &Arc<Self>, state: &mut State<F::Item>) {
        state.cancel_debounce();
        let token = state.debounce_token;
        let delay = self.config.debounce();
        let weak: Weak<Self> = Arc::downgrade(self);

        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut state = inner.lock();
            if state.debounce_token != token {
                return;
            }
            state.debounce = None;
            inner.issue(&mut state);
        }));
        self.publish(state);
    }
}

/// Query state machine for one management screen.
///
/// Mutations come in two classes. [`input_text`](Self::input_text) is
/// debounced: a fetch is issued once typing has been quiet for the screen's
/// debounce period. Filter, sort and page changes are discrete and fetch
/// immediately, cancelling any pending debounce.
///
/// Every fetch is stamped with a generation. Only the response to the latest
/// issued fetch is committed; responses that resolve after a newer fetch was
/// issued are dropped, whatever order they arrive in. A failed fetch keeps the
/// previous page on screen and records a displayable error.
///
/// Must be used from within a tokio runtime.
pub struct ListController<F: ListFetcher> {
    inner: Arc<Inner<F>>,
}

impl<F: ListFetcher> ListController<F> {
    pub fn new(config: ScreenConfig, fetcher: F) -> Self {
        let query = ListQuery::new(config.page_size, config.default_sort.clone());
        let state = State::new(query);
        let (view, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(Inner {
                config,
                fetcher,
                state: Mutex::new(state),
                view,
            }),
        }
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.inner.config
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    pub fn query(&self) -> ListQuery {
        self.inner.lock().query.clone()
    }

    /// The request the next fetch would send.
    pub fn current_request(&self) -> ListRequest {
        self.inner.lock().query.to_request()
    }

    pub fn view(&self) -> ListView<F::Item> {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView<F::Item>> {
        self.inner.view.subscribe()
    }

    // ── Debounced ───────────────────────────────────────────────

    /// Replace the search box contents. Fetches after the debounce period,
    /// or at once when the box is cleared. Returns the handle only in the
    /// immediate case.
    pub fn input_text(&self, text: impl Into<String>) -> Option<Refresh> {
        let mut state = self.inner.lock();
        state.query.set_free_text(text);
        if state.query.free_text().trim().is_empty() {
            state.cancel_debounce();
            Some(self.inner.issue(&mut state))
        } else {
            self.inner.schedule_debounced(&mut state);
            None
        }
    }

    // ── Immediate ───────────────────────────────────────────────

    pub fn set_filter(
        &self,
        key: &str,
        value: impl Into<FilterValue>,
    ) -> Result<Refresh, ListError> {
        self.inner.config.check_filter(key)?;
        Ok(self.apply(|q| q.set_filter(key, value)))
    }

    pub fn clear_filter(&self, key: &str) -> Result<Refresh, ListError> {
        self.inner.config.check_filter(key)?;
        Ok(self.apply(|q| q.clear_filter(key)))
    }

    pub fn set_sort(&self, key: &str, direction: SortDirection) -> Result<Refresh, ListError> {
        self.inner.config.check_sort_key(key)?;
        Ok(self.apply(|q| q.set_sort(key, direction)))
    }

    /// Sort by `key`, flipping the direction if it is already the sort key.
    pub fn toggle_sort(&self, key: &str) -> Result<Refresh, ListError> {
        self.inner.config.check_sort_key(key)?;
        Ok(self.apply(|q| q.toggle_sort(key)))
    }

    pub fn set_page(&self, page_number: u32) -> Result<Refresh, ListError> {
        if page_number == 0 {
            return Err(ListError::InvalidPage(page_number));
        }
        Ok(self.apply(|q| q.set_page(page_number)))
    }

    /// Move forward one page if the last committed page says there is one.
    pub fn next_page(&self) -> Option<Refresh> {
        let mut state = self.inner.lock();
        let has_next = state.result.as_ref().is_some_and(|r| r.has_next_page);
        if !has_next {
            return None;
        }
        let next = state.query.page_number() + 1;
        state.query.set_page(next);
        state.cancel_debounce();
        Some(self.inner.issue(&mut state))
    }

    pub fn previous_page(&self) -> Option<Refresh> {
        let mut state = self.inner.lock();
        let page = state.query.page_number();
        if page <= 1 {
            return None;
        }
        state.query.set_page(page - 1);
        state.cancel_debounce();
        Some(self.inner.issue(&mut state))
    }

    /// Fetch the current query again, e.g. on mount or after an edit.
    pub fn refresh(&self) -> Refresh {
        let mut state = self.inner.lock();
        state.cancel_debounce();
        self.inner.issue(&mut state)
    }

    fn apply(&self, mutate: impl FnOnce(&mut ListQuery)) -> Refresh {
        let mut state = self.inner.lock();
        mutate(&mut state.query);
        state.cancel_debounce();
        self.inner.issue(&mut state)
    }
}

impl<F: ListFetcher> Drop for ListController<F> {
    fn drop(&mut self) {
        self.inner.lock().cancel_debounce();
    }
}
