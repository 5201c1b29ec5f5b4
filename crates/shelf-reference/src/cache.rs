use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use shelf_client::{DropdownOption, FetchError, ReferenceSource};
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetState {
    NotLoaded,
    Loading,
    Loaded,
    /// Terminal until [`ReferenceCache::reset`] or [`ReferenceCache::retry`].
    Failed(String),
}

impl DatasetState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DatasetState::Loaded | DatasetState::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub options: Arc<[DropdownOption]>,
    pub state: DatasetState,
}

impl Snapshot {
    fn not_loaded() -> Self {
        Self {
            options: Arc::from(Vec::new()),
            state: DatasetState::NotLoaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state == DatasetState::Loaded
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            DatasetState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

type Callback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

type SharedSubscribers = Arc<Mutex<Subscribers>>;

/// Snapshots waiting to be handed to subscribers, in transition order.
#[derive(Default)]
struct Outbox {
    pending: VecDeque<Snapshot>,
    delivering: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration returned by [`ReferenceCache::subscribe`]. Dropping it
/// unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            lock(&subscribers).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

struct Inner<S> {
    name: String,
    source: S,
    state: watch::Sender<Snapshot>,
    subscribers: SharedSubscribers,
    outbox: Mutex<Outbox>,
}

impl<S: ReferenceSource> Inner<S> {
    /// Apply `transition` atomically; on change, queue the snapshot it
    /// produced for subscribers.
    fn transition(&self, transition: impl FnOnce(&mut Snapshot) -> bool) -> bool {
        let changed = self.state.send_if_modified(|snapshot| {
            let changed = transition(snapshot);
            if changed {
                lock(&self.outbox).pending.push_back(snapshot.clone());
            }
            changed
        });
        if changed {
            self.deliver();
        }
        changed
    }

    /// Drain the outbox unless another caller already is. Transitions made
    /// from inside a callback are delivered after the current one, so every
    /// subscriber sees snapshots in the order the state took them.
    fn deliver(&self) {
        {
            let mut outbox = lock(&self.outbox);
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }

        loop {
            let snapshot = {
                let mut outbox = lock(&self.outbox);
                match outbox.pending.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        outbox.delivering = false;
                        return;
                    }
                }
            };
            let callbacks: Vec<Callback> = lock(&self.subscribers)
                .callbacks
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            for callback in callbacks {
                callback(&snapshot);
            }
        }
    }

    fn finish(&self, outcome: Result<Vec<DropdownOption>, FetchError>) {
        let snapshot = match outcome {
            Ok(options) => {
                info!(dataset = %self.name, count = options.len(), "reference dataset loaded");
                Snapshot {
                    options: options.into(),
                    state: DatasetState::Loaded,
                }
            }
            Err(e) => {
                warn!(dataset = %self.name, error = %e, "reference dataset failed to load");
                let fallback = format!("Unable to load {}", self.name);
                Snapshot {
                    options: Arc::from(Vec::new()),
                    state: DatasetState::Failed(e.user_message(&fallback)),
                }
            }
        };
        self.transition(move |current| {
            *current = snapshot;
            true
        });
    }
}

/// Process-wide cache for one small dropdown dataset.
///
/// The dataset is fetched at most once: the first [`ensure_loaded`] moves it
/// from `NotLoaded` to `Loading` and starts the fetch, every caller that
/// arrives while it is `Loading` waits for that same fetch. Subscribers are
/// told about every state change. A failed load stays failed until
/// [`reset`] or [`retry`].
///
/// The handle is cheap to clone; clones share the dataset. Loading spawns on
/// the current tokio runtime.
///
/// [`ensure_loaded`]: ReferenceCache::ensure_loaded
/// [`reset`]: ReferenceCache::reset
/// [`retry`]: ReferenceCache::retry
pub struct ReferenceCache<S: ReferenceSource> {
    inner: Arc<Inner<S>>,
}

impl<S: ReferenceSource> Clone for ReferenceCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ReferenceSource> ReferenceCache<S> {
    pub fn new(name: impl Into<String>, source: S) -> Self {
        let (state, _) = watch::channel(Snapshot::not_loaded());
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                source,
                state,
                subscribers: SharedSubscribers::default(),
                outbox: Mutex::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current options and state. Never triggers a fetch.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    /// Register `on_change` for every state transition. Callbacks run outside
    /// the cache's locks, one snapshot at a time and in transition order.
    pub fn subscribe(&self, on_change: impl Fn(&Snapshot) + Send + Sync + 'static) -> Subscription {
        let mut subscribers = lock(&self.inner.subscribers);
        subscribers.next_id += 1;
        let id = subscribers.next_id;
        subscribers.callbacks.push((id, Arc::new(on_change)));
        Subscription {
            id,
            subscribers: Arc::downgrade(&self.inner.subscribers),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).callbacks.len()
    }

    /// Load the dataset unless it is already loaded, loading or failed, and
    /// wait for the outcome.
    pub async fn ensure_loaded(&self) -> Snapshot {
        let started = self.inner.transition(|snapshot| {
            if snapshot.state == DatasetState::NotLoaded {
                snapshot.state = DatasetState::Loading;
                true
            } else {
                false
            }
        });

        if started {
            debug!(dataset = %self.inner.name, "loading reference dataset");
            let inner = Arc::clone(&self.inner);
            let pending = inner.source.fetch_options();
            tokio::spawn(async move {
                let outcome = pending.await;
                inner.finish(outcome);
            });
        } else {
            debug!(dataset = %self.inner.name, "already loaded or loading, skipping");
        }

        let mut state = self.inner.state.subscribe();
        let settled = state
            .wait_for(|snapshot| snapshot.state != DatasetState::Loading)
            .await
            .map(|snapshot| snapshot.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// Forget a loaded or failed dataset so the next [`ensure_loaded`] fetches
    /// again. Does nothing while a load is in flight.
    ///
    /// [`ensure_loaded`]: ReferenceCache::ensure_loaded
    pub fn reset(&self) -> bool {
        let reset = self.inner.transition(|snapshot| {
            if snapshot.state.is_terminal() {
                *snapshot = Snapshot::not_loaded();
                true
            } else {
                false
            }
        });
        if reset {
            debug!(dataset = %self.inner.name, "reference dataset reset");
        }
        reset
    }

    /// Reload a failed dataset. A loaded or loading dataset is left alone.
    pub async fn retry(&self) -> Snapshot {
        self.inner.transition(|snapshot| {
            if matches!(snapshot.state, DatasetState::Failed(_)) {
                *snapshot = Snapshot::not_loaded();
                true
            } else {
                false
            }
        });
        self.ensure_loaded().await
    }
}
