use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use http::StatusCode;
use shelf_client::{DropdownOption, FetchError, ReferenceSource};
use shelf_reference::*;
use tokio::sync::Notify;

/// Counts calls and answers with a configurable result, optionally holding
/// each answer until `release` is called.
#[derive(Clone)]
struct StubSource {
    calls: Arc<AtomicUsize>,
    result: Arc<Mutex<Result<Vec<DropdownOption>, FetchError>>>,
    gate: Option<Arc<Notify>>,
}

impl StubSource {
    fn ok() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            result: Arc::new(Mutex::new(Ok(categories()))),
            gate: None,
        }
    }

    fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::ok()
        }
    }

    fn answer(&self, result: Result<Vec<DropdownOption>, FetchError>) {
        *self.result.lock().unwrap() = result;
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReferenceSource for StubSource {
    fn fetch_options(&self) -> BoxFuture<'static, Result<Vec<DropdownOption>, FetchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.result.lock().unwrap().clone();
        let gate = self.gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        })
    }
}

fn categories() -> Vec<DropdownOption> {
    vec![
        DropdownOption {
            value: "c-1".into(),
            label: "Fiction".into(),
        },
        DropdownOption {
            value: "c-2".into(),
            label: "History".into(),
        },
    ]
}

fn record<S: ReferenceSource>(cache: &ReferenceCache<S>) -> (Subscription, Arc<Mutex<Vec<DatasetState>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let subscription = cache.subscribe(move |snapshot| log.lock().unwrap().push(snapshot.state.clone()));
    (subscription, seen)
}

#[tokio::test]
async fn snapshot_does_not_fetch() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.state, DatasetState::NotLoaded);
    assert!(snapshot.options.is_empty());
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn concurrent_callers_share_one_fetch() {
    let source = StubSource::gated();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());
    let recorders: Vec<_> = (0..3).map(|_| record(&cache)).collect();

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.ensure_loaded().await })
        })
        .collect();
    tokio::task::yield_now().await;
    assert_eq!(cache.snapshot().state, DatasetState::Loading);

    source.release();
    for waiter in waiters {
        let snapshot = waiter.await.unwrap();
        assert!(snapshot.is_loaded());
        assert_eq!(&*snapshot.options, categories().as_slice());
    }

    assert_eq!(source.calls(), 1);
    for (_subscription, seen) in &recorders {
        assert_eq!(
            *seen.lock().unwrap(),
            vec![DatasetState::Loading, DatasetState::Loaded]
        );
    }
}

#[tokio::test]
async fn loaded_dataset_is_not_fetched_again() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());

    cache.ensure_loaded().await;
    let (_subscription, seen) = record(&cache);
    let snapshot = cache.ensure_loaded().await;

    assert!(snapshot.is_loaded());
    assert_eq!(source.calls(), 1);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failure_is_terminal_until_retried() {
    let source = StubSource::ok();
    source.answer(Err(FetchError::api(
        StatusCode::INTERNAL_SERVER_ERROR,
        Some("Category service unavailable".into()),
    )));
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());
    let (_subscription, seen) = record(&cache);

    let failed = cache.ensure_loaded().await;
    assert_eq!(failed.error(), Some("Category service unavailable"));
    assert!(failed.options.is_empty());

    let again = cache.ensure_loaded().await;
    assert_eq!(again, failed);
    assert_eq!(source.calls(), 1);

    source.answer(Ok(categories()));
    let loaded = cache.retry().await;
    assert!(loaded.is_loaded());
    assert_eq!(loaded.options.len(), 2);
    assert_eq!(source.calls(), 2);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            DatasetState::Loading,
            DatasetState::Failed("Category service unavailable".into()),
            DatasetState::NotLoaded,
            DatasetState::Loading,
            DatasetState::Loaded,
        ]
    );
}

#[tokio::test]
async fn failure_without_server_message_names_the_dataset() {
    let source = StubSource::ok();
    source.answer(Err(FetchError::Decode("expected an array".into())));
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source);

    let snapshot = cache.ensure_loaded().await;
    assert_eq!(snapshot.error(), Some("Unable to load book-categories"));
}

#[tokio::test]
async fn retry_leaves_a_loaded_dataset_alone() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());

    cache.ensure_loaded().await;
    let snapshot = cache.retry().await;

    assert!(snapshot.is_loaded());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn reset_forces_the_next_load_to_fetch() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());

    cache.ensure_loaded().await;
    assert!(cache.reset());
    assert_eq!(cache.snapshot().state, DatasetState::NotLoaded);
    assert!(cache.snapshot().options.is_empty());

    cache.ensure_loaded().await;
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn reset_is_refused_while_loading() {
    let source = StubSource::gated();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());

    let waiter = tokio::spawn({
        let cache = cache.clone();
        async move { cache.ensure_loaded().await }
    });
    tokio::task::yield_now().await;

    assert!(!cache.reset());
    assert_eq!(cache.snapshot().state, DatasetState::Loading);

    source.release();
    assert!(waiter.await.unwrap().is_loaded());
    assert!(cache.reset());
}

#[tokio::test]
async fn abandoned_caller_does_not_strand_the_load() {
    let source = StubSource::gated();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source.clone());

    let leader = tokio::spawn({
        let cache = cache.clone();
        async move { cache.ensure_loaded().await }
    });
    tokio::task::yield_now().await;
    leader.abort();

    source.release();
    let snapshot = cache.ensure_loaded().await;
    assert!(snapshot.is_loaded());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn dropped_subscription_stops_notifications() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source);
    let (kept, kept_seen) = record(&cache);
    let (dropped, dropped_seen) = record(&cache);
    assert_eq!(cache.subscriber_count(), 2);

    dropped.unsubscribe();
    assert_eq!(cache.subscriber_count(), 1);

    cache.ensure_loaded().await;
    assert_eq!(kept_seen.lock().unwrap().len(), 2);
    assert!(dropped_seen.lock().unwrap().is_empty());

    drop(kept);
    assert_eq!(cache.subscriber_count(), 0);
}

#[tokio::test]
async fn watchers_observe_the_settled_state() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source);
    let mut watcher = cache.watch();

    cache.ensure_loaded().await;
    let snapshot = watcher
        .wait_for(|snapshot| snapshot.state.is_terminal())
        .await
        .unwrap()
        .clone();
    assert!(snapshot.is_loaded());
}

#[tokio::test]
async fn transitions_made_inside_a_callback_are_delivered_in_order() {
    let source = StubSource::ok();
    let cache = ReferenceCache::new(BOOK_CATEGORIES, source);

    let resetter = cache.subscribe({
        let cache = cache.clone();
        move |snapshot| {
            if snapshot.is_loaded() {
                cache.reset();
            }
        }
    });
    let (_subscription, seen) = record(&cache);

    cache.ensure_loaded().await;
    drop(resetter);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            DatasetState::Loading,
            DatasetState::Loaded,
            DatasetState::NotLoaded
        ]
    );
    assert_eq!(cache.snapshot().state, DatasetState::NotLoaded);
}
