//! Keyed query cache with staleness windows and in-flight de-duplication.
//!
//! A query is identified by a [`QueryKey`]. Results are kept in a
//! [`QueryStore`] as JSON together with their fetch time; an entry younger
//! than the staleness window is served without touching the network.
//! Concurrent requests for the same key share one fetch.
//!
//! Everything here is single-threaded: the client is `Rc`-based and the
//! futures it returns are `!Send`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use edge_data::{FetchError, RetryPolicy};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::key::QueryKey;
use crate::store::{
    CacheError, CacheResult, CacheStatus, CachedEntry, Clock, MemoryStore, QueryStore, SystemClock,
};

/// Default staleness window.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Errors a query can settle with.
///
/// Cloneable so one shared fetch can hand its outcome to every waiter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not encode or decode {key}: {message}")]
    Codec { key: String, message: String },
}

impl QueryError {
    /// The upstream answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_not_found())
    }
}

/// Per-query options.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// How long a fetched result is served without refetching.
    pub stale_time: Duration,
    /// Retry policy for the fetcher.
    pub retry: RetryPolicy,
}

impl QueryOptions {
    /// Options with the given staleness window and the default retry policy.
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

/// Snapshot of a query: data, loading flag and error.
///
/// `data` and `error` can both be set when a refetch failed and the previous
/// result is being served.
#[derive(Debug, Clone)]
pub struct QueryHandle<T> {
    data: Option<T>,
    is_loading: bool,
    error: Option<QueryError>,
    status: CacheStatus,
}

impl<T> QueryHandle<T> {
    /// A settled handle with data.
    pub fn ready(data: T, status: CacheStatus) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            error: None,
            status,
        }
    }

    /// A handle for a query that has not settled.
    pub fn loading() -> Self {
        Self {
            data: None,
            is_loading: true,
            error: None,
            status: CacheStatus::Miss,
        }
    }

    /// A settled handle with no data.
    pub fn failed(error: QueryError) -> Self {
        Self {
            data: None,
            is_loading: false,
            error: Some(error),
            status: CacheStatus::Error,
        }
    }

    fn stale(data: T, error: QueryError) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            error: Some(error),
            status: CacheStatus::Stale,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    /// Where the data came from.
    pub fn status(&self) -> CacheStatus {
        self.status
    }
}

type InFlight = Shared<LocalBoxFuture<'static, Result<String, QueryError>>>;

struct ClientState {
    store: Box<dyn QueryStore>,
    clock: Rc<dyn Clock>,
    in_flight: RefCell<HashMap<QueryKey, InFlight>>,
    errors: RefCell<HashMap<QueryKey, QueryError>>,
    /// Backend failures not yet collected by the caller.
    store_errors: RefCell<Vec<(QueryKey, CacheError)>>,
}

impl ClientState {
    fn record_store_error(&self, key: &QueryKey, error: CacheError) {
        self.store_errors.borrow_mut().push((key.clone(), error));
    }
}

/// The query cache.
///
/// Cheap to clone; clones share storage and in-flight fetches.
#[derive(Clone)]
pub struct QueryClient {
    state: Rc<ClientState>,
}

impl QueryClient {
    /// Create a client over a store and a clock.
    pub fn new(store: Box<dyn QueryStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            state: Rc::new(ClientState {
                store,
                clock,
                in_flight: RefCell::new(HashMap::new()),
                errors: RefCell::new(HashMap::new()),
                store_errors: RefCell::new(Vec::new()),
            }),
        }
    }

    /// In-memory store, wall clock.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()), Rc::new(SystemClock))
    }

    /// Start fetching `key` unless a fresh entry or a fetch already exists.
    ///
    /// The fetch is registered immediately. The returned future resolves when
    /// it settles and may be dropped: the fetch stays registered and runs as
    /// soon as any query for the same key is polled.
    pub fn prefetch<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        options: &QueryOptions,
    ) -> LocalBoxFuture<'static, ()>
    where
        T: Serialize + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, FetchError>> + 'static,
    {
        if self.fresh_entry(&key, options.stale_time).is_some() {
            return async {}.boxed_local();
        }
        self.join_or_start(key, fetcher, &options.retry)
            .map(|_| ())
            .boxed_local()
    }

    /// Resolve `key`: a fresh entry, else the shared in-flight fetch, else a
    /// new fetch.
    ///
    /// If the fetch fails and an older entry exists, the older data is
    /// returned alongside the error.
    pub async fn query<T, F, Fut>(
        &self,
        key: QueryKey,
        fetcher: F,
        options: &QueryOptions,
    ) -> QueryHandle<T>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, FetchError>> + 'static,
    {
        let cached = self.cached_entry(&key);
        let now = self.state.clock.now_ms();

        if let Some(entry) = &cached {
            if entry.is_fresh(now, options.stale_time) {
                // An undecodable entry is treated as a miss.
                if let Ok(data) = decode::<T>(&key, &entry.data) {
                    return QueryHandle::ready(data, CacheStatus::Hit);
                }
            }
        }

        let outcome = self.join_or_start(key.clone(), fetcher, &options.retry).await;

        match outcome.and_then(|data| decode::<T>(&key, &data)) {
            Ok(data) => QueryHandle::ready(data, CacheStatus::Miss),
            Err(error) => match cached.and_then(|entry| decode::<T>(&key, &entry.data).ok()) {
                Some(previous) => QueryHandle::stale(previous, error),
                None => QueryHandle::failed(error),
            },
        }
    }

    /// Current state of `key` without fetching.
    pub fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> QueryHandle<T> {
        let data = self
            .cached_entry(key)
            .and_then(|entry| decode::<T>(key, &entry.data).ok());
        let error = self.state.errors.borrow().get(key).cloned();
        let is_loading = self.is_fetching(key);

        let status = match (&data, &error) {
            (Some(_), None) => CacheStatus::Hit,
            (Some(_), Some(_)) => CacheStatus::Stale,
            (None, Some(_)) => CacheStatus::Error,
            (None, None) => CacheStatus::Miss,
        };

        QueryHandle {
            data,
            is_loading,
            error,
            status,
        }
    }

    /// Whether a fetch for `key` is registered and unsettled.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.state.in_flight.borrow().contains_key(key)
    }

    /// Drop the cached entry and last error for `key`.
    pub fn invalidate(&self, key: &QueryKey) -> CacheResult<()> {
        self.state.errors.borrow_mut().remove(key);
        self.state.store.remove(key)
    }

    /// Take the store failures seen since the last call, oldest first.
    ///
    /// Queries keep working when the backend fails, so this is the only
    /// place those failures surface.
    pub fn take_store_errors(&self) -> Vec<(QueryKey, CacheError)> {
        std::mem::take(&mut *self.state.store_errors.borrow_mut())
    }

    fn cached_entry(&self, key: &QueryKey) -> Option<CachedEntry> {
        // A failing backend behaves like an empty one.
        match self.state.store.get(key) {
            Ok(entry) => entry,
            Err(e) => {
                self.state.record_store_error(key, e);
                None
            }
        }
    }

    fn fresh_entry(&self, key: &QueryKey, stale_time: Duration) -> Option<CachedEntry> {
        let now = self.state.clock.now_ms();
        self.cached_entry(key)
            .filter(|entry| entry.is_fresh(now, stale_time))
    }

    fn join_or_start<T, F, Fut>(&self, key: QueryKey, fetcher: F, retry: &RetryPolicy) -> InFlight
    where
        T: Serialize + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, FetchError>> + 'static,
    {
        if let Some(existing) = self.state.in_flight.borrow().get(&key) {
            return existing.clone();
        }

        let fetch = run_fetch(
            Rc::downgrade(&self.state),
            key.clone(),
            fetcher,
            retry.clone(),
        )
        .boxed_local()
        .shared();

        self.state.in_flight.borrow_mut().insert(key, fetch.clone());
        fetch
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("in_flight", &self.state.in_flight.borrow().len())
            .finish_non_exhaustive()
    }
}

async fn run_fetch<T, F, Fut>(
    state: Weak<ClientState>,
    key: QueryKey,
    fetcher: F,
    retry: RetryPolicy,
) -> Result<String, QueryError>
where
    T: Serialize,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    let fetched = loop {
        match fetcher().await {
            Ok(value) => break Ok(value),
            Err(e) if retry.should_retry(&e, attempt) => attempt += 1,
            Err(e) => break Err(QueryError::from(e)),
        }
    };

    let outcome = fetched.and_then(|value| {
        serde_json::to_string(&value).map_err(|e| QueryError::Codec {
            key: key.to_string(),
            message: e.to_string(),
        })
    });

    if let Some(state) = state.upgrade() {
        state.in_flight.borrow_mut().remove(&key);
        match &outcome {
            Ok(data) => {
                let entry = CachedEntry::new(data.clone(), state.clock.now_ms());
                if let Err(e) = state.store.set(&key, entry) {
                    state.record_store_error(&key, e);
                }
                state.errors.borrow_mut().remove(&key);
            }
            Err(e) => {
                state.errors.borrow_mut().insert(key, e.clone());
            }
        }
    }

    outcome
}

fn decode<T: DeserializeOwned>(key: &QueryKey, data: &str) -> Result<T, QueryError> {
    serde_json::from_str(data).map_err(|e| QueryError::Codec {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ManualClock;
    use edge_core::RequestId;
    use edge_data::{DependencyTag, FetchClient, HttpResponse, StaticTransport};
    use futures::executor::block_on;
    use serde::Deserialize;

    const URL: &str = "http://api/products/details/1";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
    }

    struct Harness {
        transport: Rc<StaticTransport>,
        clock: Rc<ManualClock>,
        fetch: FetchClient,
        client: QueryClient,
    }

    fn harness(transport: StaticTransport) -> Harness {
        let transport = Rc::new(transport);
        let clock = Rc::new(ManualClock::new(1_000_000));
        let fetch = FetchClient::new(transport.clone(), RequestId::from_string("t"));
        let client = QueryClient::new(Box::new(MemoryStore::new()), clock.clone());
        Harness {
            transport,
            clock,
            fetch,
            client,
        }
    }

    fn fetcher(
        fetch: &FetchClient,
    ) -> impl Fn() -> LocalBoxFuture<'static, Result<Item, FetchError>> + 'static {
        let fetch = fetch.clone();
        move || {
            let fetch = fetch.clone();
            async move { fetch.get_json::<Item>(URL, DependencyTag::Catalog).await }.boxed_local()
        }
    }

    fn key() -> QueryKey {
        QueryKey::new("product", "1")
    }

    #[test]
    fn test_fresh_entry_is_served_without_refetch() {
        let h = harness(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let options = QueryOptions::default();

        let first = block_on(h.client.query(key(), fetcher(&h.fetch), &options));
        h.clock.advance(Duration::from_secs(299));
        let second = block_on(h.client.query(key(), fetcher(&h.fetch), &options));

        assert_eq!(first.status(), CacheStatus::Miss);
        assert_eq!(second.status(), CacheStatus::Hit);
        assert_eq!(second.data().map(|i| i.name.as_str()), Some("Boot"));
        assert_eq!(h.transport.calls(URL), 1);
    }

    #[test]
    fn test_entry_is_refetched_after_stale_window() {
        let h = harness(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let options = QueryOptions::default();

        block_on(h.client.query(key(), fetcher(&h.fetch), &options));
        h.clock.advance(Duration::from_secs(300));
        h.transport.set(URL, HttpResponse::json(r#"{"name":"Boot v2"}"#));
        let handle = block_on(h.client.query(key(), fetcher(&h.fetch), &options));

        assert_eq!(handle.data().map(|i| i.name.as_str()), Some("Boot v2"));
        assert_eq!(h.transport.calls(URL), 2);
    }

    #[test]
    fn test_concurrent_queries_share_one_fetch() {
        let h = harness(
            StaticTransport::new()
                .with_json(URL, r#"{"name":"Boot"}"#)
                .with_delay(URL, 2),
        );
        let options = QueryOptions::default();

        let (a, b) = block_on(futures::future::join(
            h.client.query(key(), fetcher(&h.fetch), &options),
            h.client.query(key(), fetcher(&h.fetch), &options),
        ));

        assert_eq!(a.data(), b.data());
        assert!(a.data().is_some());
        assert_eq!(h.transport.calls(URL), 1);
        assert!(!h.client.is_fetching(&key()));
    }

    #[test]
    fn test_prefetch_then_query_fetches_once() {
        let h = harness(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let options = QueryOptions::default();

        let pending = h.client.prefetch(key(), fetcher(&h.fetch), &options);
        assert!(h.client.is_fetching(&key()));
        assert!(h.client.peek::<Item>(&key()).is_loading());
        drop(pending);

        let handle = block_on(h.client.query(key(), fetcher(&h.fetch), &options));
        assert!(handle.data().is_some());
        assert_eq!(h.transport.calls(URL), 1);
    }

    #[test]
    fn test_prefetch_skips_fresh_entries() {
        let h = harness(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let options = QueryOptions::default();

        block_on(h.client.prefetch(key(), fetcher(&h.fetch), &options));
        block_on(h.client.prefetch(key(), fetcher(&h.fetch), &options));

        assert!(!h.client.is_fetching(&key()));
        assert_eq!(h.transport.calls(URL), 1);
    }

    #[test]
    fn test_failed_refetch_serves_previous_data() {
        let h = harness(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let options = QueryOptions::default();

        block_on(h.client.query(key(), fetcher(&h.fetch), &options));
        h.clock.advance(Duration::from_secs(301));
        h.transport.set(URL, HttpResponse::status(503));
        let handle = block_on(h.client.query(key(), fetcher(&h.fetch), &options));

        assert_eq!(handle.status(), CacheStatus::Stale);
        assert_eq!(handle.data().map(|i| i.name.as_str()), Some("Boot"));
        assert!(handle.error().is_some());
        // One initial fetch, one failed refetch, one retry.
        assert_eq!(h.transport.calls(URL), 3);
    }

    #[test]
    fn test_not_found_is_not_retried() {
        let h = harness(StaticTransport::new());
        let handle = block_on(h.client.query(key(), fetcher(&h.fetch), &QueryOptions::default()));

        assert!(handle.data().is_none());
        assert!(handle.error().is_some_and(QueryError::is_not_found));
        assert_eq!(h.transport.calls(URL), 1);
        assert_eq!(h.client.peek::<Item>(&key()).status(), CacheStatus::Error);
    }

    #[test]
    fn test_invalidate_forces_refetch() {
        let h = harness(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let options = QueryOptions::default();

        block_on(h.client.query(key(), fetcher(&h.fetch), &options));
        h.client.invalidate(&key()).unwrap();
        block_on(h.client.query(key(), fetcher(&h.fetch), &options));

        assert_eq!(h.transport.calls(URL), 2);
    }

    /// Accepts nothing: every read and write fails.
    struct BrokenStore;

    impl QueryStore for BrokenStore {
        fn get(&self, _key: &QueryKey) -> CacheResult<Option<CachedEntry>> {
            Err(CacheError::Storage("unavailable".into()))
        }

        fn set(&self, _key: &QueryKey, _entry: CachedEntry) -> CacheResult<()> {
            Err(CacheError::Storage("read-only".into()))
        }

        fn remove(&self, _key: &QueryKey) -> CacheResult<()> {
            Err(CacheError::Storage("read-only".into()))
        }
    }

    #[test]
    fn test_store_failures_are_reported() {
        let transport = Rc::new(StaticTransport::new().with_json(URL, r#"{"name":"Boot"}"#));
        let fetch = FetchClient::new(transport.clone(), RequestId::from_string("t"));
        let client = QueryClient::new(Box::new(BrokenStore), Rc::new(ManualClock::new(0)));

        let handle = block_on(client.query(key(), fetcher(&fetch), &QueryOptions::default()));
        assert_eq!(handle.data().map(|i| i.name.as_str()), Some("Boot"));

        let errors = client.take_store_errors();
        assert_eq!(
            errors,
            vec![
                (key(), CacheError::Storage("unavailable".into())),
                (key(), CacheError::Storage("read-only".into())),
            ]
        );
        assert!(client.take_store_errors().is_empty());

        assert_eq!(
            client.invalidate(&key()),
            Err(CacheError::Storage("read-only".into()))
        );
    }
}
