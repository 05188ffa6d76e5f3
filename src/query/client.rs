//! The cache store shared by every view.
//!
//! A [`QueryClient`] owns one cell per [`QueryKey`]. Each cell holds the
//! current [`CacheEntry`] in a `watch` channel (subscribers are its
//! receivers) and a small amount of bookkeeping behind a mutex: the fetcher
//! that knows how to load the key, the fetch currently in flight, and an
//! invalidation generation counter.
//!
//! Fetches run on spawned tasks, so a result always lands in the cache even
//! if every reader that asked for it has gone away.

use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::config::QueryConfig;
use super::entry::CacheEntry;
use super::error::QueryError;
use super::key::QueryKey;
use super::observer::{PrefixSubscriber, QueryObserver};

/// Future returned by a fetcher: the raw JSON for one key.
pub type FetchFuture = BoxFuture<'static, Result<Value, QueryError>>;

/// Loads the resource a key addresses.
pub type Fetcher = Arc<dyn Fn(QueryKey) -> FetchFuture + Send + Sync>;

type Outcome = Result<Arc<Value>, QueryError>;
type SharedFetch = Shared<BoxFuture<'static, Outcome>>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
  F: Fn(QueryKey) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Value, QueryError>> + Send + 'static,
{
  Arc::new(move |key| f(key).boxed())
}

/// What happened to a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEventKind {
  Fetching,
  Updated,
  Failed(String),
  Invalidated,
  Removed,
}

/// Notification broadcast to prefix subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
  pub key: QueryKey,
  pub kind: CacheEventKind,
}

struct InFlight {
  generation: u64,
  fetch: SharedFetch,
}

struct CellState {
  /// Bumped on every invalidation.
  generation: u64,
  in_flight: Option<InFlight>,
  fetcher: Option<Fetcher>,
  last_used: Instant,
}

pub(crate) struct QueryCell {
  key: QueryKey,
  entry: watch::Sender<CacheEntry>,
  state: Mutex<CellState>,
}

impl QueryCell {
  fn new(key: QueryKey) -> Self {
    let (entry, _) = watch::channel(CacheEntry::default());
    Self {
      key,
      entry,
      state: Mutex::new(CellState {
        generation: 0,
        in_flight: None,
        fetcher: None,
        last_used: Instant::now(),
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, CellState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub(crate) fn key(&self) -> &QueryKey {
    &self.key
  }

  pub(crate) fn subscribe(&self) -> watch::Receiver<CacheEntry> {
    self.entry.subscribe()
  }

  pub(crate) fn touch(&self) {
    self.lock().last_used = Instant::now();
  }

  fn generation(&self) -> u64 {
    self.lock().generation
  }

  fn snapshot(&self) -> CacheEntry {
    self.entry.borrow().clone()
  }

  fn subscriber_count(&self) -> usize {
    self.entry.receiver_count()
  }
}

struct ClientInner {
  cells: DashMap<QueryKey, Arc<QueryCell>>,
  config: QueryConfig,
  default_fetcher: Option<Fetcher>,
  events: broadcast::Sender<CacheEvent>,
}

/// The cache context handed to every view.
///
/// Cloning is cheap; all clones share one store. Tests build their own
/// instance so nothing leaks between them.
#[derive(Clone)]
pub struct QueryClient {
  inner: Arc<ClientInner>,
}

impl std::fmt::Debug for QueryClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryClient")
      .field("entries", &self.inner.cells.len())
      .field("config", &self.inner.config)
      .finish_non_exhaustive()
  }
}

impl Default for QueryClient {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryClient {
  #[must_use]
  pub fn new() -> Self {
    Self::build(QueryConfig::default(), None)
  }

  #[must_use]
  pub fn with_config(config: QueryConfig) -> Self {
    Self::build(config, None)
  }

  /// A client that loads any key without its own fetcher through `fetcher`.
  #[must_use]
  pub fn with_fetcher(config: QueryConfig, fetcher: Fetcher) -> Self {
    Self::build(config, Some(fetcher))
  }

  fn build(config: QueryConfig, default_fetcher: Option<Fetcher>) -> Self {
    let (events, _) = broadcast::channel(config.event_capacity.max(1));
    Self {
      inner: Arc::new(ClientInner {
        cells: DashMap::new(),
        config,
        default_fetcher,
        events,
      }),
    }
  }

  pub fn config(&self) -> &QueryConfig {
    &self.inner.config
  }

  /// Number of entries currently held.
  pub fn len(&self) -> usize {
    self.inner.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.cells.is_empty()
  }

  fn cell(&self, key: &QueryKey) -> Arc<QueryCell> {
    let cell = self
      .inner
      .cells
      .entry(key.clone())
      .or_insert_with(|| Arc::new(QueryCell::new(key.clone())));
    Arc::clone(cell.value())
  }

  /// Snapshot of the entry for `key`, if one exists.
  pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
    self.inner.cells.get(key).map(|cell| cell.snapshot())
  }

  /// True if `key` can be served without a network call.
  pub fn is_fresh(&self, key: &QueryKey) -> bool {
    self
      .peek(key)
      .is_some_and(|entry| entry.is_fresh(self.inner.config.stale_time))
  }

  /// Read `key`, loading it through the registered or default fetcher.
  pub async fn fetch(&self, key: &QueryKey) -> Result<Arc<Value>, QueryError> {
    let cell = self.cell(key);
    self.read(&cell).await
  }

  /// Read `key`, registering `fetcher` as the way to (re)load it.
  pub async fn fetch_with(
    &self,
    key: &QueryKey,
    fetcher: Fetcher,
  ) -> Result<Arc<Value>, QueryError> {
    let cell = self.cell(key);
    cell.lock().fetcher = Some(fetcher);
    self.read(&cell).await
  }

  /// Typed read: decode the cached JSON into `T`.
  pub async fn query<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<T, QueryError> {
    let value = self.fetch(key).await?;
    Ok(T::deserialize(&*value)?)
  }

  async fn read(&self, cell: &Arc<QueryCell>) -> Result<Arc<Value>, QueryError> {
    loop {
      let cached = {
        let entry = cell.entry.borrow();
        if entry.is_fresh(self.inner.config.stale_time) {
          entry.data.clone()
        } else {
          None
        }
      };
      if let Some(data) = cached {
        cell.touch();
        return Ok(data);
      }

      let (started_at, fetch) = self.ensure_fetch(cell)?;
      let outcome = fetch.await;

      // A fetch that began before an invalidation may carry pre-write data.
      if outcome.is_err() || started_at == cell.generation() {
        return outcome;
      }
      debug!(key = %cell.key, "entry invalidated during fetch, reading again");
    }
  }

  /// Join the in-flight fetch for `cell`, or start one.
  fn ensure_fetch(&self, cell: &Arc<QueryCell>) -> Result<(u64, SharedFetch), QueryError> {
    let mut state = cell.lock();
    state.last_used = Instant::now();

    if let Some(in_flight) = &state.in_flight {
      return Ok((in_flight.generation, in_flight.fetch.clone()));
    }

    let fetcher = state
      .fetcher
      .clone()
      .or_else(|| self.inner.default_fetcher.clone())
      .ok_or_else(|| QueryError::MissingFetcher(cell.key.to_string()))?;

    let generation = state.generation;
    cell.entry.send_modify(CacheEntry::begin_fetch);
    debug!(key = %cell.key, generation, "fetch started");
    self.emit(&cell.key, CacheEventKind::Fetching);

    let client = self.clone();
    let task_cell = Arc::clone(cell);
    let task = tokio::spawn(async move {
      let outcome = match AssertUnwindSafe(fetcher(task_cell.key.clone()))
        .catch_unwind()
        .await
      {
        Ok(result) => result.map(Arc::new),
        Err(_) => Err(QueryError::Cancelled),
      };
      client.settle(&task_cell, generation, &outcome);
      outcome
    });

    let fetch = async move { task.await.unwrap_or(Err(QueryError::Cancelled)) }
      .boxed()
      .shared();

    state.in_flight = Some(InFlight {
      generation,
      fetch: fetch.clone(),
    });
    Ok((generation, fetch))
  }

  fn settle(&self, cell: &Arc<QueryCell>, generation: u64, outcome: &Outcome) {
    let refetch = {
      let mut state = cell.lock();
      state.in_flight = None;
      state.last_used = Instant::now();
      let still_stale = state.generation != generation;
      cell.entry.send_modify(|entry| entry.settle(outcome, still_stale));
      still_stale && cell.subscriber_count() > 0
    };

    match outcome {
      Ok(_) => {
        debug!(key = %cell.key, "fetch settled");
        self.emit(&cell.key, CacheEventKind::Updated);
      }
      Err(e) => {
        warn!(key = %cell.key, error = %e, "fetch failed");
        self.emit(&cell.key, CacheEventKind::Failed(e.to_string()));
      }
    }

    if refetch {
      if let Err(e) = self.ensure_fetch(cell) {
        warn!(key = %cell.key, error = %e, "follow-up fetch not started");
      }
    }
  }

  /// Mark every entry equal to or under `prefix` stale.
  ///
  /// Entries someone is subscribed to are refetched right away; the rest
  /// refetch on their next read. Returns the number of entries touched.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    self.invalidate_matching(&[prefix])
  }

  /// Invalidate everything under any of `keys`.
  ///
  /// Overlapping prefixes count once: each matched entry is marked stale a
  /// single time and gets at most one refetch.
  pub fn invalidate_all<'a>(&self, keys: impl IntoIterator<Item = &'a QueryKey>) -> usize {
    let prefixes: Vec<&QueryKey> = keys.into_iter().collect();
    self.invalidate_matching(&prefixes)
  }

  fn invalidate_matching(&self, prefixes: &[&QueryKey]) -> usize {
    let cells: Vec<Arc<QueryCell>> = self
      .inner
      .cells
      .iter()
      .filter(|cell| prefixes.iter().any(|prefix| cell.key().starts_with(prefix)))
      .map(|cell| Arc::clone(cell.value()))
      .collect();

    for cell in &cells {
      let refetch_now = {
        let mut state = cell.lock();
        state.generation += 1;
        cell.entry.send_modify(|entry| entry.is_stale = true);
        cell.subscriber_count() > 0 && state.in_flight.is_none()
      };
      self.emit(&cell.key, CacheEventKind::Invalidated);

      if refetch_now {
        if let Err(e) = self.ensure_fetch(cell) {
          warn!(key = %cell.key, error = %e, "refetch after invalidation not started");
        }
      }
    }

    info!(prefixes = ?prefixes, entries = cells.len(), "invalidated");
    cells.len()
  }

  /// Subscribe a view to `key`.
  ///
  /// Mounting triggers a fetch unless the entry is fresh. Dropping the
  /// observer deregisters it.
  pub fn observe<T: DeserializeOwned>(
    &self,
    key: &QueryKey,
    fetcher: Option<Fetcher>,
  ) -> QueryObserver<T> {
    let cell = self.cell(key);
    let rx = cell.subscribe();
    if fetcher.is_some() {
      cell.lock().fetcher = fetcher;
    }

    if !cell.snapshot().is_fresh(self.inner.config.stale_time) {
      if let Err(e) = self.ensure_fetch(&cell) {
        warn!(key = %key, error = %e, "fetch on mount not started");
      }
    }

    QueryObserver::new(self.clone(), cell, rx)
  }

  /// Raw feed of every cache event.
  pub fn events(&self) -> broadcast::Receiver<CacheEvent> {
    self.inner.events.subscribe()
  }

  /// Subscribe to cache events for every key under `prefix`.
  pub fn subscribe_prefix(&self, prefix: QueryKey) -> PrefixSubscriber {
    PrefixSubscriber::new(prefix, self.inner.events.subscribe())
  }

  /// Drop entries nobody observes that have sat idle past `gc_time`.
  pub fn collect_garbage(&self) -> usize {
    let gc_time = self.inner.config.gc_time;
    let mut removed = Vec::new();

    self.inner.cells.retain(|key, cell| {
      if cell.subscriber_count() > 0 {
        return true;
      }
      let state = cell.lock();
      let keep = state.in_flight.is_some() || state.last_used.elapsed() <= gc_time;
      if !keep {
        removed.push(key.clone());
      }
      keep
    });

    for key in &removed {
      self.emit(key, CacheEventKind::Removed);
    }
    if !removed.is_empty() {
      debug!(entries = removed.len(), "collected idle entries");
    }
    removed.len()
  }

  fn emit(&self, key: &QueryKey, kind: CacheEventKind) {
    // No subscribers is fine
    let _ = self.inner.events.send(CacheEvent {
      key: key.clone(),
      kind,
    });
  }
}
