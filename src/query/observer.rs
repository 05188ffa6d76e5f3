//! View-level registrations on the cache.

use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use super::client::{CacheEvent, QueryCell, QueryClient};
use super::entry::{CacheEntry, QueryStatus};
use super::error::QueryError;
use super::key::QueryKey;

/// Typed view of one cache entry.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
  pub status: QueryStatus,
  pub data: Option<T>,
  pub error: Option<QueryError>,
  pub is_stale: bool,
  pub is_fetching: bool,
}

impl<T> Default for QueryResult<T> {
  fn default() -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      is_stale: false,
      is_fetching: false,
    }
  }
}

impl<T: DeserializeOwned> QueryResult<T> {
  /// Decode an entry. A shape mismatch becomes a `Decode` error here, at the
  /// boundary, instead of surfacing later in a view.
  pub fn from_entry(entry: &CacheEntry) -> Self {
    let decoded = entry
      .data
      .as_deref()
      .map(|value| T::deserialize(value).map_err(QueryError::from));

    let (data, decode_error) = match decoded {
      Some(Ok(data)) => (Some(data), None),
      Some(Err(e)) => (None, Some(e)),
      None => (None, None),
    };

    let status = if decode_error.is_some() {
      QueryStatus::Error
    } else {
      entry.status
    };

    Self {
      status,
      data,
      error: decode_error.or_else(|| entry.error.clone()),
      is_stale: entry.is_stale,
      is_fetching: entry.is_fetching,
    }
  }
}

impl<T> QueryResult<T> {
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  /// Loading with nothing to show yet.
  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading && self.data.is_none()
  }

  /// Loading while the previous data is still on screen.
  pub fn is_refetching(&self) -> bool {
    self.is_fetching && self.data.is_some()
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Success
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  pub fn error(&self) -> Option<&QueryError> {
    self.error.as_ref()
  }
}

/// A subscriber bound to one query key.
///
/// Created through [`QueryClient::observe`] (mount) and deregistered when
/// dropped (unmount). Fetches started on its behalf keep running after it is
/// gone and still populate the cache.
pub struct QueryObserver<T> {
  client: QueryClient,
  cell: Arc<QueryCell>,
  rx: watch::Receiver<CacheEntry>,
  current: QueryResult<T>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> QueryObserver<T> {
  pub(crate) fn new(
    client: QueryClient,
    cell: Arc<QueryCell>,
    mut rx: watch::Receiver<CacheEntry>,
  ) -> Self {
    let current = QueryResult::from_entry(&rx.borrow_and_update());
    Self {
      client,
      cell,
      rx,
      current,
      _marker: PhantomData,
    }
  }

  pub fn key(&self) -> &QueryKey {
    self.cell.key()
  }

  /// The last state this observer has seen.
  pub fn current(&self) -> &QueryResult<T> {
    &self.current
  }

  /// Pick up a change without blocking. Returns `true` if the state moved.
  pub fn poll(&mut self) -> bool {
    match self.rx.has_changed() {
      Ok(true) => {
        self.current = QueryResult::from_entry(&self.rx.borrow_and_update());
        true
      }
      _ => false,
    }
  }

  /// Wait for the next change. `None` once the entry has been collected.
  pub async fn changed(&mut self) -> Option<&QueryResult<T>> {
    self.rx.changed().await.ok()?;
    self.current = QueryResult::from_entry(&self.rx.borrow_and_update());
    Some(&self.current)
  }

  /// Wait until no fetch is in flight for this key.
  pub async fn settled(&mut self) -> QueryResult<T>
  where
    T: Clone,
  {
    self.poll();
    while self.current.is_fetching {
      if self.changed().await.is_none() {
        break;
      }
    }
    self.current.clone()
  }

  /// Manual refresh: mark the key stale, which refetches it for us.
  pub fn refresh(&self) -> usize {
    self.client.invalidate(self.cell.key())
  }
}

impl<T> Drop for QueryObserver<T> {
  fn drop(&mut self) {
    self.cell.touch();
  }
}

impl<T> std::fmt::Debug for QueryObserver<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryObserver")
      .field("key", self.cell.key())
      .field("status", &self.current.status)
      .finish_non_exhaustive()
  }
}

/// Receives cache events for every key under a prefix.
pub struct PrefixSubscriber {
  prefix: QueryKey,
  rx: broadcast::Receiver<CacheEvent>,
}

impl PrefixSubscriber {
  pub(crate) fn new(prefix: QueryKey, rx: broadcast::Receiver<CacheEvent>) -> Self {
    Self { prefix, rx }
  }

  pub fn prefix(&self) -> &QueryKey {
    &self.prefix
  }

  /// Next matching event. `None` once the client is gone.
  pub async fn next(&mut self) -> Option<CacheEvent> {
    loop {
      match self.rx.recv().await {
        Ok(event) if event.key.starts_with(&self.prefix) => return Some(event),
        Ok(_) => {}
        // Missed events are fine; the entries themselves are authoritative
        Err(broadcast::error::RecvError::Lagged(_)) => {}
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }

  /// Next matching event if one is already queued.
  pub fn try_next(&mut self) -> Option<CacheEvent> {
    loop {
      match self.rx.try_recv() {
        Ok(event) if event.key.starts_with(&self.prefix) => return Some(event),
        Ok(_) => {}
        Err(broadcast::error::TryRecvError::Lagged(_)) => {}
        Err(_) => return None,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::fetcher;
  use crate::query_key;
  use serde::Deserialize;
  use serde_json::json;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug, Clone, PartialEq, Deserialize)]
  struct Row {
    id: u64,
  }

  #[test]
  fn test_result_from_idle_entry() {
    let result: QueryResult<Vec<Row>> = QueryResult::from_entry(&CacheEntry::default());
    assert_eq!(result.status, QueryStatus::Idle);
    assert!(result.data().is_none());
    assert!(!result.is_loading());
  }

  #[test]
  fn test_shape_mismatch_is_a_decode_error() {
    let entry = CacheEntry {
      status: QueryStatus::Success,
      data: Some(Arc::new(json!({"unexpected": true}))),
      ..CacheEntry::default()
    };
    let result: QueryResult<Vec<Row>> = QueryResult::from_entry(&entry);
    assert!(result.is_error());
    assert!(matches!(result.error(), Some(QueryError::Decode(_))));
  }

  #[test]
  fn test_refetching_keeps_data() {
    let entry = CacheEntry {
      status: QueryStatus::Loading,
      data: Some(Arc::new(json!([{"id": 1}]))),
      is_fetching: true,
      ..CacheEntry::default()
    };
    let result: QueryResult<Vec<Row>> = QueryResult::from_entry(&entry);
    assert!(result.is_refetching());
    assert!(!result.is_loading());
    assert_eq!(result.data(), Some(&vec![Row { id: 1 }]));
  }

  #[tokio::test]
  async fn test_observer_mount_loads_then_settles() {
    let client = QueryClient::new();
    let f = fetcher(|_key| async { Ok(json!([{"id": 9}])) });
    let mut observer = client.observe::<Vec<Row>>(&query_key!["/api/units"], Some(f));

    assert!(observer.current().is_loading());
    let result = observer.settled().await;
    assert!(result.is_success());
    assert_eq!(result.data, Some(vec![Row { id: 9 }]));
  }

  #[tokio::test]
  async fn test_observer_on_fresh_entry_is_populated_immediately() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let f = {
      let calls = calls.clone();
      fetcher(move |_key| {
        let calls = calls.clone();
        async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(json!([{"id": 2}]))
        }
      })
    };
    let key = query_key!["/api/tenants"];
    client.fetch_with(&key, f).await.unwrap();

    let observer = client.observe::<Vec<Row>>(&key, None);
    assert!(observer.current().is_success());
    assert_eq!(observer.current().data(), Some(&vec![Row { id: 2 }]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refresh_refetches_observed_key() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let f = {
      let calls = calls.clone();
      fetcher(move |_key| {
        let calls = calls.clone();
        async move {
          let n = calls.fetch_add(1, Ordering::SeqCst) as u64;
          Ok(json!([{ "id": n }]))
        }
      })
    };
    let mut observer = client.observe::<Vec<Row>>(&query_key!["/api/loans"], Some(f));
    observer.settled().await;

    assert_eq!(observer.refresh(), 1);
    let result = observer.settled().await;
    assert_eq!(result.data, Some(vec![Row { id: 1 }]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_poll_without_changes() {
    let client = QueryClient::new();
    let f = fetcher(|_key| async { Ok(json!([])) });
    let mut observer = client.observe::<Vec<Row>>(&query_key!["/api/invoices"], Some(f));
    observer.settled().await;
    assert!(!observer.poll());
  }
}
