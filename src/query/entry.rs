use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::QueryError;

/// Lifecycle of one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
  /// Created, nothing requested yet
  #[default]
  Idle,
  /// A fetch is in flight. `data` may still hold the previous value.
  Loading,
  /// Last fetch succeeded
  Success,
  /// Last fetch failed. `data` still holds the last good value, if any.
  Error,
}

/// The stored state for one query key.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
  pub status: QueryStatus,
  pub data: Option<Arc<Value>>,
  pub error: Option<QueryError>,
  pub fetched_at: Option<Instant>,
  /// Set by invalidation, cleared only by a successful fetch that started
  /// after it.
  pub is_stale: bool,
  pub is_fetching: bool,
}

impl CacheEntry {
  /// Fresh data can be served without touching the network.
  pub fn is_fresh(&self, stale_time: Duration) -> bool {
    if self.is_stale || self.data.is_none() {
      return false;
    }
    match self.fetched_at {
      Some(at) => at.elapsed() <= stale_time,
      None => false,
    }
  }

  /// Refetching while previous data is still available.
  pub fn is_refetching(&self) -> bool {
    self.is_fetching && self.data.is_some()
  }

  pub(crate) fn begin_fetch(&mut self) {
    self.status = QueryStatus::Loading;
    self.is_fetching = true;
  }

  pub(crate) fn settle(&mut self, outcome: &Result<Arc<Value>, QueryError>, still_stale: bool) {
    self.is_fetching = false;
    match outcome {
      Ok(data) => {
        self.is_stale = still_stale;
        self.status = QueryStatus::Success;
        self.data = Some(Arc::clone(data));
        self.error = None;
        self.fetched_at = Some(Instant::now());
      }
      Err(e) => {
        // Keep the last good data around, still marked stale if it was
        self.is_stale |= still_stale;
        self.status = QueryStatus::Error;
        self.error = Some(e.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::thread::sleep;

  fn settled(value: Value) -> CacheEntry {
    let mut entry = CacheEntry::default();
    entry.begin_fetch();
    entry.settle(&Ok(Arc::new(value)), false);
    entry
  }

  #[test]
  fn test_new_entry_is_idle() {
    let entry = CacheEntry::default();
    assert_eq!(entry.status, QueryStatus::Idle);
    assert!(!entry.is_fresh(Duration::MAX));
  }

  #[test]
  fn test_success_is_fresh() {
    let entry = settled(json!([1, 2]));
    assert_eq!(entry.status, QueryStatus::Success);
    assert!(entry.is_fresh(Duration::MAX));
    assert!(!entry.is_fetching);
  }

  #[test]
  fn test_freshness_expires() {
    let entry = settled(json!(1));
    sleep(Duration::from_millis(10));
    assert!(!entry.is_fresh(Duration::from_millis(5)));
  }

  #[test]
  fn test_stale_flag_overrides_time() {
    let mut entry = settled(json!(1));
    entry.is_stale = true;
    assert!(!entry.is_fresh(Duration::MAX));
  }

  #[test]
  fn test_error_keeps_previous_data() {
    let mut entry = settled(json!({"id": 1}));
    entry.begin_fetch();
    assert!(entry.is_refetching());

    entry.settle(&Err(QueryError::Network("down".to_string())), false);
    assert_eq!(entry.status, QueryStatus::Error);
    assert_eq!(entry.data.as_deref(), Some(&json!({"id": 1})));
    assert!(entry.error.is_some());
  }

  #[test]
  fn test_failed_fetch_does_not_clear_invalidation() {
    let mut entry = settled(json!({"id": 1}));
    entry.is_stale = true;
    entry.begin_fetch();

    entry.settle(&Err(QueryError::Network("down".to_string())), false);
    assert!(entry.is_stale);
    assert!(!entry.is_fresh(Duration::MAX));

    entry.begin_fetch();
    entry.settle(&Ok(Arc::new(json!({"id": 2}))), false);
    assert!(!entry.is_stale);
    assert!(entry.is_fresh(Duration::MAX));
  }
}
