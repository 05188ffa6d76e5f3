use std::time::Duration;

/// Configuration for query behavior.
#[derive(Debug, Clone)]
pub struct QueryConfig {
  /// How long fetched data is served without refetching.
  ///
  /// `Duration::MAX` keeps data fresh until it is invalidated.
  pub stale_time: Duration,

  /// How long an entry with no subscribers is kept before collection.
  pub gc_time: Duration,

  /// Capacity of the cache event broadcast.
  pub event_capacity: usize,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      stale_time: Duration::MAX,
      gc_time: Duration::from_secs(5 * 60),
      event_capacity: 256,
    }
  }
}

impl QueryConfig {
  #[must_use]
  pub const fn new(stale_time: Duration, gc_time: Duration) -> Self {
    Self {
      stale_time,
      gc_time,
      event_capacity: 256,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_config() {
    let config = QueryConfig::default();
    assert_eq!(config.stale_time, Duration::MAX);
    assert_eq!(config.gc_time, Duration::from_secs(300));
  }

  #[test]
  fn test_new_config() {
    let config = QueryConfig::new(Duration::from_secs(30), Duration::from_secs(60));
    assert_eq!(config.stale_time, Duration::from_secs(30));
    assert_eq!(config.gc_time, Duration::from_secs(60));
  }
}
