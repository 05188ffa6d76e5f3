//! Query keys: ordered, path-like identifiers for cached server resources.
//!
//! The first segment is always the REST path and the following segments are
//! path parameters in URL order, so `["/api/owners", 5, "team"]` addresses
//! `GET /api/owners/5/team`. Invalidation works on key prefixes, which is why
//! that ordering matters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One primitive segment of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
  Int(i64),
  Str(String),
}

impl fmt::Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Segment::Int(n) => write!(f, "{}", n),
      Segment::Str(s) => f.write_str(s),
    }
  }
}

impl From<&str> for Segment {
  fn from(s: &str) -> Self {
    Segment::Str(s.to_string())
  }
}

impl From<String> for Segment {
  fn from(s: String) -> Self {
    Segment::Str(s)
  }
}

impl From<&String> for Segment {
  fn from(s: &String) -> Self {
    Segment::Str(s.clone())
  }
}

macro_rules! int_segment {
  ($($t:ty),*) => {
    $(
      impl From<$t> for Segment {
        fn from(n: $t) -> Self {
          Segment::Int(n as i64)
        }
      }
    )*
  };
}

int_segment!(i32, i64, u32, u64, usize);

/// An ordered sequence of segments addressing one cached resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<Segment>);

impl QueryKey {
  pub fn new(segments: Vec<Segment>) -> Self {
    Self(segments)
  }

  pub fn segments(&self) -> &[Segment] {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Extend this key with one more segment.
  pub fn with(mut self, segment: impl Into<Segment>) -> Self {
    self.0.push(segment.into());
    self
  }

  /// True if `prefix` is a leading subsequence of this key.
  ///
  /// Every key is a prefix of itself, and the empty key matches everything.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }

  /// The request path this key addresses: segments joined by `/`.
  pub fn to_path(&self) -> String {
    self
      .0
      .iter()
      .map(|s| s.to_string())
      .collect::<Vec<_>>()
      .join("/")
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match serde_json::to_string(self) {
      Ok(s) => f.write_str(&s),
      Err(_) => f.write_str(&self.to_path()),
    }
  }
}

impl<S: Into<Segment>> FromIterator<S> for QueryKey {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}

/// Build a [`QueryKey`] from heterogeneous segments.
///
/// ```ignore
/// let key = query_key!["/api/owners", owner_id, "team"];
/// ```
#[macro_export]
macro_rules! query_key {
  ($($segment:expr),* $(,)?) => {
    $crate::query::QueryKey::new(vec![$($crate::query::Segment::from($segment)),*])
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_equality_is_element_wise() {
    assert_eq!(query_key!["/api/owners", 5], query_key!["/api/owners", 5u64]);
    assert_ne!(query_key!["/api/owners", 5], query_key!["/api/owners", "5"]);
    assert_ne!(query_key!["/api/owners"], query_key!["/api/owners", 5]);
  }

  #[test]
  fn test_prefix_match() {
    let owner = query_key!["/api/owners", 5];
    assert!(query_key!["/api/owners", 5, "team"].starts_with(&owner));
    assert!(query_key!["/api/owners", 5, "invitations"].starts_with(&owner));
    assert!(owner.starts_with(&owner));
    assert!(!query_key!["/api/owners", 6].starts_with(&owner));
    assert!(!query_key!["/api/owners"].starts_with(&owner));
  }

  #[test]
  fn test_empty_prefix_matches_everything() {
    assert!(query_key!["/api/leases"].starts_with(&QueryKey::default()));
  }

  #[test]
  fn test_to_path() {
    assert_eq!(
      query_key!["/api/owners", 5, "team"].to_path(),
      "/api/owners/5/team"
    );
    assert_eq!(query_key!["/api/leases"].to_path(), "/api/leases");
  }

  #[test]
  fn test_serializes_as_json_array() {
    let key = query_key!["/api/properties", 12, "tree"];
    assert_eq!(key.to_string(), r#"["/api/properties",12,"tree"]"#);

    let parsed: QueryKey = serde_json::from_str(r#"["/api/properties",12,"tree"]"#).unwrap();
    assert_eq!(parsed, key);
  }

  #[test]
  fn test_with_appends_segment() {
    let key = query_key!["/api/owners"].with(5).with("team");
    assert_eq!(key, query_key!["/api/owners", 5, "team"]);
    assert_eq!(key.len(), 3);
  }
}
