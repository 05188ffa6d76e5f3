use thiserror::Error;

/// Failure of a fetch or mutation.
///
/// Cloneable so one settled fetch can hand the same error to every reader
/// that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
  /// The request never produced a response (DNS, connect, TLS, timeout).
  #[error("Network error: {0}")]
  Network(String),

  /// The server answered with a non-success status. `message` is the body's
  /// `message` field, unmodified.
  #[error("{message}")]
  Status { status: u16, message: String },

  /// The response arrived but did not match the expected shape.
  #[error("Unexpected response: {0}")]
  Decode(String),

  /// The fetch task went away before settling.
  #[error("Request was cancelled")]
  Cancelled,

  /// Neither the entry nor the client has a fetcher for this key.
  #[error("No fetcher registered for {0}")]
  MissingFetcher(String),
}

impl QueryError {
  /// A 4xx whose message is meant for the user.
  pub fn is_server_reported(&self) -> bool {
    matches!(self, QueryError::Status { status, .. } if (400..500).contains(status))
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, QueryError::Status { status: 401, .. })
  }

  /// Text to show in a notification.
  ///
  /// Business errors are shown verbatim; transport, 5xx and shape failures
  /// collapse into one generic message.
  pub fn user_message(&self) -> String {
    if self.is_server_reported() {
      self.to_string()
    } else {
      match self {
        QueryError::Cancelled => self.to_string(),
        _ => "Something went wrong. Press 'r' to retry.".to_string(),
      }
    }
  }
}

impl From<serde_json::Error> for QueryError {
  fn from(e: serde_json::Error) -> Self {
    QueryError::Decode(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_displays_message_verbatim() {
    let err = QueryError::Status {
      status: 409,
      message: "Unit already has an active lease".to_string(),
    };
    assert_eq!(err.to_string(), "Unit already has an active lease");
    assert_eq!(err.user_message(), "Unit already has an active lease");
    assert!(err.is_server_reported());
  }

  #[test]
  fn test_server_failures_are_generic() {
    let err = QueryError::Status {
      status: 502,
      message: "Bad Gateway".to_string(),
    };
    assert!(!err.is_server_reported());
    assert!(err.user_message().contains("retry"));

    let err = QueryError::Network("connection refused".to_string());
    assert!(err.user_message().contains("retry"));
  }

  #[test]
  fn test_unauthorized() {
    let err = QueryError::Status {
      status: 401,
      message: "Unauthorized".to_string(),
    };
    assert!(err.is_unauthorized());
  }
}
