use crate::config::{ApiConfig, Unauthorized};
use crate::query::{fetcher, Fetcher, QueryError, QueryKey};
use color_eyre::{eyre::eyre, Result};
use reqwest::cookie::Jar;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::writes::Write;

/// Session-authenticated JSON client for the property-management API
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
  on_unauthorized: Unauthorized,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let mut base =
      Url::parse(&config.url).map_err(|e| eyre!("Invalid API url {}: {}", config.url, e))?;
    // Request paths are joined under the base path, which needs a trailing slash
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let jar = Jar::default();
    match ApiConfig::session_value() {
      Some(value) => {
        jar.add_cookie_str(&format!("{}={}", config.session_cookie, value), &base);
      }
      None => warn!("RENTDESK_SESSION not set, requests will be anonymous"),
    }

    let http = reqwest::Client::builder()
      .cookie_provider(Arc::new(jar))
      .user_agent(concat!("rentdesk/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      on_unauthorized: config.on_unauthorized,
    })
  }

  fn url(&self, path: &str) -> Result<Url, QueryError> {
    self
      .base
      .join(path.trim_start_matches('/'))
      .map_err(|e| QueryError::Network(format!("bad request path {}: {}", path, e)))
  }

  /// Send one request and decode the JSON response.
  ///
  /// Non-2xx responses become [`QueryError::Status`] carrying the server's
  /// message. Empty bodies decode as `null`.
  pub async fn request(
    &self,
    method: Method,
    path: &str,
    body: Option<&Value>,
  ) -> Result<Value, QueryError> {
    let url = self.url(path)?;
    debug!(%method, %url, "api request");

    let mut request = self.http.request(method, url);
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| QueryError::Network(e.to_string()))?;
    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| QueryError::Network(e.to_string()))?;

    decode_response(status, &text)
  }

  pub async fn get(&self, path: &str) -> Result<Value, QueryError> {
    self.request(Method::GET, path, None).await
  }

  /// Perform a typed write.
  pub async fn send(&self, write: &Write) -> Result<Value, QueryError> {
    let body = write.body()?;
    self
      .request(write.method(), &write.path(), body.as_ref())
      .await
  }

  /// The default query function: GET the key's path.
  pub fn fetcher(&self) -> Fetcher {
    let api = self.clone();
    fetcher(move |key: QueryKey| {
      let api = api.clone();
      async move {
        let result = api.get(&key.to_path()).await;
        on_unauthorized(result, api.on_unauthorized)
      }
    })
  }
}

impl std::fmt::Debug for ApiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiClient")
      .field("base", &self.base.as_str())
      .finish_non_exhaustive()
  }
}

fn on_unauthorized(
  result: Result<Value, QueryError>,
  behavior: Unauthorized,
) -> Result<Value, QueryError> {
  match (result, behavior) {
    (Err(e), Unauthorized::ReturnNull) if e.is_unauthorized() => Ok(Value::Null),
    (result, _) => result,
  }
}

fn decode_response(status: StatusCode, text: &str) -> Result<Value, QueryError> {
  if !status.is_success() {
    return Err(error_from_body(status, text));
  }
  if text.trim().is_empty() {
    return Ok(Value::Null);
  }
  serde_json::from_str(text).map_err(QueryError::from)
}

/// Build the error for a failed response.
///
/// Prefers the body's `message` field, then the raw body, then the status's
/// canonical reason.
fn error_from_body(status: StatusCode, text: &str) -> QueryError {
  #[derive(Deserialize)]
  struct ErrorBody {
    message: String,
  }

  let message = match serde_json::from_str::<ErrorBody>(text) {
    Ok(body) => body.message,
    Err(_) if !text.trim().is_empty() => text.trim().to_string(),
    Err(_) => status
      .canonical_reason()
      .unwrap_or("Request failed")
      .to_string(),
  };

  QueryError::Status {
    status: status.as_u16(),
    message,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_error_message_from_json_body() {
    let err = error_from_body(
      StatusCode::UNPROCESSABLE_ENTITY,
      r#"{"message":"Tenant already has an active lease"}"#,
    );
    assert_eq!(err.to_string(), "Tenant already has an active lease");
    assert!(err.is_server_reported());
  }

  #[test]
  fn test_error_message_falls_back_to_text_then_reason() {
    let err = error_from_body(StatusCode::BAD_GATEWAY, "upstream timeout\n");
    assert_eq!(err.to_string(), "upstream timeout");
    assert!(!err.is_server_reported());

    let err = error_from_body(StatusCode::NOT_FOUND, "");
    assert_eq!(err.to_string(), "Not Found");
  }

  #[test]
  fn test_empty_success_is_null() {
    assert_eq!(decode_response(StatusCode::NO_CONTENT, "").unwrap(), Value::Null);
    assert_eq!(
      decode_response(StatusCode::OK, r#"[{"id":1}]"#).unwrap(),
      json!([{"id": 1}])
    );
  }

  #[test]
  fn test_garbage_success_body_is_decode_error() {
    let err = decode_response(StatusCode::OK, "<html>").unwrap_err();
    assert!(matches!(err, QueryError::Decode(_)));
  }

  #[test]
  fn test_unauthorized_behavior() {
    let unauthorized = || {
      Err(QueryError::Status {
        status: 401,
        message: "Unauthorized".to_string(),
      })
    };
    assert_eq!(
      on_unauthorized(unauthorized(), Unauthorized::ReturnNull).unwrap(),
      Value::Null
    );
    assert!(on_unauthorized(unauthorized(), Unauthorized::Fail).is_err());

    let forbidden = Err(QueryError::Status {
      status: 403,
      message: "Forbidden".to_string(),
    });
    assert!(on_unauthorized(forbidden, Unauthorized::ReturnNull).is_err());
  }

  #[test]
  fn test_paths_resolve_against_base() {
    let config = ApiConfig {
      url: "https://rent.example.com".to_string(),
      ..ApiConfig::default()
    };
    let api = ApiClient::new(&config).unwrap();
    assert_eq!(
      api.url("/api/owners/5/team").unwrap().as_str(),
      "https://rent.example.com/api/owners/5/team"
    );
  }

  #[test]
  fn test_paths_keep_base_path_prefix() {
    for url in ["https://rent.example.com/portal", "https://rent.example.com/portal/"] {
      let config = ApiConfig {
        url: url.to_string(),
        ..ApiConfig::default()
      };
      let api = ApiClient::new(&config).unwrap();
      assert_eq!(
        api.url("/api/properties/4/tree").unwrap().as_str(),
        "https://rent.example.com/portal/api/properties/4/tree"
      );
    }
  }
}
