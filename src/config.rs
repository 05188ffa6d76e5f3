use crate::query::QueryConfig;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  /// Owner whose team and invitations are shown
  pub owner_id: Option<u64>,
  #[serde(default)]
  pub query: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

/// What the default fetcher does with a 401
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Unauthorized {
  /// Reject with the server's error
  #[default]
  Fail,
  /// Resolve to `null`, e.g. for "current user" style endpoints
  ReturnNull,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_url")]
  pub url: String,
  /// Name of the session cookie; its value comes from RENTDESK_SESSION
  #[serde(default = "default_session_cookie")]
  pub session_cookie: String,
  #[serde(default)]
  pub on_unauthorized: Unauthorized,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_url(),
      session_cookie: default_session_cookie(),
      on_unauthorized: Unauthorized::default(),
    }
  }
}

fn default_url() -> String {
  "http://localhost:5000".to_string()
}

fn default_session_cookie() -> String {
  "connect.sid".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before cached data goes stale on its own; unset means only
  /// invalidation makes it stale
  pub stale_secs: Option<u64>,
  #[serde(default = "default_gc_secs")]
  pub gc_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_secs: None,
      gc_secs: default_gc_secs(),
    }
  }
}

fn default_gc_secs() -> u64 {
  300
}

impl CacheConfig {
  pub fn to_query_config(&self) -> QueryConfig {
    let stale_time = self.stale_secs.map_or(Duration::MAX, Duration::from_secs);
    QueryConfig::new(stale_time, Duration::from_secs(self.gc_secs))
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  #[serde(default = "default_level")]
  pub level: String,
  /// Directory for log files (defaults to the platform data dir)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      dir: None,
    }
  }
}

fn default_level() -> String {
  "info".to_string()
}

impl ApiConfig {
  /// Session cookie value from the RENTDESK_SESSION environment variable.
  pub fn session_value() -> Option<String> {
    std::env::var("RENTDESK_SESSION")
      .ok()
      .filter(|v| !v.is_empty())
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rentdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rentdesk/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("rentdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rentdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file parses as null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_full_config() {
    let config = Config::parse(
      r#"
api:
  url: https://rent.example.com
  session_cookie: sid
  on_unauthorized: return_null
owner_id: 5
query:
  stale_secs: 30
  gc_secs: 60
log:
  level: debug
"#,
    )
    .unwrap();

    assert_eq!(config.api.url, "https://rent.example.com");
    assert_eq!(config.api.session_cookie, "sid");
    assert_eq!(config.api.on_unauthorized, Unauthorized::ReturnNull);
    assert_eq!(config.owner_id, Some(5));
    assert_eq!(config.log.level, "debug");

    let query = config.query.to_query_config();
    assert_eq!(query.stale_time, Duration::from_secs(30));
    assert_eq!(query.gc_time, Duration::from_secs(60));
  }

  #[test]
  fn test_defaults() {
    let config = Config::parse("owner_id: 2\n").unwrap();
    assert_eq!(config.api.url, "http://localhost:5000");
    assert_eq!(config.api.session_cookie, "connect.sid");
    assert_eq!(config.api.on_unauthorized, Unauthorized::Fail);
    assert_eq!(config.query.to_query_config().stale_time, Duration::MAX);
    assert_eq!(config.log.level, "info");

    let empty = Config::parse("").unwrap();
    assert_eq!(empty.owner_id, None);
  }

  #[test]
  fn test_unknown_unauthorized_mode_rejected() {
    assert!(Config::parse("api:\n  on_unauthorized: redirect\n").is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    let err = Config::load(Some(Path::new("/nonexistent/rentdesk.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
