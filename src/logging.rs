use crate::config::LogConfig;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to a daily log file.
///
/// The terminal belongs to the UI, so nothing is logged to stdout or
/// stderr. `RUST_LOG` takes precedence over the configured level. Keep the
/// returned guard alive until exit so buffered lines get flushed.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let dir = log_dir(config)?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "rentdesk.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&config.level))
    .unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  Ok(guard)
}

fn log_dir(config: &LogConfig) -> Result<PathBuf> {
  if let Some(dir) = &config.dir {
    return Ok(dir.clone());
  }
  dirs::data_dir()
    .map(|d| d.join("rentdesk").join("logs"))
    .ok_or_else(|| eyre!("Could not determine a data directory for logs"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_explicit_log_dir_wins() {
    let config = LogConfig {
      level: "debug".to_string(),
      dir: Some(PathBuf::from("/tmp/rentdesk-logs")),
    };
    assert_eq!(log_dir(&config).unwrap(), PathBuf::from("/tmp/rentdesk-logs"));
  }
}
