mod api;
mod app;
mod commands;
mod config;
mod event;
mod form;
mod logging;
mod page;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rentdesk")]
#[command(about = "A terminal client for property management")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rentdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base url, overrides the config file
  #[arg(short, long)]
  url: Option<String>,

  /// Owner whose team is shown
  #[arg(short, long)]
  owner: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.url {
    config.api.url = url;
  }
  if let Some(owner) = args.owner {
    config.owner_id = Some(owner);
  }

  let _log_guard = logging::init(&config.log)?;
  tracing::info!(url = %config.api.url, "starting rentdesk");

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
