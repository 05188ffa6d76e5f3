use crate::api::ApiClient;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::query::{CacheEvent, CacheEventKind, PrefixSubscriber, QueryClient, QueryKey};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{self, Context};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);
const GC_INTERVAL: Duration = Duration::from_secs(30);
const INITIAL_VIEW: &str = "properties";

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  command_input: CommandInput,

  ctx: Context,

  /// Every cache event, for the footer's activity line
  cache_events: PrefixSubscriber,
  cache_activity: Option<String>,

  api_url: String,
  last_gc: Instant,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let api = ApiClient::new(&config.api)?;
    let client = QueryClient::with_fetcher(config.query.to_query_config(), api.fetcher());
    let cache_events = client.subscribe_prefix(QueryKey::default());

    let ctx = Context {
      client,
      api,
      owner_id: config.owner_id,
    };

    let root = views::root_view(INITIAL_VIEW, &ctx).into_iter().collect();

    Ok(Self {
      view_stack: root,
      command_input: CommandInput::new(),
      ctx,
      cache_events,
      cache_activity: None,
      api_url: config.api.url,
      last_gc: Instant::now(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(TICK_RATE);
    let result = self.main_loop(&mut terminal, &mut events).await;

    // Restore the terminal even if drawing failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {}
      Event::Tick => self.tick(),
    }
  }

  fn tick(&mut self) {
    // Every view on the stack stays subscribed; keep them all current
    for view in &mut self.view_stack {
      view.tick();
    }

    while let Some(event) = self.cache_events.try_next() {
      self.cache_activity = Some(describe(&event));
    }

    if self.last_gc.elapsed() >= GC_INTERVAL {
      self.ctx.client.collect_garbage();
      self.last_gc = Instant::now();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let capturing = self.current_view().is_some_and(|v| v.is_capturing());
    if !capturing {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => match key.code {
        KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
        _ => ViewAction::None,
      },
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    if cmd == "quit" {
      self.should_quit = true;
      return;
    }
    match views::root_view(cmd, &self.ctx) {
      Some(view) => {
        info!(view = cmd, "switching root view");
        self.view_stack.clear();
        self.view_stack.push(view);
      }
      None => warn!(command = cmd, "unknown command"),
    }
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  pub fn cache_activity(&self) -> Option<&str> {
    self.cache_activity.as_deref()
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}

/// One-line summary of a cache event for the footer
fn describe(event: &CacheEvent) -> String {
  let path = event.key.to_path();
  match &event.kind {
    CacheEventKind::Fetching => format!("loading {}", path),
    CacheEventKind::Updated => format!("updated {}", path),
    CacheEventKind::Failed(message) => format!("{} failed: {}", path, message),
    CacheEventKind::Invalidated => format!("refreshing {}", path),
    CacheEventKind::Removed => format!("evicted {}", path),
  }
}
