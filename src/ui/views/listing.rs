use crate::api::Write;
use crate::page::{Page, PageState, SubmitError, Submission};
use crate::query::{MutationCallbacks, MutationRunner, MutationState, QueryKey, QueryObserver};
use crate::ui::components::{ConfirmDialog, FormEvent, FormPanel, KeyResult};
use crate::ui::ensure_valid_selection;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::Context;

/// Which slice of the data a list shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
  pub owner_id: Option<u64>,
  pub property_id: Option<u64>,
}

/// A write bound to one row key, e.g. `p` to mark an invoice paid
pub struct RowAction {
  pub key: &'static str,
  pub label: &'static str,
  pub write: Write,
}

/// A server collection that can be shown with [`ListView`].
pub trait Listing: DeserializeOwned + Clone + 'static {
  const TITLE: &'static str;
  /// Verb for the `d` binding in the confirm prompt
  const DELETE_VERB: &'static str = "Delete";

  /// The key to observe, or why the scope cannot show this list.
  fn key(scope: &Scope) -> Result<QueryKey, &'static str>;

  fn row(&self) -> Line<'static>;

  /// Short name for prompts ("Maple Court", "lease #3")
  fn label(&self) -> String;

  fn create_form(_scope: &Scope) -> Option<FormPanel> {
    None
  }

  fn delete(&self, _scope: &Scope) -> Option<Write> {
    None
  }

  fn action(&self, _scope: &Scope) -> Option<RowAction> {
    None
  }

  fn open(&self, _ctx: &Context) -> Option<Box<dyn View>> {
    None
  }
}

/// Generic collection screen: observe, render, create, delete.
pub struct ListView<R: Listing> {
  ctx: Context,
  scope: Scope,
  observer: Option<QueryObserver<Vec<R>>>,
  missing_scope: Option<&'static str>,
  page: Page,
  list_state: ListState,
  form: Option<FormPanel>,
  confirm: Option<(ConfirmDialog, Write)>,
  runner: Arc<MutationRunner<Value>>,
  outcomes: watch::Receiver<MutationState<Value>>,
}

impl<R: Listing> ListView<R> {
  pub fn new(ctx: Context, scope: Scope) -> Self {
    let runner = Arc::new(MutationRunner::new(ctx.client.clone()));
    let outcomes = runner.watch();

    let (observer, missing_scope) = match R::key(&scope) {
      Ok(key) => (Some(ctx.client.observe::<Vec<R>>(&key, None)), None),
      Err(reason) => (None, Some(reason)),
    };

    let mut page = Page::new();
    if let Some(observer) = &observer {
      page.sync(observer.current());
    }

    Self {
      ctx,
      scope,
      observer,
      missing_scope,
      page,
      list_state: ListState::default(),
      form: None,
      confirm: None,
      runner,
      outcomes,
    }
  }

  fn rows(&self) -> &[R] {
    self
      .observer
      .as_ref()
      .and_then(|o| o.current().data())
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  fn selected(&self) -> Option<&R> {
    self.list_state.selected().and_then(|i| self.rows().get(i))
  }

  /// Issue `write` on a task; the outcome comes back through `outcomes`.
  fn spawn_write(&self, write: Write) {
    debug!(write = write.describe(), "submitting");
    let runner = self.runner.clone();
    let api = self.ctx.api.clone();
    tokio::spawn(async move {
      // Failures are reported through the runner's state
      let _ = runner
        .run_write(&api, &write, MutationCallbacks::new())
        .await;
    });
  }

  fn handle_form_key(&mut self, key: KeyEvent) -> ViewAction {
    let Some(form) = self.form.as_mut() else {
      return ViewAction::None;
    };
    match form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted(values)) => {
        match self.page.submit(|| form.build(&values)) {
          Ok(write) => {
            form.set_submitting(true);
            self.spawn_write(write);
          }
          Err(SubmitError::Invalid(errors)) => form.set_errors(errors),
          Err(SubmitError::Busy | SubmitError::NotEditing) => {}
        }
      }
      KeyResult::Event(FormEvent::Cancelled) => {
        self.page.cancel();
        self.form = None;
      }
      KeyResult::Handled | KeyResult::NotHandled => {}
    }
    ViewAction::None
  }

  fn handle_confirm_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.page.is_submitting() {
      return ViewAction::None;
    }
    match key.code {
      KeyCode::Char('y') | KeyCode::Enter => {
        if self.page.confirm().is_ok() {
          if let Some((_, write)) = &self.confirm {
            self.spawn_write(write.clone());
          }
        }
      }
      KeyCode::Char('n') | KeyCode::Esc | KeyCode::Char('q') => {
        self.page.cancel();
        self.confirm = None;
      }
      _ => {}
    }
    ViewAction::None
  }

  /// Fold a finished mutation back into the page.
  fn poll_outcome(&mut self) {
    if !self.outcomes.has_changed().unwrap_or(false) {
      return;
    }
    let outcome = match &*self.outcomes.borrow_and_update() {
      MutationState::Success(_) => Ok(()),
      MutationState::Error(e) => Err(e.user_message()),
      MutationState::Idle | MutationState::Pending => return,
    };

    if self.page.is_submitting() {
      self.page.settle(outcome);
    } else if let Err(message) = outcome {
      // A row action, which does not lock the page
      self.page.set_message(message);
    }

    match self.page.state() {
      PageState::Editing => {
        if let Some(form) = self.form.as_mut() {
          form.set_submitting(false);
          form.set_message(self.page.message().map(str::to_string));
        }
      }
      _ => {
        self.form = None;
        self.confirm = None;
      }
    }
  }

  fn title(&self) -> String {
    let Some(observer) = &self.observer else {
      return format!(" {} ", R::TITLE);
    };
    let result = observer.current();
    let suffix = match self.page.state() {
      PageState::Loading => " (loading...)".to_string(),
      _ if result.is_refetching() => format!(" ({}, refreshing...)", self.rows().len()),
      PageState::Failed(_) => " (error)".to_string(),
      _ => format!(" ({})", self.rows().len()),
    };
    format!(" {}{} ", R::TITLE, suffix)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let placeholder = match (self.missing_scope, self.page.state()) {
      (Some(reason), _) => Some(reason.to_string()),
      (None, PageState::Idle | PageState::Loading) => Some("Loading...".to_string()),
      (None, PageState::Failed(message)) => Some(message.clone()),
      (None, PageState::Empty) if R::create_form(&self.scope).is_some() => {
        Some("Nothing here yet. Press 'n' to add one.".to_string())
      }
      (None, PageState::Empty) => Some("Nothing here yet.".to_string()),
      _ => None,
    };

    if let Some(text) = placeholder.filter(|_| self.rows().is_empty()) {
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let len = self.rows().len();
    ensure_valid_selection(&mut self.list_state, len);

    let items: Vec<ListItem> = self.rows().iter().map(|r| ListItem::new(r.row())).collect();
    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl<R: Listing> View for ListView<R> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.form.is_some() {
      return self.handle_form_key(key);
    }
    if self.confirm.is_some() {
      return self.handle_confirm_key(key);
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => {
        if let Some(observer) = &self.observer {
          observer.refresh();
        }
      }
      KeyCode::Char('n') => {
        if let Some(form) = R::create_form(&self.scope) {
          if self.page.edit() {
            self.form = Some(form);
          }
        }
      }
      KeyCode::Char('d') => {
        let pending = self
          .selected()
          .and_then(|row| Some((row.label(), row.delete(&self.scope)?)));
        if let Some((label, write)) = pending {
          if self.page.confirm_delete() {
            let prompt = format!("{} {}?", R::DELETE_VERB, label);
            self.confirm = Some((ConfirmDialog::new(prompt), write));
          }
        }
      }
      KeyCode::Enter => {
        if let Some(view) = self.selected().and_then(|row| row.open(&self.ctx)) {
          return ViewAction::Push(view);
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Char(c) => {
        let mut buf = [0; 4];
        let typed: &str = c.encode_utf8(&mut buf);
        let action = self
          .selected()
          .and_then(|row| row.action(&self.scope))
          .filter(|action| action.key == typed);
        if let Some(action) = action {
          if !self.runner.is_pending() {
            self.page.clear_message();
            self.spawn_write(action.write);
          }
        }
      }
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    if let Some(form) = &self.form {
      form.render(frame, area);
    }
    if let Some((dialog, _)) = &self.confirm {
      let busy = self.page.state() == &PageState::Submitting(Submission::Delete);
      dialog.render(frame, area, busy);
    }
  }

  fn breadcrumb_label(&self) -> String {
    R::TITLE.to_string()
  }

  fn tick(&mut self) {
    if let Some(observer) = self.observer.as_mut() {
      if observer.poll() {
        self.page.sync(observer.current());
      }
    }
    self.poll_outcome();
  }

  fn status(&self) -> Option<&str> {
    self.page.message()
  }

  fn is_capturing(&self) -> bool {
    self.form.is_some() || self.confirm.is_some()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ];
    if R::create_form(&self.scope).is_some() {
      shortcuts.push(ShortcutInfo::new("n", "new").with_priority(30));
    }
    if let Some(row) = self.selected() {
      if row.delete(&self.scope).is_some() {
        shortcuts.push(ShortcutInfo::new("d", R::DELETE_VERB).with_priority(40));
      }
      if let Some(action) = row.action(&self.scope) {
        shortcuts.push(ShortcutInfo::new(action.key, action.label).with_priority(50));
      }
    }
    shortcuts
  }
}
