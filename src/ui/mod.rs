pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use renderfns::{draw_footer, draw_header, Status};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, content, footer] = Layout::vertical([
    Constraint::Length(1), // Header
    Constraint::Min(1),    // Current view
    Constraint::Length(1), // Breadcrumb + status
  ])
  .areas(frame.area());

  let shortcuts = app.current_view().map(|v| v.shortcuts()).unwrap_or_default();
  draw_header(frame, header, app.api_url(), &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, content);
  }
  app.command_input().render_overlay(frame, content);

  let breadcrumb = app.view_breadcrumb();
  let status = match app.current_view().and_then(|v| v.status()) {
    Some(message) => Some(Status::Error(message)),
    None => app.cache_activity().map(Status::Info),
  };
  draw_footer(frame, footer, &breadcrumb, status);
}

/// Keep a list selection inside `len` rows, selecting the first row when
/// there is none yet.
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
    None => state.select(Some(0)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_clamped_after_rows_removed() {
    let mut state = ListState::default();
    state.select(Some(4));
    ensure_valid_selection(&mut state, 2);
    assert_eq!(state.selected(), Some(1));
  }

  #[test]
  fn test_selection_starts_at_first_row() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
