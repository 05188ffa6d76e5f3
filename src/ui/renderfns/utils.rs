use ratatui::prelude::{Color, Rect};

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a lease, invoice or request status
pub fn status_color(status: &str) -> Color {
  match status {
    "active" | "paid" | "resolved" | "accepted" | "occupied" => Color::Green,
    "pending" | "open" | "in_progress" | "turnover" => Color::Yellow,
    "overdue" | "expired" | "terminated" | "urgent" => Color::Red,
    _ => Color::White,
  }
}

/// Area for an overlay near the top-left of `area`, clipped to fit
pub fn overlay_rect(area: Rect, width: u16, height: u16) -> Rect {
  let x = area.x + 1;
  let y = area.y + 1;
  Rect::new(
    x,
    y,
    width.min(area.width.saturating_sub(2)),
    height.min(area.height.saturating_sub(2)),
  )
}
