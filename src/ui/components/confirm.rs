use crate::ui::renderfns::overlay_rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Yes/no prompt for destructive writes
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
  prompt: String,
}

impl ConfirmDialog {
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      prompt: prompt.into(),
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, busy: bool) {
    let width = (self.prompt.chars().count() as u16 + 6).clamp(30, 70);
    let rect = overlay_rect(area, width, 5);
    frame.render_widget(Clear, rect);

    let hint = if busy {
      Line::styled("Working...", Style::default().fg(Color::Yellow))
    } else {
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" confirm   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
      ])
    };

    let block = Block::default()
      .title(" Confirm ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));
    let body = Paragraph::new(vec![Line::from(self.prompt.as_str()), hint])
      .block(block)
      .wrap(Wrap { trim: true });
    frame.render_widget(body, rect);
  }
}
