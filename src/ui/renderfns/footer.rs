use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Footer status line, right of the breadcrumb
pub enum Status<'a> {
  /// Latest cache activity
  Info(&'a str),
  /// A failure the user should see, shown verbatim
  Error(&'a str),
}

/// Draw the footer bar: view breadcrumb on the left, status on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], status: Option<Status>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let [left, right] =
    Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);

  frame.render_widget(
    Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black)),
    left,
  );

  let status = match status {
    Some(Status::Error(msg)) => Span::styled(format!("{} ", msg), Style::default().fg(Color::Red)),
    Some(Status::Info(msg)) => Span::styled(format!("{} ", msg), Style::default().fg(Color::DarkGray)),
    None => Span::raw(""),
  };
  frame.render_widget(
    Paragraph::new(Line::from(status))
      .alignment(Alignment::Right)
      .style(Style::default().bg(Color::Black)),
    right,
  );
}
