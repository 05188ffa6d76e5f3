use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::api::Write;
use crate::form::{Field, FieldErrors, FormSchema, FormValues};
use crate::ui::renderfns::overlay_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  Submitted(FormValues),
  Cancelled,
}

type Build = Box<dyn Fn(&FormValues) -> Result<Write, FieldErrors>>;

/// Modal create form driven by a [`FormSchema`]
pub struct FormPanel {
  title: &'static str,
  fields: &'static [Field],
  inputs: Vec<TextInput>,
  focus: usize,
  errors: FieldErrors,
  message: Option<String>,
  submitting: bool,
  build: Build,
}

impl FormPanel {
  /// `to_write` wraps the schema's validated output into the write to send.
  pub fn new<S>(to_write: impl Fn(S::Output) -> Write + 'static) -> Self
  where
    S: FormSchema + 'static,
  {
    Self {
      title: S::TITLE,
      fields: S::FIELDS,
      inputs: vec![TextInput::new(); S::FIELDS.len()],
      focus: 0,
      errors: FieldErrors::new(),
      message: None,
      submitting: false,
      build: Box::new(move |values| S::validate(values).map(&to_write)),
    }
  }

  /// Start a field with a value, e.g. the property a unit belongs to.
  pub fn prefill(mut self, name: &str, value: impl Into<String>) -> Self {
    if let Some(i) = self.fields.iter().position(|f| f.name == name) {
      self.inputs[i] = TextInput::with_value(value);
    }
    self
  }

  pub fn values(&self) -> FormValues {
    let mut values = FormValues::new();
    for (field, input) in self.fields.iter().zip(&self.inputs) {
      values.set(field.name, input.value());
    }
    values
  }

  /// Validate `values` and build the write.
  pub fn build(&self, values: &FormValues) -> Result<Write, FieldErrors> {
    (self.build)(values)
  }

  pub fn set_errors(&mut self, errors: FieldErrors) {
    // Jump to the first field that needs fixing
    if let Some(i) = self
      .fields
      .iter()
      .position(|f| errors.get(f.name).is_some())
    {
      self.focus = i;
    }
    self.errors = errors;
  }

  pub fn set_message(&mut self, message: Option<String>) {
    self.message = message;
  }

  pub fn set_submitting(&mut self, submitting: bool) {
    self.submitting = submitting;
    if submitting {
      self.errors = FieldErrors::new();
      self.message = None;
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    // Locked until the server answers
    if self.submitting {
      return KeyResult::Handled;
    }

    let last = self.fields.len().saturating_sub(1);
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.focus = (self.focus + 1).min(last);
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = self.focus.saturating_sub(1);
        return KeyResult::Handled;
      }
      _ => {}
    }

    let Some(input) = self.inputs.get_mut(self.focus) else {
      return KeyResult::NotHandled;
    };
    match input.handle_key(key) {
      InputResult::Submitted(_) if self.focus < last => {
        self.focus += 1;
        KeyResult::Handled
      }
      InputResult::Submitted(_) => KeyResult::Event(FormEvent::Submitted(self.values())),
      InputResult::Cancelled => KeyResult::Event(FormEvent::Cancelled),
      InputResult::Consumed => {
        self.errors = FieldErrors::new();
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let height = self.fields.len() as u16 * 2 + 4;
    let width = (area.width * 70 / 100).clamp(40, 80);
    let rect = overlay_rect(area, width, height);
    frame.render_widget(Clear, rect);

    let title = if self.submitting {
      format!(" {} (saving...) ", self.title)
    } else {
      format!(" {} ", self.title)
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let mut lines = Vec::new();
    for (i, (field, input)) in self.fields.iter().zip(&self.inputs).enumerate() {
      let focused = i == self.focus;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::White)
      };
      let mut spans = vec![
        Span::styled(format!("{:>14}: ", field.label), label_style),
        Span::raw(input.value().to_string()),
      ];
      if focused && !self.submitting {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      if input.is_empty() && !field.hint.is_empty() {
        spans.push(Span::styled(
          format!(" {}", field.hint),
          Style::default().fg(Color::DarkGray),
        ));
      }
      lines.push(Line::from(spans));

      let note = match self.errors.get(field.name) {
        Some(error) => Span::styled(format!("{:>16}{}", "", error), Style::default().fg(Color::Red)),
        None => Span::raw(""),
      };
      lines.push(Line::from(note));
    }

    let footer = match &self.message {
      Some(message) => Line::styled(message.clone(), Style::default().fg(Color::Red)),
      None => Line::styled(
        "Enter: next/submit  Tab: next  Esc: cancel",
        Style::default().fg(Color::DarkGray),
      ),
    };
    lines.push(footer);

    frame.render_widget(Paragraph::new(lines).block(block), rect);
  }
}
