//! The lifecycle every data-backed screen goes through.
//!
//! ```text
//! Idle -> Loading -> Empty | Populated | Failed
//! Empty | Populated -> Editing -> Submitting -> Populated (refetched)
//!                                            -> Editing (with message)
//! Populated -> ConfirmPending -> Submitting | Populated
//! ```
//!
//! Browsing states follow the page's primary query. Editing, confirming and
//! submitting are only left through the explicit transitions below, so a
//! refetch landing mid-edit never drops the user's form.

use crate::form::FieldErrors;
use crate::query::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
  Form,
  Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
  Idle,
  Loading,
  Empty,
  Populated,
  /// Initial load failed; carries the message to show
  Failed(String),
  Editing,
  ConfirmPending,
  Submitting(Submission),
}

impl PageState {
  fn is_browsing(&self) -> bool {
    matches!(
      self,
      PageState::Idle
        | PageState::Loading
        | PageState::Empty
        | PageState::Populated
        | PageState::Failed(_)
    )
  }
}

/// Why a submit did not start
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
  #[error("a submission is already in flight")]
  Busy,
  #[error("nothing to submit")]
  NotEditing,
  #[error(transparent)]
  Invalid(#[from] FieldErrors),
}

#[derive(Debug, Clone)]
pub struct Page {
  state: PageState,
  rows: Option<usize>,
  message: Option<String>,
}

impl Default for Page {
  fn default() -> Self {
    Self::new()
  }
}

impl Page {
  pub fn new() -> Self {
    Self {
      state: PageState::Idle,
      rows: None,
      message: None,
    }
  }

  pub fn state(&self) -> &PageState {
    &self.state
  }

  /// Latest status line text (a mutation error, a refetch failure).
  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  pub fn set_message(&mut self, message: impl Into<String>) {
    self.message = Some(message.into());
  }

  pub fn clear_message(&mut self) {
    self.message = None;
  }

  /// Follow the page's primary query.
  ///
  /// Data on hand always wins: a refetch keeps the page populated and a
  /// failed refetch only sets the message.
  pub fn sync<T>(&mut self, result: &QueryResult<Vec<T>>) {
    self.rows = result.data().map(Vec::len);

    if result.data().is_some() {
      if let Some(error) = result.error().filter(|_| result.is_error()) {
        self.message = Some(error.user_message());
      }
    }

    if self.state.is_browsing() {
      self.state = self.browse_state(result);
    }
  }

  fn browse_state<T>(&self, result: &QueryResult<Vec<T>>) -> PageState {
    match (result.data(), result.error()) {
      (Some(rows), _) if rows.is_empty() => PageState::Empty,
      (Some(_), _) => PageState::Populated,
      (None, Some(error)) if result.is_error() => PageState::Failed(error.user_message()),
      (None, _) => PageState::Loading,
    }
  }

  fn settled_state(&self) -> PageState {
    match self.rows {
      Some(0) => PageState::Empty,
      Some(_) => PageState::Populated,
      None => PageState::Loading,
    }
  }

  /// Open the create form. Allowed once the collection has loaded.
  pub fn edit(&mut self) -> bool {
    match self.state {
      PageState::Empty | PageState::Populated => {
        self.state = PageState::Editing;
        self.message = None;
        true
      }
      _ => false,
    }
  }

  /// Ask for confirmation before deleting the selected row.
  pub fn confirm_delete(&mut self) -> bool {
    if self.state == PageState::Populated {
      self.state = PageState::ConfirmPending;
      true
    } else {
      false
    }
  }

  /// Leave the form or the confirmation without submitting.
  pub fn cancel(&mut self) {
    if matches!(self.state, PageState::Editing | PageState::ConfirmPending) {
      self.state = self.settled_state();
    }
  }

  /// Validate and, if valid, start submitting the form.
  ///
  /// Validation only runs from `Editing`; a second submit while one is in
  /// flight is refused without validating.
  pub fn submit<O>(
    &mut self,
    validate: impl FnOnce() -> Result<O, FieldErrors>,
  ) -> Result<O, SubmitError> {
    match self.state {
      PageState::Submitting(_) => Err(SubmitError::Busy),
      PageState::Editing => {
        let output = validate()?;
        self.state = PageState::Submitting(Submission::Form);
        Ok(output)
      }
      _ => Err(SubmitError::NotEditing),
    }
  }

  /// The user confirmed the delete.
  pub fn confirm(&mut self) -> Result<(), SubmitError> {
    match self.state {
      PageState::Submitting(_) => Err(SubmitError::Busy),
      PageState::ConfirmPending => {
        self.state = PageState::Submitting(Submission::Delete);
        Ok(())
      }
      _ => Err(SubmitError::NotEditing),
    }
  }

  /// The submission came back.
  ///
  /// Success returns to browsing (the refetch triggered by invalidation
  /// updates the rows). A failed form goes back to `Editing` with the
  /// server's message; a failed delete goes back to `Populated`.
  pub fn settle(&mut self, outcome: Result<(), String>) {
    let PageState::Submitting(submission) = self.state else {
      return;
    };
    match outcome {
      Ok(()) => {
        self.message = None;
        self.state = self.settled_state();
      }
      Err(message) => {
        self.message = Some(message);
        self.state = match submission {
          Submission::Form => PageState::Editing,
          Submission::Delete => self.settled_state(),
        };
      }
    }
  }

  pub fn is_submitting(&self) -> bool {
    matches!(self.state, PageState::Submitting(_))
  }
}
