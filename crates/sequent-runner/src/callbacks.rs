//! Completion and error callbacks for a run.

use crate::error::ItemError;

/// Fired once when every item has completed.
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

/// Fired once with the first item error and that item's index.
pub type OnError = Box<dyn FnOnce(ItemError, usize) + Send + 'static>;

/// Callbacks attached to a single run.
///
/// Registering an error callback changes how failures are handled: with one,
/// the first failing item stops the run and is reported through it; without
/// one, item errors are logged and the run carries on.
#[derive(Default)]
pub struct RunCallbacks {
  pub(crate) on_complete: Option<OnComplete>,
  pub(crate) on_error: Option<OnError>,
}

impl RunCallbacks {
  /// Callbacks with a completion handler.
  pub fn new(on_complete: impl FnOnce() + Send + 'static) -> Self {
    Self {
      on_complete: Some(Box::new(on_complete)),
      on_error: None,
    }
  }

  /// Register the error handler, making the run stop on the first item error.
  pub fn on_error(mut self, on_error: impl FnOnce(ItemError, usize) + Send + 'static) -> Self {
    self.on_error = Some(Box::new(on_error));
    self
  }

  /// Whether item errors stop the run.
  pub fn stops_on_error(&self) -> bool {
    self.on_error.is_some()
  }
}

impl std::fmt::Debug for RunCallbacks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RunCallbacks")
      .field("on_complete", &self.on_complete.is_some())
      .field("on_error", &self.on_error.is_some())
      .finish()
  }
}
