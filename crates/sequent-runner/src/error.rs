//! Runner error types.

use crate::state::RunPhase;

/// Error value a work item hands to its continuation.
pub type ItemError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors caused by misusing the runner or a run handle.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
  /// `run()` was called outside of a tokio runtime.
  #[error("sequential runs must be started from within a tokio runtime")]
  NoRuntime,

  /// The run already reached a terminal state.
  #[error("run '{run_id}' is already {phase}")]
  AlreadyTerminal { run_id: String, phase: RunPhase },

  /// The driving task did not finish normally.
  #[error("driver for run '{run_id}' terminated abnormally: {message}")]
  Driver { run_id: String, message: String },
}

/// Item failures detected by the runner itself rather than reported by the item.
#[derive(Debug, thiserror::Error)]
pub enum WorkItemError {
  /// The item panicked while being invoked.
  #[error("work item panicked: {message}")]
  Panicked { message: String },

  /// Every copy of the continuation was dropped without being invoked.
  #[error("work item dropped its continuation without invoking it")]
  ContinuationDropped,

  /// An [`AsyncItem`](crate::AsyncItem) exceeded its watchdog.
  #[error("work item timed out after {timeout_ms}ms")]
  TimedOut { timeout_ms: u64 },
}
