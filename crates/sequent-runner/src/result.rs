//! Run results.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
  /// Every item completed.
  Completed,
  /// Item `index` failed and an error callback was registered.
  Failed { index: usize, error: String },
  /// The run was cancelled; `next_index` is the first item that never started.
  Cancelled { next_index: usize },
}

/// Result of a single run, returned by [`RunHandle::wait`](crate::RunHandle::wait).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
  /// Unique run ID.
  pub run_id: String,
  pub outcome: RunOutcome,
  /// Items in the task list.
  pub item_count: usize,
  /// Items that were invoked.
  pub items_invoked: usize,
  /// Item errors that were logged and skipped over.
  pub errors_ignored: usize,
  /// Wall time from the driver starting to the terminal state.
  pub elapsed: Duration,
}

impl RunReport {
  pub fn is_completed(&self) -> bool {
    self.outcome == RunOutcome::Completed
  }
}
