//! Caller-facing handles for an in-progress run.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::RunnerError;
use crate::result::RunReport;
use crate::state::{PhaseCell, RunPhase};

/// State shared between a run's driver and its handles.
#[derive(Debug)]
pub(crate) struct RunShared {
  pub(crate) run_id: String,
  pub(crate) phase: PhaseCell,
  pub(crate) cancel: CancellationToken,
}

impl RunShared {
  pub(crate) fn new(run_id: String, cancel: CancellationToken) -> Self {
    Self {
      run_id,
      phase: PhaseCell::new(),
      cancel,
    }
  }

  fn cancel(&self) -> Result<(), RunnerError> {
    let cancelled = self.phase.transition(RunPhase::Idle, RunPhase::Cancelled)
      || self
        .phase
        .transition(RunPhase::Running, RunPhase::Cancelled);

    if !cancelled {
      return Err(RunnerError::AlreadyTerminal {
        run_id: self.run_id.clone(),
        phase: self.phase.load(),
      });
    }

    info!(run_id = %self.run_id, "run cancellation requested");
    self.cancel.cancel();
    Ok(())
  }
}

/// A handle to a sequential run.
///
/// Dropping the handle does not stop the run; call [`cancel`](Self::cancel)
/// for that.
#[derive(Debug)]
pub struct RunHandle {
  shared: Arc<RunShared>,
  driver: JoinHandle<RunReport>,
}

impl RunHandle {
  pub(crate) fn new(shared: Arc<RunShared>, driver: JoinHandle<RunReport>) -> Self {
    Self { shared, driver }
  }

  /// Unique ID of this run.
  pub fn run_id(&self) -> &str {
    &self.shared.run_id
  }

  /// Current lifecycle phase.
  pub fn phase(&self) -> RunPhase {
    self.shared.phase.load()
  }

  /// Stop the run from invoking any further item.
  ///
  /// Work already in flight is not aborted, but its continuation no longer
  /// has any effect, and neither the completion nor the error callback will
  /// fire. Fails with [`RunnerError::AlreadyTerminal`] once the run has
  /// completed, failed or been cancelled.
  ///
  /// An item counts as started once the driver has checked the phase for it,
  /// so a cancel racing a continuation on another thread either stops the
  /// next item or lands after it started.
  pub fn cancel(&self) -> Result<(), RunnerError> {
    self.shared.cancel()
  }

  /// A cloneable canceller that outlives [`wait`](Self::wait) consuming the handle.
  pub fn canceller(&self) -> RunCanceller {
    RunCanceller {
      shared: self.shared.clone(),
    }
  }

  /// Whether the driver has finished.
  pub fn is_finished(&self) -> bool {
    self.driver.is_finished()
  }

  /// Wait for the run to reach a terminal state.
  pub async fn wait(self) -> Result<RunReport, RunnerError> {
    self.driver.await.map_err(|e| RunnerError::Driver {
      run_id: self.shared.run_id.clone(),
      message: e.to_string(),
    })
  }
}

/// Cancels a run from anywhere.
#[derive(Debug, Clone)]
pub struct RunCanceller {
  shared: Arc<RunShared>,
}

impl RunCanceller {
  /// Same as [`RunHandle::cancel`].
  pub fn cancel(&self) -> Result<(), RunnerError> {
    self.shared.cancel()
  }

  /// Unique ID of the run this canceller stops.
  pub fn run_id(&self) -> &str {
    &self.shared.run_id
  }
}
