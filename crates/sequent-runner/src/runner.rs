//! Sequential runner.
//!
//! Each call to [`SequentialRunner::run`] spawns one driver task that owns the
//! run's progress. The driver invokes an item, then parks on a one-shot
//! channel until the item's continuation fires, so a list of any length runs
//! in a flat loop with constant stack depth.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::callbacks::RunCallbacks;
use crate::continuation::{Continuation, Signal};
use crate::error::{ItemError, RunnerError, WorkItemError};
use crate::events::{NoopNotifier, RunEvent, RunNotifier};
use crate::handle::{RunHandle, RunShared};
use crate::item::TaskList;
use crate::result::{RunOutcome, RunReport};
use crate::state::RunPhase;

/// Configuration for the runner.
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
  /// Cancelling this token cancels every run started by the runner.
  pub parent_cancel: Option<CancellationToken>,
}

/// Runs task lists one item at a time.
///
/// A runner holds no per-run state, so it can start any number of
/// independent runs, concurrently or not, over the same or different lists.
pub struct SequentialRunner {
  config: RunnerConfig,
  notifier: Arc<dyn RunNotifier>,
}

impl SequentialRunner {
  /// Create a new runner.
  pub fn new(config: RunnerConfig) -> Self {
    Self {
      config,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Send run events to `notifier`.
  pub fn with_notifier(mut self, notifier: Arc<dyn RunNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// Start running `tasks`.
  ///
  /// The run is driven by a task spawned on the current tokio runtime, so the
  /// first item (and, for an empty list, the completion callback) is only
  /// invoked once that task is scheduled, never from inside this call.
  pub fn run(&self, tasks: TaskList, callbacks: RunCallbacks) -> Result<RunHandle, RunnerError> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| RunnerError::NoRuntime)?;

    let run_id = uuid::Uuid::new_v4().to_string();
    let cancel = match &self.config.parent_cancel {
      Some(parent) => parent.child_token(),
      None => CancellationToken::new(),
    };
    let shared = Arc::new(RunShared::new(run_id, cancel));

    let driver = Driver {
      shared: shared.clone(),
      tasks,
      notifier: self.notifier.clone(),
      stop_on_error: callbacks.stops_on_error(),
    };
    let join = runtime.spawn(drive(driver, callbacks));

    Ok(RunHandle::new(shared, join))
  }

  /// Run `tasks` without callbacks and wait for the report.
  ///
  /// Item errors are ignored, as with any run that has no error callback.
  pub async fn execute(&self, tasks: TaskList) -> Result<RunReport, RunnerError> {
    self.run(tasks, RunCallbacks::default())?.wait().await
  }
}

impl Default for SequentialRunner {
  fn default() -> Self {
    Self::new(RunnerConfig::default())
  }
}

/// Progress of one run, owned by its driver.
#[derive(Debug, Default)]
struct RunState {
  next_index: usize,
  errors_ignored: usize,
}

/// Why the driver loop stopped.
enum Stop {
  Exhausted,
  Failed { index: usize, error: ItemError },
  Cancelled,
}

struct Driver {
  shared: Arc<RunShared>,
  tasks: TaskList,
  notifier: Arc<dyn RunNotifier>,
  stop_on_error: bool,
}

#[instrument(
  name = "sequential_run",
  skip_all,
  fields(
    run_id = %driver.shared.run_id,
    item_count = driver.tasks.len(),
  )
)]
async fn drive(driver: Driver, callbacks: RunCallbacks) -> RunReport {
  let started = Instant::now();
  let mut state = RunState::default();

  if !driver
    .shared
    .phase
    .transition(RunPhase::Idle, RunPhase::Running)
  {
    // Cancelled before the driver was scheduled
    return driver.finish(Stop::Cancelled, state, callbacks, started);
  }

  info!(
    run_id = %driver.shared.run_id,
    item_count = driver.tasks.len(),
    "run_started"
  );
  driver.notifier.notify(RunEvent::RunStarted {
    run_id: driver.shared.run_id.clone(),
    item_count: driver.tasks.len(),
  });

  let stop = driver.advance(&mut state).await;
  driver.finish(stop, state, callbacks, started)
}

impl Driver {
  /// Invoke items in order until the list is exhausted, an item error stops
  /// the run, or the run is cancelled.
  async fn advance(&self, state: &mut RunState) -> Stop {
    let run_id = &self.shared.run_id;

    loop {
      // cancel() moves the phase before it trips the token
      if self.shared.phase.load() != RunPhase::Running || self.shared.cancel.is_cancelled() {
        return Stop::Cancelled;
      }

      let index = state.next_index;
      let Some(item) = self.tasks.get(index) else {
        return Stop::Exhausted;
      };

      let (done, receiver) = Continuation::new(index);

      debug!(run_id = %run_id, index, "item_started");
      self.notifier.notify(RunEvent::ItemStarted {
        run_id: run_id.clone(),
        index,
      });

      let invoked = catch_unwind(AssertUnwindSafe(|| item.invoke(done)));
      state.next_index = index + 1;

      let signal: Signal = match invoked {
        Err(panic) => Err(Box::new(WorkItemError::Panicked {
          message: panic_message(panic.as_ref()),
        }) as ItemError),
        Ok(()) => tokio::select! {
          biased;
          _ = self.shared.cancel.cancelled() => return Stop::Cancelled,
          signal = receiver => match signal {
            Ok(signal) => signal,
            Err(_) => Err(Box::new(WorkItemError::ContinuationDropped) as ItemError),
          },
        },
      };

      match signal {
        Ok(()) => {
          debug!(run_id = %run_id, index, "item_completed");
          self.notifier.notify(RunEvent::ItemCompleted {
            run_id: run_id.clone(),
            index,
          });
        }
        Err(error) if self.stop_on_error => {
          error!(run_id = %run_id, index, error = %error, "item_failed");
          self.notifier.notify(RunEvent::ItemFailed {
            run_id: run_id.clone(),
            index,
            error: error.to_string(),
            ignored: false,
          });
          return Stop::Failed { index, error };
        }
        Err(error) => {
          warn!(
            run_id = %run_id,
            index,
            error = %error,
            "item_failed (no error callback, continuing)"
          );
          state.errors_ignored += 1;
          self.notifier.notify(RunEvent::ItemFailed {
            run_id: run_id.clone(),
            index,
            error: error.to_string(),
            ignored: true,
          });
        }
      }
    }
  }

  /// Move to the terminal phase and fire at most one callback.
  ///
  /// A callback only fires if this call wins the transition out of
  /// `Running`; a concurrent `cancel()` that got there first suppresses it.
  fn finish(
    &self,
    stop: Stop,
    state: RunState,
    callbacks: RunCallbacks,
    started: Instant,
  ) -> RunReport {
    let run_id = &self.shared.run_id;

    let outcome = match stop {
      Stop::Exhausted => {
        if self
          .shared
          .phase
          .transition(RunPhase::Running, RunPhase::Completed)
        {
          info!(
            run_id = %run_id,
            items_invoked = state.next_index,
            errors_ignored = state.errors_ignored,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run_completed"
          );
          self.notifier.notify(RunEvent::RunCompleted {
            run_id: run_id.clone(),
          });
          if let Some(on_complete) = callbacks.on_complete {
            fire_callback(run_id, "on_complete", on_complete);
          }
          RunOutcome::Completed
        } else {
          self.cancelled(state.next_index)
        }
      }
      Stop::Failed { index, error } => {
        let message = error.to_string();
        if self
          .shared
          .phase
          .transition(RunPhase::Running, RunPhase::Failed)
        {
          error!(run_id = %run_id, index, error = %message, "run_failed");
          self.notifier.notify(RunEvent::RunFailed {
            run_id: run_id.clone(),
            index,
            error: message.clone(),
          });
          if let Some(on_error) = callbacks.on_error {
            fire_callback(run_id, "on_error", move || on_error(error, index));
          }
          RunOutcome::Failed {
            index,
            error: message,
          }
        } else {
          self.cancelled(state.next_index)
        }
      }
      Stop::Cancelled => {
        // Parent token cancellation leaves the phase at Running
        self
          .shared
          .phase
          .transition(RunPhase::Running, RunPhase::Cancelled);
        self.cancelled(state.next_index)
      }
    };

    RunReport {
      run_id: run_id.clone(),
      outcome,
      item_count: self.tasks.len(),
      items_invoked: state.next_index,
      errors_ignored: state.errors_ignored,
      elapsed: started.elapsed(),
    }
  }

  fn cancelled(&self, next_index: usize) -> RunOutcome {
    warn!(run_id = %self.shared.run_id, next_index, "run_cancelled");
    self.notifier.notify(RunEvent::RunCancelled {
      run_id: self.shared.run_id.clone(),
      next_index,
    });
    RunOutcome::Cancelled { next_index }
  }
}

fn fire_callback(run_id: &str, name: &str, callback: impl FnOnce()) {
  if let Err(panic) = catch_unwind(AssertUnwindSafe(callback)) {
    error!(
      run_id = %run_id,
      callback = name,
      panic = %panic_message(panic.as_ref()),
      "run callback panicked"
    );
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "non-string panic payload".to_string()
  }
}
