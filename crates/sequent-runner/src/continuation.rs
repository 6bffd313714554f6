//! Continuations handed to work items.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::ItemError;

/// Outcome a work item reports through its continuation.
pub(crate) type Signal = Result<(), ItemError>;

/// Callback a [`WorkItem`](crate::WorkItem) invokes once its work is done.
///
/// Continuations are cheap to clone so they can be moved into whatever async
/// context finishes the work. Only the first invocation across all clones is
/// delivered to the runner; any later one is ignored. Invoking a continuation
/// after its run was cancelled is accepted and has no effect.
#[derive(Debug, Clone)]
pub struct Continuation {
  index: usize,
  slot: Arc<Mutex<Option<oneshot::Sender<Signal>>>>,
}

impl Continuation {
  pub(crate) fn new(index: usize) -> (Self, oneshot::Receiver<Signal>) {
    let (sender, receiver) = oneshot::channel();
    let continuation = Self {
      index,
      slot: Arc::new(Mutex::new(Some(sender))),
    };
    (continuation, receiver)
  }

  /// Position of the work item this continuation belongs to.
  pub fn index(&self) -> usize {
    self.index
  }

  /// Signal success.
  pub fn complete(&self) -> bool {
    self.finish(Ok(()))
  }

  /// Signal failure.
  pub fn fail(&self, error: impl Into<ItemError>) -> bool {
    self.finish(Err(error.into()))
  }

  /// Signal the given outcome.
  ///
  /// Returns `true` for the first invocation and `false` for every repeated
  /// one, which the runner never sees.
  pub fn finish(&self, result: Result<(), ItemError>) -> bool {
    let sender = self
      .slot
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .take();

    match sender {
      Some(sender) => {
        // Receiver is gone once the run is terminal
        let _ = sender.send(result);
        true
      }
      None => {
        debug!(index = self.index, "continuation already invoked, ignoring");
        false
      }
    }
  }
}
