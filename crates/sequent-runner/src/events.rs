//! Run events and notifiers for observability.
//!
//! Events are emitted while a run progresses so consumers can observe
//! progress, record timings, stream to a UI, etc.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a sequential run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
  /// The run started walking its task list.
  RunStarted { run_id: String, item_count: usize },

  /// An item was invoked.
  ItemStarted { run_id: String, index: usize },

  /// An item's continuation reported success.
  ItemCompleted { run_id: String, index: usize },

  /// An item failed. `ignored` is true when the run carried on regardless.
  ItemFailed {
    run_id: String,
    index: usize,
    error: String,
    ignored: bool,
  },

  /// Every item completed.
  RunCompleted { run_id: String },

  /// The run stopped on an item error.
  RunFailed {
    run_id: String,
    index: usize,
    error: String,
  },

  /// The run was cancelled before `next_index` was invoked.
  RunCancelled { run_id: String, next_index: usize },
}

/// Trait for receiving run events.
///
/// The runner calls `notify` for each event; implementations decide what to
/// do with them.
pub trait RunNotifier: Send + Sync {
  /// Called when a run event occurs.
  fn notify(&self, event: RunEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RunNotifier for NoopNotifier {
  fn notify(&self, _event: RunEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls the driver; volume is a few
  // events per item.
  sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
    Self { sender }
  }
}

impl RunNotifier for ChannelNotifier {
  fn notify(&self, event: RunEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
