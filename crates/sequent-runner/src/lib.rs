//! Sequent Runner
//!
//! This crate provides the sequential task runner for sequent. A run walks an
//! ordered [`TaskList`] one [`WorkItem`] at a time: each item is handed a
//! [`Continuation`] and the runner only moves on once that continuation has
//! been invoked.
//!
//! # Architecture
//!
//! ```text
//! SequentialRunner
//! └── run(tasks, callbacks) -> RunHandle
//!
//! RunHandle
//! ├── cancel()   - stop advancing, suppress callbacks
//! └── wait()     - RunReport for this run
//!
//! driver (one spawned task per run)
//! └── loop: invoke item[i] -> await continuation -> i += 1
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use sequent_runner::{Continuation, RunCallbacks, RunnerConfig, SequentialRunner, TaskList};
//!
//! let tasks = TaskList::builder()
//!   .push(|done: Continuation| { done.complete(); })
//!   .push(|done: Continuation| { done.fail("boom"); })
//!   .build();
//!
//! let runner = SequentialRunner::new(RunnerConfig::default());
//! let handle = runner.run(
//!   tasks,
//!   RunCallbacks::new(|| println!("done")).on_error(|err, index| eprintln!("{index}: {err}")),
//! )?;
//!
//! let report = handle.wait().await?;
//! ```

mod callbacks;
mod continuation;
mod error;
mod events;
mod handle;
mod item;
mod result;
mod runner;
mod state;

pub use callbacks::{OnComplete, OnError, RunCallbacks};
pub use continuation::Continuation;
pub use error::{ItemError, RunnerError, WorkItemError};
pub use events::{ChannelNotifier, NoopNotifier, RunEvent, RunNotifier};
pub use handle::{RunCanceller, RunHandle};
pub use item::{AsyncItem, TaskList, TaskListBuilder, WorkItem};
pub use result::{RunOutcome, RunReport};
pub use runner::{RunnerConfig, SequentialRunner};
pub use state::RunPhase;
