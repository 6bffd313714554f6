//! Run lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a single run.
///
/// `Idle -> Running -> {Completed, Failed, Cancelled}`, plus `Idle -> Cancelled`
/// when a run is cancelled before its driver gets scheduled. Terminal phases
/// never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RunPhase {
  Idle = 0,
  Running = 1,
  Completed = 2,
  Failed = 3,
  Cancelled = 4,
}

impl RunPhase {
  /// Whether no further transition can happen from this phase.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      RunPhase::Completed | RunPhase::Failed | RunPhase::Cancelled
    )
  }

  fn from_u8(value: u8) -> Self {
    match value {
      0 => RunPhase::Idle,
      1 => RunPhase::Running,
      2 => RunPhase::Completed,
      3 => RunPhase::Failed,
      _ => RunPhase::Cancelled,
    }
  }
}

impl fmt::Display for RunPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      RunPhase::Idle => "idle",
      RunPhase::Running => "running",
      RunPhase::Completed => "completed",
      RunPhase::Failed => "failed",
      RunPhase::Cancelled => "cancelled",
    };
    f.write_str(name)
  }
}

/// Atomic holder for a [`RunPhase`] shared between a handle and its driver.
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
  pub(crate) fn new() -> Self {
    Self(AtomicU8::new(RunPhase::Idle as u8))
  }

  pub(crate) fn load(&self) -> RunPhase {
    RunPhase::from_u8(self.0.load(Ordering::Acquire))
  }

  /// Move from `from` to `to`. Returns false if the phase was not `from`.
  pub(crate) fn transition(&self, from: RunPhase, to: RunPhase) -> bool {
    self
      .0
      .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }
}
