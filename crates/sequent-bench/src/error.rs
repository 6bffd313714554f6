//! Benchmark errors.

use sequent_config::{ConfigError, Technique};
use sequent_runner::{RunOutcome, RunnerError};

/// Errors that can occur during a benchmark session.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
  /// The benchmark config failed validation.
  #[error("invalid benchmark config: {source}")]
  Config {
    #[source]
    source: ConfigError,
  },

  /// The sequential runner could not run the task list.
  #[error("runner failed for technique '{technique}': {source}")]
  Runner {
    technique: Technique,
    #[source]
    source: RunnerError,
  },

  /// A run ended without completing every task.
  #[error("technique '{technique}' did not complete: {outcome:?}")]
  Incomplete {
    technique: Technique,
    outcome: RunOutcome,
  },

  /// The session was cancelled.
  #[error("benchmark cancelled")]
  Cancelled,
}
