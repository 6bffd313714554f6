//! Benchmark harness.

use sequent_config::BenchConfig;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::BenchError;
use crate::report::{BenchReport, BenchRow};
use crate::technique::{Workload, run_technique};

/// Times each configured technique over the same synthetic task list.
///
/// # Usage
///
/// ```ignore
/// let harness = BenchHarness::new(BenchConfig::default())?;
/// let report = harness.run(CancellationToken::new()).await?;
/// println!("{report}");
/// ```
#[derive(Debug)]
pub struct BenchHarness {
  config: BenchConfig,
}

impl BenchHarness {
  /// Create a harness for a validated config.
  pub fn new(config: BenchConfig) -> Result<Self, BenchError> {
    config
      .validate()
      .map_err(|source| BenchError::Config { source })?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &BenchConfig {
    &self.config
  }

  /// Run every technique in order, pausing between them.
  ///
  /// Techniques never overlap: each one finishes (and the pause elapses)
  /// before the next starts.
  #[instrument(
    name = "bench_run",
    skip(self, cancel),
    fields(
      bench = %self.config.name,
      task_count = self.config.task_count,
    )
  )]
  pub async fn run(&self, cancel: CancellationToken) -> Result<BenchReport, BenchError> {
    let workload = Workload {
      count: self.config.task_count,
      delay: self.config.task_delay(),
    };
    let mut rows = Vec::with_capacity(self.config.techniques.len());

    for (position, &technique) in self.config.techniques.iter().enumerate() {
      if position > 0 {
        tokio::select! {
          biased;
          _ = cancel.cancelled() => return Err(self.cancelled()),
          _ = tokio::time::sleep(self.config.pause_between()) => {}
        }
      }

      info!(technique = technique.name(), "technique_started");
      let started = Instant::now();

      let progress = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(self.cancelled()),
        result = run_technique(technique, workload, &cancel) => result?,
      };
      let elapsed = started.elapsed();

      info!(
        technique = technique.name(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        tasks_executed = progress.executed(),
        "technique_completed"
      );

      rows.push(BenchRow {
        technique,
        elapsed,
        tasks_executed: progress.executed(),
        in_order: progress.in_order(),
      });
    }

    Ok(BenchReport {
      name: self.config.name.clone(),
      task_count: self.config.task_count,
      task_delay_ms: self.config.task_delay_ms,
      rows,
    })
  }

  fn cancelled(&self) -> BenchError {
    warn!(bench = %self.config.name, "benchmark cancelled");
    BenchError::Cancelled
  }
}
