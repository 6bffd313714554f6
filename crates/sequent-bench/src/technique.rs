//! Sequencing techniques timed by the harness.
//!
//! Every technique runs the same synthetic list: task `i` sleeps for the
//! configured delay and then records `i`. A technique is only correct if the
//! recorded indices come out as `0, 1, 2, ...`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::future::{BoxFuture, FutureExt};
use sequent_config::Technique;
use sequent_runner::{AsyncItem, ItemError, RunnerConfig, SequentialRunner, TaskList};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::BenchError;

/// Shape of the synthetic task list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Workload {
  pub count: usize,
  pub delay: Duration,
}

/// Execution record shared by the tasks of one technique.
#[derive(Debug, Clone, Default)]
pub(crate) struct Progress {
  executed: Arc<AtomicUsize>,
  out_of_order: Arc<AtomicBool>,
}

impl Progress {
  fn record(&self, index: usize) {
    let position = self.executed.fetch_add(1, Ordering::SeqCst);
    if position != index {
      self.out_of_order.store(true, Ordering::SeqCst);
    }
    trace!(task = index + 1, "task executed");
  }

  pub(crate) fn executed(&self) -> usize {
    self.executed.load(Ordering::SeqCst)
  }

  pub(crate) fn in_order(&self) -> bool {
    !self.out_of_order.load(Ordering::SeqCst)
  }
}

async fn synthetic_task(index: usize, delay: Duration, progress: Progress) {
  tokio::time::sleep(delay).await;
  progress.record(index);
}

/// Run the synthetic list with `technique`.
pub(crate) async fn run_technique(
  technique: Technique,
  workload: Workload,
  cancel: &CancellationToken,
) -> Result<Progress, BenchError> {
  let progress = Progress::default();

  match technique {
    Technique::Runner => run_with_runner(workload, &progress, cancel).await?,
    Technique::AwaitLoop => {
      for index in 0..workload.count {
        synthetic_task(index, workload.delay, progress.clone()).await;
      }
    }
    Technique::StreamForEach => {
      futures::stream::iter(0..workload.count)
        .for_each(|index| synthetic_task(index, workload.delay, progress.clone()))
        .await;
    }
    Technique::TaskQueue => {
      // Futures are lazy, so queueing them does not start them
      let mut queue: VecDeque<BoxFuture<'static, ()>> = (0..workload.count)
        .map(|index| synthetic_task(index, workload.delay, progress.clone()).boxed())
        .collect();
      while let Some(task) = queue.pop_front() {
        task.await;
      }
    }
  }

  Ok(progress)
}

async fn run_with_runner(
  workload: Workload,
  progress: &Progress,
  cancel: &CancellationToken,
) -> Result<(), BenchError> {
  let tasks: TaskList = (0..workload.count)
    .map(|index| {
      let progress = progress.clone();
      let delay = workload.delay;
      AsyncItem::new(move || {
        let progress = progress.clone();
        async move {
          synthetic_task(index, delay, progress).await;
          Ok::<(), ItemError>(())
        }
      })
    })
    .collect::<Vec<_>>()
    .into();

  let runner = SequentialRunner::new(RunnerConfig {
    parent_cancel: Some(cancel.clone()),
  });
  let report = runner
    .execute(tasks)
    .await
    .map_err(|source| BenchError::Runner {
      technique: Technique::Runner,
      source,
    })?;

  if !report.is_completed() {
    return Err(BenchError::Incomplete {
      technique: Technique::Runner,
      outcome: report.outcome,
    });
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_every_technique_runs_in_order() {
    let workload = Workload {
      count: 8,
      delay: Duration::from_millis(5),
    };
    let cancel = CancellationToken::new();

    for technique in Technique::ALL {
      let progress = run_technique(technique, workload, &cancel)
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", technique.name(), e));
      assert_eq!(progress.executed(), 8, "{}", technique.name());
      assert!(progress.in_order(), "{}", technique.name());
    }
  }

  #[test]
  fn test_progress_detects_out_of_order() {
    let progress = Progress::default();
    progress.record(0);
    progress.record(2);
    assert_eq!(progress.executed(), 2);
    assert!(!progress.in_order());
  }

  #[tokio::test]
  async fn test_runner_technique_reports_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let workload = Workload {
      count: 3,
      delay: Duration::from_millis(1),
    };
    let err = run_technique(Technique::Runner, workload, &cancel)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      BenchError::Incomplete {
        technique: Technique::Runner,
        ..
      }
    ));
  }
}
