//! Benchmark results.

use std::fmt;
use std::time::Duration;

use sequent_config::Technique;
use serde::{Deserialize, Serialize};

/// Timing of one technique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRow {
  pub technique: Technique,
  /// Wall time for the whole task list.
  pub elapsed: Duration,
  pub tasks_executed: usize,
  /// Whether tasks finished in list order.
  pub in_order: bool,
}

impl BenchRow {
  pub fn elapsed_ms(&self) -> f64 {
    self.elapsed.as_secs_f64() * 1000.0
  }
}

/// Result of a complete benchmark session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
  pub name: String,
  pub task_count: usize,
  pub task_delay_ms: u64,
  /// One row per technique, in run order.
  pub rows: Vec<BenchRow>,
}

impl BenchReport {
  /// Row with the lowest elapsed time.
  pub fn fastest(&self) -> Option<&BenchRow> {
    self.rows.iter().min_by_key(|row| row.elapsed)
  }
}

const HEADERS: [&str; 5] = ["#", "Technique", "Time (ms)", "Tasks", "In order"];

impl fmt::Display for BenchReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "{}: {} tasks x {}ms",
      self.name, self.task_count, self.task_delay_ms
    )?;

    let cells: Vec<[String; 5]> = self
      .rows
      .iter()
      .enumerate()
      .map(|(position, row)| {
        [
          position.to_string(),
          row.technique.label().to_string(),
          format!("{:.2}", row.elapsed_ms()),
          row.tasks_executed.to_string(),
          if row.in_order { "yes" } else { "NO" }.to_string(),
        ]
      })
      .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
      for (width, cell) in widths.iter_mut().zip(row) {
        *width = (*width).max(cell.len());
      }
    }

    let separator = widths
      .iter()
      .map(|width| "-".repeat(width + 2))
      .collect::<Vec<_>>()
      .join("+");
    let header = HEADERS.map(str::to_string);

    writeln!(f, "+{}+", separator)?;
    write_row(f, &header, &widths)?;
    writeln!(f, "+{}+", separator)?;
    for row in &cells {
      write_row(f, row, &widths)?;
    }
    write!(f, "+{}+", separator)
  }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String; 5], widths: &[usize; 5]) -> fmt::Result {
  write!(f, "|")?;
  for (cell, width) in cells.iter().zip(widths) {
    write!(f, " {:<width$} |", cell, width = *width)?;
  }
  writeln!(f)
}
