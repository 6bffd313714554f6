use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A way of running a list of async tasks strictly one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
  /// Continuation-driven sequential runner.
  Runner,
  /// Plain `for` loop awaiting each task.
  AwaitLoop,
  /// `Stream::for_each` over the task indices.
  StreamForEach,
  /// Queue of boxed futures drained front to back.
  TaskQueue,
}

impl Technique {
  pub const ALL: [Technique; 4] = [
    Technique::Runner,
    Technique::AwaitLoop,
    Technique::StreamForEach,
    Technique::TaskQueue,
  ];

  /// Config and CLI name.
  pub fn name(self) -> &'static str {
    match self {
      Technique::Runner => "runner",
      Technique::AwaitLoop => "await_loop",
      Technique::StreamForEach => "stream_for_each",
      Technique::TaskQueue => "task_queue",
    }
  }

  /// Human readable label used in reports.
  pub fn label(self) -> &'static str {
    match self {
      Technique::Runner => "Sequential runner (continuations)",
      Technique::AwaitLoop => "Await in a loop",
      Technique::StreamForEach => "Stream for_each",
      Technique::TaskQueue => "Queue of boxed futures",
    }
  }
}

impl fmt::Display for Technique {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Technique {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
    Technique::ALL
      .into_iter()
      .find(|t| t.name() == normalized)
      .ok_or_else(|| ConfigError::UnknownTechnique {
        name: s.to_string(),
        expected: Technique::ALL
          .iter()
          .map(|t| t.name())
          .collect::<Vec<_>>()
          .join(", "),
      })
  }
}
