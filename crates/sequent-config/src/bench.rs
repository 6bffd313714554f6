use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enums::Technique;
use crate::error::ConfigError;

/// Definition of one benchmark session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
  /// Name shown in the report header.
  pub name: String,
  /// Number of synthetic tasks per technique.
  pub task_count: usize,
  /// How long each synthetic task waits before completing.
  pub task_delay_ms: u64,
  /// Pause between two techniques so their timings do not overlap.
  pub pause_between_ms: u64,
  /// Techniques to time, in order.
  pub techniques: Vec<Technique>,
}

impl Default for BenchConfig {
  fn default() -> Self {
    Self {
      name: "sequential task techniques".to_string(),
      task_count: 100,
      task_delay_ms: 50,
      pause_between_ms: 50,
      techniques: Technique::ALL.to_vec(),
    }
  }
}

impl BenchConfig {
  /// Parse a config from JSON. Missing fields take their defaults.
  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    let config: Self =
      serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
    config.validate()?;
    Ok(config)
  }

  /// Load a config from a JSON file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&content)
  }

  /// Check the config is usable.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.techniques.is_empty() {
      return Err(ConfigError::Invalid {
        field: "techniques".to_string(),
        message: "at least one technique is required".to_string(),
      });
    }
    Ok(())
  }

  pub fn task_delay(&self) -> Duration {
    Duration::from_millis(self.task_delay_ms)
  }

  pub fn pause_between(&self) -> Duration {
    Duration::from_millis(self.pause_between_ms)
  }
}
