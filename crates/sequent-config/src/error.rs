//! Configuration errors.

use std::path::PathBuf;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  /// The config file could not be read.
  #[error("failed to read config file '{}': {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The config is not valid JSON for the expected shape.
  #[error("failed to parse config: {source}")]
  Parse {
    #[source]
    source: serde_json::Error,
  },

  /// A field holds a value the benchmark cannot use.
  #[error("invalid value for '{field}': {message}")]
  Invalid { field: String, message: String },

  /// Unknown technique name.
  #[error("unknown technique '{name}' (expected one of: {expected})")]
  UnknownTechnique { name: String, expected: String },
}
