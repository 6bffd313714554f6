//! Sequent Config
//!
//! This crate contains the serializable benchmark configuration types for
//! sequent. A [`BenchConfig`] describes the synthetic task list (how many
//! tasks, how long each one waits) and which sequencing techniques to time
//! against it.
//!
//! Configuration can be loaded from:
//! - JSON files (via CLI with `--config bench.json`)
//! - Defaults matching the classic 100 tasks x 50ms benchmark

mod bench;
mod enums;
mod error;

pub use bench::BenchConfig;
pub use enums::Technique;
pub use error::ConfigError;
