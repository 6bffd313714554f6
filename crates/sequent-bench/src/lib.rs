//! Benchmark harness for sequent.
//!
//! This crate provides the [`BenchHarness`] which times several techniques
//! for running the same synthetic task list one task after another. The
//! sequential runner is one of them; the others are the usual async Rust
//! spellings of the same contract, kept for comparison.
//!
//! Results come back as a [`BenchReport`] value rather than being collected
//! in shared state, and render as a table through `Display`.

mod error;
mod harness;
mod report;
mod technique;

pub use error::BenchError;
pub use harness::BenchHarness;
pub use report::{BenchReport, BenchRow};
