//! Pipeline module.
//!
//! This module wires the loader, cleaner, filter, aggregator, reporter and
//! chart renderer into a single run.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
