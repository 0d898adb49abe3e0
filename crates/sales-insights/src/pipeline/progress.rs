//! Progress reporting for the sales pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] when each stage starts and ends,
//! so a host can drive a progress bar or a log line per stage.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_insights::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run("sales.tsv")?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Pipeline is starting up
    Initializing,
    /// Reading the delimited input file
    Loading,
    /// Coercing types, dropping duplicates and incomplete records
    Cleaning,
    /// Checking cleaned records for suspicious values
    QualityAnalysis,
    /// Keeping the records of the target year
    Filtering,
    /// Building the summary tables
    Aggregating,
    /// Rendering and writing the text report
    ReportGeneration,
    /// Rendering chart images
    ChartRendering,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Working stages in execution order.
    pub const ORDER: [PipelineStage; 8] = [
        PipelineStage::Initializing,
        PipelineStage::Loading,
        PipelineStage::Cleaning,
        PipelineStage::QualityAnalysis,
        PipelineStage::Filtering,
        PipelineStage::Aggregating,
        PipelineStage::ReportGeneration,
        PipelineStage::ChartRendering,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Data",
            Self::QualityAnalysis => "Analyzing Quality",
            Self::Filtering => "Filtering Year",
            Self::Aggregating => "Aggregating Sales",
            Self::ReportGeneration => "Generating Report",
            Self::ChartRendering => "Rendering Charts",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run this stage typically takes.
    ///
    /// Working stages sum to 1.0; terminal states weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::Loading => 0.15,
            Self::Cleaning => 0.20,
            Self::QualityAnalysis => 0.08,
            Self::Filtering => 0.05,
            Self::Aggregating => 0.15,
            Self::ReportGeneration => 0.10,
            Self::ChartRendering => 0.25,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Failed => 0.0,
            stage => Self::ORDER
                .iter()
                .take_while(|s| *s != stage)
                .map(|s| s.weight())
                .sum(),
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from a running pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline can be moved onto a
/// worker thread together with its reporter.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_stage_weights_sum() {
        let total_weight: f32 = PipelineStage::ORDER.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.001, "Weights should sum to 1.0");
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        assert_eq!(PipelineStage::Initializing.base_progress(), 0.0);
        assert!((PipelineStage::Loading.base_progress() - 0.02).abs() < 1e-6);
        assert!((PipelineStage::ChartRendering.base_progress() - 0.75).abs() < 1e-6);
        assert_eq!(PipelineStage::Complete.base_progress(), 1.0);

        let mut last = -1.0;
        for stage in PipelineStage::ORDER {
            assert!(stage.base_progress() > last);
            last = stage.base_progress();
        }
    }

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Cleaning, 0.5, "Cleaning...");
        assert_eq!(update.stage, PipelineStage::Cleaning);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.27).abs() < 1e-6);
        assert_eq!(update.message, "Cleaning...");
    }

    #[test]
    fn test_progress_update_clamps() {
        let update = ProgressUpdate::new(PipelineStage::ChartRendering, 3.0, "overshoot");
        assert_eq!(update.stage_progress, 1.0);
        assert!(update.progress <= 1.0);
    }

    #[test]
    fn test_progress_update_terminal() {
        let done = ProgressUpdate::complete("Done!");
        assert_eq!(done.stage, PipelineStage::Complete);
        assert_eq!(done.progress, 1.0);

        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, PipelineStage::Failed);
        assert_eq!(failed.progress, 0.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Loading, 0.5, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_json_values() {
        let stage_expectations = [
            (PipelineStage::Initializing, "\"initializing\""),
            (PipelineStage::QualityAnalysis, "\"quality_analysis\""),
            (PipelineStage::ReportGeneration, "\"report_generation\""),
            (PipelineStage::ChartRendering, "\"chart_rendering\""),
            (PipelineStage::Failed, "\"failed\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).expect("Should serialize");
            assert_eq!(json, expected_json);
        }
    }

    #[test]
    fn test_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        let handle = std::thread::spawn(move || {
            reporter_clone.report(ProgressUpdate::new(
                PipelineStage::Aggregating,
                0.5,
                "Test from background thread",
            ));
        });

        handle.join().expect("Thread should not panic");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
