//! Main sales pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating a yearly sales run.

use crate::aggregator::SalesAggregator;
use crate::charts::{ChartData, ChartRenderer};
use crate::cleaner::DataCleaner;
use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::filter::filter_by_year;
use crate::loader::DataLoader;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::quality::DataQualityAnalyzer;
use crate::reporting::{ReportGenerator, SalesInsights};
use crate::types::{PipelineResult, ProcessingStats};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The yearly sales pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use sales_insights::{OutputMode, Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .target_year(2023)
///     .output_mode(OutputMode::Report)
///     .build()?;
///
/// let result = Pipeline::builder()
///     .config(config)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run("sales.tsv")?;
///
/// println!("{}", result.report_text);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    loader: DataLoader,
    cleaner: DataCleaner,
    aggregator: SalesAggregator,
    reporter: ReportGenerator,
    charts: ChartRenderer,
}

// A host may move a run onto a worker thread.
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the transactions at `path` and run every stage on them.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let path = path.as_ref();
        let start_time = Instant::now();
        self.start();
        self.finish(
            self.load(path)
                .and_then(|df| self.process_internal(df, start_time)),
        )
    }

    /// Run every stage after loading on an already loaded table.
    ///
    /// The table must carry the nine transaction columns; its cells may
    /// still be raw strings.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.start();
        self.finish(self.process_internal(df, Instant::now()))
    }

    fn start(&self) {
        let year = self.config.target_year;
        info!(
            "Starting sales pipeline for {} ({:?})",
            year, self.config.output_mode
        );
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Initializing,
            1.0,
            format!("Analyzing sales for {year}"),
        ));
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Sales analysis for {} completed",
                    result.year
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn load(&self, path: &Path) -> Result<DataFrame> {
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            format!("Loading {}...", path.display()),
        ));
        let df = self.loader.load(path)?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} transactions", df.height()),
        ));
        Ok(df)
    }

    fn process_internal(&self, df: DataFrame, start_time: Instant) -> Result<PipelineResult> {
        let year = self.config.target_year;
        let mode = self.config.output_mode;

        let rows_loaded = df.height();

        // Step 1: Cleaning
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            0.0,
            "Cleaning transactions...",
        ));
        info!("Step 1: Cleaning transactions...");

        let (cleaned, cleaning) = self.cleaner.clean(df).context("Cleaning transactions")?;
        let cleaning_actions = cleaning.actions();
        for action in &cleaning_actions {
            debug!("  {}", action);
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Cleaning,
            1.0,
            format!(
                "Kept {} of {} transactions",
                cleaning.rows_after, cleaning.rows_before
            ),
        ));

        // Step 2: Data quality checks
        let quality_issues = if self.config.check_data_quality {
            self.report_progress(ProgressUpdate::new(
                PipelineStage::QualityAnalysis,
                0.0,
                "Analyzing data quality...",
            ));
            info!("Step 2: Identifying data quality issues...");

            let issues = DataQualityAnalyzer::identify_issues(
                &cleaned,
                self.config.total_price_tolerance,
            )?;
            for issue in &issues {
                warn!("[{}] {}", issue.severity, issue.description);
            }

            self.report_progress(ProgressUpdate::new(
                PipelineStage::QualityAnalysis,
                1.0,
                format!("Found {} data quality issues", issues.len()),
            ));
            issues
        } else {
            info!("Step 2: Skipping data quality checks (disabled)");
            Vec::new()
        };

        // Step 3: Year filter
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Filtering,
            0.0,
            format!("Selecting transactions from {year}..."),
        ));
        info!("Step 3: Filtering transactions for {}...", year);

        let filtered = filter_by_year(&cleaned, year)?;
        if filtered.height() == 0 {
            warn!("No transactions found for {}", year);
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Filtering,
            1.0,
            format!("{} transactions in {}", filtered.height(), year),
        ));

        // Step 4: Aggregation
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Aggregating,
            0.0,
            "Aggregating sales...",
        ));
        info!("Step 4: Aggregating sales...");

        let summary = self.aggregator.aggregate(&filtered, year)?;
        let insights = SalesInsights::from_summary(&summary);
        debug!(
            "{} months, {} customers, {} categories",
            summary.monthly.len(),
            summary.customers.len(),
            summary.categories.len()
        );

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Aggregating,
            1.0,
            "Summary tables ready",
        ));

        // Step 5: Text report
        self.report_progress(ProgressUpdate::new(
            PipelineStage::ReportGeneration,
            0.0,
            "Generating report...",
        ));
        info!("Step 5: Generating text report...");

        let report_text =
            ReportGenerator::generate_text_report(&summary, &insights, &quality_issues);
        let mut output_files = Vec::new();
        if self.config.save_to_disk && mode.wants_report() {
            output_files.push(self.reporter.write_text_report(&report_text, year)?);
        }

        self.report_progress(ProgressUpdate::new(
            PipelineStage::ReportGeneration,
            1.0,
            "Report ready",
        ));

        // Step 6: Charts
        if self.config.save_to_disk && (mode.wants_charts() || mode.wants_dashboard()) {
            self.report_progress(ProgressUpdate::new(
                PipelineStage::ChartRendering,
                0.0,
                "Rendering charts...",
            ));
            info!("Step 6: Rendering charts...");

            let data = ChartData::from_frames(&summary, &cleaned, &filtered)?;
            if mode.wants_charts() {
                output_files.extend(self.charts.render_charts(&data)?);
            }
            if mode.wants_dashboard() {
                output_files.push(self.charts.render_dashboard(&data)?);
            }

            self.report_progress(ProgressUpdate::new(
                PipelineStage::ChartRendering,
                1.0,
                "Charts rendered",
            ));
        } else {
            debug!("Step 6: Skipping chart rendering");
        }

        let stats = ProcessingStats {
            duration_ms: start_time.elapsed().as_millis() as u64,
            rows_loaded,
            duplicates_removed: cleaning.duplicates_removed,
            incomplete_removed: cleaning.incomplete_removed,
            rows_cleaned: cleaning.rows_after,
            ungrouped_ages: cleaning.ungrouped_ages,
            rows_in_year: filtered.height(),
            issues_found: quality_issues.len(),
        };

        if stats.rows_removed_percentage() > 30.0 {
            warn!(
                "High data loss: {:.1}% of transactions were removed",
                stats.rows_removed_percentage()
            );
        }

        Ok(PipelineResult {
            year,
            summary,
            insights,
            report_text,
            cleaning_actions,
            quality_issues,
            output_files,
            stats,
        })
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Fails with [`SalesError::InvalidConfig`](crate::error::SalesError::InvalidConfig)
    /// if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter =
            ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());
        let charts = ChartRenderer::new(
            config.output_dir.clone(),
            config.chart_width,
            config.chart_height,
        );

        Ok(Pipeline {
            loader: DataLoader::new(config.delimiter),
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            aggregator: SalesAggregator,
            reporter,
            charts,
            config,
        })
    }
}
