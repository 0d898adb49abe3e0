//! Retail Sales Insights Library
//!
//! A batch pipeline built with Rust and Polars that turns a snapshot of
//! retail transactions into a yearly text report and a set of charts.
//!
//! # Overview
//!
//! One run flows strictly left to right:
//!
//! - **Loading**: Reads a delimited file and validates its nine-column header
//! - **Cleaning**: Type coercion, duplicate removal, incomplete-record removal, age buckets
//! - **Quality Checks**: Non-fatal checks such as totals that disagree with quantity x price
//! - **Filtering**: Keeps the transactions of the target year
//! - **Aggregation**: Monthly, customer, category, age group and gender x category tables
//! - **Reporting**: Text report plus a machine-readable JSON report
//! - **Charts**: Seven PNG views and a combined dashboard
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_insights::{OutputMode, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .target_year(2023)
//!     .output_mode(OutputMode::All)
//!     .output_dir("outputs")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run("retail_sales.tsv")?;
//!
//! println!("{}", result.report_text);
//! println!("Files written: {:?}", result.output_files);
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to customize a run:
//!
//! ```rust,ignore
//! use sales_insights::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .target_year(2022)
//!     .output_mode(OutputMode::Report)  // text report only
//!     .delimiter(b',')                  // comma separated input
//!     .total_price_tolerance(0.05)      // accept small rounding gaps
//!     .chart_size(1200, 800)
//!     .build()?;
//! ```
//!
//! # Running Stages Individually
//!
//! Every stage is usable on its own:
//!
//! ```rust,ignore
//! use sales_insights::{filter_by_year, DataCleaner, DataLoader, SalesAggregator};
//!
//! let raw = DataLoader::default().load("retail_sales.tsv")?;
//! let (cleaned, stats) = DataCleaner.clean(raw)?;
//! let year = filter_by_year(&cleaned, 2023)?;
//! let summary = SalesAggregator.aggregate(&year, 2023)?;
//! ```

pub mod aggregator;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregator::{
    AgeGroupSales, CategorySales, CustomerSales, GenderCategorySales, GenderSalesRow,
    MonthlySales, SalesAggregator, SalesSummary,
};
pub use charts::{ChartData, ChartRenderer, ChartView};
pub use cleaner::{CleaningStats, DataCleaner};
pub use config::{ConfigValidationError, OutputMode, PipelineConfig, PipelineConfigBuilder};
pub use error::{Result as SalesResult, ResultExt, SalesError};
pub use filter::filter_by_year;
pub use loader::DataLoader;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use quality::DataQualityAnalyzer;
pub use reporting::{ComprehensiveReport, ProcessingSummaryReport, ReportGenerator, SalesInsights};
pub use types::{AgeGroup, DataQualityIssue, PipelineResult, ProcessingStats, Severity};
pub use utils::format_currency;
