//! Report generation module.
//!
//! This module derives the headline figures of a year and renders them as
//! the yearly text report and as a machine-readable JSON report.
//!
//! # Comprehensive Reports
//!
//! Use [`ComprehensiveReport`] to generate unified reports suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_insights::reporting::ReportGenerator;
//!
//! // Build a comprehensive report from pipeline results
//! let report = ReportGenerator::build_comprehensive_report(Some("sales.tsv"), &result);
//!
//! // Print as JSON
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! // Or write to file
//! let generator = ReportGenerator::new(PathBuf::from("./outputs"), None);
//! generator.write_report_to_file(&report, "sales")?;
//! ```

mod generator;
mod insights;

pub use generator::{
    ComprehensiveReport, ProcessingSummaryReport, RECOMMENDATIONS, ReportGenerator,
    TIMESTAMP_FORMAT,
};
pub use insights::SalesInsights;
