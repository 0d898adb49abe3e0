use crate::aggregator::SalesSummary;
use crate::reporting::SalesInsights;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Age Buckets
// ============================================================================

/// Fixed age bucket derived from a customer's age.
///
/// Buckets are right-inclusive except the first, which also holds age 0:
/// `[0,25] (25,35] (35,45] (45,55] (55,65] (65,100]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AgeGroup {
    #[serde(rename = "0-25")]
    UpTo25,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "36-45")]
    From36To45,
    #[serde(rename = "46-55")]
    From46To55,
    #[serde(rename = "56-65")]
    From56To65,
    #[serde(rename = "66+")]
    Over65,
}

impl AgeGroup {
    /// All buckets in ascending order.
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::UpTo25,
        AgeGroup::From26To35,
        AgeGroup::From36To45,
        AgeGroup::From46To55,
        AgeGroup::From56To65,
        AgeGroup::Over65,
    ];

    /// Oldest age that still falls in a bucket.
    pub const MAX_AGE: i64 = 100;

    /// Bucket for an age, or `None` outside `[0, 100]`.
    pub fn from_age(age: i64) -> Option<Self> {
        match age {
            0..=25 => Some(Self::UpTo25),
            26..=35 => Some(Self::From26To35),
            36..=45 => Some(Self::From36To45),
            46..=55 => Some(Self::From46To55),
            56..=65 => Some(Self::From56To65),
            66..=Self::MAX_AGE => Some(Self::Over65),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UpTo25 => "0-25",
            Self::From26To35 => "26-35",
            Self::From36To45 => "36-45",
            Self::From46To55 => "46-55",
            Self::From56To65 => "56-65",
            Self::Over65 => "66+",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.label() == label)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Data Quality
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// A non-fatal finding about the cleaned transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub issue_type: String,
    pub severity: Severity,
    pub affected_columns: Vec<String>,
    pub description: String,
    pub detection_details: HashMap<String, serde_json::Value>,
}

// ============================================================================
// Pipeline Output
// ============================================================================

/// Row counts and timing of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Rows read from the snapshot.
    pub rows_loaded: usize,
    /// Rows dropped because their transaction id was already seen.
    pub duplicates_removed: usize,
    /// Rows dropped because a source field was missing.
    pub incomplete_removed: usize,
    /// Rows left after cleaning.
    pub rows_cleaned: usize,
    /// Cleaned rows whose age falls outside every bucket.
    pub ungrouped_ages: usize,
    /// Cleaned rows dated within the target year.
    pub rows_in_year: usize,
    /// Number of data quality issues found.
    pub issues_found: usize,
}

impl ProcessingStats {
    /// Percentage of loaded rows removed by cleaning.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_loaded == 0 {
            0.0
        } else {
            (self.rows_loaded - self.rows_cleaned) as f64 / self.rows_loaded as f64 * 100.0
        }
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub year: i32,
    pub summary: SalesSummary,
    pub insights: SalesInsights,
    /// The rendered text report. Always built, written only in report modes.
    pub report_text: String,
    pub cleaning_actions: Vec<String>,
    pub quality_issues: Vec<DataQualityIssue>,
    pub output_files: Vec<PathBuf>,
    pub stats: ProcessingStats,
}
