use crate::aggregator::{
    AgeGroupSales, CategorySales, CustomerSales, GenderCategorySales, MonthlySales, SalesSummary,
};
use crate::config::DEFAULT_OUTPUT_DIR;
use crate::error::{Result, SalesError};
use crate::reporting::SalesInsights;
use crate::types::{DataQualityIssue, PipelineResult};
use crate::utils::format_currency;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Fixed recommendations closing every text report.
pub const RECOMMENDATIONS: [&str; 4] = [
    "Focus marketing efforts on the age group with the highest sales for targeted campaigns.",
    "Consider product bundling or discounts in lower-sales months to increase revenue.",
    "Strengthen customer loyalty programs to retain top customers and encourage repeat business.",
    "Explore partnerships or promotions with most popular product categories to increase engagement.",
];

const NOT_AVAILABLE: &str = "n/a";

/// Timestamp layout used in both reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// Comprehensive Report Types
// ============================================================================

/// Machine-readable report of a pipeline run.
///
/// Use this for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file, when the run started from a file
    pub input_file: Option<String>,
    /// Year the tables cover
    pub year: i32,

    /// Row counts and timing
    pub processing_summary: ProcessingSummaryReport,

    /// Headline figures
    pub insights: SalesInsights,

    // Summary tables
    pub monthly_sales: Vec<MonthlySales>,
    pub customer_sales: Vec<CustomerSales>,
    pub category_sales: Vec<CategorySales>,
    pub age_group_sales: Vec<AgeGroupSales>,
    pub gender_category_sales: GenderCategorySales,

    /// List of cleaning actions performed
    pub cleaning_actions: Vec<String>,
    /// Non-fatal findings about the data
    pub quality_issues: Vec<DataQualityIssue>,
    /// Files written by the run
    pub output_files: Vec<String>,
}

/// Summary of processing for the comprehensive report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    /// Total execution time in milliseconds
    pub duration_ms: u64,
    /// Rows read from the input
    pub rows_loaded: usize,
    /// Rows removed for repeating a transaction id
    pub duplicates_removed: usize,
    /// Rows removed for a missing field
    pub incomplete_removed: usize,
    /// Rows left after cleaning
    pub rows_cleaned: usize,
    /// Percentage of loaded rows removed
    pub rows_removed_percent: f64,
    /// Cleaned rows without an age group
    pub ungrouped_ages: usize,
    /// Cleaned rows dated within the year
    pub rows_in_year: usize,
    /// Number of data quality issues found
    pub issues_found: usize,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Renders and persists the text and JSON reports.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Render the human-readable report.
    ///
    /// Sections are separated the way the yearly report has always been laid
    /// out, with a blank spacer line between them.
    pub fn render_text_report(
        summary: &SalesSummary,
        insights: &SalesInsights,
        quality_issues: &[DataQualityIssue],
        generated_at: &str,
    ) -> String {
        let year = summary.year;
        let month_name = |month: &Option<MonthlySales>| {
            month
                .as_ref()
                .map(|m| m.month.format("%B %Y").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let spacer = "\n".to_string();

        let mut lines = vec![
            format!("Sales Analysis Report for {year}"),
            "=".repeat(35),
            format!("Report Generated on: {generated_at}"),
            spacer.clone(),
        ];

        lines.push("Monthly Sales Analysis:".to_string());
        lines.push(format!(
            "  - Highest sales month: {}",
            month_name(&insights.highest_month)
        ));
        lines.push(format!(
            "  - Lowest sales month: {}",
            month_name(&insights.lowest_month)
        ));
        lines.push(format!(
            "  - Total sales for the year: {}",
            format_currency(insights.total_sales)
        ));
        lines.push(spacer.clone());

        lines.push("Customer Purchasing Analysis:".to_string());
        lines.push(format!(
            "  - Customer with the highest total spending: {}",
            insights
                .top_customer
                .as_ref()
                .map(|c| format!("{} ({})", c.customer_id, format_currency(c.total_sales)))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        ));
        lines.push(format!(
            "  - Total unique customers in {year}: {}",
            insights.unique_customers
        ));
        lines.push(spacer.clone());

        lines.push("Product Popularity Analysis:".to_string());
        lines.push(format!(
            "  - Most popular product category by sales: {}",
            insights
                .top_category
                .as_ref()
                .map(|c| format!("{} ({})", c.category, format_currency(c.total_sales)))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        ));
        lines.push(format!(
            "  - Total unique product categories in {year}: {}",
            insights.unique_categories
        ));
        lines.push(spacer.clone());

        lines.push("Sales by Age Group:".to_string());
        lines.push(format!(
            "  - Age group with the highest sales: {}",
            insights
                .top_age_group
                .as_ref()
                .map(|g| g.age_group.label())
                .unwrap_or(NOT_AVAILABLE)
        ));
        lines.push("  - Total sales by age group:".to_string());
        for group in &summary.age_groups {
            lines.push(format!(
                "    - {}: {}",
                group.age_group,
                format_currency(group.total_sales)
            ));
        }
        lines.push(spacer.clone());

        if !quality_issues.is_empty() {
            lines.push("Data Quality Notes:".to_string());
            for issue in quality_issues {
                lines.push(format!("  - [{}] {}", issue.severity, issue.description));
            }
            lines.push(spacer);
        }

        lines.push("Recommendations:".to_string());
        for recommendation in RECOMMENDATIONS {
            lines.push(format!("  - {recommendation}"));
        }

        lines.join("\n")
    }

    /// Render the text report stamped with the current local time.
    pub fn generate_text_report(
        summary: &SalesSummary,
        insights: &SalesInsights,
        quality_issues: &[DataQualityIssue],
    ) -> String {
        let generated_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::render_text_report(summary, insights, quality_issues, &generated_at)
    }

    /// Base file name (without extension) of the text report for `year`.
    pub fn text_report_name(&self, year: i32) -> String {
        self.output_name
            .clone()
            .unwrap_or_else(|| format!("sales_report_{year}"))
    }

    /// Write the text report to `{output_dir}/{name}.txt`.
    pub fn write_text_report(&self, report_text: &str, year: i32) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}.txt", self.text_report_name(year)));
        let mut file = File::create(&report_path)?;
        file.write_all(report_text.as_bytes())?;
        file.write_all(b"\n")?;

        info!("Text report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Build a comprehensive report from pipeline results.
    ///
    /// This method creates a single, unified report structure that can be:
    /// - Serialized to JSON and printed to stdout (`--json`)
    /// - Written to a file (`--emit-report`)
    /// - Used programmatically in library mode
    pub fn build_comprehensive_report(
        input_file: Option<&str>,
        result: &PipelineResult,
    ) -> ComprehensiveReport {
        let stats = &result.stats;
        let processing_summary = ProcessingSummaryReport {
            duration_ms: stats.duration_ms,
            rows_loaded: stats.rows_loaded,
            duplicates_removed: stats.duplicates_removed,
            incomplete_removed: stats.incomplete_removed,
            rows_cleaned: stats.rows_cleaned,
            rows_removed_percent: stats.rows_removed_percentage(),
            ungrouped_ages: stats.ungrouped_ages,
            rows_in_year: stats.rows_in_year,
            issues_found: stats.issues_found,
        };

        ComprehensiveReport {
            generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            input_file: input_file.map(String::from),
            year: result.year,
            processing_summary,
            insights: result.insights.clone(),
            monthly_sales: result.summary.monthly.clone(),
            customer_sales: result.summary.customers.clone(),
            category_sales: result.summary.categories.clone(),
            age_group_sales: result.summary.age_groups.clone(),
            gender_category_sales: result.summary.gender_categories.clone(),
            cleaning_actions: result.cleaning_actions.clone(),
            quality_issues: result.quality_issues.clone(),
            output_files: result
                .output_files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        }
    }

    /// Write a comprehensive report to a JSON file.
    ///
    /// The report is written to the output directory with the specified base name.
    /// For example, if `report_base_name` is "sales", the file will be "sales_report.json".
    pub fn write_report_to_file(
        &self,
        report: &ComprehensiveReport,
        report_base_name: &str,
    ) -> Result<PathBuf> {
        if report_base_name.trim().is_empty() {
            return Err(SalesError::ReportGenerationFailed(
                "report base name is empty".to_string(),
            ));
        }
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{report_base_name}_report.json"));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgeGroup, ProcessingStats, Severity};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn example_summary() -> SalesSummary {
        let mut age_groups: Vec<AgeGroupSales> = AgeGroup::ALL
            .into_iter()
            .map(|age_group| AgeGroupSales {
                age_group,
                total_sales: 0.0,
                quantity: 0,
            })
            .collect();
        age_groups[1].total_sales = 40.0;
        age_groups[1].quantity = 2;
        age_groups[4].total_sales = 500.0;
        age_groups[4].quantity = 1;

        SalesSummary {
            year: 2023,
            monthly: vec![
                MonthlySales {
                    month: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    total_sales: 40.0,
                },
                MonthlySales {
                    month: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
                    total_sales: 500.0,
                },
            ],
            customers: vec![
                CustomerSales {
                    customer_id: "C2".to_string(),
                    total_sales: 500.0,
                    quantity: 1,
                },
                CustomerSales {
                    customer_id: "C1".to_string(),
                    total_sales: 40.0,
                    quantity: 2,
                },
            ],
            categories: vec![
                CategorySales {
                    category: "Electronics".to_string(),
                    total_sales: 500.0,
                    quantity: 1,
                },
                CategorySales {
                    category: "Clothing".to_string(),
                    total_sales: 40.0,
                    quantity: 2,
                },
            ],
            age_groups,
            gender_categories: GenderCategorySales::default(),
        }
    }

    #[test]
    fn test_default_output_dir_matches_config() {
        let generator = ReportGenerator::default();
        assert_eq!(generator.output_dir, crate::PipelineConfig::default().output_dir);
    }

    #[test]
    fn test_render_text_report() {
        let summary = example_summary();
        let insights = SalesInsights::from_summary(&summary);
        let text =
            ReportGenerator::render_text_report(&summary, &insights, &[], "2024-01-01 09:00:00");

        let expected = [
            "Sales Analysis Report for 2023",
            "===================================",
            "Report Generated on: 2024-01-01 09:00:00",
            "\n",
            "Monthly Sales Analysis:",
            "  - Highest sales month: February 2023",
            "  - Lowest sales month: January 2023",
            "  - Total sales for the year: $540.00",
            "\n",
            "Customer Purchasing Analysis:",
            "  - Customer with the highest total spending: C2 ($500.00)",
            "  - Total unique customers in 2023: 2",
            "\n",
            "Product Popularity Analysis:",
            "  - Most popular product category by sales: Electronics ($500.00)",
            "  - Total unique product categories in 2023: 2",
            "\n",
            "Sales by Age Group:",
            "  - Age group with the highest sales: 56-65",
            "  - Total sales by age group:",
            "    - 0-25: $0.00",
            "    - 26-35: $40.00",
            "    - 36-45: $0.00",
            "    - 46-55: $0.00",
            "    - 56-65: $500.00",
            "    - 66+: $0.00",
            "\n",
            "Recommendations:",
            "  - Focus marketing efforts on the age group with the highest sales for targeted campaigns.",
            "  - Consider product bundling or discounts in lower-sales months to increase revenue.",
            "  - Strengthen customer loyalty programs to retain top customers and encourage repeat business.",
            "  - Explore partnerships or promotions with most popular product categories to increase engagement.",
        ]
        .join("\n");

        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_report_empty_year() {
        let mut summary = example_summary();
        summary.monthly.clear();
        summary.customers.clear();
        summary.categories.clear();
        for group in &mut summary.age_groups {
            group.total_sales = 0.0;
            group.quantity = 0;
        }
        let insights = SalesInsights::from_summary(&summary);
        let text = ReportGenerator::render_text_report(&summary, &insights, &[], "now");

        assert!(text.contains("  - Highest sales month: n/a"));
        assert!(text.contains("  - Customer with the highest total spending: n/a"));
        assert!(text.contains("  - Age group with the highest sales: n/a"));
        assert!(text.contains("  - Total sales for the year: $0.00"));
    }

    #[test]
    fn test_render_text_report_quality_notes() {
        let summary = example_summary();
        let insights = SalesInsights::from_summary(&summary);
        let issue = DataQualityIssue {
            issue_type: "age_out_of_range".to_string(),
            severity: Severity::Medium,
            affected_columns: vec!["Age".to_string()],
            description: "1 transactions have an age outside 0-100".to_string(),
            detection_details: HashMap::new(),
        };
        let text = ReportGenerator::render_text_report(&summary, &insights, &[issue], "now");

        assert!(text.contains("Data Quality Notes:\n  - [medium] 1 transactions have an age outside 0-100"));
        let notes = text.find("Data Quality Notes:").unwrap();
        let recommendations = text.find("Recommendations:").unwrap();
        assert!(notes < recommendations);
    }

    #[test]
    fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().to_path_buf(), None);

        let path = generator.write_text_report("hello", 2023).unwrap();
        assert_eq!(path.file_name().unwrap(), "sales_report_2023.txt");
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");

        let summary = example_summary();
        let result = PipelineResult {
            year: 2023,
            insights: SalesInsights::from_summary(&summary),
            summary,
            report_text: String::new(),
            cleaning_actions: vec!["No duplicate transactions found".to_string()],
            quality_issues: vec![],
            output_files: vec![path.clone()],
            stats: ProcessingStats {
                rows_loaded: 3,
                rows_cleaned: 2,
                rows_in_year: 2,
                ..Default::default()
            },
        };
        let report = ReportGenerator::build_comprehensive_report(Some("sales.tsv"), &result);
        assert_eq!(report.year, 2023);
        assert_eq!(report.customer_sales.len(), 2);
        assert_eq!(report.processing_summary.rows_cleaned, 2);

        let json_path = generator.write_report_to_file(&report, "sales").unwrap();
        assert_eq!(json_path.file_name().unwrap(), "sales_report.json");
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(parsed["insights"]["top_customer"]["customer_id"], "C2");
        assert_eq!(parsed["age_group_sales"][4]["age_group"], "56-65");
    }

    #[test]
    fn test_custom_report_name() {
        let generator = ReportGenerator::new(PathBuf::from("out"), Some("q4".to_string()));
        assert_eq!(generator.text_report_name(2023), "q4");
    }
}
