//! CLI entry point for the retail sales insights pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use sales_insights::{
    ChartView, ComprehensiveReport, DataCleaner, DataLoader, DataQualityAnalyzer, OutputMode,
    Pipeline, PipelineConfig, PipelineResult, ReportGenerator, filter_by_year,
};
use sales_insights::charts::DASHBOARD_FILE;
use sales_insights::config::DEFAULT_OUTPUT_DIR;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible output mode enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputMode {
    /// Text report only
    Report,
    /// One PNG file per chart
    Charts,
    /// All charts on one grid image
    Dashboard,
    /// Report, charts and dashboard
    All,
}

impl From<CliOutputMode> for OutputMode {
    fn from(cli: CliOutputMode) -> Self {
        match cli {
            CliOutputMode::Report => OutputMode::Report,
            CliOutputMode::Charts => OutputMode::Charts,
            CliOutputMode::Dashboard => OutputMode::Dashboard,
            CliOutputMode::All => OutputMode::All,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Yearly sales report and charts from retail transactions",
    long_about = "Cleans a snapshot of retail transactions, aggregates one year of sales \
                  and writes a text report plus charts.\n\n\
                  EXAMPLES:\n  \
                  # Report and charts for 2023\n  \
                  sales-insights -i retail_sales.tsv\n\n  \
                  # Text report only, for another year\n  \
                  sales-insights -i retail_sales.tsv -y 2022 -m report\n\n  \
                  # Comma separated input, JSON on stdout\n  \
                  sales-insights -i retail_sales.csv --delimiter , --json\n\n  \
                  # Preview cleaning without writing anything\n  \
                  sales-insights -i retail_sales.tsv --dry-run"
)]
struct Args {
    /// Path to the delimited transactions file
    #[arg(short, long)]
    input: String,

    /// Year to analyze
    #[arg(short, long, default_value = "2023")]
    year: i32,

    /// Output directory for reports and charts
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: String,

    /// Custom text report name (without extension)
    ///
    /// If not specified, uses "sales_report_{year}"
    #[arg(long)]
    output_name: Option<String>,

    /// Artefacts to produce
    #[arg(short, long, value_enum, default_value = "all")]
    mode: CliOutputMode,

    /// Field delimiter: a single ASCII character, or "tab"
    #[arg(long, default_value = "tab")]
    delimiter: String,

    /// Largest accepted gap between Total_Price and Quantity x Price_Per_Unit
    #[arg(long, default_value = "0.01")]
    tolerance: f64,

    /// Skip the data quality checks
    #[arg(long)]
    no_quality_checks: bool,

    /// Preview loading and cleaning without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the text report
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    /// Useful for piping to other tools: `... --json | jq .insights`
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parse the `--delimiter` value into a single byte.
fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        other => {
            let bytes = other.as_bytes();
            if bytes.len() == 1 {
                Ok(bytes[0])
            } else {
                Err(anyhow!(
                    "Delimiter must be a single ASCII character or \"tab\", got {:?}",
                    other
                ))
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let mut config_builder = PipelineConfig::builder()
        .target_year(args.year)
        .output_mode(args.mode.into())
        .output_dir(&args.output)
        .delimiter(parse_delimiter(&args.delimiter)?)
        .total_price_tolerance(args.tolerance)
        .check_data_quality(!args.no_quality_checks);

    if let Some(ref name) = args.output_name {
        config_builder = config_builder.output_name(name);
    }

    let config = config_builder.build()?;

    if args.dry_run {
        return run_dry_run(&args, &config);
    }

    let pipeline = build_pipeline(&args, config)?;
    run_pipeline(&pipeline, &args)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Load and clean the input, then print what a full run would produce.
///
/// Printed with `println!` so the preview shows at every log level.
fn run_dry_run(args: &Args, config: &PipelineConfig) -> Result<()> {
    let raw = DataLoader::new(config.delimiter).load(&args.input)?;
    let (rows, columns) = raw.shape();

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of the sales analysis");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", rows);
    println!("  Columns: {}", columns);
    println!();

    println!("CLEANING PREVIEW");
    println!("{}", "-".repeat(40));
    let (cleaned, stats) = DataCleaner.clean(raw)?;
    for action in stats.actions() {
        println!("  - {}", action);
    }
    println!();

    println!("YEAR SELECTION");
    println!("{}", "-".repeat(40));
    let in_year = filter_by_year(&cleaned, config.target_year)?.height();
    println!(
        "  {} of {} cleaned transactions fall in {}",
        in_year,
        cleaned.height(),
        config.target_year
    );
    println!();

    println!("DATA QUALITY ISSUES");
    println!("{}", "-".repeat(40));
    if config.check_data_quality {
        let issues =
            DataQualityAnalyzer::identify_issues(&cleaned, config.total_price_tolerance)?;
        if issues.is_empty() {
            println!("  No data quality issues detected");
        } else {
            for issue in &issues {
                let cols = issue.affected_columns.join(", ");
                println!("  - [{}] {}: {}", issue.severity, cols, issue.description);
            }
        }
    } else {
        println!("  Skipped (--no-quality-checks)");
    }
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    for path in planned_outputs(args, config) {
        println!("  - {}", path.display());
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To run the analysis, run without --dry-run");
    if !args.emit_report {
        println!("Add --emit-report to save a detailed JSON report");
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Files a full run with these settings would write.
fn planned_outputs(args: &Args, config: &PipelineConfig) -> Vec<PathBuf> {
    let dir = &config.output_dir;
    let mode = config.output_mode;
    let mut paths = Vec::new();

    if mode.wants_report() {
        paths.push(dir.join(format!("{}.txt", config.report_name())));
    }
    if mode.wants_charts() {
        paths.extend(ChartView::ALL.iter().map(|view| dir.join(view.file_name())));
    }
    if mode.wants_dashboard() {
        paths.push(dir.join(DASHBOARD_FILE));
    }
    if args.emit_report {
        paths.push(dir.join(format!("{}_report.json", extract_file_stem(&args.input))));
    }
    paths
}

/// Run pipeline and print results
fn run_pipeline(pipeline: &Pipeline, args: &Args) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting sales analysis for {}...", args.year);
    info!("{}", "=".repeat(80));

    match pipeline.run(&args.input) {
        Ok(result) => handle_pipeline_output(&result, args),
        Err(e) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "error": &e }))?
                );
            }
            error!("Pipeline failed: {}", e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print the text report and a run summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file, combinable with `--json`
fn handle_pipeline_output(result: &PipelineResult, args: &Args) -> Result<()> {
    let report = ReportGenerator::build_comprehensive_report(Some(&args.input), result);

    if args.emit_report {
        let report_path = emit_report(&report, args)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", result.report_text);
    print_human_readable_summary(&report);

    Ok(())
}

/// Write `<input stem>_report.json` into the output directory.
fn emit_report(report: &ComprehensiveReport, args: &Args) -> Result<PathBuf> {
    let input_stem = extract_file_stem(&args.input);
    let generator = ReportGenerator::new(PathBuf::from(&args.output), None);
    Ok(generator.write_report_to_file(report, &input_stem)?)
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sales")
        .to_string()
}

/// Print a summary of the run below the text report.
fn print_human_readable_summary(report: &ComprehensiveReport) {
    let summary = &report.processing_summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    if let Some(ref input) = report.input_file {
        println!("Input: {} ({} transactions)", input, summary.rows_loaded);
    }
    println!("Year:  {} ({} transactions)", report.year, summary.rows_in_year);
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Transactions: {} -> {} ({:.1}% removed)",
        summary.rows_loaded, summary.rows_cleaned, summary.rows_removed_percent
    );
    println!(
        "  Removed: {} duplicates, {} with missing fields",
        summary.duplicates_removed, summary.incomplete_removed
    );
    if summary.ungrouped_ages > 0 {
        println!("  Outside age groups: {}", summary.ungrouped_ages);
    }
    println!("  Quality issues: {}", summary.issues_found);
    println!();

    if !report.quality_issues.is_empty() {
        println!("Warnings:");
        for issue in &report.quality_issues {
            println!("  ! [{}] {}", issue.severity, issue.description);
        }
        println!();
    }

    if !report.output_files.is_empty() {
        println!("Files Written:");
        for file in &report.output_files {
            println!("  - {}", file);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert!(parse_delimiter(";;").is_err());
    }

    #[test]
    fn test_extract_file_stem() {
        assert_eq!(extract_file_stem("data/retail_sales.tsv"), "retail_sales");
        assert_eq!(extract_file_stem(""), "sales");
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["sales-insights", "-i", "sales.tsv"]).unwrap();
        assert_eq!(args.year, 2023);
        assert_eq!(args.output, "./outputs");
        assert!(matches!(args.mode, CliOutputMode::All));
        assert_eq!(args.delimiter, "tab");
        assert!(!args.dry_run);
    }

    #[test]
    fn test_planned_outputs_report_mode() {
        let args = Args::try_parse_from([
            "sales-insights", "-i", "sales.tsv", "-m", "report", "-y", "2022", "-r",
        ])
        .unwrap();
        let config = PipelineConfig::builder()
            .target_year(args.year)
            .output_mode(args.mode.into())
            .output_dir(&args.output)
            .build()
            .unwrap();

        let paths = planned_outputs(&args, &config);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("./outputs/sales_report_2022.txt"),
                PathBuf::from("./outputs/sales_report.json"),
            ]
        );
    }

    #[test]
    fn test_json_output_still_emits_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/duplicate_transactions.tsv");
        let output = dir.path().to_string_lossy().to_string();
        let args = Args::try_parse_from([
            "sales-insights",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.as_str(),
            "--json",
            "-r",
        ])
        .unwrap();

        let config = PipelineConfig::builder().save_to_disk(false).build().unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .run(&args.input)
            .unwrap();

        handle_pipeline_output(&result, &args).unwrap();

        let written = dir.path().join("duplicate_transactions_report.json");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(json["processing_summary"]["rows_cleaned"], 2);
    }
}
