//! CLI entry point for the missing-data imputation engine.

use anyhow::{Result, anyhow};
use clap::Parser;
use lex_imputation::{
    DataCompletenessMetrics, DataProfiler, Dataset, Diagnosis, ImputationConfig,
    ImputationResult, analyze_original_completeness, analyze_post_imputation_completeness,
    diagnose_missing_data, impute_missing_data,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Missing-data diagnosis and imputation",
    long_about = "Diagnoses missing-value patterns in a CSV or JSON dataset and fills them \
                  with a statistical estimator, recording a confidence for every filled cell.\n\n\
                  METHODS:\n  \
                  auto, mean_median, knn, regression, random_forest, neural_network, mice, none\n\n\
                  EXAMPLES:\n  \
                  # Let the diagnosis pick a method\n  \
                  lex-imputation -i data.csv -o imputed.csv\n\n  \
                  # Inspect missingness only\n  \
                  lex-imputation -i data.csv --diagnose\n\n  \
                  # Chained equations with a JSON report\n  \
                  lex-imputation -i data.json -m mice --max-iterations 20 -r report.json"
)]
struct Args {
    /// Path to the CSV or JSON (array of records) file to process
    #[arg(short, long)]
    input: String,

    /// Imputation method
    ///
    /// Unknown names fall back to mean_median with a warning.
    #[arg(short, long, default_value = "auto")]
    method: String,

    /// Maximum chained-equations passes
    #[arg(long, default_value = "10")]
    max_iterations: usize,

    /// Confidence below which a filled cell counts as low confidence (0.0 - 1.0)
    #[arg(long, default_value = "0.7")]
    confidence_threshold: f64,

    /// Override the number of KNN neighbours (derived from the row count by default)
    #[arg(long)]
    knn_neighbors: Option<usize>,

    /// Number of stumps in the random forest estimator
    #[arg(long, default_value = "10")]
    trees: usize,

    /// Seed for the random forest bootstrap
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Do not add `<field>_imputed` marker fields
    #[arg(long)]
    no_mark_imputed: bool,

    /// Write the imputed dataset here (.json for JSON, CSV otherwise)
    #[arg(short, long)]
    output: Option<String>,

    /// Write the full JSON result and completeness metrics here
    #[arg(short = 'r', long)]
    report: Option<String>,

    /// Only diagnose missingness; do not impute
    #[arg(long)]
    diagnose: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Diagnosis output for `--diagnose`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosisReport<'a> {
    input_file: &'a str,
    diagnosis: &'a Diagnosis,
    completeness: &'a DataCompletenessMetrics,
}

/// Full imputation output for `--json` and `--report`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImputationReport<'a> {
    input_file: &'a str,
    result: &'a ImputationResult,
    completeness: &'a DataCompletenessMetrics,
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

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let dataset = load_dataset(&args.input)?;
    info!(
        "Dataset loaded: {} rows x {} fields",
        dataset.len(),
        dataset.width()
    );

    if args.diagnose {
        return run_diagnosis(&args, &dataset);
    }

    let mut builder = ImputationConfig::builder()
        .method_name(&args.method)
        .max_iterations(args.max_iterations)
        .confidence_threshold(args.confidence_threshold)
        .mark_imputed(!args.no_mark_imputed)
        .forest_trees(args.trees)
        .random_seed(args.seed);
    if let Some(k) = args.knn_neighbors {
        builder = builder.knn_neighbors(k);
    }
    let config = builder.build()?;

    let result = impute_missing_data(&dataset, &config)?;
    let completeness = analyze_post_imputation_completeness(
        &dataset,
        &result.data,
        &result.imputed_fields,
        config.confidence_threshold,
    );

    if let Some(ref output) = args.output {
        write_dataset(output, &result.data, &dataset)?;
        info!("Imputed dataset saved: {}", output);
    }

    let report = ImputationReport {
        input_file: &args.input,
        result: &result,
        completeness: &completeness,
    };

    if let Some(ref path) = args.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!("Report saved: {}", path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !args.quiet {
        print_human_readable_summary(&args, &dataset, &result, &completeness);
    }

    Ok(())
}

/// Print the missingness diagnosis.
///
/// Uses `println!` for user-facing output that must show regardless of the
/// log level.
fn run_diagnosis(args: &Args, dataset: &Dataset) -> Result<()> {
    let diagnosis = diagnose_missing_data(dataset);
    let completeness = analyze_original_completeness(dataset);

    if args.json {
        let report = DiagnosisReport {
            input_file: &args.input,
            diagnosis: &diagnosis,
            completeness: &completeness,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(80));
    println!("MISSING DATA DIAGNOSIS");
    println!("{}\n", "=".repeat(80));

    println!("  File: {}", args.input);
    println!("  Rows: {}", dataset.len());
    println!("  Fields: {}", dataset.width());
    println!(
        "  Completeness: {:.1}% ({})",
        completeness.original_completeness,
        completeness.quality_level.as_str()
    );
    println!();

    println!("FIELD PROFILES");
    println!("{}", "-".repeat(70));
    println!(
        "{:<24} {:<12} {:<10} {:<10}",
        "Field", "Type", "Missing %", "Unique"
    );
    println!("{}", "-".repeat(70));
    for profile in DataProfiler::profile_dataset(dataset) {
        println!(
            "{:<24} {:<12} {:<10.1} {:<10}",
            truncate_str(&profile.name, 23),
            profile.field_type.as_str(),
            profile.missing_percentage,
            profile.unique_count
        );
    }
    println!();

    if !diagnosis.patterns.is_empty() {
        println!("MISSING PATTERNS");
        println!("{}", "-".repeat(70));
        for pattern in &diagnosis.patterns {
            println!(
                "  {:<22} {:>6.1}%  {:<11} confidence {:.2}",
                truncate_str(&pattern.field, 22),
                pattern.missing_percentage,
                format!("{:?}", pattern.pattern).to_lowercase(),
                pattern.confidence
            );
            if !pattern.correlated_with.is_empty() {
                println!("      co-missing with: {}", pattern.correlated_with.join(", "));
            }
        }
        println!();
    }

    println!("Suggested method: {}", diagnosis.suggested_method);
    println!();
    println!("Recommendations:");
    for note in &diagnosis.recommendations {
        println!("  - {}", note);
    }
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Print a human-readable summary of the imputation.
///
/// This is the default output when neither `--json` nor `--quiet` are specified.
fn print_human_readable_summary(
    args: &Args,
    dataset: &Dataset,
    result: &ImputationResult,
    completeness: &DataCompletenessMetrics,
) {
    let stats = &result.statistics;
    let metrics = &result.quality_metrics;

    println!();
    println!("{}", "=".repeat(80));
    println!("IMPUTATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} fields)",
        args.input,
        dataset.len(),
        dataset.width()
    );
    if let Some(ref output) = args.output {
        println!("Output: {}", output);
    }
    println!("Method: {}", result.method);
    println!();

    println!("Statistics:");
    println!("  Missing cells: {}", stats.total_missing);
    println!("  Imputed cells: {}", stats.total_imputed);
    println!("  Still missing: {}", stats.remaining_missing);
    println!("  Average confidence: {:.3}", stats.average_confidence);
    println!(
        "  Low confidence (< {:.2}): {}",
        args.confidence_threshold, stats.low_confidence_count
    );
    println!();

    println!("Quality:");
    println!("  Completeness: {:.1}", metrics.completeness);
    println!("  Reliability: {:.1}", metrics.reliability);
    println!("  Consistency: {:.1}", metrics.consistency);
    println!(
        "  Data: {:.1}% -> {:.1}% complete ({}, {})",
        completeness.original_completeness,
        completeness.final_completeness,
        completeness.quality_level.as_str(),
        completeness.proceed_recommendation.as_str()
    );
    println!();

    if !result.imputed_fields.is_empty() {
        println!("Imputed Cells:");
        for record in result.imputed_fields.iter().take(10) {
            println!(
                "  - row {:>5} {:<20} = {:<16} ({:.2})",
                record.row_index,
                truncate_str(&record.field, 20),
                truncate_str(&record.imputed_value.to_string(), 16),
                record.confidence
            );
        }
        if result.imputed_fields.len() > 10 {
            println!("  ... and {} more", result.imputed_fields.len() - 10);
        }
        println!();
    }

    if !result.warnings.is_empty() {
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --report <file> to save the detailed JSON report");
    println!("{}", "=".repeat(80));
}

fn is_json_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load a dataset from a JSON array of records or a CSV file.
fn load_dataset(path: &str) -> Result<Dataset> {
    if is_json_path(path) {
        return Ok(Dataset::read_json(path)?);
    }

    let df = load_csv_with_fallbacks(path)?;
    debug!("CSV shape: {:?}", df.shape());
    Ok(Dataset::from_dataframe(&df)?)
}

/// Write the imputed dataset as JSON or CSV depending on the extension.
fn write_dataset(path: &str, data: &Dataset, original: &Dataset) -> Result<()> {
    if let Some(parent) = Path::new(path).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    if is_json_path(path) {
        std::fs::write(path, data.to_json_string()?)?;
        return Ok(());
    }

    let schema = DataProfiler::infer_schema(original);
    let mut df = data.to_dataframe(&schema)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;
    Ok(())
}

/// Load CSV with multiple fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Read every column as text
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading as text failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cursor = std::io::Cursor::new(clean_csv_content(&content));
            CsvReadOptions::default()
                .with_infer_schema_length(Some(100))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a string to `max_len` characters, adding "..." when cut.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
