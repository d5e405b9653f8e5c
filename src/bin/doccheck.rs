//! doccheck command line interface
//!
//! Checks markdown resource documentation for front-matter, title, section
//! layout and whitespace problems.
//!
//! # Usage
//!
//! ```bash
//! # Check a single file
//! doccheck docs/resources/vpc.md
//!
//! # Check every markdown file under a directory, JSON output
//! doccheck --format json docs/
//!
//! # Use an explicit configuration file
//! doccheck --config doccheck.yaml docs/
//!
//! # Also require the resource page sections and 120-character lines
//! doccheck --resource-layout docs/resources/
//! ```
//!
//! Exits with status 1 when any ERROR diagnostic is reported or any file
//! cannot be checked.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doccheck::{
    check_files, collect_markdown_files, filesystem_pipeline, ConfigLoader, Diagnostic,
    FileOutcome, RunSummary, Severity,
};

#[derive(Parser)]
#[command(name = "doccheck")]
#[command(version)]
#[command(about = "Check markdown resource documentation for structural problems")]
#[command(long_about = None)]
struct Cli {
    /// Files or directories to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to DOCCHECK_CONFIG, then ./doccheck.yaml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "text", value_enum)]
    format: OutputFormat,

    /// Only print findings and fatal errors
    #[arg(long, short)]
    quiet: bool,

    /// Require the resource page sections and line length limit
    #[arg(long)]
    resource_layout: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::new(path),
        None => ConfigLoader::from_env(),
    };
    let mut config = loader.load()?;
    if cli.resource_layout {
        config = config.with_resource_layout();
    }
    let pipeline = filesystem_pipeline(config).context("Failed to assemble pipeline")?;

    let files = collect_markdown_files(&cli.paths)?;
    let outcomes = check_files(&pipeline, &files);
    let summary = RunSummary::from_outcomes(&outcomes);

    match cli.format {
        OutputFormat::Json => print_json(&outcomes, &summary)?,
        OutputFormat::Text => print_text(&outcomes, &summary, cli.quiet),
    }

    Ok(summary.is_success())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json(outcomes: &[FileOutcome], summary: &RunSummary) -> Result<()> {
    let files: Vec<_> = outcomes
        .iter()
        .map(|outcome| match &outcome.result {
            Ok(report) => serde_json::json!({
                "path": outcome.path.display().to_string(),
                "report": report,
            }),
            Err(e) => serde_json::json!({
                "path": outcome.path.display().to_string(),
                "error": e.to_string(),
            }),
        })
        .collect();

    let output = serde_json::json!({
        "files": files,
        "summary": summary,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("JSON serialization failed")?
    );
    Ok(())
}

fn print_text(outcomes: &[FileOutcome], summary: &RunSummary, quiet: bool) {
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                let mut clean = true;
                for diagnostic in report.diagnostics() {
                    clean = false;
                    println!("{}", format_diagnostic(diagnostic));
                }
                if clean && !quiet {
                    println!("{} {}", "OK".green(), outcome.path.display());
                }
            }
            Err(e) => {
                eprintln!(
                    "{}: {}: {}",
                    "error".red().bold(),
                    outcome.path.display(),
                    e
                );
            }
        }
    }

    if quiet {
        return;
    }

    let line = format!(
        "{} file(s) checked, {} error(s), {} warning(s), {} could not be checked",
        summary.files, summary.errors, summary.warnings, summary.fatal
    );
    if summary.is_success() {
        println!("{} {}", "OK".green().bold(), line);
    } else {
        println!("{} {}", "FAILED".red().bold(), line);
    }
}

fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let mut location = diagnostic.file_id.clone();
    if let Some(range) = &diagnostic.range {
        location.push_str(&format!(":{}:{}", range.start.line, range.start.column));
    }
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    format!(
        "{}: {} [{}] {}",
        location.bold(),
        severity,
        diagnostic.rule_id.as_str().cyan(),
        diagnostic.message
    )
}
