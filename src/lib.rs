//! doccheck: structural checks for markdown resource documentation
//!
//! File-level runner on top of [`doccheck_core`]: expands input paths into
//! markdown files, runs the pipeline over each one, and summarises the
//! outcome. One file failing fatally never stops the others.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

pub use doccheck_core::{
    CheckError, CheckResult, CheckerConfig, ConfigLoader, Diagnostic, DocumentReport, FsReader,
    Pipeline, Rule, Severity,
};

/// Result of checking one file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: CheckResult<DocumentReport>,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        match &self.result {
            Ok(report) => report.has_errors(),
            Err(_) => true,
        }
    }
}

/// Totals across a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    /// Files that could not be checked at all
    pub fatal: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut summary, outcome| {
                summary.files += 1;
                match &outcome.result {
                    Ok(report) => {
                        summary.errors += report.error_count();
                        summary.warnings += report.warning_count();
                    }
                    Err(_) => summary.fatal += 1,
                }
                summary
            })
    }

    pub fn is_success(&self) -> bool {
        self.errors == 0 && self.fatal == 0
    }
}

/// Pipeline reading from the filesystem
pub fn filesystem_pipeline(config: CheckerConfig) -> CheckResult<Pipeline> {
    Pipeline::standard(config, FsReader)
}

/// Check one file. Diagnostics name it by its lossy display form; the file
/// itself is read from `path` unchanged.
pub fn check_file(pipeline: &Pipeline, path: &Path) -> CheckResult<DocumentReport> {
    pipeline.run_path(&path.to_string_lossy(), path)
}

/// Check each file independently, in the given order
pub fn check_files(pipeline: &Pipeline, paths: &[PathBuf]) -> Vec<FileOutcome> {
    paths
        .iter()
        .map(|path| {
            let result = check_file(pipeline, path);
            if let Err(e) = &result {
                warn!(file = %path.display(), error = %e, "document check failed");
            }
            FileOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// Expand inputs into the files to check. Files are taken as given;
/// directories contribute every `*.md` file beneath them, sorted.
pub fn collect_markdown_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(find_markdown_files(input)?);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn find_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            files.extend(find_markdown_files(&path)?);
        } else if path.extension().is_some_and(|e| e == "md") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
