//! Stage pipeline
//!
//! Orders registered stages by their declared dependencies, runs them one
//! after another against a single document, and gathers each stage's
//! diagnostics into a [`DocumentReport`].

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::CheckerConfig;
use crate::diagnostics::{Diagnostic, Severity};
use crate::error::{CheckError, CheckResult};
use crate::reader::SourceReader;
use crate::stage::{keys, PayloadValue, Stage, StageInputs};
use crate::stages::{FrontMatterStage, LineLengthStage, ParsingStage, SectionsStage, TitleStage};
use crate::tree::DocumentTree;

/// Document checking pipeline
pub struct Pipeline {
    /// Stages in registration order
    stages: Vec<Box<dyn Stage>>,
    config: CheckerConfig,
}

/// Diagnostics published by one stage
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFindings {
    pub stage: String,
    pub diagnostics: Vec<Diagnostic>,
    pub execution_time_us: u64,
}

/// Outcome of checking one document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReport {
    pub file_id: String,
    /// Findings per stage, in execution order
    pub stages: Vec<StageFindings>,
    pub total_execution_time_us: u64,
    /// Tree as parsed
    #[serde(skip)]
    pub original_document: Option<DocumentTree>,
    /// Tree after every stage has run
    #[serde(skip)]
    pub working_document: Option<DocumentTree>,
}

impl DocumentReport {
    /// All diagnostics, in stage order
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.stages.iter().flat_map(|s| s.diagnostics.iter())
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Findings of a single stage
    pub fn stage(&self, name: &str) -> Option<&StageFindings> {
        self.stages.iter().find(|s| s.stage == name)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics().filter(|d| d.severity == severity).count()
    }
}

impl Pipeline {
    /// Empty pipeline with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    pub fn with_config(config: CheckerConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Every built-in stage, reading sources through `reader`
    pub fn standard(config: CheckerConfig, reader: impl SourceReader + 'static) -> CheckResult<Self> {
        let front_matter = FrontMatterStage::new(config.product_name.clone())?;
        let sections = SectionsStage::new(
            config.required_sections.clone(),
            config.described_sections.clone(),
        );
        let line_length = LineLengthStage::new(config.max_line_length);

        let mut pipeline = Self::with_config(config);
        pipeline.add_stage(Box::new(ParsingStage::new(reader)));
        pipeline.add_stage(Box::new(front_matter));
        pipeline.add_stage(Box::new(TitleStage));
        pipeline.add_stage(Box::new(sections));
        pipeline.add_stage(Box::new(line_length));
        Ok(pipeline)
    }

    pub fn add_stage(&mut self, stage: Box<dyn Stage>) {
        self.stages.push(stage);
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Stage names in the order they will run
    pub fn execution_order(&self) -> CheckResult<Vec<&'static str>> {
        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name()) {
                return Err(CheckError::DuplicateStage(stage.name().to_string()));
            }
        }

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();
        for stage in &self.stages {
            if !visited.contains(stage.name()) {
                self.topological_sort(stage.as_ref(), &mut order, &mut visited, &mut visiting)?;
            }
        }
        Ok(order)
    }

    fn topological_sort(
        &self,
        stage: &dyn Stage,
        order: &mut Vec<&'static str>,
        visited: &mut HashSet<&'static str>,
        visiting: &mut HashSet<&'static str>,
    ) -> CheckResult<()> {
        let name = stage.name();
        if visiting.contains(name) {
            return Err(CheckError::CircularDependency {
                stage: name.to_string(),
            });
        }
        if visited.contains(name) {
            return Ok(());
        }

        visiting.insert(name);
        for dependency in stage.dependencies() {
            let next = self.find(dependency).ok_or_else(|| CheckError::UnknownDependency {
                stage: name.to_string(),
                dependency: dependency.to_string(),
            })?;
            self.topological_sort(next, order, visited, visiting)?;
        }
        visiting.remove(name);
        visited.insert(name);
        order.push(name);

        Ok(())
    }

    fn find(&self, name: &str) -> Option<&dyn Stage> {
        self.stages
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Check one document, read from the path it is named by
    pub fn run(&self, file_id: &str) -> CheckResult<DocumentReport> {
        self.run_path(file_id, Path::new(file_id))
    }

    /// Check one document reported as `file_id` and read from `path`
    pub fn run_path(&self, file_id: &str, path: &Path) -> CheckResult<DocumentReport> {
        let start_time = Instant::now();
        let execution_order = self.execution_order()?;
        let mut inputs = StageInputs::for_path(file_id, path);
        let mut findings = Vec::with_capacity(execution_order.len());

        for name in execution_order {
            let Some(stage) = self.find(name) else {
                continue;
            };
            inputs.begin_stage(name);

            let stage_start = Instant::now();
            let payloads = stage.run(&mut inputs)?;
            let elapsed = stage_start.elapsed().as_micros() as u64;

            let diagnostics = payloads
                .iter()
                .find(|p| p.name == stage.diagnostics_key())
                .and_then(|p| match &p.value {
                    PayloadValue::Diagnostics(list) => Some(list.clone()),
                    _ => None,
                })
                .unwrap_or_default();
            let diagnostics = self.config.apply(diagnostics);

            debug!(
                file = %file_id,
                stage = name,
                findings = diagnostics.len(),
                elapsed_us = elapsed,
                "stage complete"
            );

            inputs.extend(payloads);
            findings.push(StageFindings {
                stage: name.to_string(),
                diagnostics,
                execution_time_us: elapsed,
            });
        }

        let mut payloads = inputs.into_payloads();
        let mut take_tree = |key: &str| match payloads.remove(key).map(|p| p.value) {
            Some(PayloadValue::Tree(tree)) => Some(tree),
            _ => None,
        };
        let original_document = take_tree(keys::ORIGINAL_DOCUMENT);
        let working_document = take_tree(keys::WORKING_DOCUMENT);

        let report = DocumentReport {
            file_id: file_id.to_string(),
            stages: findings,
            total_execution_time_us: start_time.elapsed().as_micros() as u64,
            original_document,
            working_document,
        };
        info!(
            file = %file_id,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "checked document"
        );
        Ok(report)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
