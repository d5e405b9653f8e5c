//! Stage data contract
//!
//! Stages exchange named, typed, timestamped [`StagePayload`]s. A stage reads
//! what earlier stages published from [`StageInputs`] by name and expected
//! type, and returns its own payloads for later stages.
//!
//! Trees move between stages by value: a stage that needs to mutate the
//! working document calls [`StageInputs::take_tree`], owns it exclusively
//! while it runs, and publishes the updated tree under the same name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::diagnostics::Diagnostic;
use crate::error::{CheckError, CheckResult};
use crate::tree::DocumentTree;

/// Well-known payload names
pub mod keys {
    /// File identifier reported in diagnostics
    pub const FILE_ID: &str = "file_id";
    /// Path handed to the source reader
    pub const SOURCE_PATH: &str = "source_path";
    /// Raw markdown source
    pub const RAW_TEXT: &str = "raw_text";
    /// Read-only tree as parsed
    pub const ORIGINAL_DOCUMENT: &str = "original_document";
    /// Tree that stages consume structure from
    pub const WORKING_DOCUMENT: &str = "working_document";
    pub const WHITESPACE_DIAGNOSTICS: &str = "whitespace_diagnostics";
    pub const FRONT_MATTER_DIAGNOSTICS: &str = "front_matter_diagnostics";
    pub const TITLE_DIAGNOSTICS: &str = "title_diagnostics";
    pub const SECTIONS_DIAGNOSTICS: &str = "sections_diagnostics";
    pub const LINE_LENGTH_DIAGNOSTICS: &str = "line_length_diagnostics";
}

/// Value carried by a payload
#[derive(Debug)]
pub enum PayloadValue {
    Text(String),
    Path(PathBuf),
    Tree(DocumentTree),
    Diagnostics(Vec<Diagnostic>),
}

impl PayloadValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PayloadValue::Text(_) => "text",
            PayloadValue::Path(_) => "path",
            PayloadValue::Tree(_) => "tree",
            PayloadValue::Diagnostics(_) => "diagnostics",
        }
    }
}

/// One published stage output
#[derive(Debug)]
pub struct StagePayload {
    pub name: String,
    /// Name of the stage that published it; `input` for seeded values
    pub source: String,
    pub produced_at: DateTime<Utc>,
    pub value: PayloadValue,
}

impl StagePayload {
    pub fn new(source: impl Into<String>, name: impl Into<String>, value: PayloadValue) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            produced_at: Utc::now(),
            value,
        }
    }

    pub fn text(source: &str, name: &str, text: impl Into<String>) -> Self {
        Self::new(source, name, PayloadValue::Text(text.into()))
    }

    pub fn path(source: &str, name: &str, path: impl Into<PathBuf>) -> Self {
        Self::new(source, name, PayloadValue::Path(path.into()))
    }

    pub fn tree(source: &str, name: &str, tree: DocumentTree) -> Self {
        Self::new(source, name, PayloadValue::Tree(tree))
    }

    pub fn diagnostics(source: &str, name: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(source, name, PayloadValue::Diagnostics(diagnostics))
    }
}

/// Payloads visible to the running stage, looked up by name
#[derive(Debug, Default)]
pub struct StageInputs {
    payloads: HashMap<String, StagePayload>,
    current_stage: String,
}

impl StageInputs {
    pub fn new() -> Self {
        Self {
            payloads: HashMap::new(),
            current_stage: "input".to_string(),
        }
    }

    /// Seed the inputs for checking one file, read from the path it is named by
    pub fn for_file(file_id: &str) -> Self {
        Self::for_path(file_id, file_id)
    }

    /// Seed the inputs for a file reported as `file_id` and read from `path`
    pub fn for_path(file_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let mut inputs = Self::new();
        inputs.insert(StagePayload::text("input", keys::FILE_ID, file_id));
        inputs.insert(StagePayload::path("input", keys::SOURCE_PATH, path));
        inputs
    }

    /// Name the stage about to read, for error reporting
    pub fn begin_stage(&mut self, stage: &str) {
        self.current_stage = stage.to_string();
    }

    /// Publish a payload, replacing any earlier payload of the same name
    pub fn insert(&mut self, payload: StagePayload) {
        self.payloads.insert(payload.name.clone(), payload);
    }

    pub fn extend(&mut self, payloads: impl IntoIterator<Item = StagePayload>) {
        for payload in payloads {
            self.insert(payload);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.payloads.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&StagePayload> {
        self.payloads.get(key)
    }

    fn require(&self, key: &str) -> CheckResult<&StagePayload> {
        self.payloads.get(key).ok_or_else(|| CheckError::MissingInput {
            stage: self.current_stage.clone(),
            key: key.to_string(),
        })
    }

    fn mismatch(key: &str, expected: &'static str, value: &PayloadValue) -> CheckError {
        CheckError::PayloadType {
            key: key.to_string(),
            expected,
            actual: value.type_name(),
        }
    }

    pub fn text(&self, key: &str) -> CheckResult<&str> {
        match &self.require(key)?.value {
            PayloadValue::Text(text) => Ok(text),
            other => Err(Self::mismatch(key, "text", other)),
        }
    }

    pub fn path(&self, key: &str) -> CheckResult<&Path> {
        match &self.require(key)?.value {
            PayloadValue::Path(path) => Ok(path),
            other => Err(Self::mismatch(key, "path", other)),
        }
    }

    pub fn tree(&self, key: &str) -> CheckResult<&DocumentTree> {
        match &self.require(key)?.value {
            PayloadValue::Tree(tree) => Ok(tree),
            other => Err(Self::mismatch(key, "tree", other)),
        }
    }

    pub fn diagnostics(&self, key: &str) -> CheckResult<&[Diagnostic]> {
        match &self.require(key)?.value {
            PayloadValue::Diagnostics(list) => Ok(list),
            other => Err(Self::mismatch(key, "diagnostics", other)),
        }
    }

    /// Remove a tree payload and hand ownership to the caller. On a type
    /// mismatch the payload stays in place.
    pub fn take_tree(&mut self, key: &str) -> CheckResult<DocumentTree> {
        self.tree(key)?;
        match self.payloads.remove(key).map(|p| p.value) {
            Some(PayloadValue::Tree(tree)) => Ok(tree),
            _ => Err(CheckError::MissingInput {
                stage: self.current_stage.clone(),
                key: key.to_string(),
            }),
        }
    }

    /// Remove and return every payload
    pub fn into_payloads(self) -> HashMap<String, StagePayload> {
        self.payloads
    }
}

/// A single checking stage
///
/// Stages run synchronously and to completion. They report content problems
/// as diagnostics in their outputs and return `Err` only for fatal problems
/// such as a missing input or an unreadable file.
pub trait Stage: Send + Sync {
    /// Unique stage name
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Stages that must run before this one
    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }

    /// Payload name under which this stage publishes its diagnostics
    fn diagnostics_key(&self) -> &'static str;

    fn run(&self, inputs: &mut StageInputs) -> CheckResult<Vec<StagePayload>>;
}
