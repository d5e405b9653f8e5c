//! Fatal errors
//!
//! Content problems are never errors here; they are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic) values. A `CheckError`
//! aborts the current document.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("input '{key}' is missing for stage '{stage}'")]
    MissingInput { stage: String, key: String },

    #[error("input '{key}' type mismatch, expected {expected}, actual {actual}")]
    PayloadType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("failed to read markdown file: {}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage '{stage}' depends on unknown stage '{dependency}'")]
    UnknownDependency { stage: String, dependency: String },

    #[error("circular dependency detected at stage '{stage}'")]
    CircularDependency { stage: String },

    #[error("duplicate stage name '{0}'")]
    DuplicateStage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for pipeline operations
pub type CheckResult<T> = Result<T, CheckError>;
