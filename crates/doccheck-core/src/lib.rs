//! doccheck-core: document model and structural checks for resource docs
//!
//! This crate holds everything needed to check a markdown document, with NO
//! CLI dependencies:
//! - Source positions and ranges
//! - Element payloads and the arena document tree with typed queries
//! - pulldown-cmark based tree builder
//! - Diagnostic and rule types
//! - Stage data contract and the dependency-ordered pipeline
//! - Parsing, front-matter, title, section layout and line length stages
//! - YAML configuration types and loader

pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod pipeline;
pub mod reader;
pub mod source;
pub mod stage;
pub mod stages;
pub mod tree;

// Re-export commonly used types
pub use builder::build_document;
pub use config::{CheckerConfig, ConfigLoader};
pub use diagnostics::{Diagnostic, Rule, Severity};
pub use element::{Element, ElementVariant};
pub use error::{CheckError, CheckResult};
pub use pipeline::{DocumentReport, Pipeline, StageFindings};
pub use reader::{FsReader, MemoryReader, SourceReader};
pub use source::{LineIndex, SourcePosition, SourceRange};
pub use stage::{PayloadValue, Stage, StageInputs, StagePayload};
pub use tree::{DocumentTree, NodeId};
