//! Diagnostics
//!
//! One [`Diagnostic`] per finding. Stages build them once and never touch them
//! again; configuration that rewrites severity produces a new value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::source::SourceRange;
use crate::tree::NodeId;

/// Diagnostic severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Stylistic or semantic issue, does not fail a check run
    #[serde(alias = "warning", alias = "warn")]
    Warning,
    /// Missing structural element, fails a check run
    #[serde(alias = "error")]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Stable rule identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rule {
    // =========================================================================
    // Front matter
    // =========================================================================
    #[serde(rename = "FrontMatter.MissingDescription")]
    FrontMatterMissingDescription,
    #[serde(rename = "FrontMatter.DescriptionFormat")]
    FrontMatterDescriptionFormat,
    #[serde(rename = "FrontMatter.EmptyDescription")]
    FrontMatterEmptyDescription,
    #[serde(rename = "FrontMatter.DescriptionSemantic")]
    FrontMatterDescriptionSemantic,

    // =========================================================================
    // Title section
    // =========================================================================
    #[serde(rename = "Title.MissingH1")]
    TitleMissingH1,
    #[serde(rename = "Title.MissingDescription")]
    TitleMissingDescription,

    // =========================================================================
    // Document structure
    // =========================================================================
    #[serde(rename = "Structure.MissingSection")]
    StructureMissingSection,
    #[serde(rename = "Structure.SectionOrder")]
    StructureSectionOrder,
    #[serde(rename = "Structure.MissingSectionDescription")]
    StructureMissingSectionDescription,

    // =========================================================================
    // Whitespace hygiene
    // =========================================================================
    #[serde(rename = "Whitespace.EmptyLineGroup")]
    WhitespaceEmptyLineGroup,
    #[serde(rename = "Whitespace.TrailingSpaces")]
    WhitespaceTrailingSpaces,

    // =========================================================================
    // Line formatting
    // =========================================================================
    #[serde(rename = "LineFormatting.LineTooLong")]
    LineFormattingLineTooLong,
}

impl Rule {
    pub const ALL: [Rule; 12] = [
        Rule::FrontMatterMissingDescription,
        Rule::FrontMatterDescriptionFormat,
        Rule::FrontMatterEmptyDescription,
        Rule::FrontMatterDescriptionSemantic,
        Rule::TitleMissingH1,
        Rule::TitleMissingDescription,
        Rule::StructureMissingSection,
        Rule::StructureSectionOrder,
        Rule::StructureMissingSectionDescription,
        Rule::WhitespaceEmptyLineGroup,
        Rule::WhitespaceTrailingSpaces,
        Rule::LineFormattingLineTooLong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::FrontMatterMissingDescription => "FrontMatter.MissingDescription",
            Rule::FrontMatterDescriptionFormat => "FrontMatter.DescriptionFormat",
            Rule::FrontMatterEmptyDescription => "FrontMatter.EmptyDescription",
            Rule::FrontMatterDescriptionSemantic => "FrontMatter.DescriptionSemantic",
            Rule::TitleMissingH1 => "Title.MissingH1",
            Rule::TitleMissingDescription => "Title.MissingDescription",
            Rule::StructureMissingSection => "Structure.MissingSection",
            Rule::StructureSectionOrder => "Structure.SectionOrder",
            Rule::StructureMissingSectionDescription => "Structure.MissingSectionDescription",
            Rule::WhitespaceEmptyLineGroup => "Whitespace.EmptyLineGroup",
            Rule::WhitespaceTrailingSpaces => "Whitespace.TrailingSpaces",
            Rule::LineFormattingLineTooLong => "LineFormatting.LineTooLong",
        }
    }

    /// Severity a stage reports this rule with
    pub fn default_severity(&self) -> Severity {
        match self {
            Rule::FrontMatterDescriptionSemantic
            | Rule::WhitespaceEmptyLineGroup
            | Rule::WhitespaceTrailingSpaces
            | Rule::LineFormattingLineTooLong => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::ALL
            .iter()
            .find(|rule| rule.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown rule '{}'", s))
    }
}

/// A single finding
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub rule_id: Rule,
    pub message: String,
    pub severity: Severity,
    pub file_id: String,
    pub range: Option<SourceRange>,
    pub node_id: Option<String>,
    pub node_type: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the rule's default severity
    pub fn new(rule: Rule, file_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule,
            message: message.into(),
            severity: rule.default_severity(),
            file_id: file_id.into(),
            range: None,
            node_id: None,
            node_type: None,
        }
    }

    /// Add source range
    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Reference a tree node
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node_id = Some(node.to_string());
        self
    }

    /// Tag the kind of structure the finding is about
    pub fn with_node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Same finding under another severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_id)?;
        if let Some(range) = &self.range {
            write!(f, ":{}:{}", range.start.line, range.start.column)?;
        }
        write!(f, ": {} [{}] {}", self.severity, self.rule_id, self.message)
    }
}
