//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Rule, Severity};

/// Product name the description sentence must end with by default
pub const DEFAULT_PRODUCT_NAME: &str = "HuaweiCloud";

/// Level-2 sections of a resource page, in page order
pub const RESOURCE_SECTIONS: [&str; 3] = [
    "Example Usage",
    "Argument Reference",
    "Attribute Reference",
];

/// Resource page sections that open with a description paragraph
pub const DESCRIBED_SECTIONS: [&str; 2] = ["Argument Reference", "Attribute Reference"];

/// Line length limit used by [`CheckerConfig::resource_docs`]
pub const RESOURCE_MAX_LINE_LENGTH: usize = 120;

/// Top-level checker configuration
///
/// ```yaml
/// product_name: HuaweiCloud
/// disabled_rules:
///   - Whitespace.EmptyLineGroup
/// severity_overrides:
///   FrontMatter.DescriptionSemantic: ERROR
/// required_sections: [Example Usage, Argument Reference, Attribute Reference]
/// described_sections: [Argument Reference, Attribute Reference]
/// max_line_length: 120
/// ```
///
/// Section and line length checks stay silent until configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Product named at the end of the description sentence
    pub product_name: String,
    /// Rules whose findings are dropped from reports
    pub disabled_rules: Vec<Rule>,
    /// Severity to report a rule with instead of its default
    pub severity_overrides: BTreeMap<Rule, Severity>,
    /// Level-2 sections every document needs, in the order they must appear
    pub required_sections: Vec<String>,
    /// Sections whose first block must be a non-empty paragraph
    pub described_sections: Vec<String>,
    /// Longest allowed line, in characters
    pub max_line_length: Option<usize>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            disabled_rules: Vec::new(),
            severity_overrides: BTreeMap::new(),
            required_sections: Vec::new(),
            described_sections: Vec::new(),
            max_line_length: None,
        }
    }
}

impl CheckerConfig {
    /// Defaults plus the section layout and line limit of resource pages
    pub fn resource_docs() -> Self {
        Self::default().with_resource_layout()
    }

    /// Replace the section and line length settings with those of resource pages
    pub fn with_resource_layout(mut self) -> Self {
        self.required_sections = RESOURCE_SECTIONS.iter().map(|s| s.to_string()).collect();
        self.described_sections = DESCRIBED_SECTIONS.iter().map(|s| s.to_string()).collect();
        self.max_line_length = Some(RESOURCE_MAX_LINE_LENGTH);
        self
    }

    pub fn is_enabled(&self, rule: Rule) -> bool {
        !self.disabled_rules.contains(&rule)
    }

    /// Drop suppressed findings and apply severity overrides
    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| self.is_enabled(d.rule_id))
            .map(|d| match self.severity_overrides.get(&d.rule_id) {
                Some(severity) => d.with_severity(*severity),
                None => d,
            })
            .collect()
    }
}
