//! Front-matter stage
//!
//! Validates the `description` field of the `---` delimited header against the
//! resource documentation template, then strips everything ahead of the first
//! level-1 heading from the working tree so later stages see the body only.

use std::ops::Range;
use std::sync::LazyLock;
use std::time::Instant;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::diagnostics::{Diagnostic, Rule};
use crate::element::Heading;
use crate::error::{CheckError, CheckResult};
use crate::source::{LineIndex, SourceRange};
use crate::stage::{keys, Stage, StageInputs, StagePayload};
use crate::tree::DocumentTree;

use super::names;

const DELIMITER: &str = "---";
const DESCRIPTION_KEY: &str = "description:";
const NODE_TYPE: &str = "FrontMatter";

/// `description: |-` with nothing else on the line
static DESCRIPTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^description:\s*\|-\s*$").unwrap());

/// Case-insensitive template for the description body
pub fn description_template(product_name: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(
        r"^Use this\s+(data source|resource)\s+to\s+.+\s+within\s+{}\.\s*$",
        regex::escape(product_name)
    ))
    .case_insensitive(true)
    .build()
}

pub struct FrontMatterStage {
    product_name: String,
    template: Regex,
}

impl FrontMatterStage {
    pub fn new(product_name: impl Into<String>) -> CheckResult<Self> {
        let product_name = product_name.into();
        let template = description_template(&product_name).map_err(|e| {
            CheckError::Config(format!(
                "invalid description template for '{}': {}",
                product_name, e
            ))
        })?;
        Ok(Self {
            product_name,
            template,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Validate the front-matter block of `source`
    pub fn check(&self, file_id: &str, source: &str) -> Vec<Diagnostic> {
        let lines: Vec<&str> = source.split('\n').collect();
        let index = LineIndex::new(source);

        let Some(block) = front_matter_block(&lines) else {
            return Vec::new();
        };

        let finding = |rule: Rule, message: String, range: SourceRange| {
            vec![Diagnostic::new(rule, file_id, message)
                .with_range(range)
                .with_node_type(NODE_TYPE)]
        };

        let Some(desc) = block
            .clone()
            .find(|&i| lines[i].trim().starts_with(DESCRIPTION_KEY))
        else {
            let range = lines_range(&index, block.start - 1, block.end);
            return finding(
                Rule::FrontMatterMissingDescription,
                "Front matter has no 'description' field".to_string(),
                range,
            );
        };

        if !DESCRIPTION_HEADER.is_match(lines[desc].trim()) {
            return finding(
                Rule::FrontMatterDescriptionFormat,
                format!(
                    "Description must use the block scalar form 'description: |-', found '{}'",
                    lines[desc].trim()
                ),
                lines_range(&index, desc, desc),
            );
        }

        let Some(body) = (desc + 1..block.end).find(|&i| !lines[i].trim().is_empty()) else {
            return finding(
                Rule::FrontMatterEmptyDescription,
                "Description is empty".to_string(),
                lines_range(&index, desc, desc),
            );
        };

        let text = lines[body].trim();
        if !self.template.is_match(text) {
            return finding(
                Rule::FrontMatterDescriptionSemantic,
                format!(
                    "Description should read 'Use this resource|data source to ... within {}.', found '{}'",
                    self.product_name, text
                ),
                lines_range(&index, body, body),
            );
        }

        Vec::new()
    }
}

impl Stage for FrontMatterStage {
    fn name(&self) -> &'static str {
        names::FRONT_MATTER
    }

    fn description(&self) -> &'static str {
        "Validate the front-matter description and strip the header from the working tree"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![names::PARSING]
    }

    fn diagnostics_key(&self) -> &'static str {
        keys::FRONT_MATTER_DIAGNOSTICS
    }

    fn run(&self, inputs: &mut StageInputs) -> CheckResult<Vec<StagePayload>> {
        let file_id = inputs.text(keys::FILE_ID)?.to_string();
        let diagnostics = self.check(&file_id, inputs.text(keys::RAW_TEXT)?);

        let start = Instant::now();
        let mut working = inputs.take_tree(keys::WORKING_DOCUMENT)?;
        let removed = consume_front_matter(&mut working);
        debug!(
            file = %file_id,
            removed,
            elapsed_us = start.elapsed().as_micros() as u64,
            "consumed front matter"
        );

        let stage = self.name();
        Ok(vec![
            StagePayload::tree(stage, keys::WORKING_DOCUMENT, working),
            StagePayload::diagnostics(stage, keys::FRONT_MATTER_DIAGNOSTICS, diagnostics),
        ])
    }
}

/// Line indices strictly between the opening and closing delimiters
fn front_matter_block(lines: &[&str]) -> Option<Range<usize>> {
    if !lines.first()?.trim().starts_with(DELIMITER) {
        return None;
    }
    let close = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim().starts_with(DELIMITER))
        .map(|(i, _)| i)?;
    Some(1..close)
}

/// Range from the start of line `first` to the end of line `last` (0-based)
fn lines_range(index: &LineIndex<'_>, first: usize, last: usize) -> SourceRange {
    match (index.line_range(first + 1), index.line_range(last + 1)) {
        (Some(start), Some(end)) => SourceRange::new(start.start, end.end),
        _ => index.full_range(),
    }
}

/// Remove every root child ahead of the first level-1 heading. Returns the
/// number of nodes removed; zero when there is no such heading or it already
/// comes first.
pub fn consume_front_matter(tree: &mut DocumentTree) -> usize {
    let root = tree.root();
    let Some(position) = tree
        .children(root)
        .iter()
        .position(|id| tree.get::<Heading>(*id).is_some_and(|h| h.level == 1))
    else {
        return 0;
    };

    let leading: Vec<_> = tree.children(root)[..position].to_vec();
    for child in &leading {
        tree.remove_child(root, *child);
    }
    leading.len()
}
