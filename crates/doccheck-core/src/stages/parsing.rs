//! Parsing stage
//!
//! Reads the raw markdown, builds the original and working trees, and runs the
//! whitespace hygiene scan over the raw text.

use std::time::Instant;

use tracing::debug;

use crate::builder::build_document;
use crate::diagnostics::{Diagnostic, Rule};
use crate::error::{CheckError, CheckResult};
use crate::reader::SourceReader;
use crate::source::LineIndex;
use crate::stage::{keys, Stage, StageInputs, StagePayload};

use super::names;

/// Trailing whitespace of exactly this length is a markdown hard line break
const HARD_BREAK_WIDTH: usize = 2;

pub struct ParsingStage {
    reader: Box<dyn SourceReader>,
}

impl ParsingStage {
    pub fn new(reader: impl SourceReader + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }
}

impl Stage for ParsingStage {
    fn name(&self) -> &'static str {
        names::PARSING
    }

    fn description(&self) -> &'static str {
        "Parse markdown into document trees and check whitespace"
    }

    fn diagnostics_key(&self) -> &'static str {
        keys::WHITESPACE_DIAGNOSTICS
    }

    fn run(&self, inputs: &mut StageInputs) -> CheckResult<Vec<StagePayload>> {
        let file_id = inputs.text(keys::FILE_ID)?.to_string();
        let path = inputs.path(keys::SOURCE_PATH)?;

        let raw = self
            .reader
            .read(path)
            .map_err(|source| CheckError::ReadSource {
                path: path.to_path_buf(),
                source,
            })?;

        let start = Instant::now();
        let original = build_document(&raw);
        let working = original.deep_copy();
        debug!(
            file = %file_id,
            nodes = original.node_count(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "built document tree"
        );

        let diagnostics = check_whitespace(&file_id, &raw);

        let stage = self.name();
        Ok(vec![
            StagePayload::text(stage, keys::RAW_TEXT, raw),
            StagePayload::tree(stage, keys::ORIGINAL_DOCUMENT, original),
            StagePayload::tree(stage, keys::WORKING_DOCUMENT, working),
            StagePayload::diagnostics(stage, keys::WHITESPACE_DIAGNOSTICS, diagnostics),
        ])
    }
}

/// Report runs of blank lines and trailing whitespace
///
/// Lines are split on `\n` only, so a `\r` left by CRLF endings counts as
/// trailing whitespace.
pub fn check_whitespace(file_id: &str, source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if source.is_empty() {
        return diagnostics;
    }

    let index = LineIndex::new(source);
    let mut offset = 0;
    let mut blank_run = 0usize;

    for (i, line) in source.split('\n').enumerate() {
        let line_number = i + 1;
        let line_end = offset + line.len();

        if line.chars().all(char::is_whitespace) {
            blank_run += 1;
            if blank_run > 1 {
                diagnostics.push(
                    Diagnostic::new(
                        Rule::WhitespaceEmptyLineGroup,
                        file_id,
                        format!(
                            "Line {} continues a group of {} blank lines; use a single blank line",
                            line_number, blank_run
                        ),
                    )
                    .with_range(index.range(offset, line_end)),
                );
            }
        } else {
            blank_run = 0;
            if let Some(trailing_start) = trailing_whitespace_start(line) {
                let width = line[trailing_start..].chars().count();
                if width != HARD_BREAK_WIDTH {
                    diagnostics.push(
                        Diagnostic::new(
                            Rule::WhitespaceTrailingSpaces,
                            file_id,
                            format!(
                                "Line {} ends with {} trailing whitespace character(s); remove them or use exactly {} for a line break",
                                line_number, width, HARD_BREAK_WIDTH
                            ),
                        )
                        .with_range(index.range(offset + trailing_start, line_end)),
                    );
                }
            }
        }

        offset = line_end + 1;
    }

    diagnostics
}

/// Byte offset where trailing whitespace begins, if the line has any
fn trailing_whitespace_start(line: &str) -> Option<usize> {
    let trimmed = line.trim_end();
    (trimmed.len() < line.len()).then_some(trimmed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::MemoryReader;
    use std::path::PathBuf;
    use crate::stage::PayloadValue;
    use proptest::prelude::*;

    fn rules(diagnostics: &[Diagnostic]) -> Vec<Rule> {
        diagnostics.iter().map(|d| d.rule_id).collect()
    }

    #[test]
    fn test_clean_document() {
        let diagnostics = check_whitespace("a.md", "# Title\n\nBody.\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_source() {
        assert!(check_whitespace("a.md", "").is_empty());
    }

    #[test]
    fn test_three_blank_lines_warn_twice() {
        let source = "# Title\n\n\n\nBody.\n";
        let diagnostics = check_whitespace("a.md", source);
        assert_eq!(
            rules(&diagnostics),
            vec![Rule::WhitespaceEmptyLineGroup, Rule::WhitespaceEmptyLineGroup]
        );
        assert_eq!(diagnostics[0].range.unwrap().start.line, 3);
        assert_eq!(diagnostics[1].range.unwrap().start.line, 4);
        assert!(diagnostics.iter().all(Diagnostic::is_warning));
    }

    #[test]
    fn test_whitespace_only_lines_are_blank() {
        let diagnostics = check_whitespace("a.md", "a\n\n   \n\t\nb");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.rule_id == Rule::WhitespaceEmptyLineGroup));
    }

    #[test]
    fn test_trailing_spaces_range() {
        let source = "# Title\nBody.   \n";
        let diagnostics = check_whitespace("a.md", source);
        assert_eq!(rules(&diagnostics), vec![Rule::WhitespaceTrailingSpaces]);

        let range = diagnostics[0].range.unwrap();
        assert_eq!(range.text(source), Some("   "));
        assert_eq!(range.start.line, 2);
        assert_eq!(range.start.column, 6);
    }

    #[test]
    fn test_two_trailing_spaces_are_a_hard_break() {
        assert!(check_whitespace("a.md", "line one  \nline two\n").is_empty());
    }

    #[test]
    fn test_single_and_tab_trailing_whitespace() {
        let diagnostics = check_whitespace("a.md", "one \ntwo\t\t\t\n");
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_crlf_counts_as_trailing_whitespace() {
        let diagnostics = check_whitespace("a.md", "one\r\ntwo\r\n");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics
            .iter()
            .all(|d| d.rule_id == Rule::WhitespaceTrailingSpaces));
    }

    #[test]
    fn test_stage_publishes_trees_and_diagnostics() {
        let stage = ParsingStage::new(MemoryReader::new().with("a.md", "# T\n\nText \n"));
        let mut inputs = StageInputs::for_file("a.md");
        inputs.begin_stage(stage.name());
        let payloads = stage.run(&mut inputs).unwrap();

        let names: Vec<_> = payloads.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                keys::RAW_TEXT,
                keys::ORIGINAL_DOCUMENT,
                keys::WORKING_DOCUMENT,
                keys::WHITESPACE_DIAGNOSTICS
            ]
        );
        assert!(payloads.iter().all(|p| p.source == "parsing"));

        match (&payloads[1].value, &payloads[2].value) {
            (PayloadValue::Tree(original), PayloadValue::Tree(working)) => {
                assert!(original.structurally_eq(working));
            }
            other => panic!("expected two trees, got {:?}", other),
        }
        match &payloads[3].value {
            PayloadValue::Diagnostics(list) => assert_eq!(list.len(), 1),
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_from_source_path_not_file_id() {
        let stage = ParsingStage::new(MemoryReader::new().with("/checkout/docs/a.md", "# T\n"));
        let mut inputs = StageInputs::for_path("docs/a.md", "/checkout/docs/a.md");
        let payloads = stage.run(&mut inputs).unwrap();
        match &payloads[0].value {
            PayloadValue::Text(raw) => assert_eq!(raw, "# T\n"),
            other => panic!("expected raw text, got {:?}", other),
        }

        let mut by_id = StageInputs::for_path("/checkout/docs/a.md", "docs/a.md");
        assert!(matches!(
            stage.run(&mut by_id),
            Err(CheckError::ReadSource { path, .. }) if path == PathBuf::from("docs/a.md")
        ));
    }

    #[test]
    fn test_unreadable_file_is_fatal() {
        let stage = ParsingStage::new(MemoryReader::new());
        let mut inputs = StageInputs::for_file("missing.md");
        match stage.run(&mut inputs) {
            Err(CheckError::ReadSource { path, .. }) => {
                assert_eq!(path, PathBuf::from("missing.md"));
            }
            other => panic!("expected ReadSource, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_clean_lines_never_warn(lines in prop::collection::vec("[a-zA-Z#*.-][a-zA-Z0-9 .,]{0,30}[a-zA-Z0-9.]", 0..20)) {
            let source = lines.join("\n");
            prop_assert!(check_whitespace("p.md", &source).is_empty());
        }

        #[test]
        fn prop_blank_run_warns_for_each_extra_line(run in 1usize..8) {
            let source = format!("a\n{}b\n", "\n".repeat(run));
            let diagnostics = check_whitespace("p.md", &source);
            prop_assert_eq!(diagnostics.len(), run - 1);
        }

        #[test]
        fn prop_trailing_range_covers_trailing_span(width in 1usize..10) {
            let source = format!("text{}\n", " ".repeat(width));
            let diagnostics = check_whitespace("p.md", &source);
            if width == HARD_BREAK_WIDTH {
                prop_assert!(diagnostics.is_empty());
            } else {
                prop_assert_eq!(diagnostics.len(), 1);
                let range = diagnostics[0].range.unwrap();
                prop_assert_eq!(range.start.offset, 4);
                prop_assert_eq!(range.end.offset, 4 + width);
            }
        }
    }
}
