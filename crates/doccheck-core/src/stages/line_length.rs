//! Line length stage
//!
//! Flags raw source lines longer than the configured limit. Length is counted
//! in characters, without the line terminator; a `\r` before the `\n` of a
//! CRLF ending is part of the terminator.

use tracing::debug;

use crate::diagnostics::{Diagnostic, Rule};
use crate::error::CheckResult;
use crate::source::LineIndex;
use crate::stage::{keys, Stage, StageInputs, StagePayload};

use super::names;

pub struct LineLengthStage {
    max_length: Option<usize>,
}

impl LineLengthStage {
    /// A stage with no limit reports nothing
    pub fn new(max_length: Option<usize>) -> Self {
        Self { max_length }
    }
}

impl Stage for LineLengthStage {
    fn name(&self) -> &'static str {
        names::LINE_LENGTH
    }

    fn description(&self) -> &'static str {
        "Limit the length of source lines"
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![names::PARSING]
    }

    fn diagnostics_key(&self) -> &'static str {
        keys::LINE_LENGTH_DIAGNOSTICS
    }

    fn run(&self, inputs: &mut StageInputs) -> CheckResult<Vec<StagePayload>> {
        let file_id = inputs.text(keys::FILE_ID)?;
        let diagnostics = match self.max_length {
            Some(max) => check_line_length(file_id, inputs.text(keys::RAW_TEXT)?, max),
            None => Vec::new(),
        };
        debug!(file = %file_id, findings = diagnostics.len(), "checked line length");

        Ok(vec![StagePayload::diagnostics(
            self.name(),
            keys::LINE_LENGTH_DIAGNOSTICS,
            diagnostics,
        )])
    }
}

/// Report every line of `source` longer than `max` characters
pub fn check_line_length(file_id: &str, source: &str, max: usize) -> Vec<Diagnostic> {
    let index = LineIndex::new(source);
    let mut diagnostics = Vec::new();
    let mut offset = 0;

    for (i, line) in source.split('\n').enumerate() {
        let content = line.strip_suffix('\r').unwrap_or(line);
        let length = content.chars().count();
        if length > max {
            diagnostics.push(
                Diagnostic::new(
                    Rule::LineFormattingLineTooLong,
                    file_id,
                    format!(
                        "Line {} exceeds maximum length of {} characters (found {} characters)",
                        i + 1,
                        max,
                        length
                    ),
                )
                .with_range(index.range(offset, offset + content.len())),
            );
        }
        offset += line.len() + 1;
    }

    diagnostics
}
