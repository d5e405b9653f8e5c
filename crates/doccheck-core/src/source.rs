//! Source locations
//!
//! Byte offsets are the primary coordinate. Lines and columns are 1-based and
//! derived from offsets through a [`LineIndex`] built once per document.

use serde::{Deserialize, Serialize};

/// A single point in the source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Byte offset from the start of the document
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl SourcePosition {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// Half-open range `[start, end)` in the source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset >= self.end.offset
    }

    /// Does this range contain the byte offset?
    pub fn contains(&self, offset: usize) -> bool {
        self.start.offset <= offset && offset < self.end.offset
    }

    /// Slice the covered text out of `source`, if the range is in bounds
    pub fn text<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start.offset..self.end.offset)
    }
}

/// Offset to line/column lookup table for one document
///
/// Columns come from a table of multi-byte characters, so a lookup costs two
/// binary searches however long the line is.
#[derive(Clone, Debug)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset at which each line starts; always begins with 0
    line_starts: Vec<usize>,
    /// Byte offset of every character longer than one byte
    wide_chars: Vec<usize>,
    /// Continuation bytes in the first `k` wide characters, at index `k`
    wide_extra: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );

        let mut wide_chars = Vec::new();
        let mut wide_extra = vec![0];
        let mut extra = 0;
        for (offset, c) in source.char_indices().filter(|(_, c)| c.len_utf8() > 1) {
            extra += c.len_utf8() - 1;
            wide_chars.push(offset);
            wide_extra.push(extra);
        }

        Self {
            source,
            line_starts,
            wide_chars,
            wide_extra,
        }
    }

    /// Number of lines, counting a trailing empty line after a final newline
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where the 1-based `line` starts
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1)
            .and_then(|i| self.line_starts.get(i).copied())
    }

    /// Position of a byte offset. Offsets past the end clamp to the end, and
    /// offsets inside a multi-byte character count that character as passed.
    pub fn position(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.source.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];

        let mut boundary = offset;
        while !self.source.is_char_boundary(boundary) {
            boundary -= 1;
        }
        let partial = usize::from(boundary < offset);
        let column = self.chars_before(boundary) - self.chars_before(line_start) + partial + 1;
        SourcePosition::new(offset, line_idx + 1, column)
    }

    /// Characters in `source[..offset]`; `offset` must be a char boundary
    fn chars_before(&self, offset: usize) -> usize {
        let wide = self.wide_chars.partition_point(|start| *start < offset);
        offset - self.wide_extra[wide]
    }

    /// Range between two byte offsets
    pub fn range(&self, start: usize, end: usize) -> SourceRange {
        SourceRange::new(self.position(start), self.position(end))
    }

    /// Range covering the 1-based `line`, excluding its newline
    pub fn line_range(&self, line: usize) -> Option<SourceRange> {
        let start = self.line_start(line)?;
        let end = self
            .line_start(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.source.len());
        Some(self.range(start, end))
    }

    /// Range covering the whole document
    pub fn full_range(&self) -> SourceRange {
        self.range(0, self.source.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_lookup() {
        let source = "line1\nline2\nline3";
        let index = LineIndex::new(source);
        assert_eq!(index.position(0), SourcePosition::new(0, 1, 1));
        assert_eq!(index.position(5), SourcePosition::new(5, 1, 6));
        assert_eq!(index.position(6), SourcePosition::new(6, 2, 1));
        assert_eq!(index.position(12), SourcePosition::new(12, 3, 1));
    }

    #[test]
    fn test_position_clamps_past_end() {
        let index = LineIndex::new("abc");
        assert_eq!(index.position(99), SourcePosition::new(3, 1, 4));
    }

    #[test]
    fn test_columns_count_characters() {
        let source = "héllo";
        let index = LineIndex::new(source);
        // 'é' is two bytes, so 'l' sits at byte 3 but column 3
        assert_eq!(index.position(3).column, 3);
    }

    #[test]
    fn test_line_range_excludes_newline() {
        let source = "ab\ncde\n";
        let index = LineIndex::new(source);
        let range = index.line_range(2).unwrap();
        assert_eq!(range.text(source), Some("cde"));
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_range(3).unwrap().len(), 0);
        assert!(index.line_range(4).is_none());
    }

    #[test]
    fn test_range_contains() {
        let index = LineIndex::new("0123456789");
        let range = index.range(2, 5);
        assert!(range.contains(2));
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert_eq!(range.len(), 3);
    }

    /// Column as the number of characters that start before `offset` on its line
    fn naive_column(source: &str, offset: usize) -> usize {
        let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
        source[line_start..]
            .char_indices()
            .take_while(|(i, _)| line_start + i < offset)
            .count()
            + 1
    }

    #[test]
    fn test_columns_match_character_count_at_every_offset() {
        let source = "aé€😀b\nx😀 é\n\nend";
        let index = LineIndex::new(source);
        for offset in 0..=source.len() {
            let floor = (0..=offset).rev().find(|o| source.is_char_boundary(*o)).unwrap();
            let expected = if floor == offset {
                naive_column(source, offset)
            } else {
                naive_column(source, floor) + 1
            };
            assert_eq!(index.position(offset).column, expected, "offset {}", offset);
        }
    }

    #[test]
    fn test_long_single_line_lookups_are_fast() {
        let source = "`é` ".repeat(50_000);
        let index = LineIndex::new(&source);
        let start = std::time::Instant::now();
        let mut last = 0;
        for offset in (0..source.len()).step_by(3) {
            last = index.position(offset).column;
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
        assert!(last > 1);
        assert_eq!(index.position(source.len()).column, 200_001);
    }
}
