use serde::Serialize;
use std::fmt;

/// Position of a span in a build script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourcePosition {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in bytes)
    pub column: usize,
    /// Starting byte offset
    pub start_byte: usize,
    /// Ending byte offset (exclusive)
    pub end_byte: usize,
    /// `end_byte - start_byte`
    pub length: usize,
}

/// Byte range of an entity, with line/column for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    /// Covers the whole range
    pub start: SourcePosition,
    /// Zero-length point where the range ends
    pub end: SourcePosition,
}

impl SourcePosition {
    /// Position at `byte_offset` spanning up to `end_byte`
    pub fn spanning(content: &str, byte_offset: usize, end_byte: usize) -> Self {
        let (line, column) = byte_to_line_column(content, byte_offset);
        Self {
            line,
            column,
            start_byte: byte_offset,
            end_byte,
            length: end_byte.saturating_sub(byte_offset),
        }
    }

    /// Zero-length position at `byte_offset`
    pub fn point(content: &str, byte_offset: usize) -> Self {
        Self::spanning(content, byte_offset, byte_offset)
    }
}

impl SourceRange {
    /// Build a range from absolute byte offsets into `content`
    pub fn from_bytes(content: &str, byte_start: usize, byte_end: usize) -> Self {
        Self {
            start: SourcePosition::spanning(content, byte_start, byte_end),
            end: SourcePosition::point(content, byte_end),
        }
    }

    /// Zero-length range, used as the anchor of an insert
    pub fn point(content: &str, byte_offset: usize) -> Self {
        Self::from_bytes(content, byte_offset, byte_offset)
    }

    pub fn byte_start(&self) -> usize {
        self.start.start_byte
    }

    pub fn byte_end(&self) -> usize {
        self.end.start_byte
    }

    pub fn len(&self) -> usize {
        self.byte_end().saturating_sub(self.byte_start())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two non-empty ranges share at least one byte
    pub fn overlaps(&self, other: &SourceRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.byte_start() < other.byte_end()
            && other.byte_start() < self.byte_end()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} [{}..{})",
            self.start,
            self.end,
            self.byte_start(),
            self.byte_end()
        )
    }
}

/// Convert a byte offset to a 1-indexed (line, column) pair
///
/// Lines are split on `\n` only, so a `\r` before the newline counts as a
/// column of its line. Offsets past the end land on the last line.
pub fn byte_to_line_column(content: &str, byte_offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut line_start_offset = 0;

    for line_str in content.split('\n') {
        let line_bytes = line_str.len() + 1; // +1 for newline

        if line_start_offset + line_bytes > byte_offset {
            return (line, byte_offset - line_start_offset + 1);
        }

        line_start_offset += line_bytes;
        line += 1;
    }

    // Only reachable when the offset is past the end of the content
    let last_line = line - 1;
    let last_start = content.rfind('\n').map_or(0, |i| i + 1);
    (last_line.max(1), byte_offset.saturating_sub(last_start) + 1)
}

/// Byte offset of the start of every line
pub fn line_starts(content: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));
    starts
}

/// Byte range `[start, end)` of the line containing `byte_offset`, newline excluded
pub fn line_bounds(content: &str, byte_offset: usize) -> (usize, usize) {
    let mut offset = byte_offset.min(content.len());
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    let start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = content[offset..]
        .find('\n')
        .map_or(content.len(), |i| offset + i);
    (start, end)
}
