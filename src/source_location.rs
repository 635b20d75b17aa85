//! Source location utilities
//!
//! Byte offsets are what the engine works with; people read lines and
//! columns. [`SourceLocator`] indexes line starts once (with `memchr`) and
//! answers offset lookups with a binary search, which is what error reporting
//! and listeners use when they need positions for many offsets of the same
//! text.

use serde::Serialize;
use std::fmt;

/// A position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourcePosition {
    /// Byte offset from start of input
    pub offset: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in characters)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new source position
    #[inline]
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Position of `offset` in `input`, clamped to the end of the input
    pub fn from_offset(input: &str, offset: usize) -> Self {
        SourceLocator::new(input).locate(offset)
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A half-open byte range `begin..end` of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// First byte
    pub begin: usize,
    /// One past the last byte
    pub end: usize,
}

impl Span {
    /// Create a span
    #[inline]
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// Whether the span covers nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.begin >= self.end
    }

    /// The covered text
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.begin..self.end).unwrap_or("")
    }

    /// Smallest span covering both
    pub fn merge(&self, other: &Span) -> Span {
        Span::new(self.begin.min(other.begin), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.begin, self.end)
    }
}

/// Line index over a source text
#[derive(Debug, Clone)]
pub struct SourceLocator<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceLocator<'a> {
    /// Index the line starts of `source`
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1));
        Self {
            source,
            line_starts,
        }
    }

    /// Line and column of `offset`
    pub fn locate(&self, offset: usize) -> SourcePosition {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.source[line_start..offset].chars().count() + 1;
        SourcePosition::new(offset, line + 1, column)
    }

    /// Number of lines
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of the line containing `offset`, without its line break
    pub fn line_text(&self, offset: usize) -> &'a str {
        let position = self.locate(offset);
        let start = self.line_starts[position.line - 1];
        let end = self
            .line_starts
            .get(position.line)
            .map_or(self.source.len(), |next| next - 1);
        let line = &self.source[start..end];
        line.strip_suffix('\r').unwrap_or(line)
    }

    /// The line containing `offset` with a caret under its column
    pub fn caret(&self, offset: usize) -> String {
        let position = self.locate(offset);
        let line = self.line_text(offset);
        format!("{}\n{}^", line, " ".repeat(position.column - 1))
    }
}
