//! Source positions attached to diagnostics.

use std::fmt;

pub use text_size::{TextRange, TextSize};

/// Identifies one source unit (a script file) within a compilation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct SourceId(pub u32);

impl SourceId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// A line and column position in source text.
///
/// Both are 0-indexed internally, but displayed as 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Location of a syntax node: byte range plus the line/column of both ends.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub range: TextRange,
    pub start: LineCol,
    pub end: LineCol,
}

impl Span {
    pub fn new(range: TextRange, start: LineCol, end: LineCol) -> Self {
        Self { range, start, end }
    }

    /// A zero-width span at a line/column, for nodes built without source text.
    pub fn at(line: u32, col: u32) -> Self {
        let pos = LineCol::new(line, col);
        Self {
            range: TextRange::empty(TextSize::from(0)),
            start: pos,
            end: pos,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            range: self.range.cover(other.range),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}
