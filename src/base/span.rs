//! Source positions.
//!
//! `SourceLoc` is what the token stream (C1) hands back from `position()`;
//! `Span` covers a range of source text and is what diagnostics anchor to.

pub use text_size::{TextRange, TextSize};

/// A line/column + byte-offset source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
    pub offset: TextSize,
}

impl SourceLoc {
    pub fn new(line: u32, column: u32, offset: TextSize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// A half-open range between two source locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: SourceLoc,
    pub end: SourceLoc,
}

impl Span {
    pub fn new(start: SourceLoc, end: SourceLoc) -> Self {
        Self { start, end }
    }

    /// A zero-width span at a single location, used for synthetic nodes
    /// that have no corresponding source text (e.g. a `NONE` placeholder).
    pub fn point(loc: SourceLoc) -> Self {
        Self {
            start: loc,
            end: loc,
        }
    }

    pub fn to_range(self) -> TextRange {
        TextRange::new(self.start.offset, self.end.offset)
    }
}
