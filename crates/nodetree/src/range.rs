//! Source positions
//!
//! Only populated when the parser runs with position tracking on. Lookups on
//! untracked nodes or attributes return the `UNTRACKED` sentinels.

use serde::{Deserialize, Serialize};

/// A byte offset into the source, with its 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub pos: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const UNTRACKED: Position = Position {
        pos: usize::MAX,
        line: 0,
        column: 0,
    };

    pub fn new(pos: usize, line: usize, column: usize) -> Self {
        Self { pos, line, column }
    }

    pub fn is_tracked(&self) -> bool {
        self.pos != usize::MAX
    }
}

/// Start (inclusive) to end (exclusive) span in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const UNTRACKED: Range = Range {
        start: Position::UNTRACKED,
        end: Position::UNTRACKED,
    };

    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_tracked(&self) -> bool {
        self.start.is_tracked()
    }

    /// Zero-width range, e.g. an end tag the source never closed
    pub fn is_implicit(&self) -> bool {
        self.is_tracked() && self.start == self.end
    }
}

/// Ranges of an attribute's name and of its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeRange {
    pub name: Range,
    pub value: Range,
}

impl AttributeRange {
    pub const UNTRACKED: AttributeRange = AttributeRange {
        name: Range::UNTRACKED,
        value: Range::UNTRACKED,
    };

    pub fn new(name: Range, value: Range) -> Self {
        Self { name, value }
    }

    pub fn is_tracked(&self) -> bool {
        self.name.is_tracked()
    }
}

/// Offset -> line/column lookup for one source string
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    pub fn position(&self, pos: usize) -> Position {
        let line = match self.line_starts.binary_search(&pos) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        Position::new(pos, line + 1, pos - self.line_starts[line] + 1)
    }

    pub fn range(&self, start: usize, end: usize) -> Range {
        Range::new(self.position(start), self.position(end))
    }
}
