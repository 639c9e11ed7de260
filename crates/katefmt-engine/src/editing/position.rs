use std::fmt;

/// A location between two characters of a line.
///
/// Columns count characters, not bytes. Column 0 is before the first
/// character and `column == line length` is past the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Same line, different column
    pub const fn with_column(self, column: usize) -> Self {
        Self {
            line: self.line,
            column,
        }
    }

    /// Position one character to the right on the same line
    pub const fn next_column(self) -> Self {
        self.with_column(self.column + 1)
    }
}

/// Diagnostics use editor numbering (1-based line and column)
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line + 1, self.column + 1)
    }
}

/// Half-open span `[start, end)` of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Build a range, swapping the bounds if they are given in reverse order
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Range covering whole lines `first..last` (`last` exclusive)
    pub fn lines(first: usize, last: usize) -> Self {
        Self::new(Position::new(first, 0), Position::new(last, 0))
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// True when `other` lies entirely within this range
    pub fn encloses(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}
