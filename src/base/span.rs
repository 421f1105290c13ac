//! Source positions and spans.

use std::fmt;

pub use text_size::TextSize;

/// A position in source text.
///
/// Line and column are 0-indexed internally, but displayed as 1-indexed.
/// The absolute offset is a byte offset into the normalized source.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in characters)
    pub column: u32,
    /// Byte offset from the start of the file
    pub absolute: TextSize,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(line: u32, column: u32, absolute: TextSize) -> Self {
        Self { line, column, absolute }
    }

    /// Move past a newline character.
    #[inline]
    pub fn next_line(&mut self) {
        self.line += 1;
        self.column = 0;
        self.absolute += TextSize::from(1);
    }

    /// Move past a single non-newline character.
    #[inline]
    pub fn next_character(&mut self, c: char) {
        self.column += 1;
        self.absolute += TextSize::of(c);
    }

    /// Move past `c`, whichever kind of character it is.
    #[inline]
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.next_line();
        } else {
            self.next_character(c);
        }
    }

    /// Byte offset as a `usize`, for slicing.
    #[inline]
    pub fn offset(self) -> usize {
        u32::from(self.absolute) as usize
    }

    /// Get 1-indexed line number (for display).
    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line + 1
    }

    /// Get 1-indexed column number (for display).
    #[inline]
    pub const fn column_one_indexed(self) -> u32 {
        self.column + 1
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}@{}",
            self.line_one_indexed(),
            self.column_one_indexed(),
            u32::from(self.absolute)
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.column_one_indexed())
    }
}

/// A half-open region of source text, `start..end`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `position`.
    #[inline]
    pub const fn at(position: Position) -> Self {
        Self { start: position, end: position }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
