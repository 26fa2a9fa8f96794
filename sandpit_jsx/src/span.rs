// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;
use core::ops::Range;

/// Half-open byte range into a source string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Creates a span; `end` is raised to `start` if smaller.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    /// Zero-width span at `at`.
    #[must_use]
    pub const fn point(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Smallest span covering both.
    #[must_use]
    pub fn to(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for a zero-width span.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// As a `Range<usize>`.
    #[must_use]
    pub const fn into_range(self) -> Range<usize> {
        self.start..self.end
    }

    /// The covered text, or `""` if the span is out of range.
    #[must_use]
    pub fn slice(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// A line/column position.
///
/// `line` is 1-based and `column` is 0-based, counted in `char`s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LineCol {
    /// 1-based line.
    pub line: usize,
    /// 0-based column in `char`s.
    pub column: usize,
}

impl LineCol {
    /// Computes the position of byte offset `offset` in `source`.
    ///
    /// Offsets past the end map to the end of the text.
    #[must_use]
    pub fn of(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 0;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        Self { line, column }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::{LineCol, Span};

    #[test]
    fn line_col_counts_from_one_and_zero() {
        let src = "ab\ncd\n\u{e9}f";
        assert_eq!(LineCol::of(src, 0), LineCol { line: 1, column: 0 });
        assert_eq!(LineCol::of(src, 4), LineCol { line: 2, column: 1 });
        // 'f' sits after a two-byte char.
        assert_eq!(LineCol::of(src, 8), LineCol { line: 3, column: 1 });
        assert_eq!(LineCol::of(src, 99), LineCol { line: 3, column: 2 });
    }

    #[test]
    fn span_join_and_slice() {
        let a = Span::new(2, 4);
        let b = Span::new(6, 7);
        assert_eq!(a.to(b), Span::new(2, 7));
        assert_eq!(Span::new(1, 3).slice("hello"), "el");
        assert_eq!(Span::new(1, 30).slice("hello"), "");
        assert!(Span::point(3).is_empty());
    }
}
