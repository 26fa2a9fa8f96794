// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cursor helpers used by snippet insertion.

use alloc::string::String;

use crate::compile::validate;
use crate::document::clamp_cursor;

/// Source text with a caret, as exchanged with the editor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeWithCursor {
    /// The text.
    pub code: String,
    /// Byte offset of the caret.
    pub cursor: usize,
}

impl CodeWithCursor {
    /// Bundles text and caret.
    #[must_use]
    pub fn new(code: impl Into<String>, cursor: usize) -> Self {
        Self {
            code: code.into(),
            cursor,
        }
    }
}

/// Markup that is valid anywhere a child element is.
const PROBE: &str = "<b>\"b\"</b>";

/// Splices `snippet` into `code` at `cursor`.
///
/// The cursor is clamped into the text first.
#[must_use]
pub fn insert_at_cursor(code: &str, cursor: usize, snippet: &str) -> String {
    let at = clamp_cursor(code, cursor);
    let mut out = String::with_capacity(code.len() + snippet.len());
    out.push_str(&code[..at]);
    out.push_str(snippet);
    out.push_str(&code[at..]);
    out
}

/// Returns `true` if an element may be inserted at `cursor`.
///
/// Empty code accepts anything; otherwise the code with a probe element
/// spliced in at the cursor must still compile.
#[must_use]
pub fn is_valid_location(code: &str, cursor: usize) -> bool {
    if code.is_empty() {
        return true;
    }
    validate(&insert_at_cursor(code, cursor, PROBE))
}

/// Converts a 0-based `(line, column)` into a byte offset.
///
/// Columns count bytes within the line; positions past the end clamp to the
/// end of the text.
#[must_use]
pub fn cursor_coordinates_to_position(code: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (i, text) in code.split('\n').enumerate() {
        if i == line {
            return clamp_cursor(code, offset + column.min(text.len()));
        }
        offset += text.len() + 1;
    }
    code.len()
}

#[cfg(test)]
mod tests {
    use super::{cursor_coordinates_to_position, insert_at_cursor, is_valid_location};

    const TREE: &str = "<a>
  <b />
  <c>
    <d>...</d>
    <e />
    ...
    <f>
      <g />
    </f>
    <h
      i=\"j\"
    />
  </c>
</a>";

    fn valid_at(line: usize, column: usize) -> bool {
        is_valid_location(TREE, cursor_coordinates_to_position(TREE, line, column))
    }

    #[test]
    fn valid_locations() {
        assert!(valid_at(1, 0));
        assert!(valid_at(1, 7));
        assert!(valid_at(3, 7));
    }

    #[test]
    fn invalid_locations() {
        // Inside a tag name.
        assert!(!valid_at(3, 5));
        // Among attributes.
        assert!(!valid_at(10, 0));
    }

    #[test]
    fn empty_code_is_valid_anywhere() {
        assert!(is_valid_location("", 0));
        assert!(is_valid_location("", 12));
    }

    #[test]
    fn positions() {
        assert_eq!(cursor_coordinates_to_position("<h1>Title</h1>", 0, 4), 4);
        assert_eq!(
            cursor_coordinates_to_position("<div>\n<h1>Title</h1>\n</div>", 1, 4),
            10
        );
        assert_eq!(cursor_coordinates_to_position("ab", 5, 0), 2);
    }

    #[test]
    fn splice() {
        assert_eq!(insert_at_cursor("<a></a>", 3, "<b />"), "<a><b /></a>");
        assert_eq!(insert_at_cursor("x", 99, "y"), "xy");
    }
}
