// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

use crate::span::LineCol;

/// Editor text plus a caret.
///
/// The cursor is a byte offset that always lies on a `char` boundary within
/// `0..=text.len()`; constructors and setters clamp rather than fail.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceDocument {
    text: String,
    cursor: usize,
}

impl SourceDocument {
    /// Creates a document, clamping `cursor` into the text.
    #[must_use]
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let cursor = clamp_cursor(&text, cursor);
        Self { text, cursor }
    }

    /// The text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The cursor as a byte offset.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The cursor as a line/column position.
    #[must_use]
    pub fn cursor_position(&self) -> LineCol {
        LineCol::of(&self.text, self.cursor)
    }

    /// Moves the cursor, clamping it into the text.
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = clamp_cursor(&self.text, cursor);
    }

    /// Replaces the text and cursor, as an editor "replace all" does.
    pub fn replace(&mut self, text: impl Into<String>, cursor: usize) {
        self.text = text.into();
        self.cursor = clamp_cursor(&self.text, cursor);
    }

    /// Splits into text and cursor.
    #[must_use]
    pub fn into_parts(self) -> (String, usize) {
        (self.text, self.cursor)
    }
}

/// Clamps `cursor` into `0..=text.len()` and back onto a `char` boundary.
pub(crate) fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}
