// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inserting library snippets at the editor cursor.

use sandpit_jsx::{CodeWithCursor, SourceDocument, format_and_insert, is_valid_location};

use crate::status::StatusMessage;

/// Why a snippet could not be inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    /// An element cannot go at this cursor position.
    #[error("Can't insert snippet at cursor")]
    InvalidLocation {
        /// The rejected cursor offset.
        cursor: usize,
    },
}

impl From<InsertError> for StatusMessage {
    fn from(err: InsertError) -> Self {
        Self::critical(alloc::format!("{err}"))
    }
}

/// Checks that an element can be placed at the document's cursor.
///
/// Hosts call this before opening the snippet picker.
pub fn check_snippet_location(doc: &SourceDocument) -> Result<(), InsertError> {
    if is_valid_location(doc.text(), doc.cursor()) {
        Ok(())
    } else {
        Err(InsertError::InvalidLocation {
            cursor: doc.cursor(),
        })
    }
}

/// Inserts `snippet` at the cursor and reformats.
///
/// The returned cursor sits just after the inserted snippet.
pub fn insert_snippet(doc: &SourceDocument, snippet: &str) -> Result<CodeWithCursor, InsertError> {
    check_snippet_location(doc)?;
    log::debug!("inserting {} byte snippet at {}", snippet.len(), doc.cursor());
    Ok(format_and_insert(doc.text(), doc.cursor(), snippet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Tone;

    #[test]
    fn rejects_cursor_inside_a_tag() {
        let doc = SourceDocument::new("<div className=\"x\" />", 5);
        let err = insert_snippet(&doc, "<b />").unwrap_err();
        assert_eq!(err, InsertError::InvalidLocation { cursor: 5 });
        let message = StatusMessage::from(err);
        assert_eq!(message.message, "Can't insert snippet at cursor");
        assert_eq!(message.tone, Tone::Critical);
    }

    #[test]
    fn empty_documents_accept_snippets() {
        let doc = SourceDocument::default();
        let out = insert_snippet(&doc, "<Box>hi</Box>").unwrap();
        assert_eq!(out.code, "<Box>hi</Box>\n");
        assert_eq!(out.cursor, "<Box>hi</Box>".len());
    }
}
