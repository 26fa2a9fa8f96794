// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

use crate::span::{LineCol, Span};

/// What went wrong while parsing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CompileErrorKind {
    /// A character that cannot start or continue the current construct.
    #[error("Unexpected token `{0}`")]
    UnexpectedChar(char),
    /// The source ended in the middle of a construct.
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    /// `>` or `}` appeared bare in JSX text.
    #[error("Unexpected token `{0}`. Did you mean `{{'{0}'}}`?")]
    BareTextChar(char),
    /// A closing tag that does not match the open element.
    #[error("Expected corresponding JSX closing tag for <{expected}>")]
    MismatchedClosingTag {
        /// Name of the element still open.
        expected: String,
        /// Name found in the closing tag.
        found: String,
    },
    /// `</x>` closing a `<>` fragment, or `</>` closing a named element.
    #[error("Expected corresponding closing tag for JSX fragment")]
    MismatchedFragmentClose,
    /// A closing tag with nothing open.
    #[error("Unexpected closing tag")]
    UnexpectedClosingTag,
    /// An element whose children run to the end of the input.
    #[error("Unterminated JSX contents")]
    UnterminatedJsx,
    /// A string literal without its closing quote.
    #[error("Unterminated string constant")]
    UnterminatedString,
    /// A `/*` comment without `*/`.
    #[error("Unterminated comment")]
    UnterminatedComment,
    /// A malformed numeric literal.
    #[error("Invalid number")]
    InvalidNumber,
    /// A malformed escape sequence in a string literal.
    #[error("Bad character escape sequence")]
    InvalidEscape,
    /// A specific token was required here.
    #[error("Expected {0}")]
    Expected(&'static str),
    /// `attr={}` with nothing inside.
    #[error("JSX attributes must only be assigned a non-empty expression")]
    EmptyAttributeExpression,
    /// Valid JavaScript that this dialect does not accept.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    /// Elements or expressions nested past the parser limit.
    #[error("Nesting is deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// A parse failure with its location.
///
/// `position` is computed by the parser from `span.start`, so callers never
/// need to recover it from the message text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({position})")]
pub struct CompileError {
    /// What went wrong.
    pub kind: CompileErrorKind,
    /// Where, as bytes into the source.
    pub span: Span,
    /// Where, as line and column.
    pub position: LineCol,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind, span: Span, source: &str) -> Self {
        Self {
            kind,
            span,
            position: LineCol::of(source, span.start),
        }
    }
}

/// A failure while evaluating an artifact.
///
/// Messages are user facing; they name the offending source text and never
/// interpreter internals.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EvalError {
    /// A name that is neither in scope nor part of the runtime.
    #[error("{name} is not defined")]
    Reference {
        /// The unresolved name.
        name: String,
        /// Where it was used.
        span: Span,
    },
    /// An operation applied to a value of the wrong kind.
    #[error("{message}")]
    Type {
        /// What was attempted.
        message: String,
        /// Where.
        span: Span,
    },
    /// A host function reported a failure.
    #[error("{message}")]
    Thrown {
        /// Host-supplied text.
        message: String,
        /// Call site, when known.
        span: Option<Span>,
    },
    /// Function calls nested past the evaluator limit.
    #[error("Maximum call depth of {limit} exceeded")]
    CallDepth {
        /// The limit that was hit.
        limit: usize,
        /// The call that went over.
        span: Span,
    },
}

impl EvalError {
    /// Convenience for host functions.
    #[must_use]
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown {
            message: message.into(),
            span: None,
        }
    }

    /// Source location, when the error has one.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Reference { span, .. } | Self::Type { span, .. } | Self::CallDepth { span, .. } => {
                Some(*span)
            }
            Self::Thrown { span, .. } => *span,
        }
    }

    pub(crate) fn with_call_site(self, site: Span) -> Self {
        match self {
            Self::Thrown {
                message,
                span: None,
            } => Self::Thrown {
                message,
                span: Some(site),
            },
            other => other,
        }
    }
}

/// A failure while expanding a value into a render tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// An object or function used where a child was expected.
    #[error("Objects are not valid as a child (found: {found})")]
    InvalidChild {
        /// `typeof`-style name of the offending value.
        found: &'static str,
    },
    /// An element whose type is neither a tag, a fragment, nor callable.
    #[error("Element type is invalid: expected a string or a component function but got: {found}")]
    InvalidElementType {
        /// `typeof`-style name of the offending value.
        found: &'static str,
    },
    /// Components nested past the render limit.
    #[error("Maximum render depth of {limit} exceeded")]
    DepthExceeded {
        /// The limit that was hit.
        limit: usize,
    },
    /// A component function failed.
    #[error(transparent)]
    Component(#[from] EvalError),
}
