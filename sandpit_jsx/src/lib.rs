// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sandpit JSX: markup that users type, turned into something renderable.
//!
//! The pipeline has three steps, each a plain function:
//! - [`compile`] parses untrusted text into an immutable [`Artifact`].
//!   The text is the body of a fragment: any mix of text, elements,
//!   fragments, and `{expression}` containers.
//! - [`evaluate`] runs an artifact against a host [`Scope`] and produces a
//!   [`Value`]. Nothing outside the scope is reachable apart from
//!   `Fragment` and `React.Fragment`.
//! - [`render`] calls component functions until only tags and text remain.
//!
//! Alongside the pipeline sit the editor helpers: [`SourceDocument`],
//! snippet splicing ([`insert_at_cursor`], [`is_valid_location`]), and a
//! formatter that keeps the cursor in place ([`format_code`],
//! [`format_and_insert`]).
//!
//! ## Minimal example
//!
//! ```rust
//! use sandpit_jsx::{Function, Scope, Value, compile, evaluate, render};
//!
//! let scope = Scope::new().with(
//!     "Shout",
//!     Function::native("Shout", |args| {
//!         let text = match args.first() {
//!             Some(Value::Object(props)) => props.get("text").cloned().unwrap_or_default(),
//!             _ => Value::Undefined,
//!         };
//!         Ok(Value::from(text.to_string().to_uppercase()))
//!     }),
//! );
//!
//! let artifact = compile(r#"<p>Hi, <Shout text={name ?? "you"} /></p>"#).unwrap();
//! let value = evaluate(&artifact, &scope.with("name", "ada")).unwrap();
//! let tree = render(&value).unwrap();
//! assert_eq!(tree.to_string(), "<p>Hi, ADA</p>");
//! ```
//!
//! ## Errors
//!
//! Compile errors carry a byte [`Span`] and a [`LineCol`] computed by the
//! parser:
//!
//! ```rust
//! use sandpit_jsx::{LineCol, compile};
//!
//! let err = compile("<div>\n  <b>bold</i>\n</div>").unwrap_err();
//! assert_eq!(err.position, LineCol { line: 2, column: 9 });
//! assert!(err.to_string().starts_with("Expected corresponding JSX closing tag for <b>"));
//! ```
//!
//! Evaluation errors name the source text involved and carry its span.
//! Both kinds are values; nothing here panics on bad input.
//!
//! ## Formatting
//!
//! ```rust
//! use sandpit_jsx::format_code;
//!
//! let out = format_code("<div><h1>Title</h1></div>", 9);
//! assert_eq!(out.code, "<div>\n  <h1>Title</h1>\n</div>\n");
//! assert_eq!(&out.code[..out.cursor], "<div>\n  <h1>");
//! ```
//!
//! ## Features
//!
//! - `std` (default): links the standard library.
//! - `diagnostics`: `CompileError::report`, an `ariadne` rendering of compile
//!   errors.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod ast;
mod builtins;
mod compile;
mod cursor;
#[cfg(feature = "diagnostics")]
mod diagnostics;
mod doc;
mod document;
mod error;
mod eval;
mod format;
mod parser;
mod render;
mod scope;
mod span;
mod value;

pub use compile::{Artifact, compile, validate};
pub use cursor::{CodeWithCursor, cursor_coordinates_to_position, insert_at_cursor, is_valid_location};
pub use document::SourceDocument;
pub use error::{CompileError, CompileErrorKind, EvalError, RenderError};
pub use eval::{MAX_CALL_DEPTH, evaluate};
pub use format::{FormatOptions, format_and_insert, format_code, format_code_with};
pub use parser::MAX_NESTING_DEPTH;
pub use render::{MAX_RENDER_DEPTH, RenderNode, render};
pub use scope::Scope;
pub use span::{LineCol, Span};
pub use value::{Element, ElementType, Function, NativeFn, Object, Value, number_to_string};
