// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source formatting with cursor tracking.
//!
//! Layout follows the JSX conventions of prettier: elements that contain
//! tags, several attributes, or several expressions put their children on
//! separate lines; text is filled to the print width. Expressions inside
//! `{}` are kept as written and only re-indented.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::ast::{Attr, AttrValue, Child, Element, ExprKind};
use crate::cursor::{CodeWithCursor, insert_at_cursor};
use crate::doc::{self, Doc};
use crate::document::clamp_cursor;
use crate::parser::parse_document;
use crate::span::Span;

/// Layout settings for [`format_code_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// Target line width.
    pub print_width: usize,
    /// Spaces per indentation level.
    pub indent_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            print_width: 80,
            indent_width: 2,
        }
    }
}

/// Formats `code` with the default options.
///
/// See [`format_code_with`].
#[must_use]
pub fn format_code(code: &str, cursor: usize) -> CodeWithCursor {
    format_code_with(code, cursor, &FormatOptions::default())
}

/// Formats `code`, carrying `cursor` along.
///
/// Only a document consisting of a single root element or fragment is
/// formatted; anything else, including unparseable input, comes back
/// unchanged. Formatted output ends with a newline. The cursor keeps the
/// number of non-whitespace characters before it.
#[must_use]
pub fn format_code_with(code: &str, cursor: usize, options: &FormatOptions) -> CodeWithCursor {
    match format_source(code, options) {
        Some(formatted) => {
            let cursor = map_cursor(code, cursor, &formatted);
            CodeWithCursor {
                code: formatted,
                cursor,
            }
        }
        None => CodeWithCursor::new(code, clamp_cursor(code, cursor)),
    }
}

/// Splices `snippet` in at `cursor` and formats the result, leaving the
/// cursor just after the inserted content.
#[must_use]
pub fn format_and_insert(code: &str, cursor: usize, snippet: &str) -> CodeWithCursor {
    let at = clamp_cursor(code, cursor);
    let spliced = insert_at_cursor(code, at, snippet);
    format_code(&spliced, at + snippet.len())
}

fn format_source(code: &str, options: &FormatOptions) -> Option<String> {
    let children = match parse_document(code) {
        Ok(children) => children,
        Err(err) => {
            log::debug!("not formatting: {err}");
            return None;
        }
    };
    let mut root = None;
    for child in &children {
        match child {
            Child::Text { value, .. } if value.is_empty() => {}
            Child::Element(el) if root.is_none() => root = Some(el),
            _ => return None,
        }
    }
    let doc = Builder { src: code }.element(root?);
    let mut out = doc::print(&doc, options.print_width, options.indent_width);
    out.push('\n');
    Some(out)
}

fn map_cursor(before: &str, cursor: usize, after: &str) -> usize {
    let cursor = clamp_cursor(before, cursor);
    let wanted = counted_ends(before)
        .take_while(|&end| end <= cursor)
        .count();
    if wanted == 0 {
        return 0;
    }
    counted_ends(after).nth(wanted - 1).unwrap_or(after.len())
}

/// Byte offsets just past each character the cursor mapping counts.
///
/// Whitespace is not counted, and neither is an explicit `{" "}`: the
/// formatter adds and removes those as it breaks lines.
fn counted_ends(text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut skip_to = 0;
    text.char_indices().filter_map(move |(i, c)| {
        if i < skip_to || c.is_whitespace() {
            return None;
        }
        if let Some(space) = JSX_SPACES.iter().find(|s| text[i..].starts_with(**s)) {
            skip_to = i + space.len();
            return None;
        }
        Some(i + c.len_utf8())
    })
}

const JSX_SPACES: [&str; 2] = ["{\" \"}", "{' '}"];

fn is_jsx_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\r' | '\t')
}

/// Text with a non-whitespace character, or whitespace on a single line.
fn is_meaningful(text: &str) -> bool {
    text.chars().any(|c| !is_jsx_whitespace(c)) || !text.contains('\n')
}

/// Splits into alternating words and whitespace runs, starting and ending
/// with a (possibly empty) word.
fn split_words(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (i, c) in text.char_indices() {
        if is_jsx_whitespace(c) != in_space {
            out.push(&text[start..i]);
            start = i;
            in_space = !in_space;
        }
    }
    out.push(&text[start..]);
    if in_space {
        out.push("");
    }
    out
}

fn word_len(word: &str) -> usize {
    word.chars().count()
}

fn separator_with_whitespace(word: &str) -> Part {
    if word_len(word) == 1 {
        Part::SoftLine
    } else {
        Part::HardLine
    }
}

fn separator_no_whitespace(word: &str, self_closing_adjacent: bool) -> Part {
    if self_closing_adjacent && word_len(word) != 1 {
        Part::HardLine
    } else {
        Part::SoftLine
    }
}

fn separator_after_node(node: &JsxChild<'_>, next: Option<&JsxChild<'_>>) -> Part {
    match next {
        Some(JsxChild::Text(t)) if is_meaningful(t) => {
            let first = t
                .trim_matches(is_jsx_whitespace)
                .split(is_jsx_whitespace)
                .next()
                .unwrap_or("");
            separator_no_whitespace(first, node.is_self_closing_element())
        }
        _ => Part::HardLine,
    }
}

/// Fill items before they become docs, so the clean-up passes can match on
/// separator kinds.
#[derive(Clone, Debug)]
enum Part {
    Empty,
    Content(Doc),
    Line,
    SoftLine,
    HardLine,
    /// A space that becomes `{" "}` plus a line break when broken.
    JsxWhitespace,
    RawWhitespace,
    RawWhitespaceThenBreak,
}

impl Part {
    fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn is_line(&self) -> bool {
        matches!(self, Self::Line | Self::SoftLine | Self::HardLine)
    }

    fn is_hard(&self) -> bool {
        matches!(self, Self::HardLine)
    }

    fn is_soft_or_hard(&self) -> bool {
        matches!(self, Self::SoftLine | Self::HardLine)
    }

    fn is_jsx_whitespace(&self) -> bool {
        matches!(self, Self::JsxWhitespace)
    }

    fn into_doc(self) -> Doc {
        const RAW: &str = "{\" \"}";
        match self {
            Self::Empty => Doc::text(""),
            Self::Content(doc) => doc,
            Self::Line => Doc::Line,
            Self::SoftLine => Doc::SoftLine,
            Self::HardLine => Doc::HardLine,
            Self::JsxWhitespace => {
                Doc::if_break(Doc::concat([Doc::text(RAW), Doc::SoftLine]), Doc::text(" "))
            }
            Self::RawWhitespace => Doc::text(RAW),
            Self::RawWhitespaceThenBreak => Doc::concat([Doc::text(RAW), Doc::HardLine]),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum JsxChild<'a> {
    Text(&'a str),
    Element(&'a Element),
    Container(Span),
}

impl JsxChild<'_> {
    fn is_self_closing_element(&self) -> bool {
        matches!(self, Self::Element(el) if el.name.is_some() && el.self_closing)
    }
}

struct Builder<'s> {
    src: &'s str,
}

impl<'s> Builder<'s> {
    fn slice(&self, span: Span) -> &'s str {
        span.slice(self.src)
    }

    /// Re-indents multi-line source text relative to its first line.
    fn verbatim(&self, text: &str) -> Doc {
        if !text.contains('\n') {
            return Doc::text(text);
        }
        let mut lines = text.split('\n');
        let first = lines.next().unwrap_or("");
        let rest: Vec<&str> = lines.collect();
        let dedent = rest
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0);
        let mut parts = Vec::with_capacity(rest.len() * 2 + 1);
        parts.push(Doc::text(first));
        for line in rest {
            parts.push(Doc::HardLine);
            parts.push(Doc::text(line.get(dedent..).unwrap_or(line.trim_start())));
        }
        Doc::concat(parts)
    }

    fn children<'a>(&self, children: &'a [Child]) -> Vec<JsxChild<'a>>
    where
        's: 'a,
    {
        children
            .iter()
            .map(|child| match child {
                Child::Text { raw, .. } => JsxChild::Text(raw.slice(self.src)),
                Child::Element(el) => JsxChild::Element(el),
                Child::Container { expr, span } => {
                    let is_space = matches!(
                        expr.as_ref().map(|e| &e.kind),
                        Some(ExprKind::Str(s)) if s == " "
                    ) && matches!(self.slice(*span), "{\" \"}" | "{' '}");
                    if is_space {
                        JsxChild::Text(" ")
                    } else {
                        JsxChild::Container(*span)
                    }
                }
            })
            .collect()
    }

    fn element(&self, el: &Element) -> Doc {
        let opening = self.opening(el);
        if el.self_closing {
            return opening;
        }
        let closing = Doc::text(match &el.name {
            Some(name) => format!("</{}>", name.text()),
            None => String::from("</>"),
        });
        let children = self.children(&el.children);
        let is_empty = match children.as_slice() {
            [] => true,
            [JsxChild::Text(t)] => !is_meaningful(t),
            _ => false,
        };
        if is_empty {
            return Doc::concat([opening, closing]);
        }

        let contains_tag = children
            .iter()
            .any(|c| matches!(c, JsxChild::Element(_)));
        let expressions = children
            .iter()
            .filter(|c| matches!(c, JsxChild::Container(_)))
            .count();
        let contains_text = children
            .iter()
            .any(|c| matches!(c, JsxChild::Text(t) if is_meaningful(t)));
        let mut forced_break =
            opening.will_break() || contains_tag || el.attrs.len() > 1 || expressions > 1;

        let mut parts = self.child_parts(&children);
        clean_separators(&mut parts, contains_text);

        let mut multiline = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if part.is_jsx_whitespace() {
                if i == 1 && parts[0].is_empty() {
                    multiline.push(if parts.len() == 2 {
                        Part::RawWhitespace
                    } else {
                        Part::RawWhitespaceThenBreak
                    });
                    continue;
                }
                if i == parts.len() - 1
                    || (i >= 2 && parts[i - 1].is_empty() && parts[i - 2].is_hard())
                {
                    multiline.push(Part::RawWhitespace);
                    continue;
                }
            }
            if let Part::Content(doc) = part
                && doc.will_break()
            {
                forced_break = true;
            }
            multiline.push(part.clone());
        }

        let multiline_doc = Doc::group(
            Doc::concat([
                opening.clone(),
                Doc::indent(Doc::concat([
                    Doc::HardLine,
                    Doc::Fill(multiline.into_iter().map(Part::into_doc).collect()),
                ])),
                Doc::HardLine,
                closing.clone(),
            ]),
            true,
        );
        if forced_break {
            return multiline_doc;
        }
        let flat = Doc::group(
            Doc::concat([
                opening,
                Doc::Fill(parts.into_iter().map(Part::into_doc).collect()),
                closing,
            ]),
            false,
        );
        Doc::conditional_group(flat, multiline_doc)
    }

    fn child_parts(&self, children: &[JsxChild<'_>]) -> Vec<Part> {
        let mut parts = Vec::new();
        for (i, child) in children.iter().enumerate() {
            let next = children.get(i + 1);
            let next_self_closing = next.is_some_and(JsxChild::is_self_closing_element);
            match child {
                JsxChild::Text(text) if is_meaningful(text) => {
                    let all = split_words(text);
                    let mut words = all.as_slice();
                    if words.first() == Some(&"") {
                        parts.push(Part::Empty);
                        let space = words.get(1).copied().unwrap_or("");
                        if space.contains('\n') {
                            let first = words.get(2).copied().unwrap_or("");
                            parts.push(separator_with_whitespace(first));
                        } else {
                            parts.push(Part::JsxWhitespace);
                        }
                        words = words.get(2..).unwrap_or_default();
                    }
                    let mut end_space = None;
                    if let Some((&"", init)) = words.split_last() {
                        words = init;
                        if let Some((&space, init)) = words.split_last() {
                            end_space = Some(space);
                            words = init;
                        }
                    }
                    let Some(&last) = words.last() else {
                        continue;
                    };
                    for (k, word) in words.iter().enumerate() {
                        parts.push(if k % 2 == 1 {
                            Part::Line
                        } else {
                            Part::Content(Doc::text(*word))
                        });
                    }
                    parts.push(match end_space {
                        Some(space) if space.contains('\n') => separator_with_whitespace(last),
                        Some(_) => Part::JsxWhitespace,
                        None => separator_no_whitespace(last, next_self_closing),
                    });
                }
                JsxChild::Text(text) => {
                    // Keep at most one blank line between tags.
                    if text.matches('\n').count() > 1 {
                        parts.push(Part::Empty);
                        parts.push(Part::HardLine);
                    }
                }
                JsxChild::Element(el) => {
                    parts.push(Part::Content(self.element(el)));
                    parts.push(separator_after_node(child, next));
                }
                JsxChild::Container(span) => {
                    parts.push(Part::Content(self.verbatim(self.slice(*span))));
                    parts.push(separator_after_node(child, next));
                }
            }
        }
        parts
    }

    fn opening(&self, el: &Element) -> Doc {
        let Some(name) = &el.name else {
            return Doc::text("<>");
        };
        let name = name.text();
        if el.attrs.is_empty() {
            return Doc::text(if el.self_closing {
                format!("<{name} />")
            } else {
                format!("<{name}>")
            });
        }
        let end = if el.self_closing { " />" } else { ">" };
        if let [
            attr @ Attr::Named {
                value: Some(AttrValue::Str { value, .. }),
                ..
            },
        ] = el.attrs.as_slice()
            && !value.contains('\n')
        {
            return Doc::group(
                Doc::concat([
                    Doc::text(format!("<{name} ")),
                    self.attr(attr),
                    Doc::text(end),
                ]),
                false,
            );
        }

        let multiline_string = el.attrs.iter().any(|attr| {
            matches!(
                attr,
                Attr::Named {
                    value: Some(AttrValue::Str { value, .. }),
                    ..
                } if value.contains('\n')
            )
        });
        let mut attrs = Vec::with_capacity(el.attrs.len() * 2);
        for attr in &el.attrs {
            attrs.push(Doc::Line);
            attrs.push(self.attr(attr));
        }
        let close = if el.self_closing {
            Doc::concat([Doc::Line, Doc::text("/>")])
        } else {
            Doc::concat([Doc::SoftLine, Doc::text(">")])
        };
        Doc::group(
            Doc::concat([
                Doc::text(format!("<{name}")),
                Doc::indent(Doc::Concat(attrs)),
                close,
            ]),
            multiline_string,
        )
    }

    fn attr(&self, attr: &Attr) -> Doc {
        match attr {
            Attr::Spread { span, .. } => self.verbatim(self.slice(*span)),
            Attr::Named {
                name, value: None, ..
            } => Doc::text(name.as_str()),
            Attr::Named {
                name,
                value: Some(value),
                ..
            } => {
                let value = match value {
                    AttrValue::Str { raw, .. } => Doc::text(normalize_quotes(self.slice(*raw))),
                    AttrValue::Expr { span, .. } => self.verbatim(self.slice(*span)),
                    AttrValue::Element(el) => self.verbatim(self.slice(el.span)),
                };
                Doc::concat([Doc::text(format!("{name}=")), value])
            }
        }
    }
}

/// Drops redundant separator pairs and trims the ends.
fn clean_separators(parts: &mut Vec<Part>, contains_text: bool) {
    let mut i = parts.len().saturating_sub(1);
    while i > 0 {
        i -= 1;
        let at = |k: usize| parts.get(i + k);
        let is = |k: usize, f: fn(&Part) -> bool| at(k).is_some_and(f);

        let pair_of_empties = is(0, Part::is_empty) && is(1, Part::is_empty);
        let pair_of_hardlines = is(0, Part::is_hard) && is(1, Part::is_empty) && is(2, Part::is_hard);
        let line_then_whitespace =
            is(0, Part::is_soft_or_hard) && is(1, Part::is_empty) && is(2, Part::is_jsx_whitespace);
        let whitespace_then_line =
            is(0, Part::is_jsx_whitespace) && is(1, Part::is_empty) && is(2, Part::is_soft_or_hard);
        let double_whitespace = is(0, Part::is_jsx_whitespace)
            && is(1, Part::is_empty)
            && is(2, Part::is_jsx_whitespace);
        let soft_and_hard = is(1, Part::is_empty)
            && ((matches!(at(0), Some(Part::SoftLine)) && is(2, Part::is_hard))
                || (is(0, Part::is_hard) && matches!(at(2), Some(Part::SoftLine))));

        if (pair_of_hardlines && contains_text)
            || pair_of_empties
            || line_then_whitespace
            || double_whitespace
        {
            parts.drain(i..i + 2);
        } else if whitespace_then_line || soft_and_hard {
            parts.drain(i + 1..i + 3);
        }
    }

    while parts.last().is_some_and(|p| p.is_line() || p.is_empty()) {
        parts.pop();
    }
    while parts.len() > 1
        && (parts[0].is_line() || parts[0].is_empty())
        && (parts[1].is_line() || parts[1].is_empty())
    {
        parts.drain(..2);
    }
}

/// Prefers double quotes unless the value contains more of them.
fn normalize_quotes(raw: &str) -> String {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or("");
    let unescaped = inner.replace("&apos;", "'").replace("&quot;", "\"");
    let doubles = unescaped.matches('"').count();
    let singles = unescaped.matches('\'').count();
    if doubles > singles {
        format!("'{}'", unescaped.replace('\'', "&apos;"))
    } else {
        format!("\"{}\"", unescaped.replace('"', "&quot;"))
    }
}
