// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recursive-descent parser for the markup dialect.
//!
//! The document grammar is the body of a fragment: a run of JSX children.
//! Expressions inside `{}` are a small side-effect-free JavaScript subset.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::ast::{
    Attr, AttrValue, BinaryOp, Child, Element, ElementName, Expr, ExprKind, Item, LogicalOp,
    Prop, PropKey, UnaryOp,
};
use crate::error::{CompileError, CompileErrorKind};
use crate::span::Span;
use crate::value::number_to_string;

/// Deepest element or expression nesting accepted before giving up.
pub const MAX_NESTING_DEPTH: usize = 256;

type PResult<T> = Result<T, CompileError>;

/// Parses `source` as a sequence of JSX children.
pub(crate) fn parse_document(source: &str) -> PResult<Vec<Child>> {
    let mut parser = Parser {
        src: source,
        pos: 0,
        depth: 0,
    };
    parser.parse_children(None)
}

#[derive(Clone, Copy)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        self.src.get(self.pos..).unwrap_or("")
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn error(&self, kind: CompileErrorKind, span: Span) -> CompileError {
        CompileError::new(kind, span, self.src)
    }

    fn unexpected(&self) -> CompileError {
        match self.peek() {
            Some(c) => self.error(
                CompileErrorKind::UnexpectedChar(c),
                Span::new(self.pos, self.pos + c.len_utf8()),
            ),
            None => self.error(CompileErrorKind::UnexpectedEnd, Span::point(self.pos)),
        }
    }

    fn expect(&mut self, c: char, what: &'static str) -> PResult<()> {
        if self.eat(c) {
            return Ok(());
        }
        match self.peek() {
            None => Err(self.error(CompileErrorKind::UnexpectedEnd, Span::point(self.pos))),
            Some(found) => Err(self.error(
                CompileErrorKind::Expected(what),
                Span::new(self.pos, self.pos + found.len_utf8()),
            )),
        }
    }

    fn enter(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error(
                CompileErrorKind::NestingTooDeep(MAX_NESTING_DEPTH),
                Span::point(self.pos),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn skip_trivia(&mut self) -> PResult<()> {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if self.eat_str("//") {
                let rest = self.rest();
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if self.rest().starts_with("/*") {
                let start = self.pos;
                match self.rest()[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => {
                        return Err(self.error(
                            CompileErrorKind::UnterminatedComment,
                            Span::new(start, self.src.len()),
                        ));
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    // --- JSX ---------------------------------------------------------------

    fn parse_children(&mut self, open: Option<Span>) -> PResult<Vec<Child>> {
        let mut children = Vec::new();
        loop {
            let Some(c) = self.peek() else {
                return match open {
                    Some(span) => Err(self.error(CompileErrorKind::UnterminatedJsx, span)),
                    None => Ok(children),
                };
            };
            match c {
                '<' => {
                    if self.closing_tag_ahead() {
                        if open.is_none() {
                            let span = self.closing_tag_span();
                            return Err(self.error(CompileErrorKind::UnexpectedClosingTag, span));
                        }
                        return Ok(children);
                    }
                    children.push(Child::Element(self.parse_element()?));
                }
                '{' => children.push(self.parse_child_container()?),
                '>' | '}' => {
                    return Err(self.error(
                        CompileErrorKind::BareTextChar(c),
                        Span::new(self.pos, self.pos + 1),
                    ));
                }
                _ => children.push(self.parse_text()),
            }
        }
    }

    fn closing_tag_ahead(&self) -> bool {
        self.rest()
            .strip_prefix('<')
            .is_some_and(|after| after.trim_start().starts_with('/'))
    }

    fn closing_tag_span(&self) -> Span {
        let end = self
            .rest()
            .find('>')
            .map_or(self.src.len(), |i| self.pos + i + 1);
        Span::new(self.pos, end)
    }

    fn parse_text(&mut self) -> Child {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '<' | '{' | '>' | '}') {
                break;
            }
            self.pos += c.len_utf8();
        }
        let raw = Span::new(start, self.pos);
        let value = clean_jsx_text(&decode_entities(raw.slice(self.src)));
        Child::Text { raw, value }
    }

    fn parse_child_container(&mut self) -> PResult<Child> {
        let start = self.pos;
        self.bump();
        self.skip_trivia()?;
        if self.eat('}') {
            return Ok(Child::Container {
                expr: None,
                span: Span::new(start, self.pos),
            });
        }
        if self.rest().starts_with("...") {
            return Err(self.error(
                CompileErrorKind::Unsupported("Spread children"),
                Span::new(self.pos, self.pos + 3),
            ));
        }
        let expr = self.parse_expression()?;
        self.skip_trivia()?;
        self.expect('}', "`}`")?;
        Ok(Child::Container {
            expr: Some(expr),
            span: Span::new(start, self.pos),
        })
    }

    fn parse_element(&mut self) -> PResult<Element> {
        self.enter()?;
        let element = self.parse_element_inner();
        self.leave();
        element
    }

    fn parse_element_inner(&mut self) -> PResult<Element> {
        let start = self.pos;
        self.expect('<', "`<`")?;
        self.skip_trivia()?;

        if self.eat('>') {
            let children = self.parse_children(Some(Span::new(start, self.pos)))?;
            self.parse_closing_tag(None)?;
            return Ok(Element {
                name: None,
                name_span: Span::point(start + 1),
                attrs: Vec::new(),
                children,
                self_closing: false,
                span: Span::new(start, self.pos),
            });
        }

        let (name, name_span) = self.parse_element_name()?;
        let mut attrs = Vec::new();
        let self_closing = loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('/') => {
                    self.bump();
                    self.skip_trivia()?;
                    self.expect('>', "`>`")?;
                    break true;
                }
                Some('>') => {
                    self.bump();
                    break false;
                }
                Some('{') => attrs.push(self.parse_spread_attr()?),
                Some(c) if is_ident_start(c) => attrs.push(self.parse_attr()?),
                _ => return Err(self.unexpected()),
            }
        };

        let children = if self_closing {
            Vec::new()
        } else {
            let children = self.parse_children(Some(Span::new(start, self.pos)))?;
            self.parse_closing_tag(Some(&name))?;
            children
        };

        Ok(Element {
            name: Some(name),
            name_span,
            attrs,
            children,
            self_closing,
            span: Span::new(start, self.pos),
        })
    }

    fn parse_closing_tag(&mut self, expected: Option<&ElementName>) -> PResult<()> {
        let start = self.pos;
        self.expect('<', "`<`")?;
        self.skip_trivia()?;
        self.expect('/', "`/`")?;
        self.skip_trivia()?;
        if self.eat('>') {
            return match expected {
                None => Ok(()),
                Some(name) => Err(self.error(
                    CompileErrorKind::MismatchedClosingTag {
                        expected: name.text(),
                        found: String::new(),
                    },
                    Span::new(start, self.pos),
                )),
            };
        }
        let (found, _) = self.parse_element_name()?;
        self.skip_trivia()?;
        self.expect('>', "`>`")?;
        let span = Span::new(start, self.pos);
        match expected {
            None => Err(self.error(CompileErrorKind::MismatchedFragmentClose, span)),
            Some(name) if name.text() != found.text() => Err(self.error(
                CompileErrorKind::MismatchedClosingTag {
                    expected: name.text(),
                    found: found.text(),
                },
                span,
            )),
            Some(_) => Ok(()),
        }
    }

    fn parse_element_name(&mut self) -> PResult<(ElementName, Span)> {
        let start = self.pos;
        let first = self.parse_jsx_identifier()?;
        if self.peek() == Some(':') {
            return Err(self.error(
                CompileErrorKind::Unsupported("Namespaced tag names"),
                Span::new(start, self.pos + 1),
            ));
        }
        if self.peek() != Some('.') {
            return Ok((ElementName::Ident(first), Span::new(start, self.pos)));
        }
        let mut parts = Vec::new();
        parts.push((first, Span::new(start, self.pos)));
        while self.eat('.') {
            let seg_start = self.pos;
            let seg = self.parse_identifier()?;
            parts.push((seg, Span::new(seg_start, self.pos)));
        }
        Ok((ElementName::Member(parts), Span::new(start, self.pos)))
    }

    fn parse_jsx_identifier(&mut self) -> PResult<String> {
        match self.peek() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.unexpected()),
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) || c == '-' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_attr(&mut self) -> PResult<Attr> {
        let start = self.pos;
        let mut name = self.parse_jsx_identifier()?;
        if self.eat(':') {
            name.push(':');
            name.push_str(&self.parse_jsx_identifier()?);
        }
        self.skip_trivia()?;
        if !self.eat('=') {
            return Ok(Attr::Named {
                name,
                value: None,
                span: Span::new(start, self.pos),
            });
        }
        self.skip_trivia()?;
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                let raw_start = self.pos;
                self.bump();
                let Some(len) = self.rest().find(q) else {
                    return Err(self.error(
                        CompileErrorKind::UnterminatedString,
                        Span::new(raw_start, self.src.len()),
                    ));
                };
                let text = &self.src[self.pos..self.pos + len];
                let value = decode_entities(text);
                self.pos += len + 1;
                AttrValue::Str {
                    value,
                    raw: Span::new(raw_start, self.pos),
                }
            }
            Some('{') => {
                let brace = self.pos;
                self.bump();
                self.skip_trivia()?;
                if self.peek() == Some('}') {
                    return Err(self.error(
                        CompileErrorKind::EmptyAttributeExpression,
                        Span::new(brace, self.pos + 1),
                    ));
                }
                let expr = self.parse_expression()?;
                self.skip_trivia()?;
                self.expect('}', "`}`")?;
                AttrValue::Expr {
                    expr,
                    span: Span::new(brace, self.pos),
                }
            }
            Some('<') => AttrValue::Element(self.parse_element()?),
            _ => return Err(self.unexpected()),
        };
        Ok(Attr::Named {
            name,
            value: Some(value),
            span: Span::new(start, self.pos),
        })
    }

    fn parse_spread_attr(&mut self) -> PResult<Attr> {
        let start = self.pos;
        self.bump();
        self.skip_trivia()?;
        if !self.eat_str("...") {
            return Err(self.error(
                CompileErrorKind::Expected("`...` in attribute spread"),
                Span::point(self.pos),
            ));
        }
        let expr = self.parse_expression()?;
        self.skip_trivia()?;
        self.expect('}', "`}`")?;
        Ok(Attr::Spread {
            expr,
            span: Span::new(start, self.pos),
        })
    }

    // --- expressions -------------------------------------------------------

    fn parse_expression(&mut self) -> PResult<Expr> {
        self.enter()?;
        let expr = self.parse_conditional();
        self.leave();
        expr
    }

    fn parse_conditional(&mut self) -> PResult<Expr> {
        self.skip_trivia()?;
        if let Some(arrow) = self.try_parse_arrow()? {
            return Ok(arrow);
        }
        let test = self.parse_binary(1)?;
        self.skip_trivia()?;
        if self.peek() == Some('?') && !self.rest().starts_with("??") && !self.optional_chain_ahead()
        {
            self.bump();
            let consequent = self.parse_expression()?;
            self.skip_trivia()?;
            self.expect(':', "`:`")?;
            let alternate = self.parse_expression()?;
            let span = test.span.to(alternate.span);
            return Ok(Expr {
                kind: ExprKind::Conditional {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                },
                span,
            });
        }
        Ok(test)
    }

    fn optional_chain_ahead(&self) -> bool {
        self.rest().starts_with("?.") && !self.peek_nth(2).is_some_and(|c| c.is_ascii_digit())
    }

    fn try_parse_arrow(&mut self) -> PResult<Option<Expr>> {
        let start = self.pos;
        let params = match self.peek() {
            Some(c) if is_ident_start(c) => {
                let name = self.scan_identifier();
                let span = Span::new(start, self.pos);
                if is_reserved(&name) {
                    self.pos = start;
                    return Ok(None);
                }
                let mut params = Vec::new();
                params.push((name, span));
                params
            }
            Some('(') => match self.scan_arrow_params() {
                Some(params) => params,
                None => {
                    self.pos = start;
                    return Ok(None);
                }
            },
            _ => return Ok(None),
        };
        if self.skip_trivia().is_err() || !self.eat_str("=>") {
            self.pos = start;
            return Ok(None);
        }
        self.skip_trivia()?;
        if self.peek() == Some('{') {
            return Err(self.error(
                CompileErrorKind::Unsupported("Arrow function block bodies"),
                Span::point(self.pos),
            ));
        }
        let body = self.parse_expression()?;
        let span = Span::new(start, body.span.end);
        Ok(Some(Expr {
            kind: ExprKind::Arrow {
                params,
                body: Box::new(body),
            },
            span,
        }))
    }

    fn scan_arrow_params(&mut self) -> Option<Vec<(String, Span)>> {
        self.bump();
        let mut params = Vec::new();
        loop {
            self.skip_trivia().ok()?;
            if self.eat(')') {
                return Some(params);
            }
            let start = self.pos;
            if !self.peek().is_some_and(is_ident_start) {
                return None;
            }
            let name = self.scan_identifier();
            if is_reserved(&name) {
                return None;
            }
            params.push((name, Span::new(start, self.pos)));
            self.skip_trivia().ok()?;
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                return Some(params);
            }
            return None;
        }
    }

    fn peek_operator(&self) -> Option<(Operator, u8, usize)> {
        const TABLE: &[(&str, Operator, u8)] = &[
            ("??", Operator::Logical(LogicalOp::Nullish), 1),
            ("||", Operator::Logical(LogicalOp::Or), 2),
            ("&&", Operator::Logical(LogicalOp::And), 3),
            ("===", Operator::Binary(BinaryOp::StrictEq), 4),
            ("!==", Operator::Binary(BinaryOp::StrictNotEq), 4),
            ("==", Operator::Binary(BinaryOp::Eq), 4),
            ("!=", Operator::Binary(BinaryOp::NotEq), 4),
            ("<=", Operator::Binary(BinaryOp::Le), 5),
            (">=", Operator::Binary(BinaryOp::Ge), 5),
            ("<", Operator::Binary(BinaryOp::Lt), 5),
            (">", Operator::Binary(BinaryOp::Gt), 5),
            ("+", Operator::Binary(BinaryOp::Add), 6),
            ("-", Operator::Binary(BinaryOp::Sub), 6),
            ("*", Operator::Binary(BinaryOp::Mul), 7),
            ("/", Operator::Binary(BinaryOp::Div), 7),
            ("%", Operator::Binary(BinaryOp::Rem), 7),
        ];
        let rest = self.rest();
        if rest.starts_with("=>") || rest.starts_with("**") {
            return None;
        }
        TABLE
            .iter()
            .find(|(tok, _, _)| rest.starts_with(tok))
            .map(|(tok, op, prec)| (*op, *prec, tok.len()))
    }

    /// Left-assoc chains grow one tree level per operator, so each one counts
    /// against the nesting limit until the whole chain is parsed.
    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expr> {
        let depth = self.depth;
        let expr = self.parse_binary_chain(min_prec);
        self.depth = depth;
        expr
    }

    fn parse_binary_chain(&mut self, min_prec: u8) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            self.skip_trivia()?;
            let Some((op, prec, len)) = self.peek_operator() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.enter()?;
            self.pos += len;
            let rhs = self.parse_binary(prec + 1)?;
            let span = lhs.span.to(rhs.span);
            let kind = match op {
                Operator::Binary(op) => ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                Operator::Logical(op) => ExprKind::Logical {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            };
            lhs = Expr { kind, span };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        self.skip_trivia()?;
        let start = self.pos;
        if self.rest().starts_with("++") || self.rest().starts_with("--") {
            return Err(self.error(
                CompileErrorKind::Unsupported("Update expressions"),
                Span::new(start, start + 2),
            ));
        }
        let op = if self.eat('!') {
            UnaryOp::Not
        } else if self.eat('-') {
            UnaryOp::Neg
        } else if self.eat('+') {
            UnaryOp::Plus
        } else if self.keyword_ahead("typeof") {
            self.pos += "typeof".len();
            UnaryOp::TypeOf
        } else {
            return self.parse_postfix();
        };
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();
        let operand = operand?;
        let span = Span::new(start, operand.span.end);
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        })
    }

    fn keyword_ahead(&self, word: &str) -> bool {
        self.rest()
            .strip_prefix(word)
            .is_some_and(|after| !after.starts_with(is_ident_continue))
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let depth = self.depth;
        let expr = self.parse_postfix_chain();
        self.depth = depth;
        expr
    }

    fn parse_postfix_chain(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let save = self.pos;
            self.skip_trivia()?;
            let start = expr.span.start;
            let chained =
                self.optional_chain_ahead() || matches!(self.peek(), Some('.' | '[' | '('));
            if chained {
                self.enter()?;
            }
            if self.optional_chain_ahead() {
                self.pos += 2;
                expr = match self.peek() {
                    Some('(') => self.finish_call(expr, true)?,
                    Some('[') => self.finish_index(expr, true)?,
                    _ => self.finish_member(expr, true)?,
                };
            } else if self.eat('.') {
                expr = self.finish_member(expr, false)?;
            } else if self.peek() == Some('[') {
                expr = self.finish_index(expr, false)?;
            } else if self.peek() == Some('(') {
                expr = self.finish_call(expr, false)?;
            } else if self.peek() == Some('`') {
                return Err(self.error(
                    CompileErrorKind::Unsupported("Tagged templates"),
                    Span::new(start, self.pos + 1),
                ));
            } else {
                self.pos = save;
                return Ok(expr);
            }
        }
    }

    fn finish_member(&mut self, object: Expr, optional: bool) -> PResult<Expr> {
        self.skip_trivia()?;
        let property = self.parse_identifier()?;
        let span = Span::new(object.span.start, self.pos);
        Ok(Expr {
            kind: ExprKind::Member {
                object: Box::new(object),
                property,
                optional,
            },
            span,
        })
    }

    fn finish_index(&mut self, object: Expr, optional: bool) -> PResult<Expr> {
        self.bump();
        let index = self.parse_expression()?;
        self.skip_trivia()?;
        self.expect(']', "`]`")?;
        let span = Span::new(object.span.start, self.pos);
        Ok(Expr {
            kind: ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
                optional,
            },
            span,
        })
    }

    fn finish_call(&mut self, callee: Expr, optional: bool) -> PResult<Expr> {
        self.bump();
        let args = self.parse_items(')', "`)`")?;
        let span = Span::new(callee.span.start, self.pos);
        Ok(Expr {
            kind: ExprKind::Call {
                callee: Box::new(callee),
                args,
                optional,
            },
            span,
        })
    }

    /// Parses comma-separated items up to and including `close`.
    fn parse_items(&mut self, close: char, what: &'static str) -> PResult<Vec<Item>> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat(close) {
                return Ok(items);
            }
            if self.eat_str("...") {
                items.push(Item::Spread(self.parse_expression()?));
            } else {
                items.push(Item::Single(self.parse_expression()?));
            }
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect(close, what)?;
                return Ok(items);
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        self.skip_trivia()?;
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Err(self.unexpected());
        };
        let kind = match c {
            '(' => {
                self.bump();
                let inner = self.parse_expression()?;
                self.skip_trivia()?;
                self.expect(')', "`)`")?;
                ExprKind::Paren(Box::new(inner))
            }
            '[' => {
                self.bump();
                ExprKind::Array(self.parse_items(']', "`]`")?)
            }
            '{' => self.parse_object()?,
            '<' => ExprKind::Jsx(Box::new(self.parse_element()?)),
            '"' | '\'' => ExprKind::Str(self.parse_string()?),
            '`' => {
                return Err(self.error(
                    CompileErrorKind::Unsupported("Template literals"),
                    Span::new(start, start + 1),
                ));
            }
            c if c.is_ascii_digit()
                || (c == '.' && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit())) =>
            {
                ExprKind::Number(self.parse_number()?)
            }
            c if is_ident_start(c) => {
                let name = self.scan_identifier();
                match name.as_str() {
                    "true" => ExprKind::Bool(true),
                    "false" => ExprKind::Bool(false),
                    "null" => ExprKind::Null,
                    "undefined" => ExprKind::Undefined,
                    "function" => return Err(self.unsupported(start, "Function expressions")),
                    "new" => return Err(self.unsupported(start, "`new` expressions")),
                    "this" => return Err(self.unsupported(start, "`this`")),
                    "class" => return Err(self.unsupported(start, "Class expressions")),
                    _ if is_reserved(&name) => {
                        return Err(self.error(
                            CompileErrorKind::UnexpectedChar(c),
                            Span::new(start, self.pos),
                        ));
                    }
                    _ => ExprKind::Ident(name),
                }
            }
            _ => return Err(self.unexpected()),
        };
        Ok(Expr {
            kind,
            span: Span::new(start, self.pos),
        })
    }

    fn unsupported(&self, start: usize, what: &'static str) -> CompileError {
        self.error(
            CompileErrorKind::Unsupported(what),
            Span::new(start, self.pos),
        )
    }

    fn parse_object(&mut self) -> PResult<ExprKind> {
        self.bump();
        let mut props = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.eat('}') {
                break;
            }
            if self.eat_str("...") {
                props.push(Prop::Spread(self.parse_expression()?));
            } else {
                let key_start = self.pos;
                let bare = self.peek().is_some_and(is_ident_start);
                let key = match self.peek() {
                    Some('[') => {
                        self.bump();
                        let key = self.parse_expression()?;
                        self.skip_trivia()?;
                        self.expect(']', "`]`")?;
                        PropKey::Computed(key)
                    }
                    Some('"' | '\'') => PropKey::Static(self.parse_string()?),
                    Some(c) if c.is_ascii_digit() => {
                        PropKey::Static(number_to_string(self.parse_number()?))
                    }
                    Some(c) if is_ident_start(c) => PropKey::Static(self.scan_identifier()),
                    _ => return Err(self.unexpected()),
                };
                self.skip_trivia()?;
                if self.eat(':') {
                    let value = self.parse_expression()?;
                    props.push(Prop::KeyValue { key, value });
                } else if self.peek() == Some('(') {
                    return Err(self.unsupported(key_start, "Object methods"));
                } else {
                    match key {
                        PropKey::Static(name) if bare && !is_reserved(&name) => {
                            let span = Span::new(key_start, key_start + name.len());
                            let value = Expr {
                                kind: ExprKind::Ident(name.clone()),
                                span,
                            };
                            props.push(Prop::KeyValue {
                                key: PropKey::Static(name),
                                value,
                            });
                        }
                        _ => {
                            self.expect(':', "`:`")?;
                        }
                    }
                }
            }
            self.skip_trivia()?;
            if !self.eat(',') {
                self.expect('}', "`}`")?;
                break;
            }
        }
        Ok(ExprKind::Object(props))
    }

    fn parse_identifier(&mut self) -> PResult<String> {
        match self.peek() {
            Some(c) if is_ident_start(c) => Ok(self.scan_identifier()),
            _ => Err(self.unexpected()),
        }
    }

    fn scan_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn parse_number(&mut self) -> PResult<f64> {
        let start = self.pos;
        let value = if self.eat_str("0x") || self.eat_str("0X") {
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            u64::from_str_radix(&self.src[digits_start..self.pos], 16)
                .ok()
                .map(|n| n as f64)
        } else {
            self.eat_digits();
            if self.peek() == Some('.') {
                self.bump();
                self.eat_digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                self.bump();
                if !self.eat('+') {
                    self.eat('-');
                }
                if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error(
                        CompileErrorKind::InvalidNumber,
                        Span::new(start, self.pos),
                    ));
                }
                self.eat_digits();
            }
            self.src[start..self.pos].parse::<f64>().ok()
        };
        match value {
            Some(n) if !self.peek().is_some_and(is_ident_start) => Ok(n),
            _ => Err(self.error(
                CompileErrorKind::InvalidNumber,
                Span::new(start, self.pos + self.peek().map_or(0, char::len_utf8)),
            )),
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn parse_string(&mut self) -> PResult<String> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.unexpected());
        };
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(
                        CompileErrorKind::UnterminatedString,
                        Span::new(start, self.pos),
                    ));
                }
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    let escape_start = self.pos - 1;
                    let escaped = match self.bump() {
                        None => {
                            return Err(self.error(
                                CompileErrorKind::UnterminatedString,
                                Span::new(start, self.pos),
                            ));
                        }
                        Some('n') => Some('\n'),
                        Some('t') => Some('\t'),
                        Some('r') => Some('\r'),
                        Some('b') => Some('\u{8}'),
                        Some('f') => Some('\u{c}'),
                        Some('v') => Some('\u{b}'),
                        Some('0') => Some('\0'),
                        Some('x') => Some(self.parse_hex_escape(2, escape_start)?),
                        Some('u') => Some(self.parse_unicode_escape(escape_start)?),
                        Some('\r') => {
                            self.eat('\n');
                            None
                        }
                        Some('\n') => None,
                        Some(other) => Some(other),
                    };
                    if let Some(ch) = escaped {
                        value.push(ch);
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn parse_hex_escape(&mut self, digits: usize, escape_start: usize) -> PResult<char> {
        let text = self.rest().get(..digits).unwrap_or("");
        let ch = (text.len() == digits)
            .then(|| u32::from_str_radix(text, 16).ok())
            .flatten()
            .and_then(char::from_u32);
        match ch {
            Some(ch) => {
                self.pos += digits;
                Ok(ch)
            }
            None => Err(self.error(
                CompileErrorKind::InvalidEscape,
                Span::new(escape_start, self.pos),
            )),
        }
    }

    fn parse_unicode_escape(&mut self, escape_start: usize) -> PResult<char> {
        if !self.eat('{') {
            return self.parse_hex_escape(4, escape_start);
        }
        let Some(len) = self.rest().find('}') else {
            return Err(self.error(
                CompileErrorKind::InvalidEscape,
                Span::new(escape_start, self.pos),
            ));
        };
        let ch = u32::from_str_radix(&self.rest()[..len], 16)
            .ok()
            .and_then(char::from_u32);
        self.pos += len + 1;
        ch.ok_or_else(|| {
            self.error(
                CompileErrorKind::InvalidEscape,
                Span::new(escape_start, self.pos),
            )
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "true"
            | "false"
            | "null"
            | "undefined"
            | "typeof"
            | "function"
            | "new"
            | "this"
            | "class"
            | "return"
            | "var"
            | "let"
            | "const"
            | "if"
            | "else"
            | "for"
            | "while"
            | "do"
            | "in"
            | "instanceof"
            | "delete"
            | "void"
            | "yield"
            | "await"
            | "import"
            | "export"
            | "switch"
            | "case"
            | "default"
            | "break"
            | "continue"
            | "throw"
            | "try"
            | "catch"
            | "finally"
            | "with"
            | "debugger"
            | "super"
    )
}

/// Decodes HTML character references the way JSX does.
///
/// Unknown or malformed references are left untouched.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .get(1..tail.len().min(12))
            .and_then(|window| window.find(';'))
            .and_then(|semi| {
                let name = &tail[1..1 + semi];
                decode_entity(name).map(|ch| (ch, semi + 2))
            });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "middot" => '\u{b7}',
        "bull" => '\u{2022}',
        "times" => '\u{d7}',
        "deg" => '\u{b0}',
        _ => return None,
    };
    Some(ch)
}

/// Collapses JSX text whitespace.
///
/// Tabs count as spaces. Every line but the first loses its leading spaces,
/// every line but the last loses its trailing spaces, blank lines vanish, and
/// the survivors are joined with a single space.
pub(crate) fn clean_jsx_text(text: &str) -> String {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last = lines.len().saturating_sub(1);
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| c != ' ' && c != '\t'));

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let line = line.replace('\t', " ");
        let mut trimmed = line.as_str();
        if i != 0 {
            trimmed = trimmed.trim_start_matches(' ');
        }
        if i != last {
            trimmed = trimmed.trim_end_matches(' ');
        }
        if trimmed.is_empty() {
            continue;
        }
        out.push_str(trimmed);
        if Some(i) != last_non_empty {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{MAX_NESTING_DEPTH, clean_jsx_text, decode_entities, parse_document};
    use crate::ast::{Attr, AttrValue, Child, ElementName, ExprKind};
    use crate::error::CompileErrorKind;

    #[test]
    fn whitespace_cleaning_matches_jsx() {
        assert_eq!(clean_jsx_text("  hello  "), "  hello  ");
        assert_eq!(clean_jsx_text("\n    hello\n    world\n  "), "hello world");
        assert_eq!(clean_jsx_text("\n   \n"), "");
        assert_eq!(clean_jsx_text("a\t\n\tb"), "a b");
    }

    #[test]
    fn entities_decode() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;&nbsp;"), "AB\u{a0}");
        assert_eq!(decode_entities("&bogus; & alone"), "&bogus; & alone");
    }

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = parse_document(r#"<Card title="Hi" wide {...rest}><p>x</p></Card>"#).unwrap();
        assert_eq!(doc.len(), 1);
        let Child::Element(card) = &doc[0] else {
            panic!("expected element");
        };
        assert_eq!(card.name, Some(ElementName::Ident(String::from("Card"))));
        assert_eq!(card.attrs.len(), 3);
        assert!(matches!(
            &card.attrs[0],
            Attr::Named { name, value: Some(AttrValue::Str { value, .. }), .. }
                if name == "title" && value == "Hi"
        ));
        assert!(matches!(&card.attrs[1], Attr::Named { value: None, .. }));
        assert!(matches!(&card.attrs[2], Attr::Spread { .. }));
        assert_eq!(card.children.len(), 1);
    }

    #[test]
    fn member_tag_names() {
        let doc = parse_document("<Foo.Bar />").unwrap();
        let Child::Element(el) = &doc[0] else {
            panic!("expected element");
        };
        assert!(matches!(&el.name, Some(ElementName::Member(parts)) if parts.len() == 2));
        assert!(el.self_closing);
    }

    #[test]
    fn closing_tag_must_match() {
        let err = parse_document("<div>\n  <h1>Title</h2>\n</div>").unwrap_err();
        assert_eq!(
            err.kind,
            CompileErrorKind::MismatchedClosingTag {
                expected: String::from("h1"),
                found: String::from("h2"),
            }
        );
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 11);
    }

    #[test]
    fn bare_gt_in_text_is_rejected() {
        let err = parse_document("<p>a > b</p>").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::BareTextChar('>'));
        assert_eq!(err.span.start, 5);
    }

    #[test]
    fn unterminated_element_reports_opening_tag() {
        let err = parse_document("<div>\n  <span>").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnterminatedJsx);
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn expression_precedence() {
        let doc = parse_document("{a || b && c ? 1 + 2 * 3 : x => x.y?.[0]}").unwrap();
        let Child::Container { expr: Some(expr), .. } = &doc[0] else {
            panic!("expected container");
        };
        let ExprKind::Conditional { test, alternate, .. } = &expr.kind else {
            panic!("expected conditional, got {:?}", expr.kind);
        };
        assert!(matches!(test.kind, ExprKind::Logical { .. }));
        assert!(matches!(alternate.kind, ExprKind::Arrow { .. }));
    }

    #[test]
    fn parenthesised_arrow_params() {
        let doc = parse_document("{items.map((item, i) => <li key={i}>{item}</li>)}").unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn comments_and_empty_containers() {
        let doc = parse_document("{/* note */}<b /* inline */ a='1' />{ // line\n x }").unwrap();
        assert_eq!(doc.len(), 3);
        assert!(matches!(doc[0], Child::Container { expr: None, .. }));
    }

    #[test]
    fn nesting_is_bounded() {
        let mut src = String::new();
        for _ in 0..300 {
            src.push_str("<a>");
        }
        let err = parse_document(&src).unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::NestingTooDeep(_)));
    }

    #[test]
    fn left_nested_chains_count_towards_nesting() {
        let within = alloc::format!("{{x{}}}", " * x".repeat(MAX_NESTING_DEPTH / 2));
        assert!(parse_document(&within).is_ok());

        let beyond = alloc::format!("{{x{}}}", "[0]".repeat(MAX_NESTING_DEPTH + 1));
        let err = parse_document(&beyond).unwrap_err();
        assert!(matches!(err.kind, CompileErrorKind::NestingTooDeep(_)));
    }

    #[test]
    fn stray_closing_tag() {
        let err = parse_document("text</p>").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnexpectedClosingTag);
    }

    #[test]
    fn string_escapes() {
        let doc = parse_document(r#"{"a\nA\u{1F600}\x41\'"}"#).unwrap();
        let Child::Container { expr: Some(expr), .. } = &doc[0] else {
            panic!("expected container");
        };
        assert_eq!(expr.kind, ExprKind::Str(String::from("a\nA\u{1F600}A'")));
    }

    #[test]
    fn numbers() {
        for (src, want) in [("{0x1F}", 31.0), ("{1.5e2}", 150.0), ("{.25}", 0.25)] {
            let doc = parse_document(src).unwrap();
            let Child::Container { expr: Some(expr), .. } = &doc[0] else {
                panic!("expected container");
            };
            assert_eq!(expr.kind, ExprKind::Number(want));
        }
        assert_eq!(
            parse_document("{3px}").unwrap_err().kind,
            CompileErrorKind::InvalidNumber
        );
    }
}
