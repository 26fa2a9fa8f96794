// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parse tree.
//!
//! Every node keeps the span it was parsed from; the formatter re-prints
//! expressions and attribute values verbatim from those spans.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Child {
    /// Raw JSX text. `value` is entity-decoded and whitespace-cleaned, and may
    /// be empty.
    Text { raw: Span, value: String },
    Element(Element),
    /// `{expr}`; `expr` is `None` for `{}` and comment-only containers.
    Container { expr: Option<Expr>, span: Span },
}

impl Child {
    /// Whitespace-only text or an empty container.
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            Self::Text { value, .. } => value
                .chars()
                .all(|c| matches!(c, ' ' | '\t' | '\n' | '\r')),
            Self::Element(_) => false,
            Self::Container { expr, .. } => expr.is_none(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ElementName {
    /// `div`, `my-tag`, `Button`.
    Ident(String),
    /// `Foo.Bar.Baz`, each segment with its span.
    Member(Vec<(String, Span)>),
}

impl ElementName {
    pub(crate) fn is_intrinsic(&self) -> bool {
        match self {
            Self::Ident(name) => {
                name.contains('-') || name.starts_with(|c: char| c.is_ascii_lowercase())
            }
            Self::Member(_) => false,
        }
    }

    pub(crate) fn text(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Member(parts) => {
                let mut out = String::new();
                for (i, (part, _)) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(part);
                }
                out
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Element {
    /// `None` for a `<>` fragment.
    pub(crate) name: Option<ElementName>,
    pub(crate) name_span: Span,
    pub(crate) attrs: Vec<Attr>,
    pub(crate) children: Vec<Child>,
    pub(crate) self_closing: bool,
    pub(crate) span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Attr {
    Named {
        name: String,
        value: Option<AttrValue>,
        span: Span,
    },
    Spread {
        expr: Expr,
        span: Span,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AttrValue {
    /// Quoted string; `value` is entity-decoded, `raw` includes the quotes.
    Str { value: String, raw: Span },
    /// `{expr}`; `span` includes the braces.
    Expr { expr: Expr, span: Span },
    Element(Element),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Expr {
    pub(crate) kind: ExprKind,
    pub(crate) span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ExprKind {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    Array(Vec<Item>),
    Object(Vec<Prop>),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Item>,
        optional: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Arrow {
        params: Vec<(String, Span)>,
        body: Box<Expr>,
    },
    Paren(Box<Expr>),
    Jsx(Box<Element>),
}

/// An array element or call argument.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Item {
    Single(Expr),
    Spread(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Prop {
    KeyValue { key: PropKey, value: Expr },
    Spread(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PropKey {
    Static(String),
    Computed(Expr),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum LogicalOp {
    And,
    Or,
    Nullish,
}
