// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lowering from the parse tree to an evaluable program.
//!
//! Names are resolved here: arrow parameters become `(depth, index)` slots
//! and everything else becomes an entry in the program's global table, which
//! the evaluator looks up in the scope on first use.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::ast::{
    Attr, AttrValue, BinaryOp, Child, Element, ElementName, Expr, ExprKind, Item, LogicalOp,
    Prop, PropKey, UnaryOp,
};
use crate::error::CompileError;
use crate::parser::parse_document;
use crate::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub(crate) op: Op,
    pub(crate) span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Local { depth: usize, index: usize },
    Global(usize),
    Array(Vec<Arg>),
    Object(Vec<ObjectProp>),
    Member {
        object: Box<Node>,
        property: Rc<str>,
        optional: bool,
    },
    Index {
        object: Box<Node>,
        index: Box<Node>,
        optional: bool,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Arg>,
        optional: bool,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    Lambda(Rc<Lambda>),
    Element(Box<ElementNode>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Arg {
    Single(Node),
    Spread(Node),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ObjectProp {
    Static(Rc<str>, Node),
    Computed(Node, Node),
    Spread(Node),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Lambda {
    pub(crate) arity: usize,
    pub(crate) body: Node,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ElementNode {
    pub(crate) ty: ElementTypeNode,
    pub(crate) attrs: Vec<AttrNode>,
    pub(crate) children: Vec<Node>,
    pub(crate) span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ElementTypeNode {
    Intrinsic(Rc<str>),
    Fragment,
    Expr(Node),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AttrNode {
    Prop(Rc<str>, Node),
    Spread(Node),
}

#[derive(Debug, PartialEq)]
pub(crate) struct Program {
    pub(crate) source: Rc<str>,
    pub(crate) globals: Vec<Rc<str>>,
    pub(crate) root: ElementNode,
}

/// A compiled source, ready to evaluate.
///
/// Cheap to clone. Equality is structural: compiling the same text twice
/// yields equal artifacts. Use [`Artifact::ptr_eq`] when identity matters,
/// for example to tell whether a new compile happened.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub(crate) program: Rc<Program>,
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.program == other.program
    }
}

impl Artifact {
    /// Returns `true` if both handles refer to the same compile result.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.program, &other.program)
    }

    /// Returns `true` if the source had no content and renders nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.program.root.children.is_empty()
    }

    /// The text this artifact was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.program.source
    }

    /// Free names the source refers to, in order of first use.
    pub fn globals(&self) -> impl Iterator<Item = &str> + '_ {
        self.program.globals.iter().map(|g| &**g)
    }
}

/// Compiles markup into an [`Artifact`].
///
/// The source is treated as the body of a fragment. Empty or
/// whitespace-only input yields an empty artifact rather than an error.
pub fn compile(source: &str) -> Result<Artifact, CompileError> {
    let children = parse_document(source)?;
    let mut lowerer = Lowerer::default();
    let children = if children.iter().all(Child::is_blank) {
        Vec::new()
    } else {
        lowerer.children(&children)
    };
    let program = Program {
        source: Rc::from(source),
        globals: lowerer.globals,
        root: ElementNode {
            ty: ElementTypeNode::Fragment,
            attrs: Vec::new(),
            children,
            span: Span::new(0, source.len()),
        },
    };
    log::trace!(
        "compiled {} bytes, {} free names",
        source.len(),
        program.globals.len()
    );
    Ok(Artifact {
        program: Rc::new(program),
    })
}

/// Returns `true` if `source` compiles.
#[must_use]
pub fn validate(source: &str) -> bool {
    parse_document(source).is_ok()
}

#[derive(Default)]
struct Lowerer {
    globals: Vec<Rc<str>>,
    global_ids: HashMap<Rc<str>, usize>,
    frames: Vec<SmallVec<[Rc<str>; 4]>>,
}

impl Lowerer {
    fn resolve(&mut self, name: &str) -> Op {
        for (depth, frame) in self.frames.iter().rev().enumerate() {
            if let Some(index) = frame.iter().rposition(|p| &**p == name) {
                return Op::Local { depth, index };
            }
        }
        if let Some(&id) = self.global_ids.get(name) {
            return Op::Global(id);
        }
        let name: Rc<str> = Rc::from(name);
        let id = self.globals.len();
        self.globals.push(name.clone());
        self.global_ids.insert(name, id);
        Op::Global(id)
    }

    fn children(&mut self, children: &[Child]) -> Vec<Node> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Child::Text { raw, value } => {
                    if !value.is_empty() {
                        out.push(Node {
                            op: Op::Str(Rc::from(value.as_str())),
                            span: *raw,
                        });
                    }
                }
                Child::Element(el) => out.push(self.element_node(el)),
                Child::Container { expr: Some(e), .. } => out.push(self.expr(e)),
                Child::Container { expr: None, .. } => {}
            }
        }
        out
    }

    fn element_node(&mut self, el: &Element) -> Node {
        Node {
            op: Op::Element(Box::new(self.element(el))),
            span: el.span,
        }
    }

    fn element(&mut self, el: &Element) -> ElementNode {
        let ty = match &el.name {
            None => ElementTypeNode::Fragment,
            Some(name) if name.is_intrinsic() => {
                ElementTypeNode::Intrinsic(Rc::from(name.text().as_str()))
            }
            Some(ElementName::Ident(name)) => ElementTypeNode::Expr(Node {
                op: self.resolve(name),
                span: el.name_span,
            }),
            Some(ElementName::Member(parts)) => {
                let mut iter = parts.iter();
                let mut node = match iter.next() {
                    Some((first, span)) => Node {
                        op: self.resolve(first),
                        span: *span,
                    },
                    None => Node {
                        op: Op::Undefined,
                        span: el.name_span,
                    },
                };
                for (part, span) in iter {
                    let whole = node.span.to(*span);
                    node = Node {
                        op: Op::Member {
                            object: Box::new(node),
                            property: Rc::from(part.as_str()),
                            optional: false,
                        },
                        span: whole,
                    };
                }
                ElementTypeNode::Expr(node)
            }
        };
        let attrs = el
            .attrs
            .iter()
            .map(|attr| match attr {
                Attr::Named { name, value, span } => {
                    let value = match value {
                        None => Node {
                            op: Op::Bool(true),
                            span: *span,
                        },
                        Some(AttrValue::Str { value, raw }) => Node {
                            op: Op::Str(Rc::from(value.as_str())),
                            span: *raw,
                        },
                        Some(AttrValue::Expr { expr, .. }) => self.expr(expr),
                        Some(AttrValue::Element(el)) => self.element_node(el),
                    };
                    AttrNode::Prop(Rc::from(name.as_str()), value)
                }
                Attr::Spread { expr, .. } => AttrNode::Spread(self.expr(expr)),
            })
            .collect();
        let children = self.children(&el.children);
        ElementNode {
            ty,
            attrs,
            children,
            span: el.span,
        }
    }

    fn items(&mut self, items: &[Item]) -> Vec<Arg> {
        items
            .iter()
            .map(|item| match item {
                Item::Single(e) => Arg::Single(self.expr(e)),
                Item::Spread(e) => Arg::Spread(self.expr(e)),
            })
            .collect()
    }

    fn boxed(&mut self, e: &Expr) -> Box<Node> {
        Box::new(self.expr(e))
    }

    fn expr(&mut self, e: &Expr) -> Node {
        let op = match &e.kind {
            ExprKind::Undefined => Op::Undefined,
            ExprKind::Null => Op::Null,
            ExprKind::Bool(b) => Op::Bool(*b),
            ExprKind::Number(n) => Op::Number(*n),
            ExprKind::Str(s) => Op::Str(Rc::from(s.as_str())),
            ExprKind::Ident(name) => self.resolve(name),
            ExprKind::Array(items) => Op::Array(self.items(items)),
            ExprKind::Object(props) => Op::Object(
                props
                    .iter()
                    .map(|prop| match prop {
                        Prop::KeyValue {
                            key: PropKey::Static(k),
                            value,
                        } => ObjectProp::Static(Rc::from(k.as_str()), self.expr(value)),
                        Prop::KeyValue {
                            key: PropKey::Computed(k),
                            value,
                        } => ObjectProp::Computed(self.expr(k), self.expr(value)),
                        Prop::Spread(e) => ObjectProp::Spread(self.expr(e)),
                    })
                    .collect(),
            ),
            ExprKind::Member {
                object,
                property,
                optional,
            } => Op::Member {
                object: self.boxed(object),
                property: Rc::from(property.as_str()),
                optional: *optional,
            },
            ExprKind::Index {
                object,
                index,
                optional,
            } => Op::Index {
                object: self.boxed(object),
                index: self.boxed(index),
                optional: *optional,
            },
            ExprKind::Call {
                callee,
                args,
                optional,
            } => Op::Call {
                callee: self.boxed(callee),
                args: self.items(args),
                optional: *optional,
            },
            ExprKind::Unary { op, operand } => Op::Unary {
                op: *op,
                operand: self.boxed(operand),
            },
            ExprKind::Binary { op, lhs, rhs } => Op::Binary {
                op: *op,
                lhs: self.boxed(lhs),
                rhs: self.boxed(rhs),
            },
            ExprKind::Logical { op, lhs, rhs } => Op::Logical {
                op: *op,
                lhs: self.boxed(lhs),
                rhs: self.boxed(rhs),
            },
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => Op::Conditional {
                test: self.boxed(test),
                consequent: self.boxed(consequent),
                alternate: self.boxed(alternate),
            },
            ExprKind::Arrow { params, body } => {
                self.frames
                    .push(params.iter().map(|(p, _)| Rc::from(p.as_str())).collect());
                let body = self.expr(body);
                self.frames.pop();
                Op::Lambda(Rc::new(Lambda {
                    arity: params.len(),
                    body,
                }))
            }
            ExprKind::Paren(inner) => return self.expr(inner),
            ExprKind::Jsx(el) => Op::Element(Box::new(self.element(el))),
        };
        Node { op, span: e.span }
    }
}
