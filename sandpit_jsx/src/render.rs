// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expanding element values into a tree of tags and text.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::error::RenderError;
use crate::value::{ElementType, Object, Value};

/// Deepest element nesting, counting component expansions, that
/// [`render`] accepts.
pub const MAX_RENDER_DEPTH: usize = 256;

/// Output of [`render`]: only intrinsic tags and text remain.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderNode {
    /// A run of text.
    Text(String),
    /// An intrinsic tag.
    Element {
        /// Tag name.
        tag: Rc<str>,
        /// Attributes in source order, `children` and `false`/nullish
        /// values excluded.
        attrs: Vec<(Rc<str>, Value)>,
        /// Rendered children.
        children: Vec<Self>,
    },
    /// The top-level sequence.
    Fragment(Vec<Self>),
}

impl RenderNode {
    /// Returns `true` if nothing would be shown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Fragment(nodes) if nodes.is_empty())
    }

    /// Concatenated text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(t),
            Self::Element { children, .. } | Self::Fragment(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

/// Renders the tree as markup, escaping text and attribute values.
impl fmt::Display for RenderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => write_escaped(f, t, false),
            Self::Fragment(nodes) => nodes.iter().try_for_each(|n| write!(f, "{n}")),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                write!(f, "<{tag}")?;
                for (name, value) in attrs {
                    match value {
                        Value::Bool(true) => write!(f, " {name}")?,
                        _ => {
                            write!(f, " {name}=\"")?;
                            write_escaped(f, &value.to_string(), true)?;
                            f.write_str("\"")?;
                        }
                    }
                }
                if children.is_empty() {
                    return f.write_str(" />");
                }
                f.write_str(">")?;
                for child in children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{tag}>")
            }
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str, attr: bool) -> fmt::Result {
    for c in s.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '"' if attr => f.write_str("&quot;")?,
            c => fmt::Write::write_char(f, c)?,
        }
    }
    Ok(())
}

/// Expands a value, typically the result of
/// [`evaluate`](crate::evaluate), into a [`RenderNode::Fragment`].
///
/// Component elements are called with their props object until only tags
/// and text remain. `null`, `undefined`, and booleans render nothing; arrays
/// flatten.
pub fn render(value: &Value) -> Result<RenderNode, RenderError> {
    let mut nodes = Vec::new();
    render_into(value, 0, &mut nodes)?;
    Ok(RenderNode::Fragment(nodes))
}

fn render_into(value: &Value, depth: usize, out: &mut Vec<RenderNode>) -> Result<(), RenderError> {
    if depth > MAX_RENDER_DEPTH {
        return Err(RenderError::DepthExceeded {
            limit: MAX_RENDER_DEPTH,
        });
    }
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) => Ok(()),
        Value::Number(_) | Value::String(_) => {
            out.push(RenderNode::Text(value.to_string()));
            Ok(())
        }
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| render_into(item, depth, out)),
        Value::Object(_) | Value::Function(_) => Err(RenderError::InvalidChild {
            found: value.type_of(),
        }),
        Value::Element(el) => match &el.ty {
            ElementType::Fragment => render_children(&el.props, depth + 1, out),
            ElementType::Intrinsic(tag) => {
                let mut children = Vec::new();
                render_children(&el.props, depth + 1, &mut children)?;
                let attrs = el
                    .props
                    .iter()
                    .filter(|(name, v)| {
                        *name != "children"
                            && !matches!(v, Value::Undefined | Value::Null | Value::Bool(false))
                            && !matches!(v, Value::Function(_))
                    })
                    .map(|(name, v)| (Rc::from(name), v.clone()))
                    .collect();
                out.push(RenderNode::Element {
                    tag: tag.clone(),
                    attrs,
                    children,
                });
                Ok(())
            }
            ElementType::Component(Value::Function(f)) => {
                log::trace!("expanding component {}", f.name());
                let rendered = f.call(&[Value::Object(el.props.clone())])?;
                render_into(&rendered, depth + 1, out)
            }
            ElementType::Component(other) => Err(RenderError::InvalidElementType {
                found: other.type_of(),
            }),
        },
    }
}

fn render_children(
    props: &Object,
    depth: usize,
    out: &mut Vec<RenderNode>,
) -> Result<(), RenderError> {
    match props.get("children") {
        Some(children) => render_into(children, depth, out),
        None => Ok(()),
    }
}

/// Convenience for tests and tooling: a single text node.
impl From<&str> for RenderNode {
    fn from(text: &str) -> Self {
        Self::Text(String::from(text))
    }
}

impl Default for RenderNode {
    fn default() -> Self {
        Self::Fragment(vec![])
    }
}
