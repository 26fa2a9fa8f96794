// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::error::EvalError;
use crate::eval::{self, Closure};

/// A runtime value.
///
/// Composite values are reference counted and immutable, so cloning is cheap.
/// [`PartialEq`] compares structurally; [`Value::strict_equals`] implements
/// `===`, which compares composites by identity.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// `undefined`.
    #[default]
    Undefined,
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Any number.
    Number(f64),
    /// A string.
    String(Rc<str>),
    /// An array.
    Array(Rc<[Value]>),
    /// A plain object.
    Object(Rc<Object>),
    /// Something callable.
    Function(Function),
    /// The result of evaluating a JSX element.
    Element(Rc<Element>),
}

impl Value {
    /// Builds a string value.
    #[must_use]
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Rc::from(s.as_ref()))
    }

    /// Builds an array value.
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// Returns `true` for `null` and `undefined`.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// JavaScript truthiness.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) | Self::Element(_) => true,
        }
    }

    /// The `typeof` name.
    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Function(_) => "function",
            Self::Null | Self::Array(_) | Self::Object(_) | Self::Element(_) => "object",
        }
    }

    /// JavaScript `Number(value)`.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
            Self::Array(items) => match &items[..] {
                [] => 0.0,
                [single] => Self::string(single.to_string()).to_number(),
                _ => f64::NAN,
            },
            Self::Object(_) | Self::Function(_) | Self::Element(_) => f64::NAN,
        }
    }

    /// `===`.
    #[must_use]
    pub fn strict_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Element(a), Self::Element(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`.
    #[must_use]
    pub fn loose_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Self::Number(_), Self::String(_)) | (Self::String(_), Self::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Self::Bool(_), _) => Self::Number(self.to_number()).loose_equals(other),
            (_, Self::Bool(_)) => self.loose_equals(&Self::Number(other.to_number())),
            _ => self.strict_equals(other),
        }
    }

    /// `SameValueZero`, used by `includes`.
    pub(crate) fn same_value_zero(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Element(a), Self::Element(b)) => a == b,
            _ => self.strict_equals(other),
        }
    }
}

/// JavaScript `String(value)`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&number_to_string(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Self::Object(_) | Self::Element(_) => f.write_str("[object Object]"),
            Self::Function(func) => write!(f, "function {}() {{ [native code] }}", func.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Rc::from(s))
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items.into())
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(Rc::new(object))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

/// Formats a number the way JavaScript's `String(n)` does for common values.
#[must_use]
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        String::from("NaN")
    } else if n.is_infinite() {
        String::from(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        String::from("0")
    } else {
        format!("{n}")
    }
}

fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    // Rust also accepts `inf`/`nan` spellings that JavaScript does not.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// An insertion-ordered string-keyed map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    entries: Vec<(Rc<str>, Value)>,
}

impl Object {
    /// An empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    /// Sets a property, keeping its original position if it already existed.
    pub fn insert(&mut self, key: impl Into<Rc<str>>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Removes a property.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Returns `true` if the property exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }
}

impl<K: Into<Rc<str>>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut object = Self::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

/// Signature of host-provided functions.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, EvalError>;

/// A callable value: a host function, an arrow function from the source, or
/// the built-in fragment marker.
#[derive(Clone)]
pub struct Function(FunctionKind);

#[derive(Clone)]
enum FunctionKind {
    Native { name: Rc<str>, f: Rc<NativeFn> },
    Closure(Rc<Closure>),
    Fragment,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            FunctionKind::Native { name, .. } => write!(f, "Function({name})"),
            FunctionKind::Closure(_) => f.write_str("Function(<arrow>)"),
            FunctionKind::Fragment => f.write_str("Function(Fragment)"),
        }
    }
}

impl Function {
    /// Wraps a host function.
    ///
    /// Host components receive a single props object argument.
    pub fn native(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Self(FunctionKind::Native {
            name: name.into(),
            f: Rc::new(f),
        })
    }

    /// The fragment marker, exposed to sources as `Fragment` and
    /// `React.Fragment`.
    #[must_use]
    pub fn fragment() -> Self {
        Self(FunctionKind::Fragment)
    }

    pub(crate) fn closure(closure: Closure) -> Self {
        Self(FunctionKind::Closure(Rc::new(closure)))
    }

    /// Returns `true` for the fragment marker.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        matches!(self.0, FunctionKind::Fragment)
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.0 {
            FunctionKind::Native { name, .. } => name,
            FunctionKind::Closure(_) => "",
            FunctionKind::Fragment => "Fragment",
        }
    }

    /// Identity comparison.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (FunctionKind::Native { f: a, .. }, FunctionKind::Native { f: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            (FunctionKind::Closure(a), FunctionKind::Closure(b)) => Rc::ptr_eq(a, b),
            (FunctionKind::Fragment, FunctionKind::Fragment) => true,
            _ => false,
        }
    }

    /// Calls the function.
    ///
    /// Arrow functions run in the scope of the artifact that created them.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        self.call_at_depth(args, 0)
    }

    pub(crate) fn call_at_depth(&self, args: &[Value], depth: usize) -> Result<Value, EvalError> {
        match &self.0 {
            FunctionKind::Native { f, .. } => f(args),
            FunctionKind::Closure(closure) => eval::call_closure(closure, args, depth),
            FunctionKind::Fragment => Ok(fragment_children(args)),
        }
    }
}

fn fragment_children(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Object(props)) => props.get("children").cloned().unwrap_or_default(),
        _ => Value::Undefined,
    }
}

/// What an element renders as.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A host tag such as `div`.
    Intrinsic(Rc<str>),
    /// `<>`, `<Fragment>`, or `<React.Fragment>`.
    Fragment,
    /// Whatever the tag name resolved to; callable values are components.
    Component(Value),
}

/// The value of a JSX element expression.
///
/// Creating one never runs a component; that happens in
/// [`render`](crate::render).
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    /// Element type.
    pub ty: ElementType,
    /// The `key` attribute, lifted out of `props`.
    pub key: Option<Value>,
    /// Attributes plus `children`.
    pub props: Rc<Object>,
}

impl Element {
    /// The `children` prop: a single value, an array, or `None`.
    #[must_use]
    pub fn children(&self) -> Option<&Value> {
        self.props.get("children")
    }
}
