// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sandboxed evaluation of compiled artifacts.
//!
//! Evaluation sees exactly the host [`Scope`] plus `Fragment` and
//! `React.Fragment`. JSX becomes [`Element`] values; components are not
//! called here.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::ast::{BinaryOp, LogicalOp, UnaryOp};
use crate::builtins;
use crate::compile::{
    Arg, Artifact, AttrNode, ElementNode, ElementTypeNode, Lambda, Node, ObjectProp, Op, Program,
};
use crate::error::EvalError;
use crate::scope::Scope;
use crate::span::Span;
use crate::value::{Element, ElementType, Function, Object, Value};

/// Deepest function-call nesting before evaluation gives up.
pub const MAX_CALL_DEPTH: usize = 256;

/// Evaluates an artifact against a scope.
///
/// The result is always a fragment element whose children are the top-level
/// children of the source. Errors are reported with the span of the
/// offending expression; nothing outside `scope` is reachable.
pub fn evaluate(artifact: &Artifact, scope: &Scope) -> Result<Value, EvalError> {
    let mut interp = Interpreter {
        program: &artifact.program,
        scope,
        depth: 0,
    };
    interp.element(&artifact.program.root, &None)
}

struct Frame {
    values: SmallVec<[Value; 4]>,
    parent: Env,
}

type Env = Option<Rc<Frame>>;

/// An arrow function value with its captured environment.
pub(crate) struct Closure {
    lambda: Rc<Lambda>,
    env: Env,
    program: Rc<Program>,
    scope: Scope,
}

pub(crate) fn call_closure(
    closure: &Closure,
    args: &[Value],
    depth: usize,
) -> Result<Value, EvalError> {
    let mut interp = Interpreter {
        program: &closure.program,
        scope: &closure.scope,
        depth,
    };
    interp.enter_closure(closure, args)
}

fn runtime_global(name: &str) -> Option<Value> {
    match name {
        "Fragment" => Some(Value::Function(Function::fragment())),
        "React" => {
            let mut react = Object::new();
            react.insert("Fragment", Value::Function(Function::fragment()));
            Some(Value::from(react))
        }
        _ => None,
    }
}

pub(crate) struct Interpreter<'a> {
    program: &'a Rc<Program>,
    scope: &'a Scope,
    depth: usize,
}

impl Interpreter<'_> {
    fn source_text(&self, span: Span) -> &str {
        span.slice(&self.program.source)
    }

    fn type_error(message: String, span: Span) -> EvalError {
        EvalError::Type { message, span }
    }

    fn lookup_global(&self, id: usize) -> Option<(Rc<str>, Option<Value>)> {
        let name = self.program.globals.get(id)?.clone();
        let value = self
            .scope
            .get(&name)
            .cloned()
            .or_else(|| runtime_global(&name));
        Some((name, value))
    }

    fn global(&self, id: usize, span: Span) -> Result<Value, EvalError> {
        match self.lookup_global(id) {
            Some((_, Some(value))) => Ok(value),
            Some((name, None)) => Err(EvalError::Reference {
                name: name.to_string(),
                span,
            }),
            None => Err(EvalError::Reference {
                name: self.source_text(span).to_string(),
                span,
            }),
        }
    }

    fn local(env: &Env, depth: usize, index: usize) -> Value {
        let mut frame = env.as_ref();
        for _ in 0..depth {
            frame = frame.and_then(|f| f.parent.as_ref());
        }
        frame
            .and_then(|f| f.values.get(index))
            .cloned()
            .unwrap_or_default()
    }

    fn eval(&mut self, node: &Node, env: &Env) -> Result<Value, EvalError> {
        match &node.op {
            Op::Undefined => Ok(Value::Undefined),
            Op::Null => Ok(Value::Null),
            Op::Bool(b) => Ok(Value::Bool(*b)),
            Op::Number(n) => Ok(Value::Number(*n)),
            Op::Str(s) => Ok(Value::String(s.clone())),
            Op::Local { depth, index } => Ok(Self::local(env, *depth, *index)),
            Op::Global(id) => self.global(*id, node.span),
            Op::Array(items) => Ok(Value::Array(self.args(items, env)?.into())),
            Op::Object(props) => self.object(props, env),
            Op::Member { .. } | Op::Index { .. } | Op::Call { .. } => {
                Ok(self.chain(node, env)?.unwrap_or_default())
            }
            Op::Unary { op, operand } => self.unary(*op, operand, env),
            Op::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs, env)?;
                let r = self.eval(rhs, env)?;
                Ok(binary(*op, &l, &r))
            }
            Op::Logical { op, lhs, rhs } => {
                let l = self.eval(lhs, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !l.truthy(),
                    LogicalOp::Or => l.truthy(),
                    LogicalOp::Nullish => !l.is_nullish(),
                };
                if short_circuit {
                    Ok(l)
                } else {
                    self.eval(rhs, env)
                }
            }
            Op::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            Op::Lambda(lambda) => Ok(Value::Function(Function::closure(Closure {
                lambda: lambda.clone(),
                env: env.clone(),
                program: self.program.clone(),
                scope: self.scope.clone(),
            }))),
            Op::Element(el) => self.element(el, env),
        }
    }

    fn args(&mut self, args: &[Arg], env: &Env) -> Result<Vec<Value>, EvalError> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Single(node) => out.push(self.eval(node, env)?),
                Arg::Spread(node) => match self.eval(node, env)? {
                    Value::Array(items) => out.extend(items.iter().cloned()),
                    Value::String(s) => out.extend(s.chars().map(|c| Value::string(c.to_string()))),
                    other => {
                        return Err(Self::type_error(
                            format!("{} is not iterable", describe(&other)),
                            node.span,
                        ));
                    }
                },
            }
        }
        Ok(out)
    }

    fn object(&mut self, props: &[ObjectProp], env: &Env) -> Result<Value, EvalError> {
        let mut object = Object::new();
        for prop in props {
            match prop {
                ObjectProp::Static(key, node) => {
                    let value = self.eval(node, env)?;
                    object.insert(key.clone(), value);
                }
                ObjectProp::Computed(key, node) => {
                    let key = self.eval(key, env)?.to_string();
                    let value = self.eval(node, env)?;
                    object.insert(key.as_str(), value);
                }
                ObjectProp::Spread(node) => spread_into(&mut object, self.eval(node, env)?),
            }
        }
        Ok(Value::from(object))
    }

    fn unary(&mut self, op: UnaryOp, operand: &Node, env: &Env) -> Result<Value, EvalError> {
        if op == UnaryOp::TypeOf {
            // `typeof missing` is "undefined", not a reference error.
            if let Op::Global(id) = operand.op
                && let Some((_, None)) = self.lookup_global(id)
            {
                return Ok(Value::from("undefined"));
            }
            return Ok(Value::from(self.eval(operand, env)?.type_of()));
        }
        let value = self.eval(operand, env)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.truthy()),
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::from(value.type_of()),
        })
    }

    /// Evaluates a member/index/call chain; `None` means an optional link
    /// short-circuited.
    fn chain(&mut self, node: &Node, env: &Env) -> Result<Option<Value>, EvalError> {
        match &node.op {
            Op::Member {
                object,
                property,
                optional,
            } => {
                let Some(obj) = self.chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && obj.is_nullish() {
                    return Ok(None);
                }
                Self::property(&obj, property, node.span).map(Some)
            }
            Op::Index {
                object,
                index,
                optional,
            } => {
                let Some(obj) = self.chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && obj.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval(index, env)?.to_string();
                Self::property(&obj, &key, node.span).map(Some)
            }
            Op::Call {
                callee,
                args,
                optional,
            } => self.call(callee, args, *optional, node.span, env),
            _ => self.eval(node, env).map(Some),
        }
    }

    fn call(
        &mut self,
        callee: &Node,
        args: &[Arg],
        optional: bool,
        span: Span,
        env: &Env,
    ) -> Result<Option<Value>, EvalError> {
        if let Op::Member {
            object,
            property,
            optional: member_optional,
        } = &callee.op
        {
            let Some(receiver) = self.chain(object, env)? else {
                return Ok(None);
            };
            if *member_optional && receiver.is_nullish() {
                return Ok(None);
            }
            let f = if builtins::has_method(&receiver, property) {
                None
            } else {
                Some(Self::property(&receiver, property, callee.span)?)
            };
            if optional && f.as_ref().is_some_and(Value::is_nullish) {
                return Ok(None);
            }
            let args = self.args(args, env)?;
            return match f {
                None => builtins::call_method(self, &receiver, property, &args, span).map(Some),
                Some(f) => self.call_value(&f, &args, callee.span, span).map(Some),
            };
        }

        let Some(f) = self.chain(callee, env)? else {
            return Ok(None);
        };
        if optional && f.is_nullish() {
            return Ok(None);
        }
        let args = self.args(args, env)?;
        self.call_value(&f, &args, callee.span, span).map(Some)
    }

    /// Calls `f`, naming it by the source text at `callee` in errors.
    pub(crate) fn call_value(
        &mut self,
        f: &Value,
        args: &[Value],
        callee: Span,
        span: Span,
    ) -> Result<Value, EvalError> {
        let Value::Function(func) = f else {
            return Err(Self::type_error(
                format!("{} is not a function", self.source_text(callee)),
                span,
            ));
        };
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EvalError::CallDepth {
                limit: MAX_CALL_DEPTH,
                span,
            });
        }
        func.call_at_depth(args, self.depth + 1)
            .map_err(|e| e.with_call_site(span))
    }

    fn enter_closure(&mut self, closure: &Closure, args: &[Value]) -> Result<Value, EvalError> {
        let lambda = &closure.lambda;
        let mut values: SmallVec<[Value; 4]> = args.iter().take(lambda.arity).cloned().collect();
        values.resize(lambda.arity, Value::Undefined);
        let env = Some(Rc::new(Frame {
            values,
            parent: closure.env.clone(),
        }));
        self.eval(&lambda.body, &env)
    }

    fn property(obj: &Value, key: &str, span: Span) -> Result<Value, EvalError> {
        Ok(match obj {
            Value::Undefined | Value::Null => {
                return Err(Self::type_error(
                    format!("Cannot read properties of {obj} (reading '{key}')"),
                    span,
                ));
            }
            Value::String(s) => match key {
                "length" => Value::Number(s.chars().count() as f64),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map_or(Value::Undefined, |c| Value::string(c.to_string())),
            },
            Value::Array(items) => match key {
                "length" => Value::Number(items.len() as f64),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .unwrap_or_default(),
            },
            Value::Object(o) => o.get(key).cloned().unwrap_or_default(),
            Value::Element(el) => match key {
                "props" => Value::Object(el.props.clone()),
                "key" => el.key.clone().unwrap_or(Value::Null),
                _ => Value::Undefined,
            },
            Value::Bool(_) | Value::Number(_) | Value::Function(_) => Value::Undefined,
        })
    }

    fn element(&mut self, el: &ElementNode, env: &Env) -> Result<Value, EvalError> {
        let ty = match &el.ty {
            ElementTypeNode::Intrinsic(tag) => ElementType::Intrinsic(tag.clone()),
            ElementTypeNode::Fragment => ElementType::Fragment,
            ElementTypeNode::Expr(node) => match self.eval(node, env)? {
                Value::Function(f) if f.is_fragment() => ElementType::Fragment,
                other => ElementType::Component(other),
            },
        };

        let mut props = Object::new();
        let mut key = None;
        for attr in &el.attrs {
            match attr {
                AttrNode::Prop(name, node) => {
                    let value = self.eval(node, env)?;
                    if &**name == "key" {
                        key = Some(value);
                    } else {
                        props.insert(name.clone(), value);
                    }
                }
                AttrNode::Spread(node) => {
                    let mut spread = Object::new();
                    spread_into(&mut spread, self.eval(node, env)?);
                    if let Some(k) = spread.remove("key") {
                        key = Some(k);
                    }
                    for (name, value) in spread.iter() {
                        props.insert(name, value.clone());
                    }
                }
            }
        }

        let mut children = Vec::with_capacity(el.children.len());
        for child in &el.children {
            children.push(self.eval(child, env)?);
        }
        match children.len() {
            0 => {}
            1 => {
                if let Some(only) = children.pop() {
                    props.insert("children", only);
                }
            }
            _ => props.insert("children", Value::from(children)),
        }

        Ok(Value::Element(Rc::new(Element {
            ty,
            key,
            props: Rc::new(props),
        })))
    }
}

fn spread_into(object: &mut Object, value: Value) {
    match value {
        Value::Object(source) => {
            for (k, v) in source.iter() {
                object.insert(k, v.clone());
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                object.insert(i.to_string().as_str(), v.clone());
            }
        }
        Value::String(s) => {
            for (i, c) in s.chars().enumerate() {
                object.insert(i.to_string().as_str(), Value::string(c.to_string()));
            }
        }
        _ => {}
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let primitive_number = |v: &Value| {
                matches!(
                    v,
                    Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
                )
            };
            if !primitive_number(l) || !primitive_number(r) {
                Value::from(format!("{l}{r}"))
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => Value::Number(l.to_number() % r.to_number()),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let ordering = match (l, r) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => l.to_number().partial_cmp(&r.to_number()),
            };
            Value::Bool(ordering.is_some_and(|o| match op {
                BinaryOp::Lt => o.is_lt(),
                BinaryOp::Gt => o.is_gt(),
                BinaryOp::Le => o.is_le(),
                _ => o.is_ge(),
            }))
        }
        BinaryOp::Eq => Value::Bool(l.loose_equals(r)),
        BinaryOp::NotEq => Value::Bool(!l.loose_equals(r)),
        BinaryOp::StrictEq => Value::Bool(l.strict_equals(r)),
        BinaryOp::StrictNotEq => Value::Bool(!l.strict_equals(r)),
    }
}

/// Short description of a value for error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        Value::Function(_) => String::from("function"),
        Value::Array(_) | Value::Object(_) | Value::Element(_) => String::from(value.type_of()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;

    use super::evaluate;
    use crate::compile::compile;
    use crate::error::EvalError;
    use crate::scope::Scope;
    use crate::value::{ElementType, Function, Value};

    fn eval_expr(src: &str, scope: &Scope) -> Result<Value, EvalError> {
        let root = evaluate(&compile(src).unwrap(), scope)?;
        let Value::Element(root) = root else {
            panic!("root is always an element");
        };
        Ok(root.children().cloned().unwrap_or_default())
    }

    #[test]
    fn arithmetic_and_strings() {
        let scope = Scope::new();
        assert_eq!(eval_expr("{1 + 2 * 3}", &scope), Ok(Value::Number(7.0)));
        assert_eq!(eval_expr("{'a' + 1}", &scope), Ok(Value::from("a1")));
        assert_eq!(eval_expr("{7 % 4 - -1}", &scope), Ok(Value::Number(4.0)));
        assert_eq!(eval_expr("{'b' > 'a'}", &scope), Ok(Value::Bool(true)));
        assert_eq!(eval_expr("{null ?? 'x'}", &scope), Ok(Value::from("x")));
        assert_eq!(eval_expr("{0 || 'y'}", &scope), Ok(Value::from("y")));
        assert_eq!(eval_expr("{typeof nope}", &scope), Ok(Value::from("undefined")));
    }

    #[test]
    fn arrows_capture_parameters() {
        let scope = Scope::new();
        assert_eq!(
            eval_expr("{((a) => (b) => a - b)(10)(3)}", &scope),
            Ok(Value::Number(7.0))
        );
        assert_eq!(
            eval_expr("{[1, 2, 3].map(x => x * 2).join('-')}", &scope),
            Ok(Value::from("2-4-6"))
        );
    }

    #[test]
    fn scope_values_are_visible() {
        let scope = Scope::new()
            .with("name", "Ada")
            .with("user", Value::from(
                [("first", Value::from("Grace"))].into_iter().collect::<crate::value::Object>(),
            ));
        assert_eq!(eval_expr("{name}", &scope), Ok(Value::from("Ada")));
        assert_eq!(eval_expr("{user.first}", &scope), Ok(Value::from("Grace")));
        assert_eq!(eval_expr("{user?.missing?.deep}", &scope), Ok(Value::Undefined));
    }

    #[test]
    fn unknown_names_fail_only_when_evaluated() {
        let scope = Scope::new();
        assert_eq!(eval_expr("{false && nope}", &scope), Ok(Value::Bool(false)));
        let err = eval_expr("{nope}", &scope).unwrap_err();
        assert!(matches!(err, EvalError::Reference { ref name, .. } if name == "nope"));
        assert_eq!(err.span().map(|s| s.start), Some(1));
    }

    #[test]
    fn type_errors_name_the_source() {
        let scope = Scope::new().with("x", 1.0);
        let err = eval_expr("{x()}", &scope).unwrap_err();
        assert_eq!(err.to_string(), "x is not a function");
        let err = eval_expr("{x.y.z}", &scope).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot read properties of undefined (reading 'z')"
        );
    }

    #[test]
    fn host_functions_and_thrown_errors() {
        let scope = Scope::new()
            .with(
                "double",
                Function::native("double", |args| {
                    Ok(Value::Number(args.first().map_or(0.0, Value::to_number) * 2.0))
                }),
            )
            .with(
                "fail",
                Function::native("fail", |_| Err(EvalError::thrown("boom"))),
            );
        assert_eq!(eval_expr("{double(21)}", &scope), Ok(Value::Number(42.0)));
        let err = eval_expr("{fail()}", &scope).unwrap_err();
        assert_eq!(
            err,
            EvalError::Thrown {
                message: String::from("boom"),
                span: Some(crate::span::Span::new(1, 7)),
            }
        );
    }

    #[test]
    fn runaway_recursion_is_bounded() {
        let err = eval_expr("{(f => f(f))(f => f(f))}", &Scope::new()).unwrap_err();
        assert!(matches!(err, EvalError::CallDepth { .. }));
    }

    #[test]
    fn elements_lift_key_and_collect_children() {
        let scope = Scope::new().with("Button", Function::native("Button", |_| Ok(Value::Null)));
        let value = eval_expr(r#"<Button key="k" kind="primary">a{1}</Button>"#, &scope).unwrap();
        let Value::Element(el) = value else {
            panic!("expected element");
        };
        assert!(matches!(el.ty, ElementType::Component(Value::Function(_))));
        assert_eq!(el.key, Some(Value::from("k")));
        assert_eq!(el.props.get("kind"), Some(&Value::from("primary")));
        assert_eq!(
            el.children(),
            Some(&Value::array(vec![Value::from("a"), Value::Number(1.0)]))
        );
        assert!(!el.props.contains_key("key"));
    }

    #[test]
    fn fragment_whitelist() {
        let scope = Scope::new();
        for src in ["<Fragment>x</Fragment>", "<React.Fragment>x</React.Fragment>", "<>x</>"] {
            let Value::Element(el) = eval_expr(src, &scope).unwrap() else {
                panic!("expected element");
            };
            assert_eq!(el.ty, ElementType::Fragment, "{src}");
        }
        // Anything else from the host environment stays unreachable.
        assert!(eval_expr("{window}", &scope).is_err());
    }

    #[test]
    fn closures_outlive_evaluation() {
        let scope = Scope::new().with("base", 10.0);
        let f = eval_expr("{n => n + base}", &scope).unwrap();
        let Value::Function(f) = f else {
            panic!("expected function");
        };
        drop(scope);
        assert_eq!(f.call(&[Value::Number(5.0)]), Ok(Value::Number(15.0)));
    }
}
