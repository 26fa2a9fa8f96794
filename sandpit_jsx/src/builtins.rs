// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Methods on arrays and strings.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::EvalError;
use crate::eval::{Interpreter, describe};
use crate::span::Span;
use crate::value::Value;

const ARRAY_METHODS: &[&str] = &[
    "map", "filter", "join", "includes", "slice", "concat", "indexOf",
];

const STRING_METHODS: &[&str] = &[
    "toUpperCase",
    "toLowerCase",
    "trim",
    "includes",
    "startsWith",
    "endsWith",
    "split",
];

pub(crate) fn has_method(receiver: &Value, name: &str) -> bool {
    match receiver {
        Value::Array(_) => ARRAY_METHODS.contains(&name),
        Value::String(_) => STRING_METHODS.contains(&name),
        _ => false,
    }
}

pub(crate) fn call_method(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    name: &str,
    args: &[Value],
    span: Span,
) -> Result<Value, EvalError> {
    match receiver {
        Value::Array(items) => array_method(interp, items, name, args, span),
        Value::String(s) => Ok(string_method(s, name, args)),
        _ => Err(EvalError::Type {
            message: format!("{}.{name} is not a function", describe(receiver)),
            span,
        }),
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Resolves a relative index the way `slice` does.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if value.is_nullish() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "clamped into 0..=len before the cast"
    )]
    let idx = if n < 0.0 {
        (len as f64 + n.trunc()).max(0.0) as usize
    } else {
        n.trunc().min(len as f64) as usize
    };
    idx
}

fn array_method(
    interp: &mut Interpreter<'_>,
    items: &[Value],
    name: &str,
    args: &[Value],
    span: Span,
) -> Result<Value, EvalError> {
    match name {
        "map" | "filter" => {
            let callback = arg(args, 0);
            if !matches!(callback, Value::Function(_)) {
                return Err(EvalError::Type {
                    message: format!("{} is not a function", describe(&callback)),
                    span,
                });
            }
            let array = Value::array(items.iter().cloned());
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let index = Value::Number(i as f64);
                let result =
                    interp.call_value(&callback, &[item.clone(), index, array.clone()], span, span)?;
                if name == "map" {
                    out.push(result);
                } else if result.truthy() {
                    out.push(item.clone());
                }
            }
            Ok(Value::from(out))
        }
        "join" => {
            let sep = match arg(args, 0) {
                Value::Undefined => String::from(","),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                .collect();
            Ok(Value::from(parts.join(&sep)))
        }
        "includes" => {
            let needle = arg(args, 0);
            Ok(Value::Bool(items.iter().any(|v| v.same_value_zero(&needle))))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let found = items
                .iter()
                .position(|v| v.strict_equals(&needle))
                .map_or(-1.0, |i| i as f64);
            Ok(Value::Number(found))
        }
        "slice" => {
            let start = relative_index(&arg(args, 0), items.len(), 0);
            let end = relative_index(&arg(args, 1), items.len(), items.len());
            Ok(Value::array(
                items.get(start..end.max(start)).unwrap_or_default().iter().cloned(),
            ))
        }
        "concat" => {
            let mut out: Vec<Value> = items.to_vec();
            for a in args {
                match a {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Ok(Value::from(out))
        }
        _ => Ok(Value::Undefined),
    }
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Value {
    let needle = || arg(args, 0).to_string();
    match name {
        "toUpperCase" => Value::from(s.to_uppercase()),
        "toLowerCase" => Value::from(s.to_lowercase()),
        "trim" => Value::from(s.trim()),
        "includes" => Value::Bool(s.contains(needle().as_str())),
        "startsWith" => Value::Bool(s.starts_with(needle().as_str())),
        "endsWith" => Value::Bool(s.ends_with(needle().as_str())),
        "split" => match arg(args, 0) {
            Value::Undefined => Value::array([Value::from(s)]),
            sep => {
                let sep = sep.to_string();
                if sep.is_empty() {
                    Value::array(s.chars().map(|c| Value::from(c.to_string())))
                } else {
                    Value::array(s.split(sep.as_str()).map(Value::from))
                }
            }
        },
        _ => Value::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use crate::compile::compile;
    use crate::eval::evaluate;
    use crate::scope::Scope;
    use crate::value::Value;

    fn run(src: &str) -> Value {
        let Value::Element(root) = evaluate(&compile(src).unwrap(), &Scope::new()).unwrap() else {
            panic!("root is always an element");
        };
        root.children().cloned().unwrap_or_default()
    }

    #[test]
    fn array_methods() {
        assert_eq!(run("{[1, 2, 3, 4].filter(n => n % 2 === 0).join()}"), "2,4".into());
        assert_eq!(run("{[1, 2, 3].slice(-2).join('')}"), "23".into());
        assert_eq!(run("{[1].concat([2, 3], 4).length}"), Value::Number(4.0));
        assert_eq!(run("{['a', 'b'].indexOf('b')}"), Value::Number(1.0));
        assert_eq!(run("{['a'].indexOf('z')}"), Value::Number(-1.0));
        assert_eq!(run("{[null, 1].join('-')}"), "-1".into());
        assert_eq!(run("{['x', 'y'].map((v, i) => v + i).join()}"), "x0,y1".into());
    }

    #[test]
    fn string_methods() {
        assert_eq!(run("{' Hi '.trim().toUpperCase()}"), "HI".into());
        assert_eq!(run("{'a,b'.split(',').length}"), Value::Number(2.0));
        assert_eq!(run("{'abc'.split('').join('|')}"), "a|b|c".into());
        assert_eq!(
            run("{'sandpit'.startsWith('sand') && 'sandpit'.endsWith('pit')}"),
            Value::Bool(true)
        );
        assert_eq!(run("{'abc'.length}"), Value::Number(3.0));
    }

    #[test]
    fn map_needs_a_function() {
        let err = evaluate(&compile("{[1].map(2)}").unwrap(), &Scope::new()).unwrap_err();
        assert_eq!(err.to_string(), "2 is not a function");
    }
}
