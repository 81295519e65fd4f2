//! Builtin members of non-object values (text, lists, composites).

use crate::{
    member::MemberError,
    value::{Value, numeric_eq},
};

/// Resolve an attribute on a non-object value. `None` means no such member.
pub(crate) fn attribute(receiver: &Value, name: &str) -> Option<Value> {
    match receiver {
        Value::Composite(composite) => composite.get(name).cloned(),
        _ => None,
    }
}

/// Invoke a builtin method. `None` means the receiver type has no such method.
pub(crate) fn invoke(
    receiver: &Value,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, MemberError>> {
    let result = match (receiver, name) {
        (_, "toString") => arity(name, args, 0).map(|()| Value::Text(receiver.to_concat_string())),
        (_, "equals") => arity(name, args, 1).map(|()| Value::Bool(numeric_eq(receiver, &args[0]))),

        (Value::Text(text), _) => return text_method(text, name, args),
        (Value::List(items), _) => return list_method(items, name, args),

        _ => return None,
    };

    Some(result)
}

fn text_method(text: &str, name: &str, args: &[Value]) -> Option<Result<Value, MemberError>> {
    let result = match name {
        "length" => arity(name, args, 0).map(|()| len_value(text.chars().count())),
        "isEmpty" => arity(name, args, 0).map(|()| Value::Bool(text.is_empty())),
        "trim" => arity(name, args, 0).map(|()| Value::Text(text.trim().to_string())),
        "toUpperCase" => arity(name, args, 0).map(|()| Value::Text(text.to_uppercase())),
        "toLowerCase" => arity(name, args, 0).map(|()| Value::Text(text.to_lowercase())),
        "startsWith" => text_arg(name, args).map(|arg| Value::Bool(text.starts_with(arg))),
        "endsWith" => text_arg(name, args).map(|arg| Value::Bool(text.ends_with(arg))),
        "contains" => text_arg(name, args).map(|arg| Value::Bool(text.contains(arg))),
        "substring" => substring(text, args),
        _ => return None,
    };

    Some(result)
}

fn list_method(items: &[Value], name: &str, args: &[Value]) -> Option<Result<Value, MemberError>> {
    let result = match name {
        "size" => arity(name, args, 0).map(|()| len_value(items.len())),
        "isEmpty" => arity(name, args, 0).map(|()| Value::Bool(items.is_empty())),
        "contains" => arity(name, args, 1)
            .map(|()| Value::Bool(items.iter().any(|item| numeric_eq(item, &args[0])))),
        "get" => index_arg(name, args).map(|idx| items.get(idx).cloned().unwrap_or_default()),
        _ => return None,
    };

    Some(result)
}

fn substring(text: &str, args: &[Value]) -> Result<Value, MemberError> {
    let (start, end) = match args {
        [start] => (to_index(start)?, None),
        [start, end] => (to_index(start)?, Some(to_index(end)?)),
        _ => {
            return Err(MemberError::Arity {
                method: "substring".to_string(),
                expected: 2,
                found: args.len(),
            });
        }
    };

    let chars: Vec<char> = text.chars().collect();
    let end = end.unwrap_or(chars.len()).min(chars.len());
    let start = start.min(end);

    Ok(Value::Text(chars[start..end].iter().collect()))
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), MemberError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(MemberError::Arity {
            method: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

fn text_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a str, MemberError> {
    arity(name, args, 1)?;
    args[0].as_text().ok_or(MemberError::TypeMismatch {
        expected: "text",
        found: args[0].value_type(),
    })
}

fn index_arg(name: &str, args: &[Value]) -> Result<usize, MemberError> {
    arity(name, args, 1)?;
    to_index(&args[0])
}

fn to_index(value: &Value) -> Result<usize, MemberError> {
    match value {
        Value::Int(n) => usize::try_from(*n).map_err(|_| MemberError::OutOfRange {
            target: "index",
            value: *n,
        }),
        other => Err(MemberError::TypeMismatch {
            expected: "int",
            found: other.value_type(),
        }),
    }
}

fn len_value(len: usize) -> Value {
    Value::Int(i64::try_from(len).unwrap_or(i64::MAX))
}
