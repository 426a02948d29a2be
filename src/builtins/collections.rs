use super::{define, opt, req, type_error, BoundArgs};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{is_equals, ControlError, SourcePos, Value};

pub(super) fn register(env: &Environment) {
    define(env, "length", vec![req("obj")], native_length);
    define(env, "append", vec![req("lst"), req("element")], native_append);
    define(
        env,
        "range",
        vec![
            req("a"),
            opt("b", Value::Null),
            opt("step", Value::Null),
        ],
        native_range,
    );
    define(env, "keys", vec![req("obj")], native_keys);
    define(env, "values", vec![req("obj")], native_values);
    define(env, "entries", vec![req("obj")], native_entries);
    define(env, "contains", vec![req("obj"), req("part")], native_contains);
    define(
        env,
        "is_in",
        vec![req("obj"), req("collection")],
        native_is_in,
    );
}

fn native_length(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let len = match args.get("obj") {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Set(items) => items.borrow().len(),
        Value::Map(entries) => entries.borrow().len(),
        Value::Object(obj) => obj.borrow().len(),
        other => return Err(type_error("length", "a string or collection", &other, pos)),
    };
    Ok(Value::Int(len as i64))
}

/// Push onto a list in place and return the same list handle, so mutation is
/// visible through every alias.
fn native_append(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let lst = args.get("lst");
    match &lst {
        Value::List(items) => {
            items.borrow_mut().push(args.get("element"));
            Ok(lst)
        }
        other => Err(type_error("append", "a list", other, pos)),
    }
}

/// `range(n)` counts 0..n; `range(a, b)` counts a..b; an explicit step may
/// be negative for a descending range. A zero step raises.
fn native_range(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let a = int_arg("range", &args.get("a"), pos)?;
    let b = args.get("b");
    let (start, end) = match b {
        Value::Null => (0, a),
        other => (a, int_arg("range", &other, pos)?),
    };
    let step = match args.get("step") {
        Value::Null => 1,
        other => int_arg("range", &other, pos)?,
    };
    if step == 0 {
        return Err(ControlError::new("range: step must not be zero", pos.clone()));
    }
    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < end) || (step < 0 && i > end) {
        items.push(Value::Int(i));
        i += step;
    }
    Ok(Value::list(items))
}

fn native_keys(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Map(entries) => Ok(Value::list(
            entries.borrow().keys().map(|k| k.0.clone()).collect(),
        )),
        Value::Object(obj) => Ok(Value::list(
            obj.borrow()
                .iter()
                .map(|(k, _)| Value::from_string(k.clone()))
                .collect(),
        )),
        other => Err(type_error("keys", "a map or object", &other, pos)),
    }
}

fn native_values(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Map(entries) => Ok(Value::list(entries.borrow().values().cloned().collect())),
        Value::Object(obj) => Ok(Value::list(
            obj.borrow().iter().map(|(_, v)| v.clone()).collect(),
        )),
        other => Err(type_error("values", "a map or object", &other, pos)),
    }
}

fn native_entries(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Map(entries) => Ok(Value::list(
            entries
                .borrow()
                .iter()
                .map(|(k, v)| Value::list(vec![k.0.clone(), v.clone()]))
                .collect(),
        )),
        Value::Object(obj) => Ok(Value::list(
            obj.borrow()
                .iter()
                .map(|(k, v)| Value::list(vec![Value::from_string(k.clone()), v.clone()]))
                .collect(),
        )),
        other => Err(type_error("entries", "a map or object", &other, pos)),
    }
}

fn native_contains(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let obj = args.get("obj");
    let part = args.get("part");
    Ok(Value::Boolean(membership("contains", &obj, &part, pos)?))
}

/// `is_in(obj, collection)` is `contains` with the operands swapped, matching
/// the `x in xs` surface form.
fn native_is_in(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let obj = args.get("obj");
    let collection = args.get("collection");
    Ok(Value::Boolean(membership("is_in", &collection, &obj, pos)?))
}

fn membership(
    func: &str,
    collection: &Value,
    needle: &Value,
    pos: &SourcePos,
) -> Result<bool, ControlError> {
    match collection {
        Value::Str(s) => match needle {
            Value::Str(part) => Ok(s.contains(part.as_str())),
            other => Err(type_error(func, "a string part", other, pos)),
        },
        Value::List(items) => Ok(items.borrow().iter().any(|v| is_equals(v, needle))),
        Value::Set(items) => Ok(items.borrow().iter().any(|k| is_equals(&k.0, needle))),
        Value::Map(entries) => Ok(entries.borrow().keys().any(|k| is_equals(&k.0, needle))),
        Value::Object(obj) => match needle {
            Value::Str(key) => Ok(obj.borrow().get(key).is_some()),
            other => Err(type_error(func, "a string key", other, pos)),
        },
        other => Err(type_error(func, "a string or collection", other, pos)),
    }
}

fn int_arg(func: &str, value: &Value, pos: &SourcePos) -> Result<i64, ControlError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(type_error(func, "an int", other, pos)),
    }
}
