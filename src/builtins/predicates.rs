use super::{define, opt, req, type_error, BoundArgs};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{ControlError, SourcePos, Value};

pub(super) fn register(env: &Environment) {
    define(env, "is_empty", vec![req("obj")], native_is_empty);
    define(env, "is_zero", vec![req("obj")], native_is_zero);
    define(env, "is_negative", vec![req("obj")], native_is_negative);
    define(
        env,
        "is_numerical",
        vec![req("str"), opt("min", Value::Null), opt("max", Value::Null)],
        native_is_numerical,
    );
    define(
        env,
        "is_alphanumerical",
        vec![req("str"), opt("min", Value::Null), opt("max", Value::Null)],
        native_is_alphanumerical,
    );
}

fn native_is_empty(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let empty = match args.get("obj") {
        Value::Null => true,
        Value::Str(s) => s.is_empty(),
        Value::List(items) => items.borrow().is_empty(),
        Value::Set(items) => items.borrow().is_empty(),
        Value::Map(entries) => entries.borrow().is_empty(),
        Value::Object(obj) => obj.borrow().is_empty(),
        other => return Err(type_error("is_empty", "a string or collection", &other, pos)),
    };
    Ok(Value::Boolean(empty))
}

fn native_is_zero(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Int(n) => Ok(Value::Boolean(n == 0)),
        Value::Decimal(d) => Ok(Value::Boolean(d.is_zero())),
        other => Err(type_error("is_zero", "a number", &other, pos)),
    }
}

fn native_is_negative(
    _: &mut Ctx,
    args: &BoundArgs,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Int(n) => Ok(Value::Boolean(n < 0)),
        Value::Decimal(d) => Ok(Value::Boolean(d.is_negative())),
        other => Err(type_error("is_negative", "a number", &other, pos)),
    }
}

fn native_is_numerical(
    _: &mut Ctx,
    args: &BoundArgs,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    char_class_check("is_numerical", args, pos, |c| c.is_ascii_digit())
}

fn native_is_alphanumerical(
    _: &mut Ctx,
    args: &BoundArgs,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    char_class_check("is_alphanumerical", args, pos, |c| c.is_ascii_alphanumeric())
}

/// Shared body of the character-class predicates: every character must match
/// the class, the string must be non-empty, and its length must fall within
/// the optional min/max bounds.
fn char_class_check(
    func: &str,
    args: &BoundArgs,
    pos: &SourcePos,
    class: impl Fn(char) -> bool,
) -> Result<Value, ControlError> {
    let s = match args.get("str") {
        Value::Str(s) => s,
        other => return Err(type_error(func, "a string", &other, pos)),
    };
    let len = s.chars().count() as i64;
    if len == 0 || !s.chars().all(class) {
        return Ok(Value::Boolean(false));
    }
    if let Some(min) = bound(func, &args.get("min"), pos)? {
        if len < min {
            return Ok(Value::Boolean(false));
        }
    }
    if let Some(max) = bound(func, &args.get("max"), pos)? {
        if len > max {
            return Ok(Value::Boolean(false));
        }
    }
    Ok(Value::Boolean(true))
}

fn bound(func: &str, value: &Value, pos: &SourcePos) -> Result<Option<i64>, ControlError> {
    match value {
        Value::Null => Ok(None),
        Value::Int(n) => Ok(Some(*n)),
        other => Err(type_error(func, "an int length bound", other, pos)),
    }
}
