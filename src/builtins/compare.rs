use std::cmp::Ordering;

use super::{define, req, BoundArgs};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{compare_values, is_equals, ControlError, SourcePos, Value};

pub(super) fn register(env: &Environment) {
    define(env, "equals", vec![req("a"), req("b")], native_equals);
    define(env, "not_equals", vec![req("a"), req("b")], native_not_equals);
    define(env, "less", vec![req("a"), req("b")], native_less);
    define(env, "less_equals", vec![req("a"), req("b")], native_less_equals);
    define(env, "greater", vec![req("a"), req("b")], native_greater);
    define(
        env,
        "greater_equals",
        vec![req("a"), req("b")],
        native_greater_equals,
    );
    define(env, "compare", vec![req("a"), req("b")], native_compare);
}

fn native_equals(_: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::Boolean(is_equals(&args.get("a"), &args.get("b"))))
}

fn native_not_equals(
    _: &mut Ctx,
    args: &BoundArgs,
    _: &SourcePos,
) -> Result<Value, ControlError> {
    Ok(Value::Boolean(!is_equals(&args.get("a"), &args.get("b"))))
}

fn ordering(args: &BoundArgs) -> Ordering {
    compare_values(&args.get("a"), &args.get("b"))
}

fn native_less(_: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::Boolean(ordering(args) == Ordering::Less))
}

fn native_less_equals(
    _: &mut Ctx,
    args: &BoundArgs,
    _: &SourcePos,
) -> Result<Value, ControlError> {
    Ok(Value::Boolean(ordering(args) != Ordering::Greater))
}

fn native_greater(_: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::Boolean(ordering(args) == Ordering::Greater))
}

fn native_greater_equals(
    _: &mut Ctx,
    args: &BoundArgs,
    _: &SourcePos,
) -> Result<Value, ControlError> {
    Ok(Value::Boolean(ordering(args) != Ordering::Less))
}

/// Three-way comparison under the total order: -1, 0 or 1.
fn native_compare(_: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::Int(match ordering(args) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}
