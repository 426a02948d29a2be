use std::cell::RefCell;
use std::rc::Rc;

use super::{define, opt, req, rest, type_error, BoundArgs};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{ControlError, Decimal, InputHandle, SourcePos, Value};

pub(super) fn register(env: &Environment) {
    define(env, "print", vec![rest("items")], native_print);
    define(env, "println", vec![rest("items")], native_println);
    define(env, "str_input", vec![req("text")], native_str_input);
    define(env, "read_line", vec![req("input")], native_read_line);
    define(env, "now", vec![], native_now);
    define(env, "random", vec![opt("max", Value::Null)], native_random);
}

fn write_items(ctx: &mut Ctx, args: &BoundArgs) {
    if let Value::List(items) = args.get("items") {
        for item in items.borrow().iter() {
            ctx.write_output(&item.to_plain_string());
        }
    }
}

fn native_print(ctx: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    write_items(ctx, args);
    Ok(Value::Null)
}

fn native_println(ctx: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    write_items(ctx, args);
    ctx.write_output("\n");
    Ok(Value::Null)
}

/// Wrap a string as a line-oriented Input stream, mostly for tests and for
/// feeding rule scripts their record text.
fn native_str_input(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("text") {
        Value::Str(s) => Ok(Value::Input(Rc::new(RefCell::new(InputHandle::from_string(
            s.as_ref().clone(),
        ))))),
        other => Err(type_error("str_input", "a string", &other, pos)),
    }
}

/// Next line of an Input stream, or NULL at end of stream.
fn native_read_line(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("input") {
        Value::Input(input) => {
            let line = input.borrow_mut().read_line().map_err(|err| {
                ControlError::new(format!("read_line: {}", err), pos.clone())
            })?;
            Ok(match line {
                Some(line) => Value::from_string(line),
                None => Value::Null,
            })
        }
        other => Err(type_error("read_line", "an input stream", &other, pos)),
    }
}

fn native_now(ctx: &mut Ctx, _: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::Date(ctx.host.now()))
}

/// `random()` yields a Decimal in [0, 1); `random(max)` an Int in [0, max).
fn native_random(ctx: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let raw = ctx.next_random();
    match args.get("max") {
        Value::Null => {
            let frac = raw % 1_000_000_000;
            Decimal::parse(&format!("0.{:09}", frac))
                .map(Value::Decimal)
                .ok_or_else(|| ControlError::new("random: internal error", pos.clone()))
        }
        Value::Int(max) if max > 0 => Ok(Value::Int((raw % max as u64) as i64)),
        other => Err(type_error("random", "a positive int", &other, pos)),
    }
}
