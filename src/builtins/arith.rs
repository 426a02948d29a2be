use super::{define, req, type_error, BoundArgs};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{ControlError, Decimal, SourcePos, Value};

pub(super) fn register(env: &Environment) {
    define(env, "add", vec![req("a"), req("b")], native_add);
    define(env, "sub", vec![req("a"), req("b")], native_sub);
    define(env, "mul", vec![req("a"), req("b")], native_mul);
    define(env, "div", vec![req("a"), req("b")], native_div);
    define(env, "mod", vec![req("a"), req("b")], native_mod);
}

/// Numeric addition with Int→Decimal promotion; Str operands concatenate
/// (the other side contributes its plain text); List + List yields a fresh
/// concatenated list.
fn native_add(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let a = args.get("a");
    let b = args.get("b");
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => x
            .checked_add(*y)
            .map(Value::Int)
            .ok_or_else(|| ControlError::new("add: integer overflow", pos.clone())),
        (Value::Str(x), other) => {
            Ok(Value::from_string(format!("{}{}", x, other.to_plain_string())))
        }
        (other, Value::Str(y)) => {
            Ok(Value::from_string(format!("{}{}", other.to_plain_string(), y)))
        }
        (Value::List(x), Value::List(y)) => {
            let mut items = x.borrow().clone();
            items.extend(y.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => decimal_op("add", &a, &b, pos, |x, y| Some(x.add(y))),
    }
}

fn native_sub(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let a = args.get("a");
    let b = args.get("b");
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => x
            .checked_sub(*y)
            .map(Value::Int)
            .ok_or_else(|| ControlError::new("sub: integer overflow", pos.clone())),
        _ => decimal_op("sub", &a, &b, pos, |x, y| Some(x.sub(y))),
    }
}

/// Numeric product; `Str * Int` and `List * Int` repeat their subject.
fn native_mul(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let a = args.get("a");
    let b = args.get("b");
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => x
            .checked_mul(*y)
            .map(Value::Int)
            .ok_or_else(|| ControlError::new("mul: integer overflow", pos.clone())),
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            if *n < 0 {
                return Err(ControlError::new(
                    "mul: negative string repeat count",
                    pos.clone(),
                ));
            }
            Ok(Value::from_string(s.repeat(*n as usize)))
        }
        (Value::List(items), Value::Int(n)) => {
            if *n < 0 {
                return Err(ControlError::new(
                    "mul: negative list repeat count",
                    pos.clone(),
                ));
            }
            let source = items.borrow();
            let mut result = Vec::with_capacity(source.len() * *n as usize);
            for _ in 0..*n {
                result.extend(source.iter().cloned());
            }
            Ok(Value::list(result))
        }
        _ => decimal_op("mul", &a, &b, pos, |x, y| Some(x.mul(y))),
    }
}

/// Int / Int is integer division; any Decimal operand promotes. Division by
/// zero raises.
fn native_div(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let a = args.get("a");
    let b = args.get("b");
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            if *y == 0 {
                return Err(ControlError::new("div: divide by zero", pos.clone()));
            }
            Ok(Value::Int(x / y))
        }
        _ => decimal_op("div", &a, &b, pos, |x, y| x.div(y)),
    }
}

fn native_mod(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let a = args.get("a");
    let b = args.get("b");
    match (&a, &b) {
        (Value::Int(x), Value::Int(y)) => {
            if *y == 0 {
                return Err(ControlError::new("mod: divide by zero", pos.clone()));
            }
            Ok(Value::Int(x % y))
        }
        _ => decimal_op("mod", &a, &b, pos, |x, y| x.rem(y)),
    }
}

/// Shared numeric-promotion path: both operands must be Int or Decimal.
/// `op` returning None means division by zero.
fn decimal_op(
    func: &str,
    a: &Value,
    b: &Value,
    pos: &SourcePos,
    op: impl Fn(&Decimal, &Decimal) -> Option<Decimal>,
) -> Result<Value, ControlError> {
    let x = as_decimal(func, a, pos)?;
    let y = as_decimal(func, b, pos)?;
    op(&x, &y)
        .map(Value::Decimal)
        .ok_or_else(|| ControlError::new(format!("{}: divide by zero", func), pos.clone()))
}

pub(super) fn as_decimal(
    func: &str,
    value: &Value,
    pos: &SourcePos,
) -> Result<Decimal, ControlError> {
    match value {
        Value::Int(n) => Ok(Decimal::from_i64(*n)),
        Value::Decimal(d) => Ok(d.clone()),
        other => Err(type_error(func, "a number", other, pos)),
    }
}
