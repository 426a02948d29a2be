use chrono::NaiveDate;

use super::{define, req, type_error, BoundArgs};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{ControlError, Decimal, PatternValue, SourcePos, Value};

pub(super) fn register(env: &Environment) {
    define(env, "string", vec![req("obj")], native_string);
    define(env, "int", vec![req("obj")], native_int);
    define(env, "decimal", vec![req("obj")], native_decimal);
    define(env, "boolean", vec![req("obj")], native_boolean);
    define(env, "date", vec![req("str")], native_date);
    define(env, "type", vec![req("obj")], native_type);
    define(env, "starts_with", vec![req("str"), req("part")], native_starts_with);
    define(env, "ends_with", vec![req("str"), req("part")], native_ends_with);
    define(env, "matches", vec![req("str"), req("pattern")], native_matches);
    define(env, "lower", vec![req("str")], native_lower);
    define(env, "upper", vec![req("str")], native_upper);
    define(env, "trim", vec![req("str")], native_trim);
}

fn native_string(_: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::from_string(args.get("obj").to_plain_string()))
}

fn native_int(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Int(n) => Ok(Value::Int(n)),
        Value::Decimal(d) => d.to_i64().map(Value::Int).ok_or_else(|| {
            ControlError::new("int: decimal out of int range", pos.clone())
        }),
        Value::Boolean(b) => Ok(Value::Int(if b { 1 } else { 0 })),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            ControlError::new(format!("int: cannot parse '{}'", s), pos.clone())
        }),
        other => Err(type_error("int", "a number, boolean or string", &other, pos)),
    }
}

fn native_decimal(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Int(n) => Ok(Value::Decimal(Decimal::from_i64(n))),
        Value::Decimal(d) => Ok(Value::Decimal(d)),
        Value::Str(s) => Decimal::parse(s.trim()).map(Value::Decimal).ok_or_else(|| {
            ControlError::new(format!("decimal: cannot parse '{}'", s), pos.clone())
        }),
        other => Err(type_error("decimal", "a number or string", &other, pos)),
    }
}

fn native_boolean(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    match args.get("obj") {
        Value::Boolean(b) => Ok(Value::Boolean(b)),
        Value::Str(s) => match s.as_str() {
            "TRUE" => Ok(Value::Boolean(true)),
            "FALSE" => Ok(Value::Boolean(false)),
            _ => Err(ControlError::new(
                format!("boolean: cannot parse '{}'", s),
                pos.clone(),
            )),
        },
        Value::Int(n) => Ok(Value::Boolean(n != 0)),
        other => Err(type_error("boolean", "a boolean, int or string", &other, pos)),
    }
}

/// Parse an 8-digit `yyyyMMdd` (midnight) or 14-digit `yyyyMMddHHmmss` date.
fn native_date(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let s = match args.get("str") {
        Value::Str(s) => s,
        Value::Date(d) => return Ok(Value::Date(d)),
        other => return Err(type_error("date", "a string", &other, pos)),
    };
    let parsed = if s.len() == 14 {
        chrono::NaiveDateTime::parse_from_str(&s, "%Y%m%d%H%M%S").ok()
    } else {
        NaiveDate::parse_from_str(&s, "%Y%m%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    };
    parsed.map(Value::Date).ok_or_else(|| {
        ControlError::new(format!("date: cannot parse '{}'", s), pos.clone())
    })
}

fn native_type(_: &mut Ctx, args: &BoundArgs, _: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::from_string(args.get("obj").type_name()))
}

fn native_starts_with(
    _: &mut Ctx,
    args: &BoundArgs,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    let (s, part) = str_pair("starts_with", args, pos)?;
    Ok(Value::Boolean(s.starts_with(&part)))
}

fn native_ends_with(
    _: &mut Ctx,
    args: &BoundArgs,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    let (s, part) = str_pair("ends_with", args, pos)?;
    Ok(Value::Boolean(s.ends_with(&part)))
}

/// Regex search over the subject; a Str pattern is compiled through the same
/// memoizing cache as a `//…//` literal.
fn native_matches(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    let s = str_arg("matches", &args.get("str"), pos)?;
    let pattern = match args.get("pattern") {
        Value::Pattern(p) => p,
        Value::Str(src) => PatternValue::compile(&src).map_err(|err| {
            ControlError::new(format!("matches: invalid pattern: {}", err), pos.clone())
        })?,
        other => return Err(type_error("matches", "a pattern or string", &other, pos)),
    };
    Ok(Value::Boolean(pattern.is_match(&s)))
}

fn native_lower(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::from_string(
        str_arg("lower", &args.get("str"), pos)?.to_lowercase(),
    ))
}

fn native_upper(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::from_string(
        str_arg("upper", &args.get("str"), pos)?.to_uppercase(),
    ))
}

fn native_trim(_: &mut Ctx, args: &BoundArgs, pos: &SourcePos) -> Result<Value, ControlError> {
    Ok(Value::from_string(
        str_arg("trim", &args.get("str"), pos)?.trim().to_string(),
    ))
}

fn str_arg(func: &str, value: &Value, pos: &SourcePos) -> Result<String, ControlError> {
    match value {
        Value::Str(s) => Ok(s.as_ref().clone()),
        other => Err(type_error(func, "a string", other, pos)),
    }
}

fn str_pair(
    func: &str,
    args: &BoundArgs,
    pos: &SourcePos,
) -> Result<(String, String), ControlError> {
    Ok((
        str_arg(func, &args.get("str"), pos)?,
        str_arg(func, &args.get("part"), pos)?,
    ))
}
