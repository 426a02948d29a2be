use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::ast::{CallArg, CatchClause, ForWhat, Node};
use crate::builtins::BoundArgs;
use crate::interpreter::args::{bind, expand_spread, BindParam, Slot};
use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{
    is_equals, ControlError, Func, LambdaClosure, ObjectData, SourcePos, Value, ValueKey,
};

/// Result of evaluating one node: either a plain value or a control signal
/// on its way to the nearest loop, lambda body or top level.
pub(crate) enum Flow {
    Val(Value),
    Return(Value),
    Break,
    Continue,
}

/// Unwrap a plain value, forwarding any control signal to the caller.
macro_rules! flow_val {
    ($flow:expr) => {
        match $flow {
            Flow::Val(v) => v,
            other => return Ok(other),
        }
    };
}

/// A strictly-boolean condition result, or a signal to forward.
enum BoolFlow {
    Bool(bool),
    Signal(Flow),
}

macro_rules! bool_val {
    ($flow:expr) => {
        match $flow {
            BoolFlow::Bool(b) => b,
            BoolFlow::Signal(s) => return Ok(s),
        }
    };
}

/// Evaluated call arguments with spreads expanded, or a signal that escaped
/// from an argument expression.
enum ArgsFlow {
    Args(Vec<(Option<String>, Value)>),
    Signal(Flow),
}

macro_rules! args_val {
    ($flow:expr) => {
        match $flow {
            ArgsFlow::Args(a) => a,
            ArgsFlow::Signal(s) => return Ok(s),
        }
    };
}

pub(crate) fn eval(
    node: &Node,
    env: &Rc<Environment>,
    ctx: &mut Ctx,
) -> Result<Flow, ControlError> {
    match node {
        Node::Literal { value, .. } => Ok(Flow::Val(value.clone())),
        Node::Identifier { name, pos } => match env.get(name) {
            Some(value) => Ok(Flow::Val(value)),
            None => Err(ControlError::new(
                format!("symbol '{}' not defined", name),
                pos.clone(),
            )),
        },
        Node::Def { name, value, .. } => {
            let value = flow_val!(eval(value, env, ctx)?);
            name_lambda(&value, name);
            env.define(name.clone(), value.clone());
            Ok(Flow::Val(value))
        }
        Node::DefDestructuring { names, value, pos } => {
            let value = flow_val!(eval(value, env, ctx)?);
            let parts = destructure_source(&value, names.len(), pos)?;
            for (name, part) in names.iter().zip(parts) {
                env.define(name.clone(), part);
            }
            Ok(Flow::Val(value))
        }
        Node::Assign { name, value, pos } => {
            let value = flow_val!(eval(value, env, ctx)?);
            if !env.assign(name, value.clone()) {
                return Err(ControlError::new(
                    format!("cannot assign to undefined symbol '{}'", name),
                    pos.clone(),
                ));
            }
            Ok(Flow::Val(value))
        }
        Node::DestructuringAssign { names, value, pos } => {
            let value = flow_val!(eval(value, env, ctx)?);
            let parts = destructure_source(&value, names.len(), pos)?;
            for (name, part) in names.iter().zip(parts) {
                if !env.assign(name, part) {
                    return Err(ControlError::new(
                        format!("cannot assign to undefined symbol '{}'", name),
                        pos.clone(),
                    ));
                }
            }
            Ok(Flow::Val(value))
        }
        Node::Deref {
            base,
            index,
            default,
            pos,
        } => {
            let base = flow_val!(eval(base, env, ctx)?);
            let index = flow_val!(eval(index, env, ctx)?);
            let default = match default {
                Some(node) => Some(flow_val!(eval(node, env, ctx)?)),
                None => None,
            };
            Ok(Flow::Val(deref(&base, &index, default, pos)?))
        }
        Node::DerefAssign {
            base,
            index,
            value,
            pos,
        } => {
            let base = flow_val!(eval(base, env, ctx)?);
            let index = flow_val!(eval(index, env, ctx)?);
            let value = flow_val!(eval(value, env, ctx)?);
            deref_assign(&base, index, value.clone(), pos)?;
            Ok(Flow::Val(value))
        }
        Node::DerefSlice { base, from, to, pos } => {
            let base = flow_val!(eval(base, env, ctx)?);
            let from = match from {
                Some(node) => Some(flow_val!(eval(node, env, ctx)?)),
                None => None,
            };
            let to = match to {
                Some(node) => Some(flow_val!(eval(node, env, ctx)?)),
                None => None,
            };
            Ok(Flow::Val(slice(&base, from, to, pos)?))
        }
        Node::DerefInvoke {
            base,
            member,
            args,
            pos,
        } => {
            let base = flow_val!(eval(base, env, ctx)?);
            let callee = match &base {
                Value::Object(obj) => object_lookup(obj, member, pos)?.ok_or_else(|| {
                    ControlError::new(
                        format!("object has no member '{}'", member),
                        pos.clone(),
                    )
                })?,
                // A map member invoke is an ordinary key lookup followed by
                // a call, same as `m['f']()`.
                Value::Map(_) => deref(&base, &Value::from_string(member.as_str()), None, pos)?,
                other => {
                    return Err(ControlError::new(
                        format!("cannot invoke member on a {}", other.type_name()),
                        pos.clone(),
                    ))
                }
            };
            let mut call_args = args_val!(eval_args(args, env, ctx)?);
            // An object method whose first parameter is named `self`
            // receives the object it was invoked on.
            if matches!(&base, Value::Object(_)) {
                if let Value::Func(Func::Lambda(lambda)) = &callee {
                    let takes_self = lambda
                        .def
                        .params
                        .first()
                        .map(|p| p.name == "self")
                        .unwrap_or(false);
                    if takes_self {
                        call_args.insert(0, (Some("self".to_string()), base.clone()));
                    }
                }
            }
            Ok(Flow::Val(call_value(ctx, &callee, call_args, pos)?))
        }
        Node::Funcall { func, args, pos } => {
            let callee = flow_val!(eval(func, env, ctx)?);
            let call_args = args_val!(eval_args(args, env, ctx)?);
            Ok(Flow::Val(call_value(ctx, &callee, call_args, pos)?))
        }
        Node::Lambda { def, .. } => Ok(Flow::Val(Value::Func(Func::Lambda(Rc::new(
            LambdaClosure {
                name: RefCell::new(None),
                def: def.clone(),
                env: env.clone(),
            },
        ))))),
        Node::Block {
            statements,
            catches,
            finally_stmts,
            ..
        } => eval_block(statements, catches, finally_stmts, env, ctx),
        Node::If {
            branches,
            else_branch,
            pos,
        } => {
            for (cond, body) in branches {
                if bool_val!(eval_condition(cond, env, ctx, pos)?) {
                    return eval(body, env, ctx);
                }
            }
            match else_branch {
                Some(body) => eval(body, env, ctx),
                None => Ok(Flow::Val(Value::Null)),
            }
        }
        Node::While { cond, body, pos } => {
            let mut result = Value::Null;
            loop {
                if !bool_val!(eval_condition(cond, env, ctx, pos)?) {
                    return Ok(Flow::Val(result));
                }
                match eval(body, env, ctx)? {
                    Flow::Val(v) => result = v,
                    Flow::Continue => continue,
                    Flow::Break => return Ok(Flow::Val(Value::Boolean(true))),
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
        }
        Node::For {
            idents,
            what,
            source,
            body,
            pos,
        } => {
            let source = flow_val!(eval(source, env, ctx)?);
            let items = iteration_items(&source, *what, pos)?;
            let result = eval_for(idents, items, body, env, ctx, pos);
            // Iteration variables never leak past the loop.
            for ident in idents {
                env.remove_local(ident);
            }
            result
        }
        Node::ListLiteral { items, .. } => {
            let mut out = Vec::new();
            for item in items {
                flow_val!(eval_element(item, env, ctx, &mut out)?);
            }
            Ok(Flow::Val(Value::list(out)))
        }
        Node::SetLiteral { items, .. } => {
            let mut out = Vec::new();
            for item in items {
                flow_val!(eval_element(item, env, ctx, &mut out)?);
            }
            Ok(Flow::Val(Value::set_of(out)))
        }
        Node::MapLiteral { entries, .. } => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                let key = flow_val!(eval(key, env, ctx)?);
                let value = flow_val!(eval(value, env, ctx)?);
                map.insert(ValueKey(key), value);
            }
            Ok(Flow::Val(Value::Map(Rc::new(RefCell::new(map)))))
        }
        Node::ObjectLiteral { entries, .. } => {
            let mut data = ObjectData::new();
            for (key, value) in entries {
                let value = flow_val!(eval(value, env, ctx)?);
                name_lambda(&value, key);
                data.put(key.clone(), value);
            }
            Ok(Flow::Val(Value::object(data)))
        }
        Node::ListComprehension {
            expr,
            var,
            source,
            cond,
            pos,
        } => {
            let source = flow_val!(eval(source, env, ctx)?);
            let items = iteration_items(&source, ForWhat::Default, pos)?;
            let scope = Environment::with_parent(env.clone());
            let mut out = Vec::new();
            for item in items {
                scope.define(var.clone(), item);
                if !bool_val!(eval_filter(cond, &scope, ctx, pos)?) {
                    continue;
                }
                out.push(flow_val!(eval(expr, &scope, ctx)?));
            }
            Ok(Flow::Val(Value::list(out)))
        }
        Node::SetComprehension {
            expr,
            var,
            source,
            cond,
            pos,
        } => {
            let source = flow_val!(eval(source, env, ctx)?);
            let items = iteration_items(&source, ForWhat::Default, pos)?;
            let scope = Environment::with_parent(env.clone());
            let mut out = BTreeSet::new();
            for item in items {
                scope.define(var.clone(), item);
                if !bool_val!(eval_filter(cond, &scope, ctx, pos)?) {
                    continue;
                }
                out.insert(ValueKey(flow_val!(eval(expr, &scope, ctx)?)));
            }
            Ok(Flow::Val(Value::Set(Rc::new(RefCell::new(out)))))
        }
        Node::MapComprehension {
            key,
            value,
            var,
            source,
            cond,
            pos,
        } => {
            let source = flow_val!(eval(source, env, ctx)?);
            let items = iteration_items(&source, ForWhat::Default, pos)?;
            let scope = Environment::with_parent(env.clone());
            let mut out = BTreeMap::new();
            for item in items {
                scope.define(var.clone(), item);
                if !bool_val!(eval_filter(cond, &scope, ctx, pos)?) {
                    continue;
                }
                let k = flow_val!(eval(key, &scope, ctx)?);
                let v = flow_val!(eval(value, &scope, ctx)?);
                out.insert(ValueKey(k), v);
            }
            Ok(Flow::Val(Value::Map(Rc::new(RefCell::new(out)))))
        }
        Node::SetComprehensionProduct {
            expr,
            var1,
            source1,
            var2,
            source2,
            cond,
            pos,
        } => {
            let source1 = flow_val!(eval(source1, env, ctx)?);
            let source2 = flow_val!(eval(source2, env, ctx)?);
            let items1 = iteration_items(&source1, ForWhat::Default, pos)?;
            let items2 = iteration_items(&source2, ForWhat::Default, pos)?;
            let scope = Environment::with_parent(env.clone());
            let mut out = BTreeSet::new();
            for a in &items1 {
                scope.define(var1.clone(), a.clone());
                for b in &items2 {
                    scope.define(var2.clone(), b.clone());
                    if !bool_val!(eval_filter(cond, &scope, ctx, pos)?) {
                        continue;
                    }
                    out.insert(ValueKey(flow_val!(eval(expr, &scope, ctx)?)));
                }
            }
            Ok(Flow::Val(Value::Set(Rc::new(RefCell::new(out)))))
        }
        Node::MapComprehensionProduct {
            key,
            value,
            var1,
            source1,
            var2,
            source2,
            cond,
            pos,
        } => {
            let source1 = flow_val!(eval(source1, env, ctx)?);
            let source2 = flow_val!(eval(source2, env, ctx)?);
            let items1 = iteration_items(&source1, ForWhat::Default, pos)?;
            let items2 = iteration_items(&source2, ForWhat::Default, pos)?;
            let scope = Environment::with_parent(env.clone());
            let mut out = BTreeMap::new();
            for a in &items1 {
                scope.define(var1.clone(), a.clone());
                for b in &items2 {
                    scope.define(var2.clone(), b.clone());
                    if !bool_val!(eval_filter(cond, &scope, ctx, pos)?) {
                        continue;
                    }
                    let k = flow_val!(eval(key, &scope, ctx)?);
                    let v = flow_val!(eval(value, &scope, ctx)?);
                    out.insert(ValueKey(k), v);
                }
            }
            Ok(Flow::Val(Value::Map(Rc::new(RefCell::new(out)))))
        }
        Node::Spread { pos, .. } => Err(ControlError::new(
            "spread is only allowed in call arguments and collection literals",
            pos.clone(),
        )),
        Node::And { left, right, pos } => {
            if !bool_val!(eval_condition(left, env, ctx, pos)?) {
                return Ok(Flow::Val(Value::Boolean(false)));
            }
            let right = bool_val!(eval_condition(right, env, ctx, pos)?);
            Ok(Flow::Val(Value::Boolean(right)))
        }
        Node::Or { left, right, pos } => {
            if bool_val!(eval_condition(left, env, ctx, pos)?) {
                return Ok(Flow::Val(Value::Boolean(true)));
            }
            let right = bool_val!(eval_condition(right, env, ctx, pos)?);
            Ok(Flow::Val(Value::Boolean(right)))
        }
        Node::Xor { left, right, pos } => {
            let left = bool_val!(eval_condition(left, env, ctx, pos)?);
            let right = bool_val!(eval_condition(right, env, ctx, pos)?);
            Ok(Flow::Val(Value::Boolean(left != right)))
        }
        Node::Not { expr, pos } => {
            let operand = bool_val!(eval_condition(expr, env, ctx, pos)?);
            Ok(Flow::Val(Value::Boolean(!operand)))
        }
        Node::Return { expr, .. } => {
            let value = match expr {
                Some(expr) => flow_val!(eval(expr, env, ctx)?),
                None => Value::Null,
            };
            Ok(Flow::Return(value))
        }
        Node::Break { .. } => Ok(Flow::Break),
        Node::Continue { .. } => Ok(Flow::Continue),
        Node::Raise { expr, pos } => {
            let payload = flow_val!(eval(expr, env, ctx)?);
            Err(ControlError::with_value(payload, pos.clone()))
        }
        Node::Require { spec, alias, pos } => {
            let module = require_module(spec, ctx, pos)?;
            let name = alias.clone().unwrap_or_else(|| module_basename(spec));
            env.define(name, module.clone());
            Ok(Flow::Val(module))
        }
    }
}

// ── Calls ────────────────────────────────────────────────────────────────

fn eval_args(
    args: &[CallArg],
    env: &Rc<Environment>,
    ctx: &mut Ctx,
) -> Result<ArgsFlow, ControlError> {
    let mut out = Vec::new();
    for arg in args {
        if let Node::Spread { expr, pos } = &arg.value {
            let value = match eval(expr, env, ctx)? {
                Flow::Val(v) => v,
                signal => return Ok(ArgsFlow::Signal(signal)),
            };
            expand_spread(value, &mut out, pos)?;
        } else {
            let value = match eval(&arg.value, env, ctx)? {
                Flow::Val(v) => v,
                signal => return Ok(ArgsFlow::Signal(signal)),
            };
            out.push((arg.name.clone(), value));
        }
    }
    Ok(ArgsFlow::Args(out))
}

/// Invoke any callable value with already-evaluated arguments.
pub(crate) fn call_value(
    ctx: &mut Ctx,
    callee: &Value,
    args: Vec<(Option<String>, Value)>,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    match callee {
        Value::Func(Func::Native(native)) => {
            let params: Vec<BindParam> = native
                .params
                .iter()
                .map(|p| BindParam {
                    name: p.name.to_string(),
                    has_default: p.default.is_some(),
                    rest: p.rest,
                })
                .collect();
            let slots = bind(native.name, &params, args, pos)?;
            let mut bound = Vec::new();
            for (param, slot) in native.params.iter().zip(slots) {
                let value = match slot {
                    Slot::Bound(v) => v,
                    Slot::Unbound => param.default.clone().unwrap_or(Value::Null),
                };
                bound.push((param.name, value));
            }
            (native.f)(ctx, &BoundArgs::new(bound), pos).map_err(|mut err| {
                err.add_frame(native.name, pos.clone());
                err
            })
        }
        Value::Func(Func::Lambda(lambda)) => {
            let name = lambda.display_name();
            let callee_env = Environment::with_parent(lambda.env.clone());
            let params: Vec<BindParam> = lambda
                .def
                .params
                .iter()
                .map(|p| BindParam {
                    name: p.name.clone(),
                    has_default: p.default.is_some(),
                    rest: p.rest,
                })
                .collect();
            let slots = bind(&name, &params, args, pos)?;
            // Defaults are evaluated lazily in the callee environment, in
            // declaration order, so a default may reference an earlier
            // parameter or an outer binding.
            for (param, slot) in lambda.def.params.iter().zip(slots) {
                let value = match slot {
                    Slot::Bound(v) => v,
                    Slot::Unbound => match &param.default {
                        Some(default) => match eval(default, &callee_env, ctx)? {
                            Flow::Val(v) => v,
                            _ => {
                                return Err(ControlError::new(
                                    format!(
                                        "{}: control signal in default for '{}'",
                                        name, param.name
                                    ),
                                    pos.clone(),
                                ))
                            }
                        },
                        None => Value::Null,
                    },
                };
                callee_env.define(param.name.clone(), value);
            }
            let flow = eval(&lambda.def.body, &callee_env, ctx).map_err(|mut err| {
                err.add_frame(name.clone(), pos.clone());
                err
            })?;
            match flow {
                Flow::Val(v) | Flow::Return(v) => Ok(v),
                Flow::Break | Flow::Continue => Err(ControlError::new(
                    "break/continue used without surrounding loop",
                    pos.clone(),
                )),
            }
        }
        other => Err(ControlError::new(
            format!("cannot call a {}", other.type_name()),
            pos.clone(),
        )),
    }
}

// ── Blocks, loops, conditions ────────────────────────────────────────────

fn eval_block(
    statements: &[Node],
    catches: &[CatchClause],
    finally_stmts: &[Node],
    env: &Rc<Environment>,
    ctx: &mut Ctx,
) -> Result<Flow, ControlError> {
    let mut result = Ok(Flow::Val(Value::Null));
    for stmt in statements {
        match eval(stmt, env, ctx) {
            Ok(Flow::Val(v)) => result = Ok(Flow::Val(v)),
            Ok(signal) => {
                result = Ok(signal);
                break;
            }
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }

    if let Err(err) = &result {
        if let Some(clause) = matching_catch(catches, err, env, ctx)? {
            result = eval(&clause.body, env, ctx);
        }
    }

    // `finally` runs on every exit path; a failure inside it replaces the
    // pending outcome.
    for stmt in finally_stmts {
        match eval(stmt, env, ctx) {
            Ok(_) => {}
            Err(err) => return Err(err),
        }
    }

    result
}

fn matching_catch<'a>(
    catches: &'a [CatchClause],
    err: &ControlError,
    env: &Rc<Environment>,
    ctx: &mut Ctx,
) -> Result<Option<&'a CatchClause>, ControlError> {
    for clause in catches {
        match &clause.etype {
            None => return Ok(Some(clause)),
            Some(etype) => {
                if let Flow::Val(wanted) = eval(etype, env, ctx)? {
                    if is_equals(&wanted, &err.value) {
                        return Ok(Some(clause));
                    }
                }
            }
        }
    }
    Ok(None)
}

fn eval_for(
    idents: &[String],
    items: Vec<Value>,
    body: &Node,
    env: &Rc<Environment>,
    ctx: &mut Ctx,
    pos: &SourcePos,
) -> Result<Flow, ControlError> {
    let mut result = Value::Null;
    for item in items {
        if idents.len() == 1 {
            env.define(idents[0].clone(), item);
        } else {
            let parts = destructure_source(&item, idents.len(), pos)?;
            for (ident, part) in idents.iter().zip(parts) {
                env.define(ident.clone(), part);
            }
        }
        match eval(body, env, ctx)? {
            Flow::Val(v) => result = v,
            Flow::Continue => continue,
            Flow::Break => return Ok(Flow::Val(Value::Boolean(true))),
            ret @ Flow::Return(_) => return Ok(ret),
        }
    }
    Ok(Flow::Val(result))
}

fn eval_condition(
    cond: &Node,
    env: &Rc<Environment>,
    ctx: &mut Ctx,
    pos: &SourcePos,
) -> Result<BoolFlow, ControlError> {
    match eval(cond, env, ctx)? {
        Flow::Val(Value::Boolean(b)) => Ok(BoolFlow::Bool(b)),
        Flow::Val(other) => Err(ControlError::new(
            format!("condition must be a boolean, got {}", other.type_name()),
            pos.clone(),
        )),
        signal => Ok(BoolFlow::Signal(signal)),
    }
}

fn eval_filter(
    cond: &Option<Box<Node>>,
    scope: &Rc<Environment>,
    ctx: &mut Ctx,
    pos: &SourcePos,
) -> Result<BoolFlow, ControlError> {
    match cond {
        None => Ok(BoolFlow::Bool(true)),
        Some(cond) => eval_condition(cond, scope, ctx, pos),
    }
}

// ── Dereference ──────────────────────────────────────────────────────────

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if index < 0 { index + len } else { index };
    if idx >= 0 && idx < len {
        Some(idx as usize)
    } else {
        None
    }
}

fn deref(
    base: &Value,
    index: &Value,
    default: Option<Value>,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    if default.is_some() && !matches!(base, Value::Map(_)) {
        return Err(ControlError::new(
            "deref default is only allowed for map lookup",
            pos.clone(),
        ));
    }
    match base {
        Value::Str(s) => {
            let i = int_index(index, pos)?;
            let chars: Vec<char> = s.chars().collect();
            let idx = normalize_index(i, chars.len()).ok_or_else(|| {
                ControlError::new(format!("string index {} out of bounds", i), pos.clone())
            })?;
            Ok(Value::from_string(chars[idx].to_string()))
        }
        Value::List(items) => {
            let i = int_index(index, pos)?;
            let items = items.borrow();
            let idx = normalize_index(i, items.len()).ok_or_else(|| {
                ControlError::new(format!("list index {} out of bounds", i), pos.clone())
            })?;
            Ok(items[idx].clone())
        }
        Value::Map(entries) => {
            let key = ValueKey(index.clone());
            match entries.borrow().get(&key) {
                Some(v) => Ok(v.clone()),
                None => match default {
                    Some(v) => Ok(v),
                    None => Err(ControlError::new(
                        format!("map has no key {}", index),
                        pos.clone(),
                    )),
                },
            }
        }
        Value::Object(obj) => {
            let key = match index {
                Value::Str(key) => key,
                other => {
                    return Err(ControlError::new(
                        format!("object key must be a string, got {}", other.type_name()),
                        pos.clone(),
                    ))
                }
            };
            Ok(object_lookup(obj, key, pos)?.unwrap_or(Value::Null))
        }
        other => Err(ControlError::new(
            format!("cannot index a {}", other.type_name()),
            pos.clone(),
        )),
    }
}

fn deref_assign(
    base: &Value,
    index: Value,
    value: Value,
    pos: &SourcePos,
) -> Result<(), ControlError> {
    match base {
        Value::List(items) => {
            let i = int_index(&index, pos)?;
            let mut items = items.borrow_mut();
            let len = items.len();
            let idx = normalize_index(i, len).ok_or_else(|| {
                ControlError::new(format!("list index {} out of bounds", i), pos.clone())
            })?;
            items[idx] = value;
            Ok(())
        }
        Value::Map(entries) => {
            entries.borrow_mut().insert(ValueKey(index), value);
            Ok(())
        }
        Value::Object(obj) => match index {
            Value::Str(key) => {
                obj.borrow_mut().put(key.as_ref().clone(), value);
                Ok(())
            }
            other => Err(ControlError::new(
                format!("object key must be a string, got {}", other.type_name()),
                pos.clone(),
            )),
        },
        other => Err(ControlError::new(
            format!("cannot assign into a {}", other.type_name()),
            pos.clone(),
        )),
    }
}

/// Slice with negative-index normalization then clamping; never fails on
/// out-of-range bounds, unlike point indexing.
fn slice(
    base: &Value,
    from: Option<Value>,
    to: Option<Value>,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    let bounds = |len: usize| -> Result<(usize, usize), ControlError> {
        let len_i = len as i64;
        let norm = |v: Option<&Value>, default: i64| -> Result<i64, ControlError> {
            match v {
                None => Ok(default),
                Some(v) => {
                    let i = int_index(v, pos)?;
                    Ok(if i < 0 { i + len_i } else { i })
                }
            }
        };
        let start = norm(from.as_ref(), 0)?.clamp(0, len_i) as usize;
        let end = norm(to.as_ref(), len_i)?.clamp(0, len_i) as usize;
        Ok((start, end.max(start)))
    };
    match base {
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = bounds(chars.len())?;
            Ok(Value::from_string(
                chars[start..end].iter().collect::<String>(),
            ))
        }
        Value::List(items) => {
            let items = items.borrow();
            let (start, end) = bounds(items.len())?;
            Ok(Value::list(items[start..end].to_vec()))
        }
        other => Err(ControlError::new(
            format!("cannot slice a {}", other.type_name()),
            pos.clone(),
        )),
    }
}

fn int_index(value: &Value, pos: &SourcePos) -> Result<i64, ControlError> {
    match value {
        Value::Int(i) => Ok(*i),
        other => Err(ControlError::new(
            format!("index must be an int, got {}", other.type_name()),
            pos.clone(),
        )),
    }
}

/// Walk the `_proto_` chain looking for a key. A chain cycle is reported
/// instead of looping forever.
fn object_lookup(
    obj: &Rc<RefCell<ObjectData>>,
    key: &str,
    pos: &SourcePos,
) -> Result<Option<Value>, ControlError> {
    let mut visited: Vec<*const RefCell<ObjectData>> = Vec::new();
    let mut current = obj.clone();
    loop {
        let ptr = Rc::as_ptr(&current);
        if visited.contains(&ptr) {
            return Err(ControlError::new(
                "prototype chain contains a cycle",
                pos.clone(),
            ));
        }
        visited.push(ptr);
        let (found, proto) = {
            let data = current.borrow();
            (data.get(key).cloned(), data.get("_proto_").cloned())
        };
        if let Some(value) = found {
            return Ok(Some(value));
        }
        match proto {
            Some(Value::Object(next)) => current = next,
            _ => return Ok(None),
        }
    }
}

// ── Iteration sources, destructuring, elements ───────────────────────────

fn iteration_items(
    source: &Value,
    what: ForWhat,
    pos: &SourcePos,
) -> Result<Vec<Value>, ControlError> {
    match source {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Set(items) => Ok(items.borrow().iter().map(|k| k.0.clone()).collect()),
        Value::Map(entries) => {
            let entries = entries.borrow();
            Ok(match what {
                ForWhat::Keys => entries.keys().map(|k| k.0.clone()).collect(),
                ForWhat::Entries => entries
                    .iter()
                    .map(|(k, v)| Value::list(vec![k.0.clone(), v.clone()]))
                    .collect(),
                // Values is the default view of a map.
                ForWhat::Values | ForWhat::Default => entries.values().cloned().collect(),
            })
        }
        Value::Object(obj) => {
            let obj = obj.borrow();
            Ok(match what {
                ForWhat::Keys => obj
                    .iter()
                    .map(|(k, _)| Value::from_string(k.clone()))
                    .collect(),
                ForWhat::Entries => obj
                    .iter()
                    .map(|(k, v)| {
                        Value::list(vec![Value::from_string(k.clone()), v.clone()])
                    })
                    .collect(),
                ForWhat::Values | ForWhat::Default => {
                    obj.iter().map(|(_, v)| v.clone()).collect()
                }
            })
        }
        Value::Str(s) => Ok(s
            .chars()
            .map(|c| Value::from_string(c.to_string()))
            .collect()),
        Value::Input(input) => {
            let mut lines = Vec::new();
            let mut input = input.borrow_mut();
            while let Some(line) = input.read_line().map_err(|err| {
                ControlError::new(format!("input read failed: {}", err), pos.clone())
            })? {
                lines.push(Value::from_string(line));
            }
            Ok(lines)
        }
        other => Err(ControlError::new(
            format!("cannot iterate a {}", other.type_name()),
            pos.clone(),
        )),
    }
}

/// Elements for destructuring: iteration order of a List or Set, padded with
/// Null when the source is shorter than the target list.
fn destructure_source(
    value: &Value,
    count: usize,
    pos: &SourcePos,
) -> Result<Vec<Value>, ControlError> {
    let mut parts = match value {
        Value::List(items) => items.borrow().clone(),
        Value::Set(items) => items.borrow().iter().map(|k| k.0.clone()).collect(),
        other => {
            return Err(ControlError::new(
                format!("cannot destructure a {}", other.type_name()),
                pos.clone(),
            ))
        }
    };
    parts.resize(count, Value::Null);
    parts.truncate(count);
    Ok(parts)
}

fn eval_element(
    item: &Node,
    env: &Rc<Environment>,
    ctx: &mut Ctx,
    out: &mut Vec<Value>,
) -> Result<Flow, ControlError> {
    if let Node::Spread { expr, pos } = item {
        let value = flow_val!(eval(expr, env, ctx)?);
        match value {
            Value::List(items) => out.extend(items.borrow().iter().cloned()),
            Value::Set(items) => out.extend(items.borrow().iter().map(|k| k.0.clone())),
            other => {
                return Err(ControlError::new(
                    format!("cannot spread a {}", other.type_name()),
                    pos.clone(),
                ))
            }
        }
    } else {
        out.push(flow_val!(eval(item, env, ctx)?));
    }
    Ok(Flow::Val(Value::Null))
}

// ── Modules ──────────────────────────────────────────────────────────────

fn require_module(
    spec: &str,
    ctx: &mut Ctx,
    pos: &SourcePos,
) -> Result<Value, ControlError> {
    if let Some(cached) = ctx.modules.get(spec) {
        return Ok(cached.clone());
    }
    let source = ctx
        .host
        .read_module(spec)
        .map_err(|err| ControlError::new(format!("module not found: {}", err), pos.clone()))?;
    let program = crate::parser::parse_script(&source, spec).map_err(|err| {
        ControlError::new(
            format!("syntax error in module '{}': {}", spec, err.message),
            err.pos,
        )
    })?;
    let module_env = Environment::with_parent(ctx.root.clone());
    match eval(&program, &module_env, ctx)? {
        Flow::Val(_) | Flow::Return(_) => {}
        Flow::Break | Flow::Continue => {
            return Err(ControlError::new(
                "break/continue used without surrounding loop",
                pos.clone(),
            ))
        }
    }
    let mut data = ObjectData::new();
    let mut names = module_env.local_names();
    names.sort();
    for name in names {
        if let Some(value) = module_env.get(&name) {
            data.put(name, value);
        }
    }
    let module = Value::object(data);
    ctx.modules.insert(spec.to_string(), module.clone());
    Ok(module)
}

pub(crate) fn module_basename(spec: &str) -> String {
    let stem = spec.rsplit(['/', '\\']).next().unwrap_or(spec);
    stem.strip_suffix(".regel").unwrap_or(stem).to_string()
}

fn name_lambda(value: &Value, name: &str) {
    if let Value::Func(Func::Lambda(lambda)) = value {
        let mut slot = lambda.name.borrow_mut();
        if slot.is_none() {
            *slot = Some(name.to_string());
        }
    }
}
