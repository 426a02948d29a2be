use std::rc::Rc;

use crate::interpreter::environment::Environment;
use crate::interpreter::Ctx;
use crate::value::{ControlError, Func, SourcePos, Value};

mod arith;
mod collections;
mod compare;
mod io;
mod predicates;
mod strings;

pub(crate) type NativeFn =
    fn(&mut Ctx, &BoundArgs, &SourcePos) -> Result<Value, ControlError>;

/// One declared parameter of a native. Native defaults are plain values,
/// not lazily evaluated expressions.
pub(crate) struct NativeParam {
    pub(crate) name: &'static str,
    pub(crate) default: Option<Value>,
    pub(crate) rest: bool,
}

pub(crate) fn req(name: &'static str) -> NativeParam {
    NativeParam {
        name,
        default: None,
        rest: false,
    }
}

pub(crate) fn opt(name: &'static str, default: Value) -> NativeParam {
    NativeParam {
        name,
        default: Some(default),
        rest: false,
    }
}

pub(crate) fn rest(name: &'static str) -> NativeParam {
    NativeParam {
        name,
        default: None,
        rest: true,
    }
}

/// A built-in callable registered in the root environment. The argument
/// binder resolves the call site against `params` before `f` runs.
pub struct NativeFunc {
    pub name: &'static str,
    pub(crate) params: Vec<NativeParam>,
    pub(crate) f: NativeFn,
}

/// Arguments after binding, keyed by declared parameter name.
pub struct BoundArgs {
    values: Vec<(&'static str, Value)>,
}

impl BoundArgs {
    pub(crate) fn new(values: Vec<(&'static str, Value)>) -> Self {
        Self { values }
    }

    /// The bound value of a declared parameter. Binding guarantees every
    /// declared name is present, so a miss yields Null rather than a panic.
    pub(crate) fn get(&self, name: &str) -> Value {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)
    }
}

fn define(
    env: &Environment,
    name: &'static str,
    params: Vec<NativeParam>,
    f: NativeFn,
) {
    env.define(
        name,
        Value::Func(Func::Native(Rc::new(NativeFunc { name, params, f }))),
    );
}

/// Install the operational native set into the root environment.
pub(crate) fn register_all(env: &Environment) {
    arith::register(env);
    compare::register(env);
    predicates::register(env);
    collections::register(env);
    strings::register(env);
    io::register(env);
}

pub(crate) fn type_error(
    func: &str,
    expected: &str,
    got: &Value,
    pos: &SourcePos,
) -> ControlError {
    ControlError::new(
        format!("{}: expected {}, got {}", func, expected, got.type_name()),
        pos.clone(),
    )
}
