use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{BufRead, Cursor};
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::ast::LambdaDef;
use crate::builtins::NativeFunc;
use crate::interpreter::environment::Environment;

mod decimal;
mod display;
mod error;
mod pattern;

pub use decimal::Decimal;
pub use error::{ControlError, LangError, SourcePos, SyntaxError, TraceFrame};
pub use pattern::PatternValue;

/// The runtime value union. List/Set/Map/Object are reference types: cloning
/// a Value clones the handle, and in-place mutation is visible through every
/// alias. All other variants copy on clone.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Decimal(Decimal),
    Str(Rc<String>),
    Pattern(PatternValue),
    Date(NaiveDateTime),
    List(Rc<RefCell<Vec<Value>>>),
    Set(Rc<RefCell<BTreeSet<ValueKey>>>),
    Map(Rc<RefCell<BTreeMap<ValueKey, Value>>>),
    Object(Rc<RefCell<ObjectData>>),
    Func(Func),
    Input(Rc<RefCell<InputHandle>>),
    Output(Rc<RefCell<OutputHandle>>),
    Error(Box<Value>),
}

/// A callable: either a registered native or a lambda closure.
#[derive(Clone)]
pub enum Func {
    Native(Rc<NativeFunc>),
    Lambda(Rc<LambdaClosure>),
}

/// A lambda paired with its defining environment. The name starts out empty
/// and is filled in retroactively when a `def` binds the lambda, so stack
/// traces can name user functions.
pub struct LambdaClosure {
    pub(crate) name: RefCell<Option<String>>,
    pub(crate) def: Rc<LambdaDef>,
    pub(crate) env: Rc<Environment>,
}

impl LambdaClosure {
    pub(crate) fn display_name(&self) -> String {
        match self.name.borrow().as_ref() {
            Some(name) => name.clone(),
            None => "lambda".to_string(),
        }
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Func::Native(n) => write!(f, "<#{}>", n.name),
            Func::Lambda(l) => write!(f, "<#{}>", l.display_name()),
        }
    }
}

/// Insertion-ordered string-keyed mapping backing the Object variant.
/// Prototype lookup through `_proto_` lives in the evaluator; this type only
/// stores the entries of one object.
#[derive(Debug, Default)]
pub struct ObjectData {
    entries: Vec<(String, Value)>,
}

impl ObjectData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or overwrite, keeping the original insertion position on
    /// overwrite.
    pub fn put(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        for entry in &mut self.entries {
            if entry.0 == key {
                entry.1 = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Opaque line-oriented input stream handle.
pub struct InputHandle {
    reader: Box<dyn BufRead>,
}

impl InputHandle {
    pub fn from_string(text: String) -> Self {
        Self {
            reader: Box::new(Cursor::new(text)),
        }
    }

    /// Next line without its terminator; None at end of stream.
    pub fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

impl fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<!input-stream>")
    }
}

/// Opaque output stream handle capturing into a string buffer.
#[derive(Debug, Default)]
pub struct OutputHandle {
    buffer: String,
}

impl OutputHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }
}

impl Value {
    pub fn from_string(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(s.into()))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn set_of(items: impl IntoIterator<Item = Value>) -> Value {
        let set: BTreeSet<ValueKey> = items.into_iter().map(ValueKey).collect();
        Value::Set(Rc::new(RefCell::new(set)))
    }

    pub fn map_of(pairs: impl IntoIterator<Item = (Value, Value)>) -> Value {
        let map: BTreeMap<ValueKey, Value> =
            pairs.into_iter().map(|(k, v)| (ValueKey(k), v)).collect();
        Value::Map(Rc::new(RefCell::new(map)))
    }

    pub fn object(data: ObjectData) -> Value {
        Value::Object(Rc::new(RefCell::new(data)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "string",
            Value::Pattern(_) => "pattern",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Func(_) => "func",
            Value::Input(_) => "input",
            Value::Output(_) => "output",
            Value::Error(_) => "error",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Type-aware equality. Int and Decimal compare numerically across the type
/// boundary; every other cross-type pairing is unequal. Collections compare
/// structurally, functions and streams by identity.
pub fn is_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Int(x), Value::Decimal(y)) => Decimal::from_i64(*x) == *y,
        (Value::Decimal(x), Value::Int(y)) => *x == Decimal::from_i64(*y),
        (Value::Decimal(x), Value::Decimal(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Pattern(x), Value::Pattern(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            Rc::ptr_eq(x, y) || {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| is_equals(a, b))
            }
        }
        (Value::Set(x), Value::Set(y)) => Rc::ptr_eq(x, y) || *x.borrow() == *y.borrow(),
        (Value::Map(x), Value::Map(y)) => {
            Rc::ptr_eq(x, y) || {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && is_equals(va, vb))
            }
        }
        (Value::Object(x), Value::Object(y)) => {
            Rc::ptr_eq(x, y) || {
                let (x, y) = (x.borrow(), y.borrow());
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && is_equals(va, vb))
            }
        }
        (Value::Func(x), Value::Func(y)) => match (x, y) {
            (Func::Native(a), Func::Native(b)) => Rc::ptr_eq(a, b),
            (Func::Lambda(a), Func::Lambda(b)) => Rc::ptr_eq(a, b),
            _ => false,
        },
        (Value::Input(x), Value::Input(y)) => Rc::ptr_eq(x, y),
        (Value::Output(x), Value::Output(y)) => Rc::ptr_eq(x, y),
        (Value::Error(x), Value::Error(y)) => is_equals(x, y),
        _ => false,
    }
}

/// The total order behind Set/Map ordering and `compare`: numeric types by
/// numeric value (Int promotes to Decimal when mixed), dates chronologically,
/// booleans false-before-true, strings by content, and every remaining
/// pairing by canonical comparison text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(x), Value::Decimal(y)) => Decimal::from_i64(*x).compare(y),
        (Value::Decimal(x), Value::Int(y)) => x.compare(&Decimal::from_i64(*y)),
        (Value::Decimal(x), Value::Decimal(y)) => x.compare(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => compare_text(a).cmp(&compare_text(b)),
    }
}

/// Text used for ordering in the cross-type fallback: strings contribute
/// their raw content (no quotes), everything else its rendered form.
fn compare_text(v: &Value) -> String {
    match v {
        Value::Str(s) => s.as_ref().clone(),
        other => other.to_string(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        is_equals(self, other)
    }
}

/// Ordering wrapper for Set members and Map keys. Eq/Ord follow
/// `compare_values`, so Set/Map uniqueness is defined by the total order.
#[derive(Debug, Clone)]
pub struct ValueKey(pub Value);

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        compare_values(&self.0, &other.0) == Ordering::Equal
    }
}

impl Eq for ValueKey {}

impl PartialOrd for ValueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_values(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_decimal_compare_equal_when_numerically_equal() {
        let a = Value::Int(3);
        let b = Value::Decimal(Decimal::parse("3.0").unwrap());
        assert!(is_equals(&a, &b));
        assert_eq!(compare_values(&a, &b), Ordering::Equal);
    }

    #[test]
    fn cross_type_equality_is_false() {
        assert!(!is_equals(&Value::Int(1), &Value::from_string("1")));
        assert!(!is_equals(&Value::Boolean(true), &Value::Int(1)));
    }

    #[test]
    fn list_equality_is_structural_and_aliasing_aware() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert!(is_equals(&a, &b));
        let alias = a.clone();
        if let (Value::List(x), Value::List(y)) = (&a, &alias) {
            assert!(Rc::ptr_eq(x, y));
        }
    }

    #[test]
    fn set_orders_members_by_total_order() {
        let set = Value::set_of(vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(set.to_string(), "<<1, 2, 3>>");
    }

    #[test]
    fn total_order_is_antisymmetric_on_numbers() {
        let vals = [
            Value::Int(-2),
            Value::Int(0),
            Value::Decimal(Decimal::parse("0.5").unwrap()),
            Value::Int(7),
        ];
        for (i, a) in vals.iter().enumerate() {
            for (j, b) in vals.iter().enumerate() {
                let fwd = compare_values(a, b);
                let rev = compare_values(b, a);
                assert_eq!(fwd, rev.reverse());
                if i == j {
                    assert_eq!(fwd, Ordering::Equal);
                }
            }
        }
    }
}
