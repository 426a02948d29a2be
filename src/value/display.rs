use std::fmt;

use super::{Func, Value};

/// Quote a string the way the language writes string literals: single quotes
/// with the quote character and backslash escaped.
fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", quote_string(s)),
            Value::Pattern(p) => write!(f, "//{}//", p.source),
            Value::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Value::List(items) => {
                let parts: Vec<String> =
                    items.borrow().iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Set(items) => {
                let parts: Vec<String> =
                    items.borrow().iter().map(|k| k.0.to_string()).collect();
                write!(f, "<<{}>>", parts.join(", "))
            }
            Value::Map(entries) => {
                let parts: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{} => {}", k.0, v))
                    .collect();
                write!(f, "<<<{}>>>", parts.join(", "))
            }
            Value::Object(obj) => {
                // Keys starting with '_' (including _proto_) are hidden.
                let parts: Vec<String> = obj
                    .borrow()
                    .iter()
                    .filter(|(k, _)| !k.starts_with('_'))
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                write!(f, "<*{}*>", parts.join(", "))
            }
            Value::Func(func) => match func {
                Func::Native(n) => write!(f, "<#{}>", n.name),
                Func::Lambda(l) => match l.name.borrow().as_ref() {
                    Some(name) => write!(f, "<#{}>", name),
                    None => write!(f, "<#lambda>"),
                },
            },
            Value::Input(_) => write!(f, "<!input-stream>"),
            Value::Output(_) => write!(f, "<!output-stream>"),
            Value::Error(payload) => write!(f, "ERROR:{}", payload),
        }
    }
}

impl Value {
    /// Unquoted rendering, used by `string()`, concatenation and `print`.
    /// Only the String variant differs from `to_string`.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Str(s) => s.as_ref().clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Decimal, ObjectData, PatternValue, Value};

    #[test]
    fn strings_render_quoted_with_escapes() {
        assert_eq!(Value::from_string("a'b\\c").to_string(), "'a\\'b\\\\c'");
        assert_eq!(Value::from_string("plain").to_plain_string(), "plain");
    }

    #[test]
    fn collections_render_with_their_delimiters() {
        let list = Value::list(vec![Value::Int(1), Value::from_string("x")]);
        assert_eq!(list.to_string(), "[1, 'x']");
        let map = Value::map_of(vec![
            (Value::from_string("b"), Value::Int(2)),
            (Value::from_string("a"), Value::Int(1)),
        ]);
        assert_eq!(map.to_string(), "<<<'a' => 1, 'b' => 2>>>");
    }

    #[test]
    fn objects_hide_underscore_keys() {
        let mut data = ObjectData::new();
        data.put("x", Value::Int(1));
        data.put("_proto_", Value::Null);
        data.put("y", Value::Int(2));
        assert_eq!(Value::object(data).to_string(), "<*x=1, y=2*>");
    }

    #[test]
    fn scalar_variants_render_canonically() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(
            Value::Decimal(Decimal::parse("2.50").unwrap()).to_string(),
            "2.5"
        );
        assert_eq!(
            Value::Pattern(PatternValue::compile("[a-z]+").unwrap()).to_string(),
            "//[a-z]+//"
        );
    }
}
