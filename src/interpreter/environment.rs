use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// One lexical scope frame. Frames are chained via `parent` and shared via
/// Rc, so closures keep their defining chain alive after the block that
/// created it has finished.
#[derive(Debug, Default)]
pub struct Environment {
    parent: Option<Rc<Environment>>,
    vars: RefCell<HashMap<String, Value>>,
}

impl Environment {
    pub fn new_root() -> Rc<Environment> {
        Rc::new(Environment::default())
    }

    pub fn with_parent(parent: Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            parent: Some(parent),
            vars: RefCell::new(HashMap::new()),
        })
    }

    /// Bind in this frame, shadowing any outer binding of the same name.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    /// Assign to the nearest frame already holding the name. Returns false
    /// when no frame binds it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
            || self.parent.as_ref().map(|p| p.is_defined(name)).unwrap_or(false)
    }

    /// Remove a binding from this frame only. Used by `for` to drop the loop
    /// variable after the loop.
    pub fn remove_local(&self, name: &str) -> Option<Value> {
        self.vars.borrow_mut().remove(name)
    }

    /// Names bound in this frame, ignoring the parent chain.
    pub fn local_names(&self) -> Vec<String> {
        self.vars.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_shadows_and_assign_walks_up() {
        let root = Environment::new_root();
        root.define("x", Value::Int(1));
        let inner = Environment::with_parent(root.clone());
        assert_eq!(inner.get("x"), Some(Value::Int(1)));

        inner.define("x", Value::Int(2));
        assert_eq!(inner.get("x"), Some(Value::Int(2)));
        assert_eq!(root.get("x"), Some(Value::Int(1)));

        let deeper = Environment::with_parent(inner.clone());
        assert!(deeper.assign("x", Value::Int(9)));
        assert_eq!(inner.get("x"), Some(Value::Int(9)));
        assert_eq!(root.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_to_unbound_name_fails() {
        let root = Environment::new_root();
        assert!(!root.assign("missing", Value::Int(1)));
    }

    #[test]
    fn remove_local_only_touches_own_frame() {
        let root = Environment::new_root();
        root.define("x", Value::Int(1));
        let inner = Environment::with_parent(root.clone());
        assert!(inner.remove_local("x").is_none());
        assert_eq!(inner.get("x"), Some(Value::Int(1)));
    }
}
