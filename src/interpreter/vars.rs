use std::collections::BTreeSet;

use crate::ast::{CallArg, Node};

/// Free-variable analysis: the names a tree references without binding them
/// itself. Used by hosts to discover which inputs a rule script needs.
pub(crate) fn free_variables(node: &Node) -> BTreeSet<String> {
    let mut collector = VarCollector {
        free: BTreeSet::new(),
        scopes: vec![BTreeSet::new()],
    };
    collector.walk(node);
    collector.free
}

struct VarCollector {
    free: BTreeSet<String>,
    scopes: Vec<BTreeSet<String>>,
}

impl VarCollector {
    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.contains(name))
    }

    fn bind(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn reference(&mut self, name: &str) {
        if !self.is_bound(name) {
            self.free.insert(name.to_string());
        }
    }

    fn walk_args(&mut self, args: &[CallArg]) {
        for arg in args {
            self.walk(&arg.value);
        }
    }

    fn walk(&mut self, node: &Node) {
        match node {
            Node::Literal { .. } | Node::Break { .. } | Node::Continue { .. } => {}
            Node::Identifier { name, .. } => self.reference(name),
            Node::Def { name, value, .. } => {
                self.walk(value);
                self.bind(name);
            }
            Node::DefDestructuring { names, value, .. } => {
                self.walk(value);
                for name in names {
                    self.bind(name);
                }
            }
            Node::Assign { name, value, .. } => {
                self.reference(name);
                self.walk(value);
            }
            Node::DestructuringAssign { names, value, .. } => {
                for name in names {
                    self.reference(name);
                }
                self.walk(value);
            }
            Node::Deref {
                base,
                index,
                default,
                ..
            } => {
                self.walk(base);
                self.walk(index);
                if let Some(default) = default {
                    self.walk(default);
                }
            }
            Node::DerefAssign {
                base, index, value, ..
            } => {
                self.walk(base);
                self.walk(index);
                self.walk(value);
            }
            Node::DerefSlice { base, from, to, .. } => {
                self.walk(base);
                if let Some(from) = from {
                    self.walk(from);
                }
                if let Some(to) = to {
                    self.walk(to);
                }
            }
            Node::DerefInvoke { base, args, .. } => {
                self.walk(base);
                self.walk_args(args);
            }
            Node::Funcall { func, args, .. } => {
                self.walk(func);
                self.walk_args(args);
            }
            Node::Lambda { def, .. } => {
                self.scopes.push(BTreeSet::new());
                for param in &def.params {
                    self.bind(&param.name);
                }
                for param in &def.params {
                    if let Some(default) = &param.default {
                        self.walk(default);
                    }
                }
                self.walk_block_body(&def.body);
                self.scopes.pop();
            }
            // `do…end` shares the enclosing frame at runtime, so its defs
            // stay visible after the block ends.
            Node::Block { .. } => self.walk_block_body(node),
            Node::If {
                branches,
                else_branch,
                ..
            } => {
                for (cond, body) in branches {
                    self.walk(cond);
                    self.walk(body);
                }
                if let Some(else_branch) = else_branch {
                    self.walk(else_branch);
                }
            }
            Node::While { cond, body, .. } => {
                self.walk(cond);
                self.walk(body);
            }
            Node::For {
                idents,
                source,
                body,
                ..
            } => {
                self.walk(source);
                self.scopes.push(BTreeSet::new());
                for ident in idents {
                    self.bind(ident);
                }
                self.walk(body);
                self.scopes.pop();
            }
            Node::ListLiteral { items, .. } | Node::SetLiteral { items, .. } => {
                for item in items {
                    self.walk(item);
                }
            }
            Node::MapLiteral { entries, .. } => {
                for (key, value) in entries {
                    self.walk(key);
                    self.walk(value);
                }
            }
            Node::ObjectLiteral { entries, .. } => {
                for (_, value) in entries {
                    self.walk(value);
                }
            }
            Node::ListComprehension {
                expr,
                var,
                source,
                cond,
                ..
            }
            | Node::SetComprehension {
                expr,
                var,
                source,
                cond,
                ..
            } => {
                self.walk(source);
                self.scopes.push(BTreeSet::new());
                self.bind(var);
                if let Some(cond) = cond {
                    self.walk(cond);
                }
                self.walk(expr);
                self.scopes.pop();
            }
            Node::MapComprehension {
                key,
                value,
                var,
                source,
                cond,
                ..
            } => {
                self.walk(source);
                self.scopes.push(BTreeSet::new());
                self.bind(var);
                if let Some(cond) = cond {
                    self.walk(cond);
                }
                self.walk(key);
                self.walk(value);
                self.scopes.pop();
            }
            Node::SetComprehensionProduct {
                expr,
                var1,
                source1,
                var2,
                source2,
                cond,
                ..
            } => {
                self.walk(source1);
                self.walk(source2);
                self.scopes.push(BTreeSet::new());
                self.bind(var1);
                self.bind(var2);
                if let Some(cond) = cond {
                    self.walk(cond);
                }
                self.walk(expr);
                self.scopes.pop();
            }
            Node::MapComprehensionProduct {
                key,
                value,
                var1,
                source1,
                var2,
                source2,
                cond,
                ..
            } => {
                self.walk(source1);
                self.walk(source2);
                self.scopes.push(BTreeSet::new());
                self.bind(var1);
                self.bind(var2);
                if let Some(cond) = cond {
                    self.walk(cond);
                }
                self.walk(key);
                self.walk(value);
                self.scopes.pop();
            }
            Node::Spread { expr, .. }
            | Node::Not { expr, .. }
            | Node::Raise { expr, .. } => self.walk(expr),
            Node::And { left, right, .. }
            | Node::Or { left, right, .. }
            | Node::Xor { left, right, .. } => {
                self.walk(left);
                self.walk(right);
            }
            Node::Return { expr, .. } => {
                if let Some(expr) = expr {
                    self.walk(expr);
                }
            }
            Node::Require { spec, alias, .. } => {
                // Same default binding name as evaluation: the specifier's
                // basename, not the raw specifier.
                let name = alias
                    .clone()
                    .unwrap_or_else(|| super::eval::module_basename(spec));
                self.bind(&name);
            }
        }
    }

    /// Walk a block body (or a lambda's body) with its scope already pushed.
    /// Every top-level `def` target is pre-registered before the statements
    /// run, so out-of-order and mutually recursive definitions in the same
    /// block never count each other as free.
    fn walk_block_body(&mut self, body: &Node) {
        if let Node::Block {
            statements,
            catches,
            finally_stmts,
            ..
        } = body
        {
            for stmt in statements {
                match stmt {
                    Node::Def { name, .. } => self.bind(name),
                    Node::DefDestructuring { names, .. } => {
                        for name in names {
                            self.bind(name);
                        }
                    }
                    _ => {}
                }
            }
            for stmt in statements {
                self.walk(stmt);
            }
            for catch in catches {
                if let Some(etype) = &catch.etype {
                    self.walk(etype);
                }
                self.walk(&catch.body);
            }
            for stmt in finally_stmts {
                self.walk(stmt);
            }
        } else {
            self.walk(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;

    fn free(src: &str) -> Vec<String> {
        let node = parse_script(src, "<test>").expect("parse");
        free_variables(&node).into_iter().collect()
    }

    #[test]
    fn plain_references_are_free() {
        assert_eq!(free("x + y"), vec!["add", "x", "y"]);
    }

    #[test]
    fn defs_bind_for_later_statements() {
        assert_eq!(free("def x = 1; x"), Vec::<String>::new());
    }

    #[test]
    fn lambda_parameters_bind_only_inside_the_lambda() {
        assert_eq!(free("fn(x) x"), Vec::<String>::new());
        assert_eq!(free("(fn(x) x); x"), vec!["x"]);
    }

    #[test]
    fn block_defs_are_pre_registered_for_recursion() {
        let src = "def a = fn(x) do def y = x - 1; if x == 0 then 1 else x * a(y) end; a(10)";
        assert_eq!(free(src), vec!["equals", "mul", "sub"]);
    }

    #[test]
    fn comprehension_variable_is_scoped() {
        assert_eq!(free("[x for x in xs]"), vec!["xs"]);
    }

    #[test]
    fn block_defs_stay_bound_after_the_block() {
        assert_eq!(free("do def x = 1 end; x"), Vec::<String>::new());
        assert_eq!(free("def r = do def y = 2; y end; r + y"), vec!["add"]);
    }

    #[test]
    fn require_binds_the_basename_of_a_path_specifier() {
        assert_eq!(
            free("require 'strings/pad'; pad->width"),
            Vec::<String>::new()
        );
        assert_eq!(free("require money; money->cents(3)"), Vec::<String>::new());
        assert_eq!(free("require util as u; u->helper()"), Vec::<String>::new());
    }
}
