use super::Parser;
use crate::ast::{CatchClause, Node};
use crate::lexer::TokenKind;
use crate::value::SyntaxError;

impl Parser {
    /// Parse statements separated by optional `;` until one of the stop
    /// keywords (or end of input when `stop` is empty).
    pub(super) fn parse_statements(&mut self, stop: &[&str]) -> Result<Vec<Node>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            while self.eat_op(";") {}
            if self.at_end() || stop.iter().any(|s| self.at_kw(s)) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    pub(super) fn parse_statement(&mut self) -> Result<Node, SyntaxError> {
        if self.at_kw("require") {
            return self.parse_require();
        }
        if self.at_kw("def") {
            return self.parse_def();
        }
        if let Some(node) = self.try_parse_destructuring_assign()? {
            return Ok(node);
        }
        if let Some(node) = self.try_parse_name_assign()? {
            return Ok(node);
        }
        self.parse_expression()
    }

    /// `require <spec> [as <name>]` where the specifier is a string literal
    /// or a bare identifier.
    fn parse_require(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("require")?;
        let spec = match self.peek() {
            Some(tok) if tok.kind == TokenKind::Str || tok.kind == TokenKind::Identifier => {
                self.advance()?.text
            }
            _ => return Err(self.err_here("expected module specifier after 'require'")),
        };
        let alias = if self.eat_kw("as") {
            Some(self.expect_ident()?.text)
        } else {
            None
        };
        Ok(Node::Require {
            spec,
            alias,
            pos: kw.pos,
        })
    }

    /// `def name = expr` or `def [a, b] = expr`.
    fn parse_def(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("def")?;
        if self.eat_op("[") {
            let names = self.parse_ident_list("]")?;
            self.expect_op("=")?;
            let value = self.parse_expression()?;
            return Ok(Node::DefDestructuring {
                names,
                value: Box::new(value),
                pos: kw.pos,
            });
        }
        let name = self.expect_ident()?.text;
        self.expect_op("=")?;
        let value = self.parse_expression()?;
        Ok(Node::Def {
            name,
            value: Box::new(value),
            pos: kw.pos,
        })
    }

    /// Lookahead for `[a, b, ...] = expr` at statement level. Anything else
    /// starting with `[` is a list literal and is left untouched.
    fn try_parse_destructuring_assign(&mut self) -> Result<Option<Node>, SyntaxError> {
        if !self.at_op("[") {
            return Ok(None);
        }
        let mut n = 1;
        loop {
            match self.peek_at(n) {
                Some(tok) if tok.kind == TokenKind::Identifier => n += 1,
                _ => return Ok(None),
            }
            if self.at_op_n(n, ",") {
                n += 1;
                continue;
            }
            if self.at_op_n(n, "]") {
                n += 1;
                break;
            }
            return Ok(None);
        }
        if !self.at_op_n(n, "=") {
            return Ok(None);
        }
        let open = self.expect_op("[")?;
        let names = self.parse_ident_list("]")?;
        self.expect_op("=")?;
        let value = self.parse_expression()?;
        Ok(Some(Node::DestructuringAssign {
            names,
            value: Box::new(value),
            pos: open.pos,
        }))
    }

    /// `name = expr` and the compound forms `name += expr` etc., which
    /// desugar to the matching arithmetic funcall.
    fn try_parse_name_assign(&mut self) -> Result<Option<Node>, SyntaxError> {
        let is_ident = matches!(self.peek(), Some(tok) if tok.kind == TokenKind::Identifier);
        if !is_ident {
            return Ok(None);
        }
        let op = ["=", "+=", "-=", "*=", "/=", "%="]
            .iter()
            .find(|op| self.at_op_n(1, op))
            .copied();
        let op = match op {
            Some(op) => op,
            None => return Ok(None),
        };
        let name_tok = self.expect_ident()?;
        self.advance()?;
        let value = self.parse_expression()?;
        let value = match op {
            "=" => value,
            compound => {
                let func = compound_funcall_name(compound);
                let current = Node::Identifier {
                    name: name_tok.text.clone(),
                    pos: name_tok.pos.clone(),
                };
                self.make_funcall(func, vec![current, value], name_tok.pos.clone())
            }
        };
        Ok(Some(Node::Assign {
            name: name_tok.text,
            value: Box::new(value),
            pos: name_tok.pos,
        }))
    }

    fn parse_ident_list(&mut self, close: &str) -> Result<Vec<String>, SyntaxError> {
        let mut names = Vec::new();
        loop {
            names.push(self.expect_ident()?.text);
            if self.eat_op(",") {
                continue;
            }
            self.expect_op(close)?;
            return Ok(names);
        }
    }

    /// `do … [catch <type|all> handler]* [finally …] end`.
    pub(super) fn parse_block(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("do")?;
        let statements = self.parse_statements(&["catch", "finally", "end"])?;
        let mut catches = Vec::new();
        while self.at_kw("catch") {
            self.advance()?;
            let etype = if self.eat_ident("all") {
                None
            } else {
                Some(self.parse_expression()?)
            };
            let body = self.parse_expression()?;
            catches.push(CatchClause { etype, body });
        }
        let finally_stmts = if self.eat_kw("finally") {
            self.parse_statements(&["end"])?
        } else {
            Vec::new()
        };
        self.expect_kw("end")?;
        Ok(Node::Block {
            statements,
            catches,
            finally_stmts,
            pos: kw.pos,
        })
    }
}

pub(super) fn compound_funcall_name(op: &str) -> &'static str {
    match op {
        "+=" => "add",
        "-=" => "sub",
        "*=" => "mul",
        "/=" => "div",
        _ => "mod",
    }
}
