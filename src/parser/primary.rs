use std::rc::Rc;

use super::stmt::compound_funcall_name;
use super::Parser;
use crate::ast::{CallArg, ForWhat, LambdaDef, Node, ParamDef};
use crate::lexer::{Token, TokenKind};
use crate::value::{Decimal, PatternValue, SourcePos, SyntaxError, Value};

impl Parser {
    /// Primary expression plus its greedy postfix chain: `(args)`,
    /// `[index]`, `->member`, and `!>` pipe, in any order. A deref-assign
    /// (`x[i] = v`, `x->m += v`) terminates the chain.
    pub(super) fn parse_postfix(&mut self) -> Result<Node, SyntaxError> {
        self.parse_postfix_chain(true)
    }

    fn parse_postfix_chain(&mut self, allow_pipe: bool) -> Result<Node, SyntaxError> {
        let mut node = self.parse_primary()?;
        loop {
            if self.at_op("(") {
                let pos = self.pos_here();
                let args = self.parse_call_args()?;
                node = Node::Funcall {
                    func: Box::new(node),
                    args,
                    pos,
                };
            } else if self.at_op("[") {
                let (new_node, terminated) = self.parse_index_postfix(node)?;
                node = new_node;
                if terminated {
                    return Ok(node);
                }
            } else if self.at_op("->") {
                let (new_node, terminated) = self.parse_member_postfix(node)?;
                node = new_node;
                if terminated {
                    return Ok(node);
                }
            } else if allow_pipe && self.at_op("!>") {
                let pos = self.pos_here();
                self.advance()?;
                let target = self.parse_postfix_chain(false)?;
                node = pipe_into(node, target, pos);
            } else {
                return Ok(node);
            }
        }
    }

    /// `[i]`, `[k, default]` (Map only, checked at runtime), and the slice
    /// forms `[a:b]`, `[a:]`, `[:b]`, `[:]`. A point deref may be followed
    /// by an assignment operator, producing a deref-assign.
    fn parse_index_postfix(&mut self, base: Node) -> Result<(Node, bool), SyntaxError> {
        let pos = self.expect_op("[")?.pos;
        if self.eat_op(":") {
            let to = if self.at_op("]") {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            self.expect_op("]")?;
            return Ok((
                Node::DerefSlice {
                    base: Box::new(base),
                    from: None,
                    to,
                    pos,
                },
                false,
            ));
        }
        let index = self.parse_expression()?;
        if self.eat_op(":") {
            let to = if self.at_op("]") {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            self.expect_op("]")?;
            return Ok((
                Node::DerefSlice {
                    base: Box::new(base),
                    from: Some(Box::new(index)),
                    to,
                    pos,
                },
                false,
            ));
        }
        let default = if self.eat_op(",") {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect_op("]")?;
        if default.is_none() {
            if let Some(assign) = self.try_parse_deref_assign(&base, &index, &pos)? {
                return Ok((assign, true));
            }
        }
        Ok((
            Node::Deref {
                base: Box::new(base),
                index: Box::new(index),
                default,
                pos,
            },
            false,
        ))
    }

    /// `->member`, optionally followed by `(args)` (member invoke) or an
    /// assignment operator (member assign).
    fn parse_member_postfix(&mut self, base: Node) -> Result<(Node, bool), SyntaxError> {
        let pos = self.expect_op("->")?.pos;
        let member = self.expect_ident()?.text;
        if self.at_op("(") {
            let args = self.parse_call_args()?;
            return Ok((
                Node::DerefInvoke {
                    base: Box::new(base),
                    member,
                    args,
                    pos,
                },
                false,
            ));
        }
        let index = Node::Literal {
            value: Value::from_string(member),
            pos: pos.clone(),
        };
        if let Some(assign) = self.try_parse_deref_assign(&base, &index, &pos)? {
            return Ok((assign, true));
        }
        Ok((
            Node::Deref {
                base: Box::new(base),
                index: Box::new(index),
                default: None,
                pos,
            },
            false,
        ))
    }

    fn try_parse_deref_assign(
        &mut self,
        base: &Node,
        index: &Node,
        pos: &SourcePos,
    ) -> Result<Option<Node>, SyntaxError> {
        let op = ["=", "+=", "-=", "*=", "/=", "%="]
            .iter()
            .find(|op| self.at_op(op))
            .copied();
        let op = match op {
            Some(op) => op,
            None => return Ok(None),
        };
        self.advance()?;
        let value = self.parse_expression()?;
        let value = if op == "=" {
            value
        } else {
            let current = Node::Deref {
                base: Box::new(base.clone()),
                index: Box::new(index.clone()),
                default: None,
                pos: pos.clone(),
            };
            self.make_funcall(compound_funcall_name(op), vec![current, value], pos.clone())
        };
        Ok(Some(Node::DerefAssign {
            base: Box::new(base.clone()),
            index: Box::new(index.clone()),
            value: Box::new(value),
            pos: pos.clone(),
        }))
    }

    /// `( [arg {, arg}] [,] )` where arg is `expr`, `name=expr` or `...expr`.
    fn parse_call_args(&mut self) -> Result<Vec<CallArg>, SyntaxError> {
        self.expect_op("(")?;
        let mut args = Vec::new();
        loop {
            if self.eat_op(")") {
                return Ok(args);
            }
            if self.at_op("...") {
                let pos = self.pos_here();
                self.advance()?;
                let expr = self.parse_expression()?;
                args.push(CallArg {
                    name: None,
                    value: Node::Spread {
                        expr: Box::new(expr),
                        pos,
                    },
                });
            } else if self.is_named_arg_start() {
                let name = self.expect_ident()?.text;
                self.expect_op("=")?;
                let value = self.parse_expression()?;
                args.push(CallArg {
                    name: Some(name),
                    value,
                });
            } else {
                args.push(CallArg {
                    name: None,
                    value: self.parse_expression()?,
                });
            }
            if self.eat_op(",") {
                continue;
            }
            self.expect_op(")")?;
            return Ok(args);
        }
    }

    fn is_named_arg_start(&self) -> bool {
        matches!(self.peek(), Some(tok) if tok.kind == TokenKind::Identifier)
            && self.at_op_n(1, "=")
    }

    pub(super) fn parse_primary(&mut self) -> Result<Node, SyntaxError> {
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => return Err(self.err_here("unexpected end of input")),
        };
        match tok.kind {
            TokenKind::Int => {
                self.advance()?;
                let value = self.parse_int_text(&tok)?;
                Ok(Node::Literal {
                    value: Value::Int(value),
                    pos: tok.pos,
                })
            }
            TokenKind::Decimal => {
                self.advance()?;
                let value = self.parse_decimal_text(&tok)?;
                Ok(Node::Literal {
                    value: Value::Decimal(value),
                    pos: tok.pos,
                })
            }
            TokenKind::Str => {
                self.advance()?;
                Ok(Node::Literal {
                    value: Value::from_string(tok.text),
                    pos: tok.pos,
                })
            }
            TokenKind::Boolean => {
                self.advance()?;
                Ok(Node::Literal {
                    value: Value::Boolean(tok.text == "TRUE"),
                    pos: tok.pos,
                })
            }
            TokenKind::Pattern => {
                self.advance()?;
                let pattern = PatternValue::compile(&tok.text).map_err(|err| {
                    SyntaxError::new(format!("invalid pattern: {}", err), tok.pos.clone())
                })?;
                Ok(Node::Literal {
                    value: Value::Pattern(pattern),
                    pos: tok.pos,
                })
            }
            TokenKind::Identifier => {
                self.advance()?;
                if tok.text == "NULL" {
                    return Ok(Node::Literal {
                        value: Value::Null,
                        pos: tok.pos,
                    });
                }
                Ok(Node::Identifier {
                    name: tok.text,
                    pos: tok.pos,
                })
            }
            TokenKind::Keyword => self.parse_keyword_primary(&tok),
            TokenKind::Operator | TokenKind::Interpunction => {
                if self.eat_op("(") {
                    let expr = self.parse_expression()?;
                    self.expect_op(")")?;
                    return Ok(expr);
                }
                if self.at_op("[") {
                    return self.parse_list_literal();
                }
                if self.at_op("<<<") {
                    return self.parse_map_literal();
                }
                if self.at_op("<<") {
                    return self.parse_set_literal();
                }
                if self.at_op("<*") {
                    return self.parse_object_literal();
                }
                Err(self.err_here("expected expression"))
            }
        }
    }

    fn parse_keyword_primary(&mut self, tok: &Token) -> Result<Node, SyntaxError> {
        match tok.text.as_str() {
            "if" => self.parse_expression(),
            "do" => self.parse_block(),
            "fn" => self.parse_lambda(),
            "for" => self.parse_for(),
            "while" => self.parse_while(),
            "break" => {
                self.advance()?;
                Ok(Node::Break {
                    pos: tok.pos.clone(),
                })
            }
            "continue" => {
                self.advance()?;
                Ok(Node::Continue {
                    pos: tok.pos.clone(),
                })
            }
            "return" => {
                self.advance()?;
                let expr = if self.can_start_expression() {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                Ok(Node::Return {
                    expr,
                    pos: tok.pos.clone(),
                })
            }
            "error" => {
                self.advance()?;
                let expr = self.parse_expression()?;
                Ok(Node::Raise {
                    expr: Box::new(expr),
                    pos: tok.pos.clone(),
                })
            }
            _ => Err(self.err_here("expected expression")),
        }
    }

    /// Whether the current token can begin an expression, used to decide if
    /// `return` carries a value.
    fn can_start_expression(&self) -> bool {
        match self.peek() {
            None => false,
            Some(tok) => match tok.kind {
                TokenKind::Int
                | TokenKind::Decimal
                | TokenKind::Str
                | TokenKind::Boolean
                | TokenKind::Pattern
                | TokenKind::Identifier => true,
                TokenKind::Keyword => matches!(
                    tok.text.as_str(),
                    "if" | "do" | "fn" | "for" | "while" | "not" | "error"
                ),
                TokenKind::Operator | TokenKind::Interpunction => {
                    matches!(tok.text.as_str(), "(" | "[" | "<<" | "<<<" | "<*" | "-")
                }
            },
        }
    }

    /// `fn(params) body` where body is an expression or a do-block. A block
    /// body whose last statement is `return expr` is unwrapped to a plain
    /// tail expression.
    fn parse_lambda(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("fn")?;
        self.expect_op("(")?;
        let mut params: Vec<ParamDef> = Vec::new();
        loop {
            if self.eat_op(")") {
                break;
            }
            let name = self.expect_ident()?.text;
            let mut rest = false;
            let mut default = None;
            if self.eat_op("...") {
                rest = true;
            } else if self.eat_op("=") {
                default = Some(self.parse_expression()?);
            }
            if params.last().map(|p: &ParamDef| p.rest).unwrap_or(false) {
                return Err(SyntaxError::new(
                    "rest parameter must be the last parameter",
                    kw.pos.clone(),
                ));
            }
            params.push(ParamDef {
                name,
                default,
                rest,
            });
            if self.eat_op(",") {
                continue;
            }
            self.expect_op(")")?;
            break;
        }
        let mut body = self.parse_expression()?;
        if let Node::Block {
            ref mut statements, ..
        } = body
        {
            if let Some(Node::Return { expr, pos }) = statements.last().cloned() {
                let tail = match expr {
                    Some(expr) => *expr,
                    None => Node::Literal {
                        value: Value::Null,
                        pos,
                    },
                };
                let last = statements.len() - 1;
                statements[last] = tail;
            }
        }
        Ok(Node::Lambda {
            def: Rc::new(LambdaDef { params, body }),
            pos: kw.pos,
        })
    }

    /// `for x in src body`, `for [k, v] in entries src body`, with the
    /// optional `keys`/`values`/`entries` selector before the source.
    fn parse_for(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("for")?;
        let mut idents = Vec::new();
        if self.eat_op("[") {
            loop {
                idents.push(self.expect_ident()?.text);
                if self.eat_op(",") {
                    continue;
                }
                self.expect_op("]")?;
                break;
            }
        } else {
            idents.push(self.expect_ident()?.text);
        }
        self.expect_kw("in")?;
        let what = if self.at_ident("keys") && !self.at_for_source_end(1) {
            self.advance()?;
            ForWhat::Keys
        } else if self.at_ident("values") && !self.at_for_source_end(1) {
            self.advance()?;
            ForWhat::Values
        } else if self.at_ident("entries") && !self.at_for_source_end(1) {
            self.advance()?;
            ForWhat::Entries
        } else {
            ForWhat::Default
        };
        let source = self.parse_or_level_for_source()?;
        let body = self.parse_expression()?;
        Ok(Node::For {
            idents,
            what,
            source: Box::new(source),
            body: Box::new(body),
            pos: kw.pos,
        })
    }

    /// A selector word is only a selector when an expression follows it;
    /// `for k in keys do … end` would otherwise lose its source.
    fn at_for_source_end(&self, n: usize) -> bool {
        match self.peek_at(n) {
            None => true,
            Some(tok) => {
                tok.kind == TokenKind::Keyword
                    && matches!(tok.text.as_str(), "do" | "end" | "then" | "else" | "elif")
            }
        }
    }

    fn parse_or_level_for_source(&mut self) -> Result<Node, SyntaxError> {
        // The loop body directly follows the source expression, so the
        // source must stop short of statement keywords; the additive layer
        // is enough for any realistic source and keeps `for x in xs do`
        // unambiguous.
        self.parse_additive()
    }

    fn parse_while(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("while")?;
        let cond = self.parse_expression()?;
        let body = self.parse_expression()?;
        Ok(Node::While {
            cond: Box::new(cond),
            body: Box::new(body),
            pos: kw.pos,
        })
    }

    // ── Collection literals and comprehensions ───────────────────────────

    fn parse_list_literal(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.expect_op("[")?.pos;
        if self.eat_op("]") {
            return Ok(Node::ListLiteral {
                items: Vec::new(),
                pos,
            });
        }
        let first = self.parse_collection_element()?;
        if self.at_kw("for") && !matches!(first, Node::Spread { .. }) {
            self.advance()?;
            let var = self.expect_ident()?.text;
            self.expect_kw("in")?;
            let source = self.parse_additive()?;
            let cond = if self.eat_kw("if") {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            self.expect_op("]")?;
            return Ok(Node::ListComprehension {
                expr: Box::new(first),
                var,
                source: Box::new(source),
                cond,
                pos,
            });
        }
        let items = self.parse_element_tail(first, "]")?;
        Ok(Node::ListLiteral { items, pos })
    }

    fn parse_set_literal(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.expect_op("<<")?.pos;
        if self.eat_op(">>") {
            return Ok(Node::SetLiteral {
                items: Vec::new(),
                pos,
            });
        }
        let first = self.parse_collection_element()?;
        if self.at_kw("for") && !matches!(first, Node::Spread { .. }) {
            self.advance()?;
            let var1 = self.expect_ident()?.text;
            self.expect_kw("in")?;
            let source1 = self.parse_additive()?;
            if self.eat_kw("for") {
                let var2 = self.expect_ident()?.text;
                self.expect_kw("in")?;
                let source2 = self.parse_additive()?;
                let cond = if self.eat_kw("if") {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                self.expect_op(">>")?;
                return Ok(Node::SetComprehensionProduct {
                    expr: Box::new(first),
                    var1,
                    source1: Box::new(source1),
                    var2,
                    source2: Box::new(source2),
                    cond,
                    pos,
                });
            }
            let cond = if self.eat_kw("if") {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            self.expect_op(">>")?;
            return Ok(Node::SetComprehension {
                expr: Box::new(first),
                var: var1,
                source: Box::new(source1),
                cond,
                pos,
            });
        }
        let items = self.parse_element_tail(first, ">>")?;
        Ok(Node::SetLiteral { items, pos })
    }

    fn parse_map_literal(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.expect_op("<<<")?.pos;
        if self.eat_op(">>>") {
            return Ok(Node::MapLiteral {
                entries: Vec::new(),
                pos,
            });
        }
        let (key, value) = self.parse_map_entry()?;
        if self.at_kw("for") {
            self.advance()?;
            let var1 = self.expect_ident()?.text;
            self.expect_kw("in")?;
            let source1 = self.parse_additive()?;
            if self.eat_kw("for") {
                let var2 = self.expect_ident()?.text;
                self.expect_kw("in")?;
                let source2 = self.parse_additive()?;
                let cond = if self.eat_kw("if") {
                    Some(Box::new(self.parse_expression()?))
                } else {
                    None
                };
                self.expect_op(">>>")?;
                return Ok(Node::MapComprehensionProduct {
                    key: Box::new(key),
                    value: Box::new(value),
                    var1,
                    source1: Box::new(source1),
                    var2,
                    source2: Box::new(source2),
                    cond,
                    pos,
                });
            }
            let cond = if self.eat_kw("if") {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            self.expect_op(">>>")?;
            return Ok(Node::MapComprehension {
                key: Box::new(key),
                value: Box::new(value),
                var: var1,
                source: Box::new(source1),
                cond,
                pos,
            });
        }
        let mut entries = vec![(key, value)];
        loop {
            if self.eat_op(",") {
                if self.eat_op(">>>") {
                    return Ok(Node::MapLiteral { entries, pos });
                }
                entries.push(self.parse_map_entry()?);
                continue;
            }
            self.expect_op(">>>")?;
            return Ok(Node::MapLiteral { entries, pos });
        }
    }

    /// `key => value`; a bare identifier key is sugar for a string literal
    /// of its name.
    fn parse_map_entry(&mut self) -> Result<(Node, Node), SyntaxError> {
        let key = if matches!(self.peek(), Some(tok) if tok.kind == TokenKind::Identifier)
            && self.at_op_n(1, "=>")
        {
            let tok = self.advance()?;
            Node::Literal {
                value: Value::from_string(tok.text),
                pos: tok.pos,
            }
        } else {
            self.parse_expression()?
        };
        self.expect_op("=>")?;
        let value = self.parse_expression()?;
        Ok((key, value))
    }

    fn parse_object_literal(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.expect_op("<*")?.pos;
        let mut entries = Vec::new();
        loop {
            if self.eat_op("*>") {
                return Ok(Node::ObjectLiteral { entries, pos });
            }
            let key = match self.peek() {
                Some(tok)
                    if tok.kind == TokenKind::Identifier || tok.kind == TokenKind::Str =>
                {
                    self.advance()?.text
                }
                _ => return Err(self.err_here("expected object key")),
            };
            self.expect_op("=")?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if self.eat_op(",") {
                continue;
            }
            self.expect_op("*>")?;
            return Ok(Node::ObjectLiteral { entries, pos });
        }
    }

    fn parse_collection_element(&mut self) -> Result<Node, SyntaxError> {
        if self.at_op("...") {
            let pos = self.pos_here();
            self.advance()?;
            let expr = self.parse_expression()?;
            return Ok(Node::Spread {
                expr: Box::new(expr),
                pos,
            });
        }
        self.parse_expression()
    }

    fn parse_element_tail(
        &mut self,
        first: Node,
        close: &str,
    ) -> Result<Vec<Node>, SyntaxError> {
        let mut items = vec![first];
        loop {
            if self.eat_op(",") {
                if self.eat_op(close) {
                    return Ok(items);
                }
                items.push(self.parse_collection_element()?);
                continue;
            }
            self.expect_op(close)?;
            return Ok(items);
        }
    }

    // ── Numeric literal decoding ─────────────────────────────────────────

    pub(super) fn parse_int_text(&self, tok: &Token) -> Result<i64, SyntaxError> {
        let parsed = if let Some(hex) = tok.text.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else if let Some(bin) = tok.text.strip_prefix("0b") {
            i64::from_str_radix(bin, 2)
        } else {
            tok.text.parse::<i64>()
        };
        parsed.map_err(|_| {
            SyntaxError::new("integer literal out of range", tok.pos.clone())
        })
    }

    pub(super) fn parse_decimal_text(&self, tok: &Token) -> Result<Decimal, SyntaxError> {
        Decimal::parse(&tok.text).ok_or_else(|| {
            SyntaxError::new("invalid decimal literal", tok.pos.clone())
        })
    }
}

/// Rewrite `x !> f(args)` into `f(x, args)`. A bare callable on the right
/// becomes a single-argument call.
fn pipe_into(subject: Node, target: Node, pos: SourcePos) -> Node {
    match target {
        Node::Funcall {
            func,
            mut args,
            pos: call_pos,
        } => {
            args.insert(
                0,
                CallArg {
                    name: None,
                    value: subject,
                },
            );
            Node::Funcall {
                func,
                args,
                pos: call_pos,
            }
        }
        other => Node::Funcall {
            func: Box::new(other),
            args: vec![CallArg {
                name: None,
                value: subject,
            }],
            pos,
        },
    }
}
