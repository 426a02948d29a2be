use super::Parser;
use crate::ast::{CallArg, Node};
use crate::value::{SourcePos, SyntaxError, Value};

/// Result of attempting the predicate sentence grammar on a parsed operand:
/// either the lowered funcall, or the untouched operand handed back because
/// no known predicate followed.
enum Predicate {
    Lowered(Node),
    No(Node),
}

impl Parser {
    pub(super) fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        if self.at_kw("if") {
            return self.parse_if();
        }
        self.parse_or()
    }

    /// `if c then e { (elif|if) c then e } [else e]` — a directly following
    /// bare `if` continues the chain exactly like `elif`.
    fn parse_if(&mut self) -> Result<Node, SyntaxError> {
        let kw = self.expect_kw("if")?;
        let mut branches = Vec::new();
        loop {
            let cond = self.parse_or()?;
            self.expect_kw("then")?;
            let body = self.parse_expression()?;
            branches.push((cond, body));
            if self.eat_kw("elif") || self.eat_kw("if") {
                continue;
            }
            break;
        }
        let else_branch = if self.eat_kw("else") {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        Ok(Node::If {
            branches,
            else_branch,
            pos: kw.pos,
        })
    }

    fn parse_or(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_and()?;
        loop {
            let pos = self.pos_here();
            if self.eat_kw("or") {
                let right = self.parse_and()?;
                left = Node::Or {
                    left: Box::new(left),
                    right: Box::new(right),
                    pos,
                };
            } else if self.eat_kw("xor") {
                let right = self.parse_and()?;
                left = Node::Xor {
                    left: Box::new(left),
                    right: Box::new(right),
                    pos,
                };
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_and(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_not()?;
        while self.at_kw("and") {
            let pos = self.pos_here();
            self.advance()?;
            let right = self.parse_not()?;
            left = Node::And {
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Node, SyntaxError> {
        if self.at_kw("not") {
            let pos = self.pos_here();
            self.advance()?;
            let expr = self.parse_not()?;
            return Ok(Node::Not {
                expr: Box::new(expr),
                pos,
            });
        }
        self.parse_relational()
    }

    /// Relational layer: first the predicate sentence grammar, then the
    /// comparison chain. `a < b < c` lowers to `less(a,b) and less(b,c)`;
    /// a single comparison stays a bare funcall.
    fn parse_relational(&mut self) -> Result<Node, SyntaxError> {
        let first = self.parse_additive()?;
        let first = match self.try_parse_predicate(first)? {
            Predicate::Lowered(node) => return Ok(node),
            Predicate::No(node) => node,
        };

        let mut operands = vec![first];
        let mut ops: Vec<(&'static str, SourcePos)> = Vec::new();
        loop {
            let pos = self.pos_here();
            let op = if self.eat_op("==") {
                "equals"
            } else if self.eat_op("!=") {
                "not_equals"
            } else if self.eat_op("<=") {
                "less_equals"
            } else if self.eat_op("<") {
                "less"
            } else if self.eat_op(">=") {
                "greater_equals"
            } else if self.eat_op(">") {
                "greater"
            } else if self.eat_kw("is") {
                // `is` surviving the predicate attempt is the bare
                // relational form, equivalent to `==`.
                "equals"
            } else {
                break;
            };
            ops.push((op, pos));
            operands.push(self.parse_additive()?);
        }
        if ops.is_empty() {
            return Ok(operands.pop().unwrap_or(Node::Literal {
                value: Value::Null,
                pos: self.pos_here(),
            }));
        }
        let mut result: Option<Node> = None;
        for (i, (op, pos)) in ops.iter().enumerate() {
            let call = self.make_funcall(
                op,
                vec![operands[i].clone(), operands[i + 1].clone()],
                pos.clone(),
            );
            result = Some(match result {
                None => call,
                Some(prev) => Node::And {
                    left: Box::new(prev),
                    right: Box::new(call),
                    pos: pos.clone(),
                },
            });
        }
        Ok(result.unwrap_or(Node::Literal {
            value: Value::Null,
            pos: self.pos_here(),
        }))
    }

    /// The natural-language predicate sub-grammar. The predicate words are
    /// ordinary identifiers matched by text; when none of them follows a
    /// consumed `is [not]`, the consumed tokens are put back and the operand
    /// is returned untouched (falling through to bare relational `is`).
    fn try_parse_predicate(&mut self, subject: Node) -> Result<Predicate, SyntaxError> {
        let pos = self.pos_here();

        if self.at_kw("is") {
            self.advance()?;
            let negated = self.eat_kw("not");
            if let Some(call) = self.parse_is_predicate(&subject, &pos)? {
                return Ok(Predicate::Lowered(negate_if(call, negated, pos)));
            }
            // Unknown predicate word: put back `not` and `is` and let the
            // relational layer treat `is` as a comparison operator.
            if negated {
                self.putback();
            }
            self.putback();
            return Ok(Predicate::No(subject));
        }

        if self.at_kw("not") && self.token_is(1, crate::lexer::TokenKind::Keyword, "in") {
            self.advance()?;
            self.advance()?;
            let collection = self.parse_additive()?;
            let call = self.make_named_funcall(
                "is_in",
                vec![("obj", subject), ("collection", collection)],
                pos.clone(),
            );
            return Ok(Predicate::Lowered(negate_if(call, true, pos)));
        }

        if self.at_kw("in") {
            self.advance()?;
            let collection = self.parse_additive()?;
            return Ok(Predicate::Lowered(self.make_named_funcall(
                "is_in",
                vec![("obj", subject), ("collection", collection)],
                pos,
            )));
        }

        if self.at_ident("starts") && self.token_is(1, crate::lexer::TokenKind::Identifier, "with")
        {
            self.advance()?;
            self.advance()?;
            let part = self.parse_additive()?;
            return Ok(Predicate::Lowered(self.make_named_funcall(
                "starts_with",
                vec![("str", subject), ("part", part)],
                pos,
            )));
        }

        if self.at_ident("ends") && self.token_is(1, crate::lexer::TokenKind::Identifier, "with") {
            self.advance()?;
            self.advance()?;
            let part = self.parse_additive()?;
            return Ok(Predicate::Lowered(self.make_named_funcall(
                "ends_with",
                vec![("str", subject), ("part", part)],
                pos,
            )));
        }

        if self.at_ident("contains") {
            self.advance()?;
            let part = self.parse_additive()?;
            return Ok(Predicate::Lowered(self.make_named_funcall(
                "contains",
                vec![("obj", subject), ("part", part)],
                pos,
            )));
        }

        if self.at_ident("matches") {
            self.advance()?;
            let pattern = self.parse_additive()?;
            return Ok(Predicate::Lowered(self.make_named_funcall(
                "matches",
                vec![("str", subject), ("pattern", pattern)],
                pos,
            )));
        }

        Ok(Predicate::No(subject))
    }

    /// Predicates that follow `is [not]`: `empty`, `zero`, `negative`,
    /// `numerical`/`alphanumerical` with optional length modifiers, and `in`.
    /// Returns None when the next token is not a known predicate word.
    fn parse_is_predicate(
        &mut self,
        subject: &Node,
        pos: &SourcePos,
    ) -> Result<Option<Node>, SyntaxError> {
        if self.eat_ident("empty") {
            return Ok(Some(self.make_named_funcall(
                "is_empty",
                vec![("obj", subject.clone())],
                pos.clone(),
            )));
        }
        if self.eat_ident("zero") {
            return Ok(Some(self.make_named_funcall(
                "is_zero",
                vec![("obj", subject.clone())],
                pos.clone(),
            )));
        }
        if self.eat_ident("negative") {
            return Ok(Some(self.make_named_funcall(
                "is_negative",
                vec![("obj", subject.clone())],
                pos.clone(),
            )));
        }
        if self.at_ident("numerical") || self.at_ident("alphanumerical") {
            let func = if self.eat_ident("numerical") {
                "is_numerical"
            } else {
                self.advance()?;
                "is_alphanumerical"
            };
            let wrapped = self.make_named_funcall(
                "string",
                vec![("obj", subject.clone())],
                pos.clone(),
            );
            let mut args = vec![("str", wrapped)];
            loop {
                if self.eat_ident("min_len") {
                    args.push(("min", self.parse_additive()?));
                } else if self.eat_ident("max_len") {
                    args.push(("max", self.parse_additive()?));
                } else if self.eat_ident("exact_len") {
                    let len = self.parse_additive()?;
                    args.push(("min", len.clone()));
                    args.push(("max", len));
                } else {
                    break;
                }
            }
            return Ok(Some(self.make_named_funcall(func, args, pos.clone())));
        }
        if self.at_kw("in") {
            self.advance()?;
            let collection = self.parse_additive()?;
            return Ok(Some(self.make_named_funcall(
                "is_in",
                vec![("obj", subject.clone()), ("collection", collection)],
                pos.clone(),
            )));
        }
        Ok(None)
    }

    pub(super) fn parse_additive(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let pos = self.pos_here();
            let func = if self.eat_op("+") {
                "add"
            } else if self.eat_op("-") {
                "sub"
            } else {
                return Ok(left);
            };
            let right = self.parse_multiplicative()?;
            left = self.make_funcall(func, vec![left, right], pos);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let pos = self.pos_here();
            let func = if self.eat_op("*") {
                "mul"
            } else if self.eat_op("/") {
                "div"
            } else if self.eat_op("%") {
                "mod"
            } else {
                return Ok(left);
            };
            let right = self.parse_unary()?;
            left = self.make_funcall(func, vec![left, right], pos);
        }
    }

    fn parse_unary(&mut self) -> Result<Node, SyntaxError> {
        if self.at_op("-") {
            let pos = self.pos_here();
            self.advance()?;
            // A numeric literal directly after unary minus folds into a
            // negative literal; everything else lowers to sub(0, x).
            if let Some(lit) = self.try_parse_negative_literal(&pos)? {
                return Ok(lit);
            }
            let operand = self.parse_unary()?;
            let zero = Node::Literal {
                value: Value::Int(0),
                pos: pos.clone(),
            };
            return Ok(self.make_funcall("sub", vec![zero, operand], pos));
        }
        self.parse_postfix()
    }

    fn try_parse_negative_literal(
        &mut self,
        pos: &SourcePos,
    ) -> Result<Option<Node>, SyntaxError> {
        use crate::lexer::TokenKind;
        let kind = match self.peek() {
            Some(tok) => tok.kind,
            None => return Ok(None),
        };
        match kind {
            TokenKind::Int => {
                let tok = self.advance()?;
                let value = self.parse_int_text(&tok)?;
                Ok(Some(Node::Literal {
                    value: Value::Int(-value),
                    pos: pos.clone(),
                }))
            }
            TokenKind::Decimal => {
                let tok = self.advance()?;
                let value = self.parse_decimal_text(&tok)?;
                Ok(Some(Node::Literal {
                    value: Value::Decimal(value.neg()),
                    pos: pos.clone(),
                }))
            }
            _ => Ok(None),
        }
    }

    // ── Funcall construction helpers for desugared operators ─────────────

    pub(super) fn make_funcall(
        &self,
        name: &str,
        positional: Vec<Node>,
        pos: SourcePos,
    ) -> Node {
        let args = positional
            .into_iter()
            .map(|value| CallArg { name: None, value })
            .collect();
        Node::Funcall {
            func: Box::new(Node::Identifier {
                name: name.to_string(),
                pos: pos.clone(),
            }),
            args,
            pos,
        }
    }

    pub(super) fn make_named_funcall(
        &self,
        name: &str,
        named: Vec<(&str, Node)>,
        pos: SourcePos,
    ) -> Node {
        let args = named
            .into_iter()
            .map(|(arg_name, value)| CallArg {
                name: Some(arg_name.to_string()),
                value,
            })
            .collect();
        Node::Funcall {
            func: Box::new(Node::Identifier {
                name: name.to_string(),
                pos: pos.clone(),
            }),
            args,
            pos,
        }
    }
}

fn negate_if(node: Node, negated: bool, pos: SourcePos) -> Node {
    if negated {
        Node::Not {
            expr: Box::new(node),
            pos,
        }
    } else {
        node
    }
}
