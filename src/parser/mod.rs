use std::rc::Rc;

use crate::ast::Node;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::value::{SourcePos, SyntaxError};

mod expr;
mod primary;
mod stmt;

/// Parse a complete script into its top-level Block node.
pub(crate) fn parse_script(source: &str, filename: &str) -> Result<Node, SyntaxError> {
    let tokens = tokenize(source, filename)?;
    let mut parser = Parser::new(tokens, filename);
    parser.parse_program()
}

/// Token-stream cursor for the recursive-descent parser. The stream is fully
/// lexed up front; lookahead is an index peek and backtracking (needed only
/// for the predicate sentence grammar and destructuring lookahead) is an
/// index putback.
pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    file: Rc<str>,
}

impl Parser {
    fn new(tokens: Vec<Token>, filename: &str) -> Self {
        Self {
            tokens,
            pos: 0,
            file: Rc::from(filename),
        }
    }

    fn parse_program(&mut self) -> Result<Node, SyntaxError> {
        let pos = self.pos_here();
        let statements = self.parse_statements(&[])?;
        if !self.at_end() {
            return Err(self.err_here("unexpected token"));
        }
        Ok(Node::Block {
            statements,
            catches: Vec::new(),
            finally_stmts: Vec::new(),
            pos,
        })
    }

    // ── Cursor primitives ────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                self.pos += 1;
                Ok(tok.clone())
            }
            None => Err(self.err_here("unexpected end of input")),
        }
    }

    fn putback(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
    }

    fn pos_here(&self) -> SourcePos {
        match self.peek() {
            Some(tok) => tok.pos.clone(),
            None => match self.tokens.last() {
                Some(tok) => tok.pos.clone(),
                None => SourcePos::new(self.file.clone(), 1, 1),
            },
        }
    }

    fn err_here(&self, message: impl Into<String>) -> SyntaxError {
        let message = message.into();
        match self.peek() {
            Some(tok) => SyntaxError::new(
                format!("{} (found {:?})", message, tok.text),
                tok.pos.clone(),
            ),
            None => SyntaxError::new(
                format!("{} (at end of input)", message),
                self.pos_here(),
            ),
        }
    }

    // ── Classification helpers ───────────────────────────────────────────

    fn token_is(&self, n: usize, kind: TokenKind, text: &str) -> bool {
        match self.peek_at(n) {
            Some(tok) => tok.kind == kind && tok.text == text,
            None => false,
        }
    }

    fn at_kw(&self, text: &str) -> bool {
        self.token_is(0, TokenKind::Keyword, text)
    }

    fn at_ident(&self, text: &str) -> bool {
        self.token_is(0, TokenKind::Identifier, text)
    }

    /// True when the current token is the given operator or interpunction.
    fn at_op(&self, text: &str) -> bool {
        self.token_is(0, TokenKind::Operator, text)
            || self.token_is(0, TokenKind::Interpunction, text)
    }

    fn at_op_n(&self, n: usize, text: &str) -> bool {
        self.token_is(n, TokenKind::Operator, text)
            || self.token_is(n, TokenKind::Interpunction, text)
    }

    fn eat_op(&mut self, text: &str) -> bool {
        if self.at_op(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, text: &str) -> bool {
        if self.at_kw(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, text: &str) -> bool {
        if self.at_ident(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, text: &str) -> Result<Token, SyntaxError> {
        if self.at_op(text) {
            self.advance()
        } else {
            Err(self.err_here(format!("expected '{}'", text)))
        }
    }

    fn expect_kw(&mut self, text: &str) -> Result<Token, SyntaxError> {
        if self.at_kw(text) {
            self.advance()
        } else {
            Err(self.err_here(format!("expected '{}'", text)))
        }
    }

    /// Consume any identifier token and return it.
    fn expect_ident(&mut self) -> Result<Token, SyntaxError> {
        match self.peek() {
            Some(tok) if tok.kind == TokenKind::Identifier => self.advance(),
            _ => Err(self.err_here("expected identifier")),
        }
    }
}
