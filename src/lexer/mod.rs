use std::rc::Rc;

use crate::value::{SourcePos, SyntaxError};

#[cfg(test)]
mod tests;

/// Token classes produced by the lexer. The token text carries the decoded
/// payload (escape sequences resolved, digit separators stripped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Identifier,
    Keyword,
    Operator,
    Interpunction,
    Str,
    Int,
    Decimal,
    Boolean,
    Pattern,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    pub(crate) pos: SourcePos,
}

const KEYWORDS: &[&str] = &[
    "if", "then", "elif", "else", "and", "or", "xor", "not", "is", "in", "def", "fn", "for",
    "while", "do", "end", "catch", "finally", "break", "continue", "return", "error", "require",
    "as", "also",
];

pub(crate) struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    file: Rc<str>,
}

/// Scan a complete source text into its token stream.
pub(crate) fn tokenize(source: &str, filename: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source, filename).run()
}

impl Lexer {
    fn new(source: &str, filename: &str) -> Self {
        Self {
            src: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            file: Rc::from(filename),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src.get(self.pos + n).copied()
    }

    /// Consume one character, tracking line/column. A carriage return is
    /// swallowed without advancing the column so CRLF and LF sources yield
    /// identical positions.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        match c {
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            '\r' => {}
            _ => self.col += 1,
        }
        Some(c)
    }

    fn here(&self) -> SourcePos {
        SourcePos::new(self.file.clone(), self.line, self.col)
    }

    fn error(&self, message: impl Into<String>, pos: SourcePos) -> SyntaxError {
        SyntaxError::new(message, pos)
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_ws_and_comments();
            let pos = self.here();
            let c = match self.peek() {
                Some(c) => c,
                None => break,
            };
            let token = if c.is_ascii_digit() {
                self.scan_number(pos)?
            } else if c == '\'' || c == '"' {
                self.scan_string(pos)?
            } else if c == '/' && self.peek_at(1) == Some('/') {
                self.scan_pattern(pos)?
            } else if c.is_alphabetic() || c == '_' {
                self.scan_word(pos)
            } else {
                self.scan_punctuation(pos)?
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_word(&mut self, pos: SourcePos) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let kind = if text == "TRUE" || text == "FALSE" {
            TokenKind::Boolean
        } else if KEYWORDS.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token { kind, text, pos }
    }

    fn scan_number(&mut self, pos: SourcePos) -> Result<Token, SyntaxError> {
        let mut text = String::new();
        if self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x') | Some('b'))
        {
            let radix_char = self.peek_at(1).unwrap_or('x');
            text.push(self.bump().unwrap_or('0'));
            text.push(self.bump().unwrap_or(radix_char));
            let is_digit: fn(char) -> bool = if radix_char == 'x' {
                |c| c.is_ascii_hexdigit()
            } else {
                |c| c == '0' || c == '1'
            };
            let mut seen = false;
            while let Some(c) = self.peek() {
                if is_digit(c) {
                    text.push(c);
                    seen = true;
                    self.bump();
                } else if c == '_' {
                    self.bump();
                } else {
                    break;
                }
            }
            if !seen {
                return Err(self.error("invalid numeric literal", pos));
            }
            self.check_number_end(&pos)?;
            return Ok(Token {
                kind: TokenKind::Int,
                text,
                pos,
            });
        }

        let mut kind = TokenKind::Int;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else if c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        // A '.' directly followed by a digit switches to a decimal scan;
        // '..' or '.x' belongs to the following tokens.
        if self.peek() == Some('.')
            && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
        {
            kind = TokenKind::Decimal;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else if c == '_' {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.check_number_end(&pos)?;
        Ok(Token { kind, text, pos })
    }

    /// A number token must end at whitespace, an operator or EOF; a letter
    /// glued to the digits is a malformed literal, not two tokens.
    fn check_number_end(&self, pos: &SourcePos) -> Result<(), SyntaxError> {
        if let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                return Err(self.error("invalid numeric literal", pos.clone()));
            }
        }
        Ok(())
    }

    fn scan_string(&mut self, pos: SourcePos) -> Result<Token, SyntaxError> {
        let quote = self.bump().unwrap_or('\'');
        let mut text = String::new();
        loop {
            let c = match self.bump() {
                Some(c) => c,
                None => return Err(self.error("unterminated string literal", pos)),
            };
            if c == quote {
                break;
            }
            if c != '\\' {
                text.push(c);
                continue;
            }
            let esc = match self.bump() {
                Some(c) => c,
                None => return Err(self.error("unterminated string literal", pos)),
            };
            match esc {
                'n' => text.push('\n'),
                'r' => text.push('\r'),
                't' => text.push('\t'),
                'x' => {
                    let hi = self.bump();
                    let lo = self.bump();
                    let code = match (hi, lo) {
                        (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => {
                            let mut s = String::new();
                            s.push(h);
                            s.push(l);
                            u32::from_str_radix(&s, 16).ok().and_then(char::from_u32)
                        }
                        _ => None,
                    };
                    match code {
                        Some(ch) => text.push(ch),
                        None => {
                            return Err(
                                self.error("invalid \\x escape in string literal", pos)
                            )
                        }
                    }
                }
                other => text.push(other),
            }
        }
        Ok(Token {
            kind: TokenKind::Str,
            text,
            pos,
        })
    }

    /// `//…//`: the body is taken verbatim, no escape processing.
    fn scan_pattern(&mut self, pos: SourcePos) -> Result<Token, SyntaxError> {
        self.bump();
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated pattern literal", pos)),
                Some('/') if self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        Ok(Token {
            kind: TokenKind::Pattern,
            text,
            pos,
        })
    }

    fn scan_punctuation(&mut self, pos: SourcePos) -> Result<Token, SyntaxError> {
        let c = self.bump().unwrap_or('\0');
        let next = self.peek();
        let text: String = match c {
            '(' | ')' | '[' | ']' | ',' | ';' | ':' => {
                return Ok(Token {
                    kind: TokenKind::Interpunction,
                    text: c.to_string(),
                    pos,
                });
            }
            '<' => match next {
                Some('<') if self.peek_at(1) == Some('<') => self.take(2, "<<<"),
                Some('<') => self.take(1, "<<"),
                Some('*') => self.take(1, "<*"),
                Some('=') => self.take(1, "<="),
                _ => "<".to_string(),
            },
            '>' => match next {
                Some('>') if self.peek_at(1) == Some('>') => self.take(2, ">>>"),
                Some('>') => self.take(1, ">>"),
                Some('=') => self.take(1, ">="),
                _ => ">".to_string(),
            },
            '=' => match next {
                Some('=') => self.take(1, "=="),
                Some('>') => self.take(1, "=>"),
                _ => "=".to_string(),
            },
            '!' => match next {
                Some('=') => self.take(1, "!="),
                Some('>') => self.take(1, "!>"),
                _ => "!".to_string(),
            },
            '-' => match next {
                Some('>') => self.take(1, "->"),
                Some('=') => self.take(1, "-="),
                _ => "-".to_string(),
            },
            '*' => match next {
                Some('>') => self.take(1, "*>"),
                Some('=') => self.take(1, "*="),
                _ => "*".to_string(),
            },
            '+' => match next {
                Some('=') => self.take(1, "+="),
                _ => "+".to_string(),
            },
            '/' => match next {
                Some('=') => self.take(1, "/="),
                _ => "/".to_string(),
            },
            '%' => match next {
                Some('=') => self.take(1, "%="),
                _ => "%".to_string(),
            },
            '.' => {
                if next == Some('.') && self.peek_at(1) == Some('.') {
                    self.take(2, "...")
                } else {
                    ".".to_string()
                }
            }
            other => {
                return Err(self.error(
                    format!("unexpected character {:?}", other),
                    pos,
                ));
            }
        };
        Ok(Token {
            kind: TokenKind::Operator,
            text,
            pos,
        })
    }

    fn take(&mut self, extra: usize, text: &str) -> String {
        for _ in 0..extra {
            self.bump();
        }
        text.to_string()
    }
}
