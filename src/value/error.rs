use std::fmt;
use std::rc::Rc;

use super::Value;

/// Position of a token or AST node in the original source text.
/// Line and column are 1-based; `file` is only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
    pub file: Rc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub(crate) fn new(file: Rc<str>, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    pub(crate) fn unknown() -> Self {
        Self {
            file: Rc::from("<unknown>"),
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A lexical or parse failure. Always fatal; scripts can never catch these.
#[derive(Debug)]
pub struct SyntaxError {
    pub message: String,
    pub pos: SourcePos,
}

impl SyntaxError {
    pub(crate) fn new(message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.pos)
    }
}

/// One call-stack entry accumulated while a control error unwinds.
#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub name: String,
    pub pos: SourcePos,
}

/// A runtime failure or an explicit `error` raise. Carries an arbitrary
/// Value payload; `catch` clauses match by value equality against it.
#[derive(Debug, Clone)]
pub struct ControlError {
    pub value: Value,
    pub pos: SourcePos,
    pub trace: Vec<TraceFrame>,
}

impl ControlError {
    pub(crate) fn new(message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            value: Value::from_string(message.into()),
            pos,
            trace: Vec::new(),
        }
    }

    pub(crate) fn with_value(value: Value, pos: SourcePos) -> Self {
        Self {
            value,
            pos,
            trace: Vec::new(),
        }
    }

    /// Record a call frame as this error unwinds through a funcall.
    pub(crate) fn add_frame(&mut self, name: impl Into<String>, pos: SourcePos) {
        self.trace.push(TraceFrame {
            name: name.into(),
            pos,
        });
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.value, self.pos)?;
        for frame in &self.trace {
            write!(f, "\n  in {} at {}", frame.name, frame.pos)?;
        }
        Ok(())
    }
}

/// Host-facing error type: either a fatal syntax error or a control error
/// that propagated uncaught out of the script.
#[derive(Debug)]
pub enum LangError {
    Syntax(SyntaxError),
    Control(ControlError),
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LangError::Syntax(e) => write!(f, "syntax error: {}", e),
            LangError::Control(e) => write!(f, "error: {}", e),
        }
    }
}

impl std::error::Error for LangError {}

impl From<SyntaxError> for LangError {
    fn from(e: SyntaxError) -> Self {
        LangError::Syntax(e)
    }
}

impl From<ControlError> for LangError {
    fn from(e: ControlError) -> Self {
        LangError::Control(e)
    }
}
