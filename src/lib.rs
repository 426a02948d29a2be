mod ast;
mod builtins;
mod interpreter;
mod lexer;
mod parser;
pub mod repl;
pub mod value;

pub use builtins::NativeFunc;
pub use interpreter::{DefaultHost, HostServices, Interpreter};
pub use value::{ControlError, LangError, SyntaxError, Value};

/// Parse a script and render its AST for inspection.
pub fn dump_ast(source: &str) -> Result<String, SyntaxError> {
    let program = parser::parse_script(source, "<dump>")?;
    Ok(format!("{:#?}", program))
}
