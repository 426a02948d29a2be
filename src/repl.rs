use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::{Interpreter, LangError, Value};

/// Check whether the input is obviously unfinished: unbalanced brackets or
/// more `do` openers than `end` closers, ignoring strings and comments.
fn is_incomplete(input: &str) -> bool {
    let mut depth_paren = 0i32;
    let mut depth_bracket = 0i32;
    let mut block_depth = 0i32;
    let mut word = String::new();
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '#' {
            for c in chars.by_ref() {
                if c == '\n' {
                    break;
                }
            }
            continue;
        }
        if ch == '\'' || ch == '"' {
            let quote = ch;
            let mut prev = '\0';
            for c in chars.by_ref() {
                if c == quote && prev != '\\' {
                    break;
                }
                prev = if prev == '\\' { '\0' } else { c };
            }
            continue;
        }
        if ch.is_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }
        match word.as_str() {
            "do" => block_depth += 1,
            "end" => block_depth -= 1,
            _ => {}
        }
        word.clear();
        match ch {
            '(' => depth_paren += 1,
            ')' => depth_paren -= 1,
            '[' => depth_bracket += 1,
            ']' => depth_bracket -= 1,
            _ => {}
        }
    }
    match word.as_str() {
        "do" => block_depth += 1,
        "end" => block_depth -= 1,
        _ => {}
    }
    depth_paren > 0 || depth_bracket > 0 || block_depth > 0
}

/// Result of processing a single REPL line.
enum LineResult {
    /// Need more input (incomplete expression).
    Continue,
    /// Line was processed (output may have been produced).
    Done,
}

/// Process one line of REPL input. Has no I/O dependencies beyond the
/// `Interpreter`, so the loop's behavior is testable.
fn process_line(
    interpreter: &mut Interpreter,
    accumulated: &mut String,
    line: &str,
) -> (LineResult, Option<String>) {
    if accumulated.is_empty() {
        *accumulated = line.to_string();
    } else {
        accumulated.push('\n');
        accumulated.push_str(line);
    }

    if is_incomplete(accumulated) {
        return (LineResult::Continue, None);
    }

    if accumulated.trim().is_empty() {
        accumulated.clear();
        return (LineResult::Done, None);
    }

    let display = match interpreter.run(accumulated) {
        Ok(value) => {
            let mut text = interpreter.take_output();
            if !matches!(value, Value::Null) {
                text.push_str(&value.to_string());
                text.push('\n');
            }
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        Err(LangError::Syntax(err)) if is_incomplete(accumulated) => {
            let _ = err;
            return (LineResult::Continue, None);
        }
        Err(err) => {
            let mut text = interpreter.take_output();
            text.push_str(&format!("Error: {}\n", err));
            Some(text)
        }
    };

    accumulated.clear();
    (LineResult::Done, display)
}

pub fn run_repl() {
    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Failed to initialize line editor: {}", err);
            std::process::exit(1);
        }
    };

    let mut interpreter = Interpreter::new();
    let mut accumulated = String::new();

    loop {
        let prompt = if accumulated.is_empty() { "> " } else { "* " };

        match rl.readline(prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let (result, display) = process_line(&mut interpreter, &mut accumulated, &line);
                if let Some(text) = display {
                    print!("{}", text);
                }
                if matches!(result, LineResult::Continue) {
                    continue;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C: cancel current input
                accumulated.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D: exit
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_detection_tracks_blocks_and_brackets() {
        assert!(is_incomplete("do def x = 1"));
        assert!(is_incomplete("[1, 2,"));
        assert!(is_incomplete("f(1,"));
        assert!(!is_incomplete("do def x = 1 end"));
        assert!(!is_incomplete("'do' + 'x'"));
        assert!(!is_incomplete("1 + 2 # do"));
    }

    #[test]
    fn process_line_accumulates_until_complete() {
        let mut interp = Interpreter::new();
        let mut acc = String::new();
        let (result, display) = process_line(&mut interp, &mut acc, "do def x = 40");
        assert!(matches!(result, LineResult::Continue));
        assert!(display.is_none());
        let (result, display) = process_line(&mut interp, &mut acc, "x + 2 end");
        assert!(matches!(result, LineResult::Done));
        assert_eq!(display.as_deref(), Some("42\n"));
    }
}
