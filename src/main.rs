use std::env;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use regel::{Interpreter, LangError, Value};

/// Where the script text comes from, decided entirely by the argument list.
enum Source {
    Repl,
    Inline(String),
    File(String),
    Stdin,
}

struct Cli {
    source: Source,
    dump_ast: bool,
    module_paths: Vec<String>,
}

fn parse_cli(mut args: impl Iterator<Item = String>) -> Result<Cli, String> {
    let mut dump_ast = false;
    let mut want_repl = false;
    let mut module_paths = Vec::new();
    let mut inline: Option<String> = None;
    let mut file: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dump-ast" => dump_ast = true,
            "--repl" => want_repl = true,
            "-e" => match args.next() {
                Some(code) => inline = Some(code),
                None => return Err("-e needs a code argument".to_string()),
            },
            "-I" => match args.next() {
                Some(path) => module_paths.push(path),
                None => return Err("-I needs a path argument".to_string()),
            },
            other => {
                if let Some(path) = other.strip_prefix("-I") {
                    module_paths.push(path.to_string());
                } else if file.is_none() && inline.is_none() {
                    file = Some(other.to_string());
                } else {
                    return Err(format!("unexpected argument '{}'", other));
                }
            }
        }
    }

    let source = if want_repl {
        Source::Repl
    } else if let Some(code) = inline {
        Source::Inline(code)
    } else if let Some(path) = file {
        Source::File(path)
    } else {
        Source::Stdin
    };
    Ok(Cli {
        source,
        dump_ast,
        module_paths,
    })
}

fn report(err: &LangError) {
    match err {
        LangError::Syntax(e) => eprintln!("regel: syntax error: {} at {}", e.message, e.pos),
        LangError::Control(e) => {
            eprintln!("regel: error: {} at {}", e.value, e.pos);
            for frame in &e.trace {
                eprintln!("    in {} at {}", frame.name, frame.pos);
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = match parse_cli(env::args().skip(1)) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("regel: {}", message);
            eprintln!("usage: regel [--repl] [--dump-ast] [-I <path>] [-e <code> | <file>]");
            return ExitCode::FAILURE;
        }
    };

    let (text, name) = match cli.source {
        Source::Repl => {
            regel::repl::run_repl();
            return ExitCode::SUCCESS;
        }
        Source::Inline(code) => (code, "<inline>".to_string()),
        Source::File(path) => match fs::read_to_string(&path) {
            Ok(text) => (text, path),
            Err(err) => {
                eprintln!("regel: cannot read {}: {}", path, err);
                return ExitCode::FAILURE;
            }
        },
        Source::Stdin => {
            // No script and a terminal on stdin means an interactive session.
            if io::stdin().is_terminal() {
                regel::repl::run_repl();
                return ExitCode::SUCCESS;
            }
            let mut text = String::new();
            if let Err(err) = io::stdin().read_to_string(&mut text) {
                eprintln!("regel: cannot read stdin: {}", err);
                return ExitCode::FAILURE;
            }
            (text, "<stdin>".to_string())
        }
    };

    if cli.dump_ast {
        return match regel::dump_ast(&text) {
            Ok(tree) => {
                println!("{}", tree);
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("regel: syntax error: {} at {}", err.message, err.pos);
                ExitCode::FAILURE
            }
        };
    }

    let mut interpreter = Interpreter::new();
    for path in cli.module_paths {
        interpreter.add_module_path(path);
    }
    let result = interpreter.run_named(&text, &name);
    print!("{}", interpreter.output());
    match result {
        Ok(Value::Null) => ExitCode::SUCCESS,
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
