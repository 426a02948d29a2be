use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDateTime;

use crate::interpreter::environment::Environment;
use crate::interpreter::eval::{call_value, eval, Flow};
use crate::value::{ControlError, LangError, SourcePos, Value};

pub(crate) mod args;
pub mod environment;
mod eval;
mod vars;

/// Services the language reaches out of the sandbox for: module source text,
/// the clock, and the random seed. Embedders may substitute their own.
pub trait HostServices {
    /// Resolve a `require` specifier to module source text.
    fn read_module(&self, spec: &str) -> Result<String, String>;

    fn now(&self) -> NaiveDateTime;

    fn random_seed(&self) -> u64;

    /// Extend the module search path. The default implementation ignores the
    /// call; only hosts that resolve modules from a filesystem need it.
    fn add_module_path(&mut self, path: PathBuf) {
        let _ = path;
    }
}

/// Filesystem-and-clock host: modules are `<spec>.regel` files looked up in
/// the registered search paths, then the current directory.
pub struct DefaultHost {
    module_paths: Vec<PathBuf>,
}

impl DefaultHost {
    pub fn new() -> Self {
        Self {
            module_paths: Vec::new(),
        }
    }
}

impl Default for DefaultHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostServices for DefaultHost {
    fn read_module(&self, spec: &str) -> Result<String, String> {
        let file = if spec.ends_with(".regel") {
            spec.to_string()
        } else {
            format!("{}.regel", spec)
        };
        let mut candidates: Vec<PathBuf> =
            self.module_paths.iter().map(|p| p.join(&file)).collect();
        candidates.push(PathBuf::from(&file));
        for candidate in &candidates {
            if let Ok(source) = fs::read_to_string(candidate) {
                return Ok(source);
            }
        }
        Err(spec.to_string())
    }

    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn random_seed(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_nanos() as u64 | 1,
            Err(_) => 0x9e37_79b9_7f4a_7c15,
        }
    }

    fn add_module_path(&mut self, path: PathBuf) {
        self.module_paths.push(path);
    }
}

/// Mutable evaluation context threaded through every native call: the host
/// services, the buffered print output, the module cache, and the random
/// state. Explicit state, no hidden statics, so interpreter instances stay
/// isolated.
pub struct Ctx {
    pub(crate) host: Box<dyn HostServices>,
    pub(crate) root: Rc<Environment>,
    pub(crate) modules: HashMap<String, Value>,
    output: String,
    rng: u64,
}

impl Ctx {
    pub(crate) fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    /// xorshift64 step over the host-provided seed.
    pub(crate) fn next_random(&mut self) -> u64 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        x
    }
}

/// The embeddable engine: owns the root environment with the registered
/// natives, a persistent global scope that `run` calls share, and the
/// evaluation context.
pub struct Interpreter {
    globals: Rc<Environment>,
    ctx: Ctx,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_host(Box::new(DefaultHost::new()))
    }

    pub fn with_host(host: Box<dyn HostServices>) -> Self {
        let root = Environment::new_root();
        crate::builtins::register_all(&root);
        let rng = host.random_seed();
        let ctx = Ctx {
            host,
            root: root.clone(),
            modules: HashMap::new(),
            output: String::new(),
            rng,
        };
        Self {
            globals: Environment::with_parent(root),
            ctx,
        }
    }

    pub fn add_module_path(&mut self, path: impl Into<PathBuf>) {
        self.ctx.host.add_module_path(path.into());
    }

    /// Parse and evaluate a script. Top-level definitions persist across
    /// calls; a top-level `return` is unwrapped, a dangling `break` or
    /// `continue` is an error.
    pub fn run(&mut self, source: &str) -> Result<Value, LangError> {
        self.run_named(source, "<script>")
    }

    pub fn run_named(&mut self, source: &str, filename: &str) -> Result<Value, LangError> {
        let program = crate::parser::parse_script(source, filename)?;
        match eval(&program, &self.globals, &mut self.ctx)? {
            Flow::Val(v) | Flow::Return(v) => Ok(v),
            Flow::Break | Flow::Continue => {
                Err(LangError::Control(ControlError::new(
                    "break/continue used without surrounding loop",
                    SourcePos::new(Rc::from(filename), 1, 1),
                )))
            }
        }
    }

    /// Call a callable value obtained from a previous `run` with positional
    /// arguments. This is the host's way into rule lambdas.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, LangError> {
        let args = args.into_iter().map(|v| (None, v)).collect();
        let pos = SourcePos::new(Rc::from("<host>"), 1, 1);
        Ok(call_value(&mut self.ctx, callee, args, &pos)?)
    }

    /// Names a script references that neither the script itself nor the
    /// native root environment binds. These are the script's external inputs.
    pub fn free_variables(&self, source: &str) -> Result<BTreeSet<String>, LangError> {
        let program = crate::parser::parse_script(source, "<script>")?;
        let mut free = vars::free_variables(&program);
        for name in self.ctx.root.local_names() {
            free.remove(&name);
        }
        for name in self.globals.local_names() {
            free.remove(&name);
        }
        Ok(free)
    }

    /// Everything `print`/`println` wrote since the last `take_output`.
    pub fn output(&self) -> &str {
        &self.ctx.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.ctx.output)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
