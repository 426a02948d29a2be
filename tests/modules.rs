use std::collections::HashMap;

use chrono::NaiveDateTime;
use regel::{HostServices, Interpreter};

struct MapHost {
    modules: HashMap<&'static str, &'static str>,
}

impl HostServices for MapHost {
    fn read_module(&self, spec: &str) -> Result<String, String> {
        self.modules
            .get(spec)
            .map(|src| src.to_string())
            .ok_or_else(|| spec.to_string())
    }

    fn now(&self) -> NaiveDateTime {
        NaiveDateTime::default()
    }

    fn random_seed(&self) -> u64 {
        1
    }
}

fn interp_with(modules: &[(&'static str, &'static str)]) -> Interpreter {
    Interpreter::with_host(Box::new(MapHost {
        modules: modules.iter().copied().collect(),
    }))
}

#[test]
fn require_exposes_module_definitions_as_an_object() {
    let mut interp = interp_with(&[(
        "money",
        "def cents = fn(euros) euros * 100; def zero = 0",
    )]);
    let result = interp.run("require money; money->cents(3)").expect("run");
    assert_eq!(result.to_string(), "300");
    let result = interp.run("money->zero").expect("run");
    assert_eq!(result.to_string(), "0");
}

#[test]
fn require_as_binds_an_alias() {
    let mut interp = interp_with(&[("strings/pad", "def width = 8")]);
    let result = interp
        .run("require 'strings/pad' as pad; pad->width")
        .expect("run");
    assert_eq!(result.to_string(), "8");
}

#[test]
fn path_specifier_binds_its_basename_by_default() {
    let mut interp = interp_with(&[("strings/pad", "def width = 8")]);
    let result = interp.run("require 'strings/pad'; pad->width").expect("run");
    assert_eq!(result.to_string(), "8");
    let free = interp
        .free_variables("require 'strings/pad'; pad->width")
        .expect("analyze");
    assert!(free.is_empty(), "unexpected free variables: {:?}", free);
}

#[test]
fn modules_are_evaluated_once_and_cached() {
    let mut interp = interp_with(&[("noisy", "println('loaded'); def x = 1")]);
    interp.run("require noisy; require noisy; noisy->x").expect("run");
    assert_eq!(interp.output(), "loaded\n");
}

#[test]
fn missing_modules_are_reported() {
    let mut interp = interp_with(&[]);
    assert!(interp.run("require nothing_here").is_err());
}

#[test]
fn module_bindings_do_not_leak_into_the_script() {
    let mut interp = interp_with(&[("m", "def secret = 42")]);
    interp.run("require m").expect("run");
    assert!(interp.run("secret").is_err());
    assert_eq!(interp.run("m->secret").expect("run").to_string(), "42");
}

#[test]
fn println_output_is_buffered_per_interpreter() {
    let mut interp = Interpreter::new();
    interp.run("println('a'); print('b'); println('c')").expect("run");
    assert_eq!(interp.output(), "a\nbc\n");
    assert_eq!(interp.take_output(), "a\nbc\n");
    assert_eq!(interp.output(), "");
}
