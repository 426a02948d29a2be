use regel::Interpreter;

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect("run").to_string()
}

fn fails(src: &str) -> bool {
    Interpreter::new().run(src).is_err()
}

#[test]
fn positional_named_and_mixed_calls_bind_identically() {
    let def = "def f = fn(a, b) [a, b];";
    assert_eq!(run(&format!("{} f(1, 2)", def)), "[1, 2]");
    assert_eq!(run(&format!("{} f(1, b=2)", def)), "[1, 2]");
    assert_eq!(run(&format!("{} f(a=1, b=2)", def)), "[1, 2]");
    assert_eq!(run(&format!("{} f(b=2, a=1)", def)), "[1, 2]");
}

#[test]
fn binder_failure_cases() {
    let def = "def f = fn(a, b) [a, b];";
    assert!(fails(&format!("{} f(c=1)", def)));
    assert!(fails(&format!("{} f(a=1, 2)", def)));
    assert!(fails(&format!("{} f(1, 2, 3)", def)));
    assert!(fails(&format!("{} f(1)", def)));
}

#[test]
fn defaults_are_evaluated_lazily_in_declaration_order() {
    assert_eq!(run("(fn(a, b = a * 2) [a, b])(5)"), "[5, 10]");
    assert_eq!(run("(fn(a, b = a * 2) [a, b])(5, 1)"), "[5, 1]");
    // A default may reference an outer binding.
    assert_eq!(run("def base = 100; (fn(x = base + 1) x)()"), "101");
}

#[test]
fn rest_parameter_collects_overflow_into_a_list() {
    assert_eq!(run("(fn(a, xs...) [a, xs])(1, 2, 3)"), "[1, [2, 3]]");
    assert_eq!(run("(fn(xs...) xs)()"), "[]");
}

#[test]
fn spread_arguments_expand_before_binding() {
    assert_eq!(run("(fn(a, b, c) [a, b, c])(...[1, 2, 3])"), "[1, 2, 3]");
    assert_eq!(
        run("(fn(a, b) [a, b])(...<<<'a' => 1, 'b' => 2>>>)"),
        "[1, 2]"
    );
    assert_eq!(run("(fn(a, b, c) [a, b, c])(1, ...[2, 3])"), "[1, 2, 3]");
}

#[test]
fn closures_share_their_defining_environment() {
    let src = "def mk = fn() do \
                 def n = 0; \
                 def bump = fn() n = n + 1; \
                 def get = fn() n; \
                 [bump, get] \
               end; \
               def [bump, get] = mk(); \
               bump(); bump(); get()";
    assert_eq!(run(src), "2");
}

#[test]
fn def_names_a_lambda_retroactively() {
    assert_eq!(run("def double = fn(x) x * 2; double"), "<#double>");
    assert_eq!(run("fn(x) x"), "<#lambda>");
}

#[test]
fn pipe_inserts_the_subject_as_first_argument() {
    assert_eq!(run("5 !> string()"), "'5'");
    assert_eq!(run("[1, 2, 3] !> length()"), "3");
    assert_eq!(run("def add1 = fn(x) x + 1; 41 !> add1()"), "42");
}

#[test]
fn recursion_through_block_predefinition() {
    assert_eq!(
        run("def fact = fn(x) if x == 0 then 1 else x * fact(x - 1); fact(5)"),
        "120"
    );
}

#[test]
fn member_invoke_injects_self() {
    let src = "def o = <*n = 10, double = fn(self) self->n * 2*>; o->double()";
    assert_eq!(run(src), "20");
}

#[test]
fn host_can_call_returned_lambdas() {
    let mut interp = Interpreter::new();
    let f = interp.run("fn(x) x * 3").expect("run");
    let result = interp.call(&f, vec![regel::Value::Int(14)]).expect("call");
    assert_eq!(result.to_string(), "42");
}

#[test]
fn rest_must_be_the_last_parameter() {
    assert!(Interpreter::new().run("fn(xs..., a) xs").is_err());
}
