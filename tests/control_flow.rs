use regel::Interpreter;

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect("run").to_string()
}

fn run_err(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect_err("expected failure").to_string()
}

#[test]
fn while_loop_terminates_on_false_condition() {
    assert_eq!(run("def i = 0; while i < 3 do i = i + 1 end; i"), "3");
}

#[test]
fn break_stops_the_loop_with_a_truthy_sentinel() {
    assert_eq!(run("while TRUE do break end"), "TRUE");
    assert_eq!(
        run("def acc = []; for x in range(10) do if x == 5 then break else append(acc, x) end; acc"),
        "[0, 1, 2, 3, 4]"
    );
}

#[test]
fn continue_skips_to_the_next_iteration() {
    assert_eq!(
        run("def acc = []; for x in range(6) do if x % 2 == 0 then continue else append(acc, x) end; acc"),
        "[1, 3, 5]"
    );
}

#[test]
fn loop_variables_do_not_leak() {
    let mut interp = Interpreter::new();
    interp.run("for x in range(3) x").expect("run");
    assert!(interp.run("x").is_err());
}

#[test]
fn dangling_break_is_an_error() {
    assert!(run_err("break").contains("without surrounding loop"));
}

#[test]
fn top_level_return_is_unwrapped() {
    assert_eq!(run("return 5"), "5");
    assert_eq!(run("def f = fn(x) do return x * 2; 99 end; f(4)"), "8");
}

#[test]
fn conditions_must_be_boolean() {
    assert!(run_err("if 1 then 2").contains("boolean"));
    assert!(run_err("while 'x' do 1 end").contains("boolean"));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(run("FALSE and (1 / 0 == 0)"), "FALSE");
    assert_eq!(run("TRUE or (1 / 0 == 0)"), "TRUE");
    assert_eq!(run("TRUE xor FALSE"), "TRUE");
    assert_eq!(run("not FALSE"), "TRUE");
}

#[test]
fn raised_errors_match_catch_clauses_by_equality() {
    assert_eq!(run("do error 'boom' catch 'boom' 'handled' end"), "'handled'");
    assert_eq!(
        run("do error 'boom' catch 'other' 'no' catch all 'fallback' end"),
        "'fallback'"
    );
}

#[test]
fn unmatched_errors_propagate_with_their_payload() {
    assert!(run_err("do error 42 catch 'boom' 'no' end").contains("42"));
}

#[test]
fn finally_runs_on_every_exit_path() {
    assert_eq!(
        run("def log = []; do append(log, 1) finally append(log, 2) end; log"),
        "[1, 2]"
    );
    assert_eq!(
        run("def log = []; do do error 'x' finally append(log, 'cleanup') end catch all TRUE end; log"),
        "['cleanup']"
    );
}

#[test]
fn error_trace_names_the_failing_call_chain() {
    let err = run_err("def inner = fn() error 'deep'; def outer = fn() inner(); outer()");
    assert!(err.contains("deep"));
    assert!(err.contains("inner"));
    assert!(err.contains("outer"));
}

#[test]
fn for_iterates_strings_and_input_streams() {
    assert_eq!(run("def acc = []; for c in 'abc' append(acc, c); acc"), "['a', 'b', 'c']");
    assert_eq!(
        run("def acc = []; for line in str_input('x\\ny\\nz') append(acc, line); acc"),
        "['x', 'y', 'z']"
    );
}

#[test]
fn for_selects_map_views() {
    let src = "def m = <<<'a' => 1, 'b' => 2>>>;";
    assert_eq!(
        run(&format!("{} def acc = []; for k in keys m append(acc, k); acc", src)),
        "['a', 'b']"
    );
    assert_eq!(
        run(&format!("{} def acc = []; for v in m append(acc, v); acc", src)),
        "[1, 2]"
    );
    assert_eq!(
        run(&format!(
            "{} def acc = []; for [k, v] in entries m append(acc, k + string(v)); acc",
            src
        )),
        "['a1', 'b2']"
    );
}
