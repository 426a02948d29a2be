use regel::Interpreter;

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect("run").to_string()
}

#[test]
fn default_parameter_and_string_repeat() {
    assert_eq!(run("(fn(a, b=3) string(a) * b)(55)"), "'555555'");
}

#[test]
fn nested_closures_capture_outer_parameter() {
    assert_eq!(run("def a = fn(y) fn(x) y * x; a(12)(2)"), "24");
}

#[test]
fn comprehension_with_filter() {
    assert_eq!(run("[x * 2 for x in range(5) if x % 2 == 1]"), "[2, 6]");
}

#[test]
fn destructuring_swap() {
    assert_eq!(run("def [a, b] = [1, 2]; [a, b] = [b, a]; [a, b]"), "[2, 1]");
}

#[test]
fn sequential_if_continues_the_chain() {
    assert_eq!(
        run("if 13 < 12 then 'a' if 14 < 12 then 'b' else 'c'"),
        "'c'"
    );
}

#[test]
fn recursive_block_definition_has_no_free_variables() {
    let interp = Interpreter::new();
    let free = interp
        .free_variables(
            "def a = fn(x) do def y = x - 1; if x == 0 then 1 else x * a(y) end; a(10)",
        )
        .expect("analyze");
    assert!(free.is_empty(), "unexpected free variables: {:?}", free);
}

#[test]
fn block_definitions_stay_visible_after_the_block() {
    assert_eq!(run("do def x = 1 end; x"), "1");
    let interp = Interpreter::new();
    let free = interp
        .free_variables("do def x = 1 end; x")
        .expect("analyze");
    assert!(free.is_empty(), "unexpected free variables: {:?}", free);
}

#[test]
fn required_module_names_are_not_external_inputs() {
    let interp = Interpreter::new();
    let free = interp
        .free_variables("require 'strings/pad'; pad->width")
        .expect("analyze");
    assert!(free.is_empty(), "unexpected free variables: {:?}", free);
}

#[test]
fn free_variables_are_the_external_inputs() {
    let interp = Interpreter::new();
    let free = interp
        .free_variables("amount > 0 and currency in ['EUR', 'USD']")
        .expect("analyze");
    let names: Vec<&str> = free.iter().map(|s| s.as_str()).collect();
    assert_eq!(names, vec!["amount", "currency"]);
}
