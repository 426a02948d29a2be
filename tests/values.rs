use regel::Interpreter;

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect("run").to_string()
}

#[test]
fn scalar_literals_render_canonically() {
    assert_eq!(run("NULL"), "NULL");
    assert_eq!(run("TRUE"), "TRUE");
    assert_eq!(run("42"), "42");
    assert_eq!(run("2.50"), "2.5");
    assert_eq!(run("5.0"), "5.0");
    assert_eq!(run("'it\\'s'"), "'it\\'s'");
    assert_eq!(run("//\\d+//"), "//\\d+//");
}

#[test]
fn sets_and_maps_order_by_the_total_order() {
    assert_eq!(run("<<3, 1, 2>>"), "<<1, 2, 3>>");
    assert_eq!(run("<<1, 'b', 'a'>>"), "<<1, 'a', 'b'>>");
    assert_eq!(
        run("<<<'b' => 2, 'a' => 1>>>"),
        "<<<'a' => 1, 'b' => 2>>>"
    );
    // Int and Decimal collapse when numerically equal.
    assert_eq!(run("<<1, 1.0, 2>>"), "<<1, 2>>");
}

#[test]
fn objects_render_in_insertion_order_hiding_underscore_keys() {
    assert_eq!(
        run("<*b = 1, a = 2, _hidden = 3*>"),
        "<*b=1, a=2*>"
    );
}

#[test]
fn list_mutation_is_visible_through_every_alias() {
    assert_eq!(run("def a = [1]; def b = a; append(a, 2); b"), "[1, 2]");
}

#[test]
fn string_operations_never_mutate_the_original() {
    assert_eq!(
        run("def s = 'ab'; def t = s + 'c'; [s, t]"),
        "['ab', 'abc']"
    );
}

#[test]
fn cross_type_equality_is_false_but_numeric_types_promote() {
    assert_eq!(run("1 == '1'"), "FALSE");
    assert_eq!(run("1 == 1.0"), "TRUE");
    assert_eq!(run("compare(1, 2.5)"), "-1");
}

#[test]
fn rendered_literals_reparse_to_equal_values() {
    let sources = [
        "42",
        "-7",
        "2.5",
        "'hello'",
        "TRUE",
        "[1, 2.5, 'x', TRUE]",
        "<<1, 2, 3>>",
        "<<<'a' => 1>>>",
        "//[a-z]+//",
    ];
    for src in sources {
        let rendered = run(src);
        assert_eq!(run(&rendered), rendered, "round trip of {}", src);
    }
}

#[test]
fn integer_and_decimal_division_differ() {
    assert_eq!(run("7 / 2"), "3");
    assert_eq!(run("7.0 / 2"), "3.5");
    assert_eq!(run("7 % 3"), "1");
}

#[test]
fn division_by_zero_raises() {
    let mut interp = Interpreter::new();
    assert!(interp.run("1 / 0").is_err());
}

#[test]
fn arithmetic_lowering_handles_unary_minus() {
    assert_eq!(run("-5 + 3"), "-2");
    assert_eq!(run("def x = 4; -x"), "-4");
    assert_eq!(run("-2.5"), "-2.5");
}

#[test]
fn conversions_between_scalar_types() {
    assert_eq!(run("int('42')"), "42");
    assert_eq!(run("int(3.9)"), "3");
    assert_eq!(run("decimal('1.5')"), "1.5");
    assert_eq!(run("boolean('TRUE')"), "TRUE");
    assert_eq!(run("string(12) + string(34)"), "'1234'");
    assert_eq!(run("type([])"), "'list'");
}

#[test]
fn date_parses_and_renders_eight_digits() {
    assert_eq!(run("date('20240229')"), "20240229");
    assert_eq!(run("date('20240101') < date('20241231')"), "TRUE");
}
