use regel::Interpreter;

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect("run").to_string()
}

#[test]
fn emptiness_covers_null_strings_and_collections() {
    assert_eq!(run("'' is empty"), "TRUE");
    assert_eq!(run("NULL is empty"), "TRUE");
    assert_eq!(run("[] is empty"), "TRUE");
    assert_eq!(run("<<>> is empty"), "TRUE");
    assert_eq!(run("'x' is empty"), "FALSE");
    assert_eq!(run("[1] is not empty"), "TRUE");
}

#[test]
fn numeric_predicates() {
    assert_eq!(run("0 is zero"), "TRUE");
    assert_eq!(run("0.0 is zero"), "TRUE");
    assert_eq!(run("1 is zero"), "FALSE");
    assert_eq!(run("-1 is negative"), "TRUE");
    assert_eq!(run("-0.5 is negative"), "TRUE");
    assert_eq!(run("2 is not negative"), "TRUE");
}

#[test]
fn character_class_predicates_with_length_modifiers() {
    assert_eq!(run("'12345' is numerical"), "TRUE");
    assert_eq!(run("'12a45' is numerical"), "FALSE");
    assert_eq!(run("'abc12' is alphanumerical"), "TRUE");
    assert_eq!(run("'ab c' is alphanumerical"), "FALSE");
    // The subject is stringified first, so ints qualify directly.
    assert_eq!(run("12345 is numerical exact_len 5"), "TRUE");
    assert_eq!(run("12345 is numerical exact_len 4"), "FALSE");
    assert_eq!(run("'123' is numerical min_len 2 max_len 4"), "TRUE");
    assert_eq!(run("'1' is numerical min_len 2"), "FALSE");
    assert_eq!(run("'' is numerical"), "FALSE");
    assert_eq!(run("'' is not numerical"), "TRUE");
}

#[test]
fn textual_predicates() {
    assert_eq!(run("'hello' starts with 'he'"), "TRUE");
    assert_eq!(run("'hello' ends with 'lo'"), "TRUE");
    assert_eq!(run("'hello' contains 'ell'"), "TRUE");
    assert_eq!(run("'hello' contains 'xyz'"), "FALSE");
    assert_eq!(run("'abc123' matches //[a-z]+\\d+//"), "TRUE");
    assert_eq!(run("'abc' matches '^a.c$'"), "TRUE");
    assert_eq!(run("'abc' matches //\\d+//"), "FALSE");
}

#[test]
fn membership_reads_like_a_sentence() {
    assert_eq!(run("'EUR' in ['EUR', 'USD']"), "TRUE");
    assert_eq!(run("'GBP' not in ['EUR', 'USD']"), "TRUE");
    assert_eq!(run("3 is in <<1, 2, 3>>"), "TRUE");
    assert_eq!(run("9 is not in <<1, 2, 3>>"), "TRUE");
}

#[test]
fn bare_is_compares_for_equality() {
    assert_eq!(run("5 is 5"), "TRUE");
    assert_eq!(run("5 is 6"), "FALSE");
    assert_eq!(run("'a' is 'a'"), "TRUE");
}

#[test]
fn relational_chains_conjoin() {
    assert_eq!(run("1 < 2 < 3"), "TRUE");
    assert_eq!(run("1 < 2 < 2"), "FALSE");
    assert_eq!(run("3 >= 3 > 1 != 0"), "TRUE");
}

#[test]
fn a_realistic_validation_rule() {
    let rule = "amount is numerical min_len 2 max_len 6 \
                and currency in ['EUR', 'USD'] \
                and reference starts with 'INV-'";
    let src = format!(
        "def amount = 1500; def currency = 'EUR'; def reference = 'INV-0042'; {}",
        rule
    );
    assert_eq!(run(&src), "TRUE");
}
