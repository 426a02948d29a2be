use regel::Interpreter;

fn run(src: &str) -> String {
    let mut interp = Interpreter::new();
    interp.run(src).expect("run").to_string()
}

fn fails(src: &str) -> bool {
    Interpreter::new().run(src).is_err()
}

#[test]
fn literals_accept_trailing_commas_and_spreads() {
    assert_eq!(run("[1, 2, 3,]"), "[1, 2, 3]");
    assert_eq!(run("<<1, 2,>>"), "<<1, 2>>");
    assert_eq!(run("<<<'a' => 1,>>>"), "<<<'a' => 1>>>");
    assert_eq!(run("<*a = 1,*>"), "<*a=1*>");
    assert_eq!(run("[1, ...[2, 3], 4]"), "[1, 2, 3, 4]");
    assert_eq!(run("<<...[3, 1], 2>>"), "<<1, 2, 3>>");
}

#[test]
fn set_and_map_comprehensions() {
    assert_eq!(run("<<x % 3 for x in range(10)>>"), "<<0, 1, 2>>");
    assert_eq!(
        run("<<<string(x) => x * x for x in range(3)>>>"),
        "<<<'0' => 0, '1' => 1, '2' => 4>>>"
    );
    assert_eq!(
        run("[x for x in range(6) if x > 3]"),
        "[4, 5]"
    );
}

#[test]
fn product_comprehensions_pair_two_sources() {
    assert_eq!(
        run("<<x * 10 + y for x in range(1, 3) for y in range(1, 3) if x != y>>"),
        "<<12, 21>>"
    );
    assert_eq!(
        run("<<<string(x) + string(y) => x + y for x in range(2) for y in range(2)>>>"),
        "<<<'00' => 0, '01' => 1, '10' => 1, '11' => 2>>>"
    );
}

#[test]
fn indexing_supports_negative_positions() {
    assert_eq!(run("[10, 20, 30][-1]"), "30");
    assert_eq!(run("'hello'[1]"), "'e'");
    assert_eq!(run("'hello'[-2]"), "'l'");
    assert!(fails("[1, 2][5]"));
    assert!(fails("[1, 2]['x']"));
}

#[test]
fn slices_clamp_instead_of_failing() {
    assert_eq!(run("'hello'[1:3]"), "'el'");
    assert_eq!(run("'hello'[:2]"), "'he'");
    assert_eq!(run("'hello'[3:]"), "'lo'");
    assert_eq!(run("'hello'[:]"), "'hello'");
    assert_eq!(run("'hello'[1:99]"), "'ello'");
    assert_eq!(run("'hello'[3:1]"), "''");
    assert_eq!(run("[1, 2, 3][:-1]"), "[1, 2]");
}

#[test]
fn map_lookup_with_and_without_a_default() {
    assert_eq!(run("<<<'a' => 1>>>['a']"), "1");
    assert_eq!(run("<<<'a' => 1>>>['b', 0]"), "0");
    assert_eq!(run("<<<'a' => 1>>>['a', 0]"), "1");
    assert!(fails("<<<'a' => 1>>>['b']"));
    assert!(fails("[1, 2][0, 9]"));
}

#[test]
fn indexed_assignment_mutates_in_place() {
    assert_eq!(run("def xs = [1, 2, 3]; xs[1] = 9; xs"), "[1, 9, 3]");
    assert_eq!(
        run("def m = <<<'a' => 1>>>; m['b'] = 2; m"),
        "<<<'a' => 1, 'b' => 2>>>"
    );
    assert_eq!(run("def m = <<<'k' => 1>>>; m['k'] += 5; m['k']"), "6");
    assert_eq!(run("def xs = [10]; xs[0] *= 3; xs"), "[30]");
}

#[test]
fn object_members_read_and_write() {
    assert_eq!(run("def o = <*x = 1*>; o->x = 5; o->x"), "5");
    assert_eq!(run("def o = <*x = 1*>; o->y"), "NULL");
    assert_eq!(run("def o = <*n = 1*>; o->n += 2; o->n"), "3");
    assert_eq!(run("<*x = 7*>['x']"), "7");
}

#[test]
fn prototype_chain_resolves_inherited_members() {
    let src = "def base = <*greet = fn(self) 'hi ' + self->name*>; \
               def o = <*_proto_ = base, name = 'bob'*>; o->greet()";
    assert_eq!(run(src), "'hi bob'");
    assert_eq!(
        run("def base = <*x = 1*>; <*_proto_ = base*>->missing"),
        "NULL"
    );
}

#[test]
fn map_members_invoke_like_a_lookup_plus_call() {
    assert_eq!(
        run("def m = <<<'double' => fn(x) x * 2>>>; m->double(21)"),
        "42"
    );
    assert_eq!(
        run("def m = <<<'double' => fn(x) x * 2>>>; m->double"),
        "<#lambda>"
    );
    assert!(fails("def m = <<<'a' => 1>>>; m->missing()"));
}

#[test]
fn prototype_cycles_are_detected() {
    assert!(fails(
        "def a = <*x = 1*>; def b = <*_proto_ = a*>; a->_proto_ = b; b->missing"
    ));
}

#[test]
fn destructuring_pads_with_null_and_orders_sets() {
    assert_eq!(run("def [a, b, c] = [1]; [a, b, c]"), "[1, NULL, NULL]");
    assert_eq!(run("def [a, b] = <<2, 1>>; [a, b]"), "[1, 2]");
}

#[test]
fn membership_and_containment() {
    assert_eq!(run("2 in [1, 2, 3]"), "TRUE");
    assert_eq!(run("'ell' in 'hello'"), "TRUE");
    assert_eq!(run("4 not in <<1, 2, 3>>"), "TRUE");
    assert_eq!(run("'a' in <<<'a' => 1>>>"), "TRUE");
    assert_eq!(run("contains([1, 2], 2)"), "TRUE");
}

#[test]
fn range_generates_half_open_sequences() {
    assert_eq!(run("range(3)"), "[0, 1, 2]");
    assert_eq!(run("range(1, 4)"), "[1, 2, 3]");
    assert_eq!(run("range(10, 0, -3)"), "[10, 7, 4, 1]");
    assert!(fails("range(0, 5, 0)"));
}

#[test]
fn keys_values_entries_views() {
    let m = "def m = <<<'b' => 2, 'a' => 1>>>;";
    assert_eq!(run(&format!("{} keys(m)", m)), "['a', 'b']");
    assert_eq!(run(&format!("{} values(m)", m)), "[1, 2]");
    assert_eq!(run(&format!("{} entries(m)", m)), "[['a', 1], ['b', 2]]");
    let o = "def o = <*b = 2, a = 1*>;";
    assert_eq!(run(&format!("{} keys(o)", o)), "['b', 'a']");
}

#[test]
fn append_returns_the_same_list_handle() {
    assert_eq!(run("def xs = []; append(append(xs, 1), 2); xs"), "[1, 2]");
}
