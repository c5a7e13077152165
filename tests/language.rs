use kip_lang::object::Object;
use kip_lang::{evaluate, new_environment, parse};

fn run(source: &str) -> Object {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
    let env = new_environment();
    evaluate(&program, &env)
}

#[test]
fn rejects_evaluation_when_source_has_parse_errors() {
    let (_, errors) = parse("let x 5;");
    assert!(!errors.is_empty());
}

#[test]
fn fibonacci_via_recursion() {
    let src = r#"
        let fib = fn(n) {
            if (n < 2) { n } else { fib(n - 1) + fib(n - 2) }
        };
        fib(10);
    "#;
    assert!(matches!(run(src), Object::Integer(55)));
}

#[test]
fn higher_order_map_over_array_via_builtins() {
    let src = r#"
        let map = fn(arr, f) {
            let iter = fn(arr, accumulated) {
                if (len(arr) == 0) {
                    accumulated
                } else {
                    iter(rest(arr), push(accumulated, f(first(arr))));
                }
            };
            iter(arr, []);
        };
        let double = fn(x) { x * 2 };
        map([1, 2, 3, 4], double);
    "#;
    match run(src) {
        Object::Array(elements) => {
            let values: Vec<i64> = elements
                .borrow()
                .iter()
                .map(|e| match e {
                    Object::Integer(v) => *v,
                    other => panic!("expected integer, got {other:?}"),
                })
                .collect();
            assert_eq!(values, vec![2, 4, 6, 8]);
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn closures_capture_their_defining_environment() {
    let src = r#"
        let newAdder = fn(x) { fn(y) { x + y }; };
        let addFive = newAdder(5);
        addFive(10);
    "#;
    assert!(matches!(run(src), Object::Integer(15)));
}

#[test]
fn while_loop_mutates_array_visible_outside_the_loop() {
    let src = r#"
        let acc = [];
        let i = 0;
        while (i < 3) {
            acc = push(acc, i);
            i += 1;
        }
        len(acc);
    "#;
    assert!(matches!(run(src), Object::Integer(3)));
}

#[test]
fn hash_literal_supports_mixed_hashable_key_kinds() {
    let src = r#"
        let h = {"one": 1, "two": 2, 3: "three", true: "yes"};
        [h["one"], h[3], h[true]];
    "#;
    match run(src) {
        Object::Array(elements) => {
            let elements = elements.borrow();
            assert!(matches!(elements[0], Object::Integer(1)));
            assert!(matches!(&elements[1], Object::Str(s) if s.as_str() == "three"));
            assert!(matches!(&elements[2], Object::Str(s) if s.as_str() == "yes"));
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn indexed_compound_assignment_on_array_element() {
    let src = r#"
        let arr = [1, 2, 3];
        arr[1] += 10;
        arr[1];
    "#;
    assert!(matches!(run(src), Object::Integer(12)));
}

#[test]
fn error_on_indexed_compound_assign_to_missing_hash_key() {
    let src = r#"
        let h = {"a": 1};
        h["b"] += 1;
    "#;
    match run(src) {
        Object::Error(msg) => assert!(msg.starts_with("cannot assign key not exist")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn error_on_out_of_range_array_assignment() {
    match run("let arr = [1]; arr[5] = 2;") {
        Object::Error(msg) => assert_eq!(msg, "valid index range is 0 until 0. got=5"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn calling_a_non_function_is_an_error() {
    match run("let x = 5; x();") {
        Object::Error(msg) => assert_eq!(msg, "not a function: INTEGER"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn operator_precedence_table_from_the_language_reference() {
    let cases: &[(&str, i64)] = &[
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ("2 * (5 + 10)", 30),
    ];
    for (src, expected) in cases {
        assert!(
            matches!(run(src), Object::Integer(v) if v == *expected),
            "input was {src}"
        );
    }
    assert!(matches!(run("!0"), Object::Boolean(true)));
    assert!(matches!(run("!!5"), Object::Boolean(true)));
    match run(r#""Hello" + " " + "World!""#) {
        Object::Str(s) => assert_eq!(s.as_str(), "Hello World!"),
        other => panic!("expected string, got {other:?}"),
    }
    assert!(matches!(
        run("if (1 < 2) { 10 } else { 20 }"),
        Object::Integer(10)
    ));
}

#[test]
fn unusable_hash_key_reports_the_offending_type() {
    match run(r#"{"name":"Monkey"}[fn(x){x}]"#) {
        Object::Error(msg) => assert_eq!(msg, "unusable as hash key: FUNCTION"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn indexed_assignment_on_a_literal_target_is_rejected() {
    match run("[1,2][0] = 12;") {
        Object::Error(msg) => assert_eq!(msg, "invalid identifier using index"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn indexed_assignment_into_an_empty_array_is_an_error() {
    match run("let a=[]; a[0]=1;") {
        Object::Error(msg) => assert_eq!(msg, "array is empty. cannot set at any index"),
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn nested_if_return_surfaces_through_outer_block_without_unwrapping_early() {
    let src = r#"
        let f = fn() {
            if (10 > 1) {
                if (10 > 1) {
                    return 10;
                }
                return 1;
            }
        };
        f();
    "#;
    assert!(matches!(run(src), Object::Integer(10)));
}

#[test]
fn extra_call_arguments_are_ignored_missing_ones_error_only_if_referenced() {
    assert!(matches!(
        run("let f = fn(a) { 1 }; f(1, 2, 3);"),
        Object::Integer(1)
    ));
    match run("let f = fn(a, b) { a }; f(1);") {
        Object::Integer(1) => {}
        other => panic!("expected 1, got {other:?}"),
    }
}
