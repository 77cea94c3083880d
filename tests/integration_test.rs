// ABOUTME: End-to-end tests driving the public Interpreter API

use stacklisp::error::ErrorKind;
use stacklisp::form::Form;
use stacklisp::interp::Interpreter;
use stacklisp::value::Value;

fn setup() -> Interpreter {
    Interpreter::new().expect("stdlib should load")
}

fn eval(interp: &Interpreter, src: &str) -> Value {
    match interp.eval_str(src) {
        Ok(value) => value,
        Err(err) => panic!("evaluation of {:?} failed: {}", src, err),
    }
}

fn ints(values: &[i64]) -> Value {
    Value::List(values.iter().map(|n| Value::Int(*n)).collect())
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_variadic_addition() {
    let interp = setup();
    assert_eq!(eval(&interp, "(+ 1 2 3)"), Value::Int(6));
}

#[test]
fn test_let_with_two_bindings() {
    let interp = setup();
    assert_eq!(eval(&interp, "(let (x 2 y 3) (* x y))"), Value::Int(6));
}

#[test]
fn test_recursive_factorial() {
    let interp = setup();
    let src = "(defn fact (n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 5)";
    assert_eq!(eval(&interp, src), Value::Int(120));
}

#[test]
fn test_user_defined_when_macro() {
    let interp = setup();
    let src = "(defmacro when (c & body) (list 'if c (cons 'do body) None))
               (when (= 1 1) 7)";
    assert_eq!(eval(&interp, src), Value::Int(7));
}

#[test]
fn test_quote_with_selective_unquote() {
    let interp = setup();
    let src = "(let (x 2) (' 1 ~ x ~(inc x) 4))";
    assert_eq!(eval(&interp, src), ints(&[1, 2, 3, 4]));
}

#[test]
fn test_match_picks_arity_matching_clause() {
    let interp = setup();
    let src = r#"(match (list 1 2 3) ((a) "one") ((a b c) "three") (_ "other"))"#;
    assert_eq!(eval(&interp, src), Value::Str("three".to_string()));
}

// ============================================================================
// Quantified invariants
// ============================================================================

#[test]
fn test_scope_isolation() {
    let interp = setup();
    eval(&interp, "(def x 10)");
    assert_eq!(eval(&interp, "(let (x 1) x)"), Value::Int(1));
    // the outer binding is untouched by the let
    assert_eq!(eval(&interp, "x"), Value::Int(10));
}

#[test]
fn test_root_def_inside_let_escapes() {
    let interp = setup();
    eval(&interp, "(let (x 1) (def escaped (+ x 1)))");
    assert_eq!(eval(&interp, "escaped"), Value::Int(2));
}

#[test]
fn test_argument_side_effects_run_left_to_right() {
    let interp = setup();
    let src = "(def order (list))
               (defn note (x) (def order (append order x)) x)
               (defn three (a b c) None)
               (three (note 1) (note 2) (note 3))
               order";
    assert_eq!(eval(&interp, src), ints(&[1, 2, 3]));
}

#[test]
fn test_quote_returns_program_as_equal_data() {
    let interp = setup();
    let quoted = eval(&interp, "'(a (b 1) \"s\" 2.5 None)");
    let expected = Value::List(vec![
        Value::Form(Form::symbol("a")),
        Value::List(vec![Value::Form(Form::symbol("b")), Value::Int(1)]),
        Value::Str("s".to_string()),
        Value::Float(2.5),
        Value::Nil,
    ]);
    assert_eq!(quoted, expected);
}

#[test]
fn test_macroexpand_idempotence() {
    let interp = setup();
    eval(
        &interp,
        "(defmacro twice (x) (list '+ x x))",
    );
    let direct = eval(&interp, "(twice 21)");
    let expanded = eval(&interp, "(eval (macroexpand '(twice 21)))");
    assert_eq!(direct, expanded);
    assert_eq!(direct, Value::Int(42));
}

#[test]
fn test_tail_recursion_survives_ten_thousand_iterations() {
    let interp = setup();
    let src = "(defn spin (n) (if (= n 0) 0 (spin (- n 1)))) (spin 10000)";
    assert_eq!(eval(&interp, src), Value::Int(0));
}

#[test]
fn test_tail_call_through_do_and_let_is_also_safe() {
    let interp = setup();
    let src = "(defn spin (n acc)
                 (if (= n 0)
                     acc
                     (do (let (next (- n 1)) (spin next (+ acc 1))))))
               (spin 20000 0)";
    assert_eq!(eval(&interp, src), Value::Int(20000));
}

#[test]
fn test_lexical_capture_beats_later_bindings() {
    let interp = setup();
    eval(&interp, "(def x 99)");
    assert_eq!(eval(&interp, "((let (x 1) (# x)))"), Value::Int(1));
}

// ============================================================================
// Everything together
// ============================================================================

#[test]
fn test_closures_share_their_defining_scope() {
    let interp = setup();
    let src = "(defn make-adder (n) (fn (x) (+ x n)))
               (def add2 (make-adder 2))
               (def add10 (make-adder 10))
               (list (add2 1) (add10 1))";
    assert_eq!(eval(&interp, src), ints(&[3, 11]));
}

#[test]
fn test_def_can_shadow_builtins() {
    let interp = setup();
    eval(&interp, "(def len (fn (xs) 42))");
    assert_eq!(eval(&interp, "(len (list 1))"), Value::Int(42));
}

#[test]
fn test_pyimport_attribute_and_call() {
    let interp = setup();
    eval(&interp, "(pyimport math)");
    let result = eval(&interp, "((. math sqrt) 16)");
    assert_eq!(result, Value::Float(4.0));
}

#[test]
fn test_pyimport_from_binds_attribute_at_root() {
    let interp = setup();
    eval(&interp, "(let (ignored 0) (pyimport_from math floor))");
    assert_eq!(eval(&interp, "(floor 2.9)"), Value::Int(2));
}

#[test]
fn test_dollar_builds_references_from_strings() {
    let interp = setup();
    let src = r#"(def counter 7) ($ (concat "coun" "ter"))"#;
    assert_eq!(eval(&interp, src), Value::Int(7));
}

#[test]
fn test_dollar_inside_macro() {
    let interp = setup();
    let src = r#"(defmacro getvar (name) (list '$ name))
                 (def hidden 5)
                 (getvar "hidden")"#;
    assert_eq!(eval(&interp, src), Value::Int(5));
}

#[test]
fn test_shorthand_fn_with_map() {
    let interp = setup();
    assert_eq!(
        eval(&interp, "(map (# (* %0 %0)) (list 1 2 3))"),
        ints(&[1, 4, 9])
    );
}

#[test]
fn test_match_destructures_rest() {
    let interp = setup();
    let src = "(match (range 5) ((head & tail) (list head (len tail))))";
    assert_eq!(eval(&interp, src), ints(&[0, 4]));
}

#[test]
fn test_comment_form_evaluates_to_nil() {
    let interp = setup();
    assert_eq!(eval(&interp, "(comment this is (not) evaluated)"), Value::Nil);
}

// ============================================================================
// Failure reporting
// ============================================================================

#[test]
fn test_trace_names_the_failing_call_chain() {
    let interp = setup();
    let err = interp
        .eval_str("(defn inner (n) (missing n)) (defn outer (n) (* 2 (inner (+ n 1)))) (outer 1)")
        .expect_err("should fail with NameError");
    assert!(matches!(err.kind, ErrorKind::Name(ref name) if name == "missing"));

    let rendered = err.to_string();
    assert!(rendered.contains("in outer with n=1"));
    assert!(rendered.contains("in inner with n=2"));
    assert!(rendered.contains("Exception happened here:"));
    assert!(rendered.contains("name 'missing' is not defined"));
}

#[test]
fn test_trace_elides_deeply_nested_forms() {
    let interp = setup();
    let err = interp
        .eval_str("(defn f (x) (boom ((((1))))))  (f 1)")
        .expect_err("should fail");
    assert!(err.to_string().contains("(...)"));
}

#[test]
fn test_wrong_arity_is_reported_with_parameters() {
    let interp = setup();
    let err = interp
        .eval_str("(defn pair (a b) (list a b)) (pair 1)")
        .expect_err("should fail with ArityError");
    match err.kind {
        ErrorKind::Arity { callee, params, actual } => {
            assert_eq!(callee, "pair");
            assert_eq!(params, "(a b)");
            assert_eq!(actual, 1);
        }
        other => panic!("expected ArityError, got {}", other),
    }
}

#[test]
fn test_match_failure_reports_the_value() {
    let interp = setup();
    let err = interp
        .eval_str("(match (list 1 2) ((a) a) ((a b c) c))")
        .expect_err("should fail with MatchError");
    assert!(matches!(err.kind, ErrorKind::MatchFailed(_)));
    assert!(err.to_string().contains("(1 2)"));
}

#[test]
fn test_parse_errors_surface_as_parse_kind() {
    let interp = setup();
    let err = interp.eval_str("(+ 1").expect_err("should fail to parse");
    assert!(matches!(err.kind, ErrorKind::Parse(_)));
}
