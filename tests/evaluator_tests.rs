// tests/evaluator_tests.rs

use std::collections::HashMap;
use std::sync::Arc;

use glue_lang::ast::{DotKey, Expr};
use glue_lang::evaluator::{EvalError, Evaluator};
use glue_lang::fetch::{FetchError, Fetcher};
use glue_lang::lexer::Lexer;
use glue_lang::parser::Parser;
use glue_lang::source::SourceReader;
use glue_lang::value::Value;

/// Fetcher serving canned bodies; unknown urls fail like a dead host.
struct StubFetcher {
    responses: HashMap<String, String>,
}

impl StubFetcher {
    fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(StubFetcher {
            responses: pairs
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        })
    }

    fn empty() -> Arc<Self> {
        Self::new(&[])
    }
}

impl Fetcher for StubFetcher {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError("connection refused".to_string()))
    }
}

fn eval_with(source: &str, fetcher: Arc<StubFetcher>) -> Result<Value, EvalError> {
    let mut parser = Parser::new(Lexer::new(SourceReader::from_string(source)));
    let statements = parser.parse_statements().expect("source should parse");
    let mut evaluator = Evaluator::new(fetcher);
    evaluator.run_statements(&statements)
}

fn eval(source: &str) -> Result<Value, EvalError> {
    eval_with(source, StubFetcher::empty())
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_integer_arithmetic_stays_integer() {
    assert_eq!(eval("return 2 + 3 * 4 - 6 / 2;").unwrap(), Value::Integer(11));
}

#[test]
fn test_mixed_arithmetic_promotes_to_float() {
    assert_eq!(eval("return 1 + 2.5;").unwrap(), Value::Float(3.5));
    assert_eq!(eval("return 2.5 + 1;").unwrap(), Value::Float(3.5));
    assert_eq!(eval("return 3 * 0.5;").unwrap(), Value::Float(1.5));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(
        eval(r#"return "foo" + "bar";"#).unwrap(),
        Value::String("foobar".to_string())
    );
}

#[test]
fn test_string_plus_number_is_a_type_error() {
    assert!(matches!(
        eval(r#"return "a" + 1;"#),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(eval("return 7 / 2;").unwrap(), Value::Integer(3));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval("return 1 / 0;"), Err(EvalError::DivisionByZero)));
    assert!(matches!(
        eval("return 1.5 / 0;"),
        Err(EvalError::DivisionByZero)
    ));
}

// ============================================================================
// Comparison and logic
// ============================================================================

#[test]
fn test_equality_on_matching_types() {
    assert_eq!(eval("return 1 == 1;").unwrap(), Value::Boolean(true));
    assert_eq!(eval(r#"return "a" == "a";"#).unwrap(), Value::Boolean(true));
    assert_eq!(eval("return 1 != 2;").unwrap(), Value::Boolean(true));
}

#[test]
fn test_equality_across_types_is_unequal_not_an_error() {
    assert_eq!(eval(r#"return 1 == "1";"#).unwrap(), Value::Boolean(false));
    assert_eq!(eval("return 1 == 1.0;").unwrap(), Value::Boolean(false));
    assert_eq!(eval(r#"return 1 != "1";"#).unwrap(), Value::Boolean(true));
}

#[test]
fn test_relational_operators() {
    assert_eq!(eval("return 1 < 2;").unwrap(), Value::Boolean(true));
    assert_eq!(eval("return 2 <= 2;").unwrap(), Value::Boolean(true));
    assert_eq!(eval("return 1.5 > 1;").unwrap(), Value::Boolean(true));
    assert_eq!(eval(r#"return "abc" < "abd";"#).unwrap(), Value::Boolean(true));
}

#[test]
fn test_relational_type_mismatch_is_an_error() {
    assert!(matches!(
        eval(r#"return 1 < "2";"#),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_logical_operators_require_booleans() {
    assert_eq!(
        eval("return 1 < 2 && 3 < 4 || 1 == 2;").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(eval("return !(1 < 2);").unwrap(), Value::Boolean(false));
    assert!(matches!(eval("return 1 && 2;"), Err(EvalError::TypeError(_))));
    assert!(matches!(eval("return !5;"), Err(EvalError::TypeError(_))));
}

// ============================================================================
// Environment
// ============================================================================

#[test]
fn test_assignment_binds_and_returns_the_value() {
    assert_eq!(eval("a = 2; b = 3; return a + b;").unwrap(), Value::Integer(5));
    // Assignment is an expression yielding the assigned value
    assert_eq!(eval("a = (b = 4); return a;").unwrap(), Value::Integer(4));
}

#[test]
fn test_undefined_variable_read_is_an_error() {
    assert!(matches!(
        eval("return missing;"),
        Err(EvalError::UndefinedVariable(name)) if name == "missing"
    ));
}

#[test]
fn test_assignment_target_must_be_identifier() {
    assert!(matches!(eval("1 = 2;"), Err(EvalError::TypeError(_))));
}

#[test]
fn test_no_block_scoping() {
    assert_eq!(
        eval("if (1 == 1) { a = 7; } return a;").unwrap(),
        Value::Integer(7)
    );
}

#[test]
fn test_declarations() {
    assert_eq!(eval("int n = 5; return n;").unwrap(), Value::Integer(5));
    // An uninitialized declaration still introduces the name
    assert_eq!(eval("int n; return n;").unwrap(), Value::Integer(0));
}

// ============================================================================
// Arrays and objects
// ============================================================================

#[test]
fn test_array_access() {
    assert_eq!(
        eval("xs = [10, 20, 30]; return xs[1];").unwrap(),
        Value::Integer(20)
    );
}

#[test]
fn test_array_access_out_of_range_fails() {
    assert!(matches!(
        eval("xs = [10, 20, 30]; return xs[5];"),
        Err(EvalError::AccessError(_))
    ));
}

#[test]
fn test_array_access_rejects_non_integer_index() {
    assert!(matches!(
        eval(r#"xs = [1]; return xs["0"];"#),
        Err(EvalError::AccessError(_))
    ));
}

#[test]
fn test_nested_compound_values() {
    assert_eq!(
        eval(r#"xs = [[1, 2], { "k": [3] }]; return xs[1].k[0];"#).unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn test_dot_access_on_object() {
    assert_eq!(
        eval(r#"obj = { "msg": "hi" }; return obj.msg;"#).unwrap(),
        Value::String("hi".to_string())
    );
}

#[test]
fn test_dot_access_missing_key_is_null() {
    assert_eq!(
        eval(r#"obj = { "msg": "hi" }; return obj.absent;"#).unwrap(),
        Value::Null
    );
}

#[test]
fn test_dot_access_integer_index_on_array() {
    assert_eq!(
        eval("xs = [10, 20]; return xs.1;").unwrap(),
        Value::Integer(20)
    );
    assert!(matches!(
        eval("xs = [10, 20]; return xs.5;"),
        Err(EvalError::AccessError(_))
    ));
}

#[test]
fn test_dot_access_negative_index_is_null() {
    // A negative index is not spellable in source; exercise the tree directly
    let mut evaluator = Evaluator::new(StubFetcher::empty());
    evaluator
        .eval_expression(&Expr::Assign {
            target: Box::new(Expr::Identifier("xs".to_string())),
            value: Box::new(Expr::Array(vec![Expr::Integer(1)])),
        })
        .unwrap();
    let result = evaluator
        .eval_expression(&Expr::Dot {
            object: Box::new(Expr::Identifier("xs".to_string())),
            key: DotKey::Index(-1),
        })
        .unwrap();
    assert_eq!(result, Value::Null);
}

#[test]
fn test_dot_access_on_non_object_fails() {
    assert!(matches!(
        eval("n = 1; return n.k;"),
        Err(EvalError::AccessError(_))
    ));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_else_branches() {
    assert_eq!(
        eval("if (1 < 2) { return 1; } else { return 2; }").unwrap(),
        Value::Integer(1)
    );
    assert_eq!(
        eval("if (1 > 2) { return 1; } else { return 2; }").unwrap(),
        Value::Integer(2)
    );
}

#[test]
fn test_if_condition_must_be_boolean() {
    assert!(matches!(
        eval("if (1) { return 1; }"),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_while_loop() {
    assert_eq!(
        eval("i = 0; total = 0; while (i < 5) { total = total + i; i = i + 1; } return total;")
            .unwrap(),
        Value::Integer(10)
    );
}

#[test]
fn test_while_non_boolean_condition_ends_the_loop() {
    assert_eq!(eval("x = 1; while (x) { x = 2; } return x;").unwrap(), Value::Integer(1));
}

#[test]
fn test_for_loop() {
    assert_eq!(
        eval("total = 0; for (i = 0; i < 4; i = i + 1) { total = total + i; } return total;")
            .unwrap(),
        Value::Integer(6)
    );
}

#[test]
fn test_for_loop_missing_condition_is_true() {
    assert_eq!(
        eval("for (i = 0;; i = i + 1) { if (i == 3) { return i; } }").unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn test_return_unwinds_nested_blocks() {
    assert_eq!(
        eval("{ { { return 1; } } return 2; }").unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn test_return_from_inside_loop() {
    assert_eq!(
        eval("for (i = 0;; i = i + 1) { { return i; } }").unwrap(),
        Value::Integer(0)
    );
}

#[test]
fn test_completing_without_return_yields_zero() {
    assert_eq!(eval("a = 1;").unwrap(), Value::Integer(0));
    assert_eq!(eval("return;").unwrap(), Value::Integer(0));
}

// ============================================================================
// Each
// ============================================================================

#[test]
fn test_each_counts_matching_pairs() {
    assert_eq!(
        eval(
            "xs = [1, 2, 3, 4]; total = 0; \
             each (a, b in xs) meet a + b == 5 { total = total + 1; } \
             return total;"
        )
        .unwrap(),
        Value::Integer(2) // (1,4) and (2,3)
    );
}

#[test]
fn test_each_visits_all_ordered_pairs() {
    // 4 elements => 6 distinct pairs
    assert_eq!(
        eval(
            "xs = [1, 2, 3, 4]; n = 0; \
             each (a, b in xs) meet a < b { n = n + 1; } \
             return n;"
        )
        .unwrap(),
        Value::Integer(6)
    );
}

#[test]
fn test_each_non_boolean_meet_skips_the_pair() {
    assert_eq!(
        eval(
            "xs = [1, 2, 3]; n = 0; \
             each (a, b in xs) meet a + b { n = n + 1; } \
             return n;"
        )
        .unwrap(),
        Value::Integer(0)
    );
}

#[test]
fn test_each_over_non_array_fails() {
    assert!(matches!(
        eval("xs = 1; each (a, b in xs) meet a == b { } return 0;"),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_each_return_escapes_the_loop() {
    assert_eq!(
        eval("xs = [1, 2, 3]; each (a, b in xs) meet a < b { return b; } return 0;").unwrap(),
        Value::Integer(2)
    );
}

// ============================================================================
// Print
// ============================================================================

#[test]
fn test_print_capture_formats_scalars_and_compounds() {
    let source = r#"print "total: ", 1 + 2; print [1, 2], " ", { "k": 1.5 };"#;
    let mut parser = Parser::new(Lexer::new(SourceReader::from_string(source)));
    let statements = parser.parse_statements().unwrap();

    let mut evaluator = Evaluator::capturing(StubFetcher::empty());
    evaluator.run_statements(&statements).unwrap();

    assert_eq!(
        evaluator.into_captured_output(),
        "total: 3\n[1,2] {\"k\":1.5}\n"
    );
}

// ============================================================================
// Fetch
// ============================================================================

#[test]
fn test_fetch_decodes_binds_and_returns() {
    let fetcher = StubFetcher::new(&[("http://127.0.0.1:8015/hello", r#"{"msg":"hi"}"#)]);
    assert_eq!(
        eval_with(
            r#"x <- "http://127.0.0.1:8015/hello"; return x.msg;"#,
            fetcher
        )
        .unwrap(),
        Value::String("hi".to_string())
    );
}

#[test]
fn test_fetch_result_is_the_decoded_value() {
    let fetcher = StubFetcher::new(&[("http://host/n", "41")]);
    assert_eq!(
        eval_with(r#"return (x <- "http://host/n") + 1;"#, fetcher).unwrap(),
        Value::Integer(42)
    );
}

#[test]
fn test_fetch_invalid_json_yields_zero_and_does_not_bind() {
    let fetcher = StubFetcher::new(&[("http://host/bad", "not json")]);
    assert_eq!(
        eval_with(r#"return x <- "http://host/bad";"#, fetcher.clone()).unwrap(),
        Value::Integer(0)
    );
    // The identifier was never bound, so a later read fails
    assert!(matches!(
        eval_with(r#"y <- "http://host/bad"; return y;"#, fetcher),
        Err(EvalError::UndefinedVariable(_))
    ));
}

#[test]
fn test_fetch_transport_error_yields_zero() {
    assert_eq!(
        eval(r#"return x <- "http://127.0.0.1:1/unreachable";"#).unwrap(),
        Value::Integer(0)
    );
}

#[test]
fn test_fetch_url_must_be_string() {
    assert!(matches!(
        eval("return x <- 42;"),
        Err(EvalError::TypeError(_))
    ));
}

#[test]
fn test_fetch_json_null_decodes_to_zero() {
    let fetcher = StubFetcher::new(&[("http://host/null", "null")]);
    assert_eq!(
        eval_with(r#"return x <- "http://host/null";"#, fetcher).unwrap(),
        Value::Integer(0)
    );
}
