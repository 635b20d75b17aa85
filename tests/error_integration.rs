//! Integration tests for error reporting
//!
//! These tests cover the farthest-failure record, failure priorities,
//! positions, formatting and serialization of errors.

use knotwork::prelude::*;
use knotwork::scanners::{is_char, string};

// ============================================================================
// Farthest Failure
// ============================================================================

#[test]
fn test_farthest_failure_wins() {
    let grammar = string("let")
        .then(string(" "))
        .then(string("x"))
        .or(string("l").then(string("o")));
    let err = grammar.parse("let y").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.offset(), 4);
    assert_eq!(err.expected, vec!["x"]);
}

#[test]
fn test_expected_list_is_deduplicated_in_order() {
    let grammar = choice(vec![string("b"), string("a"), string("b"), string("c")]);
    let err = grammar.parse("z").unwrap_err();
    assert_eq!(err.as_parse().unwrap().expected, vec!["b", "a", "c"]);
}

#[test]
fn test_explicit_failure_outranks_expectations() {
    let grammar = choice(vec![
        string("a"),
        fail("reserved word"),
        string("b"),
    ]);
    let err = grammar.parse("z").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.kind, ErrorKind::ExplicitFailure);
    assert!(err.expected.is_empty());
    assert_eq!(err.to_string(), "line 1, column 1: reserved word");
}

#[test]
fn test_expectations_outrank_unexpected() {
    let grammar = unexpected::<()>("tab").or(string("a"));
    let err = grammar.parse("\t").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.expected, vec!["a"]);
}

#[test]
fn test_deeper_explicit_failure_survives_backtracking() {
    let grammar = string("a").then(fail::<()>("after a")).or(string("b").unit());
    let err = grammar.parse("a").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.offset(), 1);
    assert_eq!(err.message.as_deref(), Some("after a"));
}

#[test]
fn test_label_outer_name_replaces_inner() {
    let digits = is_char(CharClass::Digit).many1().label("number").unit();
    let value = digits.or(string("null").label("null"));
    let err = value.parse("x").unwrap_err();
    assert_eq!(err.as_parse().unwrap().expected, vec!["number", "null"]);
}

// ============================================================================
// Positions and Formatting
// ============================================================================

#[test]
fn test_multiline_position() {
    let line = string("ok").skip(string("\n"));
    let grammar = line.many().skip(eof());
    let source = "ok\nok\nno\n";
    let err = grammar.parse(source).unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!((err.line(), err.column()), (3, 1));

    let formatted = err.format_with_source(source);
    assert!(formatted.starts_with("line 3, column 1:"));
    assert!(formatted.contains("no"));
    assert!(formatted.ends_with('^'));
}

#[test]
fn test_column_counts_characters() {
    let grammar = string("αβ").then(string("γ"));
    let err = grammar.parse("αβδ").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.offset(), 4);
    assert_eq!(err.column(), 3);
    assert_eq!(err.unexpected.as_deref(), Some("δ"));
}

#[test]
fn test_error_json() {
    let err = string("a").parse("b").unwrap_err();
    let json = err.as_parse().unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["kind"], "Mismatch");
    assert_eq!(value["position"]["column"], 1);
    assert_eq!(value["expected"][0], "a");
    assert!(value.get("trace").is_none());
}

#[test]
fn test_error_is_std_error() {
    fn describe(e: &dyn std::error::Error) -> String {
        e.to_string()
    }
    let err = string("a").parse("").unwrap_err();
    assert_eq!(describe(&err), "line 1, column 1: a expected, EOF encountered");
    assert!(std::error::Error::source(&err).is_some());
}

// ============================================================================
// Grammar Errors
// ============================================================================

#[test]
fn test_grammar_errors_at_build_time() {
    assert_eq!(
        is_char('a').times_range(3, 1).unwrap_err(),
        GrammarError::InvalidRepetition { min: 3, max: 1 }
    );
    assert!(matches!(
        Pattern::regex("[unclosed"),
        Err(GrammarError::InvalidPattern { .. })
    ));
    assert!(matches!(
        Pattern::string("a").times_range(2, 0),
        Err(GrammarError::InvalidRepetition { min: 2, max: 0 })
    ));
}

#[test]
fn test_grammar_error_display() {
    let err = Error::from(GrammarError::ReferenceRebound);
    assert!(err.as_grammar().is_some());
    assert!(err.to_string().contains("already bound"));
}
