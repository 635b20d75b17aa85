//! Integration tests for operator-precedence expressions
//!
//! These tests cover precedence, associativity, unary operators and
//! recursive calculator grammars over both characters and tokens.

use knotwork::lexer::terminals::{integer, operator};
use knotwork::prelude::*;

/// Arithmetic calculator over characters, with parentheses and negation
fn build_calculator() -> Parser<i64> {
    let number = scanners::is_char(CharClass::Digit)
        .many1()
        .source()
        .map(|s| s.parse::<i64>().unwrap_or(0));

    let expr: Reference<i64> = Reference::new();
    let atom = number.or(expr
        .lazy()
        .between(scanners::string("("), scanners::string(")")));

    let table = OperatorTable::new()
        .prefix(scanners::string("-"), 100, |x: i64| -x)
        .infixl(scanners::string("*"), 20, |a, b| a * b)
        .infixl(scanners::string("/"), 20, |a, b| a / b)
        .infixl(scanners::string("+"), 10, |a, b| a + b)
        .infixl(scanners::string("-"), 10, |a, b| a - b);
    expr.set(table.build(atom).unwrap()).unwrap();
    expr.lazy()
}

// ============================================================================
// Basic Expression Tests
// ============================================================================

#[test]
fn test_infix_single_number() {
    assert_eq!(build_calculator().parse("42").unwrap(), 42);
}

#[test]
fn test_infix_precedence_with_negation() {
    assert_eq!(build_calculator().parse("1+2*-3").unwrap(), -5);
}

#[test]
fn test_infix_nested_parentheses() {
    assert_eq!(build_calculator().parse("((1-2)/-1)").unwrap(), 1);
}

#[test]
fn test_infix_left_associative_chain() {
    let calc = build_calculator();
    assert_eq!(calc.parse("10-4-3").unwrap(), 3);
    assert_eq!(calc.parse("100/10/5").unwrap(), 2);
    assert_eq!(calc.parse("2*3+4*5").unwrap(), 26);
}

#[test]
fn test_infix_double_negation() {
    assert_eq!(build_calculator().parse("--7").unwrap(), 7);
    assert_eq!(build_calculator().parse("3--2").unwrap(), 5);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_infix_unbalanced_parenthesis() {
    let err = build_calculator().parse("(1+2").unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.column(), 5);
    assert!(err.expected.iter().any(|e| e == ")"));
}

#[test]
fn test_infix_dangling_operator() {
    assert!(build_calculator().parse("1+").is_err());
    assert!(build_calculator().parse("*2").is_err());
}

#[test]
fn test_infix_ambiguous_precedence_is_build_error() {
    let err = OperatorTable::new()
        .infixl(scanners::string("+"), 10, |a: i64, b| a + b)
        .infixn(scanners::string("<"), 10, |a: i64, b| (a < b) as i64)
        .build(constant(0))
        .unwrap_err();
    assert_eq!(err, GrammarError::AmbiguousOperatorPrecedence { precedence: 10 });
    assert!(err.to_string().contains("10"));
}

// ============================================================================
// Right Associativity and Postfix
// ============================================================================

#[test]
fn test_infix_right_associative_power() {
    let digit = scanners::is_char(CharClass::Digit).map(|c| c.to_digit(10).unwrap_or(0) as u64);
    let expr = OperatorTable::new()
        .postfix(scanners::string("!"), 50, |n: u64| (1..=n).product())
        .infixr(scanners::string("^"), 30, |a, b| a.pow(b as u32))
        .infixl(scanners::string("+"), 10, |a, b| a + b)
        .build(digit)
        .unwrap();
    assert_eq!(expr.parse("2^3^2").unwrap(), 512);
    assert_eq!(expr.parse("3!^2").unwrap(), 36);
    assert_eq!(expr.parse("1+2^2+1").unwrap(), 6);
}

// ============================================================================
// Token-Level Expressions
// ============================================================================

#[test]
fn test_infix_over_tokens() {
    let lexer = Lexer::builder().operators(["+", "-", "*", "(", ")"]).build();
    let number = integer().map(|s| s.parse::<i64>().unwrap_or(0));

    let expr: Reference<i64> = Reference::new();
    let atom = number.or(expr.lazy().between(operator("("), operator(")")));
    let table = OperatorTable::new()
        .prefix(operator("-"), 100, |x: i64| -x)
        .infixl(operator("*"), 20, |a, b| a * b)
        .infixl(operator("+"), 10, |a, b| a + b)
        .infixl(operator("-"), 10, |a, b| a - b);
    expr.set(table.build(atom).unwrap()).unwrap();

    let calc = expr.lazy();
    assert_eq!(calc.parse_tokens("1 + 2 * - 3", &lexer).unwrap(), -5);
    assert_eq!(calc.parse_tokens("( 10 - 4 ) * 2", &lexer).unwrap(), 12);

    let err = calc.parse_tokens("1 + * 2", &lexer).unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.kind, ErrorKind::TrailingInput);
    assert_eq!(err.column(), 3);
    assert_eq!(err.unexpected.as_deref(), Some("+"));
}
