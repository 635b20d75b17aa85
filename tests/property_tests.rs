//! Property-based tests using proptest
//!
//! These tests check invariants of patterns and parsers across generated
//! inputs and generated patterns.

use knotwork::pattern::{CharClass, Pattern};
use knotwork::prelude::*;
use knotwork::scanners::{is_char, string};
use proptest::prelude::*;

/// Patterns over the alphabet {a, b}, nested a few levels deep
fn arb_pattern() -> impl Strategy<Value = Pattern> {
    let leaf = prop_oneof![
        Just(Pattern::is_char('a')),
        Just(Pattern::is_char('b')),
        Just(Pattern::string("ab")),
        Just(Pattern::string("ba")),
        Just(Pattern::any_char()),
        Just(Pattern::always()),
        Just(Pattern::eof()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(p, q)| p.next(q)),
            (inner.clone(), inner.clone()).prop_map(|(p, q)| p.or(q)),
            (inner.clone(), inner.clone()).prop_map(|(p, q)| Pattern::longest([p, q])),
            inner.clone().prop_map(Pattern::many),
            inner.clone().prop_map(Pattern::many1),
            inner.clone().prop_map(Pattern::optional),
            (inner.clone(), 0usize..3).prop_map(|(p, n)| p.times(n)),
            (inner.clone(), 0usize..3).prop_map(|(p, n)| p.at_most(n)),
            inner.clone().prop_map(Pattern::not),
            inner.prop_map(Pattern::peek),
        ]
    })
}

// =============================================================================
// Pattern Invariants
// =============================================================================

proptest! {
    /// Derivative simulation agrees with direct matching
    #[test]
    fn test_derivative_consistency(pattern in arb_pattern(), input in "[ab]{0,8}") {
        prop_assert_eq!(
            pattern.simulate(&input),
            pattern.match_at(&input, 0, input.len()),
            "pattern {}",
            pattern
        );
    }

    /// A match never runs past the end of the input
    #[test]
    fn test_match_within_bounds(pattern in arb_pattern(), input in "[ab]{0,8}") {
        if let Some(length) = pattern.match_at(&input, 0, input.len()) {
            prop_assert!(length <= input.len());
        }
    }

    /// Digits match the digit class
    #[test]
    fn test_digit_class(c in "[0-9]") {
        prop_assert!(Pattern::class(CharClass::Digit).matches(&c));
    }

    /// Integer literals match the canned integer pattern completely
    #[test]
    fn test_integer_pattern(n in 0u64..1_000_000) {
        prop_assert!(Pattern::integer().matches(&n.to_string()));
    }
}

// =============================================================================
// Parser Invariants
// =============================================================================

proptest! {
    /// The first alternative that matches wins, whatever the later ones do
    #[test]
    fn test_leftmost_choice(first in "[ab]{1,3}", second in "[ab]{1,3}", rest in "[ab]{0,3}") {
        let input = format!("{}{}", first, rest);
        let grammar = string(&first).source().or(string(&second).source());
        let (value, end) = grammar.parse_prefix(&input).unwrap();
        prop_assert_eq!(value, first.clone());
        prop_assert_eq!(end, first.len());
    }

    /// Parsing a sum of numbers evaluates it
    #[test]
    fn test_sum_expression(numbers in proptest::collection::vec(0i64..1000, 1..8)) {
        let number = is_char(CharClass::Digit)
            .many1()
            .source()
            .map(|s| s.parse::<i64>().unwrap_or(0));
        let sum = OperatorTable::new()
            .infixl(string("+"), 10, |a: i64, b| a + b)
            .build(number)
            .unwrap();
        let source = numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("+");
        prop_assert_eq!(sum.parse(&source).unwrap(), numbers.iter().sum::<i64>());
    }

    /// Keywords and identifiers are told apart regardless of what follows
    #[test]
    fn test_keyword_prefix_is_identifier(suffix in "[a-z0-9_]{1,6}") {
        let lexer = Lexer::builder().keywords(["def"]).build();
        let word = format!("def{}", suffix);
        let tokens = lexer.tokenize(&word).unwrap();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].kind(), TokenKind::Identifier);
    }

    /// A failing parse reports a position inside the input
    #[test]
    fn test_error_offset_in_bounds(input in "[a-c]{0,10}") {
        let grammar = string("ab").many().skip(eof());
        if let Err(err) = grammar.parse(&input) {
            let err = err.as_parse().cloned().unwrap();
            prop_assert!(err.offset() <= input.len());
        }
    }
}
