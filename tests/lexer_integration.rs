//! Integration tests for the lexer and token-level grammars
//!
//! These tests cover keyword reclassification, operator precedence in the
//! lexer, string literals, indentation tokens and parsing token streams.

use knotwork::lexer::terminals::{
    identifier, indent, integer, keyword, operator, outdent, string_literal,
};
use knotwork::prelude::*;

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(Token::kind).collect()
}

// ============================================================================
// Keyword Reclassification
// ============================================================================

#[test]
fn test_keyword_versus_identifier() {
    let lexer = Lexer::builder().keywords(["def"]).build();

    let tokens = lexer.tokenize("def").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::Keyword]);

    let tokens = lexer.tokenize("define").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::Identifier]);
    assert_eq!(tokens[0].text(), "define");
}

#[test]
fn test_keyword_grammar_rejects_identifier_prefix() {
    let lexer = Lexer::builder().keywords(["def"]).operators(["(", ")"]).build();
    let function = keyword("def")
        .then(identifier())
        .skip(operator("("))
        .skip(operator(")"));

    assert_eq!(function.parse_tokens("def define()", &lexer).unwrap(), "define");

    let err = function.parse_tokens("define f()", &lexer).unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.expected, vec!["def"]);
    assert_eq!(err.unexpected.as_deref(), Some("define"));
}

// ============================================================================
// Operators and Literals
// ============================================================================

#[test]
fn test_operators_take_priority_over_numbers() {
    let lexer = Lexer::builder()
        .operators([".", "..", "-"])
        .decimals(Pattern::decimal())
        .build();
    let tokens = lexer.tokenize("1..2 -3 .5").unwrap();
    let texts: Vec<_> = tokens.iter().map(Token::text).collect();
    assert_eq!(texts, vec!["1", "..", "2", "-", "3", ".", "5"]);
}

#[test]
fn test_token_positions_are_byte_offsets() {
    let lexer = Lexer::builder().double_quoted_strings().build();
    let err = lexer.tokenize("é \"ü\" x").unwrap_err();
    assert_eq!(err.column(), 1);

    let tokens = lexer.tokenize("\"ü\" x").unwrap();
    assert_eq!((tokens[0].index, tokens[0].length), (0, 4));
    assert_eq!((tokens[1].index, tokens[1].length), (5, 1));
}

#[test]
fn test_string_literal_grammar() {
    let lexer = Lexer::builder()
        .operators(["="])
        .keywords(["let"])
        .double_quoted_strings()
        .single_quoted_strings()
        .build();
    let binding = keyword("let")
        .then(identifier())
        .skip(operator("="))
        .and(string_literal());

    let (name, value) = binding
        .parse_tokens(r#"let greeting = "hi\tthere""#, &lexer)
        .unwrap();
    assert_eq!(name, "greeting");
    assert_eq!(value, "hi\tthere");

    let (_, value) = binding.parse_tokens("let s = 'it\\'s'", &lexer).unwrap();
    assert_eq!(value, "it's");
}

#[test]
fn test_unterminated_string_is_lex_error() {
    let lexer = Lexer::builder().double_quoted_strings().build();
    let err = lexer.tokenize("x \"open").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Mismatch);
    assert_eq!(err.column(), 3);
}

#[test]
fn test_lex_error_through_parse_tokens() {
    let lexer = Lexer::builder().build();
    let err = identifier().parse_tokens("a $", &lexer).unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.column(), 3);
    assert_eq!(err.unexpected.as_deref(), Some("$"));
}

// ============================================================================
// Indentation
// ============================================================================

/// block := identifier (INDENT block+ OUTDENT)?
fn block_grammar() -> Parser<usize> {
    let block: Reference<usize> = Reference::new();
    let children = block
        .lazy()
        .many1()
        .between(indent(), outdent())
        .map(|sizes| sizes.into_iter().sum::<usize>());
    block
        .set(
            identifier()
                .then(children.optional())
                .map(|nested| 1 + nested.unwrap_or(0)),
        )
        .unwrap();
    block.lazy().many1().map(|sizes| sizes.into_iter().sum())
}

#[test]
fn test_indentation_blocks() {
    let lexer = Lexer::builder().indentation(true).build();
    let source = "root\n  child\n    leaf\n  sibling\nnext\n";
    assert_eq!(block_grammar().parse_tokens(source, &lexer).unwrap(), 5);
}

#[test]
fn test_indentation_mismatch() {
    let lexer = Lexer::builder().indentation(true).build();
    let err = block_grammar()
        .parse_tokens("root\n    child\n  oops", &lexer)
        .unwrap_err();
    let err = err.as_parse().unwrap();
    assert_eq!(err.kind, ErrorKind::Indentation);
    assert_eq!(err.line(), 3);
    assert!(err.to_string().contains("indentation"));
}

#[test]
fn test_indented_first_line_is_the_baseline() {
    let lexer = Lexer::builder().indentation(true).build();
    let tokens = lexer.tokenize("  foo\n bar").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Identifier]);

    let tokens = lexer.tokenize("  foo bar").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Identifier]);

    let source = "  root\n    child\n  next\n";
    assert_eq!(block_grammar().parse_tokens(source, &lexer).unwrap(), 3);
}

#[test]
fn test_indent_requires_token_input() {
    assert!(matches!(
        indent().parse("  x").unwrap_err(),
        Error::Grammar(GrammarError::WrongInputKind { .. })
    ));
}

#[test]
fn test_significant_newlines_as_statement_separator() {
    let lexer = Lexer::builder()
        .operators(["="])
        .significant_newlines(true)
        .build();
    let newline = knotwork::lexer::terminals::token_where("line feed", |t| {
        t.kind() == TokenKind::LineFeed
    });
    let statement = identifier().skip(operator("=")).and(integer());
    let program = statement.sep_end_by(newline);
    let statements = program.parse_tokens("a = 1\nb = 2\n", &lexer).unwrap();
    assert_eq!(
        statements,
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string())
        ]
    );
}
