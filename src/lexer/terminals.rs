//! Parsers over token streams
//!
//! Each terminal consumes exactly one [`Token`] when it is of the right kind
//! and, for operators and keywords, has the right text. Running a terminal
//! against character input is a
//! [`GrammarError::WrongInputKind`](crate::error::GrammarError).
//!
//! # Example
//!
//! ```rust
//! use knotwork::prelude::*;
//! use knotwork::lexer::terminals::{identifier, keyword, operator};
//!
//! let lexer = Lexer::builder().operators(["="]).keywords(["let"]).build();
//! let binding = keyword("let").then(identifier()).skip(operator("=")).and(identifier());
//!
//! let (name, value) = binding.parse_tokens("let x = y", &lexer).unwrap();
//! assert_eq!((name.as_str(), value.as_str()), ("x", "y"));
//! ```

pub use super::indentation::{indent, outdent};

use super::{Token, TokenKind};
use crate::parser::Parser;

/// One token satisfying `predicate`; `name` is reported when it fails
pub fn token_where<F>(name: impl Into<String>, predicate: F) -> Parser<Token>
where
    F: Fn(&Token) -> bool + Send + Sync + 'static,
{
    let name = name.into();
    Parser::from_fn(move |state| {
        state.require_tokens()?;
        match state.peek_token() {
            Some(token) if predicate(token) => {
                state.advance_to(state.position() + 1);
                Ok(token.clone())
            }
            _ => Err(state.expected(&name)),
        }
    })
}

fn text_of_kind(kinds: &'static [TokenKind], name: &'static str) -> Parser<String> {
    Parser::from_fn(move |state| {
        state.require_tokens()?;
        match state.peek_token() {
            Some(token) if kinds.contains(&token.kind()) => {
                state.advance_to(state.position() + 1);
                Ok(token.text().to_string())
            }
            _ => Err(state.expected(name)),
        }
    })
}

/// Any single token
pub fn any_token() -> Parser<Token> {
    token_where("any token", |_| true)
}

/// The operator `text`
pub fn operator(text: &str) -> Parser<Token> {
    let expected = text.to_string();
    token_where(text, move |token| {
        token.kind() == TokenKind::Operator && token.text() == expected
    })
}

/// The keyword `text`, as it was registered with the lexer
pub fn keyword(text: &str) -> Parser<Token> {
    let expected = text.to_string();
    token_where(text, move |token| {
        token.kind() == TokenKind::Keyword && token.text() == expected
    })
}

/// The operator or keyword `text`
pub fn reserved(text: &str) -> Parser<Token> {
    let expected = text.to_string();
    token_where(text, move |token| token.is_reserved(&expected))
}

/// Any identifier, as text
pub fn identifier() -> Parser<String> {
    text_of_kind(&[TokenKind::Identifier], "identifier")
}

/// An integer literal, as text
pub fn integer() -> Parser<String> {
    text_of_kind(&[TokenKind::Integer], "integer")
}

/// A decimal or integer literal, as text
pub fn decimal() -> Parser<String> {
    text_of_kind(&[TokenKind::Decimal, TokenKind::Integer], "decimal")
}

/// A string literal's unescaped content
pub fn string_literal() -> Parser<String> {
    text_of_kind(&[TokenKind::StringLiteral], "string literal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, GrammarError};
    use crate::lexer::Lexer;

    fn lexer() -> Lexer {
        Lexer::builder()
            .operators(["(", ")", ","])
            .keywords(["def"])
            .decimals(crate::pattern::Pattern::decimal())
            .double_quoted_strings()
            .build()
    }

    #[test]
    fn test_keyword_is_not_an_identifier() {
        let lexer = lexer();
        assert!(keyword("def").parse_tokens("def", &lexer).is_ok());
        assert!(keyword("def").parse_tokens("define", &lexer).is_err());
        assert_eq!(identifier().parse_tokens("define", &lexer).unwrap(), "define");
        let err = identifier().parse_tokens("def", &lexer).unwrap_err();
        let err = err.as_parse().unwrap();
        assert_eq!(err.expected, vec!["identifier"]);
        assert_eq!(err.unexpected.as_deref(), Some("def"));
    }

    #[test]
    fn test_literals() {
        let lexer = lexer();
        let args = decimal()
            .or(string_literal())
            .sep_by(operator(","))
            .between(operator("("), operator(")"));
        let values = args.parse_tokens(r#"(1, 2.5, "x")"#, &lexer).unwrap();
        assert_eq!(values, vec!["1", "2.5", "x"]);
        assert!(integer().parse_tokens("2.5", &lexer).is_err());
    }

    #[test]
    fn test_reserved_and_any() {
        let lexer = lexer();
        assert!(reserved("(").parse_tokens("(", &lexer).is_ok());
        assert!(reserved("def").parse_tokens("def", &lexer).is_ok());
        let token = any_token().parse_tokens("x", &lexer).unwrap();
        assert_eq!(token.kind(), TokenKind::Identifier);
    }

    #[test]
    fn test_error_position_is_source_based() {
        let lexer = lexer();
        let call = identifier().skip(operator("(")).skip(operator(")"));
        let err = call.parse_tokens("f  ( ,", &lexer).unwrap_err();
        let err = err.as_parse().unwrap();
        assert_eq!(err.column(), 6);
        assert_eq!(err.expected, vec![")"]);
        assert_eq!(err.unexpected.as_deref(), Some(","));
    }

    #[test]
    fn test_terminal_on_chars_is_grammar_error() {
        let err = identifier().parse("x").unwrap_err();
        assert!(matches!(
            err,
            Error::Grammar(GrammarError::WrongInputKind { expected: "token" })
        ));
    }
}
