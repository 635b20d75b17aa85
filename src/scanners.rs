//! Character-level parsers
//!
//! Scanners lift [`Pattern`]s and character predicates into parsers over
//! character input. Running one against a token stream is a
//! [`GrammarError::WrongInputKind`](crate::error::GrammarError).
//!
//! # Example
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! let ident = scanners::pattern(Pattern::word(), "identifier").source();
//! let ws = scanners::whitespaces().optional();
//! let assignment = seq3(
//!     ident.clone().skip(ws.clone()),
//!     scanners::string("=").skip(ws),
//!     ident,
//!     |lhs, _, rhs| (lhs, rhs),
//! );
//! assert_eq!(
//!     assignment.parse("a = b").unwrap(),
//!     ("a".to_string(), "b".to_string())
//! );
//! ```

use crate::parser::Parser;
use crate::pattern::{CharPredicate, Pattern};

/// Match `pattern`, reporting `name` as expected on a mismatch
pub fn pattern(pattern: Pattern, name: impl Into<String>) -> Parser<()> {
    let name = name.into();
    Parser::from_fn(move |state| {
        state.require_chars()?;
        match state.match_pattern(&pattern) {
            Some(length) => {
                state.advance_to(state.position() + length);
                Ok(())
            }
            None => Err(state.expected(&name)),
        }
    })
}

/// Match `text` exactly
pub fn string(text: &str) -> Parser<()> {
    pattern(Pattern::string(text), text)
}

/// Match `text` ignoring ASCII case
pub fn string_case_insensitive(text: &str) -> Parser<()> {
    pattern(Pattern::string_case_insensitive(text), text)
}

/// Match one character satisfying `predicate` and return it
pub fn is_char(predicate: impl Into<CharPredicate>) -> Parser<char> {
    let predicate = predicate.into();
    let name = predicate.to_string();
    Parser::from_fn(move |state| {
        state.require_chars()?;
        match state.peek_char() {
            Some(c) if predicate.test(c) => {
                state.advance_to(state.position() + c.len_utf8());
                Ok(c)
            }
            _ => Err(state.expected(&name)),
        }
    })
}

/// Any single character
pub fn any_char() -> Parser<char> {
    is_char(CharPredicate::any())
}

/// One or more whitespace characters
pub fn whitespaces() -> Parser<()> {
    pattern(Pattern::whitespace(), "whitespace")
}

/// A comment from `start` to the end of the line
pub fn line_comment(start: &str) -> Parser<()> {
    pattern(Pattern::line_comment(start), "comment")
}

/// A non-nesting comment from `open` to `close`
pub fn block_comment(open: &str, close: &str) -> Parser<()> {
    pattern(Pattern::block_comment(open, close), "comment")
}

/// Anything matched by `regex`
pub fn regex(expr: &str, name: impl Into<String>) -> Result<Parser<()>, crate::error::GrammarError> {
    Ok(pattern(Pattern::regex(expr)?, name))
}
