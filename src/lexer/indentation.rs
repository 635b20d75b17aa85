//! Indentation-sensitive lexing
//!
//! [`Indentation`] rewrites a token stream that carries
//! [`TokenKind::LineFeed`] tokens into one that carries
//! [`TokenKind::Indent`] and [`TokenKind::Outdent`] tokens instead, so
//! block structure can be parsed like brackets with [`indent`] and
//! [`outdent`].
//!
//! # Example
//!
//! ```rust
//! use knotwork::lexer::{Lexer, TokenKind};
//!
//! let lexer = Lexer::builder().indentation(true).build();
//! let tokens = lexer.tokenize("if\n  a\nb").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Identifier,
//!         TokenKind::Indent,
//!         TokenKind::Identifier,
//!         TokenKind::Outdent,
//!         TokenKind::Identifier,
//!     ]
//! );
//! ```

use super::{Token, TokenKind};
use crate::error::{ErrorKind, ParseError};
use crate::parser::Parser;

/// Converts line breaks and leading whitespace into indent tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct Indentation;

impl Indentation {
    /// Create the post-processor
    pub fn new() -> Self {
        Self
    }

    /// Rewrite `tokens`, lexed from `source`
    ///
    /// The width of a line is the number of characters between the line
    /// start and its first token. Blank lines never change the indentation.
    /// The first line sets the baseline; a later line indented less than
    /// the baseline closes every open block and becomes the new baseline.
    pub fn apply(&self, source: &str, tokens: Vec<Token>) -> Result<Vec<Token>, ParseError> {
        let mut levels: Vec<usize> = Vec::new();
        let mut out = Vec::with_capacity(tokens.len());
        let mut line_start = true;

        for token in tokens {
            if token.kind() == TokenKind::LineFeed {
                line_start = true;
                continue;
            }
            if line_start {
                line_start = false;
                let width = line_width(source, token.index);
                match levels.last().copied() {
                    Some(top) if width > top => {
                        levels.push(width);
                        out.push(Token::new(token.index, 0, TokenKind::Indent, ""));
                    }
                    Some(_) => {
                        while levels.last().is_some_and(|&level| level > width) {
                            levels.pop();
                            if !levels.is_empty() {
                                out.push(Token::new(token.index, 0, TokenKind::Outdent, ""));
                            }
                        }
                        match levels.last() {
                            None => levels.push(width),
                            Some(&level) if level == width => {}
                            Some(_) => {
                                return Err(ParseError::new(
                                    ErrorKind::Indentation,
                                    source,
                                    token.index,
                                )
                                .with_message(format!(
                                    "inconsistent indentation: width {} matches no enclosing block",
                                    width
                                )));
                            }
                        }
                    }
                    None => levels.push(width),
                }
            }
            out.push(token);
        }

        for _ in 1..levels.len() {
            out.push(Token::new(source.len(), 0, TokenKind::Outdent, ""));
        }
        Ok(out)
    }
}

fn line_width(source: &str, offset: usize) -> usize {
    let before = &source[..offset];
    let start = memchr::memrchr(b'\n', before.as_bytes()).map_or(0, |i| i + 1);
    before[start..].chars().count()
}

fn synthetic(kind: TokenKind, name: &'static str) -> Parser<()> {
    Parser::from_fn(move |state| {
        state.require_tokens()?;
        match state.peek_token() {
            Some(token) if token.kind() == kind => {
                state.advance_to(state.position() + 1);
                Ok(())
            }
            _ => Err(state.expected(name)),
        }
    })
}

/// Consume one [`TokenKind::Indent`] token
pub fn indent() -> Parser<()> {
    synthetic(TokenKind::Indent, "INDENT")
}

/// Consume one [`TokenKind::Outdent`] token
pub fn outdent() -> Parser<()> {
    synthetic(TokenKind::Outdent, "OUTDENT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::builder()
            .indentation(true)
            .build()
            .tokenize(source)
            .unwrap()
            .iter()
            .map(Token::kind)
            .collect()
    }

    #[test]
    fn test_nested_blocks_close_at_end() {
        use TokenKind::*;
        assert_eq!(
            kinds("a\n  b\n    c"),
            vec![Identifier, Indent, Identifier, Indent, Identifier, Outdent, Outdent]
        );
    }

    #[test]
    fn test_multiple_outdents_at_once() {
        use TokenKind::*;
        assert_eq!(
            kinds("a\n  b\n    c\nd"),
            vec![Identifier, Indent, Identifier, Indent, Identifier, Outdent, Outdent, Identifier]
        );
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        use TokenKind::*;
        assert_eq!(kinds("a\n\n   \n  b"), vec![Identifier, Indent, Identifier, Outdent]);
    }

    #[test]
    fn test_inconsistent_dedent() {
        let err = Lexer::builder()
            .indentation(true)
            .build()
            .tokenize("a\n    b\n  c")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Indentation);
        assert_eq!((err.line(), err.column()), (3, 3));
    }

    #[test]
    fn test_first_line_sets_baseline() {
        use TokenKind::*;
        assert_eq!(kinds("  foo bar"), vec![Identifier, Identifier]);
        assert_eq!(kinds("  foo\n  bar"), vec![Identifier, Identifier]);
        assert_eq!(kinds("  a\n    b"), vec![Identifier, Indent, Identifier, Outdent]);
    }

    #[test]
    fn test_dedent_below_baseline_rebases() {
        use TokenKind::*;
        assert_eq!(kinds("  foo\n bar"), vec![Identifier, Identifier]);
        assert_eq!(
            kinds("  a\n    b\n c\n  d"),
            vec![Identifier, Indent, Identifier, Outdent, Identifier, Indent, Identifier, Outdent]
        );
    }

    #[test]
    fn test_synthetic_tokens_have_no_length() {
        let tokens = Lexer::builder()
            .indentation(true)
            .build()
            .tokenize("a\n b")
            .unwrap();
        assert_eq!(tokens[1].kind(), TokenKind::Indent);
        assert_eq!((tokens[1].index, tokens[1].length), (3, 0));
    }
}
