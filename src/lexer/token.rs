//! Tokens produced by the [`Lexer`](super::Lexer)

use serde::Serialize;
use std::fmt;

/// Category of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// A registered operator symbol
    Operator,
    /// A registered keyword
    Keyword,
    /// A word that is not a keyword
    Identifier,
    /// An integer literal
    Integer,
    /// A decimal literal
    Decimal,
    /// A string literal; the text is the unescaped content
    StringLiteral,
    /// A line break, when newlines are significant
    LineFeed,
    /// Synthetic: indentation increased
    Indent,
    /// Synthetic: indentation decreased
    Outdent,
}

/// What a token carries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TokenValue {
    /// Category
    pub kind: TokenKind,
    /// Text, normalised for keywords and unescaped for string literals
    pub text: String,
}

impl TokenValue {
    /// Create a value
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// A lexed token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    /// Byte offset of the token in the source
    pub index: usize,
    /// Length in bytes; zero for synthetic tokens
    pub length: usize,
    /// Category and text
    pub value: TokenValue,
}

impl Token {
    /// Create a token
    pub fn new(index: usize, length: usize, kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            index,
            length,
            value: TokenValue::new(kind, text),
        }
    }

    /// Category
    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.value.kind
    }

    /// Text
    #[inline]
    pub fn text(&self) -> &str {
        &self.value.text
    }

    /// Byte offset one past the token
    #[inline]
    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Whether this is the operator or keyword `text`
    pub fn is_reserved(&self, text: &str) -> bool {
        matches!(self.kind(), TokenKind::Operator | TokenKind::Keyword) && self.text() == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TokenKind::Indent => f.write_str("INDENT"),
            TokenKind::Outdent => f.write_str("OUTDENT"),
            TokenKind::LineFeed => f.write_str("line feed"),
            TokenKind::StringLiteral => write!(f, "{:?}", self.text()),
            _ => f.write_str(self.text()),
        }
    }
}
