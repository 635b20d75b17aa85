//! Token builder and lexer
//!
//! The [`Lexer`] turns source text into [`Token`]s for grammars written
//! against [`terminals`]. At each position, after skipping ignorable input,
//! it tries the token categories in a fixed order:
//!
//! 1. registered operators, longest first;
//! 2. words, reclassified as [`TokenKind::Keyword`] when registered as a
//!    keyword and [`TokenKind::Identifier`] otherwise;
//! 3. decimal and integer literals;
//! 4. string literals, whose token text is the unescaped content.
//!
//! Operators that look like words (`and`, `not`) are lexed as keywords, so
//! `andy` stays one identifier.
//!
//! # Example
//!
//! ```rust
//! use knotwork::lexer::{Lexer, TokenKind};
//!
//! let lexer = Lexer::builder()
//!     .operators(["+", "=", "=="])
//!     .keywords(["def"])
//!     .build();
//! let tokens = lexer.tokenize("def define == 1").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![TokenKind::Keyword, TokenKind::Identifier, TokenKind::Operator, TokenKind::Integer]
//! );
//! ```

pub mod indentation;
pub mod terminals;
mod token;

pub use indentation::Indentation;
pub use token::{Token, TokenKind, TokenValue};

use crate::error::{ErrorKind, ParseError};
use crate::pattern::Pattern;
use hashbrown::HashMap;

/// Configures a [`Lexer`]
#[derive(Debug, Clone)]
pub struct LexerBuilder {
    operators: Vec<String>,
    keywords: Vec<String>,
    case_insensitive_keywords: bool,
    words: Pattern,
    integers: Option<Pattern>,
    decimals: Option<Pattern>,
    strings: Vec<Pattern>,
    ignored: Pattern,
    line_feeds: bool,
    indentation: bool,
}

impl Default for LexerBuilder {
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            keywords: Vec::new(),
            case_insensitive_keywords: false,
            words: Pattern::word(),
            integers: Some(Pattern::integer()),
            decimals: None,
            strings: Vec::new(),
            ignored: Pattern::whitespace(),
            line_feeds: false,
            indentation: false,
        }
    }
}

impl LexerBuilder {
    /// Register operator symbols
    pub fn operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operators.extend(operators.into_iter().map(Into::into));
        self
    }

    /// Register keywords
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Match keywords regardless of ASCII case
    ///
    /// Keyword tokens then carry the keyword as registered, so `SELECT` in
    /// the source matches `keyword("select")`.
    pub fn case_insensitive_keywords(mut self, enabled: bool) -> Self {
        self.case_insensitive_keywords = enabled;
        self
    }

    /// Pattern for words (default `[a-zA-Z_][a-zA-Z0-9_]*`)
    pub fn words(mut self, pattern: Pattern) -> Self {
        self.words = pattern;
        self
    }

    /// Pattern for integer literals (default: decimal digits)
    pub fn integers(mut self, pattern: Pattern) -> Self {
        self.integers = Some(pattern);
        self
    }

    /// Pattern for decimal literals (default: none)
    pub fn decimals(mut self, pattern: Pattern) -> Self {
        self.decimals = Some(pattern);
        self
    }

    /// Lex no number literals at all
    pub fn no_numbers(mut self) -> Self {
        self.integers = None;
        self.decimals = None;
        self
    }

    /// Lex double-quoted string literals with backslash escapes
    pub fn double_quoted_strings(mut self) -> Self {
        self.strings.push(Pattern::double_quote_string());
        self
    }

    /// Lex single-quoted string literals with backslash escapes
    pub fn single_quoted_strings(mut self) -> Self {
        self.strings.push(Pattern::single_quote_string());
        self
    }

    /// Pattern for input skipped between tokens (default: whitespace)
    pub fn ignored(mut self, pattern: Pattern) -> Self {
        self.ignored = pattern;
        self
    }

    /// Emit [`TokenKind::LineFeed`] tokens for line breaks
    ///
    /// The ignorable pattern never spans a line break in this mode.
    pub fn significant_newlines(mut self, enabled: bool) -> Self {
        self.line_feeds = enabled;
        self
    }

    /// Turn line breaks and leading whitespace into
    /// [`TokenKind::Indent`] and [`TokenKind::Outdent`] tokens
    ///
    /// See [`Indentation`].
    pub fn indentation(mut self, enabled: bool) -> Self {
        self.indentation = enabled;
        self
    }

    /// Build the lexer
    pub fn build(self) -> Lexer {
        let mut keywords = HashMap::new();
        let mut operators: HashMap<char, Vec<String>> = HashMap::new();
        let normalize = |text: &str| {
            if self.case_insensitive_keywords {
                text.to_ascii_lowercase()
            } else {
                text.to_string()
            }
        };

        for keyword in &self.keywords {
            keywords.insert(normalize(keyword), keyword.clone());
        }
        for operator in self.operators.iter().filter(|op| !op.is_empty()) {
            if self.words.matches(operator) {
                keywords.insert(normalize(operator), operator.clone());
                continue;
            }
            if let Some(first) = operator.chars().next() {
                let bucket = operators.entry(first).or_default();
                if !bucket.contains(operator) {
                    bucket.push(operator.clone());
                }
            }
        }
        for bucket in operators.values_mut() {
            bucket.sort_by(|a, b| b.len().cmp(&a.len()));
        }

        log_debug!(
            "lexer built: {} operator groups, {} keywords",
            operators.len(),
            keywords.len()
        );

        Lexer {
            operators,
            keywords,
            case_insensitive_keywords: self.case_insensitive_keywords,
            words: self.words,
            integers: self.integers,
            decimals: self.decimals,
            strings: self.strings,
            ignored: self.ignored,
            line_feeds: self.line_feeds || self.indentation,
            indentation: self.indentation.then(Indentation::new),
        }
    }
}

/// Splits source text into tokens
#[derive(Debug, Clone)]
pub struct Lexer {
    /// Operators grouped by first character, longest first
    operators: HashMap<char, Vec<String>>,
    /// Normalised keyword text to keyword as registered
    keywords: HashMap<String, String>,
    case_insensitive_keywords: bool,
    words: Pattern,
    integers: Option<Pattern>,
    decimals: Option<Pattern>,
    strings: Vec<Pattern>,
    ignored: Pattern,
    line_feeds: bool,
    indentation: Option<Indentation>,
}

impl Lexer {
    /// Start configuring a lexer
    pub fn builder() -> LexerBuilder {
        LexerBuilder::default()
    }

    /// Whether `text` is a registered keyword
    pub fn is_keyword(&self, text: &str) -> bool {
        self.keywords.contains_key(&self.normalize(text))
    }

    fn normalize(&self, text: &str) -> String {
        if self.case_insensitive_keywords {
            text.to_ascii_lowercase()
        } else {
            text.to_string()
        }
    }

    /// Split `source` into tokens
    ///
    /// Fails with a [`ErrorKind::Mismatch`] error at the first character no
    /// category accepts, or with [`ErrorKind::Indentation`] at a dedent to an
    /// unknown level when indentation is enabled.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        loop {
            pos = self.skip_ignored(source, pos, &mut tokens);
            if pos >= source.len() {
                break;
            }
            match self.next_token(source, pos) {
                Some(token) => {
                    log_trace!("token {:?} at {}", token.kind(), token.index);
                    pos = token.end();
                    tokens.push(token);
                }
                None => {
                    let found = source[pos..].chars().next().map(String::from).unwrap_or_default();
                    log_debug!("lexer stopped at byte {}", pos);
                    return Err(ParseError::new(ErrorKind::Mismatch, source, pos).with_unexpected(found));
                }
            }
        }
        log_debug!("lexed {} tokens", tokens.len());
        match &self.indentation {
            Some(indentation) => indentation.apply(source, tokens),
            None => Ok(tokens),
        }
    }

    fn skip_ignored(&self, source: &str, mut pos: usize, tokens: &mut Vec<Token>) -> usize {
        loop {
            if self.line_feeds && source[pos..].starts_with('\n') {
                tokens.push(Token::new(pos, 1, TokenKind::LineFeed, "\n"));
                pos += 1;
                continue;
            }
            let limit = if self.line_feeds {
                memchr::memchr(b'\n', &source.as_bytes()[pos..]).map_or(source.len(), |i| pos + i)
            } else {
                source.len()
            };
            match self.ignored.match_at(source, pos, limit) {
                Some(length) if length > 0 => pos += length,
                _ => return pos,
            }
        }
    }

    fn next_token(&self, source: &str, pos: usize) -> Option<Token> {
        self.lex_operator(source, pos)
            .or_else(|| self.lex_word(source, pos))
            .or_else(|| self.lex_number(source, pos))
            .or_else(|| self.lex_string(source, pos))
    }

    fn lex_operator(&self, source: &str, pos: usize) -> Option<Token> {
        let rest = &source[pos..];
        let bucket = self.operators.get(&rest.chars().next()?)?;
        bucket
            .iter()
            .find(|op| rest.starts_with(op.as_str()))
            .map(|op| Token::new(pos, op.len(), TokenKind::Operator, op.as_str()))
    }

    fn lex_word(&self, source: &str, pos: usize) -> Option<Token> {
        let length = nonempty(self.words.match_at(source, pos, source.len()))?;
        let text = &source[pos..pos + length];
        Some(match self.keywords.get(&self.normalize(text)) {
            Some(keyword) => Token::new(pos, length, TokenKind::Keyword, keyword.as_str()),
            None => Token::new(pos, length, TokenKind::Identifier, text),
        })
    }

    fn lex_number(&self, source: &str, pos: usize) -> Option<Token> {
        let decimal = self
            .decimals
            .as_ref()
            .and_then(|p| nonempty(p.match_at(source, pos, source.len())));
        let integer = self
            .integers
            .as_ref()
            .and_then(|p| nonempty(p.match_at(source, pos, source.len())));
        let (kind, length) = match (integer, decimal) {
            (Some(i), Some(d)) if d > i => (TokenKind::Decimal, d),
            (Some(i), _) => (TokenKind::Integer, i),
            (None, Some(d)) => (TokenKind::Decimal, d),
            (None, None) => return None,
        };
        Some(Token::new(pos, length, kind, &source[pos..pos + length]))
    }

    fn lex_string(&self, source: &str, pos: usize) -> Option<Token> {
        self.strings.iter().find_map(|pattern| {
            let length = nonempty(pattern.match_at(source, pos, source.len()))?;
            let quoted = &source[pos..pos + length];
            let quote_len = quoted.chars().next()?.len_utf8();
            let body = quoted.get(quote_len..length.checked_sub(quote_len)?)?;
            Some(Token::new(pos, length, TokenKind::StringLiteral, unescape(body)))
        })
    }
}

fn nonempty(length: Option<usize>) -> Option<usize> {
    length.filter(|&n| n > 0)
}

/// Resolve backslash escapes; unknown escapes stand for the escaped character
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
