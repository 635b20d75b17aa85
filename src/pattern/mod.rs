//! Character-level patterns
//!
//! A [`Pattern`] is an immutable, cheaply clonable description of a
//! character-level rule. Patterns match greedily and deterministically: a
//! pattern applied at a position either consumes a number of bytes or
//! mismatches, and applying it again at the same position gives the same
//! answer. They are the building blocks of lexers and of character scanners.
//!
//! Two matching strategies share the same semantics:
//!
//! - [`Pattern::match_at`] runs the pattern directly against a slice.
//! - [`Pattern::derive`] feeds characters one at a time into a
//!   [`Derivative`], the residual matcher left after consuming a prefix.
//!
//! # Example
//!
//! ```rust
//! use knotwork::pattern::{CharClass, Pattern};
//!
//! let number = Pattern::class(CharClass::Digit)
//!     .many1()
//!     .next(Pattern::string(".").next(Pattern::class(CharClass::Digit).many1()).optional());
//!
//! assert_eq!(number.match_at("3.14 rest", 0, 9), Some(4));
//! assert_eq!(number.simulate("3.14"), Some(4));
//! assert_eq!(number.match_at("x", 0, 1), None);
//! ```

pub mod char_class;
pub mod derivative;
pub mod regex_cache;

pub use char_class::{CharClass, CharPredicate};
pub use derivative::Derivative;

use crate::error::GrammarError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Pattern
// ============================================================================

/// An immutable character-level matching rule
#[derive(Clone)]
pub struct Pattern {
    pub(crate) node: Arc<Node>,
}

/// Pattern variants
pub(crate) enum Node {
    Never,
    Always,
    Char(CharPredicate),
    Literal { text: String, ignore_case: bool },
    NotLiteral { text: String, ignore_case: bool },
    AtLeast(usize),
    Exact(usize),
    Sequence(Vec<Pattern>),
    Or(Vec<Pattern>),
    Longest(Vec<Pattern>),
    Repeat { pattern: Pattern, min: usize, max: Option<usize> },
    Not(Pattern),
    Peek(Pattern),
    Regex { expr: String, program: Regex },
}

impl Pattern {
    fn from_node(node: Node) -> Self {
        Self { node: Arc::new(node) }
    }

    // ------------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------------

    /// Never matches
    pub fn never() -> Self {
        Self::from_node(Node::Never)
    }

    /// Always matches without consuming anything
    pub fn always() -> Self {
        Self::from_node(Node::Always)
    }

    /// One character satisfying `predicate`
    pub fn char_where(predicate: impl Into<CharPredicate>) -> Self {
        Self::from_node(Node::Char(predicate.into()))
    }

    /// Exactly the character `c`
    pub fn is_char(c: char) -> Self {
        Self::char_where(CharPredicate::is(c))
    }

    /// One character of a named class
    pub fn class(class: CharClass) -> Self {
        Self::char_where(CharPredicate::class(class))
    }

    /// One character in `low..=high`
    pub fn range(low: char, high: char) -> Self {
        Self::char_where(CharPredicate::range(low, high))
    }

    /// One character out of `chars`
    pub fn among(chars: &str) -> Self {
        Self::char_where(CharPredicate::among(chars))
    }

    /// Any single character
    pub fn any_char() -> Self {
        Self::has_at_least(1)
    }

    /// Exactly the string `text`
    pub fn string(text: impl Into<String>) -> Self {
        Self::from_node(Node::Literal {
            text: text.into(),
            ignore_case: false,
        })
    }

    /// The string `text`, compared ignoring ASCII case
    pub fn string_case_insensitive(text: impl Into<String>) -> Self {
        Self::from_node(Node::Literal {
            text: text.into(),
            ignore_case: true,
        })
    }

    /// One character, provided the input does not start with `text`
    pub fn not_string(text: impl Into<String>) -> Self {
        Self::from_node(Node::NotLiteral {
            text: text.into(),
            ignore_case: false,
        })
    }

    /// Case-insensitive variant of [`Pattern::not_string`]
    pub fn not_string_case_insensitive(text: impl Into<String>) -> Self {
        Self::from_node(Node::NotLiteral {
            text: text.into(),
            ignore_case: true,
        })
    }

    /// Consumes `n` characters if at least that many remain
    pub fn has_at_least(n: usize) -> Self {
        Self::from_node(Node::AtLeast(n))
    }

    /// Consumes the rest of the input if exactly `n` characters remain
    pub fn has_exact(n: usize) -> Self {
        Self::from_node(Node::Exact(n))
    }

    /// Matches only at the end of the input
    pub fn eof() -> Self {
        Self::has_exact(0)
    }

    /// An anchored regular expression
    ///
    /// The expression is compiled once per thread and cached; an invalid
    /// expression is reported when the pattern is built.
    pub fn regex(expr: &str) -> Result<Self, GrammarError> {
        let program = regex_cache::anchored(expr).map_err(|e| GrammarError::InvalidPattern {
            pattern: expr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_node(Node::Regex {
            expr: expr.to_string(),
            program,
        }))
    }

    // ------------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------------

    /// All patterns one after the other
    pub fn sequence(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let patterns: Vec<_> = patterns.into_iter().collect();
        match patterns.len() {
            0 => Self::always(),
            1 => patterns.into_iter().next().unwrap_or_else(Self::always),
            _ => Self::from_node(Node::Sequence(patterns)),
        }
    }

    /// The first alternative that matches
    pub fn or_all(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let patterns: Vec<_> = patterns.into_iter().collect();
        match patterns.len() {
            0 => Self::never(),
            1 => patterns.into_iter().next().unwrap_or_else(Self::never),
            _ => Self::from_node(Node::Or(patterns)),
        }
    }

    /// The alternative with the longest match, the earliest one on ties
    pub fn longest(patterns: impl IntoIterator<Item = Pattern>) -> Self {
        let patterns: Vec<_> = patterns.into_iter().collect();
        match patterns.len() {
            0 => Self::never(),
            1 => patterns.into_iter().next().unwrap_or_else(Self::never),
            _ => Self::from_node(Node::Longest(patterns)),
        }
    }

    /// This pattern followed by `next`
    pub fn next(self, next: Pattern) -> Self {
        match &*self.node {
            Node::Sequence(items) => {
                let mut items = items.clone();
                items.push(next);
                Self::from_node(Node::Sequence(items))
            }
            _ => Self::from_node(Node::Sequence(vec![self, next])),
        }
    }

    /// This pattern, or `other` if this one mismatches
    pub fn or(self, other: Pattern) -> Self {
        match &*self.node {
            Node::Or(items) => {
                let mut items = items.clone();
                items.push(other);
                Self::from_node(Node::Or(items))
            }
            _ => Self::from_node(Node::Or(vec![self, other])),
        }
    }

    fn repeat_range(self, min: usize, max: Option<usize>) -> Self {
        Self::from_node(Node::Repeat {
            pattern: self,
            min,
            max,
        })
    }

    /// Zero or more repetitions
    pub fn many(self) -> Self {
        self.repeat_range(0, None)
    }

    /// One or more repetitions
    pub fn many1(self) -> Self {
        self.repeat_range(1, None)
    }

    /// At least `min` repetitions
    pub fn at_least(self, min: usize) -> Self {
        self.repeat_range(min, None)
    }

    /// At most `max` repetitions
    pub fn at_most(self, max: usize) -> Self {
        self.repeat_range(0, Some(max))
    }

    /// Exactly `n` repetitions
    pub fn times(self, n: usize) -> Self {
        self.repeat_range(n, Some(n))
    }

    /// Alias of [`Pattern::times`]
    pub fn repeat(self, n: usize) -> Self {
        self.times(n)
    }

    /// Between `min` and `max` repetitions
    ///
    /// Fails with [`GrammarError::InvalidRepetition`] when `min > max`.
    pub fn times_range(self, min: usize, max: usize) -> Result<Self, GrammarError> {
        if min > max {
            return Err(GrammarError::InvalidRepetition { min, max });
        }
        Ok(self.repeat_range(min, Some(max)))
    }

    /// Alias of [`Pattern::times_range`]
    pub fn some(self, min: usize, max: usize) -> Result<Self, GrammarError> {
        self.times_range(min, max)
    }

    /// Zero or one occurrence
    pub fn optional(self) -> Self {
        self.repeat_range(0, Some(1))
    }

    /// Zero-width: matches when this pattern mismatches
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::from_node(Node::Not(self))
    }

    /// Zero-width: matches when this pattern matches
    pub fn peek(self) -> Self {
        Self::from_node(Node::Peek(self))
    }

    // ------------------------------------------------------------------------
    // Canned patterns
    // ------------------------------------------------------------------------

    /// `[a-zA-Z_][a-zA-Z0-9_]*`
    pub fn word() -> Self {
        Self::class(CharClass::WordStart).next(Self::class(CharClass::Word).many())
    }

    /// One or more decimal digits
    pub fn integer() -> Self {
        Self::class(CharClass::Digit).many1()
    }

    /// A dot followed by digits
    pub fn fraction() -> Self {
        Self::is_char('.').next(Self::integer())
    }

    /// `123`, `1.5` or `.5`
    pub fn decimal() -> Self {
        Self::integer()
            .next(Self::fraction().optional())
            .or(Self::fraction())
    }

    /// `0x1F` or `0X1f`
    pub fn hex_integer() -> Self {
        Self::sequence([
            Self::is_char('0'),
            Self::among("xX"),
            Self::class(CharClass::HexDigit).many1(),
        ])
    }

    /// A decimal with an exponent, such as `1.5e-3`
    pub fn scientific() -> Self {
        Self::sequence([
            Self::decimal(),
            Self::among("eE"),
            Self::among("+-").optional(),
            Self::integer(),
        ])
    }

    /// One or more whitespace characters
    pub fn whitespace() -> Self {
        Self::class(CharClass::Whitespace).many1()
    }

    /// `start` followed by everything up to the end of the line
    pub fn line_comment(start: &str) -> Self {
        Self::string(start).next(Self::char_where(CharPredicate::is('\n').not()).many())
    }

    /// Everything between `open` and `close`, inclusive, without nesting
    pub fn block_comment(open: &str, close: &str) -> Self {
        Self::sequence([
            Self::string(open),
            Self::not_string(close).many(),
            Self::string(close),
        ])
    }

    /// A double-quoted string with backslash escapes
    pub fn double_quote_string() -> Self {
        Self::quoted('"')
    }

    /// A single-quoted string with backslash escapes
    pub fn single_quote_string() -> Self {
        Self::quoted('\'')
    }

    fn quoted(quote: char) -> Self {
        let plain = Self::char_where(CharPredicate::is(quote).or(CharPredicate::is('\\')).not());
        let escaped = Self::is_char('\\').next(Self::any_char());
        Self::sequence([
            Self::is_char(quote),
            plain.or(escaped).many(),
            Self::is_char(quote),
        ])
    }

    // ------------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------------

    /// Match against `source[begin..end]`
    ///
    /// Returns the number of bytes consumed, or `None` on a mismatch. Offsets
    /// that are out of range or not on character boundaries mismatch.
    pub fn match_at(&self, source: &str, begin: usize, end: usize) -> Option<usize> {
        let text = source.get(..end)?;
        if !text.is_char_boundary(begin) {
            return None;
        }
        self.end_at(text, begin).map(|stop| stop - begin)
    }

    /// Whether the whole of `text` matches
    pub fn matches(&self, text: &str) -> bool {
        self.match_at(text, 0, text.len()) == Some(text.len())
    }

    /// Absolute end position of a match starting at `pos` in `text`
    pub(crate) fn end_at(&self, text: &str, pos: usize) -> Option<usize> {
        match &*self.node {
            Node::Never => None,
            Node::Always => Some(pos),
            Node::Char(predicate) => {
                let c = text[pos..].chars().next()?;
                predicate.test(c).then(|| pos + c.len_utf8())
            }
            Node::Literal { text: lit, ignore_case } => {
                literal_end(text, pos, lit, *ignore_case)
            }
            Node::NotLiteral { text: lit, ignore_case } => {
                let c = text[pos..].chars().next()?;
                match literal_end(text, pos, lit, *ignore_case) {
                    Some(_) => None,
                    None => Some(pos + c.len_utf8()),
                }
            }
            Node::AtLeast(n) => advance_chars(text, pos, *n),
            Node::Exact(n) => {
                let stop = advance_chars(text, pos, *n)?;
                (stop == text.len()).then_some(stop)
            }
            Node::Sequence(items) => items
                .iter()
                .try_fold(pos, |at, item| item.end_at(text, at)),
            Node::Or(items) => items.iter().find_map(|item| item.end_at(text, pos)),
            Node::Longest(items) => {
                let mut best: Option<usize> = None;
                for item in items {
                    if let Some(stop) = item.end_at(text, pos) {
                        if best.map_or(true, |b| stop > b) {
                            best = Some(stop);
                        }
                    }
                }
                best
            }
            Node::Repeat { pattern, min, max } => {
                let mut at = pos;
                let mut count = 0;
                loop {
                    if *max == Some(count) {
                        return Some(at);
                    }
                    match pattern.end_at(text, at) {
                        None => return (count >= *min).then_some(at),
                        Some(stop) => {
                            count += 1;
                            if stop == at && max.is_none() && count >= *min {
                                return Some(at);
                            }
                            at = stop;
                        }
                    }
                }
            }
            Node::Not(inner) => match inner.end_at(text, pos) {
                Some(_) => None,
                None => Some(pos),
            },
            Node::Peek(inner) => inner.end_at(text, pos).map(|_| pos),
            Node::Regex { program, .. } => program.find(&text[pos..]).map(|m| pos + m.end()),
        }
    }
}

/// Character comparison, optionally ignoring ASCII case
#[inline]
pub(crate) fn chars_match(expected: char, actual: char, ignore_case: bool) -> bool {
    expected == actual || (ignore_case && expected.eq_ignore_ascii_case(&actual))
}

fn literal_end(text: &str, pos: usize, literal: &str, ignore_case: bool) -> Option<usize> {
    if !ignore_case {
        return text[pos..].starts_with(literal).then(|| pos + literal.len());
    }
    let mut source = text[pos..].char_indices();
    let mut stop = pos;
    for expected in literal.chars() {
        let (offset, actual) = source.next()?;
        if !chars_match(expected, actual, true) {
            return None;
        }
        stop = pos + offset + actual.len_utf8();
    }
    Some(stop)
}

fn advance_chars(text: &str, pos: usize, n: usize) -> Option<usize> {
    let mut stop = pos;
    let mut chars = text[pos..].chars();
    for _ in 0..n {
        stop += chars.next()?.len_utf8();
    }
    Some(stop)
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.node {
            Node::Never => f.write_str("<never>"),
            Node::Always => f.write_str("<always>"),
            Node::Char(predicate) => write!(f, "{}", predicate),
            Node::Literal { text, ignore_case } => {
                write!(f, "{:?}", text)?;
                if *ignore_case {
                    f.write_str("i")?;
                }
                Ok(())
            }
            Node::NotLiteral { text, .. } => write!(f, "^{:?}", text),
            Node::AtLeast(n) => write!(f, "<{} chars>", n),
            Node::Exact(0) => f.write_str("EOF"),
            Node::Exact(n) => write!(f, "<exactly {} chars>", n),
            Node::Sequence(items) => write_list(f, items, " "),
            Node::Or(items) => write_list(f, items, " | "),
            Node::Longest(items) => write_list(f, items, " || "),
            Node::Repeat { pattern, min, max } => match (min, max) {
                (0, None) => write!(f, "{}*", pattern),
                (1, None) => write!(f, "{}+", pattern),
                (0, Some(1)) => write!(f, "{}?", pattern),
                (min, None) => write!(f, "{}{{{},}}", pattern, min),
                (min, Some(max)) => write!(f, "{}{{{},{}}}", pattern, min, max),
            },
            Node::Not(inner) => write!(f, "!{}", inner),
            Node::Peek(inner) => write!(f, "&{}", inner),
            Node::Regex { expr, .. } => write!(f, "/{}/", expr),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Pattern], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(")")
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self)
    }
}
