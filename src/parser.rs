//! The parser type and its combinator methods
//!
//! A [`Parser<T>`] is an immutable, cheaply clonable handle to a
//! [`Parslet<T>`]: anything that can run against a [`ParseState`] and
//! produce a `T`. Grammars are built by combining parsers with the methods
//! below and the free functions in [`combinators`](crate::combinators),
//! then run with [`Parser::parse`] and friends. Built grammars are `Send +
//! Sync` and can serve any number of parses, concurrently if needed.
//!
//! # Example
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! let digit = scanners::is_char(CharClass::Digit);
//! let number = digit.many1().source().map(|s| s.parse::<i64>().unwrap_or(0));
//! let list = number.sep_by(scanners::string(","));
//!
//! assert_eq!(list.parse("1,22,333").unwrap(), vec![1, 22, 333]);
//! assert!(list.parse("1,,2").is_err());
//! ```
//!
//! # Failure semantics
//!
//! - Sequences fail as soon as one element fails.
//! - [`Parser::or`] rewinds to where the choice started before trying the
//!   next alternative. An [`atomic`](Parser::atomic) alternative that fails
//!   after consuming input is not rewound and ends the choice.
//! - Repetitions stop at the first failing iteration and rewind to its start.
//!   An iteration that succeeds without consuming input is a grammar error
//!   ([`GrammarError::LoopGuardViolation`]).
//! - [`Parser::optional`] only recovers from failures that consumed nothing.

use crate::error::{Error, FailureKind, GrammarError};
use crate::lexer::{Lexer, Token};
use crate::operator;
use crate::parameters::RunParameters;
use crate::source_location::Span;
use crate::state::{Fault, ParseState, Step};
use crate::trace::ParseTree;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Parslet
// ============================================================================

/// Something that can parse a `T` out of a [`ParseState`]
///
/// On failure a parslet records what it expected (see
/// [`ParseState::expected`]) and returns the [`Fault`]. Closures of the
/// right shape are parslets.
pub trait Parslet<T>: Send + Sync {
    /// Run against the state
    fn parse(&self, state: &mut ParseState<'_>) -> Step<T>;
}

impl<T, F> Parslet<T> for F
where
    F: Fn(&mut ParseState<'_>) -> Step<T> + Send + Sync,
{
    fn parse(&self, state: &mut ParseState<'_>) -> Step<T> {
        self(state)
    }
}

// ============================================================================
// Parser
// ============================================================================

/// A shareable parser producing values of type `T`
pub struct Parser<T> {
    parslet: Arc<dyn Parslet<T>>,
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        Self {
            parslet: Arc::clone(&self.parslet),
        }
    }
}

impl<T> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parser<{}>", std::any::type_name::<T>())
    }
}

impl<T: 'static> Parser<T> {
    /// Wrap a parslet
    pub fn new(parslet: impl Parslet<T> + 'static) -> Self {
        Self {
            parslet: Arc::new(parslet),
        }
    }

    /// Wrap a parsing closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut ParseState<'_>) -> Step<T> + Send + Sync + 'static,
    {
        Self::new(f)
    }

    /// Run against a state
    #[inline]
    pub fn apply(&self, state: &mut ParseState<'_>) -> Step<T> {
        self.parslet.parse(state)
    }

    // ------------------------------------------------------------------------
    // Sequencing and mapping
    // ------------------------------------------------------------------------

    /// Transform the result
    pub fn map<U: 'static, F>(self, f: F) -> Parser<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Parser::from_fn(move |state| {
            let begin = state.position();
            let value = f(self.apply(state)?);
            if state.listening() {
                state.notify(&value, begin);
            }
            Ok(value)
        })
    }

    /// Replace the result with `value`
    pub fn retn<U>(self, value: U) -> Parser<U>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.map(move |_| value.clone())
    }

    /// Discard the result
    pub fn unit(self) -> Parser<()> {
        Parser::from_fn(move |state| self.apply(state).map(|_| ()))
    }

    /// Run `next` after this parser, keeping the result of `next`
    pub fn then<U: 'static>(self, next: Parser<U>) -> Parser<U> {
        Parser::from_fn(move |state| {
            self.apply(state)?;
            next.apply(state)
        })
    }

    /// Run `next` after this parser, keeping the result of this one
    pub fn skip<U: 'static>(self, next: Parser<U>) -> Parser<T> {
        Parser::from_fn(move |state| {
            let value = self.apply(state)?;
            next.apply(state)?;
            Ok(value)
        })
    }

    /// Run `next` after this parser, keeping both results
    pub fn and<U: 'static>(self, next: Parser<U>) -> Parser<(T, U)> {
        Parser::from_fn(move |state| {
            let begin = state.position();
            let first = self.apply(state)?;
            let second = next.apply(state)?;
            let value = (first, second);
            if state.listening() {
                state.notify(&value, begin);
            }
            Ok(value)
        })
    }

    /// This parser between `open` and `close`
    pub fn between<A: 'static, B: 'static>(self, open: Parser<A>, close: Parser<B>) -> Parser<T> {
        open.then(self).skip(close)
    }

    /// This parser, provided `next` matches after it; `next` is not consumed
    pub fn followed_by<U: 'static>(self, next: Parser<U>) -> Parser<T> {
        self.skip(next.peek())
    }

    /// This parser, provided `next` does not match after it
    pub fn not_followed_by<U: 'static>(self, next: Parser<U>) -> Parser<T> {
        self.skip(next.not())
    }

    /// The source text consumed by this parser
    pub fn source(self) -> Parser<String> {
        Parser::from_fn(move |state| {
            let begin = state.position();
            self.apply(state)?;
            let span = state.span_from(begin);
            Ok(span.slice(state.source()).to_string())
        })
    }

    /// The result together with the source span it was parsed from
    pub fn spanned(self) -> Parser<(T, Span)> {
        Parser::from_fn(move |state| {
            let begin = state.position();
            let value = self.apply(state)?;
            Ok((value, state.span_from(begin)))
        })
    }

    // ------------------------------------------------------------------------
    // Choice
    // ------------------------------------------------------------------------

    /// This parser, or `other` if this one fails
    pub fn or(self, other: Parser<T>) -> Parser<T> {
        Parser::new(Choice {
            alternatives: vec![self, other],
        })
    }

    /// Commit to this parser once it has consumed input
    ///
    /// When an atomic parser fails after consuming input, the nearest
    /// enclosing choice fails without rewinding or trying further
    /// alternatives.
    pub fn atomic(self) -> Parser<T> {
        Parser::from_fn(move |state| {
            let start = state.position();
            match self.apply(state) {
                Err(Fault::Backtrack) if state.position() > start => Err(Fault::Commit),
                other => other,
            }
        })
    }

    /// Name this parser in error messages and diagnostic trees
    ///
    /// If it fails without getting past its start, the expectations it
    /// recorded there are replaced by `name`.
    pub fn label(self, name: impl Into<String>) -> Parser<T> {
        Parser::new(Label {
            parser: self,
            name: name.into(),
        })
    }

    // ------------------------------------------------------------------------
    // Context-sensitive
    // ------------------------------------------------------------------------

    /// Run this parser, then the parser `f` builds from its result
    ///
    /// The continuation is chosen at parse time, so what follows can depend
    /// on what was already parsed.
    pub fn bind<U: 'static, F>(self, f: F) -> Parser<U>
    where
        F: Fn(T) -> Parser<U> + Send + Sync + 'static,
    {
        Parser::from_fn(move |state| {
            let value = self.apply(state)?;
            f(value).apply(state)
        })
    }

    /// `consequence` after this parser if it succeeds, otherwise
    /// `alternative` from where this parser started
    ///
    /// Failures inside the condition are not reported.
    pub fn if_else<U: 'static>(self, consequence: Parser<U>, alternative: Parser<U>) -> Parser<U> {
        Parser::from_fn(move |state| {
            let mark = state.mark();
            let saved = state.save_failure();
            match self.apply(state) {
                Ok(_) => {
                    state.restore_failure(saved);
                    consequence.apply(state)
                }
                Err(Fault::Fatal(e)) => Err(Fault::Fatal(e)),
                Err(_) => {
                    state.reset(mark);
                    state.restore_failure(saved);
                    alternative.apply(state)
                }
            }
        })
    }

    // ------------------------------------------------------------------------
    // Repetition
    // ------------------------------------------------------------------------

    fn repeat(self, min: usize, max: Option<usize>) -> Parser<Vec<T>> {
        Parser::new(Repeat {
            parser: self,
            min,
            max,
        })
    }

    /// Zero or more occurrences
    pub fn many(self) -> Parser<Vec<T>> {
        self.repeat(0, None)
    }

    /// One or more occurrences
    pub fn many1(self) -> Parser<Vec<T>> {
        self.repeat(1, None)
    }

    /// At least `min` occurrences
    pub fn at_least(self, min: usize) -> Parser<Vec<T>> {
        self.repeat(min, None)
    }

    /// Exactly `n` occurrences
    pub fn times(self, n: usize) -> Parser<Vec<T>> {
        self.repeat(n, Some(n))
    }

    /// Between `min` and `max` occurrences
    pub fn times_range(self, min: usize, max: usize) -> Result<Parser<Vec<T>>, GrammarError> {
        if min > max {
            return Err(GrammarError::InvalidRepetition { min, max });
        }
        Ok(self.repeat(min, Some(max)))
    }

    /// Alias of [`Parser::times_range`]
    pub fn some(self, min: usize, max: usize) -> Result<Parser<Vec<T>>, GrammarError> {
        self.times_range(min, max)
    }

    /// Zero or more occurrences, results discarded
    pub fn skip_many(self) -> Parser<()> {
        self.many().unit()
    }

    /// One or more occurrences, results discarded
    pub fn skip_many1(self) -> Parser<()> {
        self.many1().unit()
    }

    /// At least `min` occurrences, results discarded
    pub fn skip_at_least(self, min: usize) -> Parser<()> {
        self.at_least(min).unit()
    }

    /// Exactly `n` occurrences, results discarded
    pub fn skip_times(self, n: usize) -> Parser<()> {
        self.times(n).unit()
    }

    /// One or more occurrences separated by `separator`
    pub fn sep_by1<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<T>> {
        let rest = separator.then(self.clone()).many();
        Parser::from_fn(move |state| {
            let mut items = vec![self.apply(state)?];
            items.extend(rest.apply(state)?);
            Ok(items)
        })
    }

    /// Zero or more occurrences separated by `separator`
    pub fn sep_by<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<T>> {
        self.sep_by1(separator).optional().map(Option::unwrap_or_default)
    }

    /// Zero or more occurrences, each terminated by `separator`
    pub fn end_by<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<T>> {
        self.skip(separator).many()
    }

    /// One or more occurrences, each terminated by `separator`
    pub fn end_by1<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<T>> {
        self.skip(separator).many1()
    }

    /// Zero or more occurrences separated and optionally terminated by
    /// `separator`
    pub fn sep_end_by<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<T>> {
        self.sep_by(separator.clone()).skip(separator.optional())
    }

    /// One or more occurrences separated and optionally terminated by
    /// `separator`
    pub fn sep_end_by1<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<T>> {
        self.sep_by1(separator.clone()).skip(separator.optional())
    }

    // ------------------------------------------------------------------------
    // Operator chains
    // ------------------------------------------------------------------------

    /// One or more occurrences separated by `op`, combined left to right
    /// with the function `op` returns
    ///
    /// A single precedence level without an
    /// [`OperatorTable`](crate::operator::OperatorTable).
    pub fn infixl<F>(self, op: Parser<F>) -> Parser<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        operator::left_fold(self, operator::binary(op))
    }

    /// One or more occurrences separated by `op`, combined right to left
    pub fn infixr<F>(self, op: Parser<F>) -> Parser<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        operator::right_fold(self, operator::binary(op))
    }

    /// One occurrence, or two joined by `op`
    pub fn infixn<F>(self, op: Parser<F>) -> Parser<T>
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        operator::non_assoc(self, operator::binary(op))
    }

    // ------------------------------------------------------------------------
    // Optional and lookahead
    // ------------------------------------------------------------------------

    /// `Some` result, or `None` if this parser fails without consuming input
    pub fn optional(self) -> Parser<Option<T>> {
        Parser::from_fn(move |state| {
            let start = state.position();
            match self.apply(state) {
                Ok(value) => Ok(Some(value)),
                Err(Fault::Backtrack) if state.position() == start => Ok(None),
                Err(fault) => Err(fault),
            }
        })
    }

    /// The result, or `default` if this parser fails without consuming input
    pub fn optional_or(self, default: T) -> Parser<T>
    where
        T: Clone + Send + Sync,
    {
        self.optional()
            .map(move |value| value.unwrap_or_else(|| default.clone()))
    }

    /// Run without consuming input
    pub fn peek(self) -> Parser<T> {
        Parser::from_fn(move |state| {
            let mark = state.mark();
            let result = self.apply(state);
            state.reset(mark);
            result
        })
    }

    /// Succeed, consuming nothing, when this parser fails
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Parser<()> {
        Parser::from_fn(move |state| {
            let mark = state.mark();
            let saved = state.save_failure();
            let result = self.apply(state);
            let consumed = state.span_from(mark.position());
            state.reset(mark);
            state.restore_failure(saved);
            match result {
                Ok(_) => {
                    let found = consumed.slice(state.source()).to_string();
                    Err(state.unexpected(&found))
                }
                Err(Fault::Fatal(e)) => Err(Fault::Fatal(e)),
                Err(_) => Ok(()),
            }
        })
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// Parse the whole of `source`
    pub fn parse(&self, source: &str) -> Result<T, Error> {
        self.parse_with(source, RunParameters::default())
    }

    /// Parse the whole of `source` with explicit run parameters
    pub fn parse_with<'a>(&self, source: &'a str, params: RunParameters<'a>) -> Result<T, Error> {
        let mut state = ParseState::chars(source, params);
        self.run(&mut state, true)
    }

    /// Parse a prefix of `source`, returning the value and the byte offset
    /// where parsing stopped
    pub fn parse_prefix(&self, source: &str) -> Result<(T, usize), Error> {
        let mut state = ParseState::chars(source, RunParameters::default());
        let value = self.run(&mut state, false)?;
        Ok((value, state.position()))
    }

    /// Tokenize `source` with `lexer` and parse the tokens
    pub fn parse_tokens(&self, source: &str, lexer: &Lexer) -> Result<T, Error> {
        let tokens = lexer.tokenize(source)?;
        self.parse_token_stream(source, &tokens, RunParameters::default())
    }

    /// Parse an already lexed token stream of `source`
    pub fn parse_token_stream<'a>(
        &self,
        source: &'a str,
        tokens: &'a [Token],
        params: RunParameters<'a>,
    ) -> Result<T, Error> {
        let mut state = ParseState::tokens(source, tokens, params);
        self.run(&mut state, true)
    }

    /// Parse `source` in diagnostic mode and return the tree of labelled
    /// parsers that matched
    pub fn parse_tree(&self, source: &str) -> Result<ParseTree, Error> {
        let mut state = ParseState::chars(source, RunParameters::diagnostic());
        self.run(&mut state, true)?;
        Ok(state.parse_tree().unwrap_or_else(|| ParseTree {
            name: "root".to_string(),
            begin: 0,
            end: source.len(),
            children: Vec::new(),
        }))
    }

    fn run(&self, state: &mut ParseState<'_>, require_end: bool) -> Result<T, Error> {
        log_debug!("parse started: {} input units", state.end());
        match self.apply(state) {
            Ok(value) if !require_end || state.at_end() => {
                log_debug!("parse finished at {}", state.position());
                Ok(value)
            }
            Ok(_) => {
                log_debug!("trailing input at {}", state.position());
                Err(Error::Parse(state.trailing_error()))
            }
            Err(Fault::Fatal(e)) => {
                log_debug!("grammar error: {}", e);
                Err(Error::Grammar(e))
            }
            Err(_) => {
                log_debug!("parse failed at {}", state.farthest_failure());
                Err(Error::Parse(state.failure_error()))
            }
        }
    }
}

// ============================================================================
// Parslets
// ============================================================================

/// Ordered choice
pub(crate) struct Choice<T> {
    pub(crate) alternatives: Vec<Parser<T>>,
}

impl<T: 'static> Parslet<T> for Choice<T> {
    fn parse(&self, state: &mut ParseState<'_>) -> Step<T> {
        let mark = state.mark();
        for alternative in &self.alternatives {
            match alternative.apply(state) {
                Err(Fault::Backtrack) => state.reset(mark),
                Err(Fault::Commit) => return Err(Fault::Backtrack),
                done => return done,
            }
        }
        Err(Fault::Backtrack)
    }
}

/// Alternative that consumes the most input
pub(crate) struct Longest<T> {
    pub(crate) alternatives: Vec<Parser<T>>,
}

impl<T: 'static> Parslet<T> for Longest<T> {
    fn parse(&self, state: &mut ParseState<'_>) -> Step<T> {
        let mark = state.mark();
        let mut best: Option<(usize, usize, T)> = None;
        for (i, alternative) in self.alternatives.iter().enumerate() {
            state.reset(mark);
            match alternative.apply(state) {
                Ok(value) => {
                    let end = state.position();
                    if best.as_ref().map_or(true, |(_, longest, _)| end > *longest) {
                        best = Some((i, end, value));
                    }
                }
                Err(Fault::Backtrack) => {}
                Err(Fault::Commit) => return Err(Fault::Backtrack),
                Err(fault) => return Err(fault),
            }
        }
        state.reset(mark);
        let (i, end, value) = best.ok_or(Fault::Backtrack)?;
        if state.tracing() {
            // rerun so the diagnostic tree holds the winner's nodes
            return self.alternatives[i].apply(state);
        }
        state.advance_to(end);
        Ok(value)
    }
}

/// Bounded or unbounded repetition with the zero-width loop guard
struct Repeat<T> {
    parser: Parser<T>,
    min: usize,
    max: Option<usize>,
}

impl<T: 'static> Parslet<Vec<T>> for Repeat<T> {
    fn parse(&self, state: &mut ParseState<'_>) -> Step<Vec<T>> {
        let mut items = Vec::new();
        loop {
            if self.max == Some(items.len()) {
                return Ok(items);
            }
            let mark = state.mark();
            match self.parser.apply(state) {
                Ok(item) => {
                    if state.position() == mark.position() {
                        let offset = state.offset_of(mark.position());
                        log_debug!("loop guard violation at byte {}", offset);
                        return Err(Fault::Fatal(GrammarError::LoopGuardViolation { offset }));
                    }
                    items.push(item);
                }
                Err(Fault::Backtrack) if items.len() >= self.min => {
                    state.reset(mark);
                    return Ok(items);
                }
                Err(fault) => return Err(fault),
            }
        }
    }
}

/// Named parser
struct Label<T> {
    parser: Parser<T>,
    name: String,
}

impl<T: 'static> Parslet<T> for Label<T> {
    fn parse(&self, state: &mut ParseState<'_>) -> Step<T> {
        let start = state.position();
        let saved = (state.farthest_failure() == start).then(|| state.save_failure());
        if state.tracing() {
            state.trace_enter(&self.name);
        }
        let result = self.parser.apply(state);
        if let Err(Fault::Backtrack | Fault::Commit) = &result {
            if state.farthest_failure() <= start {
                let failure = state.save_failure();
                let explicit_here = failure.kind == FailureKind::Explicit && failure.index == start;
                if !explicit_here {
                    state.restore_failure(saved.unwrap_or_default());
                    state.expected_at(start, &self.name);
                }
            }
        }
        if state.tracing() {
            state.trace_exit(result.is_ok());
        }
        result
    }
}
