//! Mutable per-invocation parse state
//!
//! A [`ParseState`] is created for every parse attempt and never shared. It
//! holds the input (characters, or tokens over a source text), the current
//! position, the farthest-failure record, the optional diagnostic trace and
//! the optional listener.
//!
//! Positions are input indexes: byte offsets into the source for character
//! input, token indexes for token input. [`ParseState::offset_of`] maps an
//! index back to a byte offset of the source.

use crate::error::{ErrorKind, FailureRecord, GrammarError, ParseError};
use crate::lexer::Token;
use crate::parameters::{MatchMode, Mode, ParseListener, RunParameters};
use crate::pattern::Pattern;
use crate::source_location::{SourcePosition, Span};
use crate::trace::{ParseTree, TraceBuilder};
use std::any::Any;

/// Why a parser did not produce a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Ordinary failure; the enclosing choice may try something else
    Backtrack,
    /// An atomic parser failed after consuming input; the nearest enclosing
    /// choice fails without trying further alternatives
    Commit,
    /// The grammar is defective; nothing recovers from this
    Fatal(GrammarError),
}

impl From<GrammarError> for Fault {
    fn from(e: GrammarError) -> Self {
        Fault::Fatal(e)
    }
}

/// Result of running one parser
pub type Step<T> = Result<T, Fault>;

/// A saved position to rewind to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pos: usize,
    trace: usize,
}

impl Mark {
    /// Input index of the mark
    pub fn position(&self) -> usize {
        self.pos
    }
}

/// State of one parse attempt
pub struct ParseState<'a> {
    source: &'a str,
    tokens: Option<&'a [Token]>,
    pos: usize,
    failure: FailureRecord,
    trace: Option<TraceBuilder>,
    matching: MatchMode,
    listener: Option<&'a mut dyn ParseListener>,
}

impl<'a> ParseState<'a> {
    /// State over the characters of `source`
    pub fn chars(source: &'a str, params: RunParameters<'a>) -> Self {
        Self::new(source, None, params)
    }

    /// State over `tokens` lexed from `source`
    pub fn tokens(source: &'a str, tokens: &'a [Token], params: RunParameters<'a>) -> Self {
        Self::new(source, Some(tokens), params)
    }

    fn new(source: &'a str, tokens: Option<&'a [Token]>, params: RunParameters<'a>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            failure: FailureRecord::default(),
            trace: (params.mode == Mode::Diagnostic).then(TraceBuilder::new),
            matching: params.matching,
            listener: params.listener,
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// The source text
    #[inline]
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Current input index
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Index one past the last input unit
    #[inline]
    pub fn end(&self) -> usize {
        match self.tokens {
            Some(tokens) => tokens.len(),
            None => self.source.len(),
        }
    }

    /// Whether the whole input has been consumed
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.end()
    }

    /// Whether the input is a token stream
    #[inline]
    pub fn is_token_input(&self) -> bool {
        self.tokens.is_some()
    }

    /// Unconsumed source text (character input only)
    pub fn remaining(&self) -> &'a str {
        match self.tokens {
            Some(_) => "",
            None => self.source.get(self.pos..).unwrap_or(""),
        }
    }

    /// Next character (character input only)
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Next token (token input only)
    pub fn peek_token(&self) -> Option<&'a Token> {
        self.tokens.and_then(|tokens| tokens.get(self.pos))
    }

    /// Move to input index `pos`
    #[inline]
    pub fn advance_to(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Save the current position
    #[inline]
    pub fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            trace: self.trace.as_ref().map_or(0, TraceBuilder::len),
        }
    }

    /// Rewind to a saved position
    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.pos;
        if let Some(trace) = self.trace.as_mut() {
            trace.rollback(mark.trace);
        }
    }

    /// Byte offset in the source of input index `index`
    pub fn offset_of(&self, index: usize) -> usize {
        match self.tokens {
            Some(tokens) => tokens.get(index).map_or(self.source.len(), |t| t.index),
            None => index.min(self.source.len()),
        }
    }

    /// Source span from input index `begin` to the current position
    pub fn span_from(&self, begin: usize) -> Span {
        let start = self.offset_of(begin);
        let end = match self.tokens {
            Some(tokens) if self.pos > begin => tokens
                .get(self.pos - 1)
                .map_or(self.source.len(), Token::end),
            Some(_) => start,
            None => self.pos.min(self.source.len()),
        };
        Span::new(start, end.max(start))
    }

    pub(crate) fn require_chars(&self) -> Result<(), Fault> {
        match self.tokens {
            Some(_) => Err(Fault::Fatal(GrammarError::WrongInputKind {
                expected: "character",
            })),
            None => Ok(()),
        }
    }

    pub(crate) fn require_tokens(&self) -> Result<&'a [Token], Fault> {
        self.tokens.ok_or(Fault::Fatal(GrammarError::WrongInputKind {
            expected: "token",
        }))
    }

    /// Length of the match of `pattern` at the current position
    pub(crate) fn match_pattern(&self, pattern: &Pattern) -> Option<usize> {
        match self.matching {
            MatchMode::Direct => pattern.match_at(self.source, self.pos, self.source.len()),
            MatchMode::Derivative => pattern.simulate(self.remaining()),
        }
    }

    // ------------------------------------------------------------------------
    // Failures
    // ------------------------------------------------------------------------

    fn record(&mut self, update: impl FnOnce(&mut FailureRecord)) {
        let before = (self.failure.index, self.failure.kind);
        update(&mut self.failure);
        if let Some(trace) = self.trace.as_mut() {
            if before != (self.failure.index, self.failure.kind) {
                trace.mark_failure();
            }
        }
    }

    /// Record that `what` was expected at the current position
    pub fn expected(&mut self, what: &str) -> Fault {
        let at = self.pos;
        self.expected_at(at, what)
    }

    /// Record that `what` was expected at input index `at`
    pub fn expected_at(&mut self, at: usize, what: &str) -> Fault {
        self.record(|failure| failure.expected(at, what));
        Fault::Backtrack
    }

    /// Record that `what` is not allowed at the current position
    pub fn unexpected(&mut self, what: &str) -> Fault {
        let at = self.pos;
        self.record(|failure| failure.unexpected(at, what));
        Fault::Backtrack
    }

    /// Record an explicit failure at the current position
    pub fn fail(&mut self, message: &str) -> Fault {
        let at = self.pos;
        self.record(|failure| failure.explicit(at, message));
        Fault::Backtrack
    }

    /// Input index of the farthest failure so far
    pub fn farthest_failure(&self) -> usize {
        self.failure.index
    }

    pub(crate) fn save_failure(&self) -> FailureRecord {
        self.failure.clone()
    }

    pub(crate) fn restore_failure(&mut self, record: FailureRecord) {
        self.failure = record;
    }

    /// Description of what sits at input index `index`
    pub(crate) fn encountered(&self, index: usize) -> String {
        match self.tokens {
            Some(tokens) => tokens
                .get(index)
                .map_or_else(|| "EOF".to_string(), |t| t.to_string()),
            None => self
                .source
                .get(index..)
                .and_then(|rest| rest.chars().next())
                .map_or_else(|| "EOF".to_string(), |c| c.to_string()),
        }
    }

    fn locate(&self, index: usize) -> SourcePosition {
        SourcePosition::from_offset(self.source, self.offset_of(index))
    }

    /// Error for an attempt that failed outright
    pub(crate) fn failure_error(&self) -> ParseError {
        let kind = match self.failure.kind {
            crate::error::FailureKind::Explicit => ErrorKind::ExplicitFailure,
            _ => ErrorKind::Mismatch,
        };
        let index = self.failure.index;
        let mut error = ParseError::from_record(
            kind,
            &self.failure,
            self.locate(index),
            self.encountered(index),
        );
        error.trace = self
            .trace
            .as_ref()
            .map(|trace| trace.failure_tree(self.offset_of(index)));
        error
    }

    /// Error for an attempt that succeeded without consuming all input
    pub(crate) fn trailing_error(&self) -> ParseError {
        let index = self.pos;
        let mut error = ParseError::from_record(
            ErrorKind::TrailingInput,
            &FailureRecord::default(),
            self.locate(index),
            self.encountered(index),
        )
        .with_expected(["EOF"]);
        error.trace = self
            .trace
            .as_ref()
            .map(|trace| trace.current_tree(self.offset_of(index)));
        error
    }

    // ------------------------------------------------------------------------
    // Diagnostics and listener
    // ------------------------------------------------------------------------

    pub(crate) fn tracing(&self) -> bool {
        self.trace.is_some()
    }

    pub(crate) fn trace_enter(&mut self, name: &str) {
        let begin = self.offset_of(self.pos);
        if let Some(trace) = self.trace.as_mut() {
            trace.enter(name, begin);
        }
    }

    pub(crate) fn trace_exit(&mut self, success: bool) {
        let end = self.span_from(self.pos).end;
        if let Some(trace) = self.trace.as_mut() {
            trace.exit(end, success);
        }
    }

    /// The diagnostic tree as it stands, in diagnostic mode
    pub(crate) fn parse_tree(&self) -> Option<ParseTree> {
        let end = self.offset_of(self.pos);
        self.trace.as_ref().map(|trace| trace.current_tree(end))
    }

    #[inline]
    pub(crate) fn listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Report a value produced from input index `begin` up to here
    pub(crate) fn notify(&mut self, value: &dyn Any, begin: usize) {
        let span = self.span_from(begin);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_value(value, span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    #[test]
    fn test_char_input() {
        let mut state = ParseState::chars("héllo", RunParameters::default());
        assert_eq!(state.peek_char(), Some('h'));
        state.advance_to(1);
        assert_eq!(state.peek_char(), Some('é'));
        assert_eq!(state.remaining(), "éllo");
        assert_eq!(state.end(), 6);
        assert!(state.require_chars().is_ok());
        assert!(state.require_tokens().is_err());
    }

    #[test]
    fn test_mark_and_reset() {
        let mut state = ParseState::chars("abc", RunParameters::default());
        let mark = state.mark();
        state.advance_to(2);
        state.reset(mark);
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn test_token_offsets_and_spans() {
        let tokens = vec![
            Token::new(0, 1, TokenKind::Integer, "1"),
            Token::new(2, 1, TokenKind::Operator, "+"),
            Token::new(4, 1, TokenKind::Integer, "2"),
        ];
        let mut state = ParseState::tokens("1 + 2", &tokens, RunParameters::default());
        assert_eq!(state.offset_of(1), 2);
        assert_eq!(state.offset_of(3), 5);
        state.advance_to(3);
        assert_eq!(state.span_from(1), Span::new(2, 5));
        assert_eq!(state.encountered(1), "+");
        assert_eq!(state.encountered(3), "EOF");
    }

    #[test]
    fn test_failure_error_location() {
        let mut state = ParseState::chars("ab\ncd", RunParameters::default());
        state.advance_to(4);
        let _ = state.expected("x");
        let _ = state.expected("y");
        let error = state.failure_error();
        assert_eq!(error.kind, ErrorKind::Mismatch);
        assert_eq!((error.line(), error.column()), (2, 2));
        assert_eq!(error.expected, vec!["x", "y"]);
        assert_eq!(error.unexpected.as_deref(), Some("d"));
    }

    #[test]
    fn test_derivative_matching_mode() {
        let params = RunParameters::new().with_matching(MatchMode::Derivative);
        let mut state = ParseState::chars("xxabab!", params);
        state.advance_to(2);
        assert_eq!(state.match_pattern(&Pattern::string("ab").many()), Some(4));
    }

    #[test]
    fn test_listener_receives_span() {
        let mut spans = Vec::new();
        let mut record = |_: &dyn Any, span: Span| spans.push(span);
        {
            let mut state =
                ParseState::chars("abc", RunParameters::new().with_listener(&mut record));
            state.advance_to(2);
            assert!(state.listening());
            state.notify(&1u8, 0);
        }
        assert_eq!(spans, vec![Span::new(0, 2)]);
    }
}
