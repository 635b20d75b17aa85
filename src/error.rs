//! Error types and the farthest-failure record
//!
//! Two families of errors come out of a parse:
//!
//! - [`ParseError`] describes a problem with the *input*. It is built from
//!   the farthest failure seen during the attempt, so it points at the
//!   position the parser got furthest to and lists everything that would
//!   have been accepted there.
//! - [`GrammarError`] describes a problem with the *grammar*: an unbound
//!   reference, a repetition that makes no progress, conflicting operator
//!   declarations. These are never recovered by backtracking and are raised
//!   at build time wherever possible.
//!
//! # Example Output
//!
//! ```text
//! line 1, column 3: c or d expected, x encountered
//! ```

use crate::source_location::{SourceLocator, SourcePosition};
use crate::trace::ParseTree;
use serde::Serialize;
use std::fmt;

// ============================================================================
// Farthest failure
// ============================================================================

/// Priority of a recorded failure at a single position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub(crate) enum FailureKind {
    #[default]
    None,
    Unexpected,
    Expected,
    Explicit,
}

/// The farthest failure seen so far in one parse attempt
///
/// `index` is in input units: bytes for character input, token indexes for
/// token input.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailureRecord {
    pub(crate) index: usize,
    pub(crate) kind: FailureKind,
    pub(crate) expected: Vec<String>,
    pub(crate) unexpected: Option<String>,
    pub(crate) message: Option<String>,
}

impl FailureRecord {
    /// Whether a failure of `kind` at `at` should be merged into the record
    /// (`Some(false)`), replace it (`Some(true)`) or be dropped (`None`)
    fn admit(&self, at: usize, kind: FailureKind) -> Option<bool> {
        if self.kind == FailureKind::None || at > self.index {
            return Some(true);
        }
        if at < self.index {
            return None;
        }
        match kind.cmp(&self.kind) {
            std::cmp::Ordering::Greater => Some(true),
            std::cmp::Ordering::Equal if kind == FailureKind::Expected => Some(false),
            _ => None,
        }
    }

    fn reset(&mut self, at: usize, kind: FailureKind) {
        self.index = at;
        self.kind = kind;
        self.expected.clear();
        self.unexpected = None;
        self.message = None;
    }

    /// Record that `what` would have been accepted at `at`
    pub(crate) fn expected(&mut self, at: usize, what: &str) {
        match self.admit(at, FailureKind::Expected) {
            Some(true) => {
                self.reset(at, FailureKind::Expected);
                self.expected.push(what.to_string());
            }
            Some(false) => {
                if !self.expected.iter().any(|e| e == what) {
                    self.expected.push(what.to_string());
                }
            }
            None => {}
        }
    }

    /// Record that `what` was found where it is not allowed
    pub(crate) fn unexpected(&mut self, at: usize, what: &str) {
        if let Some(true) = self.admit(at, FailureKind::Unexpected) {
            self.reset(at, FailureKind::Unexpected);
            self.unexpected = Some(what.to_string());
        }
    }

    /// Record an explicit failure message
    pub(crate) fn explicit(&mut self, at: usize, message: &str) {
        if let Some(true) = self.admit(at, FailureKind::Explicit) {
            self.reset(at, FailureKind::Explicit);
            self.message = Some(message.to_string());
        }
    }
}

// ============================================================================
// ParseError
// ============================================================================

/// What kind of input problem a [`ParseError`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Nothing acceptable was found at the failure position
    Mismatch,
    /// A `fail(message)` parser was the farthest failure
    ExplicitFailure,
    /// The grammar matched, but input remained
    TrailingInput,
    /// A dedent that matches no enclosing indentation level
    Indentation,
}

/// A located, aggregated description of why the input was rejected
#[derive(Debug, Clone, Serialize)]
pub struct ParseError {
    /// Kind of failure
    pub kind: ErrorKind,
    /// Line and column of the failure (byte offset included)
    pub position: SourcePosition,
    /// Everything that would have been accepted, in discovery order
    pub expected: Vec<String>,
    /// What was found instead
    pub unexpected: Option<String>,
    /// Message of an explicit failure
    pub message: Option<String>,
    /// Diagnostic parse tree, in diagnostic mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<ParseTree>,
}

impl ParseError {
    /// Create an error of `kind` at byte `offset` of `source`
    pub fn new(kind: ErrorKind, source: &str, offset: usize) -> Self {
        Self {
            kind,
            position: SourcePosition::from_offset(source, offset),
            expected: Vec::new(),
            unexpected: None,
            message: None,
            trace: None,
        }
    }

    pub(crate) fn from_record(
        kind: ErrorKind,
        record: &FailureRecord,
        position: SourcePosition,
        encountered: String,
    ) -> Self {
        Self {
            kind,
            position,
            expected: record.expected.clone(),
            unexpected: Some(record.unexpected.clone().unwrap_or(encountered)),
            message: record.message.clone(),
            trace: None,
        }
    }

    /// Set the expectation list
    pub fn with_expected(mut self, expected: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expected = expected.into_iter().map(Into::into).collect();
        self
    }

    /// Set what was encountered
    pub fn with_unexpected(mut self, unexpected: impl Into<String>) -> Self {
        self.unexpected = Some(unexpected.into());
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Byte offset of the failure
    pub fn offset(&self) -> usize {
        self.position.offset
    }

    /// Line of the failure (1-based)
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Column of the failure (1-based)
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// Render with the offending source line and a caret under the column
    pub fn format_with_source(&self, source: &str) -> String {
        let locator = SourceLocator::new(source);
        format!("{}\n{}", self, locator.caret(self.position.offset))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    fn write_details(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encountered = self.unexpected.as_deref().unwrap_or("EOF");
        match (self.kind, &self.message) {
            (ErrorKind::ExplicitFailure | ErrorKind::Indentation, Some(message)) => {
                f.write_str(message)
            }
            _ if !self.expected.is_empty() => {
                write_alternatives(f, &self.expected)?;
                write!(f, " expected, {} encountered", encountered)
            }
            (_, Some(message)) => f.write_str(message),
            _ => write!(f, "unexpected {}", encountered),
        }
    }
}

fn write_alternatives(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(if i + 1 == items.len() { " or " } else { ", " })?;
        }
        f.write_str(item)?;
    }
    Ok(())
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.position)?;
        self.write_details(f)
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// GrammarError
// ============================================================================

/// A defect in how a grammar was put together
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A repetition succeeded without consuming input
    LoopGuardViolation {
        /// Byte offset where the empty iteration happened
        offset: usize,
    },
    /// A lazy reference was used before a parser was bound to it
    ReferenceUnbound,
    /// A lazy reference was bound a second time
    ReferenceRebound,
    /// More than one infix associativity at one precedence level
    AmbiguousOperatorPrecedence {
        /// The conflicting precedence level
        precedence: i32,
    },
    /// A regular expression failed to compile
    InvalidPattern {
        /// The expression
        pattern: String,
        /// Compiler message
        reason: String,
    },
    /// A bounded repetition with `min > max`
    InvalidRepetition {
        /// Lower bound
        min: usize,
        /// Upper bound
        max: usize,
    },
    /// A character parser ran on tokens, or a token parser on characters
    WrongInputKind {
        /// The kind of input the parser needs
        expected: &'static str,
    },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::LoopGuardViolation { offset } => write!(
                f,
                "Loop guard violation: repetition made no progress at byte offset {}",
                offset
            ),
            GrammarError::ReferenceUnbound => {
                write!(f, "Reference used before a parser was bound to it")
            }
            GrammarError::ReferenceRebound => write!(f, "Reference is already bound"),
            GrammarError::AmbiguousOperatorPrecedence { precedence } => write!(
                f,
                "Ambiguous operator precedence: more than one infix associativity at level {}",
                precedence
            ),
            GrammarError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid pattern /{}/: {}", pattern, reason)
            }
            GrammarError::InvalidRepetition { min, max } => {
                write!(f, "Invalid repetition: min {} exceeds max {}", min, max)
            }
            GrammarError::WrongInputKind { expected } => {
                write!(f, "Parser requires {} input", expected)
            }
        }
    }
}

impl std::error::Error for GrammarError {}

// ============================================================================
// Error
// ============================================================================

/// Anything a parse invocation can fail with
#[derive(Debug, Clone)]
pub enum Error {
    /// The input was rejected
    Parse(ParseError),
    /// The grammar is defective
    Grammar(GrammarError),
}

impl Error {
    /// The input error, if this is one
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Grammar(_) => None,
        }
    }

    /// The grammar error, if this is one
    pub fn as_grammar(&self) -> Option<&GrammarError> {
        match self {
            Error::Grammar(e) => Some(e),
            Error::Parse(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<GrammarError> for Error {
    fn from(e: GrammarError) -> Self {
        Error::Grammar(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
            Error::Grammar(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Grammar(e) => Some(e),
        }
    }
}
