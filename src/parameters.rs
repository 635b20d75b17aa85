//! Per-invocation run parameters
//!
//! A grammar is built once and shared; everything that may vary from one
//! parse to the next lives in [`RunParameters`]:
//!
//! - [`Mode`]: production parsing, or diagnostic parsing that also records a
//!   [`ParseTree`](crate::trace::ParseTree) of labelled parsers;
//! - [`MatchMode`]: how character patterns are evaluated;
//! - an optional [`ParseListener`] that sees every value a map or sequence
//!   step produces, together with the source span it came from.
//!
//! # Example
//!
//! ```rust
//! use knotwork::parameters::{MatchMode, Mode, RunParameters};
//!
//! let params = RunParameters::new()
//!     .with_mode(Mode::Diagnostic)
//!     .with_matching(MatchMode::Derivative);
//! assert_eq!(params.mode, Mode::Diagnostic);
//! ```

use crate::source_location::Span;
use std::any::Any;
use std::fmt;

/// Parse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Plain parsing
    #[default]
    Production,
    /// Parsing that also builds a parse tree of labelled parsers
    Diagnostic,
}

/// How character patterns are evaluated during a parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Run each pattern directly against the remaining input
    #[default]
    Direct,
    /// Feed the input through the pattern's derivative one character at a
    /// time, stopping as soon as the verdict is known
    Derivative,
}

/// Observer of produced values
///
/// Called once for every value produced by a map or sequence step, with the
/// source span the value was derived from. Typical use is recording source
/// locations for AST nodes in a side table.
///
/// Notifications are not buffered. A value produced inside an alternative
/// that is abandoned later has already been reported, so a listener sees
/// every value the grammar built, not only those in the final result.
pub trait ParseListener {
    /// A value was produced from `span`
    fn on_value(&mut self, value: &dyn Any, span: Span);
}

impl<F> ParseListener for F
where
    F: FnMut(&dyn Any, Span),
{
    fn on_value(&mut self, value: &dyn Any, span: Span) {
        self(value, span)
    }
}

/// Parameters for a single parse invocation
#[derive(Default)]
pub struct RunParameters<'a> {
    /// Production or diagnostic parsing
    pub mode: Mode,
    /// Pattern evaluation strategy
    pub matching: MatchMode,
    pub(crate) listener: Option<&'a mut dyn ParseListener>,
}

impl<'a> RunParameters<'a> {
    /// Production mode, direct matching, no listener
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostic mode with otherwise default settings
    pub fn diagnostic() -> Self {
        Self::new().with_mode(Mode::Diagnostic)
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the pattern evaluation strategy
    pub fn with_matching(mut self, matching: MatchMode) -> Self {
        self.matching = matching;
        self
    }

    /// Attach a listener
    pub fn with_listener(mut self, listener: &'a mut dyn ParseListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Whether a listener is attached
    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}

impl fmt::Debug for RunParameters<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunParameters")
            .field("mode", &self.mode)
            .field("matching", &self.matching)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = RunParameters::default();
        assert_eq!(params.mode, Mode::Production);
        assert_eq!(params.matching, MatchMode::Direct);
        assert!(!params.has_listener());
    }

    #[test]
    fn test_builder() {
        let mut seen = Vec::new();
        let mut record = |_: &dyn Any, span: Span| seen.push(span);
        let params = RunParameters::diagnostic()
            .with_matching(MatchMode::Derivative)
            .with_listener(&mut record);
        assert_eq!(params.mode, Mode::Diagnostic);
        assert_eq!(params.matching, MatchMode::Derivative);
        assert!(params.has_listener());
        assert!(format!("{:?}", params).contains("listener: true"));
    }
}
