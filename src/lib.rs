//! Knotwork - Parser Combinators with Derivative-Based Patterns
//!
//! Knotwork builds parsers out of small, typed pieces. It provides:
//! - Character patterns with direct matching and Brzozowski-style
//!   derivatives that agree on every input
//! - A configurable lexer with keyword reclassification and optional
//!   indentation-sensitive tokens
//! - A parser combinator core with ordered choice, explicit commitment,
//!   guarded repetition and lazy references for recursive grammars
//! - Farthest-failure error reporting with line/column positions
//! - Operator-precedence expression parsers
//! - Diagnostic parse trees and value listeners
//!
//! ## Quick Start
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! let number = scanners::is_char(CharClass::Digit)
//!     .many1()
//!     .source()
//!     .map(|s| s.parse::<i64>().unwrap_or(0));
//!
//! let expr: Reference<i64> = Reference::new();
//! let atom = number.or(expr.lazy().between(scanners::string("("), scanners::string(")")));
//! let table = OperatorTable::new()
//!     .prefix(scanners::string("-"), 100, |x: i64| -x)
//!     .infixl(scanners::string("*"), 20, |a, b| a * b)
//!     .infixl(scanners::string("/"), 20, |a, b| a / b)
//!     .infixl(scanners::string("+"), 10, |a, b| a + b)
//!     .infixl(scanners::string("-"), 10, |a, b| a - b);
//! expr.set(table.build(atom).unwrap()).unwrap();
//!
//! let calc = expr.lazy();
//! assert_eq!(calc.parse("1+2*-3").unwrap(), -5);
//! assert_eq!(calc.parse("((1-2)/-1)").unwrap(), 1);
//! ```
//!
//! ## Parsing Tokens
//!
//! ```rust
//! use knotwork::prelude::*;
//! use knotwork::lexer::terminals::{identifier, keyword};
//!
//! let lexer = Lexer::builder().keywords(["def"]).build();
//! let def = keyword("def").then(identifier());
//!
//! assert_eq!(def.parse_tokens("def define", &lexer).unwrap(), "define");
//! assert!(def.parse_tokens("def def", &lexer).is_err());
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::type_complexity)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

pub mod combinators;
pub mod error;
pub mod lexer;
pub mod operator;
pub mod parameters;
pub mod parser;
pub mod pattern;
pub mod reference;
pub mod scanners;
pub mod source_location;
pub mod state;
pub mod trace;

/// Re-export commonly used types for convenience
pub use combinators::{
    choice, constant, eof, fail, fails, index, longest, never, retn, seq2, seq3, seq4, seq5,
    succeeds, unexpected,
};
pub use error::{Error, ErrorKind, GrammarError, ParseError};
pub use lexer::{Indentation, Lexer, LexerBuilder, Token, TokenKind, TokenValue};
pub use operator::{Assoc, OperatorTable};
pub use parameters::{MatchMode, Mode, ParseListener, RunParameters};
pub use parser::{Parser, Parslet};
pub use pattern::{CharClass, CharPredicate, Derivative, Pattern};
pub use reference::Reference;
pub use source_location::{SourceLocator, SourcePosition, Span};
pub use state::{Fault, Mark, ParseState, Step};
pub use trace::ParseTree;
