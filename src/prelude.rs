//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from
//! knotwork. Importing it with a wildcard brings the core API into scope:
//!
//! ```
//! use knotwork::prelude::*;
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`Parser`] - Shareable typed parser
//! - [`Reference`] - Forward reference for recursive grammars
//! - [`Pattern`] - Character pattern
//! - [`CharClass`], [`CharPredicate`] - Character predicates
//! - [`Lexer`] - Token builder
//!
//! ## Combinators
//! - [`constant()`], [`fail()`], [`eof()`], [`choice()`], [`longest()`],
//!   [`seq2()`] .. [`seq5()`]
//! - [`scanners`] - Character-level parsers
//! - [`terminals`] - Token-level parsers
//!
//! ## Expressions
//! - [`OperatorTable`] - Operator-precedence parser builder
//!
//! ## Running and Errors
//! - [`RunParameters`], [`Mode`], [`MatchMode`]
//! - [`Error`], [`ParseError`], [`GrammarError`]

// ============================================================================
// Core Types
// ============================================================================

pub use crate::lexer::{Lexer, Token, TokenKind};
pub use crate::parser::Parser;
pub use crate::pattern::{CharClass, CharPredicate, Pattern};
pub use crate::reference::Reference;

// ============================================================================
// Combinators
// ============================================================================

pub use crate::combinators::{
    choice, constant, eof, fail, fails, index, longest, never, retn, seq2, seq3, seq4, seq5,
    succeeds, unexpected,
};
pub use crate::lexer::terminals;
pub use crate::scanners;

// ============================================================================
// Expressions
// ============================================================================

pub use crate::operator::{Assoc, OperatorTable};

// ============================================================================
// Running and Errors
// ============================================================================

pub use crate::error::{Error, ErrorKind, GrammarError, ParseError};
pub use crate::parameters::{MatchMode, Mode, RunParameters};
pub use crate::source_location::Span;
