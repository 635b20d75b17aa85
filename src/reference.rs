//! Forward references for recursive grammars
//!
//! A [`Reference`] is a slot that is filled after the parsers that use it
//! have been built. [`Reference::lazy`] hands out a parser that looks the
//! slot up each time it runs; [`Reference::set`] fills it exactly once.
//!
//! # Example
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! // parens := "(" parens* ")"
//! let parens: Reference<()> = Reference::new();
//! let body = parens.lazy().many().unit();
//! parens.set(body.between(scanners::string("("), scanners::string(")"))).unwrap();
//!
//! let grammar = parens.get().unwrap().many().unit();
//! assert!(grammar.parse("(()())()").is_ok());
//! assert!(grammar.parse("(()").is_err());
//! ```
//!
//! A recursive grammar keeps itself alive through the reference, so its
//! memory is only reclaimed when the process ends. Grammars are meant to be
//! built once and reused.

use crate::error::GrammarError;
use crate::parser::Parser;
use crate::state::Fault;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A parser slot that is bound once, after construction
pub struct Reference<T> {
    slot: Arc<OnceLock<Parser<T>>>,
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Reference<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(OnceLock::new()),
        }
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("bound", &self.slot.get().is_some())
            .finish()
    }
}

impl<T: 'static> Reference<T> {
    /// An unbound reference
    pub fn new() -> Self {
        Self::default()
    }

    /// A parser that runs whatever the reference is bound to
    ///
    /// Running it before [`Reference::set`] is a
    /// [`GrammarError::ReferenceUnbound`].
    pub fn lazy(&self) -> Parser<T> {
        let slot = Arc::clone(&self.slot);
        Parser::from_fn(move |state| match slot.get() {
            Some(parser) => parser.apply(state),
            None => Err(Fault::Fatal(GrammarError::ReferenceUnbound)),
        })
    }

    /// Bind the reference
    ///
    /// A reference is sealed by its first binding; later calls return
    /// [`GrammarError::ReferenceRebound`].
    pub fn set(&self, parser: Parser<T>) -> Result<(), GrammarError> {
        self.slot.set(parser).map_err(|_| {
            log_debug!("reference already bound");
            GrammarError::ReferenceRebound
        })?;
        log_debug!("reference bound to {}", std::any::type_name::<T>());
        Ok(())
    }

    /// The bound parser, if any
    pub fn get(&self) -> Option<Parser<T>> {
        self.slot.get().cloned()
    }

    /// Whether the reference has been bound
    pub fn is_bound(&self) -> bool {
        self.slot.get().is_some()
    }
}
