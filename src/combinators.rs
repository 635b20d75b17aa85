//! Free-standing combinators
//!
//! Parsers that do not hang off an existing parser: constants, explicit
//! failures, end of input, n-ary sequences and choices.
//!
//! # Example
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! let sign = choice(vec![
//!     scanners::string("+").retn(1),
//!     scanners::string("-").retn(-1),
//!     constant(1),
//! ]);
//! assert_eq!(sign.parse("-").unwrap(), -1);
//! assert_eq!(sign.parse("").unwrap(), 1);
//! ```

use crate::parser::{Choice, Longest, Parser};

/// Succeed with `value` without consuming input
pub fn constant<T>(value: T) -> Parser<T>
where
    T: Clone + Send + Sync + 'static,
{
    Parser::from_fn(move |_| Ok(value.clone()))
}

/// Alias of [`constant`]
pub fn retn<T>(value: T) -> Parser<T>
where
    T: Clone + Send + Sync + 'static,
{
    constant(value)
}

/// Fail with an explicit message
///
/// An explicit failure outranks expectation lists recorded at the same
/// position.
pub fn fail<T: 'static>(message: impl Into<String>) -> Parser<T> {
    let message = message.into();
    Parser::from_fn(move |state| Err(state.fail(&message)))
}

/// Fail, reporting `what` as unexpected
pub fn unexpected<T: 'static>(what: impl Into<String>) -> Parser<T> {
    let what = what.into();
    Parser::from_fn(move |state| Err(state.unexpected(&what)))
}

/// Always fail, recording nothing
pub fn never<T: 'static>() -> Parser<T> {
    Parser::from_fn(|_| Err(crate::state::Fault::Backtrack))
}

/// Succeed at the end of input
pub fn eof() -> Parser<()> {
    Parser::from_fn(|state| {
        if state.at_end() {
            Ok(())
        } else {
            Err(state.expected("EOF"))
        }
    })
}

/// The current input index, consuming nothing
pub fn index() -> Parser<usize> {
    Parser::from_fn(|state| Ok(state.position()))
}

/// The first alternative that succeeds, tried left to right
///
/// Each alternative starts from the same position. An empty list never
/// matches.
pub fn choice<T: 'static>(alternatives: Vec<Parser<T>>) -> Parser<T> {
    Parser::new(Choice { alternatives })
}

/// The alternative that consumes the most input
///
/// Every alternative is run from the same position; on a tie the earliest
/// wins. Fails only when all alternatives fail.
pub fn longest<T: 'static>(alternatives: Vec<Parser<T>>) -> Parser<T> {
    Parser::new(Longest { alternatives })
}

/// Succeed, consuming nothing, if `parser` would succeed here
pub fn succeeds<T: 'static>(parser: Parser<T>) -> Parser<()> {
    parser.peek().unit()
}

/// Succeed, consuming nothing, if `parser` would fail here
pub fn fails<T: 'static>(parser: Parser<T>) -> Parser<()> {
    parser.not()
}

/// Two parsers in sequence, results combined by `f`
pub fn seq2<A, B, R, F>(a: Parser<A>, b: Parser<B>, f: F) -> Parser<R>
where
    A: 'static,
    B: 'static,
    R: 'static,
    F: Fn(A, B) -> R + Send + Sync + 'static,
{
    Parser::from_fn(move |state| {
        let begin = state.position();
        let value = f(a.apply(state)?, b.apply(state)?);
        if state.listening() {
            state.notify(&value, begin);
        }
        Ok(value)
    })
}

/// Three parsers in sequence, results combined by `f`
pub fn seq3<A, B, C, R, F>(a: Parser<A>, b: Parser<B>, c: Parser<C>, f: F) -> Parser<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    R: 'static,
    F: Fn(A, B, C) -> R + Send + Sync + 'static,
{
    Parser::from_fn(move |state| {
        let begin = state.position();
        let value = f(a.apply(state)?, b.apply(state)?, c.apply(state)?);
        if state.listening() {
            state.notify(&value, begin);
        }
        Ok(value)
    })
}

/// Four parsers in sequence, results combined by `f`
pub fn seq4<A, B, C, D, R, F>(
    a: Parser<A>,
    b: Parser<B>,
    c: Parser<C>,
    d: Parser<D>,
    f: F,
) -> Parser<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    D: 'static,
    R: 'static,
    F: Fn(A, B, C, D) -> R + Send + Sync + 'static,
{
    Parser::from_fn(move |state| {
        let begin = state.position();
        let value = f(
            a.apply(state)?,
            b.apply(state)?,
            c.apply(state)?,
            d.apply(state)?,
        );
        if state.listening() {
            state.notify(&value, begin);
        }
        Ok(value)
    })
}

/// Five parsers in sequence, results combined by `f`
pub fn seq5<A, B, C, D, E, R, F>(
    a: Parser<A>,
    b: Parser<B>,
    c: Parser<C>,
    d: Parser<D>,
    e: Parser<E>,
    f: F,
) -> Parser<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    D: 'static,
    E: 'static,
    R: 'static,
    F: Fn(A, B, C, D, E) -> R + Send + Sync + 'static,
{
    Parser::from_fn(move |state| {
        let begin = state.position();
        let value = f(
            a.apply(state)?,
            b.apply(state)?,
            c.apply(state)?,
            d.apply(state)?,
            e.apply(state)?,
        );
        if state.listening() {
            state.notify(&value, begin);
        }
        Ok(value)
    })
}
