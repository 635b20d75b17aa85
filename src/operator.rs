//! Operator-precedence expression parsers
//!
//! An [`OperatorTable`] collects prefix, postfix and infix operators with
//! their precedences and combining functions, and builds an expression
//! parser around an operand parser.
//!
//! - Prefix and postfix operators bind tighter than any infix operator. Any
//!   number of them may surround an operand; prefixes apply innermost first
//!   (right to left), postfixes left to right. Their precedence only decides
//!   which operator is tried first when several could match.
//! - Infix operators are grouped by precedence, highest binding tightest.
//!   Each level is left-associative, right-associative or non-associative;
//!   mixing associativities within one level is rejected at build time.
//!
//! # Example
//!
//! ```rust
//! use knotwork::prelude::*;
//!
//! let number = scanners::is_char(CharClass::Digit)
//!     .many1()
//!     .source()
//!     .map(|s| s.parse::<i64>().unwrap_or(0));
//!
//! let expr = OperatorTable::new()
//!     .prefix(scanners::string("-"), 30, |x: i64| -x)
//!     .infixl(scanners::string("*"), 20, |a, b| a * b)
//!     .infixl(scanners::string("+"), 10, |a, b| a + b)
//!     .build(number)
//!     .unwrap();
//!
//! assert_eq!(expr.parse("1+2*-3").unwrap(), -5);
//! ```

use crate::combinators::choice;
use crate::error::GrammarError;
use crate::parser::Parser;
use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

type Unary<T> = Arc<dyn Fn(T) -> T + Send + Sync>;
pub(crate) type Binary<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// Associativity of an infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assoc {
    /// `a - b - c` = `(a - b) - c`
    Left,
    /// `a ^ b ^ c` = `a ^ (b ^ c)`
    Right,
    /// `a == b == c` does not parse
    NonAssoc,
}

enum Fixity<T> {
    Prefix(Unary<T>),
    Postfix(Unary<T>),
    Infix(Assoc, Binary<T>),
}

struct Entry<T> {
    op: Parser<()>,
    precedence: i32,
    fixity: Fixity<T>,
}

/// Operator declarations, built into an expression parser
pub struct OperatorTable<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for OperatorTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for OperatorTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for entry in &self.entries {
            let kind = match &entry.fixity {
                Fixity::Prefix(_) => "prefix".to_string(),
                Fixity::Postfix(_) => "postfix".to_string(),
                Fixity::Infix(assoc, _) => format!("infix {:?}", assoc),
            };
            list.entry(&format_args!("{} @ {}", kind, entry.precedence));
        }
        list.finish()
    }
}

impl<T: 'static> OperatorTable<T> {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    fn push<O: 'static>(mut self, op: Parser<O>, precedence: i32, fixity: Fixity<T>) -> Self {
        self.entries.push(Entry {
            op: op.unit(),
            precedence,
            fixity,
        });
        self
    }

    /// A prefix operator; its result is discarded
    ///
    /// Prefix and postfix operators bind tighter than every infix operator
    /// whatever their precedence, so with `!` at 5 and `+` at 10, `!a+b`
    /// is `(!a)+b`. Their precedence only orders them among other unary
    /// operators.
    pub fn prefix<O: 'static>(
        self,
        op: Parser<O>,
        precedence: i32,
        f: impl Fn(T) -> T + Send + Sync + 'static,
    ) -> Self {
        self.push(op, precedence, Fixity::Prefix(Arc::new(f)))
    }

    /// A postfix operator; like [`OperatorTable::prefix`] it binds tighter
    /// than every infix operator
    pub fn postfix<O: 'static>(
        self,
        op: Parser<O>,
        precedence: i32,
        f: impl Fn(T) -> T + Send + Sync + 'static,
    ) -> Self {
        self.push(op, precedence, Fixity::Postfix(Arc::new(f)))
    }

    /// A left-associative infix operator
    pub fn infixl<O: 'static>(
        self,
        op: Parser<O>,
        precedence: i32,
        f: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> Self {
        self.push(op, precedence, Fixity::Infix(Assoc::Left, Arc::new(f)))
    }

    /// A right-associative infix operator
    pub fn infixr<O: 'static>(
        self,
        op: Parser<O>,
        precedence: i32,
        f: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> Self {
        self.push(op, precedence, Fixity::Infix(Assoc::Right, Arc::new(f)))
    }

    /// A non-associative infix operator
    pub fn infixn<O: 'static>(
        self,
        op: Parser<O>,
        precedence: i32,
        f: impl Fn(T, T) -> T + Send + Sync + 'static,
    ) -> Self {
        self.push(op, precedence, Fixity::Infix(Assoc::NonAssoc, Arc::new(f)))
    }

    /// Build the expression parser around `operand`
    ///
    /// Fails with [`GrammarError::AmbiguousOperatorPrecedence`] when two infix
    /// operators share a precedence but not an associativity.
    pub fn build(self, operand: Parser<T>) -> Result<Parser<T>, GrammarError> {
        let mut assocs: HashMap<i32, Assoc> = HashMap::new();
        for entry in &self.entries {
            if let Fixity::Infix(assoc, _) = &entry.fixity {
                match assocs.insert(entry.precedence, *assoc) {
                    Some(previous) if previous != *assoc => {
                        return Err(GrammarError::AmbiguousOperatorPrecedence {
                            precedence: entry.precedence,
                        });
                    }
                    _ => {}
                }
            }
        }

        let mut entries = self.entries;
        entries.sort_by(|a, b| b.precedence.cmp(&a.precedence));

        let mut prefixes = Vec::new();
        let mut postfixes = Vec::new();
        let mut levels: Vec<(i32, Assoc, Vec<Parser<Binary<T>>>)> = Vec::new();
        for Entry {
            op,
            precedence,
            fixity,
        } in entries
        {
            match fixity {
                Fixity::Prefix(f) => prefixes.push(yielding(op, f)),
                Fixity::Postfix(f) => postfixes.push(yielding(op, f)),
                Fixity::Infix(assoc, f) => match levels.last_mut() {
                    Some((level, _, ops)) if *level == precedence => ops.push(yielding(op, f)),
                    _ => levels.push((precedence, assoc, vec![yielding(op, f)])),
                },
            }
        }

        log_debug!(
            "operator table: {} prefix, {} postfix, {} infix levels",
            prefixes.len(),
            postfixes.len(),
            levels.len()
        );

        let mut expr = unary(operand, prefixes, postfixes);
        for (_, assoc, ops) in levels {
            let op = choice(ops);
            expr = match assoc {
                Assoc::Left => left_fold(expr, op),
                Assoc::Right => right_fold(expr, op),
                Assoc::NonAssoc => non_assoc(expr, op),
            };
        }
        Ok(expr)
    }
}

/// Run `op` and hand back its combining function
fn yielding<F>(op: Parser<()>, f: F) -> Parser<F>
where
    F: Clone + Send + Sync + 'static,
{
    Parser::from_fn(move |state| {
        op.apply(state)?;
        Ok(f.clone())
    })
}

/// Erase the combining function type of an operator parser
pub(crate) fn binary<T: 'static, F>(op: Parser<F>) -> Parser<Binary<T>>
where
    F: Fn(T, T) -> T + Send + Sync + 'static,
{
    Parser::from_fn(move |state| {
        let f = op.apply(state)?;
        Ok(Arc::new(f) as Binary<T>)
    })
}

fn unary<T: 'static>(
    operand: Parser<T>,
    prefixes: Vec<Parser<Unary<T>>>,
    postfixes: Vec<Parser<Unary<T>>>,
) -> Parser<T> {
    if prefixes.is_empty() && postfixes.is_empty() {
        return operand;
    }
    let prefix = choice(prefixes).many();
    let postfix = choice(postfixes).many();
    Parser::from_fn(move |state| {
        let before = prefix.apply(state)?;
        let value = operand.apply(state)?;
        let after = postfix.apply(state)?;
        let value = after.iter().fold(value, |acc, f| f(acc));
        Ok(before.iter().rev().fold(value, |acc, f| f(acc)))
    })
}

pub(crate) fn left_fold<T: 'static>(operand: Parser<T>, op: Parser<Binary<T>>) -> Parser<T> {
    let rest = op.and(operand.clone()).many();
    Parser::from_fn(move |state| {
        let first = operand.apply(state)?;
        let rest = rest.apply(state)?;
        Ok(rest.into_iter().fold(first, |acc, (f, rhs)| f(acc, rhs)))
    })
}

pub(crate) fn right_fold<T: 'static>(operand: Parser<T>, op: Parser<Binary<T>>) -> Parser<T> {
    let rest = op.and(operand.clone()).many();
    Parser::from_fn(move |state| {
        let first = operand.apply(state)?;
        let mut rest = rest.apply(state)?;
        let Some((mut f, mut acc)) = rest.pop() else {
            return Ok(first);
        };
        while let Some((g, lhs)) = rest.pop() {
            acc = f(lhs, acc);
            f = g;
        }
        Ok(f(first, acc))
    })
}

pub(crate) fn non_assoc<T: 'static>(operand: Parser<T>, op: Parser<Binary<T>>) -> Parser<T> {
    let rest = op.and(operand.clone()).optional();
    Parser::from_fn(move |state| {
        let first = operand.apply(state)?;
        Ok(match rest.apply(state)? {
            Some((f, rhs)) => f(first, rhs),
            None => first,
        })
    })
}
