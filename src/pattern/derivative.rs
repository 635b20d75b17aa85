//! Derivative-driven pattern matching
//!
//! The derivative of a pattern with respect to a character is the matcher
//! that remains after that character has been consumed. Feeding a
//! [`Derivative`] one character at a time and closing it with
//! [`Derivative::finish`] gives exactly the answer of
//! [`Pattern::match_at`] on the same text.
//!
//! Patterns here are ordered and greedy rather than regular, so a residual
//! carries more than a set of states:
//!
//! - positions are absolute offsets from where matching started, and a
//!   residual may settle on an end that lies behind the current position
//!   (a repetition that has to give back its last, failed iteration);
//! - a sequence keeps a speculative continuation for every position where
//!   its head might end, and drops it once the head can no longer end there;
//! - ordered choice resolves by priority, so an earlier alternative that is
//!   still undecided blocks later alternatives that already matched.
//!
//! Regular expressions cannot be differentiated character by character;
//! their residual buffers input and resolves when the input is closed.
//!
//! # Example
//!
//! ```rust
//! use knotwork::pattern::Pattern;
//!
//! let p = Pattern::string("ab").many();
//! let d = p.derive('a').derive('b').derive('a');
//! assert_eq!(d.outcome(), None);
//! assert_eq!(d.finish(), Some(2));
//! ```

use super::{chars_match, Node, Pattern};

/// The residual matcher left after consuming a prefix of the input
#[derive(Clone)]
pub struct Derivative {
    residual: Residual,
    pos: usize,
}

impl Derivative {
    /// Residual after consuming `c`
    pub fn derive(&self, c: char) -> Derivative {
        let mut next = self.clone();
        next.feed(c);
        next
    }

    /// Consume `c` in place
    pub fn feed(&mut self, c: char) {
        let residual = std::mem::replace(&mut self.residual, Residual::Done(None));
        self.residual = residual.derive(c, self.pos);
        self.pos += c.len_utf8();
    }

    /// Close the input and return the match length, `None` on a mismatch
    pub fn finish(&self) -> Option<usize> {
        self.residual.finish(self.pos)
    }

    /// The verdict if it no longer depends on further input
    pub fn outcome(&self) -> Option<Option<usize>> {
        match self.residual {
            Residual::Done(end) => Some(end),
            _ => None,
        }
    }

    /// Bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl Pattern {
    /// The residual matcher before any input
    pub fn derivative(&self) -> Derivative {
        Derivative {
            residual: self.start(0),
            pos: 0,
        }
    }

    /// The residual matcher after consuming `c`
    pub fn derive(&self, c: char) -> Derivative {
        self.derivative().derive(c)
    }

    /// Match `text` by feeding it through the derivative
    ///
    /// Agrees with `self.match_at(text, 0, text.len())` for every pattern and
    /// input. Stops reading as soon as the verdict is decided.
    pub fn simulate(&self, text: &str) -> Option<usize> {
        let mut derivative = self.derivative();
        for c in text.chars() {
            if let Some(end) = derivative.outcome() {
                return end;
            }
            derivative.feed(c);
        }
        derivative.finish()
    }

    /// Fresh residual for a match starting at `pos`
    fn start(&self, pos: usize) -> Residual {
        match &*self.node {
            Node::Never => Residual::Done(None),
            Node::Always => Residual::Done(Some(pos)),
            Node::Char(_) => Residual::Char(self.clone()),
            Node::Literal { text, .. } if text.is_empty() => Residual::Done(Some(pos)),
            Node::Literal { .. } => Residual::Literal {
                pattern: self.clone(),
                offset: 0,
            },
            Node::NotLiteral { text, .. } if text.is_empty() => Residual::Done(None),
            Node::NotLiteral { .. } => Residual::NotLiteral {
                pattern: self.clone(),
                offset: 0,
                first_end: None,
            },
            Node::AtLeast(0) => Residual::Done(Some(pos)),
            Node::AtLeast(n) => Residual::Count { remaining: *n },
            Node::Exact(n) => Residual::Exact { remaining: *n },
            Node::Sequence(_) => Cont::Seq {
                sequence: self.clone(),
                index: 0,
            }
            .start(pos),
            Node::Or(items) => Residual::Or {
                runs: items.iter().map(|item| item.start(pos)).collect(),
            }
            .settle(pos),
            Node::Longest(items) => Residual::Longest {
                runs: items.iter().map(|item| item.start(pos)).collect(),
            }
            .settle(pos),
            Node::Repeat { pattern, min, max } => {
                if *max == Some(0) {
                    return Residual::Done(Some(pos));
                }
                Residual::Then {
                    head: Box::new(pattern.start(pos)),
                    cont: Cont::Repeat {
                        repeat: self.clone(),
                        completed: 0,
                        iter_start: pos,
                    },
                    fallback: (*min == 0).then_some(pos),
                    forks: Vec::new(),
                }
                .settle(pos)
            }
            Node::Not(inner) => Residual::Not {
                inner: Box::new(inner.start(pos)),
                start: pos,
            }
            .settle(pos),
            Node::Peek(inner) => Residual::Peek {
                inner: Box::new(inner.start(pos)),
                start: pos,
            }
            .settle(pos),
            Node::Regex { .. } => Residual::Regex {
                pattern: self.clone(),
                start: pos,
                buffer: String::new(),
            },
        }
    }
}

// ============================================================================
// Residual
// ============================================================================

#[derive(Clone)]
enum Residual {
    /// Decided: the absolute end of the match, or a mismatch
    Done(Option<usize>),
    /// One character satisfying the predicate of a `Node::Char`
    Char(Pattern),
    /// The rest of a `Node::Literal` from byte `offset` of its text
    Literal { pattern: Pattern, offset: usize },
    /// A `Node::NotLiteral`; `first_end` is where it ends unless the whole
    /// literal turns up
    NotLiteral {
        pattern: Pattern,
        offset: usize,
        first_end: Option<usize>,
    },
    /// Characters still required by `has_at_least`
    Count { remaining: usize },
    /// Characters still required before the input must end
    Exact { remaining: usize },
    /// `head` followed by `cont`; resolves to `fallback` if `head` fails
    Then {
        head: Box<Residual>,
        cont: Cont,
        fallback: Option<usize>,
        forks: Vec<(usize, Residual)>,
    },
    /// Ordered choice, highest priority first
    Or { runs: Vec<Residual> },
    /// Longest of the runs, earliest on ties
    Longest { runs: Vec<Residual> },
    Not { inner: Box<Residual>, start: usize },
    Peek { inner: Box<Residual>, start: usize },
    /// Buffered input for a regular expression
    Regex {
        pattern: Pattern,
        start: usize,
        buffer: String,
    },
}

/// What follows the head of a `Residual::Then`
#[derive(Clone)]
enum Cont {
    /// Items `index..` of a `Node::Sequence`
    Seq { sequence: Pattern, index: usize },
    /// Further iterations of a `Node::Repeat` after the one that began at
    /// `iter_start`, with `completed` iterations before it
    Repeat {
        repeat: Pattern,
        completed: usize,
        iter_start: usize,
    },
}

impl Cont {
    /// Residual for the continuation once the head has ended at `pos`
    fn start(&self, pos: usize) -> Residual {
        match self {
            Cont::Seq { sequence, index } => {
                let Node::Sequence(items) = &*sequence.node else {
                    return Residual::Done(None);
                };
                match items.len() - *index {
                    0 => Residual::Done(Some(pos)),
                    1 => items[*index].start(pos),
                    _ => Residual::Then {
                        head: Box::new(items[*index].start(pos)),
                        cont: Cont::Seq {
                            sequence: sequence.clone(),
                            index: index + 1,
                        },
                        fallback: None,
                        forks: Vec::new(),
                    }
                    .settle(pos),
                }
            }
            Cont::Repeat {
                repeat,
                completed,
                iter_start,
            } => {
                let Node::Repeat { pattern, min, max } = &*repeat.node else {
                    return Residual::Done(None);
                };
                let completed = completed + 1;
                if *max == Some(completed) {
                    return Residual::Done(Some(pos));
                }
                if pos == *iter_start && max.is_none() && completed >= *min {
                    return Residual::Done(Some(pos));
                }
                Residual::Then {
                    head: Box::new(pattern.start(pos)),
                    cont: Cont::Repeat {
                        repeat: repeat.clone(),
                        completed,
                        iter_start: pos,
                    },
                    fallback: (completed >= *min).then_some(pos),
                    forks: Vec::new(),
                }
                .settle(pos)
            }
        }
    }
}

impl Residual {
    /// Consume `c`, which sits at absolute offset `pos`
    fn derive(self, c: char, pos: usize) -> Residual {
        let next = pos + c.len_utf8();
        match self {
            Residual::Done(end) => Residual::Done(end),
            Residual::Char(pattern) => match &*pattern.node {
                Node::Char(predicate) if predicate.test(c) => Residual::Done(Some(next)),
                _ => Residual::Done(None),
            },
            Residual::Literal { pattern, offset } => {
                let Node::Literal { text, ignore_case } = &*pattern.node else {
                    return Residual::Done(None);
                };
                match text[offset..].chars().next() {
                    Some(expected) if chars_match(expected, c, *ignore_case) => {
                        let offset = offset + expected.len_utf8();
                        if offset == text.len() {
                            Residual::Done(Some(next))
                        } else {
                            Residual::Literal { pattern, offset }
                        }
                    }
                    _ => Residual::Done(None),
                }
            }
            Residual::NotLiteral {
                pattern,
                offset,
                first_end,
            } => {
                let Node::NotLiteral { text, ignore_case } = &*pattern.node else {
                    return Residual::Done(None);
                };
                let first_end = first_end.unwrap_or(next);
                match text[offset..].chars().next() {
                    Some(expected) if chars_match(expected, c, *ignore_case) => {
                        let offset = offset + expected.len_utf8();
                        if offset == text.len() {
                            Residual::Done(None)
                        } else {
                            Residual::NotLiteral {
                                pattern,
                                offset,
                                first_end: Some(first_end),
                            }
                        }
                    }
                    _ => Residual::Done(Some(first_end)),
                }
            }
            Residual::Count { remaining } => {
                if remaining <= 1 {
                    Residual::Done(Some(next))
                } else {
                    Residual::Count {
                        remaining: remaining - 1,
                    }
                }
            }
            Residual::Exact { remaining } => {
                if remaining == 0 {
                    Residual::Done(None)
                } else {
                    Residual::Exact {
                        remaining: remaining - 1,
                    }
                }
            }
            Residual::Then {
                head,
                cont,
                fallback,
                forks,
            } => Residual::Then {
                head: Box::new(head.derive(c, pos)),
                cont,
                fallback,
                forks: forks
                    .into_iter()
                    .map(|(at, fork)| (at, fork.derive(c, pos)))
                    .collect(),
            }
            .settle(next),
            Residual::Or { runs } => Residual::Or {
                runs: runs.into_iter().map(|run| run.derive(c, pos)).collect(),
            }
            .settle(next),
            Residual::Longest { runs } => Residual::Longest {
                runs: runs.into_iter().map(|run| run.derive(c, pos)).collect(),
            }
            .settle(next),
            Residual::Not { inner, start } => Residual::Not {
                inner: Box::new(inner.derive(c, pos)),
                start,
            }
            .settle(next),
            Residual::Peek { inner, start } => Residual::Peek {
                inner: Box::new(inner.derive(c, pos)),
                start,
            }
            .settle(next),
            Residual::Regex {
                pattern,
                start,
                mut buffer,
            } => {
                buffer.push(c);
                Residual::Regex {
                    pattern,
                    start,
                    buffer,
                }
            }
        }
    }

    /// Resolve what can be resolved at `pos`, the current position
    fn settle(self, pos: usize) -> Residual {
        match self {
            Residual::Then {
                head,
                cont,
                fallback,
                mut forks,
            } => match *head {
                Residual::Done(None) => Residual::Done(fallback),
                Residual::Done(Some(end)) => {
                    if let Some(i) = forks.iter().position(|(at, _)| *at == end) {
                        forks.swap_remove(i).1
                    } else if end == pos {
                        cont.start(pos)
                    } else {
                        // a head only settles behind `pos` where a fork was kept
                        Residual::Done(None)
                    }
                }
                head => {
                    if head.may_end_at(pos) && !forks.iter().any(|(at, _)| *at == pos) {
                        forks.push((pos, cont.start(pos)));
                    }
                    let floor = head.earliest_end(pos);
                    forks.retain(|(at, _)| *at >= floor);
                    Residual::Then {
                        head: Box::new(head),
                        cont,
                        fallback,
                        forks,
                    }
                }
            },
            Residual::Or { mut runs } => {
                runs.retain(|run| !matches!(run, Residual::Done(None)));
                if let Some(i) = runs.iter().position(|run| matches!(run, Residual::Done(Some(_)))) {
                    runs.truncate(i + 1);
                }
                match runs.first() {
                    None => Residual::Done(None),
                    Some(Residual::Done(end)) => Residual::Done(*end),
                    Some(_) => Residual::Or { runs },
                }
            }
            Residual::Longest { mut runs } => {
                runs.retain(|run| !matches!(run, Residual::Done(None)));
                if runs.iter().all(|run| matches!(run, Residual::Done(_))) {
                    let ends = runs.iter().map(|run| match run {
                        Residual::Done(end) => *end,
                        _ => None,
                    });
                    Residual::Done(longest_of(ends))
                } else {
                    Residual::Longest { runs }
                }
            }
            Residual::Not { inner, start } => match *inner {
                Residual::Done(Some(_)) => Residual::Done(None),
                Residual::Done(None) => Residual::Done(Some(start)),
                inner => Residual::Not {
                    inner: Box::new(inner),
                    start,
                },
            },
            Residual::Peek { inner, start } => match *inner {
                Residual::Done(Some(_)) => Residual::Done(Some(start)),
                Residual::Done(None) => Residual::Done(None),
                inner => Residual::Peek {
                    inner: Box::new(inner),
                    start,
                },
            },
            other => other,
        }
    }

    /// Verdict when the input ends at `pos`
    fn finish(&self, pos: usize) -> Option<usize> {
        match self {
            Residual::Done(end) => *end,
            Residual::Char(_) | Residual::Literal { .. } | Residual::Count { .. } => None,
            Residual::NotLiteral { first_end, .. } => *first_end,
            Residual::Exact { remaining } => (*remaining == 0).then_some(pos),
            Residual::Then {
                head,
                cont,
                fallback,
                forks,
            } => match head.finish(pos) {
                None => *fallback,
                Some(end) => match forks.iter().find(|(at, _)| *at == end) {
                    Some((_, fork)) => fork.finish(pos),
                    None if end == pos => cont.start(pos).finish(pos),
                    None => None,
                },
            },
            Residual::Or { runs } => runs.iter().find_map(|run| run.finish(pos)),
            Residual::Longest { runs } => longest_of(runs.iter().map(|run| run.finish(pos))),
            Residual::Not { inner, start } => match inner.finish(pos) {
                Some(_) => None,
                None => Some(*start),
            },
            Residual::Peek { inner, start } => inner.finish(pos).map(|_| *start),
            Residual::Regex {
                pattern,
                start,
                buffer,
            } => match &*pattern.node {
                Node::Regex { program, .. } => program.find(buffer).map(|m| start + m.end()),
                _ => None,
            },
        }
    }

    /// Whether this residual, now at `pos`, might still settle on `pos`
    fn may_end_at(&self, pos: usize) -> bool {
        match self {
            Residual::Done(end) => *end == Some(pos),
            Residual::Char(_) | Residual::Literal { .. } | Residual::Count { .. } => false,
            Residual::NotLiteral { first_end, .. } => *first_end == Some(pos),
            Residual::Exact { remaining } => *remaining == 0,
            Residual::Then {
                fallback, forks, ..
            } => *fallback == Some(pos) || forks.iter().any(|(_, fork)| fork.may_end_at(pos)),
            Residual::Or { runs } | Residual::Longest { runs } => {
                runs.iter().any(|run| run.may_end_at(pos))
            }
            Residual::Not { start, .. } | Residual::Peek { start, .. } => *start == pos,
            Residual::Regex { .. } => true,
        }
    }

    /// Lower bound on the end this residual can still settle on
    fn earliest_end(&self, pos: usize) -> usize {
        match self {
            Residual::Done(Some(end)) => *end,
            Residual::Done(None) => usize::MAX,
            Residual::Char(_)
            | Residual::Literal { .. }
            | Residual::Count { .. }
            | Residual::Exact { .. } => pos,
            Residual::NotLiteral { first_end, .. } => first_end.unwrap_or(pos),
            Residual::Then {
                head,
                fallback,
                forks,
                ..
            } => forks
                .iter()
                .map(|(_, fork)| fork.earliest_end(pos))
                .chain(fallback.iter().copied())
                .fold(head.earliest_end(pos), usize::min),
            Residual::Or { runs } | Residual::Longest { runs } => runs
                .iter()
                .map(|run| run.earliest_end(pos))
                .min()
                .unwrap_or(usize::MAX),
            Residual::Not { start, .. }
            | Residual::Peek { start, .. }
            | Residual::Regex { start, .. } => *start,
        }
    }
}

/// Longest end, the earliest candidate winning ties
fn longest_of(ends: impl Iterator<Item = Option<usize>>) -> Option<usize> {
    ends.flatten()
        .fold(None, |best: Option<usize>, end| match best {
            Some(b) if b >= end => Some(b),
            _ => Some(end),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::CharClass;

    fn agree(p: &Pattern, inputs: &[&str]) {
        for input in inputs {
            assert_eq!(
                p.simulate(input),
                p.match_at(input, 0, input.len()),
                "pattern {} on {:?}",
                p,
                input
            );
        }
    }

    #[test]
    fn test_derive_string() {
        let p = Pattern::string("abc");
        assert_eq!(p.derive('a').derive('b').derive('c').outcome(), Some(Some(3)));
        assert_eq!(p.derive('x').outcome(), Some(None));
        assert_eq!(p.derive('a').finish(), None);
    }

    #[test]
    fn test_derive_is_immutable() {
        let p = Pattern::string("ab");
        let after_a = p.derive('a');
        let _ = after_a.derive('x');
        assert_eq!(after_a.derive('b').outcome(), Some(Some(2)));
    }

    #[test]
    fn test_repetition_gives_back_failed_iteration() {
        let p = Pattern::string("ab").many();
        let d = p.derive('a').derive('b').derive('a').derive('x');
        assert_eq!(d.outcome(), Some(Some(2)));
    }

    #[test]
    fn test_choice_priority() {
        let p = Pattern::string("a").or(Pattern::string("ab"));
        assert_eq!(p.simulate("ab"), Some(1));
        let p = Pattern::string("abc").or(Pattern::string("a"));
        assert_eq!(p.simulate("abx"), Some(1));
        assert_eq!(p.simulate("abc"), Some(3));
    }

    #[test]
    fn test_sequence_with_ambiguous_head() {
        let digits = Pattern::class(CharClass::Digit).many();
        let p = digits.next(Pattern::string("5x"));
        // greedy head swallows the 5, so the sequence mismatches
        agree(&p, &["125x", "5x", "12x", ""]);
    }

    #[test]
    fn test_nested_repetition() {
        let p = Pattern::string("a").many().many();
        agree(&p, &["", "a", "aaaa", "aab", "b"]);
        let p = Pattern::string("ab").optional().times(3);
        agree(&p, &["ababab", "abab", "abx", "x"]);
    }

    #[test]
    fn test_lookaround_and_counts() {
        let p = Pattern::sequence([
            Pattern::string("a").peek(),
            Pattern::any_char(),
            Pattern::string("c").not(),
            Pattern::has_at_least(2),
            Pattern::eof(),
        ]);
        agree(&p, &["abb", "acb", "ab", "abbb", "bbb"]);
    }

    #[test]
    fn test_not_string_and_block_comment() {
        let p = Pattern::block_comment("/*", "*/");
        agree(&p, &["/* x */", "/* * / */y", "/* open", "/**/", "//"]);
        let p = Pattern::not_string_case_insensitive("END");
        agree(&p, &["end", "EnX", "e", "", "x"]);
    }

    #[test]
    fn test_longest() {
        let p = Pattern::longest([
            Pattern::string("ab"),
            Pattern::string("a").many1(),
            Pattern::string("abc"),
        ]);
        agree(&p, &["abc", "aaaa", "ab", "a", "x"]);
    }

    #[test]
    fn test_regex_resolves_at_end() {
        let p = Pattern::regex("[a-z]+[0-9]").unwrap().next(Pattern::string("!"));
        agree(&p, &["abc1!", "abc1", "a1!x", "1!"]);
        let d = Pattern::regex("a+").unwrap().derive('a');
        assert_eq!(d.outcome(), None);
        assert_eq!(d.finish(), Some(1));
    }

    #[test]
    fn test_exact_count() {
        let p = Pattern::has_exact(2);
        assert_eq!(p.simulate("ab"), Some(2));
        assert_eq!(p.simulate("abc"), None);
        assert_eq!(p.simulate("a"), None);
    }

    #[test]
    fn test_canned_patterns_agree() {
        agree(
            &Pattern::scientific(),
            &["1.5e-3", "1e10", "1.e5", ".5E+2", "12", "1.5e"],
        );
        agree(&Pattern::double_quote_string(), &[r#""a\"b""#, r#""abc"#, r#""""#]);
        agree(&Pattern::hex_integer(), &["0x1F", "0x", "0X1g"]);
    }
}
