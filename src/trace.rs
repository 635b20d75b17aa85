//! Diagnostic parse trees
//!
//! In [`Mode::Diagnostic`](crate::parameters::Mode::Diagnostic) every
//! labelled parser opens a node when it starts and closes it when it
//! finishes. Nodes of failed or rewound attempts are kept in the builder
//! with a drop stamp, so the tree can be reconstructed as it stood at any
//! earlier moment. That is how the tree attached to a
//! [`ParseError`](crate::error::ParseError) shows the path that was open when
//! the farthest failure was recorded.
//!
//! # Example Output
//!
//! ```text
//! root 0..5
//! `- expr 0..5
//!    |- term 0..1
//!    `- term 4..5
//! ```

use serde::Serialize;
use std::fmt::Write;

/// A node of the diagnostic parse tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTree {
    /// Label of the parser
    pub name: String,
    /// Byte offset where the parser started
    pub begin: usize,
    /// Byte offset where it stopped
    pub end: usize,
    /// Labelled parsers that ran inside it
    pub children: Vec<ParseTree>,
}

impl ParseTree {
    /// Depth-first search for the first node named `name`
    pub fn find(&self, name: &str) -> Option<&ParseTree> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Total number of nodes
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(ParseTree::size).sum::<usize>()
    }

    /// The text this node covers
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.begin..self.end).unwrap_or("")
    }

    /// Render as an ASCII tree
    pub fn ascii_tree(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{} {}..{}", self.name, self.begin, self.end);
        self.write_children(&mut output, "");
        output
    }

    fn write_children(&self, output: &mut String, prefix: &str) {
        for (i, child) in self.children.iter().enumerate() {
            let last = i + 1 == self.children.len();
            let branch = if last { "`- " } else { "|- " };
            let _ = writeln!(
                output,
                "{}{}{} {}..{}",
                prefix, branch, child.name, child.begin, child.end
            );
            let nested = format!("{}{}", prefix, if last { "   " } else { "|  " });
            child.write_children(output, &nested);
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone)]
struct TraceNode {
    name: String,
    begin: usize,
    end: usize,
    parent: usize,
    opened: u64,
    closed: Option<u64>,
    dropped: Option<u64>,
}

/// Records labelled parser activity during one diagnostic parse
#[derive(Debug, Clone)]
pub(crate) struct TraceBuilder {
    nodes: Vec<TraceNode>,
    open: Vec<usize>,
    clock: u64,
    failure_snapshot: Option<u64>,
}

impl TraceBuilder {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![TraceNode {
                name: "root".to_string(),
                begin: 0,
                end: 0,
                parent: 0,
                opened: 0,
                closed: None,
                dropped: None,
            }],
            open: vec![0],
            clock: 0,
            failure_snapshot: None,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Number of nodes ever created, used as a rollback mark
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn enter(&mut self, name: &str, begin: usize) {
        let parent = self.open.last().copied().unwrap_or(0);
        let opened = self.tick();
        self.open.push(self.nodes.len());
        self.nodes.push(TraceNode {
            name: name.to_string(),
            begin,
            end: begin,
            parent,
            opened,
            closed: None,
            dropped: None,
        });
    }

    pub(crate) fn exit(&mut self, end: usize, success: bool) {
        if self.open.len() <= 1 {
            return;
        }
        let stamp = self.tick();
        if let Some(id) = self.open.pop() {
            let node = &mut self.nodes[id];
            node.end = end;
            node.closed = Some(stamp);
            if !success {
                node.dropped = Some(stamp);
            }
        }
    }

    /// Drop closed nodes created since `mark`, after a rewind
    pub(crate) fn rollback(&mut self, mark: usize) {
        let stamp = self.tick();
        for node in self.nodes.iter_mut().skip(mark.max(1)) {
            if node.closed.is_some() && node.dropped.is_none() {
                node.dropped = Some(stamp);
            }
        }
    }

    /// Remember the current shape as the one to show for the farthest failure
    pub(crate) fn mark_failure(&mut self) {
        self.failure_snapshot = Some(self.clock);
    }

    /// The tree as it stood when the farthest failure was recorded
    pub(crate) fn failure_tree(&self, failure_end: usize) -> ParseTree {
        self.freeze(self.failure_snapshot.unwrap_or(self.clock), failure_end)
    }

    /// The tree as it stands now
    pub(crate) fn current_tree(&self, end: usize) -> ParseTree {
        self.freeze(self.clock, end)
    }

    fn freeze(&self, as_of: u64, open_end: usize) -> ParseTree {
        let visible = |node: &TraceNode| {
            node.opened <= as_of && node.dropped.map_or(true, |stamp| stamp > as_of)
        };
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate().skip(1) {
            if visible(node) && visible(&self.nodes[node.parent]) {
                children[node.parent].push(id);
            }
        }
        self.build(0, as_of, open_end, &children)
    }

    fn build(&self, id: usize, as_of: u64, open_end: usize, children: &[Vec<usize>]) -> ParseTree {
        let node = &self.nodes[id];
        let end = match node.closed {
            Some(stamp) if stamp <= as_of => node.end,
            _ => open_end,
        };
        ParseTree {
            name: node.name.clone(),
            begin: node.begin,
            end,
            children: children[id]
                .iter()
                .map(|&child| self.build(child, as_of, open_end, children))
                .collect(),
        }
    }
}
