//! Flat syntax trees.
//!
//! A tree is a pre-order array of nodes. Each node stores how many direct
//! children it has; its descendants follow it contiguously, so a subtree is
//! an index range and copying one is a slice copy.

use std::fmt::Write as _;
use std::ops::Range;

use super::error::show_byte;
use super::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    /// Root of one definition: a `Declaration` followed by the body items.
    Definition,
    /// The defined name; its text is the node's span.
    Declaration,
    /// Use of another pattern by name; its text is the node's span.
    LiteralReference,
    LiteralCharacter(u8),
    LiteralString(Vec<u8>),
    LiteralRange { low: u8, high: u8 },
    LiteralWildcard,
    Or,
    Group,
    RepeatFixed(u32),
    RepeatRange { min: u32, max: u32 },
    RepeatInfinite { min: u32 },
}

impl ObjectKind {
    pub fn is_repeat(&self) -> bool {
        matches!(
            self,
            ObjectKind::RepeatFixed(_)
                | ObjectKind::RepeatRange { .. }
                | ObjectKind::RepeatInfinite { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: ObjectKind,
    pub span: Span,
    pub child_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &SyntaxNode {
        &self.nodes[index]
    }

    /// Number of nodes in the subtree rooted at `index`, the root included.
    pub fn subtree_len(&self, index: usize) -> usize {
        let mut pending = 1usize;
        let mut cursor = index;
        while pending > 0 {
            pending = pending - 1 + self.nodes[cursor].child_count as usize;
            cursor += 1;
        }
        cursor - index
    }

    /// Index range of the subtree rooted at `index`.
    pub fn subtree(&self, index: usize) -> Range<usize> {
        index..index + self.subtree_len(index)
    }

    /// Indices of the direct children of `index`, in source order.
    pub fn children(&self, index: usize) -> Children<'_> {
        Children {
            tree: self,
            next: index + 1,
            remaining: self.nodes[index].child_count,
        }
    }

    pub fn copy_subtree(&self, index: usize) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes[self.subtree(index)].to_vec(),
        }
    }

    /// Root indices of the trees concatenated in this arena.
    pub fn definitions(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = 0;
        std::iter::from_fn(move || {
            if cursor >= self.nodes.len() {
                return None;
            }
            let root = cursor;
            cursor += self.subtree_len(root);
            Some(root)
        })
    }

    /// Name declared by the definition rooted at node 0.
    pub fn name<'s>(&self, source: &'s str) -> Option<&'s str> {
        match self.nodes.get(1) {
            Some(SyntaxNode {
                kind: ObjectKind::Declaration,
                span,
                ..
            }) if self.nodes[0].kind == ObjectKind::Definition => Some(span.text(source)),
            _ => None,
        }
    }

    /// S-expression rendering, for debug output and tests.
    pub fn summary(&self, source: &str) -> String {
        let mut out = String::new();
        let mut roots = self.definitions().peekable();
        while let Some(root) = roots.next() {
            self.write_summary(root, source, &mut out);
            if roots.peek().is_some() {
                out.push(' ');
            }
        }
        out
    }

    fn write_summary(&self, index: usize, source: &str, out: &mut String) {
        let node = &self.nodes[index];
        let head = match &node.kind {
            ObjectKind::Definition => "def".to_string(),
            ObjectKind::Declaration => format!("decl:{}", node.span.text(source)),
            ObjectKind::LiteralReference => format!("ref:{}", node.span.text(source)),
            ObjectKind::LiteralCharacter(byte) => format!("char:'{}'", show_byte(byte)),
            ObjectKind::LiteralString(bytes) => {
                let text: String = bytes.iter().map(show_byte).collect();
                format!("str:\"{text}\"")
            }
            ObjectKind::LiteralRange { low, high } => {
                format!("range:'{}'..'{}'", show_byte(low), show_byte(high))
            }
            ObjectKind::LiteralWildcard => "any".to_string(),
            ObjectKind::Or => "or".to_string(),
            ObjectKind::Group => "group".to_string(),
            ObjectKind::RepeatFixed(n) => format!("repeat{{{n}}}"),
            ObjectKind::RepeatRange { min, max } => format!("repeat{{{min},{max}}}"),
            ObjectKind::RepeatInfinite { min } => format!("repeat{{{min},}}"),
        };

        if node.child_count == 0 {
            out.push_str(&head);
            return;
        }
        let _ = write!(out, "({head}");
        for child in self.children(index) {
            out.push(' ');
            self.write_summary(child, source, out);
        }
        out.push(')');
    }
}

pub struct Children<'t> {
    tree: &'t SyntaxTree,
    next: usize,
    remaining: u32,
}

impl Iterator for Children<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let child = self.next;
        self.remaining -= 1;
        self.next += self.tree.subtree_len(child);
        Some(child)
    }
}

/// Appends nodes in pre-order while tracking the open parents.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<SyntaxNode>,
    parents: Vec<usize>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next added node will get.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a childless node under the current parent.
    pub fn add(&mut self, kind: ObjectKind, span: Span) -> usize {
        let index = self.nodes.len();
        self.nodes.push(SyntaxNode {
            kind,
            span,
            child_count: 0,
        });
        if let Some(&parent) = self.parents.last() {
            self.nodes[parent].child_count += 1;
        }
        index
    }

    /// Make the most recently added node the current parent.
    pub fn push(&mut self) {
        debug_assert!(!self.nodes.is_empty(), "push without a node");
        self.parents.push(self.nodes.len() - 1);
    }

    pub fn pop(&mut self) {
        self.parents.pop();
    }

    /// Insert a node at `first` that adopts the `count` sibling subtrees
    /// starting there.
    ///
    /// The siblings must be the trailing children of the current parent.
    pub fn wrap(&mut self, first: usize, count: u32, kind: ObjectKind, span: Span) {
        debug_assert!(first <= self.nodes.len());
        debug_assert!(self.parents.last().is_none_or(|&parent| parent < first));
        self.nodes.insert(
            first,
            SyntaxNode {
                kind,
                span,
                child_count: count,
            },
        );
        if let Some(&parent) = self.parents.last() {
            let node = &mut self.nodes[parent];
            node.child_count = node.child_count + 1 - count;
        }
    }

    /// Set the span of an already added node.
    pub fn set_span(&mut self, index: usize, span: Span) {
        self.nodes[index].span = span;
    }

    pub fn finish(self) -> SyntaxTree {
        debug_assert!(self.parents.is_empty(), "unbalanced push/pop");
        SyntaxTree { nodes: self.nodes }
    }
}
