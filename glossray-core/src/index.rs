//! Augmented interval tree: the canonical store for one document's spans.
//!
//! # Layout
//!
//! ```text
//!                 [14,24) max_end=40
//!                /                 \
//!     [0,8) max_end=11        [30,40) max_end=40
//!           \                   /
//!        [4,11) max_end=11  [25,28) max_end=28
//! ```
//!
//! Nodes live in an arena (`Vec`) and are linked by index. The arena slot of a
//! node doubles as its [`EntryId`], which is also its insertion sequence
//! number. The tree is an AVL tree keyed by `(start, entry id)`, so equal
//! starts stay in insertion order. Every node caches the maximum `end` in its
//! subtree; overlap queries skip any subtree whose `max_end` is at or before
//! the query start.
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `insert` | O(log n) |
//! | `overlapping` / `containing` | O(log n + k) |
//! | `all` | O(n), lazy |
//!
//! Spans are never removed. Losing mentions and skipped tokens are filtered
//! by the consumers of the index, not deleted from it.

use crate::entity::Mention;
use crate::error::Result;
use crate::span::TextSpan;
use crate::token::TokenAnnotation;
use crate::EntryId;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

// =============================================================================
// Document payload
// =============================================================================

/// Payload stored for every span of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    /// Named-entity mention (X-Ray)
    Mention(Mention),
    /// Token with gloss candidates (Word-Wise)
    Token(TokenAnnotation),
}

impl Annotation {
    /// The mention, if this is one.
    #[must_use]
    pub fn as_mention(&self) -> Option<&Mention> {
        match self {
            Annotation::Mention(m) => Some(m),
            Annotation::Token(_) => None,
        }
    }

    /// The token, if this is one.
    #[must_use]
    pub fn as_token(&self) -> Option<&TokenAnnotation> {
        match self {
            Annotation::Token(t) => Some(t),
            Annotation::Mention(_) => None,
        }
    }

    /// Span of the payload.
    #[must_use]
    pub fn span(&self) -> TextSpan {
        match self {
            Annotation::Mention(m) => m.span,
            Annotation::Token(t) => t.span,
        }
    }
}

/// Interval index holding every mention and token of one document.
pub type DocumentIndex = IntervalIndex<Annotation>;

impl IntervalIndex<Annotation> {
    /// Mentions in ascending start order.
    pub fn mentions(&self) -> impl Iterator<Item = (EntryId, &Mention)> + '_ {
        self.all()
            .filter_map(|e| e.value.as_mention().map(|m| (e.id, m)))
    }

    /// Tokens in ascending start order.
    pub fn tokens(&self) -> impl Iterator<Item = (EntryId, &TokenAnnotation)> + '_ {
        self.all().filter_map(|e| e.value.as_token().map(|t| (e.id, t)))
    }
}

// =============================================================================
// Interval tree
// =============================================================================

#[derive(Debug, Clone)]
struct Node<T> {
    span: TextSpan,
    value: T,
    left: Option<usize>,
    right: Option<usize>,
    height: u32,
    max_end: usize,
}

/// An entry returned by index queries.
#[derive(Debug)]
pub struct Entry<'a, T> {
    /// Stable id (insertion sequence number)
    pub id: EntryId,
    /// Span of the entry
    pub span: TextSpan,
    /// Stored payload
    pub value: &'a T,
}

impl<T> Clone for Entry<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Entry<'_, T> {}

/// Balanced interval tree keyed by span start.
#[derive(Debug, Clone)]
pub struct IntervalIndex<T> {
    nodes: Vec<Node<T>>,
    root: Option<usize>,
}

impl<T> Default for IntervalIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntervalIndex<T> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Create an empty index with room for `capacity` spans.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Number of stored spans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a span and return its entry id.
    pub fn insert(&mut self, span: TextSpan, value: T) -> EntryId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            span,
            value,
            left: None,
            right: None,
            height: 1,
            max_end: span.end(),
        });
        let root = self.root;
        self.root = Some(self.insert_at(root, id));
        id
    }

    /// Insert raw offsets, failing with `InvalidSpan` unless `start < end`.
    pub fn try_insert(&mut self, start: usize, end: usize, value: T) -> Result<EntryId> {
        let span = TextSpan::new(start, end)?;
        Ok(self.insert(span, value))
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<Entry<'_, T>> {
        (id < self.nodes.len()).then(|| self.entry(id))
    }

    /// All spans intersecting `query`, by start then insertion order.
    #[must_use]
    pub fn overlapping(&self, query: TextSpan) -> Vec<Entry<'_, T>> {
        self.query(query.start(), query.end())
    }

    /// All spans with `start <= point < end`, by start then insertion order.
    #[must_use]
    pub fn containing(&self, point: usize) -> Vec<Entry<'_, T>> {
        match point.checked_add(1) {
            Some(end) => self.query(point, end),
            None => Vec::new(),
        }
    }

    /// Lazy in-order traversal. Call again to restart.
    #[must_use]
    pub fn all(&self) -> Iter<'_, T> {
        Iter {
            index: self,
            stack: Vec::new(),
            next: self.root,
            remaining: self.nodes.len(),
        }
    }

    fn entry(&self, id: usize) -> Entry<'_, T> {
        let node = &self.nodes[id];
        Entry {
            id,
            span: node.span,
            value: &node.value,
        }
    }

    fn query(&self, start: usize, end: usize) -> Vec<Entry<'_, T>> {
        let mut out = Vec::new();
        self.collect(self.root, start, end, &mut out);
        out
    }

    fn collect<'a>(&'a self, node: Option<usize>, start: usize, end: usize, out: &mut Vec<Entry<'a, T>>) {
        let Some(n) = node else {
            return;
        };
        let current = &self.nodes[n];
        if current.max_end <= start {
            return;
        }
        self.collect(current.left, start, end, out);
        // Right subtree starts at or after this node, so it is pruned together
        // with this node once starts pass the query end.
        if current.span.start() < end {
            if start < current.span.end() {
                out.push(self.entry(n));
            }
            self.collect(current.right, start, end, out);
        }
    }

    fn key(&self, id: usize) -> (usize, usize) {
        (self.nodes[id].span.start(), id)
    }

    fn height(&self, node: Option<usize>) -> u32 {
        node.map_or(0, |n| self.nodes[n].height)
    }

    fn max_end(&self, node: Option<usize>) -> usize {
        node.map_or(0, |n| self.nodes[n].max_end)
    }

    fn insert_at(&mut self, node: Option<usize>, id: usize) -> usize {
        let Some(n) = node else {
            return id;
        };
        if self.key(id) < self.key(n) {
            let left = self.nodes[n].left;
            let new_left = self.insert_at(left, id);
            self.nodes[n].left = Some(new_left);
        } else {
            let right = self.nodes[n].right;
            let new_right = self.insert_at(right, id);
            self.nodes[n].right = Some(new_right);
        }
        self.rebalance(n)
    }

    fn update(&mut self, n: usize) {
        let (left, right) = (self.nodes[n].left, self.nodes[n].right);
        let height = 1 + self.height(left).max(self.height(right));
        let max_end = self.nodes[n]
            .span
            .end()
            .max(self.max_end(left))
            .max(self.max_end(right));
        let node = &mut self.nodes[n];
        node.height = height;
        node.max_end = max_end;
    }

    fn balance_factor(&self, n: usize) -> i64 {
        i64::from(self.height(self.nodes[n].left)) - i64::from(self.height(self.nodes[n].right))
    }

    fn rotate_right(&mut self, n: usize) -> usize {
        let Some(l) = self.nodes[n].left else {
            return n;
        };
        self.nodes[n].left = self.nodes[l].right;
        self.nodes[l].right = Some(n);
        self.update(n);
        self.update(l);
        l
    }

    fn rotate_left(&mut self, n: usize) -> usize {
        let Some(r) = self.nodes[n].right else {
            return n;
        };
        self.nodes[n].right = self.nodes[r].left;
        self.nodes[r].left = Some(n);
        self.update(n);
        self.update(r);
        r
    }

    fn rebalance(&mut self, n: usize) -> usize {
        self.update(n);
        let balance = self.balance_factor(n);
        if balance > 1 {
            if let Some(l) = self.nodes[n].left {
                if self.balance_factor(l) < 0 {
                    let new_left = self.rotate_left(l);
                    self.nodes[n].left = Some(new_left);
                }
            }
            return self.rotate_right(n);
        }
        if balance < -1 {
            if let Some(r) = self.nodes[n].right {
                if self.balance_factor(r) > 0 {
                    let new_right = self.rotate_right(r);
                    self.nodes[n].right = Some(new_right);
                }
            }
            return self.rotate_left(n);
        }
        n
    }
}

impl<'a, T> IntoIterator for &'a IntervalIndex<T> {
    type Item = Entry<'a, T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}

/// In-order iterator over an [`IntervalIndex`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    index: &'a IntervalIndex<T>,
    stack: Vec<usize>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = Entry<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(n) = self.next {
            self.stack.push(n);
            self.next = self.index.nodes[n].left;
        }
        let n = self.stack.pop()?;
        self.next = self.index.nodes[n].right;
        self.remaining -= 1;
        Some(self.index.entry(n))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// =============================================================================
// Tests
// =============================================================================
