//! Text-level helpers: batched insertions, deletions and node range remapping.

use std::sync::Arc;

use crate::node::{ListNode, Node, TextRange, TokenNode};

/// Raw text typed at a position of the pre-edit text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Byte offset into the pre-edit text.
    pub position: usize,
    /// Inserted text.
    pub text: String,
}

/// Old-position to new-position mapping for a batch of insertions sorted by position.
///
/// Starts and ends are mapped differently at an insertion point: a node that starts there is
/// pushed behind the inserted text, a node that ends there keeps its end.
#[derive(Debug, Clone)]
pub(crate) struct InsertionShift {
    points: Vec<(usize, usize)>,
}

impl InsertionShift {
    pub(crate) fn new(insertions: &[Insertion]) -> Self {
        Self {
            points: insertions
                .iter()
                .map(|i| (i.position, i.text.len()))
                .collect(),
        }
    }

    pub(crate) fn map_start(&self, pos: usize) -> usize {
        pos + self
            .points
            .iter()
            .filter(|(at, _)| *at <= pos)
            .map(|(_, len)| len)
            .sum::<usize>()
    }

    pub(crate) fn map_end(&self, end: usize) -> usize {
        end + self
            .points
            .iter()
            .filter(|(at, _)| *at < end)
            .map(|(_, len)| len)
            .sum::<usize>()
    }

    /// Where the `index`-th insertion lands in the new text.
    pub(crate) fn inserted_range(&self, index: usize) -> TextRange {
        let (at, len) = self.points[index];
        let before: usize = self.points[..index].iter().map(|(_, len)| len).sum();
        let pos = at + before;
        TextRange::new(pos, pos + len)
    }
}

/// Apply insertions to `text` in position order; insertions at the same position keep their
/// batch order.
pub fn apply_insertions(text: &str, insertions: &[Insertion]) -> String {
    let mut sorted: Vec<&Insertion> = insertions.iter().collect();
    sorted.sort_by_key(|i| i.position);
    let mut out = String::with_capacity(text.len() + insertions.iter().map(|i| i.text.len()).sum::<usize>());
    let mut last = 0;
    for insertion in sorted {
        let at = insertion.position.min(text.len());
        out.push_str(&text[last..at]);
        out.push_str(&insertion.text);
        last = at;
    }
    out.push_str(&text[last..]);
    out
}

/// Positions in a text that had ranges cut out of it.
#[derive(Debug, Clone, Default)]
pub struct DeletionMap {
    deleted: Vec<TextRange>,
}

impl DeletionMap {
    /// New position of `pos`; positions inside a deleted range collapse to its start.
    pub fn map(&self, pos: usize) -> usize {
        let mut removed = 0;
        for range in &self.deleted {
            if range.end <= pos {
                removed += range.len();
            } else if range.pos < pos {
                removed += pos - range.pos;
            }
        }
        pos - removed
    }
}

/// Remove `ranges` from `text`. Overlapping and unsorted ranges are merged first.
pub fn delete_ranges(text: &str, ranges: &[TextRange]) -> (String, DeletionMap) {
    let mut sorted: Vec<TextRange> = ranges.iter().copied().filter(|r| !r.is_empty()).collect();
    sorted.sort();
    let mut merged: Vec<TextRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.pos <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for range in &merged {
        out.push_str(&text[last..range.pos]);
        last = range.end;
    }
    out.push_str(&text[last.min(text.len())..]);
    (out, DeletionMap { deleted: merged })
}

/// Rebuild `node` with every range start and end remapped. Identities are kept.
pub fn map_node_ranges(
    node: &Node,
    map_start: &dyn Fn(usize) -> usize,
    map_end: &dyn Fn(usize) -> usize,
) -> Node {
    match node {
        Node::Token(t) => Node::Token(Arc::new(TokenNode {
            range: TextRange::new(map_start(t.range.pos), map_end(t.range.end)),
            ..(**t).clone()
        })),
        Node::List(l) => {
            let content = l
                .content
                .iter()
                .map(|child| map_node_ranges(child, map_start, map_end))
                .collect();
            Node::List(Arc::new(ListNode {
                range: TextRange::new(map_start(l.range.pos), map_end(l.range.end)),
                ..l.with_content(content, l.struct_keys.clone())
            }))
        }
    }
}
