//! Validity repair.
//!
//! A structural edit can leave a list in a shape its grammar cannot print: a binary chain that
//! ends in an operator, a record missing a mandatory field, a declaration without a keyword.
//! [`make_valid`] asks the grammar's shape table what each list needs and splices placeholder
//! nodes into exactly the missing slots. [`doc_with_all_placeholders`] then round-trips the
//! repaired tree through the printer and parser so that ranges and text agree again.
//!
//! Before typed text is reparsed, the placeholders the user is typing over are cut out again
//! with [`doc_without_placeholders_near`].

use std::sync::Arc;

use tracing::trace;

use crate::error::EngineError;
use crate::grammar::{Grammar, ListShape};
use crate::node::{Doc, ListNode, Node, TextRange, TokenNode, check_struct_keys};
use crate::path::Path;
use crate::path_mapper::PathMapper;
use crate::text::{delete_ranges, map_node_ranges};

struct Slot {
    old: Option<usize>,
    node: Node,
    key: Option<&'static str>,
    records: Vec<Record>,
}

/// `(old relative path, new relative path, removed)`
type Record = (Path, Path, bool);

impl Slot {
    fn placeholder(template: &Node, key: Option<&'static str>) -> Self {
        Slot {
            old: None,
            node: template.with_fresh_ids().into_placeholder(),
            key,
            records: Vec::new(),
        }
    }
}

/// Splice placeholders into every slot the grammar requires, and drop invisible lists.
///
/// Returns the repaired root and a mapper from old to new paths.
pub fn make_valid<G: Grammar + ?Sized>(
    grammar: &G,
    root: &Arc<ListNode>,
) -> Result<(Arc<ListNode>, PathMapper), EngineError> {
    let (node, records) = repair(grammar, &Node::List(root.clone()), true);
    let mut mapper = PathMapper::new();
    for (old, new, removed) in records {
        if removed {
            mapper.record_removed(old, new);
        } else {
            mapper.record(old, new);
        }
    }
    check_struct_keys(&node)?;
    match node {
        Node::List(list) => Ok((list, mapper)),
        Node::Token(_) => Err(EngineError::RootNotList),
    }
}

fn is_invisible(node: &Node) -> bool {
    matches!(node, Node::List(list) if list.equivalent_to_content && list.content.is_empty())
}

fn repair<G: Grammar + ?Sized>(grammar: &G, node: &Node, is_root: bool) -> (Node, Vec<Record>) {
    let Node::List(list) = node else {
        return (node.clone(), Vec::new());
    };

    let mut changed = false;
    let mut records = Vec::new();
    let mut kept = Vec::with_capacity(list.content.len());
    for (i, child) in list.content.iter().enumerate() {
        if is_invisible(child) {
            changed = true;
            records.push((vec![i], vec![], true));
            continue;
        }
        let (new_child, child_records) = repair(grammar, child, false);
        changed |= !new_child.ptr_eq(child);
        kept.push(Slot {
            old: Some(i),
            node: new_child,
            key: list.struct_key(i),
            records: child_records,
        });
    }

    let shaped = apply_shape(grammar.list_shape(list), kept);
    changed |= shaped.iter().enumerate().any(|(j, s)| s.old != Some(j));
    if shaped.len() != list.content.len() {
        changed = true;
    }

    let mut content = Vec::with_capacity(shaped.len());
    let mut keys = list.struct_keys.as_ref().map(|_| Vec::new());
    for (j, slot) in shaped.into_iter().enumerate() {
        if let Some(i) = slot.old {
            if i != j {
                records.push((vec![i], vec![j], false));
            }
            for (old, new, removed) in slot.records {
                records.push((prefixed(i, &old), prefixed(j, &new), removed));
            }
        } else {
            trace!(list = list.id.get(), index = j, "inserted placeholder");
        }
        if let (Some(keys), Some(key)) = (&mut keys, slot.key) {
            keys.push(key);
        }
        content.push(slot.node);
    }

    let new_list = if changed {
        Arc::new(list.with_content(content, keys))
    } else {
        list.clone()
    };

    if !is_root && new_list.content.len() == 1 && grammar.collapses_singleton(&new_list) {
        let child = new_list.content[0].clone();
        let mut collapsed: Vec<Record> = records
            .into_iter()
            .map(|(old, new, removed)| {
                let new = if new.first() == Some(&0) { new[1..].to_vec() } else { new };
                (old, new, removed)
            })
            .collect();
        if let Some(i) = list.content.iter().position(|c| c.id() == child.id()) {
            collapsed.push((vec![i], vec![], false));
        }
        trace!(list = list.id.get(), "collapsed singleton list");
        return (child, collapsed);
    }

    (Node::List(new_list), records)
}

fn prefixed(index: usize, rest: &[usize]) -> Path {
    let mut path = Vec::with_capacity(rest.len() + 1);
    path.push(index);
    path.extend_from_slice(rest);
    path
}

fn apply_shape(shape: ListShape, kept: Vec<Slot>) -> Vec<Slot> {
    match shape {
        ListShape::Free => kept,
        ListShape::NonEmpty { placeholder } => {
            if kept.is_empty() {
                vec![Slot::placeholder(&placeholder, None)]
            } else {
                kept
            }
        }
        ListShape::Alternating {
            operand,
            operator,
            is_operator,
        } => {
            let mut out = Vec::with_capacity(kept.len() + 1);
            let mut expect_operand = true;
            for slot in kept {
                let slot_is_operator = is_operator(&slot.node);
                if expect_operand && slot_is_operator {
                    out.push(Slot::placeholder(&operand, None));
                } else if !expect_operand && !slot_is_operator {
                    out.push(Slot::placeholder(&operator, None));
                }
                expect_operand = slot_is_operator;
                out.push(slot);
            }
            if expect_operand && !out.is_empty() {
                out.push(Slot::placeholder(&operand, None));
            }
            out
        }
        ListShape::Record { slots } => {
            let mut kept: Vec<Option<Slot>> = kept.into_iter().map(Some).collect();
            let mut out = Vec::with_capacity(slots.len());
            for record_slot in &slots {
                let existing = kept
                    .iter_mut()
                    .find(|s| s.as_ref().is_some_and(|s| s.key == Some(record_slot.key)))
                    .and_then(Option::take);
                match (existing, &record_slot.default) {
                    (Some(slot), _) => out.push(slot),
                    (None, Some(default)) => out.push(Slot::placeholder(default, Some(record_slot.key))),
                    (None, None) => {}
                }
            }
            out.extend(kept.into_iter().flatten());
            out
        }
        ListShape::Headed { head, is_head, tail } => {
            let mut out = Vec::with_capacity(kept.len() + 2);
            if !kept.first().is_some_and(|s| is_head(&s.node)) {
                out.push(Slot::placeholder(&head, None));
            }
            out.extend(kept);
            if let Some(tail) = tail
                && out.len() == 1
            {
                out.push(Slot::placeholder(&tail, None));
            }
            out
        }
    }
}

/// Remove every node for which `keep` returns `false` (never the root).
///
/// Returns the filtered tree, a path mapper and the text ranges of the removed nodes.
pub fn filter_nodes(
    root: &Node,
    keep: &dyn Fn(&Node) -> bool,
) -> (Node, PathMapper, Vec<TextRange>) {
    let mut mapper = PathMapper::new();
    let mut removed = Vec::new();
    let mut old_path = Vec::new();
    let node = filter_at(root, keep, &mut old_path, &[], &mut mapper, &mut removed);
    (node, mapper, removed)
}

fn filter_at(
    node: &Node,
    keep: &dyn Fn(&Node) -> bool,
    old_path: &mut Path,
    new_path: &[usize],
    mapper: &mut PathMapper,
    removed: &mut Vec<TextRange>,
) -> Node {
    let Node::List(list) = node else {
        return node.clone();
    };
    let mut changed = false;
    let mut content = Vec::with_capacity(list.content.len());
    let mut keys = list.struct_keys.as_ref().map(|_| Vec::new());
    for (i, child) in list.content.iter().enumerate() {
        old_path.push(i);
        if !keep(child) {
            removed.push(child.range());
            mapper.record_removed(old_path.clone(), new_path.to_vec());
            changed = true;
            old_path.pop();
            continue;
        }
        let mut child_new_path = new_path.to_vec();
        child_new_path.push(content.len());
        if i != content.len() {
            mapper.record(old_path.clone(), child_new_path.clone());
        }
        let new_child = filter_at(child, keep, old_path, &child_new_path, mapper, removed);
        changed |= !new_child.ptr_eq(child);
        content.push(new_child);
        if let (Some(keys), Some(key)) = (&mut keys, list.struct_key(i)) {
            keys.push(key);
        }
        old_path.pop();
    }
    if changed {
        Node::List(Arc::new(list.with_content(content, keys)))
    } else {
        node.clone()
    }
}

/// Copy identities and placeholder flags from `from` onto the same-shaped tree `to`.
///
/// Ranges come from `to`. Any difference in shape is fatal.
pub fn copy_placeholders_and_ids(from: &Node, to: &Node) -> Result<Node, EngineError> {
    let mut path = Vec::new();
    copy_at(from, to, &mut path)
}

fn copy_at(from: &Node, to: &Node, path: &mut Path) -> Result<Node, EngineError> {
    match (from, to) {
        (Node::Token(a), Node::Token(b)) if a.kind == b.kind && a.text == b.text => {
            Ok(Node::Token(Arc::new(TokenNode {
                id: a.id,
                is_placeholder: a.is_placeholder,
                ..(**b).clone()
            })))
        }
        (Node::List(a), Node::List(b))
            if a.kind == b.kind
                && a.delimiters == b.delimiters
                && a.equivalent_to_content == b.equivalent_to_content
                && a.struct_keys == b.struct_keys
                && a.content.len() == b.content.len() =>
        {
            let mut content = Vec::with_capacity(b.content.len());
            for (i, (x, y)) in a.content.iter().zip(&b.content).enumerate() {
                path.push(i);
                content.push(copy_at(x, y, path)?);
                path.pop();
            }
            Ok(Node::List(Arc::new(ListNode {
                id: a.id,
                is_placeholder: a.is_placeholder,
                ..b.with_content(content, b.struct_keys.clone())
            })))
        }
        _ => Err(EngineError::ShapeMismatch(path.clone())),
    }
}

/// Repair `doc`, reprint it and reparse it, keeping identities and placeholder flags.
pub fn doc_with_all_placeholders<G: Grammar + ?Sized>(
    grammar: &G,
    doc: &Doc,
) -> Result<(Doc, PathMapper), EngineError> {
    reprint_with_placeholders(grammar, &doc.root)
}

/// Like [`doc_with_all_placeholders`] for a freshly edited root that has no text yet.
pub fn reprint_with_placeholders<G: Grammar + ?Sized>(
    grammar: &G,
    root: &Arc<ListNode>,
) -> Result<(Doc, PathMapper), EngineError> {
    let (valid_root, mapper) = make_valid(grammar, root)?;
    let text = grammar.print(&valid_root);
    let reparsed = grammar.parse(&text)?;
    let root = copy_placeholders_and_ids(&Node::List(valid_root), &reparsed.root_node())?;
    Ok((Doc::from_node(root, reparsed.text)?, mapper))
}

/// A document with some placeholders cut out of both its tree and its text.
#[derive(Debug, Clone)]
pub struct StrippedDoc {
    /// Tree and text without the removed placeholders. The tree may not be printable.
    pub doc: Doc,
    /// Old-path to new-path mapping.
    pub mapper: PathMapper,
    /// The requested positions, mapped onto the new text.
    pub positions: Vec<usize>,
}

/// Remove the placeholders that touch one of `positions`, ignoring surrounding whitespace.
///
/// These are the placeholders the user is typing over; all others stay.
pub fn doc_without_placeholders_near(doc: &Doc, positions: &[usize]) -> StrippedDoc {
    let windows: Vec<TextRange> = positions
        .iter()
        .map(|&p| whitespace_window(&doc.text, p))
        .collect();
    let touches = |range: TextRange| {
        windows.iter().any(|w| {
            (w.pos <= range.pos && range.pos <= w.end) || (w.pos <= range.end && range.end <= w.end)
        })
    };
    strip(doc, positions, &|node| !(node.is_placeholder() && touches(node.range())))
}

/// Remove every placeholder.
pub fn doc_without_placeholders(doc: &Doc) -> StrippedDoc {
    strip(doc, &[], &|node| !node.is_placeholder())
}

fn strip(doc: &Doc, positions: &[usize], keep: &dyn Fn(&Node) -> bool) -> StrippedDoc {
    let (root, mapper, removed) = filter_nodes(&doc.root_node(), keep);
    let (text, deletions) = delete_ranges(&doc.text, &removed);
    let map = |pos| deletions.map(pos);
    let root = map_node_ranges(&root, &map, &map);
    let root = match root {
        Node::List(list) => list,
        Node::Token(_) => doc.root.clone(),
    };
    StrippedDoc {
        doc: Doc::new(root, text),
        mapper,
        positions: positions.iter().map(|&p| deletions.map(p)).collect(),
    }
}

fn whitespace_window(text: &str, pos: usize) -> TextRange {
    let bytes = text.as_bytes();
    let pos = pos.min(bytes.len());
    let mut start = pos;
    while start > 0 && bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    let mut end = pos;
    while end < bytes.len() && bytes[end].is_ascii_whitespace() {
        end += 1;
    }
    TextRange::new(start, end)
}
