//! Insertion soundness check.
//!
//! Typed text is committed by reparsing the whole document. The reparse is only accepted if
//! every node of the old tree shows up again, unchanged, at the position the typed text pushed
//! it to: typing may add nodes but never silently merge into, split or reinterpret existing
//! ones. Accepted reparses inherit the old identities so that marks keep working.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::node::{Doc, Node, NodeId, SyntaxKind, TextRange};
use crate::path::{EvenPathRange, Path, smallest_containing_range};
use crate::text::{Insertion, InsertionShift};

/// Why a reparse was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertionError {
    /// An insertion points past the end of the text.
    #[error("insertion at {position} is outside the text (length {len})")]
    OutOfRange {
        /// Requested position.
        position: usize,
        /// Text length.
        len: usize,
    },
    /// The typed text changed an existing node.
    #[error("existing node at {0:?} was changed by the typed text")]
    UnmatchedOldNode(Path),
    /// An existing node matches more than one node of the reparse.
    #[error("existing node at {0:?} matches more than one new node")]
    AmbiguousMatch(Path),
    /// The typed text did not produce any node.
    #[error("insertion {0} did not produce any node")]
    EmptyInsertion(usize),
}

/// A reparse that passed [`check_insertion`].
#[derive(Debug, Clone)]
pub struct CheckedInsertion {
    /// The reparsed document with old identities restored.
    pub doc: Doc,
    /// Per insertion, in the order given: the nodes it created.
    pub inserted: Vec<EvenPathRange>,
}

struct Traced {
    path: Path,
    id: NodeId,
    is_placeholder: bool,
    expected: TextRange,
    kind: SyntaxKind,
}

/// Verify that `new` is `old` with `insertions` typed into it.
pub fn check_insertion(
    old: &Doc,
    insertions: &[Insertion],
    new: &Doc,
) -> Result<CheckedInsertion, InsertionError> {
    for insertion in insertions {
        if insertion.position > old.text.len() {
            return Err(InsertionError::OutOfRange {
                position: insertion.position,
                len: old.text.len(),
            });
        }
    }

    let mut order: Vec<usize> = (0..insertions.len()).collect();
    order.sort_by_key(|&i| insertions[i].position);
    let sorted: Vec<Insertion> = order.iter().map(|&i| insertions[i].clone()).collect();
    let shift = InsertionShift::new(&sorted);

    let mut traced = Vec::new();
    old.root_node().visit_deep(&mut |node, path| {
        if path.is_empty() || node.is_transparent() || (node.is_placeholder() && node.range().is_empty()) {
            return;
        }
        let range = node.range();
        traced.push(Traced {
            path: path.to_vec(),
            id: node.id(),
            is_placeholder: node.is_placeholder(),
            expected: TextRange::new(shift.map_start(range.pos), shift.map_end(range.end)),
            kind: node.kind(),
        });
    });

    let mut candidates: HashMap<(TextRange, SyntaxKind), Vec<Path>> = HashMap::new();
    let new_root = new.root_node();
    new_root.visit_deep(&mut |node, path| {
        if !path.is_empty() {
            candidates
                .entry((node.range(), node.kind()))
                .or_default()
                .push(path.to_vec());
        }
    });

    let mut identities: HashMap<Path, (NodeId, bool)> = HashMap::new();
    identities.insert(Vec::new(), (old.root.id, old.root.is_placeholder));
    for node in &traced {
        let matches: Vec<&Path> = candidates
            .get(&(node.expected, node.kind))
            .map(|paths| paths.iter().filter(|p| !identities.contains_key(*p)).collect())
            .unwrap_or_default();
        match matches.as_slice() {
            [only] => {
                identities.insert((*only).clone(), (node.id, node.is_placeholder));
            }
            [] => {
                debug!(path = ?node.path, expected = ?node.expected, "old node has no counterpart");
                return Err(InsertionError::UnmatchedOldNode(node.path.clone()));
            }
            _ => return Err(InsertionError::AmbiguousMatch(node.path.clone())),
        }
    }

    let mut created: Vec<Vec<Path>> = vec![Vec::new(); sorted.len()];
    new_root.visit_deep(&mut |node, path| {
        if path.is_empty() || identities.contains_key(path) {
            return;
        }
        let range = node.range();
        if let Some(k) = (0..sorted.len()).find(|&k| shift.inserted_range(k).contains_range(range)) {
            created[k].push(path.to_vec());
        }
    });

    let mut inserted = vec![EvenPathRange::default(); insertions.len()];
    for (k, paths) in created.iter().enumerate() {
        let original_index = order[k];
        inserted[original_index] = smallest_containing_range(paths)
            .map_err(|_| InsertionError::EmptyInsertion(original_index))?;
    }

    let root = new_root.map_deep(&mut |node, path| match identities.get(path) {
        Some(&(id, is_placeholder)) => node.with_identity(id, is_placeholder),
        None => node,
    });
    let doc = match root {
        Node::List(list) => Doc::new(list, new.text.clone()),
        Node::Token(_) => new.clone(),
    };
    Ok(CheckedInsertion { doc, inserted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build::*;
    use crate::text::apply_insertions;

    fn ins(position: usize, text: &str) -> Insertion {
        Insertion {
            position,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_accepts_added_sibling_and_keeps_ids() {
        let old = doc(file(vec![args(vec![tok("a")])]));
        let batch = [ins(2, ", b")];
        let new = doc(file(vec![args(vec![tok("a"), tok("b")])]));
        assert_eq!(new.text, apply_insertions(&old.text, &batch));

        let checked = check_insertion(&old, &batch, &new).unwrap();
        assert_eq!(checked.inserted, vec![EvenPathRange::at(vec![0, 1])]);
        let root = checked.doc.root_node();
        let old_root = old.root_node();
        assert_eq!(root.id(), old_root.id());
        assert_eq!(
            root.get_by_path(&[0, 0]).unwrap().id(),
            old_root.get_by_path(&[0, 0]).unwrap().id()
        );
        assert_eq!(
            root.get_by_path(&[0]).unwrap().id(),
            old_root.get_by_path(&[0]).unwrap().id()
        );
        assert_ne!(
            root.get_by_path(&[0, 1]).unwrap().id(),
            new.root_node().get_by_path(&[0, 0]).unwrap().id()
        );
    }

    #[test]
    fn test_rejects_merge_into_existing_token() {
        let old = doc(file(vec![args(vec![tok("a")])]));
        let batch = [ins(2, "b")];
        let new = doc(file(vec![args(vec![tok("ab")])]));
        assert_eq!(
            check_insertion(&old, &batch, &new).unwrap_err(),
            InsertionError::UnmatchedOldNode(vec![0, 0])
        );
    }

    #[test]
    fn test_results_follow_caller_order() {
        // "(a)" -> "(x, a, y)" typed as two insertions, given back to front.
        let old = doc(file(vec![args(vec![tok("a")])]));
        let batch = [ins(2, ", y"), ins(1, "x, ")];
        let new = doc(file(vec![args(vec![tok("x"), tok("a"), tok("y")])]));
        assert_eq!(new.text, "(x, a, y)");

        let checked = check_insertion(&old, &batch, &new).unwrap();
        assert_eq!(
            checked.inserted,
            vec![EvenPathRange::at(vec![0, 2]), EvenPathRange::at(vec![0, 0])]
        );
    }

    #[test]
    fn test_rejects_insertion_without_nodes() {
        let old = doc(file(vec![args(vec![tok("a")])]));
        let new = doc(file(vec![args(vec![tok("a")])]));
        let batch = [ins(3, "")];
        assert_eq!(
            check_insertion(&old, &batch, &new).unwrap_err(),
            InsertionError::EmptyInsertion(0)
        );
        assert!(matches!(
            check_insertion(&old, &[ins(9, "b")], &new),
            Err(InsertionError::OutOfRange { position: 9, len: 3 })
        ));
    }
}
