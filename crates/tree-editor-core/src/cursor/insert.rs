//! Free-text insertion at cursor positions.
//!
//! Insert mode collects typed text without touching the tree. Committing strips the
//! placeholders next to the insertion points, splices the text in, reparses the whole document
//! and only accepts the result if every old node survived unchanged.

use tracing::{debug, warn};

use crate::error::{EngineError, Warning};
use crate::focus::{fix_focus, normalize_in, text_range_from_focus};
use crate::grammar::Grammar;
use crate::insertion::check_insertion;
use crate::node::{Doc, Node};
use crate::path::EvenPathRange;
use crate::placeholders::{doc_with_all_placeholders, doc_without_placeholders_near};
use crate::text::{Insertion, InsertionShift, apply_insertions, map_node_ranges};

use super::{Cursor, Outcome};

/// Where typed text goes relative to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertSide {
    /// In front of the first selected node.
    Before,
    /// Behind the last selected node.
    After,
}

/// Cursors entering insert mode, with their insertion points.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStart {
    /// One text offset per cursor, ascending.
    pub positions: Vec<usize>,
    /// The cursors, in the order of `positions`.
    pub cursors: Vec<Cursor>,
}

/// Compute the insertion point of every cursor. Empty list content inserts between the
/// delimiters.
pub fn start_insert(root: &Node, cursors: &[Cursor], side: InsertSide) -> Result<InsertStart, EngineError> {
    let mut keyed = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        let range = text_range_from_focus(root, &cursor.focus)?;
        let position = match side {
            InsertSide::Before => range.pos,
            InsertSide::After => range.end,
        };
        keyed.push((position, cursor.settled()));
    }
    keyed.sort_by_key(|(position, _)| *position);
    let (positions, cursors) = keyed.into_iter().unzip();
    Ok(InsertStart { positions, cursors })
}

fn insertions(positions: &[usize], text: &str) -> Vec<Insertion> {
    positions
        .iter()
        .map(|&position| Insertion {
            position,
            text: text.to_string(),
        })
        .collect()
}

/// The document as it looks while typing: placeholders under the cursors removed and `text`
/// spliced in at every position. Ranges are shifted; nodes created by the text do not exist yet.
pub fn preview_insert(doc: &Doc, positions: &[usize], text: &str) -> Doc {
    let stripped = doc_without_placeholders_near(doc, positions);
    if text.is_empty() {
        return stripped.doc;
    }
    let batch = insertions(&stripped.positions, text);
    let shift = InsertionShift::new(&batch);
    let new_text = apply_insertions(&stripped.doc.text, &batch);
    let root = map_node_ranges(
        &stripped.doc.root_node(),
        &|pos| shift.map_start(pos),
        &|end| shift.map_end(end),
    );
    match root {
        Node::List(list) => Doc::new(list, new_text),
        Node::Token(_) => stripped.doc,
    }
}

/// A committed insertion.
#[derive(Debug, Clone)]
pub struct Committed {
    /// New document, repaired.
    pub doc: Doc,
    /// Per position: the nodes the typed text became.
    pub focuses: Vec<EvenPathRange>,
}

/// Type `text` at every position (ascending) and reparse.
///
/// Text that does not parse, or that parses into something that changes existing nodes, is
/// rejected and leaves `doc` untouched.
pub fn commit_insert<G: Grammar + ?Sized>(
    grammar: &G,
    doc: &Doc,
    positions: &[usize],
    text: &str,
) -> Result<Outcome<Committed>, EngineError> {
    let stripped = doc_without_placeholders_near(doc, positions);
    let batch = insertions(&stripped.positions, text);
    let new_text = apply_insertions(&stripped.doc.text, &batch);
    debug!(insertions = batch.len(), len = new_text.len(), "reparsing typed text");

    let parsed = match grammar.parse(&new_text) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, "typed text does not parse");
            return Ok(Outcome::Rejected(Warning::InsertionParse(err)));
        }
    };
    let checked = match check_insertion(&stripped.doc, &batch, &parsed) {
        Ok(checked) => checked,
        Err(err) => {
            warn!(error = %err, "typed text does not fit the tree");
            return Ok(Outcome::Rejected(err.into()));
        }
    };

    let (repaired, mapper) = doc_with_all_placeholders(grammar, &checked.doc)?;
    let root = repaired.root_node();
    let focuses = checked
        .inserted
        .iter()
        .map(|range| normalize_in(&root, &fix_focus(&root, &mapper.map_range(range))))
        .collect();
    Ok(Outcome::Done(Committed {
        doc: repaired,
        focuses,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insertion::InsertionError;
    use crate::node::TextRange;
    use crate::node::build::*;
    use pretty_assertions::assert_eq;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    fn committed(outcome: Outcome<Committed>) -> Committed {
        match outcome {
            Outcome::Done(committed) => committed,
            Outcome::Rejected(warning) => panic!("rejected: {warning}"),
        }
    }

    #[test]
    fn test_start_insert_sorts_by_position() {
        let d = doc(file(vec![args(vec![tok("a"), tok("b")])]));
        let root = d.root_node();
        let cursors = [Cursor::new(r(&[0, 1], 0)), Cursor::new(r(&[0, 0], 0))];
        let start = start_insert(&root, &cursors, InsertSide::After).unwrap();
        assert_eq!(start.positions, vec![2, 5]);
        assert_eq!(start.cursors[0].id, cursors[1].id);

        let empty = doc(file(vec![args(vec![])]));
        let start = start_insert(&empty.root_node(), &[Cursor::new(r(&[0, 0], 0))], InsertSide::Before).unwrap();
        assert_eq!(start.positions, vec![1]);
    }

    #[test]
    fn test_commit_appends_argument() {
        let d = doc(file(vec![args(vec![tok("a")])]));
        let done = committed(commit_insert(&Parens, &d, &[2], ", b").unwrap());
        assert_eq!(done.doc.text, "(a, b)");
        assert_eq!(done.focuses, vec![r(&[0, 1], 0)]);
        assert_eq!(
            done.doc.root_node().get_by_path(&[0, 0]).unwrap().id(),
            d.root_node().get_by_path(&[0, 0]).unwrap().id()
        );
    }

    #[test]
    fn test_commit_rejects_without_touching_doc() {
        let d = doc(file(vec![args(vec![tok("a")])]));
        assert!(matches!(
            commit_insert(&Parens, &d, &[2], ",").unwrap(),
            Outcome::Rejected(Warning::InsertionParse(_))
        ));
        assert!(matches!(
            commit_insert(&Parens, &d, &[2], "b").unwrap(),
            Outcome::Rejected(Warning::InsertionRejected(InsertionError::UnmatchedOldNode(_)))
        ));
    }

    #[test]
    fn test_preview_shifts_ranges() {
        let d = doc(file(vec![args(vec![tok("a")])]));
        let preview = preview_insert(&d, &[2], ", b");
        assert_eq!(preview.text, "(a, b)");
        let list = preview.root_node().get_by_path(&[0]).unwrap().range();
        assert_eq!(list, TextRange::new(0, 6));
        let a = preview.root_node().get_by_path(&[0, 0]).unwrap().range();
        assert_eq!(a, TextRange::new(1, 2));
    }
}
