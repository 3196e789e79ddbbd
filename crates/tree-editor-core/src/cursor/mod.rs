//! Cursors and the operations defined on them.
//!
//! Per-cursor operations (movement, reduction, copy, marks) map one [`Cursor`] to another and
//! never touch the document. Batch operations (delete, paste, rename) build one replacement per
//! cursor and settle all of them in a single [`replace_multiple`](crate::replace::replace_multiple)
//! pass, so no cursor observes the effect of another.

mod clipboard;
mod edit;
mod find;
mod insert;
mod marks;
mod movement;
mod reduce;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use clipboard::{copy, paste};
pub use edit::{delete, rename};
pub use find::search;
pub use insert::{Committed, InsertSide, InsertStart, commit_insert, preview_insert, start_insert};
pub use marks::{jump_to_mark, relocate_marks, set_mark};
pub use movement::{Direction, LeafMoveMode, move_in, move_leaf, move_out, move_to_parent};
pub use reduce::{ReduceAcrossSide, ReduceSide, reduce_across, reduce_selection};

use crate::error::{EngineError, Warning};
use crate::focus::text_range_from_focus;
use crate::node::{ListNode, Node};
use crate::path::EvenPathRange;
use crate::range_groups::has_overlapping_non_nested;

static NEXT_CURSOR_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a cursor; kept while the cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(u64);

impl CursorId {
    /// Allocates an identity that has never been handed out before.
    pub fn fresh() -> Self {
        Self(NEXT_CURSOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Allocates a lineage group id for cursors split off by a search.
pub(crate) fn fresh_group_id() -> u64 {
    NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed)
}

/// Named, remembered selection owned by a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    /// Single-character name.
    pub name: char,
    /// Selection, normalized outwards.
    pub focus: EvenPathRange,
}

/// Copied content owned by a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    /// A copied node, or a list holding a copied run of siblings.
    pub node: Node,
    /// `node` is a list wrapping a run of siblings rather than a node of the document.
    pub is_partial_copy: bool,
}

impl Clipboard {
    /// Copy of a whole node.
    pub fn whole(node: Node) -> Self {
        Self {
            node,
            is_partial_copy: false,
        }
    }

    /// Copy of `list.content[first..=last]`, kept inside a shell of `list`.
    pub fn partial(list: &ListNode, first: usize, last: usize) -> Self {
        let content = list.content[first..=last].to_vec();
        Self {
            node: Node::List(Arc::new(list.with_content(content, None))),
            is_partial_copy: true,
        }
    }
}

/// A selection in the document plus the per-cursor state that travels with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Identity.
    pub id: CursorId,
    /// Current selection.
    pub focus: EvenPathRange,
    /// Named selections.
    pub marks: Vec<Mark>,
    /// Copied content.
    pub clipboard: Option<Clipboard>,
    /// The last command extended the selection, so `space` may reduce it to the moving end.
    pub enable_reduce_to_tip: bool,
    /// Lineage: one group id per search that split this cursor off its parent.
    pub parent_path: Vec<u64>,
}

impl Cursor {
    /// New cursor with no marks, clipboard or lineage.
    pub fn new(focus: EvenPathRange) -> Self {
        Self {
            id: CursorId::fresh(),
            focus,
            marks: Vec::new(),
            clipboard: None,
            enable_reduce_to_tip: false,
            parent_path: Vec::new(),
        }
    }

    /// Same cursor at a different focus. Reduce-to-tip is reset.
    pub fn with_focus(&self, focus: EvenPathRange) -> Self {
        Self {
            focus,
            enable_reduce_to_tip: false,
            ..self.clone()
        }
    }

    /// Same cursor with reduce-to-tip reset.
    pub fn settled(&self) -> Self {
        Self {
            enable_reduce_to_tip: false,
            ..self.clone()
        }
    }

    /// Look up a mark by name.
    pub fn mark(&self, name: char) -> Option<&Mark> {
        self.marks.iter().find(|m| m.name == name)
    }
}

/// Outcome of an operation that may be rejected as a whole.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// The operation applied.
    Done(T),
    /// The operation was refused; nothing changed.
    Rejected(Warning),
}

/// A batch edit: the new root and the cursors that survived it.
#[derive(Debug, Clone)]
pub struct Edit {
    /// New root.
    pub root: Arc<ListNode>,
    /// Cursors, in the same order as the input minus dropped ones.
    pub cursors: Vec<Cursor>,
}

/// Sort cursors by the text their focus covers (start, then end). Stable.
pub fn sort_cursors(root: &Node, cursors: &mut [Cursor]) -> Result<(), EngineError> {
    let mut keyed = Vec::with_capacity(cursors.len());
    for cursor in cursors.iter() {
        let range = text_range_from_focus(root, &cursor.focus)?;
        keyed.push((range.pos, range.end));
    }
    let mut order: Vec<usize> = (0..cursors.len()).collect();
    order.sort_by_key(|&i| keyed[i]);
    let sorted: Vec<Cursor> = order.iter().map(|&i| cursors[i].clone()).collect();
    cursors.clone_from_slice(&sorted);
    Ok(())
}

/// Whether some cursors overlap without nesting.
pub fn cursors_overlap(cursors: &[Cursor]) -> bool {
    let focuses: Vec<EvenPathRange> = cursors.iter().map(|c| c.focus.clone()).collect();
    has_overlapping_non_nested(&focuses)
}

/// Every focus must resolve against `root`.
pub fn check_focuses(root: &Node, cursors: &[Cursor]) -> Result<(), EngineError> {
    for cursor in cursors {
        if !cursor.focus.is_valid(root)
            && !crate::focus::is_focus_on_empty_list_content(root, &cursor.focus)
        {
            return Err(EngineError::InvalidFocus(cursor.focus.clone()));
        }
    }
    Ok(())
}
