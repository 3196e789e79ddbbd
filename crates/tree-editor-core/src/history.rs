//! Undo/redo of cursor movement.
//!
//! Only selections are recorded; document edits are not undoable. Any change to the document
//! (and entering or leaving insert mode) clears both stacks, so every recorded selection is
//! guaranteed to resolve against the current tree.

use crate::cursor::Cursor;
use crate::focus::{normalize_in, normalize_out};
use crate::node::Node;

/// Bounded undo/redo stacks of cursor sets.
#[derive(Debug, Clone)]
pub struct CursorHistory {
    undo_stack: Vec<Vec<Cursor>>,
    redo_stack: Vec<Vec<Cursor>>,
    max_history: usize,
}

impl CursorHistory {
    /// Empty history keeping at most `max_history` undo steps.
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Returns `true` if there is a step to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is a step to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo steps.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo steps.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Record `cursors` as the state to return to. Starts a new branch, so redo is lost.
    ///
    /// Nothing is recorded if the newest undo step already holds the same selections.
    pub fn push(&mut self, root: &Node, cursors: &[Cursor]) {
        let entry = outermost(root, cursors);
        self.redo_stack.clear();
        if self.undo_stack.last().is_some_and(|top| same_selections(top, &entry)) {
            return;
        }
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Step back from `current`. Returns `None` if there is nothing to undo.
    pub fn undo(&mut self, root: &Node, current: &[Cursor]) -> Option<Vec<Cursor>> {
        step(root, current, &mut self.undo_stack, &mut self.redo_stack)
    }

    /// Step forward from `current`. Returns `None` if there is nothing to redo.
    pub fn redo(&mut self, root: &Node, current: &[Cursor]) -> Option<Vec<Cursor>> {
        step(root, current, &mut self.redo_stack, &mut self.undo_stack)
    }
}

fn step(
    root: &Node,
    current: &[Cursor],
    from: &mut Vec<Vec<Cursor>>,
    to: &mut Vec<Vec<Cursor>>,
) -> Option<Vec<Cursor>> {
    let entry = outermost(root, current);
    while from.last().is_some_and(|top| same_selections(top, &entry)) {
        from.pop();
    }
    let target = from.pop()?;
    to.push(entry);
    Some(restore(root, target, current))
}

fn outermost(root: &Node, cursors: &[Cursor]) -> Vec<Cursor> {
    cursors
        .iter()
        .map(|c| c.with_focus(normalize_out(root, &c.focus)))
        .collect()
}

fn same_selections(a: &[Cursor], b: &[Cursor]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id && x.focus == y.focus)
}

/// Recorded selections, with the clipboards and marks the same cursors hold now.
fn restore(root: &Node, recorded: Vec<Cursor>, current: &[Cursor]) -> Vec<Cursor> {
    recorded
        .into_iter()
        .map(|mut cursor| {
            if let Some(now) = current.iter().find(|c| c.id == cursor.id) {
                cursor.clipboard = now.clipboard.clone();
                cursor.marks = now.marks.clone();
            }
            cursor.focus = normalize_in(root, &cursor.focus);
            cursor
        })
        .collect()
}
