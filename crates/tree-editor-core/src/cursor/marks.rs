//! Named marks.
//!
//! Marks are stored in their outermost form, since transparent wrappers come and go as the tree
//! is repaired, and carried across edits by node identity.

use crate::error::Warning;
use crate::focus::{is_focus_on_empty_list_content, normalize_in, normalize_out};
use crate::node::Node;
use crate::track::track_ranges;

use super::{Cursor, Mark, Outcome};

/// Remember the current selection under `name`, replacing an older mark of that name.
pub fn set_mark(root: &Node, cursor: &Cursor, name: char) -> Cursor {
    let mut marked = cursor.settled();
    if is_focus_on_empty_list_content(root, &cursor.focus) {
        return marked;
    }
    marked.marks.retain(|m| m.name != name);
    marked.marks.push(Mark {
        name,
        focus: normalize_out(root, &cursor.focus),
    });
    marked
}

/// Select the node remembered under `name`.
pub fn jump_to_mark(root: &Node, cursor: &Cursor, name: char) -> Outcome<Cursor> {
    match cursor.mark(name) {
        Some(mark) if mark.focus.is_valid(root) => {
            Outcome::Done(cursor.with_focus(normalize_in(root, &mark.focus)))
        }
        _ => Outcome::Rejected(Warning::UnknownMark(name)),
    }
}

/// Move every mark from `old_root` onto `new_root`. Marks whose nodes are all gone are dropped.
pub fn relocate_marks(old_root: &Node, new_root: &Node, cursors: &mut [Cursor]) {
    for cursor in cursors {
        if cursor.marks.is_empty() {
            continue;
        }
        let focuses: Vec<_> = cursor.marks.iter().map(|m| m.focus.clone()).collect();
        let tracked = track_ranges(old_root, new_root, &focuses);
        cursor.marks = cursor
            .marks
            .iter()
            .zip(tracked)
            .filter_map(|(mark, focus)| {
                Some(Mark {
                    name: mark.name,
                    focus: normalize_out(new_root, &focus?),
                })
            })
            .collect();
    }
}
