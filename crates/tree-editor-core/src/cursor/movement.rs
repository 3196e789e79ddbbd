//! Leaf, in/out and parent movement.

use crate::focus::{is_focus_on_empty_list_content, normalize_in};
use crate::node::{ListNode, Node};
use crate::path::{EvenPathRange, Path, UnevenPathRange, parent_path};

use super::Cursor;

/// Direction of a leaf move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards the start of the document.
    Backward,
    /// Towards the end of the document.
    Forward,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }
}

/// What a leaf move does to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafMoveMode {
    /// Collapse onto the neighbouring leaf.
    Move,
    /// Keep the anchor, move the tip.
    Extend,
    /// Pull the trailing end of the selection one step in `direction`. A single node cannot
    /// shrink.
    Shrink,
}

/// Move to the neighbouring leaf (or grow/shrink the selection towards it).
///
/// The tip walks up until it has a sibling in `direction`, then down to that sibling's first
/// (or last) leaf. Steps that leave the even form of the focus unchanged are repeated, so a
/// move always lands on a visibly different selection when one exists.
pub fn move_leaf(root: &Node, cursor: &Cursor, direction: Direction, mode: LeafMoveMode) -> Cursor {
    if mode == LeafMoveMode::Shrink && cursor.focus.offset == 0 {
        return cursor.settled();
    }
    let mut focus = match direction {
        Direction::Forward => cursor.focus.flip_forward(),
        Direction::Backward => cursor.focus.flip_backward(),
    };
    if mode == LeafMoveMode::Shrink {
        focus = focus.flip();
    }
    let Ok(mut uneven) = focus.as_uneven() else {
        return cursor.settled();
    };

    let extend = mode != LeafMoveMode::Move;
    loop {
        let next = step_through_leaves(root, &uneven, direction, extend);
        if next == uneven {
            break;
        }
        let even_changed = next.as_even() != uneven.as_even();
        uneven = next;
        if even_changed {
            break;
        }
    }

    let mut moved = cursor.with_focus(normalize_in(root, &uneven.as_even()));
    moved.enable_reduce_to_tip = mode == LeafMoveMode::Extend;
    moved
}

fn step_through_leaves(
    root: &Node,
    focus: &UnevenPathRange,
    direction: Direction,
    extend: bool,
) -> UnevenPathRange {
    let mut current = focus.tip.clone();
    loop {
        let Some(&last) = current.last() else {
            return focus.clone();
        };
        if let Some(index) = last.checked_add_signed(direction.step()) {
            let mut sibling = current.clone();
            if let Some(slot) = sibling.last_mut() {
                *slot = index;
            }
            if root.get_by_path(&sibling).is_some() {
                current = sibling;
                break;
            }
        }
        current.pop();
    }

    while let Some(Node::List(list)) = root.get_by_path(&current) {
        if list.content.is_empty() {
            break;
        }
        let index = match direction {
            Direction::Forward => 0,
            Direction::Backward => list.content.len() - 1,
        };
        current.push(index);
    }

    if extend {
        UnevenPathRange {
            anchor: focus.anchor.clone(),
            tip: current,
        }
    } else {
        UnevenPathRange {
            anchor: current.clone(),
            tip: current,
        }
    }
}

fn delimiter_matches(list: &ListNode, delimiter: Option<&str>, closing: bool) -> bool {
    if list.equivalent_to_content {
        return false;
    }
    match delimiter {
        None => true,
        Some(d) if closing => list.delimiters.1 == d,
        Some(d) => list.delimiters.0 == d,
    }
}

/// Select the content of the first delimited list inside the focus, in document order.
///
/// With `delimiter`, only lists opened by it qualify. An empty list is entered as empty list
/// content.
pub fn move_in(root: &Node, cursor: &Cursor, delimiter: Option<&str>) -> Cursor {
    let mut found: Option<(Path, usize)> = None;
    visit_in_range(root, &cursor.focus.flip_forward(), &mut |node, path| {
        if found.is_some() {
            return;
        }
        if let Node::List(list) = node
            && delimiter_matches(list, delimiter, false)
        {
            found = Some((path.to_vec(), list.content.len()));
        }
    });
    match found {
        Some((mut path, len)) => {
            path.push(0);
            cursor.with_focus(EvenPathRange::new(path, len.saturating_sub(1) as isize))
        }
        None => cursor.settled(),
    }
}

/// Select the closest enclosing delimited list (closed by `delimiter`, if given).
pub fn move_out(root: &Node, cursor: &Cursor, delimiter: Option<&str>) -> Cursor {
    match enclosing_list(root, &cursor.focus, delimiter) {
        Some(focus) => cursor.with_focus(focus),
        None => cursor.settled(),
    }
}

fn enclosing_list(root: &Node, focus: &EvenPathRange, delimiter: Option<&str>) -> Option<EvenPathRange> {
    let mut anchor = focus.anchor.clone();
    while anchor.len() >= 2 {
        anchor.pop();
        if let Some(Node::List(list)) = root.get_by_path(&anchor)
            && delimiter_matches(list, delimiter, true)
        {
            return Some(EvenPathRange::at(anchor));
        }
    }
    None
}

/// Grow the selection to the smallest enclosing structure.
///
/// That is either every sibling of the selection, or the closest delimited list around it,
/// whichever is smaller. A step that would leave the visible selection unchanged falls back to
/// the other candidate.
pub fn move_to_parent(root: &Node, cursor: &Cursor) -> Cursor {
    if is_focus_on_empty_list_content(root, &cursor.focus) {
        return move_out(root, cursor, None);
    }
    let focus = cursor.focus.flip_forward();
    let siblings = select_siblings(root, &focus);
    let delimited = enclosing_list(root, &focus, None);

    let (first, second) = match delimited {
        Some(list) if list.anchor.len() >= siblings.anchor.len() => (list, Some(siblings)),
        Some(list) => (siblings, Some(list)),
        None => (siblings, None),
    };
    let first = normalize_in(root, &first);
    if !first.same_siblings(&focus) {
        return cursor.with_focus(first);
    }
    match second {
        Some(second) => cursor.with_focus(normalize_in(root, &second)),
        None => cursor.settled(),
    }
}

/// Every sibling of the focus, climbing while all of them are already selected.
fn select_siblings(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    let mut focus = focus.clone();
    while !focus.anchor.is_empty() {
        let parent = parent_path(&focus.anchor).to_vec();
        let len = root.get_by_path(&parent).map_or(0, |p| p.content().len());
        if focus.offset.unsigned_abs() + 1 != len {
            let mut anchor = parent;
            anchor.push(0);
            return EvenPathRange::new(anchor, len.saturating_sub(1) as isize);
        }
        focus = EvenPathRange::at(parent);
    }
    focus
}

/// Pre-order visit of every node selected by `focus` and their descendants.
pub(crate) fn visit_in_range(root: &Node, focus: &EvenPathRange, visit: &mut impl FnMut(&Node, &[usize])) {
    let Some((first, last)) = focus.index_span() else {
        root.visit_deep(visit);
        return;
    };
    let parent = focus.parent();
    let Some(list) = root.get_by_path(parent) else {
        return;
    };
    for (i, child) in list.content().iter().enumerate().skip(first).take(last + 1 - first) {
        let mut prefix = parent.to_vec();
        prefix.push(i);
        let base = prefix.len();
        child.visit_deep(&mut |node, path| {
            prefix.truncate(base);
            prefix.extend_from_slice(path);
            visit(node, &prefix);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build::*;
    use pretty_assertions::assert_eq;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    fn sample() -> Node {
        // f(x, y) g()
        doc(file(vec![
            tight(vec![tok("f"), args(vec![tok("x"), tok("y")])]),
            tight(vec![tok("g"), args(vec![])]),
        ]))
        .root_node()
    }

    fn at(focus: EvenPathRange) -> Cursor {
        Cursor::new(focus)
    }

    #[test]
    fn test_move_leaf_walks_through_leaves() {
        let root = sample();
        let c = move_leaf(&root, &at(r(&[0, 0], 0)), Direction::Forward, LeafMoveMode::Move);
        assert_eq!(c.focus, r(&[0, 1, 0], 0));
        let c = move_leaf(&root, &c, Direction::Forward, LeafMoveMode::Move);
        assert_eq!(c.focus, r(&[0, 1, 1], 0));
        let c = move_leaf(&root, &c, Direction::Forward, LeafMoveMode::Move);
        assert_eq!(c.focus, r(&[1, 0], 0));
        let c = move_leaf(&root, &c, Direction::Backward, LeafMoveMode::Move);
        assert_eq!(c.focus, r(&[0, 1, 1], 0));
    }

    #[test]
    fn test_move_leaf_stops_at_document_edges() {
        let root = sample();
        let first = at(r(&[0, 0], 0));
        let c = move_leaf(&root, &first, Direction::Backward, LeafMoveMode::Move);
        assert_eq!(c.focus, first.focus);
        assert_eq!(c.id, first.id);
    }

    #[test]
    fn test_extend_then_shrink() {
        let root = sample();
        let c = move_leaf(&root, &at(r(&[0, 1, 0], 0)), Direction::Forward, LeafMoveMode::Extend);
        assert_eq!(c.focus, r(&[0, 1, 0], 1));
        assert!(c.enable_reduce_to_tip);

        let c = move_leaf(&root, &c, Direction::Forward, LeafMoveMode::Shrink);
        assert_eq!(c.focus, r(&[0, 1, 1], 0));
        assert!(!c.enable_reduce_to_tip);

        let unchanged = move_leaf(&root, &c, Direction::Forward, LeafMoveMode::Shrink);
        assert_eq!(unchanged.focus, c.focus);
    }

    #[test]
    fn test_move_in_and_out() {
        let root = sample();
        let c = move_in(&root, &at(r(&[0], 0)), None);
        assert_eq!(c.focus, r(&[0, 1, 0], 1));
        let c = move_out(&root, &c, None);
        assert_eq!(c.focus, r(&[0, 1], 0));

        // The empty call is entered as empty list content.
        let c = move_in(&root, &at(r(&[1], 0)), Some("("));
        assert_eq!(c.focus, r(&[1, 1, 0], 0));
        let missing = move_in(&root, &at(r(&[1], 0)), Some("["));
        assert_eq!(missing.focus, r(&[1], 0));
        let out = move_out(&root, &at(r(&[0, 1, 1], 0)), Some("]"));
        assert_eq!(out.focus, r(&[0, 1, 1], 0));
    }

    #[test]
    fn test_move_to_parent_grows_step_by_step() {
        let root = sample();
        let c = move_to_parent(&root, &at(r(&[0, 1, 0], 0)));
        assert_eq!(c.focus, r(&[0, 1, 0], 1));
        let c = move_to_parent(&root, &c);
        assert_eq!(c.focus, r(&[0, 1], 0));
        let c = move_to_parent(&root, &c);
        assert_eq!(c.focus, r(&[0, 0], 1));
        let c = move_to_parent(&root, &c);
        assert_eq!(c.focus, r(&[0], 1));
    }

    #[test]
    fn test_move_to_parent_from_empty_list_content() {
        let root = sample();
        let c = move_to_parent(&root, &at(r(&[1, 1, 0], 0)));
        assert_eq!(c.focus, r(&[1, 1], 0));
    }

    #[test]
    fn test_visit_in_range_reports_absolute_paths() {
        let root = sample();
        let mut paths = Vec::new();
        visit_in_range(&root, &r(&[0, 1], 0), &mut |_, path| paths.push(path.to_vec()));
        assert_eq!(paths, vec![vec![0, 1], vec![0, 1, 0], vec![0, 1, 1]]);
    }
}
