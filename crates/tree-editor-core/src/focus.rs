//! Focus normalization.
//!
//! Transparent lists render exactly as their children, so selecting such a list and selecting
//! all of its children are the same thing on screen. [`normalize_in`] picks the deepest
//! representation (the one commands operate on), [`normalize_out`] the shallowest (the one
//! that survives edits, because transparent wrappers come and go as the tree is repaired).

use crate::error::EngineError;
use crate::node::{Node, TextRange};
use crate::path::{EvenPathRange, parent_path};

/// One step inwards: a zero-offset focus on a non-empty transparent list selects its children.
pub fn normalize_in_once(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    if focus.offset != 0 {
        return focus.clone();
    }
    match root.get_by_path(&focus.anchor) {
        Some(Node::List(list)) if list.equivalent_to_content && !list.content.is_empty() => {
            let mut anchor = focus.anchor.clone();
            anchor.push(0);
            EvenPathRange::new(anchor, list.content.len() as isize - 1)
        }
        _ => focus.clone(),
    }
}

/// Repeat [`normalize_in_once`] until it no longer applies.
pub fn normalize_in(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    let mut focus = focus.clone();
    loop {
        if is_focus_on_empty_list_content(root, &focus) {
            return focus;
        }
        let next = normalize_in_once(root, &focus);
        if next == focus {
            return focus;
        }
        focus = next;
    }
}

/// One step outwards: a range covering every child of a transparent list selects the list.
pub fn normalize_out_once(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    if focus.anchor.is_empty() {
        return focus.clone();
    }
    let forward = focus.flip_forward();
    let parent = EvenPathRange::at(parent_path(&focus.anchor).to_vec());
    if normalize_in_once(root, &parent) == forward {
        parent
    } else {
        focus.clone()
    }
}

/// Repeat [`normalize_out_once`] until it no longer applies.
pub fn normalize_out(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    let mut focus = focus.clone();
    loop {
        if is_focus_on_empty_list_content(root, &focus) {
            return focus;
        }
        let next = normalize_out_once(root, &focus);
        if next == focus {
            return focus;
        }
        focus = next;
    }
}

/// A zero-offset focus at index 0 of an empty list: the cursor rests between its delimiters.
pub fn is_focus_on_empty_list_content(root: &Node, focus: &EvenPathRange) -> bool {
    if focus.offset != 0 || focus.anchor.last() != Some(&0) {
        return false;
    }
    matches!(
        root.get_by_path(parent_path(&focus.anchor)),
        Some(Node::List(list)) if list.content.is_empty()
    )
}

/// Text covered by a focus. Empty list content maps to the point after the opening delimiter.
pub fn text_range_from_focus(root: &Node, focus: &EvenPathRange) -> Result<TextRange, EngineError> {
    if is_focus_on_empty_list_content(root, focus) {
        let list = root
            .get_by_path(parent_path(&focus.anchor))
            .and_then(Node::as_list)
            .ok_or_else(|| EngineError::InvalidFocus(focus.clone()))?;
        let pos = list.range.pos + list.delimiters.0.len();
        return Ok(TextRange::new(pos, pos.max(list.range.end.saturating_sub(list.delimiters.1.len()))));
    }
    let forward = focus.flip_forward();
    let tip = forward.path_to_tip()?;
    let first = root.get_by_path(&forward.anchor);
    let last = root.get_by_path(&tip);
    match (first, last) {
        (Some(first), Some(last)) => Ok(TextRange::new(first.range().pos, last.range().end)),
        _ => Err(EngineError::InvalidFocus(focus.clone())),
    }
}

/// Every focus that selects the same text as `focus`, outermost first.
pub fn equivalent_focuses(root: &Node, focus: &EvenPathRange) -> Vec<EvenPathRange> {
    let mut current = normalize_out(root, focus);
    let mut result = vec![current.clone()];
    loop {
        let next = normalize_in_once(root, &current);
        if next == current {
            return result;
        }
        result.push(next.clone());
        current = next;
    }
}

/// Closest valid focus: `focus` itself, or the deepest node its anchor still reaches.
pub fn fix_focus(root: &Node, focus: &EvenPathRange) -> EvenPathRange {
    if focus.is_valid(root) || is_focus_on_empty_list_content(root, focus) {
        return focus.clone();
    }
    let (path, _) = root.try_get_deepest_by_path(&focus.anchor);
    EvenPathRange::at(path)
}
