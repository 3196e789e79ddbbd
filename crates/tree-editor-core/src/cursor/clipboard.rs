//! Copy and paste.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{EngineError, Warning};
use crate::focus::{equivalent_focuses, is_focus_on_empty_list_content, normalize_out};
use crate::grammar::Grammar;
use crate::node::{ListNode, Node};
use crate::path::EvenPathRange;
use crate::replace::{ListItemReplacement, NewContentRange, replace_multiple};

use super::{Clipboard, Cursor, Edit, Outcome};

/// Copy the selection into the cursor's clipboard.
///
/// A range of siblings is copied as a partial list. Part of a struct list cannot be copied on
/// its own. A copy that is just a root-kind list around one node is unwrapped to that node.
pub fn copy(root: &Node, cursor: &Cursor) -> Result<Outcome<Cursor>, EngineError> {
    if is_focus_on_empty_list_content(root, &cursor.focus) {
        return Ok(Outcome::Done(Cursor {
            clipboard: None,
            ..cursor.settled()
        }));
    }

    let focus = normalize_out(root, &cursor.focus).flip_forward();
    let clipboard = match focus.index_span() {
        Some((first, last)) if first != last => {
            let parent = root
                .get_by_path(focus.parent())
                .and_then(Node::as_list)
                .ok_or_else(|| EngineError::InvalidFocus(cursor.focus.clone()))?;
            if parent.struct_keys.is_some() {
                return Ok(Outcome::Rejected(Warning::PartialStructCopy));
            }
            if last >= parent.content.len() {
                return Err(EngineError::InvalidFocus(cursor.focus.clone()));
            }
            Clipboard::partial(parent, first, last)
        }
        _ => {
            let node = root
                .get_by_path(&focus.anchor)
                .ok_or_else(|| EngineError::InvalidFocus(cursor.focus.clone()))?;
            Clipboard::whole(node.clone())
        }
    };

    let clipboard = match &clipboard.node {
        Node::List(list) if list.kind == root.kind() && list.content.len() == 1 => {
            Clipboard::whole(list.content[0].clone())
        }
        _ => clipboard,
    };
    Ok(Outcome::Done(Cursor {
        clipboard: Some(clipboard),
        ..cursor.settled()
    }))
}

/// Every way to read a clipboard: the copy itself, and each normalize-in step of it.
fn equivalent_clipboards(clipboard: &Clipboard) -> Vec<Clipboard> {
    let mut result = Vec::new();
    for focus in equivalent_focuses(&clipboard.node, &EvenPathRange::at(Vec::new())) {
        match focus.flip_forward().index_span() {
            None => result.push(clipboard.clone()),
            Some((first, last)) if first == last => {
                if let Some(node) = clipboard.node.get_by_path(&focus.anchor) {
                    result.push(Clipboard::whole(node.clone()));
                }
            }
            Some((first, last)) => {
                if let Some(parent) = clipboard.node.get_by_path(focus.parent()).and_then(Node::as_list)
                    && parent.struct_keys.is_none()
                    && last < parent.content.len()
                {
                    result.push(Clipboard::partial(parent, first, last));
                }
            }
        }
    }
    result
}

/// A replacement for one cursor, plus the empty list it needs an anchor placeholder in.
struct Planned {
    replacement: ListItemReplacement,
    anchor_in: Option<Vec<usize>>,
}

fn plan_paste<G: Grammar + ?Sized>(
    grammar: &G,
    root: &Node,
    focus: &EvenPathRange,
    clipboard: &Clipboard,
) -> Option<Planned> {
    let mut focus = focus.flip_forward();
    if focus.anchor.is_empty() {
        if !root.content().is_empty() {
            return None;
        }
        focus = EvenPathRange::at(vec![0]);
    }
    let parent_path = focus.parent().to_vec();
    let parent = root.get_by_path(&parent_path).and_then(Node::as_list)?;

    let on_empty = is_focus_on_empty_list_content(root, &focus);
    let anchored;
    let parent: &ListNode = if on_empty {
        if parent.struct_keys.is_some() {
            return None;
        }
        anchored = parent.with_content(vec![grammar.anchor_placeholder(parent)], None);
        &anchored
    } else {
        parent
    };

    let (first, last) = focus.index_span()?;
    if last >= parent.content.len() {
        return None;
    }
    let content: Vec<Node> = grammar
        .accept_paste(parent, first, last, clipboard)?
        .iter()
        .map(Node::with_fresh_ids)
        .collect();
    let struct_keys = match &parent.struct_keys {
        Some(keys) if content.len() == last - first + 1 => Some(keys[first..=last].to_vec()),
        Some(_) => return None,
        None => None,
    };
    Some(Planned {
        replacement: ListItemReplacement {
            range: focus,
            content,
            struct_keys,
        },
        anchor_in: on_empty.then_some(parent_path),
    })
}

/// Paste every cursor's clipboard over its selection, all at once.
///
/// Each cursor tries every equivalent form of its focus against every equivalent form of its
/// clipboard and takes the first one the grammar accepts. If any cursor finds none, or two
/// pastes claim the same node, nothing is pasted.
pub fn paste<G: Grammar + ?Sized>(
    grammar: &G,
    root: &Arc<ListNode>,
    cursors: &[Cursor],
) -> Result<Outcome<Edit>, EngineError> {
    let root_node = Node::List(root.clone());
    let mut plans = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        let Some(clipboard) = &cursor.clipboard else {
            return Ok(Outcome::Rejected(Warning::EmptyClipboard));
        };
        let focuses = if is_focus_on_empty_list_content(&root_node, &cursor.focus) {
            vec![cursor.focus.clone()]
        } else {
            equivalent_focuses(&root_node, &cursor.focus)
        };
        let clipboards = equivalent_clipboards(clipboard);
        let plan = focuses.iter().find_map(|focus| {
            clipboards
                .iter()
                .find_map(|clipboard| plan_paste(grammar, &root_node, focus, clipboard))
        });
        match plan {
            Some(plan) => plans.push(plan),
            None => {
                warn!(focus = ?cursor.focus, "clipboard does not fit at cursor");
                return Ok(Outcome::Rejected(Warning::PasteRejected));
            }
        }
    }

    let mut anchored = root_node.clone();
    for plan in &plans {
        let Some(path) = &plan.anchor_in else { continue };
        let Some(Node::List(list)) = anchored.get_by_path(path) else {
            return Err(EngineError::InvalidPath(path.clone()));
        };
        if !list.content.is_empty() {
            continue;
        }
        let filled = list.with_content(vec![grammar.anchor_placeholder(list)], None);
        anchored = anchored
            .set_by_path(path, Node::List(Arc::new(filled)))
            .ok_or_else(|| EngineError::InvalidPath(path.clone()))?;
    }
    let Node::List(anchored) = anchored else {
        return Err(EngineError::RootNotList);
    };

    let replacements: Vec<ListItemReplacement> = plans.into_iter().map(|p| p.replacement).collect();
    let outcome = replace_multiple(&anchored, &replacements)?;
    if outcome.ambiguous_overlap {
        warn!("pasted ranges overlap");
        return Ok(Outcome::Rejected(Warning::AmbiguousPaste));
    }

    let mut pasted = Vec::with_capacity(cursors.len());
    for (cursor, (used, range)) in cursors.iter().zip(outcome.used.iter().zip(&outcome.new_ranges)) {
        match range {
            Some(NewContentRange::Range(range)) if *used => pasted.push(cursor.with_focus(range.clone())),
            _ => {
                debug!(focus = ?cursor.focus, "paste replacement was not applied");
                return Ok(Outcome::Rejected(Warning::PasteRejected));
            }
        }
    }
    Ok(Outcome::Done(Edit {
        root: outcome.root,
        cursors: pasted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ParseError;
    use crate::node::build::*;
    use crate::node::{Doc, NodeId, TextRange, TokenNode};
    use pretty_assertions::assert_eq;

    struct Plain;

    impl Grammar for Plain {
        fn parse(&self, text: &str) -> Result<Doc, ParseError> {
            Err(ParseError::new(TextRange::new(0, text.len()), "not supported"))
        }

        fn print(&self, _root: &ListNode) -> String {
            String::new()
        }

        fn anchor_placeholder(&self, _list: &ListNode) -> Node {
            TokenNode::new(IDENT, "_").placeholder().into()
        }
    }

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    fn copied(root: &Node, focus: EvenPathRange) -> Cursor {
        match copy(root, &Cursor::new(focus)).unwrap() {
            Outcome::Done(cursor) => cursor,
            Outcome::Rejected(warning) => panic!("rejected: {warning}"),
        }
    }

    fn token_texts(node: &Node) -> Vec<String> {
        let mut texts = Vec::new();
        node.visit_deep(&mut |n, _| {
            if let Some(t) = n.as_token() {
                texts.push(t.text.to_string());
            }
        });
        texts
    }

    #[test]
    fn test_copy_whole_and_partial() {
        let d = doc(file(vec![args(vec![tok("a"), tok("b"), tok("c")]), tok("z")]));
        let root = d.root_node();

        let whole = copied(&root, r(&[0, 1], 0)).clipboard.unwrap();
        assert!(!whole.is_partial_copy);
        assert_eq!(token_texts(&whole.node), vec!["b"]);

        let partial = copied(&root, r(&[0, 2], -1)).clipboard.unwrap();
        assert!(partial.is_partial_copy);
        assert_eq!(partial.node.kind(), ARGS);
        assert_eq!(token_texts(&partial.node), vec!["b", "c"]);

        let empty = doc(file(vec![args(vec![])]));
        let cleared = copied(&empty.root_node(), r(&[0, 0], 0));
        assert!(cleared.clipboard.is_none());
    }

    #[test]
    fn test_copy_unwraps_single_root_kind_list() {
        let d = doc(file(vec![tok("a"), tok("b")]));
        let root = d.root_node();
        // Selecting `a` alone: the root is transparent, so the focus is already the token.
        let single = copied(&root, r(&[0], 0)).clipboard.unwrap();
        assert_eq!(single.node.kind(), IDENT);
        assert!(!single.is_partial_copy);

        let nested = doc(file(vec![file(vec![tok("a")]), tok("b")]));
        let unwrapped = copied(&nested.root_node(), r(&[0], 0)).clipboard.unwrap();
        assert_eq!(unwrapped.node.kind(), IDENT);
    }

    #[test]
    fn test_copy_refuses_partial_struct() {
        let d = doc(file(vec![record(vec!["name", "value"], vec![tok("k"), tok("v")])]));
        let outcome = copy(&d.root_node(), &Cursor::new(r(&[0, 0], 1))).unwrap();
        assert!(matches!(outcome, Outcome::Rejected(Warning::PartialStructCopy)));
    }

    #[test]
    fn test_swap_paste_is_atomic() {
        let d = doc(file(vec![args(vec![tok("a"), tok("b")])]));
        let root = d.root_node();
        let mut first = copied(&root, r(&[0, 0], 0));
        let mut second = copied(&root, r(&[0, 1], 0));
        std::mem::swap(&mut first.clipboard, &mut second.clipboard);

        let Outcome::Done(edit) = paste(&Plain, &d.root, &[first.clone(), second]).unwrap() else {
            panic!("paste rejected");
        };
        let new_root = Node::List(edit.root);
        assert_eq!(token_texts(&new_root), vec!["b", "a"]);
        assert_eq!(edit.cursors[0].focus, r(&[0, 0], 0));
        assert_eq!(edit.cursors[0].id, first.id);
        // Pasted nodes are copies with their own identities.
        let pasted: NodeId = new_root.get_by_path(&[0, 0]).unwrap().id();
        assert_ne!(pasted, root.get_by_path(&[0, 1]).unwrap().id());
    }

    #[test]
    fn test_partial_copy_flattens_into_same_kind() {
        let d = doc(file(vec![args(vec![tok("a"), tok("b")]), args(vec![tok("x")])]));
        let root = d.root_node();
        let mut cursor = copied(&root, r(&[0, 0], 1));
        cursor.focus = r(&[1, 0], 0);
        let Outcome::Done(edit) = paste(&Plain, &d.root, &[cursor]).unwrap() else {
            panic!("paste rejected");
        };
        let new_root = Node::List(edit.root);
        assert_eq!(token_texts(&new_root), vec!["a", "b", "a", "b"]);
        assert_eq!(edit.cursors[0].focus, r(&[1, 0], 1));
    }

    #[test]
    fn test_paste_into_empty_list() {
        let d = doc(file(vec![args(vec![tok("a")]), args(vec![])]));
        let root = d.root_node();
        let mut cursor = copied(&root, r(&[0, 0], 0));
        cursor.focus = r(&[1, 0], 0);
        let Outcome::Done(edit) = paste(&Plain, &d.root, &[cursor]).unwrap() else {
            panic!("paste rejected");
        };
        let new_root = Node::List(edit.root);
        assert_eq!(token_texts(&new_root), vec!["a", "a"]);
        assert!(!new_root.get_by_path(&[1, 0]).unwrap().is_placeholder());
    }

    #[test]
    fn test_paste_rejections() {
        let d = doc(file(vec![args(vec![tok("a"), tok("b")])]));
        let root = d.root_node();
        let empty = Cursor::new(r(&[0, 0], 0));
        assert!(matches!(
            paste(&Plain, &d.root, &[empty]).unwrap(),
            Outcome::Rejected(Warning::EmptyClipboard)
        ));

        let one = copied(&root, r(&[0, 0], 0));
        let two = Cursor {
            focus: r(&[0, 0], 0),
            ..copied(&root, r(&[0, 1], 0))
        };
        assert!(matches!(
            paste(&Plain, &d.root, &[one, two]).unwrap(),
            Outcome::Rejected(Warning::AmbiguousPaste)
        ));
    }
}
