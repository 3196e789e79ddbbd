//! Delete and rename.

use std::sync::Arc;

use tracing::warn;

use crate::error::{EngineError, Warning};
use crate::focus::is_focus_on_empty_list_content;
use crate::grammar::Grammar;
use crate::node::{ListNode, Node};
use crate::path::{EvenPathRange, parent_path};
use crate::replace::{ListItemReplacement, NewContentRange, replace_multiple};

use super::{Cursor, Edit, Outcome};

/// Delete every cursor's selection in one pass.
///
/// A cursor on the root deletes every child of the root. Cursors resting on empty list content
/// have nothing to delete and stay where they are; cursors whose selection was swallowed by
/// another cursor's deletion are dropped. Every other cursor ends up on the list it deleted from.
pub fn delete(root: &Arc<ListNode>, cursors: &[Cursor]) -> Result<Edit, EngineError> {
    let root_node = Node::List(root.clone());
    let mut replacements = Vec::new();
    let mut owner: Vec<Option<usize>> = Vec::with_capacity(cursors.len());
    let mut moved = Vec::with_capacity(cursors.len());

    for cursor in cursors {
        let mut range = cursor.focus.flip_forward();
        if is_focus_on_empty_list_content(&root_node, &range)
            || (range.anchor.is_empty() && root.content.is_empty())
        {
            owner.push(None);
            moved.push(cursor.settled());
            continue;
        }
        if range.anchor.is_empty() {
            range = EvenPathRange::new(vec![0], root.content.len() as isize - 1);
        }
        let parent = parent_path(&range.anchor).to_vec();
        let is_struct = root_node
            .get_by_path(&parent)
            .and_then(Node::as_list)
            .ok_or_else(|| EngineError::InvalidFocus(cursor.focus.clone()))?
            .struct_keys
            .is_some();
        owner.push(Some(replacements.len()));
        replacements.push(ListItemReplacement {
            range,
            content: Vec::new(),
            struct_keys: is_struct.then(Vec::new),
        });
        moved.push(cursor.with_focus(EvenPathRange::at(parent)));
    }

    if replacements.is_empty() {
        return Ok(Edit {
            root: root.clone(),
            cursors: moved,
        });
    }

    let outcome = replace_multiple(root, &replacements)?;
    let cursors: Vec<Cursor> = moved
        .into_iter()
        .zip(owner)
        .filter(|(_, owner)| owner.is_none_or(|r| outcome.used[r]))
        .map(|(cursor, _)| cursor)
        .collect();
    if cursors.is_empty() {
        return Err(EngineError::NoCursors);
    }
    Ok(Edit {
        root: outcome.root,
        cursors,
    })
}

/// Rename the token under every cursor.
///
/// Each cursor must select exactly one token the grammar considers renamable; otherwise
/// nothing is renamed.
pub fn rename<G: Grammar + ?Sized>(
    grammar: &G,
    root: &Arc<ListNode>,
    cursors: &[Cursor],
    new_name: &str,
) -> Result<Outcome<Edit>, EngineError> {
    let root_node = Node::List(root.clone());
    let mut replacements = Vec::with_capacity(cursors.len());
    for cursor in cursors {
        let focus = &cursor.focus;
        let renamed = match root_node.get_by_path(&focus.anchor) {
            Some(Node::Token(token)) if focus.offset == 0 && !focus.anchor.is_empty() => {
                grammar.renamed(token, new_name)
            }
            _ => None,
        };
        let Some(renamed) = renamed else {
            warn!(focus = ?focus, "cursor is not on a renamable token");
            return Ok(Outcome::Rejected(Warning::RenameRejected));
        };
        let key = root_node
            .get_by_path(parent_path(&focus.anchor))
            .and_then(Node::as_list)
            .and_then(|parent| parent.struct_key(*focus.anchor.last().unwrap_or(&0)));
        replacements.push(ListItemReplacement {
            range: focus.clone(),
            content: vec![renamed],
            struct_keys: key.map(|k| vec![k]),
        });
    }

    let outcome = replace_multiple(root, &replacements)?;
    if outcome.ambiguous_overlap {
        return Ok(Outcome::Rejected(Warning::OverlappingCursors));
    }
    let mut renamed = Vec::with_capacity(cursors.len());
    for (cursor, range) in cursors.iter().zip(&outcome.new_ranges) {
        match range {
            Some(NewContentRange::Range(range)) => renamed.push(cursor.with_focus(range.clone())),
            _ => return Ok(Outcome::Rejected(Warning::RenameRejected)),
        }
    }
    Ok(Outcome::Done(Edit {
        root: outcome.root,
        cursors: renamed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ParseError;
    use crate::node::build::*;
    use crate::node::{Doc, TextRange, TokenNode};
    use pretty_assertions::assert_eq;

    struct Renamer;

    impl Grammar for Renamer {
        fn parse(&self, text: &str) -> Result<Doc, ParseError> {
            Err(ParseError::new(TextRange::new(0, text.len()), "not supported"))
        }

        fn print(&self, _root: &ListNode) -> String {
            String::new()
        }

        fn renamed(&self, token: &TokenNode, new_name: &str) -> Option<Node> {
            (token.kind == IDENT).then(|| TokenNode::new(IDENT, new_name).into())
        }

        fn anchor_placeholder(&self, _list: &ListNode) -> Node {
            TokenNode::new(IDENT, "_").placeholder().into()
        }
    }

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    #[test]
    fn test_delete_from_root_empties_document() {
        let d = doc(file(vec![tight(vec![tok("f"), args(vec![tok("x")])])]));
        let edit = delete(&d.root, &[Cursor::new(r(&[], 0))]).unwrap();
        assert!(edit.root.content.is_empty());
        assert_eq!(edit.cursors.len(), 1);
        assert_eq!(edit.cursors[0].focus, r(&[], 0));

        let again = delete(&edit.root, &edit.cursors).unwrap();
        assert!(Arc::ptr_eq(&again.root, &edit.root));
        assert_eq!(again.cursors[0].focus, r(&[], 0));
    }

    #[test]
    fn test_delete_drops_swallowed_cursors() {
        let d = doc(file(vec![args(vec![tok("a"), args(vec![tok("b")]), tok("c")])]));
        let outer = Cursor::new(r(&[0, 0], 1));
        let inner = Cursor::new(r(&[0, 1, 0], 0));
        let edit = delete(&d.root, &[outer.clone(), inner]).unwrap();
        assert_eq!(edit.cursors.len(), 1);
        assert_eq!(edit.cursors[0].id, outer.id);
        assert_eq!(edit.cursors[0].focus, r(&[0], 0));
        assert_eq!(edit.root.content[0].content().len(), 1);
    }

    #[test]
    fn test_delete_keeps_cursor_on_empty_list_content() {
        let d = doc(file(vec![args(vec![]), args(vec![tok("a")])]));
        let resting = Cursor::new(r(&[0, 0], 0));
        let deleting = Cursor::new(r(&[1, 0], 0));
        let edit = delete(&d.root, &[resting.clone(), deleting]).unwrap();
        assert_eq!(edit.cursors.len(), 2);
        assert_eq!(edit.cursors[0].focus, resting.focus);
        assert_eq!(edit.cursors[1].focus, r(&[1], 0));
    }

    #[test]
    fn test_delete_struct_field_keeps_keys_consistent() {
        let d = doc(file(vec![record(vec!["name", "value"], vec![tok("k"), tok("v")])]));
        let edit = delete(&d.root, &[Cursor::new(r(&[0, 1], 0))]).unwrap();
        let Node::List(list) = &edit.root.content[0] else {
            panic!("record is a list");
        };
        assert_eq!(list.struct_keys, Some(vec!["name"]));
    }

    #[test]
    fn test_rename_all_or_nothing() {
        let d = doc(file(vec![record(vec!["name", "value"], vec![tok("k"), tok("v")]), tok("w")]));
        let cursors = [Cursor::new(r(&[0, 0], 0)), Cursor::new(r(&[1], 0))];
        let Outcome::Done(edit) = rename(&Renamer, &d.root, &cursors, "n").unwrap() else {
            panic!("rename rejected");
        };
        let root = Node::List(edit.root);
        let record = root.get_by_path(&[0]).and_then(Node::as_list).unwrap();
        assert_eq!(record.struct_keys, Some(vec!["name", "value"]));
        assert_eq!(&*record.content[0].as_token().unwrap().text, "n");
        assert_eq!(edit.cursors[1].focus, r(&[1], 0));

        let on_list = [Cursor::new(r(&[0], 0))];
        assert!(matches!(
            rename(&Renamer, &d.root, &on_list, "n").unwrap(),
            Outcome::Rejected(Warning::RenameRejected)
        ));
    }
}
