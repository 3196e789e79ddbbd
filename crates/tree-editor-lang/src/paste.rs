//! Paste and rename rules.
//!
//! A clipboard is first offered flattened (its children spliced into the target list) when it
//! holds a run of siblings or a transparent list of the target's kind, and then nested as a
//! single node. Each candidate node must fit the slot it lands in; a few near misses are
//! adapted on the way, such as a bare identifier pasted into an object becoming a shorthand
//! property.

use tree_editor_core::{Clipboard, ListNode, Node, TokenNode};

use crate::kinds::*;
use crate::lexer::is_identifier;

pub fn accept_paste(
    parent: &ListNode,
    first: usize,
    _last: usize,
    clipboard: &Clipboard,
) -> Option<Vec<Node>> {
    let node = &clipboard.node;
    if let Node::List(list) = node
        && (clipboard.is_partial_copy || (list.equivalent_to_content && list.kind == parent.kind))
        && let Some(content) = fit(parent, first, &list.content)
    {
        return Some(content);
    }
    if !nests(node) {
        return None;
    }
    fit(parent, first, std::slice::from_ref(node))
}

/// Whether `node` means something on its own.
fn nests(node: &Node) -> bool {
    match node {
        // A postfix run like `.bind(this)` without its head.
        Node::List(list) if list.kind == TIGHT => list.content.first().is_some_and(is_chain_head),
        _ => true,
    }
}

/// Adapt `items` to replace content of `parent` starting at `first`.
fn fit(parent: &ListNode, first: usize, items: &[Node]) -> Option<Vec<Node>> {
    if items.is_empty() {
        return None;
    }
    match parent.kind {
        FILE => all(items, is_statement),
        ARGUMENTS | ARRAY => all(items, is_expression),
        PARENTHESIZED if items.len() == 1 => all(items, is_expression),
        LOOSE => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Node::List(list) if list.kind == LOOSE => out.extend(list.content.iter().cloned()),
                    item if is_expression(item) || is_operator(item) => out.push(item.clone()),
                    _ => return None,
                }
            }
            Some(out)
        }
        TIGHT => {
            let mut out = Vec::with_capacity(items.len() + 1);
            let mut rest = items;
            if first == 0 {
                let (head, tail) = items.split_first()?;
                match head {
                    Node::List(list) if list.kind == TIGHT => out.extend(list.content.iter().cloned()),
                    Node::List(list) if list.kind == LOOSE => out.push(parenthesized(head.clone())),
                    head if is_chain_head(head) => out.push(head.clone()),
                    _ => return None,
                }
                rest = tail;
            }
            for item in rest {
                if !is_chain_link(item) {
                    return None;
                }
                out.push(item.clone());
            }
            Some(out)
        }
        OBJECT => items
            .iter()
            .map(|item| match item {
                Node::List(list) if list.kind == PROPERTY => Some(item.clone()),
                Node::Token(token) if token.kind == IDENT => Some(shorthand_property(item.clone())),
                _ => None,
            })
            .collect(),
        DECLARATION => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let fits = if first + i == 0 {
                    is_keyword(item)
                } else {
                    item.kind() == DECLARATOR
                };
                if !fits {
                    return None;
                }
                out.push(item.clone());
            }
            Some(out)
        }
        PROPERTY | DECLARATOR if items.len() == 1 => {
            let item = &items[0];
            let fits = match parent.struct_key(first) {
                Some(NAME_KEY) => {
                    item.kind() == IDENT || (parent.kind == PROPERTY && item.kind() == STRING)
                }
                Some(_) => is_expression(item),
                None => false,
            };
            fits.then(|| items.to_vec())
        }
        _ => None,
    }
}

fn all(items: &[Node], accept: fn(&Node) -> bool) -> Option<Vec<Node>> {
    items.iter().all(accept).then(|| items.to_vec())
}

fn parenthesized(expression: Node) -> Node {
    ListNode::new(PARENTHESIZED, ("(", ")"), vec![expression]).into()
}

fn shorthand_property(name: Node) -> Node {
    ListNode::new(PROPERTY, ("", ""), vec![name])
        .with_struct_keys(vec![NAME_KEY])
        .into()
}

/// Identifiers and member names can be renamed to any other identifier.
pub fn renamed(token: &TokenNode, new_name: &str) -> Option<Node> {
    match token.kind {
        IDENT if is_identifier(new_name) => Some(TokenNode::new(IDENT, new_name).into()),
        MEMBER => {
            let name = new_name.strip_prefix('.').unwrap_or(new_name);
            is_identifier(name).then(|| TokenNode::new(MEMBER, format!(".{name}")).into())
        }
        _ => None,
    }
}
