//! Shape table: what every list needs to stay printable.

use tree_editor_core::{ListNode, ListShape, Node, RecordSlot, TokenNode};

use crate::kinds::*;

/// Text of the identifier standing in for a missing value.
pub const PLACEHOLDER_NAME: &str = "placeholder";

fn placeholder_ident() -> Node {
    TokenNode::new(IDENT, PLACEHOLDER_NAME).into()
}

fn name_slot() -> RecordSlot {
    RecordSlot {
        key: NAME_KEY,
        default: Some(placeholder_ident()),
    }
}

/// A declarator holding only a placeholder name.
fn placeholder_declarator() -> Node {
    ListNode::new(DECLARATOR, ("", ""), vec![placeholder_ident()])
        .with_struct_keys(vec![NAME_KEY])
        .into()
}

/// A shorthand property holding only a placeholder name.
fn placeholder_property() -> Node {
    ListNode::new(PROPERTY, ("", ""), vec![placeholder_ident()])
        .with_struct_keys(vec![NAME_KEY])
        .into()
}

pub fn list_shape(list: &ListNode) -> ListShape {
    match list.kind {
        LOOSE => ListShape::Alternating {
            operand: placeholder_ident(),
            operator: TokenNode::new(OPERATOR, "+").into(),
            is_operator,
        },
        TIGHT => ListShape::Headed {
            head: placeholder_ident(),
            is_head: is_chain_head,
            tail: None,
        },
        // A declaration has no delimiters, so typed text can never extend it in place. A
        // repaired `let placeholder` is replaced by deleting the whole statement and
        // inserting a new one.
        DECLARATION => ListShape::Headed {
            head: TokenNode::new(KEYWORD, "let").into(),
            is_head: is_keyword,
            tail: Some(placeholder_declarator()),
        },
        DECLARATOR => ListShape::Record {
            slots: vec![
                name_slot(),
                RecordSlot {
                    key: INITIALIZER_KEY,
                    default: None,
                },
            ],
        },
        PROPERTY => ListShape::Record {
            slots: vec![
                name_slot(),
                RecordSlot {
                    key: VALUE_KEY,
                    default: None,
                },
            ],
        },
        PARENTHESIZED => ListShape::NonEmpty {
            placeholder: placeholder_ident(),
        },
        _ => ListShape::Free,
    }
}

/// Chains of one element print the same as the element.
pub fn collapses_singleton(list: &ListNode) -> bool {
    matches!(list.kind, LOOSE | TIGHT)
}

pub fn anchor_placeholder(list: &ListNode) -> Node {
    let anchor = match list.kind {
        OBJECT => placeholder_property(),
        DECLARATION => placeholder_declarator(),
        _ => placeholder_ident(),
    };
    anchor.into_placeholder()
}
