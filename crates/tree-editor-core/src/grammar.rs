//! The grammar collaborator.
//!
//! The engine is grammar-agnostic: parsing, printing and every question of the form "what may
//! stand in this slot" are delegated to a [`Grammar`] implementation supplied by the host.

use std::fmt;

use thiserror::Error;

use crate::cursor::Clipboard;
use crate::node::{Doc, ListNode, Node, TextRange, TokenNode};

/// A parse diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Offending text.
    pub range: TextRange,
    /// Human readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.range.pos, self.range.end)
    }
}

/// Text was rejected by the parser. Holds at least one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .diagnostics.first().map(ToString::to_string).unwrap_or_default())]
pub struct ParseError {
    /// Every diagnostic reported for the text.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Single-diagnostic error.
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            diagnostics: vec![Diagnostic {
                range,
                message: message.into(),
            }],
        }
    }
}

/// One field of a fixed-shape record.
#[derive(Debug, Clone)]
pub struct RecordSlot {
    /// Struct key of the field.
    pub key: &'static str,
    /// Placeholder inserted when the field is missing; `None` for optional fields.
    pub default: Option<Node>,
}

/// Structural requirement of a list, as answered by the grammar's shape table.
///
/// Placeholder nodes returned here are templates: the engine gives every inserted copy a fresh
/// identity and flags it as a placeholder.
#[derive(Debug, Clone)]
pub enum ListShape {
    /// Any sequence of children is printable.
    Free,
    /// At least one child.
    NonEmpty {
        /// Child inserted into an empty list.
        placeholder: Node,
    },
    /// Children alternate operand, operator, operand, ... starting and ending with an operand.
    Alternating {
        /// Inserted where an operand is missing.
        operand: Node,
        /// Inserted between two adjacent operands.
        operator: Node,
        /// Classifies existing children.
        is_operator: fn(&Node) -> bool,
    },
    /// Fixed-shape record; children are ordered by slot.
    Record {
        /// Slots in print order.
        slots: Vec<RecordSlot>,
    },
    /// The first child must satisfy `is_head`, optionally followed by at least one more child.
    Headed {
        /// Inserted in front when the first child is not a valid head.
        head: Node,
        /// Classifies the current first child.
        is_head: fn(&Node) -> bool,
        /// Appended when nothing follows the head.
        tail: Option<Node>,
    },
}

/// Parser, printer and shape table of a language.
pub trait Grammar {
    /// Parse text into a document. Any diagnostic rejects the text.
    fn parse(&self, text: &str) -> Result<Doc, ParseError>;

    /// Canonical text of a tree. `parse(print(root))` must yield the same shape.
    fn print(&self, root: &ListNode) -> String;

    /// Structural requirement of `list`.
    fn list_shape(&self, _list: &ListNode) -> ListShape {
        ListShape::Free
    }

    /// Whether `list` dissolves into its only child.
    fn collapses_singleton(&self, _list: &ListNode) -> bool {
        false
    }

    /// Content replacing `parent.content[first..=last]` when pasting `clipboard` there.
    ///
    /// `None` rejects the paste at this position.
    fn accept_paste(
        &self,
        parent: &ListNode,
        first: usize,
        last: usize,
        clipboard: &Clipboard,
    ) -> Option<Vec<Node>> {
        default_accept_paste(parent, first, last, clipboard)
    }

    /// Token replacing `token` after renaming it to `new_name`, if the token is renamable.
    fn renamed(&self, _token: &TokenNode, _new_name: &str) -> Option<Node> {
        None
    }

    /// Child synthesized inside an empty list so that a paste has something to replace.
    fn anchor_placeholder(&self, list: &ListNode) -> Node;
}

/// Flatten same-kind partial copies and transparent lists, nest everything else.
pub fn default_accept_paste(
    parent: &ListNode,
    _first: usize,
    _last: usize,
    clipboard: &Clipboard,
) -> Option<Vec<Node>> {
    match &clipboard.node {
        Node::List(list)
            if list.kind == parent.kind
                && (clipboard.is_partial_copy || list.equivalent_to_content) =>
        {
            Some(list.content.clone())
        }
        node => Some(vec![node.clone()]),
    }
}
