#![warn(missing_docs)]
//! `tree-editor-lang` - a small JavaScript-like language for `tree-editor-core`.
//!
//! # Overview
//!
//! [`MiniJs`] implements [`Grammar`] for a subset of JavaScript that is rich enough to exercise
//! every editor command: declarations, binary chains, calls and member access, arrays, objects
//! and parenthesized expressions. It parses straight into the editor tree, prints a canonical
//! layout and tells the engine how to repair and paste into each kind of list.
//!
//! # Tree Layout
//!
//! | Source           | Tree                                                       |
//! |------------------|------------------------------------------------------------|
//! | `a + b * c`      | transparent [`LOOSE`](kinds::LOOSE) `[a, +, b, *, c]`       |
//! | `f(x).bind(y)`   | transparent [`TIGHT`](kinds::TIGHT) `[f, (x), .bind, (y)]`  |
//! | `let a = 1, b`   | [`DECLARATION`](kinds::DECLARATION) `[let, a = 1, b]`       |
//! | `{ a: 1, b }`    | [`OBJECT`](kinds::OBJECT) of [`PROPERTY`](kinds::PROPERTY) records |
//!
//! # Example
//!
//! ```rust
//! use tree_editor_core::{Command, CursorCommand, EditCommand, Editor, EditorConfig};
//! use tree_editor_lang::MiniJs;
//!
//! let mut editor = Editor::new(MiniJs, "f(x)", EditorConfig::default()).unwrap();
//! editor.execute(CursorCommand::MoveIn { delimiter: Some("(".into()) }.into()).unwrap();
//! editor.execute(Command::Edit(EditCommand::Delete)).unwrap();
//! assert_eq!(editor.text(), "f()");
//! ```

pub mod kinds;
mod lexer;
mod parser;
mod paste;
mod printer;
mod shapes;

use tracing::debug;
use tree_editor_core::{
    Clipboard, Doc, EditorConfig, EngineError, Grammar, ListNode, ListShape, Node, ParseError,
    Snapshot, TokenNode,
};

pub use lexer::is_identifier;
pub use shapes::PLACEHOLDER_NAME;

/// The mini-JS grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiniJs;

impl MiniJs {
    /// Parse `text` into a ready-to-edit snapshot.
    pub fn snapshot(&self, text: &str, config: &EditorConfig) -> Result<Snapshot, EngineError> {
        Snapshot::from_text(self, text, config)
    }
}

impl Grammar for MiniJs {
    fn parse(&self, text: &str) -> Result<Doc, ParseError> {
        parser::parse(text).inspect_err(|err| {
            if let Some(first) = err.diagnostics.first() {
                debug!(diagnostic = %first, "mini-js text rejected");
            }
        })
    }

    fn print(&self, root: &ListNode) -> String {
        printer::print(root)
    }

    fn list_shape(&self, list: &ListNode) -> ListShape {
        shapes::list_shape(list)
    }

    fn collapses_singleton(&self, list: &ListNode) -> bool {
        shapes::collapses_singleton(list)
    }

    fn accept_paste(
        &self,
        parent: &ListNode,
        first: usize,
        last: usize,
        clipboard: &Clipboard,
    ) -> Option<Vec<Node>> {
        paste::accept_paste(parent, first, last, clipboard)
    }

    fn renamed(&self, token: &TokenNode, new_name: &str) -> Option<Node> {
        paste::renamed(token, new_name)
    }

    fn anchor_placeholder(&self, list: &ListNode) -> Node {
        shapes::anchor_placeholder(list)
    }
}
