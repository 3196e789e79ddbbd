#![warn(missing_docs)]
//! Tree Editor Core - Headless Structural Editing Engine
//!
//! # Overview
//!
//! `tree-editor-core` edits source code as a syntax tree instead of a character stream. Every
//! command works on tree selections held by any number of cursors, and the document stays
//! printable and reparseable by its grammar after every command. Rendering, key handling and
//! the concrete language are left to the host; the language plugs in through the [`Grammar`]
//! trait.
//!
//! # Core Features
//!
//! - **Persistent Trees**: `Arc`-shared nodes with stable identities; an edit rebuilds only the
//!   ancestor chain
//! - **Path Ranges**: selections addressed by index paths, in even and uneven form
//! - **Multi-Cursor Batches**: delete, paste and rename settle every cursor in one atomic pass
//! - **Validity Repair**: placeholders fill grammar-mandated slots left empty by an edit
//! - **Checked Insertion**: typed text is reparsed and accepted only if the old tree survives
//! - **Structural Search**: exact-node, kind and text queries that split cursors per match
//! - **Cursor History**: undo/redo of selections, marks carried across edits
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Editor Session & Key Bindings              │  ← Host API
//! ├─────────────────────────────────────────────┤
//! │  Snapshot & Command Reducer                 │  ← apply_command
//! ├─────────────────────────────────────────────┤
//! │  Cursor Operations                          │  ← Per-cursor and batch
//! ├─────────────────────────────────────────────┤
//! │  Replace · Repair · Insertion · Tracking    │  ← Tree transformations
//! ├─────────────────────────────────────────────┤
//! │  Focus Normalization & Path Algebra         │  ← Addressing
//! ├─────────────────────────────────────────────┤
//! │  Node / Doc                                 │  ← Document model
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use tree_editor_core::{EvenPathRange, ListNode, Node, SyntaxKind, TokenNode, normalize_in};
//!
//! const IDENT: SyntaxKind = SyntaxKind(1);
//!
//! // `f(x)`: a transparent call wrapper holding a name and an argument list.
//! let arguments = ListNode::new(SyntaxKind(3), ("(", ")"), vec![TokenNode::new(IDENT, "x").into()]);
//! let call = ListNode::new(SyntaxKind(2), ("", ""), vec![TokenNode::new(IDENT, "f").into(), arguments.into()])
//!     .transparent();
//! let root = Node::from(ListNode::new(SyntaxKind(0), ("", ""), vec![call.into()]).transparent());
//!
//! // Selecting the wrapper really selects its children.
//! let focus = normalize_in(&root, &EvenPathRange::at(vec![0]));
//! assert_eq!(focus, EvenPathRange::new(vec![0, 0], 1));
//! ```
//!
//! # Module Description
//!
//! - [`node`] - Token/list nodes and documents
//! - [`path`] - Paths and path ranges
//! - [`focus`] - Focus normalization
//! - [`replace`] - Batched sibling-range replacement
//! - [`placeholders`] - Validity repair
//! - [`insertion`] - Validation of typed text
//! - [`track`] - Range tracking across revisions
//! - [`cursor`] - Cursor operations
//! - [`snapshot`] - Engine state and command reducer
//! - [`state`] - Host session

pub mod commands;
pub mod config;
pub mod cursor;
pub mod error;
pub mod focus;
pub mod grammar;
pub mod history;
pub mod insertion;
pub mod keymap;
pub mod node;
pub mod path;
pub mod path_mapper;
pub mod placeholders;
pub mod range_groups;
pub mod replace;
pub mod search;
pub mod snapshot;
pub mod state;
pub mod text;
pub mod track;

pub use commands::{Command, CursorCommand, EditCommand, InsertCommand};
pub use config::EditorConfig;
pub use cursor::{
    Clipboard, Cursor, CursorId, Direction, Edit, InsertSide, LeafMoveMode, Mark, Outcome,
    ReduceAcrossSide, ReduceSide,
};
pub use error::{EngineError, Warning};
pub use focus::{normalize_in, normalize_out};
pub use grammar::{Diagnostic, Grammar, ListShape, ParseError, RecordSlot, default_accept_paste};
pub use history::CursorHistory;
pub use insertion::{CheckedInsertion, InsertionError, check_insertion};
pub use keymap::{KeyEvent, command_for_key};
pub use node::{Doc, ListNode, Node, NodeId, SyntaxKind, TextRange, TokenNode};
pub use path::{EvenPathRange, Path, PathError, PathRange, UnevenPathRange};
pub use path_mapper::PathMapper;
pub use replace::{ListItemReplacement, NewContentRange, ReplaceError, ReplaceOutcome, replace_multiple};
pub use search::{SearchError, SearchOptions, SearchQuery};
pub use snapshot::{InsertSession, Mode, Snapshot, Transition, apply_command};
pub use state::{Editor, PublicState, StateCallback};
pub use text::Insertion;
pub use track::track_ranges;
