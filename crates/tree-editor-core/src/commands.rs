//! Command vocabulary.
//!
//! # Overview
//!
//! Every state change of an editing session is expressed as a [`Command`], applied with
//! [`apply_command`](crate::apply_command) or [`Editor::execute`](crate::Editor::execute).
//! Commands fall into three groups:
//!
//! - **Cursor commands**: move, grow, shrink, copy, search, mark and queue cursors. They never
//!   change the document.
//! - **Edit commands**: delete, paste and rename at every cursor as one atomic batch.
//! - **Insert commands**: enter insert mode, type, erase and commit free text.
//!
//! # Example
//!
//! ```rust
//! use tree_editor_core::{Command, CursorCommand, Direction, LeafMoveMode};
//!
//! let next_leaf = Command::Cursor(CursorCommand::MoveLeaf {
//!     direction: Direction::Forward,
//!     mode: LeafMoveMode::Move,
//! });
//! assert_eq!(next_leaf.name(), "move_leaf");
//! ```

use crate::cursor::{Direction, InsertSide, LeafMoveMode, ReduceAcrossSide, ReduceSide};
use crate::search::SearchQuery;

/// Commands that only move, grow or shrink cursors
#[derive(Debug, Clone, PartialEq)]
pub enum CursorCommand {
    /// Move to, or extend towards, the neighbouring leaf
    MoveLeaf {
        /// Which neighbour.
        direction: Direction,
        /// Move, extend or shrink.
        mode: LeafMoveMode,
    },
    /// Select the content of the first delimited list inside the selection
    MoveIn {
        /// Only enter lists opened by this delimiter.
        delimiter: Option<String>,
    },
    /// Select the closest enclosing delimited list
    MoveOut {
        /// Only leave to lists closed by this delimiter.
        delimiter: Option<String>,
    },
    /// Grow to the smallest enclosing structure
    MoveToParent,
    /// Reduce each selection to one of its ends
    ReduceSelection(ReduceSide),
    /// Keep only some of the cursors of each search lineage group
    ReduceAcross(ReduceAcrossSide),
    /// Copy each selection into its cursor's clipboard
    Copy,
    /// Replace each cursor by one cursor per match inside its selection
    Search {
        /// What to look for.
        query: SearchQuery,
    },
    /// Remember each selection under a name
    SetMark(char),
    /// Return each cursor to the selection remembered under a name
    JumpToMark(char),
    /// Replace the queue with the current cursors
    QueueCursors,
    /// Add the queued cursors to the current ones and empty the queue
    AddQueuedCursors,
    /// Empty the queue
    ClearQueuedCursors,
    /// Restore the previous cursor set
    Undo,
    /// Restore the cursor set undone last
    Redo,
}

/// Commands that change the document at every cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Delete every selection
    Delete,
    /// Paste each cursor's clipboard over its selection
    Paste,
    /// Rename the token under every cursor
    Rename {
        /// Replacement text.
        new_name: String,
    },
}

/// Commands of insert mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertCommand {
    /// Enter insert mode before or after every selection
    Start(InsertSide),
    /// Type text at every insertion point
    Text(String),
    /// Erase the last keystroke
    Backspace,
    /// Reparse the typed text and return to normal mode
    Commit,
    /// Drop the typed text and return to normal mode
    Discard,
}

/// Editor command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Cursor command
    Cursor(CursorCommand),
    /// Edit command
    Edit(EditCommand),
    /// Insert-mode command
    Insert(InsertCommand),
}

impl Command {
    /// Short stable name, for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Cursor(cmd) => match cmd {
                CursorCommand::MoveLeaf { .. } => "move_leaf",
                CursorCommand::MoveIn { .. } => "move_in",
                CursorCommand::MoveOut { .. } => "move_out",
                CursorCommand::MoveToParent => "move_to_parent",
                CursorCommand::ReduceSelection(_) => "reduce_selection",
                CursorCommand::ReduceAcross(_) => "reduce_across",
                CursorCommand::Copy => "copy",
                CursorCommand::Search { .. } => "search",
                CursorCommand::SetMark(_) => "set_mark",
                CursorCommand::JumpToMark(_) => "jump_to_mark",
                CursorCommand::QueueCursors => "queue_cursors",
                CursorCommand::AddQueuedCursors => "add_queued_cursors",
                CursorCommand::ClearQueuedCursors => "clear_queued_cursors",
                CursorCommand::Undo => "undo",
                CursorCommand::Redo => "redo",
            },
            Command::Edit(cmd) => match cmd {
                EditCommand::Delete => "delete",
                EditCommand::Paste => "paste",
                EditCommand::Rename { .. } => "rename",
            },
            Command::Insert(cmd) => match cmd {
                InsertCommand::Start(_) => "start_insert",
                InsertCommand::Text(_) => "insert_text",
                InsertCommand::Backspace => "backspace",
                InsertCommand::Commit => "commit_insert",
                InsertCommand::Discard => "discard_insert",
            },
        }
    }
}

impl From<CursorCommand> for Command {
    fn from(cmd: CursorCommand) -> Self {
        Command::Cursor(cmd)
    }
}

impl From<EditCommand> for Command {
    fn from(cmd: EditCommand) -> Self {
        Command::Edit(cmd)
    }
}

impl From<InsertCommand> for Command {
    fn from(cmd: InsertCommand) -> Self {
        Command::Insert(cmd)
    }
}
