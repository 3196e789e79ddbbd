//! Engine errors and warnings.
//!
//! Failures come in three tiers:
//!
//! 1. [`EngineError`]: a broken invariant. The command is aborted and the caller keeps its
//!    previous [`Snapshot`](crate::Snapshot).
//! 2. [`Warning`] for an expected-but-unsatisfiable operation (invalid paste target, zero
//!    search matches, ...). The batch is rejected as a whole and cursors keep their focus.
//! 3. [`Warning::InsertionRejected`] / [`Warning::InsertionParse`]: typed text could not be
//!    committed. Insert mode stays active with the text intact.

use thiserror::Error;

use crate::grammar::ParseError;
use crate::insertion::InsertionError;
use crate::path::{EvenPathRange, Path, PathError};
use crate::replace::ReplaceError;
use crate::search::SearchError;

/// Fatal engine error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A cursor or mark focus does not resolve against the current root.
    #[error("focus {0:?} does not resolve against the document")]
    InvalidFocus(EvenPathRange),

    /// A path does not resolve against the current root.
    #[error("path {0:?} does not resolve against the document")]
    InvalidPath(Path),

    /// A struct list has a different number of keys than children.
    #[error("struct list at {path:?} has {keys} keys for {content} children")]
    StructKeyCount {
        /// Path of the list.
        path: Path,
        /// Number of keys.
        keys: usize,
        /// Number of children.
        content: usize,
    },

    /// A struct list repeats a key.
    #[error("struct list at {path:?} repeats key `{key}`")]
    DuplicateStructKey {
        /// Path of the list.
        path: Path,
        /// The repeated key.
        key: &'static str,
    },

    /// The document root must be a list.
    #[error("document root is not a list")]
    RootNotList,

    /// Invalid replacement batch.
    #[error("replace failed: {0}")]
    Replace(#[from] ReplaceError),

    /// Invalid path conversion.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The grammar could not reparse text the engine printed.
    #[error("printed document does not reparse: {0}")]
    Reparse(#[from] ParseError),

    /// Reprinting and reparsing a repaired tree changed its shape.
    #[error("reprinting the document would change its tree at {0:?}")]
    ShapeMismatch(Path),

    /// An edit removed every cursor.
    #[error("edit left no cursors")]
    NoCursors,

    /// The command is not available in the current mode.
    #[error("command `{0}` is not available in {1:?} mode")]
    WrongMode(&'static str, crate::snapshot::Mode),
}

/// Non-fatal outcome of a rejected command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    /// Paste with an empty clipboard.
    #[error("clipboard is empty")]
    EmptyClipboard,

    /// At least one cursor could not accept its clipboard.
    #[error("clipboard content does not fit at every cursor")]
    PasteRejected,

    /// Two cursors tried to paste over the same node.
    #[error("pasted ranges overlap")]
    AmbiguousPaste,

    /// Copy of a partial struct list.
    #[error("cannot copy part of a struct list")]
    PartialStructCopy,

    /// Rename on a node the grammar cannot rename.
    #[error("only identifiers can be renamed")]
    RenameRejected,

    /// Search found nothing under any cursor.
    #[error("no search matches within any cursor")]
    NoSearchMatches,

    /// Strict search found nothing under some cursors.
    #[error("{0} cursor(s) had no search matches")]
    PartialSearchMatches(usize),

    /// Cursors overlap without nesting.
    #[error("cursor ranges overlap without nesting")]
    OverlappingCursors,

    /// Reduce-across on cursors that were never split by a search.
    #[error("cursors share no search lineage")]
    NoCursorLineage,

    /// Jump to a mark that was never set or no longer exists.
    #[error("no mark named `{0}`")]
    UnknownMark(char),

    /// The search query could not be compiled.
    #[error("invalid search: {0}")]
    InvalidSearch(#[from] SearchError),

    /// Typed text parsed but does not fit the existing tree.
    #[error("insertion rejected: {0}")]
    InsertionRejected(#[from] InsertionError),

    /// Typed text does not parse.
    #[error("insertion does not parse: {0}")]
    InsertionParse(ParseError),
}
