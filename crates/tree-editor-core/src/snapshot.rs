//! Engine state and the command reducer.
//!
//! # Overview
//!
//! A [`Snapshot`] is the complete state of an editing session: the document, the cursors, the
//! queued cursors, the mode, the pending insert session and the cursor history. It is a plain
//! value; [`apply_command`] never mutates its input and returns a new snapshot instead, so
//! reverting a failed command is just keeping the old one.
//!
//! After every document change the reducer:
//!
//! 1. repairs the tree and round-trips it through the grammar,
//! 2. carries cursor focuses over the repair and marks over the whole edit,
//! 3. re-sorts the cursors and checks that every focus resolves,
//! 4. empties the cursor queue and the cursor history.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::commands::{Command, CursorCommand, EditCommand, InsertCommand};
use crate::config::EditorConfig;
use crate::cursor::{
    Cursor, CursorId, Edit, InsertSide, Outcome, check_focuses, commit_insert, copy,
    delete, jump_to_mark, move_in, move_leaf, move_out, move_to_parent, paste, preview_insert,
    reduce_across, reduce_selection, relocate_marks, rename, search, set_mark, sort_cursors,
    start_insert,
};
use crate::error::{EngineError, Warning};
use crate::focus::{fix_focus, normalize_in};
use crate::grammar::Grammar;
use crate::history::CursorHistory;
use crate::node::{Doc, Node};
use crate::path::EvenPathRange;
use crate::placeholders::{doc_with_all_placeholders, reprint_with_placeholders};

/// Editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Structural commands.
    #[default]
    Normal,
    /// Free text is being typed at every cursor.
    Insert,
}

/// Text typed since entering insert mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertSession {
    /// Insertion point of every cursor, ascending, in the text of the snapshot's document.
    pub positions: Vec<usize>,
    /// Everything typed so far.
    pub text: String,
    /// Length of every keystroke still erasable, oldest first.
    pub keystrokes: VecDeque<usize>,
}

impl InsertSession {
    fn new(positions: Vec<usize>) -> Self {
        Self {
            positions,
            text: String::new(),
            keystrokes: VecDeque::new(),
        }
    }

    fn type_text(&mut self, text: &str, max_keystrokes: usize) {
        if text.is_empty() {
            return;
        }
        self.text.push_str(text);
        self.keystrokes.push_back(text.len());
        if self.keystrokes.len() > max_keystrokes {
            self.keystrokes.pop_front();
        }
    }

    fn backspace(&mut self) {
        if let Some(len) = self.keystrokes.pop_back() {
            self.text.truncate(self.text.len().saturating_sub(len));
        }
    }
}

/// Complete state of an editing session.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current document. In insert mode this is the document before any typing.
    pub doc: Doc,
    /// Cursors, sorted by position. Never empty.
    pub cursors: Vec<Cursor>,
    /// Cursors set aside to be added back later.
    pub queued_cursors: Vec<Cursor>,
    /// Current mode.
    pub mode: Mode,
    /// Insert session, present exactly in insert mode.
    pub insert: Option<InsertSession>,
    /// Cursor undo/redo.
    pub history: CursorHistory,
}

impl Snapshot {
    /// Session on `doc` with a single cursor selecting everything.
    pub fn new(doc: Doc, config: &EditorConfig) -> Self {
        let root = doc.root_node();
        let focus = normalize_in(&root, &EvenPathRange::at(Vec::new()));
        Self {
            doc,
            cursors: vec![Cursor::new(focus)],
            queued_cursors: Vec::new(),
            mode: Mode::Normal,
            insert: None,
            history: CursorHistory::new(config.max_history),
        }
    }

    /// Parse `text` and open a session on it, with placeholders in every empty mandatory slot.
    pub fn from_text<G: Grammar + ?Sized>(
        grammar: &G,
        text: &str,
        config: &EditorConfig,
    ) -> Result<Self, EngineError> {
        let parsed = grammar.parse(text)?;
        let (doc, _) = doc_with_all_placeholders(grammar, &parsed)?;
        Ok(Self::new(doc, config))
    }

    /// The document as the user should see it: while inserting, with the typed text spliced in.
    pub fn display_doc(&self) -> Doc {
        match (&self.mode, &self.insert) {
            (Mode::Insert, Some(session)) => {
                preview_insert(&self.doc, &session.positions, &session.text)
            }
            _ => self.doc.clone(),
        }
    }

    /// Same snapshot with other cursors.
    pub fn with_cursors(&self, cursors: Vec<Cursor>) -> Self {
        Self {
            cursors,
            ..self.clone()
        }
    }
}

/// Result of a successfully applied command.
#[derive(Debug, Clone)]
pub struct Transition {
    /// New state. Equal to the old state if the command was rejected.
    pub snapshot: Snapshot,
    /// Why the command was rejected, if it was.
    pub warnings: Vec<Warning>,
}

/// Apply `command` to `snapshot`.
///
/// A rejected command yields the unchanged state plus a warning. An `Err` means an invariant
/// broke; the caller should keep `snapshot`.
pub fn apply_command<G: Grammar + ?Sized>(
    grammar: &G,
    config: &EditorConfig,
    snapshot: &Snapshot,
    command: Command,
) -> Result<Transition, EngineError> {
    let name = command.name();
    debug!(command = name, mode = ?snapshot.mode, cursors = snapshot.cursors.len(), "apply command");

    let mut next = snapshot.clone();
    let outcome = match (snapshot.mode, command) {
        (Mode::Normal, Command::Cursor(cmd)) => apply_cursor_command(config, &mut next, cmd)?,
        (Mode::Normal, Command::Edit(cmd)) => apply_edit_command(grammar, &mut next, cmd)?,
        (Mode::Normal, Command::Insert(InsertCommand::Start(side))) => {
            enter_insert(&mut next, side)?;
            None
        }
        (Mode::Insert, Command::Insert(cmd)) if !matches!(cmd, InsertCommand::Start(_)) => {
            apply_insert_command(grammar, config, &mut next, cmd)?
        }
        (mode, _) => return Err(EngineError::WrongMode(name, mode)),
    };

    match outcome {
        Some(warning) => {
            warn!(command = name, %warning, "command rejected");
            Ok(Transition {
                snapshot: snapshot.clone(),
                warnings: vec![warning],
            })
        }
        None => Ok(Transition {
            snapshot: next,
            warnings: Vec::new(),
        }),
    }
}

type Rejection = Option<Warning>;

fn apply_cursor_command(
    config: &EditorConfig,
    next: &mut Snapshot,
    command: CursorCommand,
) -> Result<Rejection, EngineError> {
    let root = next.doc.root_node();
    let each = |f: &dyn Fn(&Cursor) -> Cursor| next.cursors.iter().map(f).collect::<Vec<_>>();

    let moved = match command {
        CursorCommand::MoveLeaf { direction, mode } => {
            each(&|c| move_leaf(&root, c, direction, mode))
        }
        CursorCommand::MoveIn { delimiter } => each(&|c| move_in(&root, c, delimiter.as_deref())),
        CursorCommand::MoveOut { delimiter } => {
            each(&|c| move_out(&root, c, delimiter.as_deref()))
        }
        CursorCommand::MoveToParent => each(&|c| move_to_parent(&root, c)),
        CursorCommand::ReduceSelection(side) => each(&|c| reduce_selection(&root, c, side)),
        CursorCommand::ReduceAcross(side) => match reduce_across(&next.cursors, side) {
            Outcome::Done(cursors) => cursors,
            Outcome::Rejected(warning) => return Ok(Some(warning)),
        },
        CursorCommand::Copy => {
            let mut copied = Vec::with_capacity(next.cursors.len());
            for c in &next.cursors {
                match copy(&root, c)? {
                    Outcome::Done(cursor) => copied.push(cursor),
                    Outcome::Rejected(warning) => return Ok(Some(warning)),
                }
            }
            next.cursors = copied;
            return Ok(None);
        }
        CursorCommand::Search { query } => {
            let found = search(
                &next.doc,
                &next.cursors,
                &query,
                config.shallow_search,
                config.strict_search,
            );
            match found {
                Outcome::Done(cursors) => cursors,
                Outcome::Rejected(warning) => return Ok(Some(warning)),
            }
        }
        CursorCommand::SetMark(name) => {
            next.cursors = each(&|c| set_mark(&root, c, name));
            return Ok(None);
        }
        CursorCommand::JumpToMark(name) => {
            let mut jumped = Vec::with_capacity(next.cursors.len());
            for c in &next.cursors {
                match jump_to_mark(&root, c, name) {
                    Outcome::Done(cursor) => jumped.push(cursor),
                    Outcome::Rejected(warning) => return Ok(Some(warning)),
                }
            }
            jumped
        }
        CursorCommand::QueueCursors => {
            next.queued_cursors = each(&Cursor::settled);
            return Ok(None);
        }
        CursorCommand::AddQueuedCursors => {
            if next.queued_cursors.is_empty() {
                return Ok(None);
            }
            let mut cursors = next.cursors.clone();
            for queued in std::mem::take(&mut next.queued_cursors) {
                if cursors.iter().all(|c| c.focus != queued.focus) {
                    cursors.push(Cursor {
                        id: CursorId::fresh(),
                        ..queued
                    });
                }
            }
            cursors
        }
        CursorCommand::ClearQueuedCursors => {
            next.queued_cursors.clear();
            return Ok(None);
        }
        CursorCommand::Undo => {
            let restored = next.history.undo(&root, &next.cursors);
            return restore_cursors(next, &root, restored);
        }
        CursorCommand::Redo => {
            let restored = next.history.redo(&root, &next.cursors);
            return restore_cursors(next, &root, restored);
        }
    };

    let mut moved = moved;
    sort_cursors(&root, &mut moved)?;
    next.history.push(&root, &next.cursors);
    next.cursors = moved;
    Ok(None)
}

fn restore_cursors(
    next: &mut Snapshot,
    root: &Node,
    restored: Option<Vec<Cursor>>,
) -> Result<Rejection, EngineError> {
    match restored {
        Some(mut cursors) => {
            sort_cursors(root, &mut cursors)?;
            next.cursors = cursors;
        }
        None => debug!("cursor history exhausted"),
    }
    Ok(None)
}

fn apply_edit_command<G: Grammar + ?Sized>(
    grammar: &G,
    next: &mut Snapshot,
    command: EditCommand,
) -> Result<Rejection, EngineError> {
    let edit = match command {
        EditCommand::Delete => delete(&next.doc.root, &next.cursors)?,
        EditCommand::Paste => match paste(grammar, &next.doc.root, &next.cursors)? {
            Outcome::Done(edit) => edit,
            Outcome::Rejected(warning) => return Ok(Some(warning)),
        },
        EditCommand::Rename { new_name } => {
            match rename(grammar, &next.doc.root, &next.cursors, &new_name)? {
                Outcome::Done(edit) => edit,
                Outcome::Rejected(warning) => return Ok(Some(warning)),
            }
        }
    };
    settle_edit(grammar, next, edit)?;
    Ok(None)
}

/// Repair the edited tree and carry the cursors over.
fn settle_edit<G: Grammar + ?Sized>(
    grammar: &G,
    next: &mut Snapshot,
    edit: Edit,
) -> Result<(), EngineError> {
    let old_root = next.doc.root_node();
    let (doc, mapper) = reprint_with_placeholders(grammar, &edit.root)?;
    let new_root = doc.root_node();
    trace!(moves = mapper.len(), "repaired edited tree");

    let mut seen = HashSet::new();
    let mut cursors: Vec<Cursor> = edit
        .cursors
        .iter()
        .map(|c| {
            let focus = fix_focus(&new_root, &mapper.map_range(&c.focus));
            c.with_focus(normalize_in(&new_root, &focus))
        })
        .filter(|c| seen.insert(c.focus.clone()))
        .collect();
    if cursors.is_empty() {
        return Err(EngineError::NoCursors);
    }
    replace_document(next, &old_root, doc, &mut cursors)?;
    next.cursors = cursors;
    Ok(())
}

/// Install a new document. Marks are relocated from `old_root`.
fn replace_document(
    next: &mut Snapshot,
    old_root: &Node,
    doc: Doc,
    cursors: &mut [Cursor],
) -> Result<(), EngineError> {
    let new_root = doc.root_node();
    relocate_marks(old_root, &new_root, cursors);
    sort_cursors(&new_root, cursors)?;
    check_focuses(&new_root, cursors)?;
    next.doc = doc;
    next.queued_cursors.clear();
    next.history.clear();
    Ok(())
}

fn enter_insert(next: &mut Snapshot, side: InsertSide) -> Result<(), EngineError> {
    let start = start_insert(&next.doc.root_node(), &next.cursors, side)?;
    next.cursors = start.cursors;
    next.insert = Some(InsertSession::new(start.positions));
    next.mode = Mode::Insert;
    next.history.clear();
    Ok(())
}

fn leave_insert(next: &mut Snapshot) {
    next.insert = None;
    next.mode = Mode::Normal;
    next.history.clear();
}

fn apply_insert_command<G: Grammar + ?Sized>(
    grammar: &G,
    config: &EditorConfig,
    next: &mut Snapshot,
    command: InsertCommand,
) -> Result<Rejection, EngineError> {
    let Some(session) = next.insert.as_mut() else {
        return Err(EngineError::WrongMode("insert", next.mode));
    };
    match command {
        InsertCommand::Start(_) => return Err(EngineError::WrongMode("start_insert", Mode::Insert)),
        InsertCommand::Text(text) => session.type_text(&text, config.max_insert_keystrokes),
        InsertCommand::Backspace => session.backspace(),
        InsertCommand::Discard => leave_insert(next),
        InsertCommand::Commit => {
            if session.text.is_empty() {
                leave_insert(next);
                return Ok(None);
            }
            let committed = match commit_insert(grammar, &next.doc, &session.positions, &session.text)? {
                Outcome::Done(committed) => committed,
                Outcome::Rejected(warning) => return Ok(Some(warning)),
            };
            let old_root = next.doc.root_node();
            let mut cursors: Vec<Cursor> = next
                .cursors
                .iter()
                .zip(committed.focuses)
                .map(|(c, focus)| c.with_focus(focus))
                .collect();
            replace_document(next, &old_root, committed.doc, &mut cursors)?;
            next.cursors = cursors;
            leave_insert(next);
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::build::*;
    use crate::search::{SearchOptions, SearchQuery};
    use pretty_assertions::assert_eq;

    fn r(anchor: &[usize], offset: isize) -> EvenPathRange {
        EvenPathRange::new(anchor.to_vec(), offset)
    }

    fn run(snapshot: &Snapshot, command: impl Into<Command>) -> Transition {
        apply_command(&Parens, &EditorConfig::default(), snapshot, command.into()).unwrap()
    }

    fn open(text: &str) -> Snapshot {
        Snapshot::from_text(&Parens, text, &EditorConfig::default()).unwrap()
    }

    fn focuses(snapshot: &Snapshot) -> Vec<EvenPathRange> {
        snapshot.cursors.iter().map(|c| c.focus.clone()).collect()
    }

    #[test]
    fn test_delete_everything_then_repeat() {
        let start = open("(a, b)");
        assert_eq!(focuses(&start), vec![r(&[0], 0)]);

        let once = run(&start, EditCommand::Delete).snapshot;
        assert_eq!(once.doc.text, "");
        assert_eq!(once.cursors.len(), 1);

        let twice = run(&once, EditCommand::Delete);
        assert!(twice.warnings.is_empty());
        assert_eq!(twice.snapshot.doc.text, "");
        assert_eq!(focuses(&twice.snapshot), focuses(&once));
    }

    #[test]
    fn test_rejected_search_keeps_state() {
        let start = open("(a, b)");
        let query = SearchQuery::Text {
            query: "zzz".into(),
            options: SearchOptions::default(),
        };
        let result = run(&start, CursorCommand::Search { query });
        assert_eq!(result.warnings, vec![Warning::NoSearchMatches]);
        assert_eq!(result.snapshot.cursors, start.cursors);
    }

    #[test]
    fn test_insert_backspace_and_commit() {
        let start = open("(a, b)");
        let inside = run(&start, CursorCommand::MoveIn { delimiter: None }).snapshot;
        assert_eq!(focuses(&inside), vec![r(&[0, 0], 1)]);

        let mut s = run(&inside, InsertCommand::Start(InsertSide::After)).snapshot;
        assert_eq!(s.mode, Mode::Insert);
        for command in [
            InsertCommand::Text(", c".into()),
            InsertCommand::Text("x".into()),
            InsertCommand::Backspace,
        ] {
            s = run(&s, command).snapshot;
        }
        assert_eq!(s.display_doc().text, "(a, b, c)");
        assert_eq!(s.doc.text, "(a, b)");

        let done = run(&s, InsertCommand::Commit).snapshot;
        assert_eq!(done.mode, Mode::Normal);
        assert!(done.insert.is_none());
        assert_eq!(done.doc.text, "(a, b, c)");
        assert_eq!(focuses(&done), vec![r(&[0, 2], 0)]);
    }

    #[test]
    fn test_backspace_forgets_oldest_keystrokes() {
        let config = EditorConfig {
            max_insert_keystrokes: 2,
            ..EditorConfig::default()
        };
        let step = |s: &Snapshot, command: InsertCommand| {
            apply_command(&Parens, &config, s, command.into()).unwrap().snapshot
        };
        let start = open("(a, b)");
        let mut s = run(&start, InsertCommand::Start(InsertSide::After)).snapshot;
        for key in ["x", "yy", "z"] {
            s = step(&s, InsertCommand::Text(key.into()));
        }
        assert_eq!(s.insert.as_ref().unwrap().keystrokes, VecDeque::from([2, 1]));
        for _ in 0..3 {
            s = step(&s, InsertCommand::Backspace);
        }
        let session = s.insert.unwrap();
        assert_eq!(session.text, "x");
        assert!(session.keystrokes.is_empty());
    }

    #[test]
    fn test_failed_commit_stays_in_insert_mode() {
        let start = open("(a, b)");
        let inside = run(&start, CursorCommand::MoveIn { delimiter: None }).snapshot;
        let mut s = run(&inside, InsertCommand::Start(InsertSide::After)).snapshot;
        s = run(&s, InsertCommand::Text(",".into())).snapshot;
        let result = run(&s, InsertCommand::Commit);
        assert!(matches!(result.warnings[..], [Warning::InsertionParse(_)]));
        assert_eq!(result.snapshot.mode, Mode::Insert);
        assert_eq!(result.snapshot.insert.unwrap().text, ",");
    }

    #[test]
    fn test_commands_check_mode() {
        let start = open("(a)");
        assert_eq!(
            apply_command(
                &Parens,
                &EditorConfig::default(),
                &start,
                InsertCommand::Backspace.into()
            )
            .unwrap_err(),
            EngineError::WrongMode("backspace", Mode::Normal)
        );
        let inserting = run(&start, InsertCommand::Start(InsertSide::Before)).snapshot;
        assert!(
            apply_command(&Parens, &EditorConfig::default(), &inserting, EditCommand::Delete.into())
                .is_err()
        );
    }

    #[test]
    fn test_undo_redo_cursor_moves() {
        let start = open("(a, b)");
        let inside = run(&start, CursorCommand::MoveIn { delimiter: None }).snapshot;
        let undone = run(&inside, CursorCommand::Undo).snapshot;
        assert_eq!(focuses(&undone), vec![r(&[0], 0)]);
        let redone = run(&undone, CursorCommand::Redo).snapshot;
        assert_eq!(focuses(&redone), vec![r(&[0, 0], 1)]);
        let exhausted = run(&redone, CursorCommand::Redo);
        assert!(exhausted.warnings.is_empty());
        assert_eq!(focuses(&exhausted.snapshot), vec![r(&[0, 0], 1)]);
    }

    #[test]
    fn test_queue_and_add_cursors() {
        let start = open("(a, b)");
        let inside = run(&start, CursorCommand::MoveIn { delimiter: None }).snapshot;
        let queued = run(&inside, CursorCommand::QueueCursors).snapshot;
        let moved = run(&queued, CursorCommand::MoveOut { delimiter: None }).snapshot;
        let both = run(&moved, CursorCommand::AddQueuedCursors).snapshot;
        assert_eq!(focuses(&both), vec![r(&[0], 0), r(&[0, 0], 1)]);
        assert!(both.queued_cursors.is_empty());
        assert_ne!(both.cursors[0].id, both.cursors[1].id);
    }

    #[test]
    fn test_edit_clears_queue_and_history() {
        let start = open("(a, b)");
        let inside = run(&start, CursorCommand::MoveIn { delimiter: None }).snapshot;
        let queued = run(&inside, CursorCommand::QueueCursors).snapshot;
        let edited = run(&queued, EditCommand::Delete).snapshot;
        assert_eq!(edited.doc.text, "()");
        assert!(edited.queued_cursors.is_empty());
        assert!(!edited.history.can_undo());
    }
}
