//! Default key bindings.
//!
//! Normal mode is modal in the vi tradition: single letters move and edit, shifted letters
//! extend or reverse. Insert mode takes printable characters literally.

use crate::commands::{Command, CursorCommand, EditCommand, InsertCommand};
use crate::cursor::{Direction, InsertSide, LeafMoveMode, ReduceSide};
use crate::snapshot::Mode;

/// A key press as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// Key name: the produced character (`"a"`, `"("`, `" "`) or a named key (`"Escape"`,
    /// `"Backspace"`, `"Enter"`).
    pub key: String,
    /// Alt/Option held.
    pub alt: bool,
    /// Control held.
    pub ctrl: bool,
    /// Meta/Command held.
    pub meta: bool,
    /// Shift held.
    pub shift: bool,
}

impl KeyEvent {
    /// Unmodified key. Shift is implied by an uppercase character.
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            shift: key.chars().count() == 1 && key.chars().all(char::is_uppercase),
            ..Self::default()
        }
    }

    /// `key` with Control held.
    pub fn ctrl(key: &str) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    /// `key` with Alt held.
    pub fn alt(key: &str) -> Self {
        Self {
            alt: true,
            ..Self::plain(key)
        }
    }
}

/// Command bound to `event` in `mode`, if any.
pub fn command_for_key(mode: Mode, event: &KeyEvent) -> Option<Command> {
    match mode {
        Mode::Normal => normal_command(event),
        Mode::Insert => insert_command(event),
    }
}

fn leaf(direction: Direction, mode: LeafMoveMode) -> Command {
    CursorCommand::MoveLeaf { direction, mode }.into()
}

fn normal_command(event: &KeyEvent) -> Option<Command> {
    use Direction::{Backward, Forward};

    if event.meta {
        return None;
    }
    let key = event.key.as_str();
    if event.ctrl {
        return match key {
            "h" => Some(leaf(Backward, LeafMoveMode::Shrink)),
            "l" => Some(leaf(Forward, LeafMoveMode::Shrink)),
            _ => None,
        };
    }
    if event.alt {
        return match key {
            "h" => Some(CursorCommand::ReduceSelection(ReduceSide::First).into()),
            "l" => Some(CursorCommand::ReduceSelection(ReduceSide::Last).into()),
            "q" => Some(CursorCommand::ClearQueuedCursors.into()),
            _ => None,
        };
    }

    let command: Command = match key {
        "h" => leaf(Backward, LeafMoveMode::Move),
        "l" => leaf(Forward, LeafMoveMode::Move),
        "H" => leaf(Backward, LeafMoveMode::Extend),
        "L" => leaf(Forward, LeafMoveMode::Extend),
        " " => CursorCommand::ReduceSelection(ReduceSide::JustExtended).into(),
        "k" => CursorCommand::MoveToParent.into(),
        "K" => CursorCommand::MoveOut { delimiter: None }.into(),
        "j" => CursorCommand::MoveIn { delimiter: None }.into(),
        ")" | "]" | "}" | ">" => CursorCommand::MoveOut {
            delimiter: Some(key.to_string()),
        }
        .into(),
        "(" | "[" | "{" | "<" => CursorCommand::MoveIn {
            delimiter: Some(key.to_string()),
        }
        .into(),
        "d" => EditCommand::Delete.into(),
        "c" => CursorCommand::Copy.into(),
        "p" => EditCommand::Paste.into(),
        "i" => InsertCommand::Start(InsertSide::Before).into(),
        "a" => InsertCommand::Start(InsertSide::After).into(),
        "z" => CursorCommand::Undo.into(),
        "Z" => CursorCommand::Redo.into(),
        "q" => CursorCommand::QueueCursors.into(),
        "Q" => CursorCommand::AddQueuedCursors.into(),
        _ => return None,
    };
    Some(command)
}

fn insert_command(event: &KeyEvent) -> Option<Command> {
    if event.ctrl || event.meta {
        return None;
    }
    let command = match event.key.as_str() {
        "Escape" => InsertCommand::Commit,
        "Backspace" => InsertCommand::Backspace,
        "Enter" => InsertCommand::Text("\n".to_string()),
        key if key.chars().count() == 1 && !key.chars().any(char::is_control) => {
            InsertCommand::Text(key.to_string())
        }
        _ => return None,
    };
    Some(command.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn normal(event: KeyEvent) -> Option<Command> {
        command_for_key(Mode::Normal, &event)
    }

    #[test]
    fn test_leaf_movement_family() {
        assert_eq!(
            normal(KeyEvent::plain("l")),
            Some(leaf(Direction::Forward, LeafMoveMode::Move))
        );
        assert_eq!(
            normal(KeyEvent::plain("H")),
            Some(leaf(Direction::Backward, LeafMoveMode::Extend))
        );
        assert_eq!(
            normal(KeyEvent::ctrl("h")),
            Some(leaf(Direction::Backward, LeafMoveMode::Shrink))
        );
        assert_eq!(
            normal(KeyEvent::alt("l")),
            Some(CursorCommand::ReduceSelection(ReduceSide::Last).into())
        );
    }

    #[test]
    fn test_delimiter_keys() {
        assert_eq!(
            normal(KeyEvent::plain("[")),
            Some(
                CursorCommand::MoveIn {
                    delimiter: Some("[".into())
                }
                .into()
            )
        );
        assert_eq!(
            normal(KeyEvent::plain(")")),
            Some(
                CursorCommand::MoveOut {
                    delimiter: Some(")".into())
                }
                .into()
            )
        );
    }

    #[test]
    fn test_unbound_keys() {
        assert_eq!(normal(KeyEvent::plain("x")), None);
        assert_eq!(
            normal(KeyEvent {
                meta: true,
                ..KeyEvent::plain("d")
            }),
            None
        );
        assert_eq!(normal(KeyEvent::ctrl("d")), None);
    }

    #[test]
    fn test_insert_mode_keys() {
        let insert = |event: KeyEvent| command_for_key(Mode::Insert, &event);
        assert_eq!(
            insert(KeyEvent::plain("d")),
            Some(InsertCommand::Text("d".into()).into())
        );
        assert_eq!(
            insert(KeyEvent::plain("Escape")),
            Some(InsertCommand::Commit.into())
        );
        assert_eq!(
            insert(KeyEvent::plain("Backspace")),
            Some(InsertCommand::Backspace.into())
        );
        assert_eq!(insert(KeyEvent::plain("Tab")), None);
        assert_eq!(insert(KeyEvent::ctrl("c")), None);
    }
}
