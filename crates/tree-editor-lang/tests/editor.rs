//! Driving an [`Editor`] through key presses.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tree_editor_core::focus::text_range_from_focus;
use tree_editor_core::{Editor, EditorConfig, KeyEvent, Mode, Warning};
use tree_editor_lang::MiniJs;

fn editor(text: &str) -> Editor<MiniJs> {
    Editor::new(MiniJs, text, EditorConfig::default()).unwrap()
}

fn press(editor: &mut Editor<MiniJs>, keys: &str) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for key in keys.chars() {
        warnings.extend(editor.handle_key(&KeyEvent::plain(&key.to_string())).unwrap());
    }
    warnings
}

fn selections(editor: &Editor<MiniJs>) -> Vec<String> {
    let state = editor.public_state();
    let root = state.doc.root_node();
    state
        .cursors
        .iter()
        .map(|c| state.doc.slice(text_range_from_focus(&root, &c.focus).unwrap()).to_string())
        .collect()
}

#[test]
fn test_replace_arguments_by_typing() {
    let mut e = editor("g(a, b)");
    press(&mut e, "(");
    assert_eq!(selections(&e), vec!["a, b"]);

    press(&mut e, "d");
    assert_eq!(e.text(), "g()");
    press(&mut e, "ji");
    assert_eq!(e.mode(), Mode::Insert);

    e.type_text("x, y").unwrap();
    assert_eq!(e.text(), "g(x, y)");
    e.handle_key(&KeyEvent::plain("Escape")).unwrap();
    assert_eq!(e.mode(), Mode::Normal);
    assert_eq!(selections(&e), vec!["x, y"]);
}

#[test]
fn test_paste_call_into_its_own_arguments() {
    let mut e = editor("f(x)");
    press(&mut e, "c(");
    assert_eq!(selections(&e), vec!["x"]);
    let warnings = press(&mut e, "p");
    assert!(warnings.is_empty());
    assert_eq!(e.text(), "f(f(x))");
    assert_eq!(selections(&e), vec!["f(x)"]);
}

#[test]
fn test_undo_and_redo_selection() {
    let mut e = editor("f(x)");
    assert_eq!(selections(&e), vec!["f(x)"]);
    press(&mut e, "(");
    assert_eq!(selections(&e), vec!["x"]);
    press(&mut e, "z");
    assert_eq!(selections(&e), vec!["f(x)"]);
    press(&mut e, "Z");
    assert_eq!(selections(&e), vec!["x"]);
}

#[test]
fn test_subscriber_sees_rejections() {
    let mut e = editor("f(x)");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    e.subscribe(move |state| sink.lock().unwrap().push(state.warnings.clone()));

    // Nothing copied yet.
    let warnings = press(&mut e, "p");
    assert_eq!(warnings, vec![Warning::EmptyClipboard]);
    press(&mut e, "cp");
    assert_eq!(e.text(), "f(x)");
    assert_eq!(
        *seen.lock().unwrap(),
        vec![vec![Warning::EmptyClipboard], vec![], vec![]]
    );
}
