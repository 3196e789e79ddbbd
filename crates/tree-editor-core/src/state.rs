//! Editing session for a host.
//!
//! # Overview
//!
//! [`Editor`] owns the current [`Snapshot`], applies commands to it and tells subscribers about
//! the result. It is the only stateful piece of the engine:
//!
//! - **Commands**: [`Editor::execute`] for typed commands, [`Editor::handle_key`] for raw key
//!   presses routed through the default [keymap](crate::keymap).
//! - **Failure isolation**: a command that breaks an invariant leaves the previous snapshot in
//!   place.
//! - **Change notifications**: every completed command emits one [`PublicState`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tree_editor_core::{Editor, EditorConfig, KeyEvent};
//!
//! let mut editor = Editor::new(grammar, "f(x)", EditorConfig::default())?;
//! editor.subscribe(|state| println!("{} cursor(s)", state.cursors.len()));
//! editor.handle_key(&KeyEvent::plain("d"))?;
//! assert_eq!(editor.text(), "");
//! ```

use tracing::{error, warn};

use crate::commands::Command;
use crate::config::EditorConfig;
use crate::cursor::{Cursor, cursors_overlap};
use crate::error::{EngineError, Warning};
use crate::grammar::Grammar;
use crate::keymap::{KeyEvent, command_for_key};
use crate::node::Doc;
use crate::snapshot::{Mode, Snapshot, apply_command};

/// What a renderer needs after a command.
#[derive(Debug, Clone)]
pub struct PublicState {
    /// Document to display; includes typed text in insert mode.
    pub doc: Doc,
    /// Current mode.
    pub mode: Mode,
    /// Cursors, sorted by position.
    pub cursors: Vec<Cursor>,
    /// Some cursors overlap without nesting.
    pub cursors_overlap: bool,
    /// Queued cursors.
    pub queued_cursors: Vec<Cursor>,
    /// Warnings of the last command.
    pub warnings: Vec<Warning>,
}

/// State change callback
pub type StateCallback = Box<dyn FnMut(&PublicState) + Send>;

/// Editing session over one document.
pub struct Editor<G: Grammar> {
    grammar: G,
    config: EditorConfig,
    snapshot: Snapshot,
    warnings: Vec<Warning>,
    callbacks: Vec<StateCallback>,
}

impl<G: Grammar> Editor<G> {
    /// Parse `text` and start a session on it.
    pub fn new(grammar: G, text: &str, config: EditorConfig) -> Result<Self, EngineError> {
        let snapshot = Snapshot::from_text(&grammar, text, &config)?;
        Ok(Self::from_snapshot(grammar, snapshot, config))
    }

    /// Resume a session from a snapshot.
    pub fn from_snapshot(grammar: G, snapshot: Snapshot, config: EditorConfig) -> Self {
        Self {
            grammar,
            config,
            snapshot,
            warnings: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Grammar of the document.
    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    /// Session configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current state.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.snapshot.mode
    }

    /// Text as displayed, typed text included.
    pub fn text(&self) -> String {
        self.snapshot.display_doc().text
    }

    /// Warnings of the last command.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// State as reported to subscribers.
    pub fn public_state(&self) -> PublicState {
        PublicState {
            doc: self.snapshot.display_doc(),
            mode: self.snapshot.mode,
            cursors: self.snapshot.cursors.clone(),
            cursors_overlap: cursors_overlap(&self.snapshot.cursors),
            queued_cursors: self.snapshot.queued_cursors.clone(),
            warnings: self.warnings.clone(),
        }
    }

    /// Apply a command. Returns the warnings of a rejected command.
    ///
    /// On error the previous state is kept and subscribers are not notified.
    pub fn execute(&mut self, command: Command) -> Result<Vec<Warning>, EngineError> {
        let transition = match apply_command(&self.grammar, &self.config, &self.snapshot, command) {
            Ok(transition) => transition,
            Err(err) => {
                error!(error = %err, "command failed, previous state kept");
                return Err(err);
            }
        };
        for warning in &transition.warnings {
            warn!(%warning, "command had no effect");
        }
        self.snapshot = transition.snapshot;
        self.warnings = transition.warnings;
        self.notify();
        Ok(self.warnings.clone())
    }

    /// Apply the command bound to `event`, if any.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<Vec<Warning>, EngineError> {
        match command_for_key(self.snapshot.mode, event) {
            Some(command) => self.execute(command),
            None => Ok(Vec::new()),
        }
    }

    /// Type `text` one key at a time, as if from the keyboard.
    pub fn type_text(&mut self, text: &str) -> Result<(), EngineError> {
        for c in text.chars() {
            let key = if c == '\n' { "Enter".to_string() } else { c.to_string() };
            self.handle_key(&KeyEvent::plain(&key))?;
        }
        Ok(())
    }

    /// Subscribe to state changes.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&PublicState) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    fn notify(&mut self) {
        if self.callbacks.is_empty() {
            return;
        }
        let state = self.public_state();
        for callback in &mut self.callbacks {
            callback(&state);
        }
    }
}
