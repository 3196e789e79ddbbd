//! Engine configuration.

/// Tunables of an editing session.
///
/// Build variations with struct update syntax:
///
/// ```rust
/// use tree_editor_core::EditorConfig;
///
/// let config = EditorConfig {
///     strict_search: true,
///     ..EditorConfig::default()
/// };
/// assert_eq!(config.max_history, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    /// Maximum number of cursor undo steps.
    pub max_history: usize,
    /// Search only the selected nodes (in every equivalent form) instead of all descendants.
    pub shallow_search: bool,
    /// Reject a search if any cursor finds nothing.
    pub strict_search: bool,
    /// Maximum number of keystrokes remembered for backspace in one insert session.
    pub max_insert_keystrokes: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: 100,
            shallow_search: false,
            strict_search: false,
            max_insert_keystrokes: 1000,
        }
    }
}
