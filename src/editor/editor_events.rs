use ratatui::crossterm::event::KeyEvent;

use super::EditorState;
use crate::document::Selection;

/// What a key press did to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorChange {
    pub content_changed: bool,
    /// Present when the selection differs from before the key press
    pub selection_changed: Option<Option<Selection>>,
}

/// Feed a key to the widget and report content and selection changes
pub fn handle_editor_key(editor: &mut EditorState, key: KeyEvent) -> EditorChange {
    let before = editor.selection();
    let content_changed = editor.textarea.input(key);
    let after = editor.selection();

    let selection_changed = if before != after { Some(after) } else { None };

    EditorChange {
        content_changed,
        selection_changed,
    }
}
