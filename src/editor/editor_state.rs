use ratatui::{
    style::{Color, Modifier, Style},
    widgets::{Block, Borders},
};
use tui_textarea::{CursorMove, TextArea};

use crate::document::{Selection, SelectionRange, position_at};
use crate::html;

/// Adapter around the textarea widget editing the document's HTML source
pub struct EditorState {
    pub textarea: TextArea<'static>,
}

impl EditorState {
    pub fn new() -> Self {
        Self {
            textarea: styled(TextArea::default()),
        }
    }

    /// Replace the widget content, dropping its undo history
    pub fn set_content(&mut self, html: &str) {
        let lines: Vec<String> = html.split('\n').map(String::from).collect();
        self.textarea = styled(TextArea::new(lines));
    }

    pub fn set_title(&mut self, title: &str) {
        self.textarea.set_block(editor_block(title));
    }

    /// Document source as a single string
    pub fn text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Current selection projected onto plain text
    ///
    /// Ends that fall inside a tag are pulled out of it, so the reported
    /// range never splits markup. Returns None when nothing is selected or
    /// the selection covers only markup.
    pub fn selection(&self) -> Option<Selection> {
        let (a, b) = self.textarea.selection_range()?;
        let range = SelectionRange::new(a, b);
        if range.is_empty() {
            return None;
        }

        let lines = self.textarea.lines();
        let source = lines.join("\n");
        let bytes = html::range_outside_tags(&source, range.byte_range(lines));
        let text = html::plain_text_in_range(&source, bytes.clone());
        if text.is_empty() {
            return None;
        }

        Some(Selection {
            text,
            range: SelectionRange::new(
                position_at(lines, bytes.start),
                position_at(lines, bytes.end),
            ),
            html: source[bytes].to_string(),
        })
    }

    /// Select `range` in the widget
    pub fn select_range(&mut self, range: SelectionRange) {
        self.textarea.cancel_selection();
        jump(&mut self.textarea, range.start);
        self.textarea.start_selection();
        jump(&mut self.textarea, range.end);
    }

    /// Overwrite `range` with `replacement`, keeping the edit undoable
    ///
    /// Returns false if the range no longer fits the document.
    pub fn replace_range(&mut self, range: SelectionRange, replacement: &str) -> bool {
        let lines = self.textarea.lines();
        let (end_row, end_col) = range.end;
        let fits = lines
            .get(end_row)
            .is_some_and(|line| line.chars().count() >= end_col);
        if !fits {
            return false;
        }

        let yank = self.textarea.yank_text();
        if !range.is_empty() {
            self.select_range(range);
            self.textarea.cut();
        } else {
            jump(&mut self.textarea, range.start);
        }
        self.textarea.insert_str(replacement);
        self.textarea.set_yank_text(yank);
        true
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

fn jump(textarea: &mut TextArea<'_>, (row, col): (usize, usize)) {
    let row = u16::try_from(row).unwrap_or(u16::MAX);
    let col = u16::try_from(col).unwrap_or(u16::MAX);
    textarea.move_cursor(CursorMove::Jump(row, col));
}

fn styled(mut textarea: TextArea<'static>) -> TextArea<'static> {
    textarea.set_block(editor_block("Untitled"));
    textarea.set_cursor_line_style(Style::default());
    textarea.set_selection_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD));
    textarea
}

fn editor_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(Color::DarkGray))
}

#[cfg(test)]
#[path = "editor_state_tests.rs"]
mod editor_state_tests;
