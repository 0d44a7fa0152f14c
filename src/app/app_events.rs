use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tui_textarea::TextArea;

use super::app_state::{App, Modal};
use crate::editor::handle_editor_key;
use crate::export::ExportFormat;
use crate::import::Preset;

impl App {
    /// Wait up to `timeout` for one terminal event and handle it
    pub fn handle_events(&mut self, timeout: Duration) -> io::Result<()> {
        if !event::poll(timeout)? {
            return Ok(());
        }
        match event::read()? {
            // Check that it's a key press event to avoid duplicates
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.handle_key_event(key_event, Instant::now());
            }
            Event::Paste(text) => self.handle_paste(&text, Instant::now()),
            _ => {}
        }
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
        {
            self.quit();
            return;
        }

        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }

        if self.handle_global_keys(key) {
            return;
        }

        self.handle_editor_input(key, now);
    }

    /// Returns true if key was handled
    fn handle_global_keys(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::F(2) => {
                self.modal = Some(Modal::PresetPicker { selected: 0 });
            }
            KeyCode::F(3) => {
                self.modal = Some(Modal::PathPrompt(path_prompt()));
            }
            KeyCode::F(5) => self.request_export(ExportFormat::Pdf),
            KeyCode::F(6) => self.request_export(ExportFormat::Word),
            KeyCode::F(7) => self.request_export(ExportFormat::Print),
            KeyCode::F(8) => {
                if !self.accept_suggestion() && self.notification.current().is_none() {
                    self.notification.show_warning("No suggestion to apply");
                }
            }
            KeyCode::Esc if self.notification.current().is_some() => {
                self.notification.dismiss();
            }
            _ => return false,
        }
        true
    }

    fn handle_editor_input(&mut self, key: KeyEvent, now: Instant) {
        if self.document.loading {
            return;
        }

        let change = handle_editor_key(&mut self.editor, key);
        if change.content_changed {
            self.sync_from_editor();
        }
        if let Some(selection) = change.selection_changed {
            self.on_selection_change(selection, now);
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.take() else {
            return;
        };

        self.modal = match modal {
            Modal::Alert(message) => match key.code {
                KeyCode::Esc | KeyCode::Enter => None,
                _ => Some(Modal::Alert(message)),
            },
            Modal::PresetPicker { selected } => match key.code {
                KeyCode::Esc => None,
                KeyCode::Up | KeyCode::Char('k') => Some(Modal::PresetPicker {
                    selected: selected.saturating_sub(1),
                }),
                KeyCode::Down | KeyCode::Char('j') => Some(Modal::PresetPicker {
                    selected: (selected + 1).min(Preset::ALL.len() - 1),
                }),
                KeyCode::Enter => {
                    if let Some(preset) = Preset::ALL.get(selected) {
                        self.request_preset(*preset);
                    }
                    None
                }
                _ => Some(Modal::PresetPicker { selected }),
            },
            Modal::PathPrompt(mut textarea) => match key.code {
                KeyCode::Esc => None,
                KeyCode::Enter => {
                    let path = textarea.lines().join("").trim().to_string();
                    if !path.is_empty() {
                        self.request_upload(PathBuf::from(path));
                    }
                    // An upload rejection may have opened the alert
                    return;
                }
                _ => {
                    textarea.input(key);
                    Some(Modal::PathPrompt(textarea))
                }
            },
        };
    }

    /// Bracketed paste goes to the prompt when open, otherwise to the editor
    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        match &mut self.modal {
            Some(Modal::PathPrompt(textarea)) => {
                textarea.insert_str(text.replace(['\r', '\n'], ""));
            }
            Some(_) => {}
            None if self.document.loading => {}
            None => {
                let before = self.editor.selection();
                self.editor.textarea.insert_str(text.replace("\r\n", "\n"));
                self.sync_from_editor();
                let after = self.editor.selection();
                if before != after {
                    self.on_selection_change(after, now);
                }
            }
        }
    }
}

fn path_prompt() -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(ratatui::style::Style::default());
    textarea.set_placeholder_text("path/to/file.docx");
    textarea
}

#[cfg(test)]
#[path = "app_events_tests.rs"]
mod app_events_tests;
