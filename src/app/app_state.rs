use std::path::PathBuf;
use std::time::Instant;

use tui_textarea::TextArea;

use crate::config::Config;
use crate::document::{DocumentSource, DocumentState, Selection};
use crate::editor::EditorState;
use crate::export::ExportFormat;
use crate::import::Preset;
use crate::import::upload::has_docx_extension;
use crate::jobs::{DocumentEvent, DocumentJob, JobQueue};
use crate::notification::NotificationState;
use crate::suggest::SuggestionSession;

/// Blocking popups; at most one is open
pub enum Modal {
    Alert(String),
    PresetPicker { selected: usize },
    PathPrompt(TextArea<'static>),
}

/// Application state
///
/// Hosts the document and keeps the editor, the suggestion session and the
/// background jobs in step with it.
pub struct App {
    pub document: DocumentState,
    pub editor: EditorState,
    pub session: SuggestionSession,
    pub jobs: JobQueue,
    pub notification: NotificationState,
    pub modal: Option<Modal>,
    pub frame_count: u64,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            document: DocumentState::new(),
            editor: EditorState::new(),
            session: SuggestionSession::from_config(&config.suggest),
            jobs: JobQueue::new(),
            notification: NotificationState::new(),
            modal: None,
            frame_count: 0,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Close the suggestion connection and stop the main loop
    pub fn quit(&mut self) {
        self.session.shutdown();
        self.should_quit = true;
    }

    /// Replace the document and show it in the editor
    pub fn load_document(&mut self, html: String, source: DocumentSource, now: Instant) {
        self.editor.set_content(&html);
        self.editor.set_title(&source.to_string());
        self.document.load(html, source);
        self.session.on_selection_change(None, now);
    }

    /// Keep the document in sync after an edit in the widget
    pub fn sync_from_editor(&mut self) {
        self.document.set_html(self.editor.text());
    }

    pub fn on_selection_change(&mut self, selection: Option<Selection>, now: Instant) {
        self.session.on_selection_change(selection, now);
    }

    pub fn request_preset(&mut self, preset: Preset) {
        self.start_import(DocumentJob::LoadPreset(preset));
    }

    /// Import a local Word file; other file types raise an alert right away
    pub fn request_upload(&mut self, path: PathBuf) {
        if !has_docx_extension(&path) {
            log::warn!("Rejected upload {}", path.display());
            self.show_alert("Please upload a valid Word file.");
            return;
        }
        self.start_import(DocumentJob::Upload(path));
    }

    fn start_import(&mut self, job: DocumentJob) {
        if self.jobs.submit(job) {
            self.document.loading = true;
        } else {
            self.notification.show_error("Import is unavailable");
        }
    }

    /// Queue an export of the document
    ///
    /// A print page holds only the selected markup when there is a selection.
    pub fn request_export(&mut self, format: ExportFormat) {
        if self.document.is_empty() {
            self.show_alert(&format!(
                "Editor is empty. Please enter some text to {}.",
                format.verb()
            ));
            return;
        }
        let html = match (format, self.editor.selection()) {
            (ExportFormat::Print, Some(selection)) => selection.html,
            _ => self.document.html().to_string(),
        };
        let job = DocumentJob::Export { format, html };
        if self.jobs.submit(job) {
            self.notification.show(&format!("Exporting {}...", format));
        } else {
            self.notification.show_error("Export is unavailable");
        }
    }

    /// Replace the selection with the suggestion made for it
    ///
    /// Returns false when there is nothing to accept.
    pub fn accept_suggestion(&mut self) -> bool {
        let Some(replacement) = self.session.accept() else {
            return false;
        };

        if self.editor.replace_range(replacement.range, &replacement.html) {
            self.sync_from_editor();
            log::info!("Applied suggestion at {:?}", replacement.range);
            true
        } else {
            log::warn!("Selection moved before the suggestion was applied");
            self.notification
                .show_warning("The selection changed; suggestion not applied");
            false
        }
    }

    pub fn show_alert(&mut self, message: &str) {
        self.modal = Some(Modal::Alert(message.to_string()));
    }

    pub fn alert(&self) -> Option<&str> {
        match &self.modal {
            Some(Modal::Alert(message)) => Some(message),
            _ => None,
        }
    }

    /// Apply the outcome of a background job
    pub fn handle_document_event(&mut self, event: DocumentEvent, now: Instant) {
        match event {
            DocumentEvent::Loaded(doc) => {
                let label = doc.source.to_string();
                self.load_document(doc.html, doc.source, now);
                self.notification.show(&format!("Loaded {}", label));
            }
            DocumentEvent::Rejected(message) => {
                self.document.loading = false;
                self.show_alert(&message);
            }
            DocumentEvent::LoadFailed(error) => {
                self.document.loading = false;
                self.notification
                    .show_error(&format!("Import failed: {}", error));
            }
            DocumentEvent::Exported { format, path } => {
                self.notification
                    .show(&format!("Exported {} to {}", format, path.display()));
            }
            DocumentEvent::ExportFailed { format, error } => {
                self.notification
                    .show_error(&format!("{} export failed: {}", format, error));
            }
        }
    }

    /// Drain worker channels and advance clocks; called once per loop pass
    pub fn tick(&mut self, now: Instant) {
        self.session.poll_events();
        self.session.tick(now);
        if let Some(notice) = self.session.take_notice() {
            self.notification.show_warning(&notice);
        }

        for event in self.jobs.poll() {
            self.handle_document_event(event, now);
        }
    }
}

#[cfg(test)]
#[path = "app_state_tests.rs"]
mod app_state_tests;
