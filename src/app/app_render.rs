use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app_state::{App, Modal};
use crate::import::Preset;
use crate::notification::render_notification;
use crate::widgets::popup;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

const HELP_LINE: &[(&str, &str)] = &[
    ("Shift+Arrows", "Select"),
    ("F2", "Presets"),
    ("F3", "Upload"),
    ("F5", "PDF"),
    ("F6", "Word"),
    ("F7", "Print"),
    ("F8", "Replace"),
    ("Ctrl+Q", "Quit"),
];

impl App {
    pub fn render(&mut self, frame: &mut Frame) {
        self.frame_count = self.frame_count.wrapping_add(1);

        let [main_area, help_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());
        let [editor_area, side_area] =
            Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)])
                .areas(main_area);
        let [info_area, suggestion_area] =
            Layout::vertical([Constraint::Length(5), Constraint::Min(3)]).areas(side_area);

        frame.render_widget(&self.editor.textarea, editor_area);
        if self.document.loading {
            self.render_loader(frame, editor_area);
        }

        self.render_info(frame, info_area);
        self.render_suggestion(frame, suggestion_area);
        render_help_line(frame, help_area);

        match &self.modal {
            Some(Modal::Alert(message)) => render_alert(frame, message),
            Some(Modal::PresetPicker { selected }) => render_preset_picker(frame, *selected),
            Some(Modal::PathPrompt(textarea)) => {
                let area = popup::centered_popup(frame.area(), 60, 3);
                popup::clear_area(frame, area);
                let block = popup::dialog_block("Upload Word file (Enter to import)", Color::Cyan);
                let inner = block.inner(area);
                frame.render_widget(block, area);
                frame.render_widget(textarea, inner);
            }
            None => {}
        }

        render_notification(frame, &mut self.notification);
    }

    fn spinner(&self) -> &'static str {
        SPINNER[(self.frame_count / 2) as usize % SPINNER.len()]
    }

    fn render_loader(&self, frame: &mut Frame, area: Rect) {
        let text = format!(" {} Loading document... ", self.spinner());
        let area = popup::centered_popup(area, text.len() as u16 + 2, 3);
        popup::clear_area(frame, area);
        let loader = Paragraph::new(text).block(popup::dialog_block("Import", Color::Cyan));
        frame.render_widget(loader, area);
    }

    fn render_info(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(Color::DarkGray);
        let jobs = if self.jobs.is_busy() { "working" } else { "idle" };
        let lines = vec![
            Line::from(vec![
                Span::styled("Document: ", label),
                Span::raw(self.document.source.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Service:  ", label),
                Span::raw(self.session.connection().label()),
            ]),
            Line::from(vec![Span::styled("Jobs:     ", label), Span::raw(jobs)]),
        ];

        let info = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Info ")
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(info, area);
    }

    fn render_suggestion(&self, frame: &mut Frame, area: Rect) {
        let heading = |text: &'static str, color: Color| {
            Line::from(Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        };

        let lines: Vec<Line> = if let Some(suggestion) = self.session.suggestion() {
            vec![
                heading("Issue:", Color::Yellow),
                Line::from(suggestion.issue.clone()),
                Line::from(""),
                heading("Suggestion:", Color::Green),
                Line::from(suggestion.corrected.clone()),
                Line::from(""),
                Line::from(Span::styled(
                    "F8 to replace the selection",
                    Style::default().fg(Color::DarkGray),
                )),
            ]
        } else if self.session.is_waiting() {
            vec![Line::from(format!("{} Waiting for suggestion...", self.spinner()))]
        } else if self.session.selection().is_some() && !self.session.enabled {
            vec![Line::from("Suggestions are disabled")]
        } else {
            vec![Line::from(Span::styled(
                "Select text to get a suggestion",
                Style::default().fg(Color::DarkGray),
            ))]
        };

        let panel = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Suggestion ")
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(panel, area);
    }
}

fn render_help_line(frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (key, desc) in HELP_LINE {
        spans.push(Span::styled(
            format!(" {} ", key),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!("{} ", desc), Style::default().fg(Color::Gray)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_alert(frame: &mut Frame, message: &str) {
    let width = popup::fitted_width(message.len(), 30, 60);
    let area = popup::centered_popup(frame.area(), width, 5);
    popup::clear_area(frame, area);

    let alert = Paragraph::new(vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("Enter to close", Style::default().fg(Color::DarkGray))),
    ])
    .wrap(Wrap { trim: true })
    .block(popup::dialog_block("Alert", Color::Red));
    frame.render_widget(alert, area);
}

fn render_preset_picker(frame: &mut Frame, selected: usize) {
    let area = popup::centered_popup(frame.area(), 34, Preset::ALL.len() as u16 + 2);
    popup::clear_area(frame, area);

    let items: Vec<ListItem> = Preset::ALL
        .iter()
        .map(|preset| ListItem::new(preset.label()))
        .collect();
    let list = List::new(items)
        .block(popup::dialog_block("Select a document", Color::Cyan))
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}
