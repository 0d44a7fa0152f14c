use std::time::Instant;

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::NotificationState;
use crate::widgets::popup;

const MAX_WIDTH: u16 = 60;

/// Draw the current notification in the top-right corner
pub fn render_notification(frame: &mut Frame, state: &mut NotificationState) {
    if !state.clear_if_expired(Instant::now()) {
        return;
    }
    let Some(notification) = state.current() else {
        return;
    };

    let frame_area = frame.area();
    if frame_area.width < 20 || frame_area.height < 5 {
        return;
    }

    let inner_width = MAX_WIDTH.min(frame_area.width.saturating_sub(4)).saturating_sub(2);
    let text_width = notification.message.width() as u16;
    let lines = text_width.div_ceil(inner_width.max(1)).max(1);
    let width = text_width.min(inner_width) + 2;
    let height = (lines + 2).min(frame_area.height);

    let area = Rect {
        x: frame_area.width.saturating_sub(width + 1),
        y: 1,
        width,
        height,
    };

    let color = notification.kind.color();
    popup::clear_area(frame, area);
    let widget = Paragraph::new(notification.message.as_str())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    frame.render_widget(widget, area);
}
