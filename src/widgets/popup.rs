//! Popup geometry and chrome shared by the alert, picker and path prompt

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, Clear},
};

/// Rect of at most `width` x `height` centered in `area`
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width);
    let popup_height = height.min(area.height);

    Rect {
        x: area.x + (area.width - popup_width) / 2,
        y: area.y + (area.height - popup_height) / 2,
        width: popup_width,
        height: popup_height,
    }
}

/// Popup width for content `content_width` columns wide, with borders and padding
pub fn fitted_width(content_width: usize, min: u16, max: u16) -> u16 {
    let wanted = u16::try_from(content_width).unwrap_or(u16::MAX).saturating_add(4);
    wanted.clamp(min, max.max(min))
}

pub fn clear_area(frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);
}

/// Rounded, titled border used by every modal
pub fn dialog_block(title: &str, color: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
}

#[cfg(test)]
#[path = "popup_tests.rs"]
mod popup_tests;
