use std::time::{Duration, Instant};

use ratatui::style::Color;

const INFO_DURATION: Duration = Duration::from_millis(2500);
const ERROR_DURATION: Duration = Duration::from_millis(6000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn color(self) -> Color {
        match self {
            NotificationKind::Info => Color::Green,
            NotificationKind::Warning => Color::Yellow,
            NotificationKind::Error => Color::Red,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
    duration: Duration,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.duration
    }
}

/// At most one notification is visible; a new one replaces the old
#[derive(Debug, Default)]
pub struct NotificationState {
    current: Option<Notification>,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: &str) {
        self.push(message, NotificationKind::Info, INFO_DURATION);
    }

    pub fn show_warning(&mut self, message: &str) {
        self.push(message, NotificationKind::Warning, ERROR_DURATION);
    }

    pub fn show_error(&mut self, message: &str) {
        self.push(message, NotificationKind::Error, ERROR_DURATION);
    }

    fn push(&mut self, message: &str, kind: NotificationKind, duration: Duration) {
        self.current = Some(Notification {
            message: message.to_string(),
            kind,
            shown_at: Instant::now(),
            duration,
        });
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn current_message(&self) -> Option<&str> {
        self.current.as_ref().map(|n| n.message.as_str())
    }

    /// Drop the notification once its time is up; returns whether one is still shown
    pub fn clear_if_expired(&mut self, now: Instant) -> bool {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.current = None;
        }
        self.current.is_some()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
