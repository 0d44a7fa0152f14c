//! Suggestion session
//!
//! Turns selection changes into debounced requests over a reusable
//! connection and keeps the one suggestion that belongs to the current
//! selection.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use super::connection::{ConnectionAction, ConnectionEvent, ConnectionState};
use super::debouncer::Debouncer;
use super::message::{Inbound, parse_inbound};
use super::{Replacement, SuggestCommand, SuggestEvent, Suggestion};
use crate::config::SuggestConfig;
use crate::document::Selection;
use crate::html;

/// Text waiting for, or awaiting a reply from, the service
#[derive(Debug, Clone)]
struct Outgoing {
    text: String,
    requested_at: Instant,
}

pub struct SuggestionSession {
    /// Whether suggestions are requested at all (from config)
    pub enabled: bool,
    connection: ConnectionState,
    /// Incremented for every connection attempt; events for older ids are dropped
    connection_id: u64,
    debouncer: Debouncer,
    request_timeout: Duration,
    selection: Option<Selection>,
    /// Held while the connection is being established; latest wins
    queued: Option<Outgoing>,
    /// Sent and unanswered, oldest first; the service replies in order
    in_flight: VecDeque<Outgoing>,
    suggestion: Option<Suggestion>,
    /// One-shot message for the host to surface
    notice: Option<String>,
    request_tx: Option<UnboundedSender<SuggestCommand>>,
    response_rx: Option<Receiver<SuggestEvent>>,
}

impl SuggestionSession {
    pub fn new(enabled: bool, debounce_ms: u64, timeout_ms: u64) -> Self {
        Self {
            enabled,
            connection: ConnectionState::Idle,
            connection_id: 0,
            debouncer: Debouncer::new(debounce_ms),
            request_timeout: Duration::from_millis(timeout_ms),
            selection: None,
            queued: None,
            in_flight: VecDeque::new(),
            suggestion: None,
            notice: None,
            request_tx: None,
            response_rx: None,
        }
    }

    pub fn from_config(config: &SuggestConfig) -> Self {
        Self::new(config.enabled, config.debounce_ms, config.timeout_ms)
    }

    /// Set the channel handles for communication with the transport worker
    pub fn set_channels(
        &mut self,
        request_tx: UnboundedSender<SuggestCommand>,
        response_rx: Receiver<SuggestEvent>,
    ) {
        self.request_tx = Some(request_tx);
        self.response_rx = Some(response_rx);
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// The suggestion for the current selection, if one has arrived
    pub fn suggestion(&self) -> Option<&Suggestion> {
        let selection = self.selection.as_ref()?;
        self.suggestion
            .as_ref()
            .filter(|suggestion| suggestion.issue == selection.text)
    }

    /// Whether the current selection is waiting on the debounce or the service
    pub fn is_waiting(&self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        if !self.enabled || self.suggestion().is_some() {
            return false;
        }
        self.debouncer.is_pending() || self.is_outstanding(&selection.text)
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Record a selection change from the editor
    ///
    /// A change to different text restarts the quiet window and invalidates
    /// a suggestion made for the old text. Clearing the selection cancels any
    /// pending request.
    pub fn on_selection_change(&mut self, selection: Option<Selection>, now: Instant) {
        let old_text = self.selection.as_ref().map(|s| s.text.as_str());
        let new_text = selection.as_ref().map(|s| s.text.as_str());
        let text_changed = old_text != new_text;

        if text_changed {
            if self
                .suggestion
                .as_ref()
                .is_some_and(|suggestion| Some(suggestion.issue.as_str()) != new_text)
            {
                self.suggestion = None;
            }

            match new_text {
                Some(_) => self.debouncer.schedule(now),
                None => self.debouncer.cancel(),
            }
        }

        self.selection = selection;
    }

    /// Advance the debounce and timeout clocks
    pub fn tick(&mut self, now: Instant) {
        if self.debouncer.take_ready(now)
            && let Some(selection) = &self.selection
        {
            let text = selection.text.clone();
            self.request(text, now);
        }

        self.check_timeout(now);
    }

    /// Drain transport events without blocking
    pub fn poll_events(&mut self) {
        loop {
            let event = match self.response_rx.as_ref().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                Some(Err(TryRecvError::Empty)) | None => return,
                Some(Err(TryRecvError::Disconnected)) => {
                    log::warn!("Suggestion worker disconnected");
                    self.response_rx = None;
                    self.drive(ConnectionEvent::Failed, None);
                    return;
                }
            };
            self.apply_event(event);
        }
    }

    /// Apply one transport event
    pub fn apply_event(&mut self, event: SuggestEvent) {
        if event.connection_id() != self.connection_id {
            log::debug!(
                "Ignoring event for connection {} (current: {})",
                event.connection_id(),
                self.connection_id
            );
            return;
        }

        match event {
            SuggestEvent::Established { connection_id } => {
                log::info!("Suggestion connection {} established", connection_id);
                self.drive(ConnectionEvent::Established, None);
            }
            SuggestEvent::Message { payload, .. } => self.handle_message(&payload),
            SuggestEvent::Closed { connection_id } => {
                log::info!("Suggestion connection {} closed", connection_id);
                self.drive(ConnectionEvent::RemoteClosed, None);
            }
            SuggestEvent::Failed { error, .. } => {
                log::error!("Suggestion connection failed: {}", error);
                self.notice = Some(format!("Suggestion service unavailable: {}", error));
                self.drive(ConnectionEvent::Failed, None);
            }
        }
    }

    /// Accept the suggestion for the current selection
    ///
    /// Returns the replacement for the selected range and clears both the
    /// selection and the suggestion. Tags the selection only partly covers
    /// are carried into the replacement. Returns None when either is missing.
    pub fn accept(&mut self) -> Option<Replacement> {
        let selection = self.selection.as_ref()?;
        let suggestion = self.suggestion()?;
        if selection.text.is_empty() || suggestion.corrected.is_empty() {
            return None;
        }

        let replacement = Replacement {
            range: selection.range,
            html: html::balanced_replacement(&selection.html, &suggestion.corrected),
        };

        self.selection = None;
        self.suggestion = None;
        self.debouncer.cancel();
        Some(replacement)
    }

    /// Close the connection because the host is going away
    pub fn shutdown(&mut self) {
        self.debouncer.cancel();
        self.drive(ConnectionEvent::Shutdown, None);
    }

    fn request(&mut self, text: String, now: Instant) {
        if !self.enabled || self.request_tx.is_none() {
            return;
        }
        if self.is_outstanding(&text) {
            log::debug!("Selection already requested, not sending again");
            return;
        }

        let outgoing = Outgoing {
            text,
            requested_at: now,
        };
        self.drive(ConnectionEvent::SendRequested, Some(outgoing));
    }

    fn is_outstanding(&self, text: &str) -> bool {
        self.queued.as_ref().is_some_and(|q| q.text == text)
            || self.in_flight.iter().any(|o| o.text == text)
    }

    fn handle_message(&mut self, payload: &str) {
        match parse_inbound(payload) {
            Inbound::Corrected(corrected) => {
                let Some(request) = self.in_flight.pop_front() else {
                    log::warn!("Correction received with no request outstanding");
                    return;
                };

                let current = self.selection.as_ref().map(|s| s.text.as_str());
                if current == Some(request.text.as_str()) {
                    self.suggestion = Some(Suggestion {
                        issue: request.text,
                        corrected,
                    });
                } else {
                    log::debug!("Discarding correction for superseded selection");
                }
            }
            Inbound::Other => match self.in_flight.pop_front() {
                Some(request) => log::info!(
                    "Service answered {:?} without a correction: {}",
                    request.text,
                    payload
                ),
                None => log::debug!("Ignoring service message: {}", payload),
            },
            Inbound::Malformed(e) => log::warn!("Unparseable service message ({}): {}", e, payload),
        }
    }

    fn check_timeout(&mut self, now: Instant) {
        let oldest = self
            .in_flight
            .front()
            .or(self.queued.as_ref())
            .map(|o| o.requested_at);

        if let Some(requested_at) = oldest
            && now.saturating_duration_since(requested_at) >= self.request_timeout
        {
            log::warn!(
                "No suggestion after {:?}, closing connection {}",
                self.request_timeout,
                self.connection_id
            );
            self.notice = Some("Suggestion service did not respond".to_string());
            self.drive(ConnectionEvent::TimedOut, None);
        }
    }

    /// Run one state machine transition and carry out its action
    fn drive(&mut self, event: ConnectionEvent, outgoing: Option<Outgoing>) {
        let (next, action) = self.connection.transition(event);
        log::debug!(
            "Connection {}: {} --{:?}--> {} ({:?})",
            self.connection_id,
            self.connection.label(),
            event,
            next.label(),
            action
        );
        self.connection = next;

        match action {
            ConnectionAction::OpenConnection => {
                self.connection_id = self.connection_id.wrapping_add(1);
                self.in_flight.clear();
                self.queued = outgoing;
                let connection_id = self.connection_id;
                if !self.send_command(SuggestCommand::Connect { connection_id }) {
                    self.drive(ConnectionEvent::Failed, None);
                }
            }
            ConnectionAction::QueueUntilOpen => {
                if outgoing.is_some() {
                    self.queued = outgoing;
                }
            }
            ConnectionAction::FlushQueued => {
                if let Some(queued) = self.queued.take() {
                    self.send_text(queued);
                }
            }
            ConnectionAction::SendNow => {
                if let Some(outgoing) = outgoing {
                    self.send_text(outgoing);
                }
            }
            ConnectionAction::DropInFlight => {
                self.in_flight.clear();
                self.queued = None;
            }
            ConnectionAction::CloseConnection => {
                self.in_flight.clear();
                self.queued = None;
                let connection_id = self.connection_id;
                self.send_command(SuggestCommand::Disconnect { connection_id });
            }
            ConnectionAction::Nothing => {}
        }
    }

    fn send_text(&mut self, outgoing: Outgoing) {
        let connection_id = self.connection_id;
        let command = SuggestCommand::Send {
            connection_id,
            text: outgoing.text.clone(),
        };
        if self.send_command(command) {
            self.in_flight.push_back(outgoing);
        } else {
            self.drive(ConnectionEvent::Failed, None);
        }
    }

    fn send_command(&mut self, command: SuggestCommand) -> bool {
        let Some(tx) = &self.request_tx else {
            return false;
        };
        if tx.send(command).is_ok() {
            return true;
        }

        log::warn!("Suggestion worker is gone");
        self.request_tx = None;
        false
    }
}

impl Default for SuggestionSession {
    fn default() -> Self {
        Self::from_config(&SuggestConfig::default())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
