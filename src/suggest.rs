//! Sentence suggestions for the selected text
//!
//! Selections are debounced on the UI thread by [`SuggestionSession`], which
//! owns the connection state machine and talks to the transport worker over
//! channels. The worker holds the websocket on its own thread.

pub mod connection;
pub mod debouncer;
pub mod message;
pub mod session;
pub mod worker;

pub use connection::{ConnectionAction, ConnectionEvent, ConnectionState};
pub use session::SuggestionSession;
pub use worker::spawn_worker;

use crate::document::SelectionRange;

/// Commands sent from the session to the transport worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestCommand {
    /// Open a new connection, closing any previous one
    Connect { connection_id: u64 },
    /// Send selected text over the connection
    Send { connection_id: u64, text: String },
    /// Close the connection if it is still the current one
    Disconnect { connection_id: u64 },
}

/// Transport events reported back to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestEvent {
    Established { connection_id: u64 },
    /// A text frame from the service
    Message { connection_id: u64, payload: String },
    Closed { connection_id: u64 },
    Failed { connection_id: u64, error: String },
}

impl SuggestEvent {
    pub fn connection_id(&self) -> u64 {
        match self {
            SuggestEvent::Established { connection_id }
            | SuggestEvent::Message { connection_id, .. }
            | SuggestEvent::Closed { connection_id }
            | SuggestEvent::Failed { connection_id, .. } => *connection_id,
        }
    }
}

/// A correction paired with the selection that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// The selected text that was sent
    pub issue: String,
    pub corrected: String,
}

/// An accepted suggestion, ready to splice into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: SelectionRange,
    pub html: String,
}
