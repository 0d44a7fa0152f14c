//! Tests for the suggestion session

use super::*;
use crate::document::SelectionRange;
use proptest::prelude::*;
use std::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

const DEBOUNCE: Duration = Duration::from_millis(3000);

struct Harness {
    session: SuggestionSession,
    commands: UnboundedReceiver<SuggestCommand>,
    events: mpsc::Sender<SuggestEvent>,
    start: Instant,
}

impl Harness {
    fn new() -> Self {
        let (request_tx, commands) = unbounded_channel();
        let (events, response_rx) = mpsc::channel();
        let mut session = SuggestionSession::new(true, 3000, 30_000);
        session.set_channels(request_tx, response_rx);
        Self {
            session,
            commands,
            events,
            start: Instant::now(),
        }
    }

    fn at(&self, ms: u64) -> Instant {
        self.start + Duration::from_millis(ms)
    }

    fn select(&mut self, text: &str, ms: u64) {
        let now = self.at(ms);
        self.session.on_selection_change(Some(selection(text)), now);
    }

    fn clear_selection(&mut self, ms: u64) {
        let now = self.at(ms);
        self.session.on_selection_change(None, now);
    }

    fn tick(&mut self, ms: u64) {
        let now = self.at(ms);
        self.session.tick(now);
    }

    fn deliver(&mut self, event: SuggestEvent) {
        self.events.send(event).unwrap();
        self.session.poll_events();
    }

    fn drain(&mut self) -> Vec<SuggestCommand> {
        let mut out = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            out.push(command);
        }
        out
    }
}

fn selection(text: &str) -> Selection {
    Selection {
        text: text.to_string(),
        html: text.to_string(),
        range: SelectionRange::new((0, 3), (0, 3 + text.chars().count())),
    }
}

fn reply(connection_id: u64, corrected: &str) -> SuggestEvent {
    SuggestEvent::Message {
        connection_id,
        payload: format!(r#"{{"corrected_sentence": "{}"}}"#, corrected),
    }
}

#[test]
fn test_nothing_sent_before_quiet_window() {
    let mut h = Harness::new();
    h.select("Kesimpta dose", 0);
    h.tick(2999);

    assert!(h.drain().is_empty());
    assert!(h.session.is_waiting());
    assert_eq!(h.session.connection(), ConnectionState::Idle);
}

#[test]
fn test_kesimpta_scenario() {
    let mut h = Harness::new();
    h.select("Kesimpta dose", 0);
    h.tick(3000);

    assert_eq!(h.drain(), vec![SuggestCommand::Connect { connection_id: 1 }]);
    assert_eq!(h.session.connection(), ConnectionState::Connecting);

    h.deliver(SuggestEvent::Established { connection_id: 1 });
    assert_eq!(
        h.drain(),
        vec![SuggestCommand::Send {
            connection_id: 1,
            text: "Kesimpta dose".to_string()
        }]
    );
    assert_eq!(h.session.connection(), ConnectionState::Open);
    assert!(h.session.is_waiting());

    h.deliver(reply(1, "Kesimpta dosage"));

    let suggestion = h.session.suggestion().expect("suggestion");
    assert_eq!(suggestion.issue, "Kesimpta dose");
    assert_eq!(suggestion.corrected, "Kesimpta dosage");
    assert!(!h.session.is_waiting());
}

#[test]
fn test_burst_sends_only_last_selection() {
    let mut h = Harness::new();
    h.select("K", 0);
    h.select("Ke", 500);
    h.select("Kesimpta", 1500);
    h.select("Kesimpta dose", 2500);
    h.tick(3000);
    h.tick(5499);
    assert!(h.drain().is_empty());

    h.tick(5500);
    h.deliver(SuggestEvent::Established { connection_id: 1 });

    assert_eq!(
        h.drain(),
        vec![
            SuggestCommand::Connect { connection_id: 1 },
            SuggestCommand::Send {
                connection_id: 1,
                text: "Kesimpta dose".to_string()
            },
        ]
    );
}

#[test]
fn test_open_connection_is_reused() {
    let mut h = Harness::new();
    h.select("first", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(reply(1, "First"));
    h.drain();

    h.select("second", 4000);
    h.tick(7000);

    assert_eq!(
        h.drain(),
        vec![SuggestCommand::Send {
            connection_id: 1,
            text: "second".to_string()
        }]
    );
    assert_eq!(h.session.connection(), ConnectionState::Open);
}

#[test]
fn test_accept_returns_span_and_clears_state() {
    let mut h = Harness::new();
    h.select("Kesimpta dose", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(reply(1, "Kesimpta dosage"));

    let replacement = h.session.accept().expect("replacement");

    assert_eq!(replacement.html, "<span>Kesimpta dosage</span>");
    assert_eq!(replacement.range, selection("Kesimpta dose").range);
    assert!(h.session.selection().is_none());
    assert!(h.session.suggestion().is_none());
}

#[test]
fn test_accept_without_suggestion_is_noop() {
    let mut h = Harness::new();
    h.select("Kesimpta dose", 0);

    assert!(h.session.accept().is_none());
    assert!(h.session.selection().is_some());
}

#[test]
fn test_changing_selection_invalidates_suggestion() {
    let mut h = Harness::new();
    h.select("Kesimpta dose", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(reply(1, "Kesimpta dosage"));

    h.select("weekly", 4000);
    assert!(h.session.suggestion().is_none());

    // Going back to the old text does not resurrect the old suggestion
    h.select("Kesimpta dose", 4100);
    assert!(h.session.suggestion().is_none());
}

#[test]
fn test_reply_for_superseded_selection_is_discarded() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });

    h.select("beta", 3500);
    h.tick(6500);
    h.deliver(reply(1, "Alpha"));
    assert!(h.session.suggestion().is_none());

    h.deliver(reply(1, "Beta"));
    assert_eq!(h.session.suggestion().map(|s| s.corrected.as_str()), Some("Beta"));
}

#[test]
fn test_error_closes_and_next_selection_reconnects() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(SuggestEvent::Failed {
        connection_id: 1,
        error: "reset by peer".to_string(),
    });

    assert_eq!(h.session.connection(), ConnectionState::Closed);
    assert!(h.session.take_notice().unwrap().contains("reset by peer"));
    h.drain();

    h.select("beta", 4000);
    h.tick(7000);
    assert_eq!(h.drain(), vec![SuggestCommand::Connect { connection_id: 2 }]);

    h.deliver(SuggestEvent::Established { connection_id: 2 });
    assert_eq!(h.session.connection(), ConnectionState::Open);
}

#[test]
fn test_remote_close_moves_to_closed() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(SuggestEvent::Closed { connection_id: 1 });

    assert_eq!(h.session.connection(), ConnectionState::Closed);
    assert!(!h.session.is_waiting());
}

#[test]
fn test_events_from_old_connection_are_ignored() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Failed {
        connection_id: 1,
        error: "refused".to_string(),
    });
    h.select("beta", 4000);
    h.tick(7000);
    h.drain();

    // Late close from the first attempt must not kill the second
    h.deliver(SuggestEvent::Closed { connection_id: 1 });
    assert_eq!(h.session.connection(), ConnectionState::Connecting);

    h.deliver(SuggestEvent::Established { connection_id: 2 });
    assert_eq!(
        h.drain(),
        vec![SuggestCommand::Send {
            connection_id: 2,
            text: "beta".to_string()
        }]
    );
}

#[test]
fn test_selection_while_connecting_replaces_queued_text() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.select("beta", 3100);
    h.tick(6100);

    assert_eq!(h.drain(), vec![SuggestCommand::Connect { connection_id: 1 }]);

    h.deliver(SuggestEvent::Established { connection_id: 1 });
    assert_eq!(
        h.drain(),
        vec![SuggestCommand::Send {
            connection_id: 1,
            text: "beta".to_string()
        }]
    );
}

#[test]
fn test_timeout_closes_connection() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.drain();

    h.tick(3000 + 29_999);
    assert!(h.session.is_waiting());

    h.tick(3000 + 30_000);

    assert_eq!(h.drain(), vec![SuggestCommand::Disconnect { connection_id: 1 }]);
    assert_eq!(h.session.connection(), ConnectionState::Closed);
    assert!(!h.session.is_waiting());
    assert_eq!(
        h.session.take_notice().as_deref(),
        Some("Suggestion service did not respond")
    );
}

#[test]
fn test_same_text_is_not_resent_while_outstanding() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.drain();

    h.clear_selection(3100);
    h.select("alpha", 3200);
    h.tick(6200);

    assert!(h.drain().is_empty());
}

#[test]
fn test_clearing_selection_cancels_pending_request() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.clear_selection(1000);
    h.tick(5000);

    assert!(h.drain().is_empty());
    assert!(!h.session.is_waiting());
}

#[test]
fn test_shutdown_disconnects_open_connection() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.drain();

    h.session.shutdown();

    assert_eq!(h.drain(), vec![SuggestCommand::Disconnect { connection_id: 1 }]);
    assert_eq!(h.session.connection(), ConnectionState::Closed);
}

#[test]
fn test_disabled_session_never_connects() {
    let (request_tx, mut commands) = unbounded_channel();
    let (_events, response_rx) = mpsc::channel();
    let mut session = SuggestionSession::new(false, 3000, 30_000);
    session.set_channels(request_tx, response_rx);

    let start = Instant::now();
    session.on_selection_change(Some(selection("alpha")), start);
    session.tick(start + DEBOUNCE);

    assert!(commands.try_recv().is_err());
    assert!(!session.is_waiting());
}

#[test]
fn test_missing_worker_leaves_connection_closed() {
    let (request_tx, commands) = unbounded_channel();
    let (_events, response_rx) = mpsc::channel();
    let mut session = SuggestionSession::new(true, 3000, 30_000);
    session.set_channels(request_tx, response_rx);
    drop(commands);

    let start = Instant::now();
    session.on_selection_change(Some(selection("alpha")), start);
    session.tick(start + DEBOUNCE);

    assert_eq!(session.connection(), ConnectionState::Closed);
}

#[test]
fn test_reply_without_correction_answers_oldest_request() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.select("beta", 3500);
    h.tick(6500);

    h.deliver(SuggestEvent::Message {
        connection_id: 1,
        payload: r#"{"status": "no change"}"#.to_string(),
    });
    h.deliver(reply(1, "Beta"));

    assert_eq!(h.session.suggestion().map(|s| s.corrected.as_str()), Some("Beta"));
    assert!(!h.session.is_waiting());
}

#[test]
fn test_accept_keeps_partly_selected_tags_balanced() {
    let mut h = Harness::new();
    let selected = Selection {
        text: "Kesimpta dose".to_string(),
        html: "Kesimpta</b> dose".to_string(),
        range: SelectionRange::new((0, 6), (0, 23)),
    };
    h.session.on_selection_change(Some(selected), h.at(0));
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(reply(1, "Kesimpta dosage"));

    let replacement = h.session.accept().expect("replacement");

    assert_eq!(replacement.html, "</b><span>Kesimpta dosage</span>");
}

#[test]
fn test_malformed_message_is_ignored() {
    let mut h = Harness::new();
    h.select("alpha", 0);
    h.tick(3000);
    h.deliver(SuggestEvent::Established { connection_id: 1 });
    h.deliver(SuggestEvent::Message {
        connection_id: 1,
        payload: "not json".to_string(),
    });

    assert!(h.session.suggestion().is_none());
    assert!(h.session.is_waiting());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any burst of selections closer together than the window produces one
    // request carrying the last text.
    #[test]
    fn prop_burst_issues_exactly_one_request(
        texts in prop::collection::vec("[a-z]{1,12}", 1..8),
        gaps in prop::collection::vec(0u64..2999, 8),
    ) {
        let mut h = Harness::new();
        let mut t = 0;
        for (i, text) in texts.iter().enumerate() {
            t += gaps[i];
            h.select(text, t);
            h.tick(t);
        }
        h.tick(t + 3000);
        h.deliver(SuggestEvent::Established { connection_id: 1 });

        let commands = h.drain();
        let sends: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                SuggestCommand::Send { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();

        prop_assert_eq!(sends, vec![texts.last().unwrap().clone()]);
        prop_assert_eq!(commands[0].clone(), SuggestCommand::Connect { connection_id: 1 });
    }
}
