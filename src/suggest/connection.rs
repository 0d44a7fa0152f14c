//! Suggestion service connection state machine
//!
//! Every change to the connection goes through [`ConnectionState::transition`],
//! which returns the new state and the single action the session must take.

/// Lifecycle of the one duplex connection a session may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never connected
    #[default]
    Idle,
    /// Connect requested, waiting for the handshake
    Connecting,
    /// Ready to send and receive
    Open,
    /// Ended by error, remote close, timeout or shutdown; must reconnect to send
    Closed,
}

/// Inputs to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A debounced selection wants to go out
    SendRequested,
    /// Transport reports the handshake completed
    Established,
    /// Transport error or failed handshake
    Failed,
    /// Remote side closed the channel
    RemoteClosed,
    /// The oldest request waited longer than the timeout
    TimedOut,
    /// The host is closing
    Shutdown,
}

/// What the session must do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Start a new connection and hold the text until it is open
    OpenConnection,
    /// Hold the text, replacing anything already held
    QueueUntilOpen,
    /// Send the held text now
    FlushQueued,
    /// Send the text over the open connection
    SendNow,
    /// Forget requests that can no longer be answered
    DropInFlight,
    /// Tear down the transport and forget in-flight requests
    CloseConnection,
    Nothing,
}

impl ConnectionState {
    pub fn transition(self, event: ConnectionEvent) -> (ConnectionState, ConnectionAction) {
        use ConnectionAction as A;
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self, event) {
            (S::Idle | S::Closed, E::SendRequested) => (S::Connecting, A::OpenConnection),
            (S::Connecting, E::SendRequested) => (S::Connecting, A::QueueUntilOpen),
            (S::Open, E::SendRequested) => (S::Open, A::SendNow),

            (S::Connecting, E::Established) => (S::Open, A::FlushQueued),
            (state, E::Established) => (state, A::Nothing),

            (S::Connecting | S::Open, E::Failed | E::RemoteClosed) => (S::Closed, A::DropInFlight),
            (state, E::Failed | E::RemoteClosed) => (state, A::Nothing),

            (S::Connecting | S::Open, E::TimedOut | E::Shutdown) => {
                (S::Closed, A::CloseConnection)
            }
            (state, E::TimedOut | E::Shutdown) => (state, A::Nothing),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionAction as A;
    use ConnectionEvent as E;
    use ConnectionState as S;

    #[test]
    fn test_first_request_opens_connection() {
        assert_eq!(S::Idle.transition(E::SendRequested), (S::Connecting, A::OpenConnection));
    }

    #[test]
    fn test_closed_reconnects_on_request() {
        assert_eq!(S::Closed.transition(E::SendRequested), (S::Connecting, A::OpenConnection));
    }

    #[test]
    fn test_request_while_connecting_is_queued() {
        assert_eq!(S::Connecting.transition(E::SendRequested), (S::Connecting, A::QueueUntilOpen));
    }

    #[test]
    fn test_established_flushes_queue() {
        assert_eq!(S::Connecting.transition(E::Established), (S::Open, A::FlushQueued));
    }

    #[test]
    fn test_open_reuses_connection() {
        assert_eq!(S::Open.transition(E::SendRequested), (S::Open, A::SendNow));
    }

    #[test]
    fn test_errors_close_live_connections() {
        for state in [S::Connecting, S::Open] {
            assert_eq!(state.transition(E::Failed), (S::Closed, A::DropInFlight));
            assert_eq!(state.transition(E::RemoteClosed), (S::Closed, A::DropInFlight));
        }
    }

    #[test]
    fn test_timeout_and_shutdown_close_transport() {
        for state in [S::Connecting, S::Open] {
            assert_eq!(state.transition(E::TimedOut), (S::Closed, A::CloseConnection));
            assert_eq!(state.transition(E::Shutdown), (S::Closed, A::CloseConnection));
        }
    }

    #[test]
    fn test_late_events_on_dead_connection_are_ignored() {
        for state in [S::Idle, S::Closed] {
            for event in [E::Established, E::Failed, E::RemoteClosed, E::TimedOut, E::Shutdown] {
                assert_eq!(state.transition(event), (state, A::Nothing));
            }
        }
        assert_eq!(S::Open.transition(E::Established), (S::Open, A::Nothing));
    }
}
