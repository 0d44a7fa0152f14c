//! Suggestion transport worker
//!
//! Owns the websocket on a background thread with its own tokio runtime.
//! Commands arrive from the session; frames and lifecycle changes go back as
//! [`SuggestEvent`]s. At most one connection exists at a time.

use std::sync::mpsc::Sender;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{SuggestCommand, SuggestEvent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where and how to reach the suggestion service
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub url: Url,
    pub connect_timeout: Duration,
}

struct ActiveConnection {
    id: u64,
    socket: Socket,
}

/// What woke the worker loop
enum Wake {
    Command(Option<SuggestCommand>),
    Frame(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Shutdown,
}

/// Spawn the suggestion worker thread
///
/// The thread exits when the command channel closes or `shutdown` fires,
/// closing any open connection first.
pub fn spawn_worker(
    config: WorkerConfig,
    request_rx: UnboundedReceiver<SuggestCommand>,
    response_tx: Sender<SuggestEvent>,
    shutdown: CancellationToken,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("suggest-worker".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to start suggestion runtime: {}", e);
                    return;
                }
            };
            runtime.block_on(worker_loop(config, request_rx, response_tx, shutdown));
        })
}

/// Main worker loop - processes commands and frames until told to stop
pub async fn worker_loop(
    config: WorkerConfig,
    mut request_rx: UnboundedReceiver<SuggestCommand>,
    response_tx: Sender<SuggestEvent>,
    shutdown: CancellationToken,
) {
    let mut active: Option<ActiveConnection> = None;
    let mut pending: Option<SuggestCommand> = None;

    loop {
        let wake = match (pending.take(), active.as_mut()) {
            (Some(command), _) => Wake::Command(Some(command)),
            (None, Some(conn)) => tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Shutdown,
                cmd = request_rx.recv() => Wake::Command(cmd),
                frame = conn.socket.next() => Wake::Frame(frame),
            },
            (None, None) => tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Shutdown,
                cmd = request_rx.recv() => Wake::Command(cmd),
            },
        };

        match wake {
            Wake::Shutdown | Wake::Command(None) => break,
            Wake::Command(Some(SuggestCommand::Connect { connection_id })) => {
                if let Some(mut old) = active.take() {
                    log::debug!("Replacing connection {} with {}", old.id, connection_id);
                    let _ = old.socket.close(None).await;
                }

                match connect(&config, connection_id, &mut request_rx, &shutdown).await {
                    Connecting::Open(socket) => {
                        active = Some(ActiveConnection {
                            id: connection_id,
                            socket,
                        });
                        let _ = response_tx.send(SuggestEvent::Established { connection_id });
                    }
                    Connecting::Failed(error) => {
                        let _ = response_tx.send(SuggestEvent::Failed {
                            connection_id,
                            error,
                        });
                    }
                    Connecting::Abandoned => {}
                    Connecting::Interrupted(None) => break,
                    Connecting::Interrupted(next) => pending = next,
                }
            }
            Wake::Command(Some(SuggestCommand::Send {
                connection_id,
                text,
            })) => send_text(connection_id, text, &mut active, &response_tx).await,
            Wake::Command(Some(SuggestCommand::Disconnect { connection_id })) => {
                if active.as_ref().is_some_and(|c| c.id == connection_id)
                    && let Some(mut conn) = active.take()
                {
                    log::debug!("Closing connection {}", connection_id);
                    let _ = conn.socket.close(None).await;
                }
            }
            Wake::Frame(frame) => {
                if let Some(conn) = active.take() {
                    active = handle_frame(conn, frame, &response_tx);
                }
            }
        }
    }

    if let Some(mut conn) = active {
        let _ = conn.socket.close(None).await;
    }
    log::debug!("Suggestion worker shutting down");
}

/// How a connection attempt ended
enum Connecting {
    Open(Socket),
    Failed(String),
    /// Disconnected by the session before the handshake finished
    Abandoned,
    /// Shutdown (None) or a newer connect arrived first
    Interrupted(Option<SuggestCommand>),
}

/// Open the websocket while still listening for shutdown and commands
async fn connect(
    config: &WorkerConfig,
    connection_id: u64,
    request_rx: &mut UnboundedReceiver<SuggestCommand>,
    shutdown: &CancellationToken,
) -> Connecting {
    log::info!("Connecting to suggestion service at {}", config.url);
    let attempt = tokio::time::timeout(config.connect_timeout, connect_async(config.url.as_str()));
    tokio::pin!(attempt);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Connecting::Interrupted(None),
            cmd = request_rx.recv() => match cmd {
                None => return Connecting::Interrupted(None),
                Some(SuggestCommand::Disconnect { connection_id: id }) if id == connection_id => {
                    log::debug!("Connection {} abandoned while connecting", connection_id);
                    return Connecting::Abandoned;
                }
                Some(next @ SuggestCommand::Connect { .. }) => {
                    return Connecting::Interrupted(Some(next));
                }
                Some(other) => {
                    log::debug!("Dropping {:?} while connection {} opens", other, connection_id);
                }
            },
            result = &mut attempt => {
                return match result {
                    Ok(Ok((socket, _response))) => Connecting::Open(socket),
                    Ok(Err(e)) => Connecting::Failed(e.to_string()),
                    Err(_) => Connecting::Failed(format!(
                        "connect timed out after {:?}",
                        config.connect_timeout
                    )),
                };
            }
        }
    }
}

async fn send_text(
    connection_id: u64,
    text: String,
    active: &mut Option<ActiveConnection>,
    response_tx: &Sender<SuggestEvent>,
) {
    let Some(conn) = active.as_mut().filter(|c| c.id == connection_id) else {
        log::debug!("Dropping send for inactive connection {}", connection_id);
        return;
    };

    if let Err(e) = conn.socket.send(Message::text(text)).await {
        log::warn!("Send on connection {} failed: {}", connection_id, e);
        *active = None;
        let _ = response_tx.send(SuggestEvent::Failed {
            connection_id,
            error: e.to_string(),
        });
    }
}

/// Process one inbound frame; returns the connection if it stays open
fn handle_frame(
    conn: ActiveConnection,
    frame: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    response_tx: &Sender<SuggestEvent>,
) -> Option<ActiveConnection> {
    let connection_id = conn.id;

    match frame {
        Some(Ok(Message::Text(text))) => {
            let _ = response_tx.send(SuggestEvent::Message {
                connection_id,
                payload: text.as_str().to_string(),
            });
            Some(conn)
        }
        Some(Ok(Message::Binary(data))) => {
            match String::from_utf8(data.to_vec()) {
                Ok(payload) => {
                    let _ = response_tx.send(SuggestEvent::Message {
                        connection_id,
                        payload,
                    });
                }
                Err(_) => log::warn!("Ignoring non-UTF-8 binary frame"),
            }
            Some(conn)
        }
        Some(Ok(Message::Close(_))) | None => {
            let _ = response_tx.send(SuggestEvent::Closed { connection_id });
            None
        }
        Some(Ok(_)) => {
            // Ping, pong and raw frames; tungstenite answers pings itself
            Some(conn)
        }
        Some(Err(e)) => {
            let _ = response_tx.send(SuggestEvent::Failed {
                connection_id,
                error: e.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod worker_tests;
