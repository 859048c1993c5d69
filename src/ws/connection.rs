//! WebSocket transport built on `tokio-tungstenite`.
//!
//! [`connect`] performs the handshake and splits the socket. Outbound
//! frames go through an unbounded channel drained by a writer task, so
//! [`ChannelSink::send_text`] never blocks the caller. Inbound frames are
//! read with [`next_event`], which folds control frames away.

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::handler::CommandSink;
use crate::config::ConsoleConfig;
use crate::domain::ConnectionState;
use crate::error::ConsoleError;

/// Client socket type produced by the handshake.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read half of an established connection.
pub type Inbound = SplitStream<WsStream>;

/// Outbound side of a connection, backed by the writer task's channel.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<mpsc::UnboundedSender<Message>>,
}

impl ChannelSink {
    /// Sink that is already closed, for sessions whose handshake failed.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self { tx: None }
    }

    /// Returns `true` while frames can still be queued.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

impl CommandSink for ChannelSink {
    fn send_text(&mut self, text: String) -> Result<(), ConsoleError> {
        let Some(tx) = &self.tx else {
            return Err(ConsoleError::NotOpen(ConnectionState::Closed));
        };
        tx.send(Message::text(text))
            .map_err(|_| ConsoleError::NotOpen(ConnectionState::Closed))
    }

    fn close(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The writer may already be gone; nothing left to close then.
            let _ = tx.send(Message::Close(None));
        }
    }
}

/// An established connection: outbound sink plus inbound stream.
pub struct Connection {
    /// Outbound frames.
    pub sink: ChannelSink,
    /// Inbound frames.
    pub inbound: Inbound,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

/// What the reader observed on the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A text frame.
    Text(String),
    /// The connection ended. Clean closes and errors look the same to the
    /// console; `detail` only feeds diagnostics.
    Closed {
        /// Close reason or error description, if any.
        detail: Option<String>,
    },
}

/// Opens a WebSocket connection to the configured console endpoint.
///
/// # Errors
///
/// Returns [`ConsoleError::ConnectTimeout`] if the handshake exceeds the
/// configured timeout, or [`ConsoleError::Connect`] if it fails.
pub async fn connect(config: &ConsoleConfig) -> Result<Connection, ConsoleError> {
    let url = config.endpoint_url();
    let ws_config = WebSocketConfig::default()
        .max_message_size(Some(config.max_payload_bytes))
        .max_frame_size(Some(config.max_payload_bytes));

    let handshake =
        tokio_tungstenite::connect_async_with_config(url.as_str(), Some(ws_config), false);
    let (socket, _response) = tokio::time::timeout(config.connect_timeout(), handshake)
        .await
        .map_err(|_| ConsoleError::ConnectTimeout {
            url: url.clone(),
            secs: config.connect_timeout_secs,
        })??;

    tracing::debug!(%url, "websocket handshake complete");

    let (mut ws_tx, inbound) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if let Err(err) = ws_tx.send(msg).await {
                tracing::debug!(%err, "websocket write failed");
                return;
            }
            if closing {
                return;
            }
        }
        // Every sender dropped without an explicit close.
        let _ = ws_tx.close().await;
    });

    Ok(Connection {
        sink: ChannelSink { tx: Some(tx) },
        inbound,
    })
}

/// Reads until the next text frame or the end of the connection.
///
/// Ping and pong frames are answered by the protocol layer and only traced.
/// Binary frames are not part of the console protocol and are skipped.
pub async fn next_event(inbound: &mut Inbound) -> InboundEvent {
    loop {
        match inbound.next().await {
            Some(Ok(Message::Text(text))) => return InboundEvent::Text(text.as_str().to_owned()),
            Some(Ok(Message::Close(frame))) => {
                return InboundEvent::Closed {
                    detail: frame.map(|f| format!("{} {}", u16::from(f.code), f.reason)),
                };
            }
            Some(Ok(Message::Ping(_))) => tracing::debug!("got ping"),
            Some(Ok(Message::Pong(_))) => tracing::debug!("got pong"),
            Some(Ok(Message::Binary(data))) => {
                tracing::debug!(len = data.len(), "ignoring binary frame");
            }
            Some(Ok(Message::Frame(_))) => {}
            Some(Err(err)) => {
                return InboundEvent::Closed {
                    detail: Some(err.to_string()),
                };
            }
            None => return InboundEvent::Closed { detail: None },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_sink_rejects_frames() {
        let mut sink = ChannelSink::disconnected();
        assert!(!sink.is_connected());
        let Err(err) = sink.send_text("{}".to_string()) else {
            panic!("disconnected sink accepted a frame");
        };
        assert!(matches!(err, ConsoleError::NotOpen(ConnectionState::Closed)));
    }

    #[test]
    fn close_queues_close_frame_then_disconnects() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink { tx: Some(tx) };
        assert!(sink.is_connected());

        assert!(sink.send_text(r#"{"command":"watch"}"#.to_string()).is_ok());
        sink.close();
        assert!(!sink.is_connected());
        assert!(sink.send_text("late".to_string()).is_err());

        assert!(matches!(rx.try_recv(), Ok(Message::Text(_))));
        assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails() {
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        drop(listener);

        let config = ConsoleConfig {
            port: addr.port(),
            connect_timeout_secs: 2,
            ..ConsoleConfig::default()
        };
        let Err(err) = connect(&config).await else {
            panic!("connected to a closed port");
        };
        assert!(err.is_transport());
    }
}
