//! Console session: one logical connection and its state machine.
//!
//! [`ConsoleSession`] owns its [`CommandSink`] exclusively. It is created
//! in `Connecting`, becomes `Open` on the first open event, and ends in
//! `Closed`. A reconnect never revives a session; it builds a new one.

use serde::Serialize;

use super::handler::{CommandSink, ConnectionHandler};
use crate::domain::{
    Command, ConnectionState, ConsoleLog, RenderMode, SessionId, parse_message, render_message,
};
use crate::error::ConsoleError;

/// Log line written when a session opens.
pub const CONNECTED: &str = "connected";

/// Log line written when a session closes.
pub const CONNECTION_CLOSED: &str = "connection closed";

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Messages parsed and rendered.
    pub messages_received: u64,
    /// Messages dropped because they were not valid JSON.
    pub parse_failures: u64,
    /// Commands handed to the sink.
    pub commands_sent: u64,
}

/// A single console session over some transport.
#[derive(Debug)]
pub struct ConsoleSession<S> {
    id: SessionId,
    state: ConnectionState,
    sink: S,
    render_mode: RenderMode,
    stats: SessionStats,
}

impl<S: CommandSink> ConsoleSession<S> {
    /// Creates a session in `Connecting` state.
    #[must_use]
    pub fn new(id: SessionId, sink: S, render_mode: RenderMode) -> Self {
        Self {
            id,
            state: ConnectionState::Connecting,
            sink,
            render_mode,
            stats: SessionStats::default(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Session counters.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The outbound sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Sends `{"command": text}`. An empty `text` sends nothing and
    /// returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NotOpen`] unless the session is open, or the
    /// sink's error if the frame cannot be queued.
    pub fn send_command(&mut self, text: &str) -> Result<bool, ConsoleError> {
        if text.is_empty() {
            return Ok(false);
        }
        if self.state != ConnectionState::Open {
            return Err(ConsoleError::NotOpen(self.state));
        }
        let frame = Command::new(text).to_json()?;
        self.sink.send_text(frame)?;
        self.stats.commands_sent += 1;
        tracing::debug!(session = %self.id, command = text, "command sent");
        Ok(true)
    }

    /// Retires the session without logging. Used when the user replaces it.
    pub fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.sink.close();
        self.state = ConnectionState::Closed;
        tracing::info!(session = %self.id, "session retired");
    }
}

impl<S: CommandSink> ConnectionHandler for ConsoleSession<S> {
    fn on_open(&mut self, log: &mut ConsoleLog) -> Result<(), ConsoleError> {
        match self.state.transition(ConnectionState::Open) {
            Ok(next) => self.state = next,
            Err(err) => {
                tracing::debug!(session = %self.id, %err, "open event ignored");
                return Ok(());
            }
        }
        tracing::info!(session = %self.id, "connected");
        log.append_line(CONNECTED);
        self.send_command(crate::domain::WATCH)?;
        Ok(())
    }

    fn on_message(&mut self, log: &mut ConsoleLog, payload: &str) -> Result<(), ConsoleError> {
        if self.state != ConnectionState::Open {
            tracing::debug!(session = %self.id, state = %self.state, "message on inactive session dropped");
            return Ok(());
        }
        let message = match parse_message(payload) {
            Ok(message) => message,
            Err(err) => {
                self.stats.parse_failures += 1;
                tracing::warn!(session = %self.id, %err, "dropping malformed message");
                return Err(err);
            }
        };
        self.stats.messages_received += 1;
        log.append_line(&render_message(&message, self.render_mode));
        Ok(())
    }

    fn on_close(&mut self, log: &mut ConsoleLog) {
        if self.state.is_terminal() {
            return;
        }
        self.state = ConnectionState::Closed;
        tracing::info!(session = %self.id, "connection closed");
        log.append_line(CONNECTION_CLOSED);
    }
}
