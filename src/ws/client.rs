//! Console client: owns the log and the one live session.
//!
//! The client runs as a single task. [`ConsoleClient::run`] selects over
//! user controls and the current session's inbound frames and handles each
//! event to completion before the next, so the session and the log are only
//! ever mutated from here.

use std::io::BufRead;
use std::thread::JoinHandle;

use tokio::sync::{broadcast, mpsc};

use super::connection::{self, ChannelSink, Inbound, InboundEvent};
use super::handler::ConnectionHandler;
use super::session::{ConsoleSession, SessionStats};
use crate::config::ConsoleConfig;
use crate::domain::{ConnectionState, ConsoleLog, LogEntry, SessionId};
use crate::error::ConsoleError;

/// Log line written when the user asks for a new connection.
pub const RECONNECTING: &str = "reconnecting";

/// User controls accepted by [`ConsoleClient::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Stage `text` as input and send it as a command.
    Submit(String),
    /// Replace the current session with a new one.
    Reconnect,
    /// Close the session and stop the client.
    Shutdown,
}

impl Control {
    /// Maps a line typed at the terminal to a control. `:reconnect` and
    /// `:quit` are reserved (surrounding blanks ignored); any other line is
    /// submitted unchanged.
    #[must_use]
    pub fn from_input(line: &str) -> Self {
        match line.trim() {
            ":reconnect" => Self::Reconnect,
            ":quit" | ":q" => Self::Shutdown,
            _ => Self::Submit(line.to_string()),
        }
    }
}

/// Forwards lines from `reader` as controls on a dedicated OS thread.
///
/// The thread is detached from the runtime, so a read blocked on an idle
/// terminal never delays runtime shutdown. It ends at EOF, on a read error,
/// or once the receiver is gone.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be spawned.
pub fn spawn_control_reader<R>(
    reader: R,
    tx: mpsc::Sender<Control>,
) -> std::io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("console-controls".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.blocking_send(Control::from_input(&line)).is_err() {
                    break;
                }
            }
        })
}

/// The live session and, while the connection lasts, its read half.
struct ActiveSession {
    session: ConsoleSession<ChannelSink>,
    inbound: Option<Inbound>,
}

impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("session", &self.session)
            .field("reading", &self.inbound.is_some())
            .finish()
    }
}

/// Console client over the WebSocket transport.
#[derive(Debug)]
pub struct ConsoleClient {
    config: ConsoleConfig,
    log: ConsoleLog,
    active: Option<ActiveSession>,
}

impl ConsoleClient {
    /// Creates a client with an empty log and no session.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        let log = ConsoleLog::new(config.log_capacity);
        Self {
            config,
            log,
            active: None,
        }
    }

    /// The console log.
    #[must_use]
    pub const fn log(&self) -> &ConsoleLog {
        &self.log
    }

    /// Receiver for every log entry appended from now on.
    #[must_use]
    pub fn subscribe_log(&self) -> broadcast::Receiver<LogEntry> {
        self.log.subscribe()
    }

    /// Identifier of the current session, if one was started.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.session.id())
    }

    /// State of the current session, if one was started.
    #[must_use]
    pub fn session_state(&self) -> Option<ConnectionState> {
        self.active.as_ref().map(|a| a.session.state())
    }

    /// Counters of the current session, if one was started.
    #[must_use]
    pub fn session_stats(&self) -> Option<SessionStats> {
        self.active.as_ref().map(|a| a.session.stats())
    }

    /// Opens the first session. A failed handshake is logged as a close.
    pub async fn initialize(&mut self) {
        let active = self.open_session().await;
        self.active = Some(active);
    }

    /// Retires the current session, clears the input, logs
    /// `reconnecting` and opens a new session.
    pub async fn reconnect(&mut self) {
        if let Some(mut old) = self.active.take() {
            old.session.close();
        }
        self.log.clear_input();
        self.log.append_line(RECONNECTING);
        let active = self.open_session().await;
        self.active = Some(active);
    }

    /// Sends `{"command": text}` on the current session. Empty text is a
    /// no-op and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NotOpen`] when there is no open session.
    pub fn send_command(&mut self, text: &str) -> Result<bool, ConsoleError> {
        if text.is_empty() {
            return Ok(false);
        }
        match &mut self.active {
            Some(active) => active.session.send_command(text),
            None => Err(ConsoleError::NotOpen(ConnectionState::Closed)),
        }
    }

    /// Stages `text` as the input line, then sends it.
    ///
    /// # Errors
    ///
    /// Same as [`ConsoleClient::send_command`].
    pub fn submit(&mut self, text: &str) -> Result<bool, ConsoleError> {
        self.log.set_input(text);
        self.send_command(text)
    }

    /// Waits for the next inbound event of the current session and handles
    /// it. Returns `false` without waiting if no connection is being read.
    pub async fn process_next(&mut self) -> bool {
        let Some(inbound) = self.active.as_mut().and_then(|a| a.inbound.as_mut()) else {
            return false;
        };
        let event = connection::next_event(inbound).await;
        self.dispatch(event);
        true
    }

    /// Runs the event loop until a [`Control::Shutdown`] arrives, or until
    /// the controls are gone and the session has ended.
    pub async fn run(&mut self, mut controls: mpsc::Receiver<Control>) {
        if self.active.is_none() {
            self.initialize().await;
        }
        let mut controls_open = true;

        loop {
            if !controls_open && !self.is_reading() {
                break;
            }
            tokio::select! {
                control = recv_control(&mut controls, controls_open) => match control {
                    Some(Control::Submit(text)) => {
                        if let Err(err) = self.submit(&text) {
                            tracing::warn!(%err, "command not sent");
                        }
                    }
                    Some(Control::Reconnect) => self.reconnect().await,
                    Some(Control::Shutdown) => break,
                    None => controls_open = false,
                },
                event = next_inbound(&mut self.active) => self.dispatch(event),
            }
        }

        self.shutdown();
    }

    /// Closes the current session, if any, without logging.
    pub fn shutdown(&mut self) {
        if let Some(active) = &mut self.active {
            active.session.close();
            active.inbound = None;
        }
    }

    fn is_reading(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.inbound.is_some())
    }

    fn dispatch(&mut self, event: InboundEvent) {
        let Some(active) = &mut self.active else {
            return;
        };
        match event {
            InboundEvent::Text(payload) => {
                // Malformed payloads are already traced by the session.
                let _ = active.session.on_message(&mut self.log, &payload);
            }
            InboundEvent::Closed { detail } => {
                tracing::debug!(session = %active.session.id(), detail = ?detail, "connection ended");
                active.session.on_close(&mut self.log);
                active.inbound = None;
            }
        }
    }

    async fn open_session(&mut self) -> ActiveSession {
        let id = SessionId::generate();
        let url = self.config.endpoint_url();
        tracing::info!(session = %id, %url, "opening session");

        match connection::connect(&self.config).await {
            Ok(conn) => {
                let mut session = ConsoleSession::new(id, conn.sink, self.config.render_mode);
                if let Err(err) = session.on_open(&mut self.log) {
                    tracing::warn!(session = %id, %err, "watch command not sent");
                }
                ActiveSession {
                    session,
                    inbound: Some(conn.inbound),
                }
            }
            Err(err) => {
                tracing::warn!(session = %id, %url, %err, "cannot connect");
                let mut session =
                    ConsoleSession::new(id, ChannelSink::disconnected(), self.config.render_mode);
                session.on_close(&mut self.log);
                ActiveSession {
                    session,
                    inbound: None,
                }
            }
        }
    }
}

/// Next control, or never once the control channel has closed.
async fn recv_control(controls: &mut mpsc::Receiver<Control>, open: bool) -> Option<Control> {
    if open {
        controls.recv().await
    } else {
        std::future::pending().await
    }
}

/// Next inbound event, or never while no connection is being read.
async fn next_inbound(active: &mut Option<ActiveSession>) -> InboundEvent {
    match active.as_mut().and_then(|a| a.inbound.as_mut()) {
        Some(inbound) => connection::next_event(inbound).await,
        None => std::future::pending().await,
    }
}
