//! Transport-facing seams of a console session.
//!
//! A transport drives a [`ConnectionHandler`] with the three connection
//! events and gives it a [`CommandSink`] for outbound frames. The session
//! logic never sees the socket itself.

use crate::domain::ConsoleLog;
use crate::error::ConsoleError;

/// Outbound half of a connection.
pub trait CommandSink {
    /// Queues a text frame for transmission. Never blocks.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::NotOpen`] if the connection is already gone.
    fn send_text(&mut self, text: String) -> Result<(), ConsoleError>;

    /// Starts closing the connection. Teardown completes in the background.
    fn close(&mut self);
}

/// Receiver of the connection events of one session.
pub trait ConnectionHandler {
    /// The handshake finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial command cannot be transmitted.
    fn on_open(&mut self, log: &mut ConsoleLog) -> Result<(), ConsoleError>;

    /// A text frame arrived.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Parse`] if `payload` is not valid JSON; the
    /// session stays usable.
    fn on_message(&mut self, log: &mut ConsoleLog, payload: &str) -> Result<(), ConsoleError>;

    /// The connection closed, cleanly or not.
    fn on_close(&mut self, log: &mut ConsoleLog);
}
