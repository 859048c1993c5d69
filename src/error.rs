//! Console error types with stable numeric codes.
//!
//! [`ConsoleError`] is the central error type for the console client. Each
//! variant maps to a numeric code so diagnostics stay comparable across
//! releases.

use crate::domain::ConnectionState;

/// Client-side error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category            |
/// |-----------|---------------------|
/// | 1000–1999 | Configuration       |
/// | 2000–2999 | Session state       |
/// | 3000–3999 | Transport           |
/// | 4000–4999 | Payload             |
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The WebSocket handshake or a frame write failed.
    #[error("connection error: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// The WebSocket handshake did not finish in time.
    #[error("connection to {url} timed out after {secs} s")]
    ConnectTimeout {
        /// Endpoint that was being dialled.
        url: String,
        /// Configured timeout in seconds.
        secs: u64,
    },

    /// The session is not open and cannot carry frames.
    #[error("session is not open (state: {0})")]
    NotOpen(ConnectionState),

    /// A connection state change that the state machine does not allow.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the session was in.
        from: ConnectionState,
        /// State that was requested.
        to: ConnectionState,
    },

    /// An inbound payload was not valid JSON.
    #[error("malformed JSON payload: {0}")]
    Parse(#[source] serde_json::Error),

    /// An outbound command could not be encoded.
    #[error("cannot encode command: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ConsoleError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Config(_) => 1001,
            Self::NotOpen(_) => 2001,
            Self::InvalidTransition { .. } => 2002,
            Self::Connect(_) => 3001,
            Self::ConnectTimeout { .. } => 3002,
            Self::Parse(_) => 4001,
            Self::Encode(_) => 4002,
        }
    }

    /// Returns `true` for failures of the underlying connection, which the
    /// console reports the same way as a close.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::ConnectTimeout { .. })
    }
}
