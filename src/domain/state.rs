//! Per-session connection state machine.

use std::fmt;

use serde::Serialize;

use crate::error::ConsoleError;

/// Lifecycle of a single console session.
///
/// `Connecting → Open → Closed`, with `Connecting → Closed` for a failed
/// handshake. `Closed` is terminal; only a new session leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Handshake in progress.
    Connecting,
    /// Handshake done; commands flow and messages are rendered.
    Open,
    /// Closed by either side or by a transport failure.
    Closed,
}

impl ConnectionState {
    /// Returns the next state, or an error if the transition is not allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::InvalidTransition`] for anything other than
    /// `Connecting → Open`, `Connecting → Closed` and `Open → Closed`.
    pub fn transition(self, to: Self) -> Result<Self, ConsoleError> {
        match (self, to) {
            (Self::Connecting, Self::Open)
            | (Self::Connecting, Self::Closed)
            | (Self::Open, Self::Closed) => Ok(to),
            (from, to) => Err(ConsoleError::InvalidTransition { from, to }),
        }
    }

    /// Returns `true` once the session can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_are_allowed() {
        assert_eq!(
            ConnectionState::Connecting
                .transition(ConnectionState::Open)
                .ok(),
            Some(ConnectionState::Open)
        );
        assert_eq!(
            ConnectionState::Open
                .transition(ConnectionState::Closed)
                .ok(),
            Some(ConnectionState::Closed)
        );
        assert_eq!(
            ConnectionState::Connecting
                .transition(ConnectionState::Closed)
                .ok(),
            Some(ConnectionState::Closed)
        );
    }

    #[test]
    fn closed_is_terminal() {
        assert!(ConnectionState::Closed.is_terminal());
        tokio_test::assert_err!(ConnectionState::Closed.transition(ConnectionState::Open));
        tokio_test::assert_err!(ConnectionState::Closed.transition(ConnectionState::Connecting));
        tokio_test::assert_err!(ConnectionState::Closed.transition(ConnectionState::Closed));
    }

    #[test]
    fn open_cannot_reopen() {
        assert!(ConnectionState::Open.transition(ConnectionState::Open).is_err());
        assert!(
            ConnectionState::Open
                .transition(ConnectionState::Connecting)
                .is_err()
        );
    }
}
