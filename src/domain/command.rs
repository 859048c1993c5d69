//! Outbound console commands.

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

/// Name of the command that subscribes a session to queue events.
pub const WATCH: &str = "watch";

/// A client-to-server instruction, encoded as `{"command": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command name as understood by the server.
    pub command: String,
}

impl Command {
    /// Creates a command with the given name.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The fixed `watch` command sent when a session opens.
    #[must_use]
    pub fn watch() -> Self {
        Self::new(WATCH)
    }

    /// Encodes the command as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, ConsoleError> {
        serde_json::to_string(self).map_err(ConsoleError::Encode)
    }
}
