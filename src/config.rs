//! Console configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Host and port play the role of the
//! page location the console endpoint is resolved against.

use std::time::Duration;

use crate::domain::RenderMode;
use crate::error::ConsoleError;

/// Default console endpoint path on the server.
pub const DEFAULT_CONSOLE_PATH: &str = "/cui";

/// Default maximum inbound frame size (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Top-level console configuration.
///
/// Loaded once at startup via [`ConsoleConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Server host name or IP address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Endpoint path, always starting with `/`.
    pub path: String,

    /// Timeout in seconds for the WebSocket handshake.
    pub connect_timeout_secs: u64,

    /// Largest inbound frame accepted by the transport.
    pub max_payload_bytes: usize,

    /// How inbound messages are rendered into the log.
    pub render_mode: RenderMode,

    /// Capacity of the log observer broadcast channel.
    pub log_capacity: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9090,
            path: DEFAULT_CONSOLE_PATH.to_string(),
            connect_timeout_secs: 10,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            render_mode: RenderMode::Raw,
            log_capacity: 1024,
        }
    }
}

impl ConsoleConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Config`] if `CONSOLE_PORT` or
    /// `CONSOLE_RENDER_MODE` is set to an unparseable value, or if the
    /// resulting host is empty.
    pub fn from_env() -> Result<Self, ConsoleError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let host = std::env::var("CONSOLE_HOST").unwrap_or(defaults.host);

        let port = match std::env::var("CONSOLE_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConsoleError::Config(format!("invalid CONSOLE_PORT: {raw}")))?,
            Err(_) => defaults.port,
        };

        let path = std::env::var("CONSOLE_PATH").unwrap_or(defaults.path);

        let render_mode = match std::env::var("CONSOLE_RENDER_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.render_mode,
        };

        let config = Self {
            host,
            port,
            path: normalize_path(&path),
            connect_timeout_secs: parse_env(
                "CONSOLE_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            max_payload_bytes: parse_env("CONSOLE_MAX_PAYLOAD_BYTES", defaults.max_payload_bytes),
            render_mode,
            log_capacity: parse_env("CONSOLE_LOG_CAPACITY", defaults.log_capacity).max(1),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that the environment parser cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Config`] when the host is blank or contains
    /// characters that would break the endpoint URL.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.host.trim().is_empty() {
            return Err(ConsoleError::Config("CONSOLE_HOST must not be empty".into()));
        }
        if self.host.contains(['/', ' ', '?', '#']) {
            return Err(ConsoleError::Config(format!(
                "CONSOLE_HOST contains invalid characters: {}",
                self.host
            )));
        }
        Ok(())
    }

    /// Builds the `ws://` endpoint the console connects to.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }

    /// Handshake timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Ensures the endpoint path starts with exactly one `/`.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches('/');
    format!("/{trimmed}")
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_targets_cui() {
        let config = ConsoleConfig::default();
        assert_eq!(config.endpoint_url(), "ws://127.0.0.1:9090/cui");
    }

    #[test]
    fn endpoint_uses_host_and_port() {
        let config = ConsoleConfig {
            host: "queue.local".to_string(),
            port: 9091,
            ..ConsoleConfig::default()
        };
        assert_eq!(config.endpoint_url(), "ws://queue.local:9091/cui");
    }

    #[test]
    fn normalize_path_adds_single_slash() {
        assert_eq!(normalize_path("cui"), "/cui");
        assert_eq!(normalize_path("//cui"), "/cui");
        assert_eq!(normalize_path(" /cui "), "/cui");
    }

    #[test]
    fn blank_host_is_rejected() {
        let config = ConsoleConfig {
            host: "  ".to_string(),
            ..ConsoleConfig::default()
        };
        let Err(err) = config.validate() else {
            panic!("blank host accepted");
        };
        assert!(matches!(err, ConsoleError::Config(_)));
    }

    #[test]
    fn host_with_path_is_rejected() {
        let config = ConsoleConfig {
            host: "example.com/evil".to_string(),
            ..ConsoleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn connect_timeout_is_seconds() {
        let config = ConsoleConfig {
            connect_timeout_secs: 3,
            ..ConsoleConfig::default()
        };
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    }
}
