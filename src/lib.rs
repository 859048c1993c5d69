//! # cui-console
//!
//! WebSocket console for a job queue server.
//!
//! The client opens one connection to the server's `/cui` endpoint, sends
//! the `watch` command when it opens, and appends every JSON message the
//! server pushes to an append-only console log. Reconnecting is manual: the
//! user retires the session and a fresh one takes its place.
//!
//! ## Architecture
//!
//! ```text
//! Controls (stdin)
//!     │
//!     ├── ConsoleClient (ws/client)      single task, owns everything below
//!     │
//!     ├── ConsoleSession (ws/session)    Connecting → Open → Closed
//!     ├── ConsoleLog (domain/log)        HTML fragments + scroll position
//!     │
//!     └── tokio-tungstenite transport (ws/connection)
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod ws;
