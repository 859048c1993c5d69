//! Domain layer: commands, session identity, connection state, rendering
//! and the console log.
//!
//! Nothing in here touches the network; the transport lives in
//! [`crate::ws`].

pub mod command;
pub mod log;
pub mod render;
pub mod session_id;
pub mod state;

pub use command::{Command, WATCH};
pub use log::{ConsoleLog, LINE_BREAK, LogEntry};
pub use render::{RenderMode, parse_message, render_message};
pub use session_id::SessionId;
pub use state::ConnectionState;
