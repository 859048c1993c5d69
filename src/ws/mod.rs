//! WebSocket layer: session state machine, transport and client loop.
//!
//! The console connects to `ws://<host>:<port>/cui`, sends `watch` once the
//! connection opens and renders everything the server pushes afterwards.

pub mod client;
pub mod connection;
pub mod handler;
pub mod session;

pub use client::{ConsoleClient, Control, spawn_control_reader};
pub use handler::{CommandSink, ConnectionHandler};
pub use session::{ConsoleSession, SessionStats};
