//! Append-only console log.
//!
//! [`ConsoleLog`] holds the rendered HTML fragments shown to the user, the
//! scroll position of the view, and the input line. Every appended entry is
//! also published on a [`tokio::sync::broadcast`] channel so renderers can
//! follow the log as it grows.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Line terminator appended to every fragment.
pub const LINE_BREAK: &str = "<br/>";

/// A single rendered fragment in the console log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// HTML fragment, including its trailing `<br/>`.
    pub html: String,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Returns the fragment with its trailing line break removed, for
    /// plain-text displays.
    #[must_use]
    pub fn text(&self) -> &str {
        self.html.strip_suffix(LINE_BREAK).unwrap_or(&self.html)
    }
}

/// Ordered, unbounded, append-only console log.
///
/// The view height is the number of entries. Appending scrolls the view to
/// the bottom (`scroll_top == scroll_height`).
#[derive(Debug)]
pub struct ConsoleLog {
    entries: Vec<LogEntry>,
    scroll_top: usize,
    input: String,
    observers: broadcast::Sender<LogEntry>,
}

impl ConsoleLog {
    /// Creates an empty log whose observer channel buffers `capacity`
    /// entries for slow renderers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (observers, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Vec::new(),
            scroll_top: 0,
            input: String::new(),
            observers,
        }
    }

    /// Appends `message` verbatim as an HTML fragment and scrolls to the
    /// bottom.
    pub fn append(&mut self, message: impl Into<String>) {
        let entry = LogEntry {
            html: message.into(),
            timestamp: Utc::now(),
        };
        // No observers is fine; the log itself is the record.
        let _ = self.observers.send(entry.clone());
        self.entries.push(entry);
        self.scroll_to_bottom();
    }

    /// Appends `line` followed by `<br/>`.
    pub fn append_line(&mut self, line: &str) {
        self.append(format!("{line}{LINE_BREAK}"));
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been logged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Concatenation of every fragment, as the view would hold it.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.entries.iter().map(|e| e.html.as_str()).collect()
    }

    /// Current scroll position.
    #[must_use]
    pub const fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    /// Maximum scroll position.
    #[must_use]
    pub fn scroll_height(&self) -> usize {
        self.entries.len()
    }

    /// Moves the view, clamped to the scrollable range.
    pub fn scroll_to(&mut self, position: usize) {
        self.scroll_top = position.min(self.scroll_height());
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.scroll_height();
    }

    /// The pending input line.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replaces the pending input line.
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Empties the pending input line. Log entries are left alone.
    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Creates a receiver for all entries appended from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.observers.subscribe()
    }
}

impl Default for ConsoleLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut log = ConsoleLog::default();
        log.append_line("connected");
        log.append_line(r#"{"status":"ok"}"#);
        assert_eq!(log.to_html(), r#"connected<br/>{"status":"ok"}<br/>"#);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn append_scrolls_to_bottom() {
        let mut log = ConsoleLog::default();
        log.append_line("a");
        log.append_line("b");
        log.scroll_to(0);
        assert_eq!(log.scroll_top(), 0);
        log.append_line("c");
        assert_eq!(log.scroll_top(), log.scroll_height());
        assert_eq!(log.scroll_top(), 3);
    }

    #[test]
    fn scroll_is_clamped() {
        let mut log = ConsoleLog::default();
        log.append_line("only");
        log.scroll_to(99);
        assert_eq!(log.scroll_top(), 1);
    }

    #[test]
    fn clear_input_keeps_entries() {
        let mut log = ConsoleLog::default();
        log.append_line("connected");
        log.set_input("list");
        assert_eq!(log.input(), "list");
        log.clear_input();
        assert_eq!(log.input(), "");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn entry_text_strips_line_break() {
        let mut log = ConsoleLog::default();
        log.append_line("connection closed");
        let Some(entry) = log.entries().first() else {
            panic!("entry missing");
        };
        assert_eq!(entry.text(), "connection closed");
        assert_eq!(entry.html, "connection closed<br/>");
    }

    #[tokio::test]
    async fn observers_receive_new_entries() {
        let mut log = ConsoleLog::new(8);
        log.append_line("before");
        let mut rx = log.subscribe();
        log.append_line("after");

        let Ok(entry) = rx.recv().await else {
            panic!("observer missed entry");
        };
        assert_eq!(entry.html, "after<br/>");
    }
}
