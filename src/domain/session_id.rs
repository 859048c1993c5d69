//! Tag for one console session, used to tell a session from the one a
//! reconnect replaced.

use std::fmt;

use uuid::Uuid;

/// Identifies one connection attempt of the console.
///
/// Every `initialize` and `reconnect` draws a fresh one, so trace lines of a
/// retired session never mix with those of its replacement. `Display` prints
/// the first eight hex digits, which is what the trace fields carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Draws a random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Full UUID behind the short form.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        f.write_str(simple.get(..8).unwrap_or(&simple))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_session_gets_its_own_id() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn display_is_the_uuid_prefix() {
        let id = SessionId::generate();
        let shown = id.to_string();
        assert_eq!(shown.len(), 8);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(id.as_uuid().simple().to_string().starts_with(&shown));
    }
}
