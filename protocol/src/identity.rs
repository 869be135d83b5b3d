//! Server-assigned session identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the relay assigns to a connection.
///
/// Serialized as a bare integer, and as a decimal string when used as a
/// JSON object key (the `players` map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity a session was bound to, captured at most once.
///
/// The first non-null id wins. Later envelopes may carry a different id;
/// they never overwrite it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    id: Option<SessionId>,
}

impl SessionIdentity {
    /// Offers an id from an inbound envelope.
    ///
    /// Returns `true` only when this call bound the identity.
    pub fn bind(&mut self, candidate: Option<SessionId>) -> bool {
        match (self.id, candidate) {
            (None, Some(id)) => {
                self.id = Some(id);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn get(&self) -> Option<SessionId> {
        self.id
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_null_id_wins() {
        let mut identity = SessionIdentity::default();
        let offered = [None, Some(SessionId::new(7)), Some(SessionId::new(9))];
        let bound: Vec<bool> = offered.iter().map(|id| identity.bind(*id)).collect();

        assert_eq!(bound, vec![false, true, false]);
        assert_eq!(identity.get(), Some(SessionId::new(7)));
    }

    #[test]
    fn null_after_bind_keeps_id() {
        let mut identity = SessionIdentity::default();
        identity.bind(Some(SessionId::new(3)));
        identity.bind(None);
        assert_eq!(identity.get(), Some(SessionId::new(3)));
    }

    #[test]
    fn unbound_by_default() {
        let identity = SessionIdentity::default();
        assert!(!identity.is_bound());
        assert_eq!(identity.get(), None);
    }

    #[test]
    fn session_id_json_is_bare_integer() {
        assert_eq!(serde_json::to_string(&SessionId::new(42)).unwrap(), "42");
        let id: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(id.raw(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
