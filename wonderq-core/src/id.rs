//! Message ID generation

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes behind every message id
pub const MESSAGE_ID_BYTES: usize = 16;

/// Opaque message identifier.
///
/// The id is the only credential a consumer holds for its lease, so it is
/// drawn from the OS random source rather than a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a new random id (32 lowercase hex characters)
    pub fn new() -> Self {
        let mut bytes = [0u8; MESSAGE_ID_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap an id received from a client
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for MessageId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_message_id_generation() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), MESSAGE_ID_BYTES * 2);
        assert!(id1
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_ids_do_not_collide() {
        let ids: HashSet<MessageId> = (0..1000).map(|_| MessageId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_message_id_serializes_as_plain_string() {
        let id = MessageId::from_string("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc123""#);
        assert!(id == *"abc123");
    }
}
