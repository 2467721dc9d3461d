//! Record types shared by the store and the HTTP layer

use serde::{Deserialize, Serialize};

/// Document identifier using ULID, so ids sort by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(ulid::Ulid);

impl DocumentId {
    /// Generate a new id with the current timestamp
    pub fn new() -> Self {
        DocumentId(ulid::Ulid::new())
    }

    /// Parse the canonical 26 character form
    pub fn parse(s: &str) -> crate::Result<Self> {
        ulid::Ulid::from_string(s)
            .map(DocumentId)
            .map_err(|e| crate::SessionGateError::Internal(format!("invalid document id '{}': {}", s, e)))
    }

    /// Get the underlying ULID
    pub fn as_ulid(&self) -> ulid::Ulid {
        self.0
    }

    /// Milliseconds since the epoch at which the id was minted
    pub fn timestamp(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored entry of the `names` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub id: DocumentId,
    pub name: String,
}

impl NameRecord {
    /// Create a record with a fresh id, validating the name
    pub fn new(name: &str) -> crate::Result<Self> {
        if name.trim().is_empty() {
            return Err(crate::SessionGateError::InvalidName("empty name".to_string()));
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(crate::SessionGateError::InvalidName(
                format!("control characters not allowed in '{}'", name.escape_debug())
            ));
        }

        Ok(NameRecord {
            id: DocumentId::new(),
            name: name.to_string(),
        })
    }
}

/// Seed data written by `sessiongate-server seed`
pub const DEFAULT_NAMES: [&str; 3] = ["Andrew Mead", "Bob", "Charlie"];
