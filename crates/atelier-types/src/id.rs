use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an art piece.
///
/// Ids minted locally are UUID v7 strings so they sort by creation time.
/// Document backends assign their own ids, so any non-empty string is
/// accepted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(String);

impl PieceId {
    /// Generate a new time-ordered id (UUID v7).
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Wrap an id assigned by a backend.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short_id(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceId({})", self.short_id())
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PieceId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for PieceId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for PieceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = PieceId::generate();
        let b = PieceId::generate();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn generated_ids_sort_by_creation() {
        let first = PieceId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = PieceId::generate();
        assert!(first < second);
    }

    #[test]
    fn short_id_handles_short_backend_ids() {
        assert_eq!(PieceId::new("7").short_id(), "7");
        assert_eq!(PieceId::new("abcdefghijk").short_id(), "abcdefgh");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PieceId::new("doc-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"doc-42\"");
        let parsed: PieceId = serde_json::from_str("\"doc-42\"").unwrap();
        assert_eq!(parsed, id);
    }
}
