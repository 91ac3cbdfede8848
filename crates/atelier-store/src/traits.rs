//! The [`PieceStore`] trait every backend adapter implements.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use atelier_types::{ArtPiece, ArtPiecePatch, NewArtPiece, PieceId};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Which storage substrate backs the collection.
///
/// Chosen once at start-up and never switched while running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Whole-collection snapshot in local storage.
    #[default]
    Local,
    /// One document per piece in a named collection.
    Document,
    /// Id list plus one value entry per piece.
    KeyValue,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Document => "document",
            Self::KeyValue => "key_value",
        })
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "document" => Ok(Self::Document),
            "key_value" | "key-value" | "kv" => Ok(Self::KeyValue),
            other => Err(StoreError::Environment(format!("unknown backend {other:?}"))),
        }
    }
}

/// CRUD contract shared by every backend adapter.
///
/// All implementations must satisfy these invariants:
/// - `create` assigns the id and both timestamps; `created_at == updated_at`.
/// - `update` never changes `id` or `created_at` and always moves
///   `updated_at` forward.
/// - `read_all` never fails; backend errors degrade to an empty or cached
///   sequence.
/// - `delete` is idempotent.
#[async_trait]
pub trait PieceStore: Send + Sync {
    /// Which substrate this adapter talks to.
    fn kind(&self) -> BackendKind;

    /// Persist a draft and return the full record.
    async fn create(&self, draft: NewArtPiece) -> StoreResult<ArtPiece>;

    /// Read one record. Returns `Ok(None)` if it does not exist.
    async fn read(&self, id: &PieceId) -> StoreResult<Option<ArtPiece>>;

    /// Read every record, newest first.
    async fn read_all(&self) -> Vec<ArtPiece>;

    /// Merge `patch` into an existing record.
    ///
    /// Returns [`StoreError::NotFound`] if `id` does not exist.
    async fn update(&self, id: &PieceId, patch: ArtPiecePatch) -> StoreResult<ArtPiece>;

    /// Delete a record. Deleting a missing id succeeds.
    async fn delete(&self, id: &PieceId) -> StoreResult<()>;

    /// Liveness probe used to decide whether to fall back to another backend.
    async fn is_available(&self) -> bool {
        true
    }

    /// Records a freshly created collection starts with before its first
    /// refresh.
    fn initial_snapshot(&self) -> Vec<ArtPiece> {
        Vec::new()
    }
}
