//! Local-persistence adapter: the whole collection as one serialized snapshot.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use atelier_types::{ArtPiece, ArtPiecePatch, NewArtPiece, PieceId};
use chrono::Utc;
use tracing::{debug, warn};

use crate::clients::LocalStorage;
use crate::error::{poisoned, StoreError, StoreResult};
use crate::seed::seed_pieces;
use crate::traits::{BackendKind, PieceStore};

/// Keeps every piece in memory and rewrites the full snapshot on each
/// mutation.
///
/// Without a storage medium ([`LocalAdapter::detached`]) the adapter still
/// works, but nothing outlives the process.
pub struct LocalAdapter {
    storage: Option<Arc<dyn LocalStorage>>,
    key: String,
    pieces: RwLock<Vec<ArtPiece>>,
}

impl LocalAdapter {
    /// Open the snapshot stored under `key`, falling back to the seed
    /// dataset when it is missing or unreadable.
    pub fn open(storage: Arc<dyn LocalStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let pieces = load_snapshot(storage.as_ref(), &key);
        Self {
            storage: Some(storage),
            key,
            pieces: RwLock::new(pieces),
        }
    }

    /// An adapter with no storage medium, starting from the seed dataset.
    pub fn detached() -> Self {
        Self {
            storage: None,
            key: String::new(),
            pieces: RwLock::new(seed_pieces()),
        }
    }

    /// Returns `true` if mutations are written to a storage medium.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    fn snapshot(&self) -> StoreResult<Vec<ArtPiece>> {
        Ok(self.pieces.read().map_err(poisoned)?.clone())
    }

    /// Apply `mutate` to a copy of the snapshot, persist the copy, then
    /// swap it in. Memory is left untouched if persisting fails.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Vec<ArtPiece>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut guard = self.pieces.write().map_err(poisoned)?;
        let mut next = guard.clone();
        let out = mutate(&mut next)?;

        if let Some(storage) = &self.storage {
            let serialized = serde_json::to_string(&next)?;
            storage.set_item(&self.key, &serialized).map_err(|e| {
                warn!(key = %self.key, error = %e, "failed to write local snapshot");
                StoreError::persistence("failed to write local snapshot", e)
            })?;
        }

        *guard = next;
        Ok(out)
    }
}

impl std::fmt::Debug for LocalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.pieces.read().map(|p| p.len()).unwrap_or(0);
        f.debug_struct("LocalAdapter")
            .field("key", &self.key)
            .field("persistent", &self.is_persistent())
            .field("piece_count", &count)
            .finish()
    }
}

fn load_snapshot(storage: &dyn LocalStorage, key: &str) -> Vec<ArtPiece> {
    match storage.get_item(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<ArtPiece>>(&raw) {
            Ok(pieces) => {
                debug!(key, count = pieces.len(), "local snapshot loaded");
                pieces
            }
            Err(e) => {
                warn!(key, error = %e, "local snapshot unreadable; using seed data");
                seed_pieces()
            }
        },
        Ok(None) => {
            debug!(key, "no local snapshot; using seed data");
            seed_pieces()
        }
        Err(e) => {
            warn!(key, error = %e, "local storage unavailable; using seed data");
            seed_pieces()
        }
    }
}

#[async_trait]
impl PieceStore for LocalAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn create(&self, draft: NewArtPiece) -> StoreResult<ArtPiece> {
        draft.validate()?;
        let piece = ArtPiece::from_draft(PieceId::generate(), draft, Utc::now());
        self.commit(|pieces| {
            pieces.insert(0, piece.clone());
            Ok(())
        })?;
        debug!(id = %piece.id, "artwork added to local snapshot");
        Ok(piece)
    }

    async fn read(&self, id: &PieceId) -> StoreResult<Option<ArtPiece>> {
        let pieces = self.pieces.read().map_err(poisoned)?;
        Ok(pieces.iter().find(|p| &p.id == id).cloned())
    }

    async fn read_all(&self) -> Vec<ArtPiece> {
        match self.snapshot() {
            Ok(pieces) => pieces,
            Err(e) => {
                warn!(error = %e, "local snapshot unreadable");
                Vec::new()
            }
        }
    }

    async fn update(&self, id: &PieceId, patch: ArtPiecePatch) -> StoreResult<ArtPiece> {
        self.commit(|pieces| {
            let slot = pieces
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| StoreError::not_found(id))?;
            let mut merged = slot.clone();
            merged.apply(patch);
            merged.validate()?;
            *slot = merged.clone();
            Ok(merged)
        })
    }

    async fn delete(&self, id: &PieceId) -> StoreResult<()> {
        if self.read(id).await?.is_none() {
            return Ok(());
        }
        self.commit(|pieces| {
            pieces.retain(|p| &p.id != id);
            Ok(())
        })
    }

    fn initial_snapshot(&self) -> Vec<ArtPiece> {
        self.snapshot().unwrap_or_default()
    }
}
