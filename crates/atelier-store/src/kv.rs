//! Key-value adapter: an id list plus one value entry per piece.
//!
//! Writes take two steps (value, then list) and are not atomic. Readers
//! tolerate ids whose value is gone; [`KeyValueAdapter::prune_orphans`]
//! repairs the list.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_types::{ArtPiece, ArtPiecePatch, NewArtPiece, PieceId};
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::clients::KvClient;
use crate::error::{StoreError, StoreResult};
use crate::traits::{BackendKind, PieceStore};

/// Stores pieces as JSON values keyed by `{prefix}{id}`.
pub struct KeyValueAdapter {
    client: Arc<dyn KvClient>,
    list_key: String,
    value_prefix: String,
}

impl KeyValueAdapter {
    pub fn new(
        client: Arc<dyn KvClient>,
        list_key: impl Into<String>,
        value_prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            list_key: list_key.into(),
            value_prefix: value_prefix.into(),
        }
    }

    fn value_key(&self, id: &str) -> String {
        format!("{}{}", self.value_prefix, id)
    }

    async fn fetch(&self, id: &str) -> StoreResult<Option<ArtPiece>> {
        match self.client.get(&self.value_key(id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Write the value entry, then prepend the id to the list.
    async fn link(&self, id: &PieceId, value: serde_json::Value) -> StoreResult<()> {
        self.client.set(&self.value_key(id.as_str()), value).await?;
        self.client.lpush(&self.list_key, id.as_str()).await
    }

    /// Delete the value entry, then remove the id from the list.
    async fn unlink(&self, id: &PieceId) -> StoreResult<()> {
        self.client.del(&self.value_key(id.as_str())).await?;
        self.client.lrem(&self.list_key, 1, id.as_str()).await?;
        Ok(())
    }

    /// Drop list entries whose value entry is missing. Returns how many ids
    /// were removed.
    pub async fn prune_orphans(&self) -> StoreResult<usize> {
        let ids = self.client.lrange(&self.list_key, 0, -1).await?;
        let mut pruned = 0;
        for id in ids {
            if self.client.get(&self.value_key(&id)).await?.is_none() {
                pruned += self.client.lrem(&self.list_key, 0, &id).await?;
            }
        }
        if pruned > 0 {
            info!(pruned, list = %self.list_key, "pruned orphaned artwork ids");
        }
        Ok(pruned)
    }
}

impl std::fmt::Debug for KeyValueAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueAdapter")
            .field("list_key", &self.list_key)
            .field("value_prefix", &self.value_prefix)
            .finish()
    }
}

#[async_trait]
impl PieceStore for KeyValueAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn create(&self, draft: NewArtPiece) -> StoreResult<ArtPiece> {
        draft.validate()?;
        let piece = ArtPiece::from_draft(PieceId::generate(), draft, Utc::now());
        let value = serde_json::to_value(&piece)?;

        self.link(&piece.id, value).await.map_err(|e| {
            error!(id = %piece.id, error = %e, "failed to add artwork to key-value store");
            StoreError::persistence("failed to save artwork", e)
        })?;

        debug!(id = %piece.id, "artwork stored");
        Ok(piece)
    }

    async fn read(&self, id: &PieceId) -> StoreResult<Option<ArtPiece>> {
        match self.fetch(id.as_str()).await {
            Ok(piece) => Ok(piece),
            Err(e) => {
                warn!(id = %id, error = %e, "failed to fetch artwork; treating as absent");
                Ok(None)
            }
        }
    }

    async fn read_all(&self) -> Vec<ArtPiece> {
        let ids = match self.client.lrange(&self.list_key, 0, -1).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "failed to list artwork ids; returning none");
                return Vec::new();
            }
        };
        if ids.is_empty() {
            return Vec::new();
        }

        let fetched = join_all(ids.iter().map(|id| self.fetch(id))).await;
        ids.iter()
            .zip(fetched)
            .filter_map(|(id, result)| match result {
                Ok(Some(piece)) => Some(piece),
                Ok(None) => {
                    debug!(id = %id, "id listed without a value entry; skipping");
                    None
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "skipping unreadable artwork");
                    None
                }
            })
            .collect()
    }

    async fn update(&self, id: &PieceId, patch: ArtPiecePatch) -> StoreResult<ArtPiece> {
        let mut piece = self
            .fetch(id.as_str())
            .await
            .map_err(|e| StoreError::persistence("failed to update artwork", e))?
            .ok_or_else(|| StoreError::not_found(id))?;

        piece.apply(patch);
        piece.validate()?;

        let value = serde_json::to_value(&piece)?;
        self.client
            .set(&self.value_key(id.as_str()), value)
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "failed to update artwork in key-value store");
                StoreError::persistence("failed to update artwork", e)
            })?;
        Ok(piece)
    }

    async fn delete(&self, id: &PieceId) -> StoreResult<()> {
        self.unlink(id).await.map_err(|e| {
            error!(id = %id, error = %e, "failed to delete artwork from key-value store");
            StoreError::persistence("failed to delete artwork", e)
        })
    }

    async fn is_available(&self) -> bool {
        match self.client.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "key-value store not available");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKvClient;
    use atelier_types::{Dimensions, PieceStatus, Unit};
    use serde_json::json;

    const LIST: &str = "art-pieces";
    const PREFIX: &str = "art-piece:";

    fn draft(title: &str) -> NewArtPiece {
        NewArtPiece::new(
            title,
            "B",
            2024,
            Dimensions::flat(10.0, 10.0, Unit::Cm),
            "Oil",
            "http://x/1.jpg",
        )
    }

    fn adapter() -> (Arc<MemoryKvClient>, KeyValueAdapter) {
        let client = Arc::new(MemoryKvClient::new());
        let adapter = KeyValueAdapter::new(client.clone(), LIST, PREFIX);
        (client, adapter)
    }

    #[tokio::test]
    async fn create_writes_value_and_prepends_id() {
        let (client, store) = adapter();
        let a = store.create(draft("a")).await.unwrap();
        let b = store.create(draft("b")).await.unwrap();

        let ids = client.lrange(LIST, 0, -1).await.unwrap();
        assert_eq!(ids, vec![b.id.to_string(), a.id.to_string()]);
        assert!(client.get(&format!("{PREFIX}{}", a.id)).await.unwrap().is_some());
        assert_eq!(a.created_at, a.updated_at);
    }

    #[tokio::test]
    async fn read_all_follows_list_order() {
        let (_, store) = adapter();
        let a = store.create(draft("a")).await.unwrap();
        let b = store.create(draft("b")).await.unwrap();
        let all = store.read_all().await;
        assert_eq!(all.iter().map(|p| &p.id).collect::<Vec<_>>(), vec![&b.id, &a.id]);
    }

    #[tokio::test]
    async fn read_all_skips_orphaned_ids() {
        let (client, store) = adapter();
        let keep = store.create(draft("keep")).await.unwrap();
        let lost = store.create(draft("lost")).await.unwrap();

        client.del(&format!("{PREFIX}{}", lost.id)).await.unwrap();

        let all = store.read_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep.id);
        // The list still references the orphan until pruned.
        assert_eq!(client.lrange(LIST, 0, -1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn read_all_skips_undecodable_values() {
        let (client, store) = adapter();
        store.create(draft("good")).await.unwrap();
        client.set(&format!("{PREFIX}junk"), json!({"title": 7})).await.unwrap();
        client.lpush(LIST, "junk").await.unwrap();
        assert_eq!(store.read_all().await.len(), 1);
    }

    #[tokio::test]
    async fn prune_orphans_repairs_list() {
        let (client, store) = adapter();
        store.create(draft("keep")).await.unwrap();
        let lost = store.create(draft("lost")).await.unwrap();
        client.del(&format!("{PREFIX}{}", lost.id)).await.unwrap();

        assert_eq!(store.prune_orphans().await.unwrap(), 1);
        assert_eq!(client.lrange(LIST, 0, -1).await.unwrap().len(), 1);
        assert_eq!(store.prune_orphans().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn read_missing_is_absent() {
        let (_, store) = adapter();
        assert!(store.read(&PieceId::new("ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_degrades_when_offline() {
        let (client, store) = adapter();
        let piece = store.create(draft("a")).await.unwrap();
        client.set_online(false);
        assert!(store.read(&piece.id).await.unwrap().is_none());
        assert!(store.read_all().await.is_empty());
    }

    #[tokio::test]
    async fn update_merges_and_refreshes() {
        let (_, store) = adapter();
        let piece = store.create(draft("a")).await.unwrap();
        let updated = store
            .update(&piece.id, ArtPiecePatch::status(PieceStatus::Exhibition))
            .await
            .unwrap();
        assert_eq!(updated.status, PieceStatus::Exhibition);
        assert_eq!(updated.created_at, piece.created_at);
        assert!(updated.updated_at > piece.updated_at);
        assert_eq!(store.read(&piece.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (_, store) = adapter();
        let err = store
            .update(&PieceId::new("ghost"), ArtPiecePatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_value_and_id_and_is_idempotent() {
        let (client, store) = adapter();
        let piece = store.create(draft("a")).await.unwrap();
        store.delete(&piece.id).await.unwrap();
        store.delete(&piece.id).await.unwrap();
        assert!(client.lrange(LIST, 0, -1).await.unwrap().is_empty());
        assert!(store.read(&piece.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn availability_follows_ping() {
        let (client, store) = adapter();
        assert!(store.is_available().await);
        client.set_online(false);
        assert!(!store.is_available().await);
        assert!(matches!(
            store.create(draft("a")).await,
            Err(StoreError::Persistence(_))
        ));
    }
}
