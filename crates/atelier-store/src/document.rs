//! Document-store adapter: one document per piece in a named collection.

use std::sync::Arc;

use async_trait::async_trait;
use atelier_types::{ArtPiece, ArtPiecePatch, NewArtPiece, PieceId, RawTimestamp};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::clients::{server_timestamp, Document, DocumentClient};
use crate::error::{StoreError, StoreResult};
use crate::traits::{BackendKind, PieceStore};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Stores each piece as a document; timestamps come from the server clock.
pub struct DocumentStoreAdapter {
    client: Arc<dyn DocumentClient>,
    collection: String,
}

impl DocumentStoreAdapter {
    pub fn new(client: Arc<dyn DocumentClient>, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl std::fmt::Debug for DocumentStoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreAdapter")
            .field("collection", &self.collection)
            .finish()
    }
}

/// Serialize a draft or patch into document fields.
fn to_fields<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Decode a stored document, normalizing backend-native timestamps.
fn decode(id: &str, mut fields: Document) -> StoreResult<ArtPiece> {
    let created_at = RawTimestamp::normalize_value(fields.get(CREATED_AT));
    let updated_at = RawTimestamp::normalize_value(fields.get(UPDATED_AT));
    fields.insert("id".into(), Value::String(id.to_string()));
    fields.insert(CREATED_AT.into(), serde_json::to_value(created_at)?);
    fields.insert(UPDATED_AT.into(), serde_json::to_value(updated_at)?);
    Ok(serde_json::from_value(Value::Object(fields))?)
}

#[async_trait]
impl PieceStore for DocumentStoreAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn create(&self, draft: NewArtPiece) -> StoreResult<ArtPiece> {
        draft.validate()?;
        let mut fields = to_fields(&draft)?;
        fields.insert(CREATED_AT.into(), server_timestamp());
        fields.insert(UPDATED_AT.into(), server_timestamp());

        let id = self
            .client
            .add_document(&self.collection, fields)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to add artwork");
                StoreError::persistence("failed to add artwork", e)
            })?;
        debug!(id = %id, collection = %self.collection, "artwork document added");

        self.read(&PieceId::new(id.clone()))
            .await?
            .ok_or_else(|| StoreError::Persistence(format!("document {id} vanished after write")))
    }

    async fn read(&self, id: &PieceId) -> StoreResult<Option<ArtPiece>> {
        let doc = self
            .client
            .get_document(&self.collection, id.as_str())
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "failed to get artwork");
                StoreError::persistence("failed to get artwork", e)
            })?;
        doc.map(|fields| decode(id.as_str(), fields)).transpose()
    }

    async fn read_all(&self) -> Vec<ArtPiece> {
        let docs = match self.client.list_documents(&self.collection).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, collection = %self.collection, "listing artworks failed; returning none");
                return Vec::new();
            }
        };

        let mut pieces: Vec<ArtPiece> = docs
            .into_iter()
            .filter_map(|(id, fields)| match decode(&id, fields) {
                Ok(piece) => Some(piece),
                Err(e) => {
                    warn!(id = %id, error = %e, "skipping undecodable artwork document");
                    None
                }
            })
            .collect();
        // The backend's native ordering is not relied on.
        pieces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pieces
    }

    async fn update(&self, id: &PieceId, patch: ArtPiecePatch) -> StoreResult<ArtPiece> {
        let mut merged = self.read(id).await?.ok_or_else(|| StoreError::not_found(id))?;
        merged.apply(patch.clone());
        merged.validate()?;

        let mut fields = to_fields(&patch)?;
        fields.insert(UPDATED_AT.into(), server_timestamp());

        self.client
            .update_document(&self.collection, id.as_str(), fields)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => StoreError::not_found(id),
                other => {
                    error!(id = %id, error = %other, "failed to update artwork");
                    StoreError::persistence("failed to update artwork", other)
                }
            })?;

        self.read(id).await?.ok_or_else(|| StoreError::not_found(id))
    }

    async fn delete(&self, id: &PieceId) -> StoreResult<()> {
        self.client
            .delete_document(&self.collection, id.as_str())
            .await
            .map_err(|e| {
                error!(id = %id, error = %e, "failed to delete artwork");
                StoreError::persistence("failed to delete artwork", e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentClient;
    use atelier_types::{Dimensions, PieceStatus, Unit};
    use serde_json::json;

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

    fn adapter() -> (Arc<MemoryDocumentClient>, DocumentStoreAdapter) {
        let client = Arc::new(MemoryDocumentClient::new());
        let adapter = DocumentStoreAdapter::new(client.clone(), "artworks");
        (client, adapter)
    }

    #[tokio::test]
    async fn create_then_read() {
        let (_, store) = adapter();
        let created = store.create(draft("A")).await.unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, created.updated_at);

        let read = store.read(&created.id).await.unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft() {
        let (client, store) = adapter();
        let mut bad = draft("A");
        bad.artist.clear();
        assert!(matches!(store.create(bad).await, Err(StoreError::Invalid(_))));
        assert_eq!(client.len("artworks"), 0);
    }

    #[tokio::test]
    async fn read_all_is_newest_first() {
        let (_, store) = adapter();
        let first = store.create(draft("first")).await.unwrap();
        let second = store.create(draft("second")).await.unwrap();
        let all = store.read_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[tokio::test]
    async fn read_all_degrades_to_empty_when_offline() {
        let (client, store) = adapter();
        store.create(draft("A")).await.unwrap();
        client.set_online(false);
        assert!(store.read_all().await.is_empty());
    }

    #[tokio::test]
    async fn read_fails_when_offline() {
        let (client, store) = adapter();
        let created = store.create(draft("A")).await.unwrap();
        client.set_online(false);
        assert!(matches!(
            store.read(&created.id).await,
            Err(StoreError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn create_fails_when_offline() {
        let (client, store) = adapter();
        client.set_online(false);
        assert!(matches!(
            store.create(draft("A")).await,
            Err(StoreError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_identity_and_advances_timestamp() {
        let (_, store) = adapter();
        let created = store.create(draft("A")).await.unwrap();
        let updated = store
            .update(&created.id, ArtPiecePatch::status(PieceStatus::Sold).with_price(100.0, None))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.status, PieceStatus::Sold);
        assert_eq!(updated.price, Some(100.0));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (_, store) = adapter();
        let err = store
            .update(&PieceId::new("ghost"), ArtPiecePatch::status(PieceStatus::Damaged))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_rejects_invalid_merge() {
        let (_, store) = adapter();
        let created = store.create(draft("A")).await.unwrap();
        let patch = ArtPiecePatch {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            store.update(&created.id, patch).await,
            Err(StoreError::Invalid(_))
        ));
        assert_eq!(store.read(&created.id).await.unwrap().unwrap().price, None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, store) = adapter();
        let created = store.create(draft("A")).await.unwrap();
        store.delete(&created.id).await.unwrap();
        store.delete(&created.id).await.unwrap();
        assert!(store.read(&created.id).await.unwrap().is_none());
        assert!(store.read_all().await.is_empty());
    }

    #[tokio::test]
    async fn missing_timestamps_normalize_to_now() {
        let (client, store) = adapter();
        let mut fields = to_fields(&draft("legacy")).unwrap();
        fields.insert(CREATED_AT.into(), json!(null));
        let id = client.add_document("artworks", fields).await.unwrap();

        let piece = store.read(&PieceId::new(id)).await.unwrap().unwrap();
        let age = chrono::Utc::now() - piece.created_at;
        assert!(age < chrono::Duration::seconds(5));
    }

    #[tokio::test]
    async fn iso_timestamps_are_accepted() {
        let (client, store) = adapter();
        let mut fields = to_fields(&draft("imported")).unwrap();
        fields.insert(CREATED_AT.into(), json!("2023-01-15T10:00:00Z"));
        fields.insert(UPDATED_AT.into(), json!(1_673_776_800_000_i64));
        let id = client.add_document("artworks", fields).await.unwrap();

        let piece = store.read(&PieceId::new(id)).await.unwrap().unwrap();
        assert_eq!(piece.created_at, piece.updated_at);
        assert_eq!(piece.created_at.to_rfc3339(), "2023-01-15T10:00:00+00:00");
    }
}
