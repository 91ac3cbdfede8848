use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use atelier_media::{BestEffort, ImageStore};
use atelier_store::{PieceStore, StoreError};
use atelier_types::{ArtPiece, ArtPiecePatch, NewArtPiece, PieceId};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{CollectionError, CollectionResult};
use crate::observer::{Observer, Observers, SubscriptionId};

/// Lifecycle of the in-memory snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum CollectionState {
    /// Not yet loaded from the backend.
    Empty,
    Loaded,
    /// The last mutation failed with this message.
    Error(String),
}

struct Snapshot {
    pieces: Vec<ArtPiece>,
    state: CollectionState,
}

/// An observable cache of every art piece, backed by one [`PieceStore`].
///
/// Mutators call the backend first and only patch the snapshot once the
/// backend has accepted the change. On failure the snapshot is left as it
/// was and the error is returned. Observers run synchronously after each
/// change, outside the internal locks, before the mutator returns.
pub struct PieceCollection {
    backend: Arc<dyn PieceStore>,
    images: Option<Arc<dyn ImageStore>>,
    inner: RwLock<Snapshot>,
    observers: Observers,
}

impl PieceCollection {
    /// Create a collection seeded with the backend's initial snapshot.
    pub fn new(backend: Arc<dyn PieceStore>, images: Option<Arc<dyn ImageStore>>) -> Self {
        let pieces = backend.initial_snapshot();
        Self {
            backend,
            images,
            inner: RwLock::new(Snapshot {
                pieces,
                state: CollectionState::Empty,
            }),
            observers: Observers::default(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn PieceStore> {
        &self.backend
    }

    /// Register `observer`. It is called right away with the current
    /// snapshot, then after every change.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&[ArtPiece]) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let id = self.observers.insert(observer.clone());
        let pieces = self.snapshot();
        observer(&pieces);
        debug!(subscription = %id, "observer subscribed");
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Replace the snapshot with everything the backend holds.
    pub async fn refresh(&self) -> usize {
        let pieces = self.backend.read_all().await;
        let count = pieces.len();
        let snapshot = {
            let mut inner = self.write();
            inner.pieces = pieces;
            inner.state = CollectionState::Loaded;
            inner.pieces.clone()
        };
        info!(count, backend = %self.backend.kind(), "collection refreshed");
        self.notify(&snapshot);
        count
    }

    /// Create a piece and put it at the front of the snapshot.
    pub async fn add(&self, draft: NewArtPiece) -> CollectionResult<ArtPiece> {
        let piece = self
            .backend
            .create(draft)
            .await
            .map_err(|e| self.fail("add", e))?;
        self.patch(|pieces| pieces.insert(0, piece.clone()));
        debug!(id = %piece.id, "artwork added");
        Ok(piece)
    }

    /// Update a piece and replace it where it sits in the snapshot. A piece
    /// missing from the snapshot is not inserted.
    pub async fn update_piece(
        &self,
        id: &PieceId,
        patch: ArtPiecePatch,
    ) -> CollectionResult<ArtPiece> {
        let piece = self
            .backend
            .update(id, patch)
            .await
            .map_err(|e| self.fail("update", e))?;
        self.patch(|pieces| {
            if let Some(slot) = pieces.iter_mut().find(|p| p.id == piece.id) {
                *slot = piece.clone();
            }
        });
        debug!(id = %id, "artwork updated");
        Ok(piece)
    }

    /// Delete a piece, then its image if it has one.
    ///
    /// A failed image deletion is logged and does not fail the removal.
    pub async fn remove(&self, id: &PieceId) -> CollectionResult<()> {
        let existing = self
            .backend
            .read(id)
            .await
            .map_err(|e| self.fail("remove", e))?;
        self.backend
            .delete(id)
            .await
            .map_err(|e| self.fail("remove", e))?;

        let reference = existing.and_then(|piece| piece.image_path);
        if let (Some(images), Some(reference)) = (&self.images, reference) {
            if let BestEffort::Failed(reason) = images.discard(&reference).await {
                debug!(id = %id, reference = %reference, reason = %reason, "image left behind");
            }
        }

        self.patch(|pieces| pieces.retain(|p| &p.id != id));
        debug!(id = %id, "artwork removed");
        Ok(())
    }

    /// Fetch a piece straight from the backend. Backend errors are logged
    /// and reported as `None`.
    pub async fn get_by_id(&self, id: &PieceId) -> Option<ArtPiece> {
        match self.backend.read(id).await {
            Ok(piece) => piece,
            Err(e) => {
                warn!(id = %id, error = %e, "failed to get artwork");
                None
            }
        }
    }

    /// Look a piece up in the snapshot.
    pub fn find(&self, id: &PieceId) -> CollectionResult<ArtPiece> {
        self.read()
            .pieces
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CollectionError::NotFound { id: id.clone() })
    }

    pub fn snapshot(&self) -> Vec<ArtPiece> {
        self.read().pieces.clone()
    }

    pub fn state(&self) -> CollectionState {
        self.read().state.clone()
    }

    pub fn len(&self) -> usize {
        self.read().pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().pieces.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` to the current snapshot, then notify. A successful
    /// change clears an earlier error state.
    fn patch(&self, change: impl FnOnce(&mut Vec<ArtPiece>)) {
        let snapshot = {
            let mut inner = self.write();
            change(&mut inner.pieces);
            if matches!(inner.state, CollectionState::Error(_)) {
                inner.state = CollectionState::Loaded;
            }
            inner.pieces.clone()
        };
        self.notify(&snapshot);
    }

    fn fail(&self, operation: &'static str, e: StoreError) -> CollectionError {
        error!(operation, error = %e, "artwork {operation} failed");
        self.write().state = CollectionState::Error(e.to_string());
        e.into()
    }

    fn notify(&self, pieces: &[ArtPiece]) {
        for observer in self.observers.current() {
            observer(pieces);
        }
    }
}

impl std::fmt::Debug for PieceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PieceCollection")
            .field("backend", &self.backend.kind())
            .field("has_images", &self.images.is_some())
            .field("state", &self.state())
            .field("len", &self.len())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_media::{BucketImageStore, MemoryBlobClient};
    use atelier_store::{
        BackendFactory, BackendKind, Collaborators, DocumentStoreAdapter, LocalAdapter,
        MemoryDocumentClient, MemoryLocalStorage, StoreConfig,
    };
    use atelier_types::{Dimensions, PieceStatus, Unit};
    use bytes::Bytes;
    use std::sync::Mutex;

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

    fn document_collection() -> (Arc<MemoryDocumentClient>, PieceCollection) {
        let client = Arc::new(MemoryDocumentClient::new());
        let backend = Arc::new(DocumentStoreAdapter::new(client.clone(), "artworks"));
        (client, PieceCollection::new(backend, None))
    }

    /// Records the length of every snapshot an observer sees.
    fn recorder(collection: &PieceCollection) -> Arc<Mutex<Vec<usize>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        collection.subscribe(move |pieces| sink.lock().unwrap().push(pieces.len()));
        seen
    }

    // ---- Test 1: add, update, remove against every backend ----

    #[tokio::test]
    async fn scenario_runs_on_every_backend() {
        let clients = Collaborators::in_memory();
        for kind in [BackendKind::Document, BackendKind::KeyValue, BackendKind::Local] {
            let config = StoreConfig {
                backend: kind,
                ..Default::default()
            };
            let backend = BackendFactory::open(&config, &clients).await.unwrap();
            let collection = PieceCollection::new(backend, None);
            collection.refresh().await;

            let a = collection.add(draft("A")).await.unwrap();
            assert!(!a.id.is_empty(), "{kind}");
            assert_eq!(a.status, PieceStatus::Available);
            assert_eq!(a.created_at, a.updated_at);

            let b = collection.add(draft("B")).await.unwrap();
            assert_eq!(collection.snapshot()[0].id, b.id);

            let sold = collection
                .update_piece(&a.id, ArtPiecePatch::status(PieceStatus::Sold).with_price(100.0, None))
                .await
                .unwrap();
            assert_eq!(sold.status, PieceStatus::Sold);
            assert_eq!(sold.price, Some(100.0));
            assert!(sold.updated_at > sold.created_at, "{kind}");
            assert_eq!(collection.find(&a.id).unwrap(), sold);

            collection.remove(&a.id).await.unwrap();
            assert!(collection.get_by_id(&a.id).await.is_none());
            assert!(collection.backend().read_all().await.iter().all(|p| p.id != a.id));
            assert!(collection.find(&a.id).unwrap_err().is_not_found());
            assert_eq!(collection.state(), CollectionState::Loaded);
        }
    }

    // ---- Test 2: observers ----

    #[tokio::test]
    async fn observer_sees_initial_and_every_change() {
        let (_, collection) = document_collection();
        let seen = recorder(&collection);

        collection.refresh().await;
        let piece = collection.add(draft("A")).await.unwrap();
        collection
            .update_piece(&piece.id, ArtPiecePatch::status(PieceStatus::OnHold))
            .await
            .unwrap();
        collection.remove(&piece.id).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 0, 1, 1, 0]);
    }

    #[tokio::test]
    async fn unsubscribed_observer_is_silent() {
        let (_, collection) = document_collection();
        let seen = Arc::new(Mutex::new(0));
        let sink = seen.clone();
        let id = collection.subscribe(move |_| *sink.lock().unwrap() += 1);

        assert!(collection.unsubscribe(id));
        assert!(!collection.unsubscribe(id));
        collection.add(draft("A")).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), 1);
        assert_eq!(collection.observer_count(), 0);
    }

    #[tokio::test]
    async fn observer_may_read_collection() {
        let (_, collection) = document_collection();
        let collection = Arc::new(collection);
        let weak = Arc::downgrade(&collection);
        let lens = Arc::new(Mutex::new(Vec::new()));
        let sink = lens.clone();
        collection.subscribe(move |pieces| {
            // Locks are released before observers run.
            if let Some(c) = weak.upgrade() {
                assert_eq!(c.len(), pieces.len());
            }
            sink.lock().unwrap().push(pieces.len());
        });
        collection.add(draft("A")).await.unwrap();
        assert_eq!(*lens.lock().unwrap(), vec![0, 1]);
    }

    // ---- Test 3: failure leaves the snapshot untouched ----

    #[tokio::test]
    async fn failed_mutations_keep_snapshot() {
        let (client, collection) = document_collection();
        let piece = collection.add(draft("A")).await.unwrap();
        let seen = recorder(&collection);
        let before = collection.snapshot();

        client.set_online(false);
        assert!(matches!(
            collection.add(draft("B")).await,
            Err(CollectionError::Store(StoreError::Persistence(_)))
        ));
        assert!(collection
            .update_piece(&piece.id, ArtPiecePatch::status(PieceStatus::Sold))
            .await
            .is_err());
        assert!(collection.remove(&piece.id).await.is_err());

        assert_eq!(collection.snapshot(), before);
        assert!(matches!(collection.state(), CollectionState::Error(_)));
        assert_eq!(*seen.lock().unwrap(), vec![1]);

        client.set_online(true);
        collection.add(draft("B")).await.unwrap();
        assert_eq!(collection.state(), CollectionState::Loaded);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found_and_not_inserted() {
        let (_, collection) = document_collection();
        let err = collection
            .update_piece(&PieceId::new("ghost"), ArtPiecePatch::status(PieceStatus::Sold))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn update_of_piece_outside_snapshot_is_not_inserted() {
        let (client, collection) = document_collection();
        let other = DocumentStoreAdapter::new(client, "artworks");
        let piece = other.create(draft("elsewhere")).await.unwrap();

        collection
            .update_piece(&piece.id, ArtPiecePatch::status(PieceStatus::Exhibition))
            .await
            .unwrap();
        assert!(collection.is_empty());
    }

    #[tokio::test]
    async fn remove_twice_succeeds() {
        let (_, collection) = document_collection();
        let piece = collection.add(draft("A")).await.unwrap();
        collection.remove(&piece.id).await.unwrap();
        collection.remove(&piece.id).await.unwrap();
        assert!(collection.is_empty());
    }

    // ---- Test 4: images ----

    #[tokio::test]
    async fn remove_deletes_image_best_effort() {
        let blobs = Arc::new(MemoryBlobClient::new("https://bucket.test"));
        let images: Arc<dyn ImageStore> = Arc::new(BucketImageStore::new(blobs.clone()));
        let backend = Arc::new(LocalAdapter::detached());
        let collection = PieceCollection::new(backend, Some(images.clone()));

        let first = images.upload(Bytes::from_static(b"1"), "a.jpg", "a").await.unwrap();
        let second = images.upload(Bytes::from_static(b"2"), "b.jpg", "b").await.unwrap();
        let with_image = |title: &str, uploaded: &atelier_media::UploadedImage| {
            let mut d = draft(title);
            d.image_url = uploaded.url.clone();
            d.image_path = Some(uploaded.reference.clone());
            d
        };
        let a = collection.add(with_image("A", &first)).await.unwrap();
        let b = collection.add(with_image("B", &second)).await.unwrap();

        collection.remove(&a.id).await.unwrap();
        assert!(blobs.get(&first.reference).is_none());

        // Image deletion failing does not fail the removal.
        blobs.set_online(false);
        collection.remove(&b.id).await.unwrap();
        assert!(collection.find(&b.id).is_err());
        assert!(blobs.get(&second.reference).is_some());
    }

    // ---- Test 5: construction and reads ----

    #[tokio::test]
    async fn starts_empty_with_backend_snapshot() {
        let backend = Arc::new(LocalAdapter::open(Arc::new(MemoryLocalStorage::new()), "k"));
        let expected = backend.initial_snapshot();
        let collection = PieceCollection::new(backend, None);
        assert_eq!(collection.state(), CollectionState::Empty);
        assert_eq!(collection.snapshot(), expected);
        assert!(!collection.is_empty());

        let (_, remote) = document_collection();
        assert!(remote.is_empty());
    }

    #[tokio::test]
    async fn get_by_id_bypasses_snapshot() {
        let (client, collection) = document_collection();
        let other = DocumentStoreAdapter::new(client.clone(), "artworks");
        let piece = other.create(draft("fresh")).await.unwrap();

        assert!(collection.find(&piece.id).is_err());
        assert_eq!(collection.get_by_id(&piece.id).await, Some(piece.clone()));

        client.set_online(false);
        assert_eq!(collection.get_by_id(&piece.id).await, None);
    }

    #[tokio::test]
    async fn refresh_degrades_to_empty() {
        let (client, collection) = document_collection();
        collection.add(draft("A")).await.unwrap();
        client.set_online(false);
        assert_eq!(collection.refresh().await, 0);
        assert!(collection.is_empty());
        assert_eq!(collection.state(), CollectionState::Loaded);
    }
}
