//! Builds the one backend adapter a process uses.

use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{DocumentClient, KvClient, LocalStorage};
use crate::config::StoreConfig;
use crate::document::DocumentStoreAdapter;
use crate::error::{StoreError, StoreResult};
use crate::file::FileLocalStorage;
use crate::kv::KeyValueAdapter;
use crate::local::LocalAdapter;
use crate::memory::{MemoryDocumentClient, MemoryKvClient, MemoryLocalStorage};
use crate::traits::{BackendKind, PieceStore};

/// Clients for the storage services available to this process.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub document: Option<Arc<dyn DocumentClient>>,
    pub key_value: Option<Arc<dyn KvClient>>,
    pub local: Option<Arc<dyn LocalStorage>>,
}

impl Collaborators {
    /// In-memory clients for every backend.
    pub fn in_memory() -> Self {
        Self {
            document: Some(Arc::new(MemoryDocumentClient::new())),
            key_value: Some(Arc::new(MemoryKvClient::new())),
            local: Some(Arc::new(MemoryLocalStorage::new())),
        }
    }

    /// Only a file-backed local storage under `config.data_dir`.
    pub fn on_disk(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            local: Some(Arc::new(FileLocalStorage::new(&config.data_dir)?)),
            ..Default::default()
        })
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("document", &self.document.is_some())
            .field("key_value", &self.key_value.is_some())
            .field("local", &self.local.is_some())
            .finish()
    }
}

/// Factory for backend adapters.
pub struct BackendFactory;

impl BackendFactory {
    pub fn document(client: Arc<dyn DocumentClient>, config: &StoreConfig) -> Arc<dyn PieceStore> {
        Arc::new(DocumentStoreAdapter::new(client, config.collection.clone()))
    }

    pub fn key_value(client: Arc<dyn KvClient>, config: &StoreConfig) -> Arc<dyn PieceStore> {
        Arc::new(KeyValueAdapter::new(
            client,
            config.list_key.clone(),
            config.value_prefix.clone(),
        ))
    }

    /// Local adapter over `storage`, or a detached one when no medium is
    /// present.
    pub fn local(storage: Option<Arc<dyn LocalStorage>>, config: &StoreConfig) -> Arc<dyn PieceStore> {
        match storage {
            Some(storage) => Arc::new(LocalAdapter::open(storage, config.snapshot_key.clone())),
            None => Arc::new(LocalAdapter::detached()),
        }
    }

    /// Build the adapter named by `config.backend`.
    ///
    /// Fails with [`StoreError::Environment`] if the matching client is not
    /// available. When `fallback_to_local` is set and the adapter does not
    /// answer its liveness probe, the local adapter is returned instead.
    pub async fn open(
        config: &StoreConfig,
        clients: &Collaborators,
    ) -> StoreResult<Arc<dyn PieceStore>> {
        let primary = match config.backend {
            BackendKind::Local => return Ok(Self::local(clients.local.clone(), config)),
            BackendKind::Document => Self::document(
                clients
                    .document
                    .clone()
                    .ok_or_else(|| missing_client(BackendKind::Document))?,
                config,
            ),
            BackendKind::KeyValue => Self::key_value(
                clients
                    .key_value
                    .clone()
                    .ok_or_else(|| missing_client(BackendKind::KeyValue))?,
                config,
            ),
        };

        let fallback = config
            .fallback_to_local
            .then(|| Self::local(clients.local.clone(), config));
        Ok(select_backend(primary, fallback).await)
    }
}

fn missing_client(kind: BackendKind) -> StoreError {
    StoreError::Environment(format!("{kind} backend selected but no client is configured"))
}

/// Return `primary` if it is reachable, otherwise `fallback` when given.
pub async fn select_backend(
    primary: Arc<dyn PieceStore>,
    fallback: Option<Arc<dyn PieceStore>>,
) -> Arc<dyn PieceStore> {
    if primary.is_available().await {
        info!(backend = %primary.kind(), "using backend");
        return primary;
    }
    match fallback {
        Some(fallback) => {
            warn!(
                primary = %primary.kind(),
                fallback = %fallback.kind(),
                "backend unreachable; falling back"
            );
            fallback
        }
        None => primary,
    }
}
