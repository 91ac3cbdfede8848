use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::traits::BackendKind;

/// Configuration for the persistence layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend adapter to build at start-up.
    pub backend: BackendKind,
    /// Document collection name.
    pub collection: String,
    /// Key of the id list in the key-value store.
    pub list_key: String,
    /// Prefix of per-piece value keys in the key-value store.
    pub value_prefix: String,
    /// Local storage key holding the serialized snapshot.
    pub snapshot_key: String,
    /// Directory for file-backed local storage.
    pub data_dir: PathBuf,
    /// Fall back to the local adapter when the configured backend does not
    /// answer its liveness probe.
    pub fallback_to_local: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            collection: "artworks".into(),
            list_key: "art-pieces".into(),
            value_prefix: "art-piece:".into(),
            snapshot_key: "art-pieces".into(),
            data_dir: PathBuf::from(".atelier"),
            fallback_to_local: true,
        }
    }
}
