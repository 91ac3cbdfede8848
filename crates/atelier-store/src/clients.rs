//! Contracts for the storage services the adapters talk to.
//!
//! These mirror the surface of the real SDKs (document database, key-value
//! store, browser local storage) closely enough that a network-backed client
//! can be dropped in. In-process implementations live in [`crate::memory`]
//! and [`crate::file`].

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::StoreResult;

/// A document as a flat JSON object.
pub type Document = Map<String, Value>;

/// Key under which the server-timestamp sentinel is encoded.
pub const SERVER_TIMESTAMP_KEY: &str = ".sv";

/// Sentinel asking the document backend to substitute its own clock.
pub fn server_timestamp() -> Value {
    json!({ SERVER_TIMESTAMP_KEY: "timestamp" })
}

/// Returns `true` if `value` is the server-timestamp sentinel.
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get(SERVER_TIMESTAMP_KEY))
        .and_then(Value::as_str)
        == Some("timestamp")
}

/// Named-collection document database.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Insert a document and return the id the server assigned.
    async fn add_document(&self, collection: &str, fields: Document) -> StoreResult<String>;

    /// Fetch a document by id. Returns `Ok(None)` if it does not exist.
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// List every document in the collection, in no particular order.
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<(String, Document)>>;

    /// Overwrite the given top-level fields of an existing document.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, fields: Document)
        -> StoreResult<()>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()>;
}

/// Redis-style key-value store with list operations.
#[async_trait]
pub trait KvClient: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    async fn del(&self, key: &str) -> StoreResult<()>;

    /// Inclusive range; negative indexes count from the tail.
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>>;

    /// Prepend to a list, creating it if needed.
    async fn lpush(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove occurrences of `value`: `count > 0` from the head, `count < 0`
    /// from the tail, `0` for all. Returns how many were removed.
    async fn lrem(&self, key: &str, count: isize, value: &str) -> StoreResult<usize>;

    /// Reachability probe.
    async fn ping(&self) -> StoreResult<()>;
}

/// Synchronous string storage scoped to one origin, like `localStorage`.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
}
