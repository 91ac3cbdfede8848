//! In-memory collaborators for tests, demos and embedding.
//!
//! Each client keeps its data in a `HashMap` behind a `RwLock`. The document
//! and key-value clients can be switched offline to exercise the adapters'
//! failure paths.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use atelier_types::{touch, PieceId, RawTimestamp};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;

use crate::clients::{is_server_timestamp, Document, DocumentClient, KvClient, LocalStorage};
use crate::error::{poisoned, StoreError, StoreResult};

/// Length of ids minted by [`MemoryDocumentClient`].
const DOCUMENT_ID_LEN: usize = 20;

fn unreachable_backend(name: &str) -> StoreError {
    StoreError::Persistence(format!("{name} is unreachable"))
}

// ---------------------------------------------------------------------------
// MemoryDocumentClient
// ---------------------------------------------------------------------------

/// In-memory document database.
///
/// Server-timestamp sentinels are replaced with `{seconds, nanoseconds}`
/// objects from a clock that never repeats a value.
#[derive(Debug)]
pub struct MemoryDocumentClient {
    collections: RwLock<HashMap<String, HashMap<String, Document>>>,
    clock: Mutex<DateTime<Utc>>,
    online: AtomicBool,
}

impl MemoryDocumentClient {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            clock: Mutex::new(DateTime::<Utc>::MIN_UTC),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(unreachable_backend("document store"))
        }
    }

    fn stamp(&self, fields: &mut Document) -> StoreResult<()> {
        let mut clock = self.clock.lock().map_err(poisoned)?;
        *clock = touch(*clock);
        let stamp = serde_json::to_value(RawTimestamp::server(*clock))?;
        for value in fields.values_mut() {
            if is_server_timestamp(value) {
                *value = stamp.clone();
            }
        }
        Ok(())
    }
}

impl Default for MemoryDocumentClient {
    fn default() -> Self {
        Self::new()
    }
}

fn document_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(DOCUMENT_ID_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl DocumentClient for MemoryDocumentClient {
    async fn add_document(&self, collection: &str, mut fields: Document) -> StoreResult<String> {
        self.check_online()?;
        self.stamp(&mut fields)?;
        let id = document_id();
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        self.check_online()?;
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        mut fields: Document,
    ) -> StoreResult<()> {
        self.check_online()?;
        self.stamp(&mut fields)?;
        let mut collections = self.collections.write().map_err(poisoned)?;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(&PieceId::new(id)))?;
        doc.extend(fields);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.check_online()?;
        let mut collections = self.collections.write().map_err(poisoned)?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryKvClient
// ---------------------------------------------------------------------------

/// In-memory key-value store with Redis list semantics.
#[derive(Debug)]
pub struct MemoryKvClient {
    values: RwLock<HashMap<String, Value>>,
    lists: RwLock<HashMap<String, VecDeque<String>>>,
    online: AtomicBool,
}

impl MemoryKvClient {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            lists: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(unreachable_backend("key-value store"))
        }
    }
}

impl Default for MemoryKvClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a Redis-style inclusive range against a list of `len` items.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KvClient for MemoryKvClient {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.check_online()?;
        Ok(self.values.read().map_err(poisoned)?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.check_online()?;
        self.values
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.check_online()?;
        self.values.write().map_err(poisoned)?.remove(key);
        self.lists.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> StoreResult<Vec<String>> {
        self.check_online()?;
        let lists = self.lists.read().map_err(poisoned)?;
        let Some(list) = lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn lpush(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_online()?;
        self.lists
            .write()
            .map_err(poisoned)?
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn lrem(&self, key: &str, count: isize, value: &str) -> StoreResult<usize> {
        self.check_online()?;
        let mut lists = self.lists.write().map_err(poisoned)?;
        let Some(list) = lists.get_mut(key) else {
            return Ok(0);
        };

        let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() };
        let mut removed = 0;
        if count >= 0 {
            list.retain(|item| {
                if removed < limit && item == value {
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        } else {
            let mut kept: VecDeque<String> = VecDeque::with_capacity(list.len());
            while let Some(item) = list.pop_back() {
                if removed < limit && item == value {
                    removed += 1;
                } else {
                    kept.push_front(item);
                }
            }
            *list = kept;
        }
        Ok(removed)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }
}

// ---------------------------------------------------------------------------
// MemoryLocalStorage
// ---------------------------------------------------------------------------

/// `localStorage` stand-in that lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryLocalStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.items
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
