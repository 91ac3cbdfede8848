use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::{with_random_suffix, BlobClient, PutOptions, StoredBlob};
use crate::error::{MediaError, MediaResult};

/// Bytes per progress event.
const CHUNK_SIZE: usize = 64 * 1024;

/// In-memory blob service for tests and demos.
#[derive(Debug)]
pub struct MemoryBlobClient {
    base_url: String,
    blobs: RwLock<HashMap<String, Bytes>>,
    online: AtomicBool,
}

impl MemoryBlobClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            blobs: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn get(&self, pathname: &str) -> Option<Bytes> {
        self.blobs.read().ok()?.get(pathname).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> MediaResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MediaError::Upload("blob service is unreachable".into()))
        }
    }

    fn pathname_of<'a>(&self, url_or_pathname: &'a str) -> &'a str {
        url_or_pathname
            .strip_prefix(self.base_url.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(url_or_pathname)
    }

    fn store(&self, name: &str, bytes: Bytes, options: &PutOptions) -> MediaResult<StoredBlob> {
        let pathname = if options.add_random_suffix {
            with_random_suffix(name)
        } else {
            name.to_string()
        };
        self.blobs
            .write()
            .map_err(|e| MediaError::Upload(format!("lock poisoned: {e}")))?
            .insert(pathname.clone(), bytes);
        Ok(StoredBlob {
            url: format!("{}/{}", self.base_url, pathname),
            pathname,
        })
    }
}

#[async_trait]
impl BlobClient for MemoryBlobClient {
    async fn put(
        &self,
        name: &str,
        bytes: Bytes,
        options: &PutOptions,
    ) -> MediaResult<StoredBlob> {
        self.check_online()?;
        self.store(name, bytes, options)
    }

    async fn put_with_progress(
        &self,
        name: &str,
        bytes: Bytes,
        options: &PutOptions,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> MediaResult<StoredBlob> {
        self.check_online()?;
        let total = bytes.len();
        let mut sent = 0;
        while sent < total {
            sent = (sent + CHUNK_SIZE).min(total);
            on_progress((sent * 100 / total) as u8);
            tokio::task::yield_now().await;
        }
        let blob = self.store(name, bytes, options)?;
        if total == 0 {
            on_progress(100);
        }
        Ok(blob)
    }

    async fn delete(&self, url_or_pathname: &str) -> MediaResult<()> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(MediaError::Delete("blob service is unreachable".into()));
        }
        let pathname = self.pathname_of(url_or_pathname);
        self.blobs
            .write()
            .map_err(|e| MediaError::Delete(format!("lock poisoned: {e}")))?
            .remove(pathname);
        Ok(())
    }
}
