//! Contract for the blob-storage service behind the image stores.

use async_trait::async_trait;
use bytes::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::error::MediaResult;

const RANDOM_SUFFIX_LEN: usize = 16;

/// Options for a single `put`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutOptions {
    /// Make the stored object publicly fetchable.
    pub public: bool,
    /// Append a random suffix to the name to avoid collisions.
    pub add_random_suffix: bool,
    pub content_type: Option<String>,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            public: true,
            add_random_suffix: false,
            content_type: None,
        }
    }
}

/// What the service reports after a successful `put`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub url: String,
    pub pathname: String,
}

#[async_trait]
pub trait BlobClient: Send + Sync {
    async fn put(&self, name: &str, bytes: Bytes, options: &PutOptions)
        -> MediaResult<StoredBlob>;

    /// Upload while reporting percent complete. Clients without progress
    /// events report 100 once the upload finishes.
    async fn put_with_progress(
        &self,
        name: &str,
        bytes: Bytes,
        options: &PutOptions,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> MediaResult<StoredBlob> {
        let blob = self.put(name, bytes, options).await?;
        on_progress(100);
        Ok(blob)
    }

    /// Delete by URL or pathname. Deleting a missing object succeeds.
    async fn delete(&self, url_or_pathname: &str) -> MediaResult<()>;
}

/// `photo.jpg` becomes `photo-<suffix>.jpg`.
pub(crate) fn with_random_suffix(name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}-{suffix}.{ext}"),
        None => format!("{name}-{suffix}"),
    }
}
