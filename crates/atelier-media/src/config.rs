use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blob::BlobImageStore;
use crate::bucket::{BucketImageStore, DEFAULT_PREFIX};
use crate::error::MediaResult;
use crate::file::FsBlobClient;
use crate::traits::{ImageStore, Runtime};

/// Which image store to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageBackend {
    Bucket,
    #[default]
    Blob,
    /// No store; images are embedded as `data:` URLs.
    Inline,
}

/// Configuration for image storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub backend: ImageBackend,
    /// Path prefix for bucket uploads.
    pub prefix: String,
    /// Directory that holds uploaded files.
    pub root_dir: PathBuf,
    pub runtime: Runtime,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            backend: ImageBackend::Blob,
            prefix: DEFAULT_PREFIX.into(),
            root_dir: PathBuf::from(".atelier/media"),
            runtime: Runtime::Interactive,
        }
    }
}

impl MediaConfig {
    /// Build the configured store over a directory-backed blob client.
    /// Returns `None` for [`ImageBackend::Inline`].
    pub fn open(&self) -> MediaResult<Option<Arc<dyn ImageStore>>> {
        let store: Arc<dyn ImageStore> = match self.backend {
            ImageBackend::Inline => return Ok(None),
            ImageBackend::Bucket => Arc::new(
                BucketImageStore::new(Arc::new(FsBlobClient::new(&self.root_dir)?))
                    .with_prefix(self.prefix.clone())
                    .with_runtime(self.runtime),
            ),
            ImageBackend::Blob => Arc::new(
                BlobImageStore::new(Arc::new(FsBlobClient::new(&self.root_dir)?))
                    .with_runtime(self.runtime),
            ),
        };
        Ok(Some(store))
    }
}
