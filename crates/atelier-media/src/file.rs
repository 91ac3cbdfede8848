use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::client::{with_random_suffix, BlobClient, PutOptions, StoredBlob};
use crate::error::{MediaError, MediaResult};

const FILE_SCHEME: &str = "file://";

/// Blob service backed by a directory. URLs use the `file://` scheme.
#[derive(Debug, Clone)]
pub struct FsBlobClient {
    root: PathBuf,
}

impl FsBlobClient {
    pub fn new(root: impl Into<PathBuf>) -> MediaResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a pathname (or a `file://` URL under the root) to a file
    /// path, rejecting anything that would escape the root.
    fn resolve(&self, url_or_pathname: &str) -> Option<PathBuf> {
        let relative = match url_or_pathname.strip_prefix(FILE_SCHEME) {
            Some(absolute) => Path::new(absolute).strip_prefix(&self.root).ok()?.to_path_buf(),
            None => PathBuf::from(url_or_pathname),
        };
        let safe = relative.components().count() > 0
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }

    fn url_for(&self, path: &Path) -> String {
        format!("{FILE_SCHEME}{}", path.display())
    }
}

#[async_trait]
impl BlobClient for FsBlobClient {
    async fn put(
        &self,
        name: &str,
        bytes: Bytes,
        options: &PutOptions,
    ) -> MediaResult<StoredBlob> {
        let pathname = if options.add_random_suffix {
            with_random_suffix(name)
        } else {
            name.to_string()
        };
        let path = self
            .resolve(&pathname)
            .ok_or_else(|| MediaError::Upload(format!("invalid blob name: {pathname}")))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        debug!(pathname = %pathname, size = bytes.len(), "blob written");

        Ok(StoredBlob {
            url: self.url_for(&path),
            pathname,
        })
    }

    async fn delete(&self, url_or_pathname: &str) -> MediaResult<()> {
        let path = self
            .resolve(url_or_pathname)
            .ok_or_else(|| MediaError::Delete(format!("invalid blob reference: {url_or_pathname}")))?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
