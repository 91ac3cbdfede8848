use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, error};

use crate::client::{BlobClient, PutOptions};
use crate::data_url::mime_for;
use crate::error::{MediaError, MediaResult};
use crate::naming::{extension_of, now_millis};
use crate::traits::{ImageStore, Monotonic, Runtime, UploadedImage};

/// Public blob-store images named `artwork-{owner}-{millis}.{ext}` plus a
/// random suffix. The returned pathname is the reference.
pub struct BlobImageStore {
    client: Arc<dyn BlobClient>,
    runtime: Runtime,
}

impl BlobImageStore {
    pub fn new(client: Arc<dyn BlobClient>) -> Self {
        Self {
            client,
            runtime: Runtime::Interactive,
        }
    }

    pub fn with_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }
}

#[async_trait]
impl ImageStore for BlobImageStore {
    async fn upload_with_progress(
        &self,
        bytes: Bytes,
        file_name: &str,
        owner_id: &str,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> MediaResult<UploadedImage> {
        self.runtime.ensure("upload")?;
        let name = format!(
            "artwork-{owner_id}-{}.{}",
            now_millis(),
            extension_of(file_name)
        );
        let options = PutOptions {
            public: true,
            add_random_suffix: true,
            content_type: Some(mime_for(file_name).to_string()),
        };

        let tracker = Monotonic::new(on_progress);
        let stored = self
            .client
            .put_with_progress(&name, bytes, &options, &|p: u8| tracker.report(p))
            .await
            .map_err(|e| {
                error!(name = %name, error = %e, "failed to upload image to blob storage");
                MediaError::Upload(format!("failed to upload image: {e}"))
            })?;
        tracker.finish();

        debug!(pathname = %stored.pathname, "image uploaded");
        Ok(UploadedImage {
            url: stored.url,
            reference: stored.pathname,
        })
    }

    async fn delete(&self, reference: &str) -> MediaResult<()> {
        self.runtime.ensure("deletion")?;
        self.client.delete(reference).await.map_err(|e| {
            error!(reference, error = %e, "failed to delete image from blob storage");
            MediaError::Delete(format!("failed to delete image: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlobClient;
    use crate::traits::BestEffort;

    fn store() -> (Arc<MemoryBlobClient>, BlobImageStore) {
        let client = Arc::new(MemoryBlobClient::new("https://store.blob.vercel-storage.com"));
        (client.clone(), BlobImageStore::new(client))
    }

    #[tokio::test]
    async fn upload_adds_random_suffix() {
        let (client, images) = store();
        let a = images.upload(Bytes::from_static(b"a"), "a.webp", "p1").await.unwrap();
        let b = images.upload(Bytes::from_static(b"b"), "a.webp", "p1").await.unwrap();

        assert!(a.reference.starts_with("artwork-p1-"));
        assert!(a.reference.ends_with(".webp"));
        assert_ne!(a.reference, b.reference);
        assert!(a.url.ends_with(&a.reference));
        assert_eq!(client.len(), 2);
    }

    #[tokio::test]
    async fn delete_by_reference_or_url() {
        let (client, images) = store();
        let a = images.upload(Bytes::new(), "a.png", "p").await.unwrap();
        let b = images.upload(Bytes::new(), "b.png", "p").await.unwrap();
        images.delete(&a.reference).await.unwrap();
        images.delete(&b.url).await.unwrap();
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn prerender_refuses_both_operations() {
        let (_, images) = store();
        let images = images.with_runtime(Runtime::Prerender);
        assert!(matches!(
            images.upload(Bytes::new(), "a.png", "p").await,
            Err(MediaError::Environment(_))
        ));
        assert!(matches!(
            images.delete("artwork-p-1.png").await,
            Err(MediaError::Environment(_))
        ));
    }

    #[tokio::test]
    async fn discard_swallows_failure() {
        let (client, images) = store();
        client.set_online(false);
        let outcome = images.discard("artwork-p-1.png").await;
        assert!(!outcome.is_done());
        client.set_online(true);
        assert_eq!(images.discard("artwork-p-1.png").await, BestEffort::Done);
    }

    #[tokio::test]
    async fn upload_failure_is_typed() {
        let (client, images) = store();
        client.set_online(false);
        assert!(matches!(
            images.upload(Bytes::new(), "a.png", "p").await,
            Err(MediaError::Upload(_))
        ));
    }
}
