use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, error};

use crate::client::{BlobClient, PutOptions};
use crate::data_url::mime_for;
use crate::error::{MediaError, MediaResult};
use crate::naming::{extension_of, now_millis};
use crate::traits::{ImageStore, Monotonic, Runtime, UploadedImage};

pub const DEFAULT_PREFIX: &str = "artworks";

/// Storage-bucket images at `{prefix}/{owner}_{millis}.{ext}`. The path is
/// the reference.
pub struct BucketImageStore {
    client: Arc<dyn BlobClient>,
    prefix: String,
    runtime: Runtime,
}

impl BucketImageStore {
    pub fn new(client: Arc<dyn BlobClient>) -> Self {
        Self {
            client,
            prefix: DEFAULT_PREFIX.into(),
            runtime: Runtime::Interactive,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn with_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }

    fn path_for(&self, file_name: &str, owner_id: &str) -> String {
        format!(
            "{}/{}_{}.{}",
            self.prefix,
            owner_id,
            now_millis(),
            extension_of(file_name)
        )
    }
}

#[async_trait]
impl ImageStore for BucketImageStore {
    async fn upload_with_progress(
        &self,
        bytes: Bytes,
        file_name: &str,
        owner_id: &str,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> MediaResult<UploadedImage> {
        self.runtime.ensure("upload")?;
        let path = self.path_for(file_name, owner_id);
        let options = PutOptions {
            public: true,
            add_random_suffix: false,
            content_type: Some(mime_for(file_name).to_string()),
        };

        let tracker = Monotonic::new(on_progress);
        let stored = self
            .client
            .put_with_progress(&path, bytes, &options, &|p: u8| tracker.report(p))
            .await
            .map_err(|e| {
                error!(path = %path, error = %e, "error uploading image");
                MediaError::Upload(format!("failed to upload image: {e}"))
            })?;
        tracker.finish();

        debug!(path = %path, "image uploaded");
        Ok(UploadedImage {
            url: stored.url,
            reference: path,
        })
    }

    async fn delete(&self, reference: &str) -> MediaResult<()> {
        self.client.delete(reference).await.map_err(|e| {
            error!(reference, error = %e, "error deleting image");
            MediaError::Delete(format!("failed to delete image: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlobClient;
    use crate::traits::BestEffort;
    use std::sync::Mutex;

    fn store() -> (Arc<MemoryBlobClient>, BucketImageStore) {
        let client = Arc::new(MemoryBlobClient::new("https://bucket.test"));
        (client.clone(), BucketImageStore::new(client))
    }

    #[tokio::test]
    async fn upload_names_by_owner_and_time() {
        let (client, images) = store();
        let uploaded = images
            .upload(Bytes::from_static(b"img"), "Sunset.PNG", "piece-1")
            .await
            .unwrap();

        assert!(uploaded.reference.starts_with("artworks/piece-1_"));
        assert!(uploaded.reference.ends_with(".png"));
        assert_eq!(uploaded.url, format!("https://bucket.test/{}", uploaded.reference));
        assert_eq!(client.get(&uploaded.reference).unwrap(), Bytes::from_static(b"img"));
    }

    #[tokio::test]
    async fn default_extension_and_custom_prefix() {
        let (_, images) = store();
        let images = images.with_prefix("/gallery/");
        let uploaded = images.upload(Bytes::new(), "scan", "p").await.unwrap();
        assert!(uploaded.reference.starts_with("gallery/p_"));
        assert!(uploaded.reference.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_completes() {
        let (_, images) = store();
        let seen = Mutex::new(Vec::new());
        let record = |p: u8| seen.lock().unwrap().push(p);
        images
            .upload_with_progress(Bytes::from(vec![1u8; 200_000]), "a.jpg", "p", &record)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&100));
    }

    #[tokio::test]
    async fn prerender_refuses_upload() {
        let (client, images) = store();
        let images = images.with_runtime(Runtime::Prerender);
        assert!(matches!(
            images.upload(Bytes::new(), "a.jpg", "p").await,
            Err(MediaError::Environment(_))
        ));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn delete_and_discard() {
        let (client, images) = store();
        let uploaded = images.upload(Bytes::new(), "a.jpg", "p").await.unwrap();
        images.delete(&uploaded.reference).await.unwrap();
        assert!(client.is_empty());

        client.set_online(false);
        assert!(matches!(
            images.delete("artworks/x.jpg").await,
            Err(MediaError::Delete(_))
        ));
        assert!(matches!(
            images.discard("artworks/x.jpg").await,
            BestEffort::Failed(_)
        ));
    }
}
