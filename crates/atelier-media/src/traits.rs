use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Where the process is running.
///
/// Uploads and deletions only make sense with network or file access; during
/// prerendering they fail with [`MediaError::Environment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Runtime {
    #[default]
    Interactive,
    Prerender,
}

impl Runtime {
    pub fn ensure(self, operation: &str) -> MediaResult<()> {
        match self {
            Runtime::Interactive => Ok(()),
            Runtime::Prerender => Err(MediaError::Environment(format!(
                "image {operation} is only available in an interactive runtime"
            ))),
        }
    }
}

/// A stored image: a fetchable URL plus the reference used to delete it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub reference: String,
}

/// Outcome of a cleanup step whose failure is logged and then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use = "state explicitly that a failed cleanup is being ignored"]
pub enum BestEffort {
    Done,
    Failed(String),
}

impl BestEffort {
    pub fn is_done(&self) -> bool {
        matches!(self, BestEffort::Done)
    }
}

/// Uploads and deletes image assets.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under a name derived from `owner_id`, the current time
    /// and the extension of `file_name`.
    async fn upload(
        &self,
        bytes: Bytes,
        file_name: &str,
        owner_id: &str,
    ) -> MediaResult<UploadedImage> {
        self.upload_with_progress(bytes, file_name, owner_id, &|_: u8| {})
            .await
    }

    /// Like [`ImageStore::upload`], reporting percent complete. Reported
    /// values never decrease and end at 100 before the call returns.
    async fn upload_with_progress(
        &self,
        bytes: Bytes,
        file_name: &str,
        owner_id: &str,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> MediaResult<UploadedImage>;

    async fn delete(&self, reference: &str) -> MediaResult<()>;

    /// Delete without propagating failure.
    async fn discard(&self, reference: &str) -> BestEffort {
        match self.delete(reference).await {
            Ok(()) => BestEffort::Done,
            Err(e) => {
                warn!(reference, error = %e, "image cleanup failed; ignoring");
                BestEffort::Failed(e.to_string())
            }
        }
    }
}

/// Forwards progress reports only when they advance, capped at 100.
pub(crate) struct Monotonic<'a> {
    inner: &'a (dyn Fn(u8) + Send + Sync),
    last: AtomicU8,
}

impl<'a> Monotonic<'a> {
    pub(crate) fn new(inner: &'a (dyn Fn(u8) + Send + Sync)) -> Self {
        Self {
            inner,
            last: AtomicU8::new(0),
        }
    }

    pub(crate) fn report(&self, percent: u8) {
        let percent = percent.min(100);
        if self.last.fetch_max(percent, Ordering::SeqCst) < percent {
            (self.inner)(percent);
        }
    }

    pub(crate) fn finish(&self) {
        self.report(100);
    }
}
