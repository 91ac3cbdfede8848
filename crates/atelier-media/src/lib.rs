//! Image storage for Atelier art pieces.
//!
//! An [`ImageStore`] uploads image bytes and returns a fetchable URL plus an
//! opaque reference; the reference is what a record keeps so the image can be
//! deleted with it. Deleting an image during record removal goes through
//! [`ImageStore::discard`], which never fails the caller.
//!
//! # Stores
//!
//! - [`BucketImageStore`] -- `{prefix}/{owner}_{millis}.{ext}`, path as reference
//! - [`BlobImageStore`] -- `artwork-{owner}-{millis}.{ext}` with a random suffix
//!
//! Both talk to a [`BlobClient`]: [`MemoryBlobClient`] for tests, or
//! [`FsBlobClient`] for a directory on disk.

pub mod blob;
pub mod bucket;
pub mod client;
pub mod config;
pub mod data_url;
pub mod error;
pub mod file;
pub mod memory;
pub mod naming;
pub mod traits;

pub use blob::BlobImageStore;
pub use bucket::BucketImageStore;
pub use client::{BlobClient, PutOptions, StoredBlob};
pub use config::{ImageBackend, MediaConfig};
pub use data_url::{mime_for, to_data_url};
pub use error::{MediaError, MediaResult};
pub use file::FsBlobClient;
pub use memory::MemoryBlobClient;
pub use traits::{BestEffort, ImageStore, Runtime, UploadedImage};
