//! Interchangeable persistence backends for Atelier.
//!
//! Every backend implements [`PieceStore`], so the collection layer never
//! knows which one it is talking to. Exactly one backend is selected per
//! process, either explicitly or through [`BackendFactory::open`].
//!
//! # Backends
//!
//! - [`DocumentStoreAdapter`] -- one document per piece, server-assigned ids
//!   and timestamps
//! - [`KeyValueAdapter`] -- an id list plus a JSON value per piece
//! - [`LocalAdapter`] -- the whole collection as one snapshot, seeded with
//!   sample data on first use
//!
//! # Collaborators
//!
//! The adapters reach their services through [`DocumentClient`],
//! [`KvClient`] and [`LocalStorage`]. In-memory implementations live in
//! [`memory`]; [`FileLocalStorage`] keeps snapshots on disk.
//!
//! # Design Rules
//!
//! 1. `read_all` never fails; backend errors degrade to an empty list.
//! 2. `update` on an unknown id is [`StoreError::NotFound`], never an insert.
//! 3. `delete` is idempotent.
//! 4. `updated_at` strictly increases on every successful update.

pub mod clients;
pub mod config;
pub mod document;
pub mod error;
pub mod factory;
pub mod file;
pub mod kv;
pub mod local;
pub mod memory;
pub mod seed;
pub mod traits;

pub use clients::{DocumentClient, KvClient, LocalStorage};
pub use config::StoreConfig;
pub use document::DocumentStoreAdapter;
pub use error::{StoreError, StoreResult};
pub use factory::{select_backend, BackendFactory, Collaborators};
pub use file::FileLocalStorage;
pub use kv::KeyValueAdapter;
pub use local::LocalAdapter;
pub use memory::{MemoryDocumentClient, MemoryKvClient, MemoryLocalStorage};
pub use seed::seed_pieces;
pub use traits::{BackendKind, PieceStore};
