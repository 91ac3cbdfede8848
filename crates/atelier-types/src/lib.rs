//! Foundation types for Atelier, a small art inventory tracker.
//!
//! Every other Atelier crate depends on `atelier-types`. The types here are
//! plain values: they know how to validate and merge themselves but never
//! touch storage.
//!
//! # Key Types
//!
//! - [`ArtPiece`] -- one artwork record as persisted and observed
//! - [`NewArtPiece`] -- a draft without id or timestamps, passed to `create`
//! - [`ArtPiecePatch`] -- a partial update; `id`/`createdAt` are stripped
//! - [`PieceId`] -- opaque identifier (UUID v7 or a backend-assigned id)
//! - [`RawTimestamp`] -- the three backend-native timestamp encodings

pub mod error;
pub mod id;
pub mod patch;
pub mod piece;
pub mod temporal;

pub use error::{TypeError, TypeResult};
pub use id::PieceId;
pub use patch::ArtPiecePatch;
pub use piece::{is_blob_url, ArtPiece, Dimensions, NewArtPiece, PieceStatus, Unit};
pub use temporal::{touch, RawTimestamp};
