//! Observable collection of Atelier art pieces.
//!
//! [`PieceCollection`] keeps an in-memory snapshot of every piece in one
//! backend and notifies subscribers whenever the snapshot changes. The
//! snapshot is a cache: [`PieceCollection::refresh`] rebuilds it from the
//! backend at any time.

pub mod collection;
pub mod error;
pub mod observer;

pub use collection::{CollectionState, PieceCollection};
pub use error::{CollectionError, CollectionResult};
pub use observer::{Observer, SubscriptionId};
