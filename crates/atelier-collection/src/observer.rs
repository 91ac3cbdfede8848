use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use atelier_types::ArtPiece;

/// Callback invoked with the full snapshot after every change.
pub type Observer = Arc<dyn Fn(&[ArtPiece]) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Registered observers, in subscription order.
#[derive(Default)]
pub(crate) struct Observers {
    next: AtomicU64,
    entries: RwLock<Vec<(SubscriptionId, Observer)>>,
}

impl Observers {
    pub(crate) fn insert(&self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next.fetch_add(1, Ordering::SeqCst));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    /// Copy of the current observers, so callbacks run without the lock held.
    pub(crate) fn current(&self) -> Vec<Observer> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
