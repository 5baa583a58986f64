//! Shared board context handed to the coordinator and the query layer.
//!
//! Every session builds its own `BoardStore`; there is no process-wide
//! instance. The cache lock is taken only for the synchronous span of a
//! closure and is never held across an `.await`. Writes are visible to the
//! `coordinator` module alone; everything else reads.

use std::sync::{Arc, PoisonError, RwLock};

use crate::cache::BoardCache;
use crate::mutation::MutationTracker;

#[derive(Clone, Default)]
pub struct BoardStore {
    cache: Arc<RwLock<BoardCache>>,
    mutations: MutationTracker,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only closure against the cache.
    pub fn read<R>(&self, f: impl FnOnce(&BoardCache) -> R) -> R {
        let guard = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run a mutating closure against the cache.
    pub(super) fn write<R>(&self, f: impl FnOnce(&mut BoardCache) -> R) -> R {
        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn mutations(&self) -> &MutationTracker {
        &self.mutations
    }
}
