//! Registry shared between runs.
//!
//! A run takes a snapshot with `current()` and keeps it until done.  Reloading the station table
//! builds a whole new registry and `swap()`s it in, runs in progress keep the old one.
//!

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::StationRegistry;

#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: RwLock<Arc<StationRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: StationRegistry) -> Self {
        SharedRegistry {
            inner: RwLock::new(Arc::new(registry)),
        }
    }

    /// Snapshot of the current registry.
    ///
    pub fn current(&self) -> Arc<StationRegistry> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the registry, returning the previous one.
    ///
    #[tracing::instrument(skip_all)]
    pub fn swap(&self, registry: StationRegistry) -> Arc<StationRegistry> {
        debug!("new registry with {} records", registry.len());
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(registry))
    }
}
