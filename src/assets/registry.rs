use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::handle::{Resource, ResourceHandle, ResourceSlot};

struct RegistryInner<T: Resource> {
    entries: FxHashMap<String, ResourceHandle<T>>,
    pending: Vec<(String, ResourceHandle<T>)>,
}

/// The path-keyed core every resource manager embeds.
///
/// Owns the `path -> handle` map and the ordered pending queue under one
/// RW-lock: shared for lookups, exclusive for insertion, eviction and the
/// pending drain. Concurrent `load` calls for the same path return the same
/// handle.
pub struct ResourceRegistry<T: Resource> {
    inner: RwLock<RegistryInner<T>>,
}

impl<T: Resource> Default for ResourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> ResourceRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                entries: FxHashMap::default(),
                pending: Vec::new(),
            }),
        }
    }

    /// Looks up or inserts the handle for `relative_path`.
    ///
    /// An empty path is allowed and yields the null handle (`None`); callers
    /// treat it as "no binding". A fresh insertion appends to the pending
    /// queue; the worker spawned at the next frame begin fills the slot in.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<T>> {
        if relative_path.is_empty() {
            return None;
        }

        {
            let inner = self.inner.read();
            if let Some(handle) = inner.entries.get(relative_path) {
                return Some(Arc::clone(handle));
            }
        }

        let mut inner = self.inner.write();
        // Re-check: the entry may have been inserted between the locks.
        if let Some(handle) = inner.entries.get(relative_path) {
            return Some(Arc::clone(handle));
        }

        let handle = ResourceSlot::<T>::new_empty();
        inner
            .entries
            .insert(relative_path.to_owned(), Arc::clone(&handle));
        inner
            .pending
            .push((relative_path.to_owned(), Arc::clone(&handle)));
        Some(handle)
    }

    /// Reverse lookup: the path a handle was loaded from. O(n), designed for
    /// tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<T>) -> Option<String> {
        let inner = self.inner.read();
        inner
            .entries
            .iter()
            .find(|(_, stored)| Arc::ptr_eq(stored, handle))
            .map(|(path, _)| path.clone())
    }

    /// Frame-begin maintenance under one exclusive lock: evicts entries only
    /// the registry still references, then drains the pending queue.
    ///
    /// Pending entries are never evicted; their queue clone keeps the
    /// refcount above one.
    pub fn begin_frame(&self) -> Vec<(String, ResourceHandle<T>)> {
        let mut inner = self.inner.write();
        inner
            .entries
            .retain(|_, handle| Arc::strong_count(handle) > 1);
        std::mem::take(&mut inner.pending)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the registry holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }
}
