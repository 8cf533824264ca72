use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

/// Asset behavior shared by every resource kind.
///
/// "Loaded" is a predicate derived from content rather than a separate flag:
/// a worker publishes a fully-formed value into the slot in one step, and
/// readers check the predicate. That removes the flag/content
/// synchronization hazard entirely.
pub trait Resource: Default + Send + Sync + 'static {
    /// Whether the slot currently holds loaded content.
    fn is_loaded(&self) -> bool;
}

/// Identity of a resource slot, used to key notifier subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

/// A shared slot holding one asset.
///
/// Managers hand out [`ResourceHandle`]s pointing at an initially-empty slot;
/// the worker task later publishes the parsed value. A manager keeps one
/// strong reference per entry, which is what the refcount-based eviction rule
/// counts against.
pub struct ResourceSlot<T: Resource> {
    data: RwLock<T>,
}

/// Shared-ownership reference to an asset slot.
pub type ResourceHandle<T> = Arc<ResourceSlot<T>>;

impl<T: Resource> ResourceSlot<T> {
    /// Creates a handle around an empty (unloaded) slot.
    #[must_use]
    pub fn new_empty() -> ResourceHandle<T> {
        Arc::new(Self {
            data: RwLock::new(T::default()),
        })
    }

    /// Creates a handle around an already-loaded value.
    #[must_use]
    pub fn new_loaded(value: T) -> ResourceHandle<T> {
        Arc::new(Self {
            data: RwLock::new(value),
        })
    }

    /// Read access to the current content.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.data.read()
    }

    /// Whether the slot holds loaded content.
    pub fn is_loaded(&self) -> bool {
        self.data.read().is_loaded()
    }

    /// Publishes a fully-formed value into the slot (move assignment).
    pub fn publish(&self, value: T) {
        *self.data.write() = value;
    }

    /// Slot identity for notifier subscriptions.
    #[must_use]
    pub fn id(&self) -> ResourceId {
        ResourceId(std::ptr::from_ref(self) as usize)
    }
}
