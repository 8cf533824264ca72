use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::handle::{Resource, ResourceHandle, ResourceId};

/// Identity of a listener, chosen by the subscriber. Unsubscription removes
/// by this token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerToken(
    /// Caller-chosen identity value (scene primitives use their key bits).
    pub u64,
);

type Callback<T> = Box<dyn FnOnce(&ResourceHandle<T>) + Send>;

struct Listener<T: Resource> {
    token: ListenerToken,
    callback: Callback<T>,
}

/// One-shot "resource loaded" publish/subscribe channel, keyed by resource
/// identity.
///
/// - `subscribe` on an already-loaded resource invokes the listener
///   immediately, on the calling thread, holding no locks.
/// - `notify` fires each pending listener exactly once and forgets the
///   entry; a subsequent `subscribe` takes the immediate path.
/// - Listeners are drained under the mutex but invoked after it is released,
///   so a listener may subscribe to any resource (including on this
///   notifier) during the fan-out. Container-prototype loads rely on this.
pub struct ResourceNotifier<T: Resource> {
    listeners: Mutex<FxHashMap<ResourceId, Vec<Listener<T>>>>,
}

impl<T: Resource> Default for ResourceNotifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Resource> ResourceNotifier<T> {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(FxHashMap::default()),
        }
    }

    /// Subscribes `callback` to `resource`'s loaded event.
    ///
    /// If the resource is already loaded the callback runs before this
    /// returns.
    pub fn subscribe(
        &self,
        resource: &ResourceHandle<T>,
        token: ListenerToken,
        callback: impl FnOnce(&ResourceHandle<T>) + Send + 'static,
    ) {
        if resource.is_loaded() {
            callback(resource);
            return;
        }

        self.listeners
            .lock()
            .entry(resource.id())
            .or_default()
            .push(Listener {
                token,
                callback: Box::new(callback),
            });
    }

    /// Removes a pending listener by identity (unordered swap-with-last).
    /// No effect if the listener already fired.
    pub fn unsubscribe(&self, resource: &ResourceHandle<T>, token: ListenerToken) {
        let mut listeners = self.listeners.lock();
        if let Some(pending) = listeners.get_mut(&resource.id())
            && let Some(index) = pending.iter().position(|listener| listener.token == token)
        {
            pending.swap_remove(index);
        }
    }

    /// Fires all pending listeners for `resource` and drops the entry.
    pub fn notify(&self, resource: &ResourceHandle<T>) {
        let drained = self.listeners.lock().remove(&resource.id());

        if let Some(drained) = drained {
            for listener in drained {
                (listener.callback)(resource);
            }
        }
    }

    /// Number of pending listeners for `resource`.
    #[must_use]
    pub fn pending_count(&self, resource: &ResourceHandle<T>) -> usize {
        self.listeners
            .lock()
            .get(&resource.id())
            .map_or(0, Vec::len)
    }
}
