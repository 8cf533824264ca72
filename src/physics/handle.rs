use std::sync::Arc;

/// The external library's counted-reference protocol.
///
/// Physics objects count references themselves; the engine mirrors every
/// handle clone and drop into `acquire`/`release` so the library sees the
/// same lifetime it would under its native bindings.
pub trait PhysicsRefCounted {
    /// Adds one external reference.
    fn acquire(&self);
    /// Drops one external reference.
    fn release(&self);
}

/// Smart handle over an externally counted physics object.
///
/// Not interchangeable with a general reference-counted pointer: the
/// acquire/release calls are the contract, the `Arc` only carries the
/// allocation on this side of the boundary.
pub struct PhysicsHandle<T: PhysicsRefCounted + ?Sized> {
    object: Arc<T>,
}

impl<T: PhysicsRefCounted + ?Sized> PhysicsHandle<T> {
    /// Wraps an object that already carries one external reference (the one
    /// its factory took on construction).
    #[must_use]
    pub fn adopt(object: Arc<T>) -> Self {
        Self { object }
    }

    /// The wrapped object.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.object
    }
}

impl<T: PhysicsRefCounted + ?Sized> Clone for PhysicsHandle<T> {
    fn clone(&self) -> Self {
        self.object.acquire();
        Self {
            object: Arc::clone(&self.object),
        }
    }
}

impl<T: PhysicsRefCounted + ?Sized> Drop for PhysicsHandle<T> {
    fn drop(&mut self) {
        self.object.release();
    }
}

impl<T: PhysicsRefCounted + ?Sized> std::ops::Deref for PhysicsHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}
