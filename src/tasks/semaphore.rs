use parking_lot::{Condvar, Mutex};

/// Counting semaphore.
///
/// Contract: `try_acquire` returns `true` iff the caller acquired the
/// semaphore.
pub struct Semaphore {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with an initial permit count.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            count: Mutex::new(permits),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until a permit is available and takes it.
    pub fn acquire(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.condvar.wait(&mut count);
        }
        *count -= 1;
    }

    /// Takes a permit if one is available without blocking.
    ///
    /// Returns `true` iff the caller acquired the semaphore.
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    /// Returns a permit.
    pub fn release(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.condvar.notify_one();
    }
}
