use bumpalo::Bump;

/// A bump arena for frame-transient data with a scoped reset point.
///
/// The arena is sized at startup and never grows: an allocation past the
/// capacity is a fatal error (the frame budget was mis-sized, not a
/// recoverable condition). Allocation is a pointer bump; deallocation is a
/// no-op; the whole arena is recycled by dropping the [`ResetPoint`] taken
/// at the top of the frame.
///
/// Per-frame task metadata, query scratch and parser buffers are the
/// intended tenants. The arena hands out references tied to its own borrow,
/// so anything placed here cannot outlive the frame.
pub struct FrameArena {
    bump: Bump,
    capacity: usize,
}

impl FrameArena {
    /// Creates an arena with a fixed byte capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let bump = Bump::with_capacity(capacity);
        // Fixed budget: never fall back to chained chunks.
        bump.set_allocation_limit(Some(capacity));
        Self { bump, capacity }
    }

    /// Allocates a value in the arena.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow. Arenas are sized at startup; overflow is
    /// the fatal path.
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.check_capacity(size_of::<T>());
        self.bump.alloc(value)
    }

    /// Allocates a copy of a slice in the arena.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow.
    pub fn alloc_slice_copy<T: Copy>(&self, slice: &[T]) -> &mut [T] {
        self.check_capacity(size_of_val(slice));
        self.bump.alloc_slice_copy(slice)
    }

    /// Allocates a string in the arena.
    ///
    /// # Panics
    ///
    /// Panics on capacity overflow.
    pub fn alloc_str(&self, value: &str) -> &str {
        self.check_capacity(value.len());
        self.bump.alloc_str(value)
    }

    /// Bytes currently allocated.
    #[must_use]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes a scoped reset point. When the returned guard drops, everything
    /// allocated since is freed.
    pub fn reset(&mut self) -> ResetPoint<'_> {
        ResetPoint { arena: self }
    }

    fn check_capacity(&self, requested: usize) {
        let remaining = self.capacity.saturating_sub(self.bump.allocated_bytes());
        assert!(
            requested <= remaining,
            "{}",
            crate::errors::KeelError::ArenaOverflow {
                requested,
                remaining,
            }
        );
    }
}

/// RAII guard produced by [`FrameArena::reset`].
///
/// While the guard lives, the arena can be used freely through it; dropping
/// the guard frees every allocation made during its lifetime.
pub struct ResetPoint<'a> {
    arena: &'a mut FrameArena,
}

impl std::ops::Deref for ResetPoint<'_> {
    type Target = FrameArena;

    fn deref(&self) -> &FrameArena {
        self.arena
    }
}

impl Drop for ResetPoint<'_> {
    fn drop(&mut self) {
        self.arena.bump.reset();
    }
}
