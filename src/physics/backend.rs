use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::handle::{PhysicsHandle, PhysicsRefCounted};

/// A cooked heightfield collision asset owned by the physics library.
pub trait CookedHeightField: PhysicsRefCounted + Send + Sync {
    /// Sample rows.
    fn rows(&self) -> u32;
    /// Sample columns.
    fn columns(&self) -> u32;
    /// Quantized height at a sample.
    fn height_at(&self, row: u32, column: u32) -> i16;
}

/// The external physics engine, reduced to what the core needs from it.
pub trait PhysicsBackend: Send + Sync {
    /// Cooks a heightfield from quantized samples on the library's insertion
    /// callback. The returned handle carries the construction reference.
    fn cook_height_field(
        &self,
        rows: u32,
        columns: u32,
        samples: &[i16],
    ) -> PhysicsHandle<dyn CookedHeightField>;

    /// Kicks one simulation step.
    fn simulate(&self, elapsed_time: f32);

    /// Blocks until the step finished and results are readable.
    fn fetch_results(&self);
}

// ============================================================================
// Null backend
// ============================================================================

struct NullHeightField {
    references: AtomicUsize,
    rows: u32,
    columns: u32,
    samples: Vec<i16>,
}

impl PhysicsRefCounted for NullHeightField {
    fn acquire(&self) {
        self.references.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        self.references.fetch_sub(1, Ordering::AcqRel);
    }
}

impl CookedHeightField for NullHeightField {
    fn rows(&self) -> u32 {
        self.rows
    }

    fn columns(&self) -> u32 {
        self.columns
    }

    fn height_at(&self, row: u32, column: u32) -> i16 {
        self.samples[(row * self.columns + column) as usize]
    }
}

/// Backend used headless and in tests: cooking keeps the samples, stepping
/// does nothing.
#[derive(Default)]
pub struct NullPhysicsBackend;

impl PhysicsBackend for NullPhysicsBackend {
    fn cook_height_field(
        &self,
        rows: u32,
        columns: u32,
        samples: &[i16],
    ) -> PhysicsHandle<dyn CookedHeightField> {
        PhysicsHandle::adopt(Arc::new(NullHeightField {
            references: AtomicUsize::new(1),
            rows,
            columns,
            samples: samples.to_vec(),
        }))
    }

    fn simulate(&self, _elapsed_time: f32) {}

    fn fetch_results(&self) {}
}
