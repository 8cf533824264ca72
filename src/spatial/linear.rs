use parking_lot::RwLock;

use super::{AccelerationStructure, QueryVolume};
use crate::math::{Aabb, Frustum};
use crate::scene::PrimitiveKey;

/// Flat acceleration structure: O(1) maintenance, O(n) queries.
///
/// Used where spatial pruning is not worth the maintenance cost, e.g. the
/// handful of lights in a scene.
#[derive(Default)]
pub struct LinearAccelerationStructure {
    primitives: RwLock<Vec<(PrimitiveKey, Aabb)>>,
}

impl LinearAccelerationStructure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self {
            primitives: RwLock::new(Vec::with_capacity(128)),
        }
    }

    fn query<V: QueryVolume>(&self, volume: &V, output: &mut Vec<PrimitiveKey>) {
        let primitives = self.primitives.read();
        for (primitive, bounds) in primitives.iter() {
            if volume.intersects(bounds) {
                output.push(*primitive);
            }
        }
    }
}

impl AccelerationStructure for LinearAccelerationStructure {
    fn add(&self, primitive: PrimitiveKey, bounds: Aabb) {
        let mut primitives = self.primitives.write();
        debug_assert!(
            !primitives.iter().any(|(stored, _)| *stored == primitive),
            "primitive is already in this acceleration structure"
        );
        primitives.push((primitive, bounds));
    }

    fn remove(&self, primitive: PrimitiveKey) {
        let mut primitives = self.primitives.write();
        if let Some(index) = primitives.iter().position(|(stored, _)| *stored == primitive) {
            primitives.remove(index);
        }
    }

    fn update(&self, primitive: PrimitiveKey, bounds: Aabb) {
        let mut primitives = self.primitives.write();
        if let Some(entry) = primitives
            .iter_mut()
            .find(|(stored, _)| *stored == primitive)
        {
            entry.1 = bounds;
        }
    }

    fn query_aabb(&self, bounds: &Aabb, output: &mut Vec<PrimitiveKey>) {
        self.query(bounds, output);
    }

    fn query_frustum(&self, frustum: &Frustum, output: &mut Vec<PrimitiveKey>) {
        self.query(frustum, output);
    }

    fn count(&self) -> usize {
        self.primitives.read().len()
    }
}
