use glam::Vec3;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{AccelerationStructure, QueryVolume};
use crate::math::{Aabb, Frustum};
use crate::scene::PrimitiveKey;

// Octant index bits: bit set = negative side of the node center.
const NEGATIVE_X: usize = 1;
const NEGATIVE_Y: usize = 1 << 1;
const NEGATIVE_Z: usize = 1 << 2;

const OCTANT_FACTORS: [Vec3; 8] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
];

struct OctreeNode {
    bounds: Aabb,
    children: [Option<u32>; 8],
    primitives: Vec<(PrimitiveKey, Aabb)>,
}

impl OctreeNode {
    fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            children: [None; 8],
            primitives: Vec::new(),
        }
    }
}

fn octant_bit(min: f32, max: f32, center: f32, negative_bit: usize) -> Option<usize> {
    if min >= center {
        Some(0)
    } else if max < center {
        Some(negative_bit)
    } else {
        None
    }
}

struct OctreeInner {
    // Node 0 is the root; children are created lazily.
    nodes: Vec<OctreeNode>,
    locations: FxHashMap<PrimitiveKey, u32>,
    count: usize,
}

/// Octree acceleration structure.
///
/// O(log n) `add`, `remove`, `update` and `query`. A primitive lives at the
/// deepest node whose cell fully contains its bounds; a primitive straddling
/// a cell's center plane on any axis stays at that node, as does anything at
/// `max_depth`.
pub struct OctreeAccelerationStructure {
    inner: RwLock<OctreeInner>,
    max_depth: u32,
}

impl OctreeAccelerationStructure {
    /// Creates an octree with the given root cell and depth limit.
    ///
    /// # Panics
    ///
    /// Panics if any extent component is not positive.
    #[must_use]
    pub fn new(center: Vec3, extent: Vec3, max_depth: u32) -> Self {
        assert!(
            extent.x > 0.0 && extent.y > 0.0 && extent.z > 0.0,
            "invalid octree extent"
        );

        Self {
            inner: RwLock::new(OctreeInner {
                nodes: vec![OctreeNode::new(Aabb::new(center, extent))],
                locations: FxHashMap::default(),
                count: 0,
            }),
            max_depth,
        }
    }

    /// Octree with the conventional defaults: a 512-unit cell around the
    /// origin, six levels deep.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Vec3::ZERO, Vec3::splat(256.0), 6)
    }

    /// Descends from the root to the node that should hold `bounds`,
    /// creating children along the way.
    fn find_node(&self, inner: &mut OctreeInner, bounds: &Aabb) -> u32 {
        let mut node_index = 0u32;

        for _ in 0..self.max_depth {
            let node_center = inner.nodes[node_index as usize].bounds.center;
            let min = bounds.min();
            let max = bounds.max();

            // A primitive straddling the center plane on any axis stays here.
            let Some(x_bit) = octant_bit(min.x, max.x, node_center.x, NEGATIVE_X) else {
                return node_index;
            };
            let Some(y_bit) = octant_bit(min.y, max.y, node_center.y, NEGATIVE_Y) else {
                return node_index;
            };
            let Some(z_bit) = octant_bit(min.z, max.z, node_center.z, NEGATIVE_Z) else {
                return node_index;
            };
            let octant = x_bit | y_bit | z_bit;

            node_index = match inner.nodes[node_index as usize].children[octant] {
                Some(child) => child,
                None => {
                    let parent_bounds = inner.nodes[node_index as usize].bounds;
                    let child_extent = parent_bounds.extent * 0.5;
                    let child_center =
                        parent_bounds.center + OCTANT_FACTORS[octant] * child_extent;

                    let child = inner.nodes.len() as u32;
                    inner
                        .nodes
                        .push(OctreeNode::new(Aabb::new(child_center, child_extent)));
                    inner.nodes[node_index as usize].children[octant] = Some(child);
                    child
                }
            };
        }

        node_index
    }

    fn collect<V: QueryVolume>(
        inner: &OctreeInner,
        node_index: u32,
        volume: &V,
        output: &mut Vec<PrimitiveKey>,
    ) {
        let node = &inner.nodes[node_index as usize];

        for (primitive, bounds) in &node.primitives {
            if volume.intersects(bounds) {
                output.push(*primitive);
            }
        }

        for child in node.children.into_iter().flatten() {
            if volume.intersects(&inner.nodes[child as usize].bounds) {
                Self::collect(inner, child, volume, output);
            }
        }
    }

    fn query<V: QueryVolume>(&self, volume: &V, output: &mut Vec<PrimitiveKey>) {
        let inner = self.inner.read();
        Self::collect(&inner, 0, volume, output);
    }
}

impl AccelerationStructure for OctreeAccelerationStructure {
    fn add(&self, primitive: PrimitiveKey, bounds: Aabb) {
        let mut inner = self.inner.write();
        debug_assert!(
            !inner.locations.contains_key(&primitive),
            "primitive is already in this acceleration structure"
        );

        let node_index = self.find_node(&mut inner, &bounds);
        inner.nodes[node_index as usize]
            .primitives
            .push((primitive, bounds));
        inner.locations.insert(primitive, node_index);
        inner.count += 1;
    }

    fn remove(&self, primitive: PrimitiveKey) {
        let mut inner = self.inner.write();
        let Some(node_index) = inner.locations.remove(&primitive) else {
            debug_assert!(false, "primitive is not in this acceleration structure");
            return;
        };

        let node = &mut inner.nodes[node_index as usize];
        let position = node
            .primitives
            .iter()
            .position(|(stored, _)| *stored == primitive)
            .expect("location map out of sync");
        node.primitives.swap_remove(position);

        inner.count -= 1;
    }

    fn update(&self, primitive: PrimitiveKey, bounds: Aabb) {
        let mut inner = self.inner.write();
        let Some(&node_index) = inner.locations.get(&primitive) else {
            debug_assert!(false, "primitive is not in this acceleration structure");
            return;
        };

        let node = &mut inner.nodes[node_index as usize];
        let position = node
            .primitives
            .iter()
            .position(|(stored, _)| *stored == primitive)
            .expect("location map out of sync");

        if node.bounds.contains(&bounds) {
            // Still fits: record the new bounds in place.
            node.primitives[position].1 = bounds;
        } else {
            node.primitives.swap_remove(position);

            let new_node_index = self.find_node(&mut inner, &bounds);
            inner.nodes[new_node_index as usize]
                .primitives
                .push((primitive, bounds));
            inner.locations.insert(primitive, new_node_index);
        }
    }

    fn query_aabb(&self, bounds: &Aabb, output: &mut Vec<PrimitiveKey>) {
        self.query(bounds, output);
    }

    fn query_frustum(&self, frustum: &Frustum, output: &mut Vec<PrimitiveKey>) {
        self.query(frustum, output);
    }

    fn count(&self) -> usize {
        self.inner.read().count
    }
}
