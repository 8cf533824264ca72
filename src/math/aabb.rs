use glam::Vec3;

use super::Transform;

/// Axis-aligned bounding box stored as center + half extent.
///
/// This is the layout the octree wants: octant selection and containment
/// tests compare centers and extents directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Box center.
    pub center: Vec3,
    /// Half extent along each axis. Must be non-negative.
    pub extent: Vec3,
}

impl Aabb {
    /// A zero-size box at the origin.
    pub const ZERO: Self = Self {
        center: Vec3::ZERO,
        extent: Vec3::ZERO,
    };

    /// Creates a box from center and half extent.
    #[inline]
    #[must_use]
    pub const fn new(center: Vec3, extent: Vec3) -> Self {
        Self { center, extent }
    }

    /// Creates a box from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extent: (max - min) * 0.5,
        }
    }

    /// Minimum corner.
    #[inline]
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.extent
    }

    /// Maximum corner.
    #[inline]
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.extent
    }

    /// Whether the two boxes overlap (touching counts).
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        let distance = (self.center - other.center).abs();
        let reach = self.extent + other.extent;
        distance.x <= reach.x && distance.y <= reach.y && distance.z <= reach.z
    }

    /// Whether `other` lies entirely inside `self`, with the same half-open
    /// test the octree descent uses (`min >= self.min` and `max < self.max`).
    #[must_use]
    pub fn contains(&self, other: &Aabb) -> bool {
        let self_min = self.min();
        let self_max = self.max();
        let other_min = other.min();
        let other_max = other.max();
        other_min.x >= self_min.x
            && other_min.y >= self_min.y
            && other_min.z >= self_min.z
            && other_max.x < self_max.x
            && other_max.y < self_max.y
            && other_max.z < self_max.z
    }

    /// Smallest box covering both.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Transforms the box and re-fits an axis-aligned result over the eight
    /// transformed corners.
    #[must_use]
    pub fn transform(&self, transform: &Transform) -> Aabb {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { -self.extent.x } else { self.extent.x },
                if i & 2 == 0 { -self.extent.y } else { self.extent.y },
                if i & 4 == 0 { -self.extent.z } else { self.extent.z },
            );
            let point = transform.transform_point(self.center + corner);
            min = min.min(point);
            max = max.max(point);
        }

        Aabb::from_min_max(min, max)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::ZERO
    }
}
