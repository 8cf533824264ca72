//! Math primitives shared by every subsystem: TRS transforms, axis-aligned
//! bounding boxes and view frustums.
//!
//! Vector and quaternion math comes from `glam`; this module only adds the
//! composite types the scene graph and spatial structures traffic in.

mod aabb;
mod frustum;
mod transform;

pub use aabb::Aabb;
pub use frustum::Frustum;
pub use transform::Transform;

/// Tolerance used by transform inversion, IK clamping and keyframe lookup.
pub const EPSILON: f32 = 1e-6;
