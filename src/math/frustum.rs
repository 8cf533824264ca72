use glam::{Mat4, Vec3, Vec4};

use super::Aabb;

/// View frustum as six inward-facing planes.
///
/// Planes are extracted from a view-projection matrix with the
/// Gribb-Hartmann method. A degenerate plane (zero normal, e.g. the far
/// plane of an infinite projection) never culls.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    /// Extracts frustum planes from a view-projection matrix.
    #[must_use]
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let rows = [matrix.row(0), matrix.row(1), matrix.row(2), matrix.row(3)];

        let mut planes = [
            rows[3] + rows[0], // Left
            rows[3] - rows[0], // Right
            rows[3] + rows[1], // Bottom
            rows[3] - rows[1], // Top
            rows[3] + rows[2], // Near
            rows[3] - rows[2], // Far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 1e-6 {
                *plane /= length;
            } else {
                // Degenerate plane never culls.
                *plane = Vec4::ZERO;
            }
        }

        Self { planes }
    }

    /// Whether the box intersects the frustum volume.
    ///
    /// Plane-AABB test: rejected as soon as the box is entirely on the
    /// outside of any plane. Conservative for boxes near frustum corners,
    /// which is the usual trade for culling.
    #[must_use]
    pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            if normal == Vec3::ZERO {
                continue;
            }

            // Projection radius of the box onto the plane normal.
            let radius = bounds.extent.dot(normal.abs());
            let distance = normal.dot(bounds.center) + plane.w;
            if distance < -radius {
                return false;
            }
        }
        true
    }

    /// Whether a sphere intersects the frustum volume.
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            if normal == Vec3::ZERO {
                continue;
            }
            if normal.dot(center) + plane.w < -radius {
                return false;
            }
        }
        true
    }
}
