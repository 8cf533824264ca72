use glam::{Affine3A, Mat4, Quat, Vec3};

/// Translation, rotation and non-uniform scale.
///
/// Composition follows the usual parent-times-local convention:
/// `global = parent * local` applies `local` first, then `parent`. Scene-graph
/// propagation and its inverse (`local = parent.inverse() * global`) are built
/// on exactly these two operations.
///
/// Non-uniform scale combined with rotation is not closed under composition;
/// like most TRS pipelines the scale components are multiplied per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation component.
    pub translation: Vec3,
    /// Rotation component (unit quaternion).
    pub rotation: Quat,
    /// Non-uniform scale component.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform from its three components.
    #[inline]
    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Creates a pure translation.
    #[inline]
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Creates a pure rotation.
    #[inline]
    #[must_use]
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Creates a pure scale.
    #[inline]
    #[must_use]
    pub const fn from_scale(scale: Vec3) -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale,
        }
    }

    /// Composes `self * other`: `other` is applied first.
    #[must_use]
    pub fn mul(&self, other: &Transform) -> Transform {
        Transform {
            translation: self.transform_point(other.translation),
            rotation: (self.rotation * other.rotation).normalize(),
            scale: self.scale * other.scale,
        }
    }

    /// Returns the inverse transform, so that `t.mul(&t.inverse())` is
    /// identity. Zero scale components invert to zero.
    #[must_use]
    pub fn inverse(&self) -> Transform {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vec3::select(
            self.scale.abs().cmpgt(Vec3::splat(super::EPSILON)),
            self.scale.recip(),
            Vec3::ZERO,
        );
        Transform {
            translation: inv_scale * (inv_rotation * -self.translation),
            rotation: inv_rotation,
            scale: inv_scale,
        }
    }

    /// Applies the transform to a point.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// Applies only the rotation and scale to a direction.
    #[inline]
    #[must_use]
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * (self.scale * direction)
    }

    /// Blends toward `other` by `factor`: translation and scale linearly,
    /// rotation along the shortest path.
    #[must_use]
    pub fn lerp(&self, other: &Transform, factor: f32) -> Transform {
        Transform {
            translation: self.translation.lerp(other.translation, factor),
            rotation: self.rotation.slerp(other.rotation, factor),
            scale: self.scale.lerp(other.scale, factor),
        }
    }

    /// Converts to an affine matrix.
    #[inline]
    #[must_use]
    pub fn to_affine(self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Converts to a 4x4 matrix.
    #[inline]
    #[must_use]
    pub fn to_mat4(self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Decomposes a 4x4 matrix into TRS.
    #[must_use]
    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform::mul(&self, &rhs)
    }
}
