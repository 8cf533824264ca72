use glam::Mat4;

use crate::math::Transform;
use crate::resources::geometry::Skeleton;

/// A skeletal pose: joint-space transforms plus lazily built model-space
/// matrices.
///
/// Joint order follows the skeleton: a joint's parent index is strictly less
/// than its own, so model-space matrices build in a single forward pass.
#[derive(Debug, Clone, Default)]
pub struct SkeletonPose {
    joint_space_transforms: Vec<Transform>,
    model_space_matrices: Vec<Mat4>,
}

impl SkeletonPose {
    /// An empty pose.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes slot `joint_index`, growing the pose with identity transforms
    /// if needed. Model-space matrices become stale until the next
    /// [`Self::build_model_space_matrices`].
    pub fn set_joint_space_transform(&mut self, joint_index: usize, transform: Transform) {
        if joint_index >= self.joint_space_transforms.len() {
            self.joint_space_transforms
                .resize(joint_index + 1, Transform::IDENTITY);
        }
        self.joint_space_transforms[joint_index] = transform;
    }

    /// Joint-space transforms in joint order.
    #[must_use]
    pub fn joint_space_transforms(&self) -> &[Transform] {
        &self.joint_space_transforms
    }

    /// Model-space matrices built by the last
    /// [`Self::build_model_space_matrices`] call.
    #[must_use]
    pub fn model_space_matrices(&self) -> &[Mat4] {
        &self.model_space_matrices
    }

    /// Number of joints the pose currently holds.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joint_space_transforms.len()
    }

    /// Blends this pose toward `other` by `factor`; translation and scale
    /// linear, rotation shortest-path slerp.
    ///
    /// If the joint counts differ the shorter pose is padded with identity
    /// transforms first.
    pub fn lerp(&mut self, other: &SkeletonPose, factor: f32) {
        if self.joint_space_transforms.len() < other.joint_space_transforms.len() {
            self.joint_space_transforms
                .resize(other.joint_space_transforms.len(), Transform::IDENTITY);
        }

        for (index, transform) in self.joint_space_transforms.iter_mut().enumerate() {
            let target = other
                .joint_space_transforms
                .get(index)
                .copied()
                .unwrap_or(Transform::IDENTITY);
            *transform = transform.lerp(&target, factor);
        }
    }

    /// Rebuilds model-space matrices in joint order:
    /// `matrix[i] = matrix[parent[i]] * to_matrix(transforms[i])`, with the
    /// root sentinel meaning "no parent".
    ///
    /// Joints the pose does not cover evaluate as identity.
    pub fn build_model_space_matrices(&mut self, skeleton: &Skeleton) {
        let joint_count = skeleton.joint_count();
        self.model_space_matrices.clear();
        self.model_space_matrices.reserve(joint_count);

        for joint in 0..joint_count {
            let local = self
                .joint_space_transforms
                .get(joint)
                .copied()
                .unwrap_or(Transform::IDENTITY)
                .to_mat4();

            let matrix = match skeleton.parent_joint(joint) {
                Some(parent) => {
                    debug_assert!(parent < joint, "parents must precede children");
                    self.model_space_matrices[parent] * local
                }
                None => local,
            };

            self.model_space_matrices.push(matrix);
        }
    }

    /// Multiplies every model-space matrix by the skeleton's inverse-bind
    /// counterpart, producing final skinning matrices in place.
    pub fn apply_inverse_bind_matrices(&mut self, skeleton: &Skeleton) {
        for (joint, matrix) in self.model_space_matrices.iter_mut().enumerate() {
            *matrix *= skeleton.inverse_bind_matrix(joint);
        }
    }
}
