use glam::Vec3;

use super::backend::CookedHeightField;
use super::handle::PhysicsHandle;
use super::height_field::HeightField;
use crate::assets::ResourceHandle;
use crate::scene::PrimitiveKey;

/// Box rigid-body payload.
pub struct RigidActorData {
    /// Box half extent in local space.
    pub half_extent: Vec3,
    /// Whether the body is driven kinematically from the scene graph rather
    /// than simulated.
    pub is_kinematic: bool,
}

impl RigidActorData {
    /// Creates a box body.
    #[must_use]
    pub fn new(half_extent: Vec3, is_kinematic: bool) -> Self {
        Self {
            half_extent,
            is_kinematic,
        }
    }
}

/// Capsule character-controller payload.
pub struct ControllerData {
    /// Capsule radius.
    pub radius: f32,
    /// Capsule cylinder height.
    pub height: f32,
    /// Accumulated displacement request for the next simulation step.
    pub pending_move: Vec3,
}

impl ControllerData {
    /// Creates a capsule controller.
    #[must_use]
    pub fn new(radius: f32, height: f32) -> Self {
        Self {
            radius,
            height,
            pending_move: Vec3::ZERO,
        }
    }

    /// Queues a displacement for the next simulation step.
    pub fn request_move(&mut self, displacement: Vec3) {
        self.pending_move += displacement;
    }
}

/// Shape built from a cooked heightfield, tagged with the owning primitive.
pub struct HeightFieldShape {
    /// The cooked collision asset.
    pub cooked: PhysicsHandle<dyn CookedHeightField>,
    /// World spacing between sample rows.
    pub row_spacing: f32,
    /// World spacing between sample columns.
    pub column_spacing: f32,
    /// World height per quantized unit.
    pub height_scale: f32,
    /// Owning primitive, mirrored into the shape's user data.
    pub user_data: PrimitiveKey,
}

/// Heightfield rigid-actor payload.
pub struct HeightFieldActorData {
    /// The streamed heightfield asset.
    pub height_field: Option<ResourceHandle<HeightField>>,
    /// The shape, built once the asset cooked.
    pub shape: Option<HeightFieldShape>,
}

impl HeightFieldActorData {
    /// Creates an actor bound to `height_field` (which may still be
    /// loading).
    #[must_use]
    pub fn new(height_field: Option<ResourceHandle<HeightField>>) -> Self {
        Self {
            height_field,
            shape: None,
        }
    }

    /// Builds the shape from the loaded asset, with the spacing convention
    /// `scale.y / i16::MAX, scale.x, scale.z`.
    pub fn build_shape(&mut self, scale: Vec3, user_data: PrimitiveKey) {
        let Some(height_field) = &self.height_field else {
            return;
        };
        let height_field = height_field.read();
        let Some(cooked) = height_field.cooked() else {
            return;
        };

        self.shape = Some(HeightFieldShape {
            cooked: cooked.clone(),
            row_spacing: scale.x,
            column_spacing: scale.z,
            height_scale: scale.y / f32::from(i16::MAX),
            user_data,
        });
    }

    /// Transfers the shape from `source`, re-tagging its user data to the
    /// adopting primitive.
    pub fn adopt_shape(&mut self, source: &mut HeightFieldActorData, user_data: PrimitiveKey) {
        self.shape = source.shape.take();
        if let Some(shape) = &mut self.shape {
            shape.user_data = user_data;
        }
    }
}
