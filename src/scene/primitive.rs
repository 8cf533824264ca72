use std::sync::Arc;

use glam::Vec3;

use crate::animation::{Animation, MotionState, SkeletonPose};
use crate::assets::{Resource, ResourceHandle};
use crate::math::{Aabb, Transform};
use crate::particles::ParticleEffectState;
use crate::physics::{ControllerData, HeightFieldActorData, RigidActorData};
use crate::resources::container_prototype::ContainerPrototype;
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::scene::PrimitiveKey;

/// Container payload: an optional prototype whose primitives become this
/// container's children once the prototype loads.
#[derive(Default)]
pub struct ContainerData {
    /// Prefab reference; `None` for a plain grouping container.
    pub prototype: Option<ResourceHandle<ContainerPrototype>>,
}

/// How a geometry primitive animates.
pub enum GeometryAnimation {
    /// Plays one animation in a loop.
    Simple {
        /// The looping animation; `None` means "no binding".
        animation: Option<ResourceHandle<Animation>>,
        /// Current skinning pose.
        skeleton_pose: SkeletonPose,
        /// Seconds into the animation.
        animation_time: f32,
        /// Playback speed factor.
        animation_speed: f32,
    },
    /// Drives the pose from a motion graph with blending and IK.
    Motion(MotionState),
}

/// Render-geometry payload: mesh, materials and world bounds, optionally
/// animated.
pub struct GeometryData {
    /// The mesh; `None` means "no binding".
    pub geometry: Option<ResourceHandle<Geometry>>,
    /// Draw material.
    pub material: Option<ResourceHandle<Material>>,
    /// Optional shadow-pass material.
    pub shadow_material: Option<ResourceHandle<Material>>,
    /// Animation mode, if any.
    pub animation: Option<GeometryAnimation>,
    pub(crate) bounds: Aabb,
}

impl GeometryData {
    /// Static geometry.
    #[must_use]
    pub fn new(
        geometry: Option<ResourceHandle<Geometry>>,
        material: Option<ResourceHandle<Material>>,
        shadow_material: Option<ResourceHandle<Material>>,
    ) -> Self {
        Self {
            geometry,
            material,
            shadow_material,
            animation: None,
            bounds: Aabb::ZERO,
        }
    }

    /// Geometry looping one animation.
    #[must_use]
    pub fn animated(
        geometry: Option<ResourceHandle<Geometry>>,
        material: Option<ResourceHandle<Material>>,
        shadow_material: Option<ResourceHandle<Material>>,
        animation: Option<ResourceHandle<Animation>>,
    ) -> Self {
        Self {
            animation: Some(GeometryAnimation::Simple {
                animation,
                skeleton_pose: SkeletonPose::new(),
                animation_time: 0.0,
                animation_speed: 1.0,
            }),
            ..Self::new(geometry, material, shadow_material)
        }
    }

    /// Geometry driven by a motion graph.
    #[must_use]
    pub fn motion(
        geometry: Option<ResourceHandle<Geometry>>,
        material: Option<ResourceHandle<Material>>,
        shadow_material: Option<ResourceHandle<Material>>,
        motion_state: MotionState,
    ) -> Self {
        Self {
            animation: Some(GeometryAnimation::Motion(motion_state)),
            ..Self::new(geometry, material, shadow_material)
        }
    }

    /// Current world bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// World bounds the primitive should have under `global_transform`:
    /// the mesh bounds transformed, or a point while the mesh loads.
    #[must_use]
    pub fn compute_bounds(&self, global_transform: &Transform) -> Aabb {
        match &self.geometry {
            Some(geometry) => {
                let geometry = geometry.read();
                if geometry.is_loaded() {
                    geometry.bounds().transform(global_transform)
                } else {
                    Aabb::new(global_transform.translation, Vec3::ZERO)
                }
            }
            None => Aabb::new(global_transform.translation, Vec3::ZERO),
        }
    }

    /// Advances the skinning pose by `elapsed_time`.
    pub fn update_animation(&mut self, global_transform: &Transform, elapsed_time: f32) {
        let Some(geometry_handle) = self.geometry.clone() else {
            return;
        };

        match &mut self.animation {
            Some(GeometryAnimation::Simple {
                animation,
                skeleton_pose,
                animation_time,
                animation_speed,
            }) => {
                let geometry = geometry_handle.read();
                let Some(skeleton) = geometry.skeleton() else {
                    return;
                };
                let Some(animation) = animation else {
                    return;
                };
                let animation = animation.read();
                if !animation.is_loaded() {
                    return;
                }

                *animation_time += elapsed_time * *animation_speed;

                for joint in 0..animation.joint_count() {
                    skeleton_pose.set_joint_space_transform(
                        joint,
                        animation.joint_transform(joint, *animation_time),
                    );
                }
                skeleton_pose.build_model_space_matrices(skeleton);
                skeleton_pose.apply_inverse_bind_matrices(skeleton);
            }
            Some(GeometryAnimation::Motion(motion_state)) => {
                let geometry = geometry_handle.read();
                motion_state.update(&geometry, global_transform, elapsed_time);
            }
            None => {}
        }
    }

    /// The current skinning pose, if the primitive animates.
    #[must_use]
    pub fn skeleton_pose(&self) -> Option<&SkeletonPose> {
        match &self.animation {
            Some(GeometryAnimation::Simple { skeleton_pose, .. }) => Some(skeleton_pose),
            Some(GeometryAnimation::Motion(motion_state)) => Some(motion_state.skeleton_pose()),
            None => None,
        }
    }

    /// The motion state, if the primitive is motion-driven.
    pub fn motion_state_mut(&mut self) -> Option<&mut MotionState> {
        match &mut self.animation {
            Some(GeometryAnimation::Motion(motion_state)) => Some(motion_state),
            _ => None,
        }
    }
}

/// Sphere light payload.
pub struct LightData {
    /// Linear RGB intensity.
    pub color: Vec3,
    /// Influence radius.
    pub radius: f32,
    pub(crate) bounds: Aabb,
}

impl LightData {
    /// Creates a sphere light.
    #[must_use]
    pub fn new(color: Vec3, radius: f32) -> Self {
        Self {
            color,
            radius,
            bounds: Aabb::ZERO,
        }
    }

    /// Current world bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// World bounds under `global_transform`: the influence sphere's box.
    #[must_use]
    pub fn compute_bounds(&self, global_transform: &Transform) -> Aabb {
        let scale = global_transform.scale;
        let max_scale = scale.x.abs().max(scale.y.abs()).max(scale.z.abs());
        Aabb::new(
            global_transform.translation,
            Vec3::splat(self.radius * max_scale),
        )
    }
}

/// Particle-system payload: the shared simulation state the player drives.
pub struct ParticleData {
    /// Simulation state shared with the particle player and the loaded
    /// notification.
    pub effect: Arc<ParticleEffectState>,
}

/// What a primitive is.
pub enum PrimitiveKind {
    /// Owns ordered children.
    Container(ContainerData),
    /// Renderable mesh (static, animated or motion-driven).
    Geometry(GeometryData),
    /// Sphere light.
    Light(LightData),
    /// Particle effect.
    ParticleSystem(ParticleData),
    /// Dynamic or kinematic physics body.
    RigidActor(RigidActorData),
    /// Character controller.
    Controller(ControllerData),
    /// Static heightfield collision.
    HeightFieldActor(HeightFieldActorData),
}

/// A node in the scene graph: transforms, hierarchy links and a payload.
pub struct Primitive {
    pub(crate) parent: Option<PrimitiveKey>,
    pub(crate) children: Vec<PrimitiveKey>,
    pub(crate) local_transform: Transform,
    pub(crate) global_transform: Transform,
    pub(crate) kind: PrimitiveKind,
}

impl Primitive {
    /// Creates a detached primitive.
    #[must_use]
    pub fn new(kind: PrimitiveKind, local_transform: Transform) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local_transform,
            // A detached primitive is its own coordinate system.
            global_transform: local_transform,
            kind,
        }
    }

    /// A plain grouping container.
    #[must_use]
    pub fn container(local_transform: Transform) -> Self {
        Self::new(
            PrimitiveKind::Container(ContainerData::default()),
            local_transform,
        )
    }

    /// Parent container, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<PrimitiveKey> {
        self.parent
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[PrimitiveKey] {
        &self.children
    }

    /// Transform relative to the parent.
    #[must_use]
    pub fn local_transform(&self) -> Transform {
        self.local_transform
    }

    /// Transform relative to the world.
    #[must_use]
    pub fn global_transform(&self) -> Transform {
        self.global_transform
    }

    /// Payload.
    #[must_use]
    pub fn kind(&self) -> &PrimitiveKind {
        &self.kind
    }

    /// Mutable payload.
    pub fn kind_mut(&mut self) -> &mut PrimitiveKind {
        &mut self.kind
    }

    /// Whether the payload participates in an acceleration structure.
    #[must_use]
    pub fn is_spatial(&self) -> bool {
        matches!(
            self.kind,
            PrimitiveKind::Geometry(_) | PrimitiveKind::Light(_) | PrimitiveKind::ParticleSystem(_)
        )
    }
}
