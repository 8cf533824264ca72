use glam::Vec3;

use crate::animation::{Animation, MotionGraph};
use crate::assets::{Resource, ResourceHandle};
use crate::math::Transform;
use crate::particles::ParticleSystem;
use crate::physics::HeightField;
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

/// Payload template of one prototype primitive.
///
/// Descriptors hold resource handles resolved at parse time (the worker task
/// already routed every reference through the matching manager), so
/// instantiation only clones handles and builds fresh per-primitive state.
#[derive(Clone)]
pub enum PayloadDescriptor {
    /// A container, optionally referencing another prototype.
    Container {
        /// Nested prototype reference.
        prototype: Option<ResourceHandle<ContainerPrototype>>,
        /// Inline children.
        children: Vec<PrimitiveDescriptor>,
    },
    /// Static render geometry.
    Geometry {
        /// Mesh reference.
        geometry: Option<ResourceHandle<Geometry>>,
        /// Draw material.
        material: Option<ResourceHandle<Material>>,
        /// Shadow-pass material.
        shadow_material: Option<ResourceHandle<Material>>,
    },
    /// Geometry looping a single animation.
    AnimatedGeometry {
        /// Mesh reference.
        geometry: Option<ResourceHandle<Geometry>>,
        /// Draw material.
        material: Option<ResourceHandle<Material>>,
        /// Shadow-pass material.
        shadow_material: Option<ResourceHandle<Material>>,
        /// The looping animation.
        animation: Option<ResourceHandle<Animation>>,
    },
    /// Geometry driven by a motion graph.
    MotionGeometry {
        /// Mesh reference.
        geometry: Option<ResourceHandle<Geometry>>,
        /// Draw material.
        material: Option<ResourceHandle<Material>>,
        /// Shadow-pass material.
        shadow_material: Option<ResourceHandle<Material>>,
        /// The driving motion graph.
        motion_graph: Option<ResourceHandle<MotionGraph>>,
    },
    /// Sphere light.
    Light {
        /// Linear RGB intensity.
        color: Vec3,
        /// Influence radius.
        radius: f32,
    },
    /// Particle effect.
    ParticleSystem {
        /// The particle system to play.
        particle_system: Option<ResourceHandle<ParticleSystem>>,
    },
    /// Dynamic or kinematic box body.
    BoxRigidActor {
        /// Box half extent.
        half_extent: Vec3,
        /// Whether the body is driven kinematically.
        is_kinematic: bool,
    },
    /// Capsule character controller.
    CapsuleController {
        /// Capsule radius.
        radius: f32,
        /// Capsule cylinder height.
        height: f32,
    },
    /// Static heightfield collision.
    HeightFieldRigidActor {
        /// The cooked heightfield.
        height_field: Option<ResourceHandle<HeightField>>,
    },
}

/// One prototype primitive: a payload template plus its local transform.
#[derive(Clone)]
pub struct PrimitiveDescriptor {
    /// Transform relative to the instantiating container.
    pub local_transform: Transform,
    /// Payload template.
    pub payload: PayloadDescriptor,
}

/// A prefab: the primitives a container spawns as children once the
/// prototype loads.
///
/// Loaded iff the primitive list was published (an empty list is a valid
/// loaded prototype).
#[derive(Default)]
pub struct ContainerPrototype {
    primitives: Option<Vec<PrimitiveDescriptor>>,
}

impl Resource for ContainerPrototype {
    fn is_loaded(&self) -> bool {
        self.primitives.is_some()
    }
}

impl ContainerPrototype {
    /// Wraps parsed primitive descriptors.
    #[must_use]
    pub fn from_primitives(primitives: Vec<PrimitiveDescriptor>) -> Self {
        Self {
            primitives: Some(primitives),
        }
    }

    /// The prototype's primitives, once loaded.
    #[must_use]
    pub fn primitives(&self) -> &[PrimitiveDescriptor] {
        self.primitives.as_deref().unwrap_or_default()
    }
}
