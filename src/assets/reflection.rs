//! Maps resource-tree type tags to primitive-descriptor factories.
//!
//! Container prototypes and scene descriptions are arrays of typed
//! primitive nodes; every resource reference in them routes through the
//! matching manager at parse time, so the produced descriptors hold live
//! handles and instantiation never touches the filesystem.

use std::sync::{Arc, Weak};

use serde_json::Value;

use super::managers::{
    AnimationManager, ContainerManager, GeometryManager, MaterialManager, MotionGraphManager,
    ParticleSystemManager,
};
use super::tree;
use crate::errors::{KeelError, Result};
use crate::physics::HeightFieldManager;
use crate::resources::container_prototype::{PayloadDescriptor, PrimitiveDescriptor};

/// The managers the reflection layer resolves references through.
///
/// The container manager is held weakly: it owns a context itself, and
/// nested prototype references resolve through it.
#[derive(Clone)]
pub struct ReflectionContext {
    /// Animation manager for animated-geometry references.
    pub animation: Arc<AnimationManager>,
    /// Geometry manager for mesh references.
    pub geometry: Arc<GeometryManager>,
    /// Material manager for draw and shadow materials.
    pub material: Arc<MaterialManager>,
    /// Motion-graph manager for motion-geometry references.
    pub motion_graph: Arc<MotionGraphManager>,
    /// Particle-system manager for effect references.
    pub particle_system: Arc<ParticleSystemManager>,
    /// Heightfield manager for collision references.
    pub height_field: Arc<HeightFieldManager>,
    /// Container manager for nested prototype references.
    pub container: Weak<ContainerManager>,
}

/// Builds a primitive descriptor from its resource-tree node.
pub fn primitive_from_tree(
    context: &ReflectionContext,
    node: &Value,
    path: &str,
) -> Result<PrimitiveDescriptor> {
    let object = tree::object(node, path)?;
    let kind = tree::string(tree::field(object, "type", path)?, path)?;

    let local_transform = match object.get("local_transform") {
        Some(value) => tree::transform(value, path)?,
        None => crate::math::Transform::IDENTITY,
    };

    let payload = match kind {
        "container_primitive" => {
            let prototype = match object.get("container_prototype") {
                Some(value) => {
                    let prototype_path = tree::string(value, path)?;
                    context
                        .container
                        .upgrade()
                        .ok_or_else(|| {
                            KeelError::Invariant("container manager destroyed".to_owned())
                        })?
                        .load(prototype_path)
                }
                None => None,
            };

            let mut children = Vec::new();
            if let Some(child_nodes) = object.get("children") {
                for child in tree::array(child_nodes, path)? {
                    children.push(primitive_from_tree(context, child, path)?);
                }
            }

            PayloadDescriptor::Container {
                prototype,
                children,
            }
        }
        "geometry_primitive" => PayloadDescriptor::Geometry {
            geometry: context
                .geometry
                .load(tree::string(tree::field(object, "geometry", path)?, path)?),
            material: context
                .material
                .load(tree::string(tree::field(object, "material", path)?, path)?),
            shadow_material: shadow_material(context, object, path)?,
        },
        "animated_geometry_primitive" => PayloadDescriptor::AnimatedGeometry {
            geometry: context
                .geometry
                .load(tree::string(tree::field(object, "geometry", path)?, path)?),
            material: context
                .material
                .load(tree::string(tree::field(object, "material", path)?, path)?),
            shadow_material: shadow_material(context, object, path)?,
            animation: context
                .animation
                .load(tree::string(tree::field(object, "animation", path)?, path)?),
        },
        "motion_geometry_primitive" => PayloadDescriptor::MotionGeometry {
            geometry: context
                .geometry
                .load(tree::string(tree::field(object, "geometry", path)?, path)?),
            material: context
                .material
                .load(tree::string(tree::field(object, "material", path)?, path)?),
            shadow_material: shadow_material(context, object, path)?,
            motion_graph: context.motion_graph.load(tree::string(
                tree::field(object, "motion_graph", path)?,
                path,
            )?),
        },
        "sphere_light_primitive" => PayloadDescriptor::Light {
            color: tree::vec3(tree::field(object, "color", path)?, path)?,
            radius: tree::number(tree::field(object, "radius", path)?, path)?,
        },
        "particle_system_primitive" => PayloadDescriptor::ParticleSystem {
            particle_system: context.particle_system.load(tree::string(
                tree::field(object, "particle_system", path)?,
                path,
            )?),
        },
        "box_rigid_actor_primitive" => PayloadDescriptor::BoxRigidActor {
            half_extent: tree::vec3(tree::field(object, "half_extent", path)?, path)?,
            is_kinematic: match object.get("is_kinematic") {
                Some(value) => tree::boolean(value, path)?,
                None => false,
            },
        },
        "capsule_controller_primitive" => PayloadDescriptor::CapsuleController {
            radius: tree::number(tree::field(object, "radius", path)?, path)?,
            height: tree::number(tree::field(object, "height", path)?, path)?,
        },
        "height_field_rigid_actor_primitive" => PayloadDescriptor::HeightFieldRigidActor {
            height_field: context.height_field.load(tree::string(
                tree::field(object, "height_field", path)?,
                path,
            )?),
        },
        _ => {
            return Err(KeelError::asset(
                path,
                format!("unknown primitive type \"{kind}\""),
            ));
        }
    };

    Ok(PrimitiveDescriptor {
        local_transform,
        payload,
    })
}

fn shadow_material(
    context: &ReflectionContext,
    object: &serde_json::Map<String, Value>,
    path: &str,
) -> Result<Option<crate::assets::ResourceHandle<crate::resources::material::Material>>> {
    match object.get("shadow_material") {
        Some(value) => Ok(context.material.load(tree::string(value, path)?)),
        None => Ok(None),
    }
}
