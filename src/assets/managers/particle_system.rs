use std::sync::Arc;

use serde_json::Value;

use super::binary::GeometryManager;
use super::material::MaterialManager;
use crate::assets::handle::ResourceHandle;
use crate::assets::notifier::ResourceNotifier;
use crate::assets::registry::ResourceRegistry;
use crate::assets::tree;
use crate::errors::{KeelError, Result};
use crate::particles::reflection::{emitter_from_tree, generator_from_tree, updater_from_tree};
use crate::particles::{ParticleSystem, ParticleSystemAxes, ParticleSystemDescriptor};
use crate::tasks::{Task, TaskScheduler};

/// Streams particle-system resource files.
///
/// Geometry and material references route through their managers; emitters,
/// generators and updaters are built through the particle reflection layer
/// and validated (one generator per stream) before publishing.
pub struct ParticleSystemManager {
    registry: ResourceRegistry<ParticleSystem>,
    notifier: Arc<ResourceNotifier<ParticleSystem>>,
    scheduler: Arc<TaskScheduler>,
    geometry_manager: Arc<GeometryManager>,
    material_manager: Arc<MaterialManager>,
}

impl ParticleSystemManager {
    /// Creates the particle-system manager.
    #[must_use]
    pub fn new(
        scheduler: Arc<TaskScheduler>,
        geometry_manager: Arc<GeometryManager>,
        material_manager: Arc<MaterialManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            geometry_manager,
            material_manager,
        })
    }

    /// Looks up or enqueues a particle system; an empty path yields the null
    /// handle.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<ParticleSystem>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier particle primitives subscribe on.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<ParticleSystem>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<ParticleSystem>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task) {
        let end_task = Task::noop("particle system manager end");

        let manager = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new("particle system manager begin", move || {
            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker = Task::new("particle system manager worker", move || {
                    let text = std::fs::read_to_string(&path)
                        .map_err(|error| KeelError::asset(&path, format!("failed to open: {error}")))?;
                    let root: Value = serde_json::from_str(&text)?;

                    let system = system_from_tree(&worker_manager, &root, &path)?;
                    handle.publish(system);
                    worker_manager.notifier.notify(&handle);
                    Ok(())
                });
                worker.add_output_dependencies(&[&begin_end]);
                manager.scheduler.enqueue(&worker);
            }
            Ok(())
        });

        begin_task.add_output_dependency(&end_task);
        (begin_task, end_task)
    }
}

fn system_from_tree(
    manager: &ParticleSystemManager,
    root: &Value,
    path: &str,
) -> Result<ParticleSystem> {
    let object = tree::object(root, path)?;

    let mut descriptor = ParticleSystemDescriptor {
        duration: tree::number(tree::field(object, "duration", path)?, path)?,
        loop_count: match object.get("loop_count") {
            Some(value) => tree::unsigned(value, path)?,
            None => 0,
        },
        max_particle_count: tree::unsigned(tree::field(object, "max_particle_count", path)?, path)?
            as usize,
        max_bounds: tree::aabb(tree::field(object, "max_bounds", path)?, path)?,
        geometry: manager
            .geometry_manager
            .load(tree::string(tree::field(object, "geometry", path)?, path)?),
        material: manager
            .material_manager
            .load(tree::string(tree::field(object, "material", path)?, path)?),
        shadow_material: match object.get("shadow_material") {
            Some(value) => manager.material_manager.load(tree::string(value, path)?),
            None => None,
        },
        spritesheet_x: match object.get("spritesheet_x") {
            Some(value) => tree::unsigned(value, path)?,
            None => 1,
        },
        spritesheet_y: match object.get("spritesheet_y") {
            Some(value) => tree::unsigned(value, path)?,
            None => 1,
        },
        axes: match object.get("axes") {
            Some(value) => match tree::string(value, path)? {
                "none" => ParticleSystemAxes::None,
                "y" => ParticleSystemAxes::Y,
                "yz" => ParticleSystemAxes::Yz,
                other => {
                    return Err(KeelError::asset(path, format!("unknown axes \"{other}\"")));
                }
            },
            None => ParticleSystemAxes::None,
        },
        ..ParticleSystemDescriptor::default()
    };

    for node in tree::array(tree::field(object, "emitters", path)?, path)? {
        descriptor.emitters.push(emitter_from_tree(node, path)?);
    }
    for node in tree::array(tree::field(object, "generators", path)?, path)? {
        descriptor.generators.push(generator_from_tree(node, path)?);
    }
    for node in tree::array(tree::field(object, "updaters", path)?, path)? {
        descriptor.updaters.push(updater_from_tree(node, path)?);
    }

    ParticleSystem::from_descriptor(descriptor, path)
}
