use std::sync::Arc;

use crate::animation::Animation;
use crate::assets::formats;
use crate::assets::handle::{Resource, ResourceHandle};
use crate::assets::notifier::ResourceNotifier;
use crate::assets::registry::ResourceRegistry;
use crate::errors::{KeelError, Result};
use crate::resources::geometry::Geometry;
use crate::resources::texture::Texture;
use crate::tasks::{Task, TaskScheduler};

struct TaskNames {
    begin: &'static str,
    worker: &'static str,
    end: &'static str,
}

/// Manager for assets parsed straight from a binary file, with no
/// cross-manager dependencies.
pub struct BinaryAssetManager<T: Resource> {
    registry: ResourceRegistry<T>,
    notifier: Arc<ResourceNotifier<T>>,
    scheduler: Arc<TaskScheduler>,
    parse: fn(&[u8], &str) -> Result<T>,
    names: TaskNames,
}

/// Streams `.kwa` animations.
pub type AnimationManager = BinaryAssetManager<Animation>;

/// Streams `.kwg` geometries.
pub type GeometryManager = BinaryAssetManager<Geometry>;

/// Streams `.kwt` textures.
pub type TextureManager = BinaryAssetManager<Texture>;

impl BinaryAssetManager<Animation> {
    /// Creates the animation manager.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>) -> Arc<Self> {
        Self::with_parser(
            scheduler,
            formats::parse_animation,
            TaskNames {
                begin: "animation manager begin",
                worker: "animation manager worker",
                end: "animation manager end",
            },
        )
    }
}

impl BinaryAssetManager<Geometry> {
    /// Creates the geometry manager.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>) -> Arc<Self> {
        Self::with_parser(
            scheduler,
            formats::parse_geometry,
            TaskNames {
                begin: "geometry manager begin",
                worker: "geometry manager worker",
                end: "geometry manager end",
            },
        )
    }
}

impl BinaryAssetManager<Texture> {
    /// Creates the texture manager.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>) -> Arc<Self> {
        Self::with_parser(
            scheduler,
            formats::parse_texture,
            TaskNames {
                begin: "texture manager begin",
                worker: "texture manager worker",
                end: "texture manager end",
            },
        )
    }
}

impl<T: Resource> BinaryAssetManager<T> {
    fn with_parser(
        scheduler: Arc<TaskScheduler>,
        parse: fn(&[u8], &str) -> Result<T>,
        names: TaskNames,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            parse,
            names,
        })
    }

    /// Looks up or enqueues an asset; an empty path yields the null handle.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<T>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier for this asset kind.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<T>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<T>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the manager holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task) {
        let end_task = Task::noop(self.names.end);

        let manager = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new(self.names.begin, move || {
            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker = Task::new(worker_manager.names.worker, move || {
                    let data = std::fs::read(&path)
                        .map_err(|error| KeelError::asset(&path, format!("failed to open: {error}")))?;
                    let asset = (worker_manager.parse)(&data, &path)?;
                    handle.publish(asset);
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
