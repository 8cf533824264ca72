use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::assets::handle::ResourceHandle;
use crate::assets::notifier::ResourceNotifier;
use crate::assets::reflection::{self, ReflectionContext};
use crate::assets::registry::ResourceRegistry;
use crate::assets::tree;
use crate::errors::KeelError;
use crate::resources::container_prototype::ContainerPrototype;
use crate::tasks::{Task, TaskScheduler};

/// Streams container-prototype (prefab) resource files.
///
/// A prototype file is an array of typed primitive nodes resolved through
/// the reflection layer; nested prototype references route back through this
/// manager, so [`ContainerManager::bind`] must run once all managers exist.
/// Prototype notifications fan out to container primitives whose children
/// may subscribe to further resources; the notifier's snapshot-then-release
/// drain makes that re-entrancy safe.
pub struct ContainerManager {
    registry: ResourceRegistry<ContainerPrototype>,
    notifier: Arc<ResourceNotifier<ContainerPrototype>>,
    scheduler: Arc<TaskScheduler>,
    context: RwLock<Option<ReflectionContext>>,
}

impl ContainerManager {
    /// Creates the container manager. Call [`Self::bind`] before the first
    /// frame.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            context: RwLock::new(None),
        })
    }

    /// Wires the reflection context once every manager exists.
    pub fn bind(&self, context: ReflectionContext) {
        *self.context.write() = Some(context);
    }

    /// Looks up or enqueues a prototype; an empty path yields the null
    /// handle.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<ContainerPrototype>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier container primitives subscribe on.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<ContainerPrototype>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<ContainerPrototype>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task) {
        let end_task = Task::noop("container manager end");

        let manager = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new("container manager begin", move || {
            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker = Task::new("container manager worker", move || {
                    let context = worker_manager
                        .context
                        .read()
                        .clone()
                        .ok_or_else(|| {
                            KeelError::Invariant("container manager is not bound".to_owned())
                        })?;

                    let text = std::fs::read_to_string(&path)
                        .map_err(|error| KeelError::asset(&path, format!("failed to open: {error}")))?;
                    let root: Value = serde_json::from_str(&text)?;

                    let nodes = tree::array(&root, &path)?;
                    let mut primitives = Vec::with_capacity(nodes.len());
                    for node in nodes {
                        primitives.push(reflection::primitive_from_tree(&context, node, &path)?);
                    }

                    handle.publish(ContainerPrototype::from_primitives(primitives));
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
