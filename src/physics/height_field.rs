use std::sync::Arc;

use super::backend::{CookedHeightField, PhysicsBackend};
use super::handle::PhysicsHandle;
use crate::assets::{Resource, ResourceHandle, ResourceNotifier, ResourceRegistry};
use crate::errors::{KeelError, Result};
use crate::tasks::{Task, TaskScheduler};

/// A heightfield collision asset: the cooked physics object.
///
/// Loaded iff cooking finished.
#[derive(Default)]
pub struct HeightField {
    cooked: Option<PhysicsHandle<dyn CookedHeightField>>,
}

impl Resource for HeightField {
    fn is_loaded(&self) -> bool {
        self.cooked.is_some()
    }
}

impl HeightField {
    /// Wraps a cooked physics object.
    #[must_use]
    pub fn from_cooked(cooked: PhysicsHandle<dyn CookedHeightField>) -> Self {
        Self {
            cooked: Some(cooked),
        }
    }

    /// The cooked object, once loaded.
    #[must_use]
    pub fn cooked(&self) -> Option<&PhysicsHandle<dyn CookedHeightField>> {
        self.cooked.as_ref()
    }
}

/// Streams heightfield TSV files and cooks them through the physics
/// backend.
///
/// File format: two integers `rows cols`, then `rows * cols` whitespace
/// separated floats in `[-1, 1]`, quantized to signed 16-bit heights.
pub struct HeightFieldManager {
    registry: ResourceRegistry<HeightField>,
    notifier: Arc<ResourceNotifier<HeightField>>,
    scheduler: Arc<TaskScheduler>,
    backend: Arc<dyn PhysicsBackend>,
}

impl HeightFieldManager {
    /// Creates a manager cooking through `backend`.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>, backend: Arc<dyn PhysicsBackend>) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            backend,
        })
    }

    /// Enqueues a heightfield load; see
    /// [`ResourceRegistry::load`](crate::assets::ResourceRegistry::load) for
    /// the null-handle and dedup rules.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<HeightField>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier heightfield actors subscribe on.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<HeightField>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<HeightField>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task) {
        let end_task = Task::noop("height field manager end");

        let manager = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new("height field manager begin", move || {
            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker = Task::new("height field manager worker", move || {
                    let height_field = parse_height_field(&path, worker_manager.backend.as_ref())?;
                    handle.publish(height_field);
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

fn parse_height_field(path: &str, backend: &dyn PhysicsBackend) -> Result<HeightField> {
    let text = std::fs::read_to_string(path)
        .map_err(|error| KeelError::asset(path, format!("failed to open: {error}")))?;
    let mut tokens = text.split_whitespace();

    let rows: u32 = next_token(&mut tokens, path)?
        .parse()
        .map_err(|_| KeelError::asset(path, "invalid row count"))?;
    let columns: u32 = next_token(&mut tokens, path)?
        .parse()
        .map_err(|_| KeelError::asset(path, "invalid column count"))?;

    let mut samples = Vec::with_capacity((rows * columns) as usize);
    for _ in 0..rows * columns {
        let sample: f32 = next_token(&mut tokens, path)?
            .parse()
            .map_err(|_| KeelError::asset(path, "invalid height sample"))?;
        let quantized = ((sample * f32::from(i16::MAX)) as i32).clamp(-32768, 32767);
        samples.push(quantized as i16);
    }

    let cooked = backend.cook_height_field(rows, columns, &samples);
    Ok(HeightField::from_cooked(cooked))
}

fn next_token<'a>(tokens: &mut impl Iterator<Item = &'a str>, path: &str) -> Result<&'a str> {
    tokens
        .next()
        .ok_or_else(|| KeelError::asset(path, "truncated height field"))
}
