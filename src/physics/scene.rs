use std::sync::Arc;

use parking_lot::RwLock;

use super::backend::PhysicsBackend;
use crate::scene::PrimitiveKey;
use crate::tasks::Task;

/// The physics world one render scene simulates against.
///
/// Per frame the scene contributes a `(begin, end)` task pair: begin kicks
/// the simulation step, end blocks on its results. Tasks that read simulated
/// transforms order themselves after `end`; tasks that write kinematic
/// targets order themselves before `begin`.
pub struct PhysicsScene {
    backend: Arc<dyn PhysicsBackend>,
    actors: RwLock<Vec<PrimitiveKey>>,
}

impl PhysicsScene {
    /// Creates a physics scene over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn PhysicsBackend>) -> Arc<Self> {
        Arc::new(Self {
            backend,
            actors: RwLock::new(Vec::new()),
        })
    }

    /// Registers a physics primitive.
    pub fn add_actor(&self, actor: PrimitiveKey) {
        let mut actors = self.actors.write();
        debug_assert!(!actors.contains(&actor), "actor already registered");
        actors.push(actor);
    }

    /// Unregisters a physics primitive.
    pub fn remove_actor(&self, actor: PrimitiveKey) {
        let mut actors = self.actors.write();
        if let Some(position) = actors.iter().position(|stored| *stored == actor) {
            actors.swap_remove(position);
        }
    }

    /// Number of registered physics primitives.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.read().len()
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>, elapsed_time: f32) -> (Task, Task) {
        let simulate_scene = Arc::clone(self);
        let begin_task = Task::new("physics scene begin", move || {
            simulate_scene.backend.simulate(elapsed_time);
            Ok(())
        });

        let fetch_scene = Arc::clone(self);
        let end_task = Task::new("physics scene end", move || {
            fetch_scene.backend.fetch_results();
            Ok(())
        });

        begin_task.add_output_dependency(&end_task);
        (begin_task, end_task)
    }
}
