use std::sync::Arc;

use parking_lot::RwLock;

use super::state::ParticleEffectState;
use crate::tasks::{Task, TaskScheduler};

/// Per-frame driver of every particle-system primitive.
///
/// The player keeps a sparse slot sequence: removal leaves a hole that the
/// next add reuses, so the slot indices the worker tasks capture stay stable
/// and the vector never churns.
pub struct ParticleSystemPlayer {
    scheduler: Arc<TaskScheduler>,
    primitives: RwLock<Vec<Option<Arc<ParticleEffectState>>>>,
}

impl ParticleSystemPlayer {
    /// Creates a player submitting work to `scheduler`.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>) -> Arc<Self> {
        Arc::new(Self {
            scheduler,
            primitives: RwLock::new(Vec::with_capacity(32)),
        })
    }

    /// Registers an effect, reusing the first free slot.
    pub fn add(&self, effect: Arc<ParticleEffectState>) {
        let mut primitives = self.primitives.write();

        for slot in primitives.iter_mut() {
            if slot.is_none() {
                *slot = Some(effect);
                return;
            }
        }

        primitives.push(Some(effect));
    }

    /// Unregisters an effect, leaving a hole.
    pub fn remove(&self, effect: &Arc<ParticleEffectState>) {
        let mut primitives = self.primitives.write();
        for slot in primitives.iter_mut() {
            if slot
                .as_ref()
                .is_some_and(|stored| Arc::ptr_eq(stored, effect))
            {
                *slot = None;
                return;
            }
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.read().iter().flatten().count()
    }

    /// Whether no effect is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds this frame's `(begin, end)` task pair.
    ///
    /// The begin task spawns one worker per occupied slot with an output
    /// dependency on the end task; each worker runs the kill/emit/update
    /// pipeline of its effect with the frame's `elapsed_time`.
    pub fn create_tasks(self: &Arc<Self>, elapsed_time: f32) -> (Task, Task) {
        let end_task = Task::noop("particle system player end");

        let player = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new("particle system player begin", move || {
            let primitives = player.primitives.read();

            for effect in primitives.iter().flatten() {
                let effect = Arc::clone(effect);
                let worker = Task::new("particle system player worker", move || {
                    effect.simulate(elapsed_time);
                    Ok(())
                });
                worker.add_output_dependencies(&[&begin_end]);
                player.scheduler.enqueue(&worker);
            }

            Ok(())
        });

        begin_task.add_output_dependency(&end_task);
        (begin_task, end_task)
    }
}
