//! Task scheduling: a worker-thread pool executing a per-frame task graph.
//!
//! Tasks declare input/output dependencies; the scheduler guarantees a task
//! runs only after all of its input dependencies completed. A task runs to
//! completion on one worker; there is no cooperative yielding. Sync points
//! are [`Task::noop`] tasks that exist purely as dependency targets.
//!
//! The host drives frames: take a [`FrameFence`] from
//! [`TaskScheduler::begin_frame`], enqueue the frame's graph, then wait on
//! the fence. Tasks may enqueue further tasks (manager begin tasks spawn
//! their worker tasks); those join the same fence.

mod scheduler;
mod semaphore;

pub use scheduler::{FrameFence, Task, TaskScheduler};
pub use semaphore::Semaphore;
