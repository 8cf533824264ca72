use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::errors::Result;

type TaskFn = Box<dyn FnOnce() -> Result<()> + Send>;

struct TaskInner {
    name: &'static str,
    work: Mutex<Option<TaskFn>>,
    /// Input dependencies that have not completed yet.
    blockers: AtomicUsize,
    /// Tasks waiting on this one. Guarded together with `completed`: the
    /// completion drain and dependency wiring race otherwise.
    dependents: Mutex<Vec<Arc<TaskInner>>>,
    completed: AtomicBool,
    /// Set once the task was handed to the scheduler.
    enqueued: AtomicBool,
    /// Set once the task was pushed to the worker channel.
    scheduled: AtomicBool,
    fence: Mutex<Option<Arc<FenceInner>>>,
}

/// A unit of work with dependency edges.
///
/// Cloning a task clones the handle, not the work; the underlying node runs
/// exactly once.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskInner>,
}

impl Task {
    /// Creates a task from a closure. The closure's error is the fatal path:
    /// it is logged and poisons the frame fence.
    pub fn new(name: &'static str, work: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                name,
                work: Mutex::new(Some(Box::new(work))),
                blockers: AtomicUsize::new(0),
                dependents: Mutex::new(Vec::new()),
                completed: AtomicBool::new(false),
                enqueued: AtomicBool::new(false),
                scheduled: AtomicBool::new(false),
                fence: Mutex::new(None),
            }),
        }
    }

    /// Creates a no-op task that exists as a synchronization point.
    pub fn noop(name: &'static str) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                name,
                work: Mutex::new(None),
                blockers: AtomicUsize::new(0),
                dependents: Mutex::new(Vec::new()),
                completed: AtomicBool::new(false),
                enqueued: AtomicBool::new(false),
                scheduled: AtomicBool::new(false),
                fence: Mutex::new(None),
            }),
        }
    }

    /// Task name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Declares that `self` must run after `dependency`.
    ///
    /// A dependency that already completed adds no edge.
    pub fn add_input_dependency(&self, dependency: &Task) {
        let mut dependents = dependency.inner.dependents.lock();
        if dependency.inner.completed.load(Ordering::Acquire) {
            return;
        }
        self.inner.blockers.fetch_add(1, Ordering::AcqRel);
        dependents.push(Arc::clone(&self.inner));
    }

    /// Declares that `dependent` must run after `self`.
    pub fn add_output_dependency(&self, dependent: &Task) {
        dependent.add_input_dependency(self);
    }

    /// Declares output dependencies in bulk.
    pub fn add_output_dependencies(&self, dependents: &[&Task]) {
        for dependent in dependents {
            dependent.add_input_dependency(self);
        }
    }
}

// ============================================================================
// Frame fence
// ============================================================================

struct FenceInner {
    remaining: Mutex<usize>,
    condvar: Condvar,
    poisoned: AtomicBool,
}

impl FenceInner {
    fn register(&self) {
        *self.remaining.lock() += 1;
    }

    fn complete(&self) {
        let mut remaining = self.remaining.lock();
        *remaining -= 1;
        if *remaining == 0 {
            self.condvar.notify_all();
        }
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::Release);
    }
}

/// Join handle for one frame's task graph.
#[derive(Clone)]
pub struct FrameFence {
    inner: Arc<FenceInner>,
}

impl FrameFence {
    /// Blocks until every task enqueued against this fence completed.
    ///
    /// Returns `false` if any task hit the fatal path; the host should break
    /// the frame loop.
    pub fn wait(&self) -> bool {
        let mut remaining = self.inner.remaining.lock();
        while *remaining > 0 {
            self.inner.condvar.wait(&mut remaining);
        }
        !self.inner.poisoned.load(Ordering::Acquire)
    }
}

// ============================================================================
// Scheduler
// ============================================================================

enum Message {
    Run(Arc<TaskInner>),
    Shutdown,
}

/// Multi-threaded task scheduler.
///
/// Tasks are wired with dependencies first, then enqueued; an enqueued task
/// is pushed to the worker channel once its last blocker completes. Two tasks
/// with no declared dependency may run in any order or in parallel.
pub struct TaskScheduler {
    sender: flume::Sender<Message>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    current_fence: Mutex<Arc<FenceInner>>,
}

impl TaskScheduler {
    /// Spawns `worker_count` worker threads (at least one).
    #[must_use]
    pub fn new(worker_count: usize) -> Arc<Self> {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = flume::unbounded::<Message>();

        let scheduler = Arc::new(Self {
            sender: sender.clone(),
            workers: Mutex::new(Vec::with_capacity(worker_count)),
            current_fence: Mutex::new(Arc::new(FenceInner {
                remaining: Mutex::new(0),
                condvar: Condvar::new(),
                poisoned: AtomicBool::new(false),
            })),
        });

        let mut workers = scheduler.workers.lock();
        for index in 0..worker_count {
            let receiver = receiver.clone();
            let sender = sender.clone();
            workers.push(
                std::thread::Builder::new()
                    .name(format!("keel-worker-{index}"))
                    .spawn(move || worker_loop(&receiver, &sender))
                    .expect("failed to spawn worker thread"),
            );
        }
        drop(workers);

        scheduler
    }

    /// Scheduler sized to the machine: one worker per core minus the host
    /// thread.
    #[must_use]
    pub fn with_hardware_parallelism() -> Arc<Self> {
        let cores = std::thread::available_parallelism().map_or(1, std::num::NonZero::get);
        Self::new(cores.saturating_sub(1).max(1))
    }

    /// Starts a new frame: subsequently enqueued tasks join the returned
    /// fence.
    pub fn begin_frame(&self) -> FrameFence {
        let fence = Arc::new(FenceInner {
            remaining: Mutex::new(0),
            condvar: Condvar::new(),
            poisoned: AtomicBool::new(false),
        });
        *self.current_fence.lock() = Arc::clone(&fence);
        FrameFence { inner: fence }
    }

    /// Enqueues a task. It runs as soon as all of its input dependencies
    /// completed.
    pub fn enqueue(&self, task: &Task) {
        // The fence must be attached before the task becomes schedulable: a
        // dependency completing in between would otherwise run it fenceless.
        let fence = Arc::clone(&self.current_fence.lock());
        fence.register();
        *task.inner.fence.lock() = Some(fence);

        let already_enqueued = task.inner.enqueued.swap(true, Ordering::AcqRel);
        debug_assert!(
            !already_enqueued,
            "task \"{}\" enqueued twice",
            task.inner.name
        );

        if task.inner.blockers.load(Ordering::Acquire) == 0 {
            try_schedule(&task.inner, &self.sender);
        }
    }

    /// Enqueues several tasks.
    pub fn enqueue_all(&self, tasks: &[&Task]) {
        for task in tasks {
            self.enqueue(task);
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        for _ in 0..workers.len() {
            let _ = self.sender.send(Message::Shutdown);
        }
        for worker in workers {
            let _ = worker.join();
        }
    }
}

fn try_schedule(inner: &Arc<TaskInner>, sender: &flume::Sender<Message>) {
    if inner
        .scheduled
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        let _ = sender.send(Message::Run(Arc::clone(inner)));
    }
}

fn worker_loop(receiver: &flume::Receiver<Message>, sender: &flume::Sender<Message>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(task) => run_task(&task, sender),
            Message::Shutdown => break,
        }
    }
}

fn run_task(inner: &Arc<TaskInner>, sender: &flume::Sender<Message>) {
    let fence = inner.fence.lock().take();

    let work = inner.work.lock().take();
    if let Some(work) = work
        && let Err(error) = work()
    {
        log::error!("task \"{}\" failed: {error}", inner.name);
        if let Some(fence) = &fence {
            fence.poison();
        }
    }

    // Publish completion and release dependents under the same lock that
    // dependency wiring takes.
    let dependents = {
        let mut dependents = inner.dependents.lock();
        inner.completed.store(true, Ordering::Release);
        std::mem::take(&mut *dependents)
    };

    for dependent in dependents {
        if dependent.blockers.fetch_sub(1, Ordering::AcqRel) == 1
            && dependent.enqueued.load(Ordering::Acquire)
        {
            try_schedule(&dependent, sender);
        }
    }

    if let Some(fence) = fence {
        fence.complete();
    }
}
