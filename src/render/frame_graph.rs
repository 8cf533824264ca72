use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::Result;
use crate::scene::{Camera, PrimitiveKey};
use crate::spatial::AccelerationStructure;
use crate::tasks::Task;

/// Everything a pass needs from the scene for one frame: a camera snapshot
/// plus the thread-safe acceleration structures to cull against.
#[derive(Clone)]
pub struct FrameView {
    /// Render camera snapshot.
    pub camera: Camera,
    /// Geometry and particle primitives.
    pub geometry_accel: Option<Arc<dyn AccelerationStructure>>,
    /// Light primitives.
    pub light_accel: Option<Arc<dyn AccelerationStructure>>,
}

impl FrameView {
    /// Culls geometry against the camera frustum.
    #[must_use]
    pub fn visible_geometry(&self) -> Vec<PrimitiveKey> {
        let mut output = Vec::with_capacity(64);
        if let Some(accel) = &self.geometry_accel {
            accel.query_frustum(&self.camera.frustum(), &mut output);
        }
        output
    }

    /// Culls lights against the camera frustum.
    #[must_use]
    pub fn visible_lights(&self) -> Vec<PrimitiveKey> {
        let mut output = Vec::with_capacity(16);
        if let Some(accel) = &self.light_accel {
            accel.query_frustum(&self.camera.frustum(), &mut output);
        }
        output
    }
}

/// One pass's submission: its attachments and the primitives it draws
/// (empty for full-screen passes).
pub struct PassSubmission<'a> {
    /// Color attachments written, in slot order.
    pub color_attachments: &'a [&'static str],
    /// Depth-stencil attachment, if any.
    pub depth_stencil_attachment: Option<&'static str>,
    /// Primitives to draw.
    pub primitives: &'a [PrimitiveKey],
}

/// The external graphics backend: swapchain plus pass execution.
pub trait RenderBackend: Send + Sync {
    /// Acquires the next swapchain image. First frame-graph task.
    fn acquire(&self) -> Result<()>;

    /// Executes one pass. Called between acquire and present, in pass order.
    fn submit(&self, pass: &'static str, submission: &PassSubmission<'_>) -> Result<()>;

    /// Presents the frame. Last frame-graph task.
    fn present(&self) -> Result<()>;
}

/// One node of the pass chain.
pub trait RenderPass: Send + Sync {
    /// Pass name, also the backend's pipeline lookup key.
    fn name(&self) -> &'static str;

    /// Color attachments this pass writes.
    fn color_attachments(&self) -> &'static [&'static str];

    /// Depth-stencil attachment this pass writes, if any.
    fn depth_stencil_attachment(&self) -> Option<&'static str> {
        None
    }

    /// Culls and submits this pass's work.
    fn execute(&self, view: &FrameView, backend: &dyn RenderBackend) -> Result<()>;
}

/// The fixed pass chain between swapchain acquire and present.
///
/// `create_tasks` turns the chain into a linear task sequence: acquire, one
/// task per pass in declared order, present. The host orders acquire after
/// the frame's producer tasks (manager ends, particle player end, physics
/// end).
pub struct FrameGraph {
    backend: Arc<dyn RenderBackend>,
    passes: Vec<Arc<dyn RenderPass>>,
}

impl FrameGraph {
    /// Creates an empty frame graph over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            backend,
            passes: Vec::new(),
        }
    }

    /// Appends a pass; passes run in insertion order.
    pub fn add_pass(&mut self, pass: Arc<dyn RenderPass>) {
        self.passes.push(pass);
    }

    /// Number of passes.
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Builds this frame's task chain, fully wired. The first task is the
    /// swapchain acquire, the last the present; the caller enqueues all of
    /// them.
    #[must_use]
    pub fn create_tasks(&self, view: &FrameView) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(self.passes.len() + 2);

        let acquire_backend = Arc::clone(&self.backend);
        tasks.push(Task::new("frame graph acquire", move || {
            acquire_backend.acquire()
        }));

        for pass in &self.passes {
            let pass = Arc::clone(pass);
            let backend = Arc::clone(&self.backend);
            let view = view.clone();
            let task = Task::new(pass.name(), move || pass.execute(&view, backend.as_ref()));
            task.add_input_dependency(tasks.last().expect("acquire exists"));
            tasks.push(task);
        }

        let present_backend = Arc::clone(&self.backend);
        let present = Task::new("frame graph present", move || present_backend.present());
        present.add_input_dependency(tasks.last().expect("chain is never empty"));
        tasks.push(present);

        tasks
    }
}

/// Backend used headless and in tests: counts calls, draws nothing.
#[derive(Default)]
pub struct NullRenderBackend {
    frames: AtomicUsize,
    submissions: AtomicUsize,
}

impl NullRenderBackend {
    /// Frames presented so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.load(Ordering::Relaxed)
    }

    /// Passes submitted so far.
    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::Relaxed)
    }
}

impl RenderBackend for NullRenderBackend {
    fn acquire(&self) -> Result<()> {
        Ok(())
    }

    fn submit(&self, _pass: &'static str, _submission: &PassSubmission<'_>) -> Result<()> {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn present(&self) -> Result<()> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
