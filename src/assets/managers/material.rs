use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::binary::TextureManager;
use crate::assets::handle::ResourceHandle;
use crate::assets::notifier::ResourceNotifier;
use crate::assets::registry::ResourceRegistry;
use crate::errors::KeelError;
use crate::resources::material::{GraphicsPipeline, Material};
use crate::tasks::{Task, TaskScheduler};

#[derive(Deserialize)]
struct MaterialFile {
    vertex_shader: String,
    #[serde(default)]
    fragment_shader: String,
    #[serde(default)]
    textures: Vec<String>,
    #[serde(default)]
    is_skinned: bool,
    #[serde(default)]
    is_particle: bool,
    #[serde(default)]
    is_shadow: bool,
}

/// Streams material resource files and owns the graphics-pipeline cache.
///
/// Material loading runs in two stages so texture streaming overlaps
/// pipeline creation: the markdown worker parses the file and routes texture
/// references through the texture manager (done at `material_end`), then a
/// pipeline task compiles or reuses the pipeline and completes the material
/// (done at `pipeline_end`). Pipelines are shared by identity and evicted
/// one frame after the last material using them, like any other entry.
pub struct MaterialManager {
    registry: ResourceRegistry<Material>,
    notifier: Arc<ResourceNotifier<Material>>,
    scheduler: Arc<TaskScheduler>,
    texture_manager: Arc<TextureManager>,
    pipelines: Mutex<FxHashMap<GraphicsPipeline, Arc<GraphicsPipeline>>>,
}

impl MaterialManager {
    /// Creates the material manager.
    #[must_use]
    pub fn new(scheduler: Arc<TaskScheduler>, texture_manager: Arc<TextureManager>) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            texture_manager,
            pipelines: Mutex::new(FxHashMap::default()),
        })
    }

    /// Looks up or enqueues a material; an empty path yields the null
    /// handle.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<Material>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier. Fires once the pipeline stage completed.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<Material>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<Material>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Number of live material entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the manager holds no materials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of cached graphics pipelines.
    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.lock().len()
    }

    /// Looks a pipeline up in the cache, compiling it on a miss.
    fn resolve_pipeline(&self, key: GraphicsPipeline) -> Arc<GraphicsPipeline> {
        let mut pipelines = self.pipelines.lock();
        Arc::clone(
            pipelines
                .entry(key.clone())
                .or_insert_with(|| Arc::new(key)),
        )
    }

    /// Builds this frame's `(begin, material_end, pipeline_end)` tasks.
    ///
    /// Downstream texture consumers order themselves after `material_end`;
    /// consumers that draw with the material order themselves after
    /// `pipeline_end`.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task, Task) {
        let material_end = Task::noop("material manager end");
        let pipeline_end = Task::noop("graphics pipeline end");

        let manager = Arc::clone(self);
        let begin_material_end = material_end.clone();
        let begin_pipeline_end = pipeline_end.clone();
        let begin_task = Task::new("material manager begin", move || {
            // A pipeline lives one frame past its last material.
            manager
                .pipelines
                .lock()
                .retain(|_, pipeline| Arc::strong_count(pipeline) > 1);

            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker_pipeline_end = begin_pipeline_end.clone();
                let worker = Task::new("material manager worker", move || {
                    let text = std::fs::read_to_string(&path)
                        .map_err(|error| KeelError::asset(&path, format!("failed to open: {error}")))?;
                    let file: MaterialFile = serde_json::from_str(&text)?;

                    let (material, pipeline_key) =
                        material_from_file(&worker_manager.texture_manager, file);

                    // Stage one: textures are now requested and visible.
                    handle.publish(material);

                    // Stage two runs in parallel with texture streaming.
                    let pipeline_manager = Arc::clone(&worker_manager);
                    let pipeline_handle = Arc::clone(&handle);
                    let pipeline_task = Task::new("graphics pipeline worker", move || {
                        let pipeline = pipeline_manager.resolve_pipeline(pipeline_key);

                        let mut material = pipeline_handle.read().clone();
                        material.attach_graphics_pipeline(pipeline);
                        pipeline_handle.publish(material);

                        pipeline_manager.notifier.notify(&pipeline_handle);
                        Ok(())
                    });
                    pipeline_task.add_output_dependencies(&[&worker_pipeline_end]);
                    worker_manager.scheduler.enqueue(&pipeline_task);

                    Ok(())
                });
                worker.add_output_dependencies(&[&begin_material_end]);
                manager.scheduler.enqueue(&worker);
            }
            Ok(())
        });

        begin_task.add_output_dependency(&material_end);
        // Pipeline tasks are wired before their markdown worker completes,
        // so gating on material_end keeps pipeline_end behind all of them.
        material_end.add_output_dependency(&pipeline_end);

        (begin_task, material_end, pipeline_end)
    }
}

fn material_from_file(
    texture_manager: &TextureManager,
    file: MaterialFile,
) -> (Material, GraphicsPipeline) {
    let textures = file
        .textures
        .iter()
        .filter_map(|texture_path| texture_manager.load(texture_path))
        .collect();

    let pipeline_key = GraphicsPipeline {
        vertex_shader: file.vertex_shader,
        fragment_shader: file.fragment_shader,
        is_skinned: file.is_skinned,
        is_particle: file.is_particle,
        is_shadow: file.is_shadow,
    };

    (Material::with_textures(textures), pipeline_key)
}
