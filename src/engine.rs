//! The host: constructs every subsystem and drives the per-frame task graph.

use std::sync::Arc;

use crate::assets::managers::{
    AnimationManager, BlendTreeManager, ContainerManager, GeometryManager, MaterialManager,
    MotionGraphManager, ParticleSystemManager, TextureManager,
};
use crate::assets::reflection::ReflectionContext;
use crate::memory::FrameArena;
use crate::particles::ParticleSystemPlayer;
use crate::physics::{HeightFieldManager, NullPhysicsBackend, PhysicsBackend, PhysicsScene};
use crate::render::{FrameGraph, FrameView, NullRenderBackend, RenderBackend};
use crate::render::passes::{
    AntialiasingPass, BloomPass, EmissionPass, ImguiPass, OpaquePass, TonemappingPass,
};
use crate::scene::{Scene, SceneDescriptor};
use crate::spatial::{LinearAccelerationStructure, OctreeAccelerationStructure};
use crate::tasks::TaskScheduler;
use crate::timer::Timer;

/// Engine construction parameters.
pub struct EngineDescriptor {
    /// Worker thread count (0 picks hardware parallelism).
    pub worker_count: usize,
    /// Frame-transient arena capacity in bytes.
    pub transient_arena_capacity: usize,
    /// The physics library.
    pub physics_backend: Arc<dyn PhysicsBackend>,
    /// The graphics library.
    pub render_backend: Arc<dyn RenderBackend>,
}

impl Default for EngineDescriptor {
    fn default() -> Self {
        Self {
            worker_count: 0,
            transient_arena_capacity: 16 * 1024 * 1024,
            physics_backend: Arc::new(NullPhysicsBackend),
            render_backend: Arc::new(NullRenderBackend::default()),
        }
    }
}

/// Owns every subsystem and assembles one frame's task graph:
///
/// ```text
/// timer.update
///   ├── per resource-manager: begin → workers → end
///   ├── particle-player.begin → workers → particle-player.end
///   ├── physics-scene.begin (simulate) → physics-scene.end (fetch)
///   └── frame-graph.acquire → render passes → frame-graph.present
/// ```
///
/// Every end node is a sync point; the frame-graph acquire orders itself
/// after all of them.
pub struct Engine {
    scheduler: Arc<TaskScheduler>,
    timer: Timer,
    transient_arena: FrameArena,

    animation_manager: Arc<AnimationManager>,
    geometry_manager: Arc<GeometryManager>,
    texture_manager: Arc<TextureManager>,
    material_manager: Arc<MaterialManager>,
    blend_tree_manager: Arc<BlendTreeManager>,
    motion_graph_manager: Arc<MotionGraphManager>,
    particle_system_manager: Arc<ParticleSystemManager>,
    container_manager: Arc<ContainerManager>,
    height_field_manager: Arc<HeightFieldManager>,

    particle_player: Arc<ParticleSystemPlayer>,
    physics_scene: Arc<PhysicsScene>,
    frame_graph: FrameGraph,
    scene: Scene,
}

impl Engine {
    /// Builds every subsystem and wires the default pass chain.
    #[must_use]
    pub fn new(descriptor: EngineDescriptor) -> Self {
        let scheduler = if descriptor.worker_count == 0 {
            TaskScheduler::with_hardware_parallelism()
        } else {
            TaskScheduler::new(descriptor.worker_count)
        };

        let animation_manager = AnimationManager::new(Arc::clone(&scheduler));
        let geometry_manager = GeometryManager::new(Arc::clone(&scheduler));
        let texture_manager = TextureManager::new(Arc::clone(&scheduler));
        let material_manager =
            MaterialManager::new(Arc::clone(&scheduler), Arc::clone(&texture_manager));
        let blend_tree_manager =
            BlendTreeManager::new(Arc::clone(&scheduler), Arc::clone(&animation_manager));
        let motion_graph_manager =
            MotionGraphManager::new(Arc::clone(&scheduler), Arc::clone(&blend_tree_manager));
        let particle_system_manager = ParticleSystemManager::new(
            Arc::clone(&scheduler),
            Arc::clone(&geometry_manager),
            Arc::clone(&material_manager),
        );
        let height_field_manager = HeightFieldManager::new(
            Arc::clone(&scheduler),
            Arc::clone(&descriptor.physics_backend),
        );
        let container_manager = ContainerManager::new(Arc::clone(&scheduler));
        container_manager.bind(ReflectionContext {
            animation: Arc::clone(&animation_manager),
            geometry: Arc::clone(&geometry_manager),
            material: Arc::clone(&material_manager),
            motion_graph: Arc::clone(&motion_graph_manager),
            particle_system: Arc::clone(&particle_system_manager),
            height_field: Arc::clone(&height_field_manager),
            container: Arc::downgrade(&container_manager),
        });

        let particle_player = ParticleSystemPlayer::new(Arc::clone(&scheduler));
        let physics_scene = PhysicsScene::new(Arc::clone(&descriptor.physics_backend));

        let geometry_accel = Arc::new(OctreeAccelerationStructure::with_defaults());
        let light_accel = Arc::new(LinearAccelerationStructure::new());

        let scene = Scene::new(SceneDescriptor {
            geometry_accel: Some(geometry_accel),
            light_accel: Some(light_accel),
            particle_player: Some(Arc::clone(&particle_player)),
            physics_scene: Some(Arc::clone(&physics_scene)),
            geometry_notifier: Some(Arc::clone(geometry_manager.notifier())),
            particle_notifier: Some(Arc::clone(particle_system_manager.notifier())),
            prototype_notifier: Some(Arc::clone(container_manager.notifier())),
            height_field_notifier: Some(Arc::clone(height_field_manager.notifier())),
        });

        let mut frame_graph = FrameGraph::new(descriptor.render_backend);
        frame_graph.add_pass(Arc::new(OpaquePass));
        frame_graph.add_pass(Arc::new(EmissionPass));
        for pass in BloomPass::build_chain(0.65) {
            frame_graph.add_pass(pass);
        }
        frame_graph.add_pass(Arc::new(TonemappingPass::default()));
        frame_graph.add_pass(Arc::new(AntialiasingPass));
        frame_graph.add_pass(Arc::new(ImguiPass));

        Self {
            scheduler,
            timer: Timer::new(),
            transient_arena: FrameArena::with_capacity(descriptor.transient_arena_capacity),
            animation_manager,
            geometry_manager,
            texture_manager,
            material_manager,
            blend_tree_manager,
            motion_graph_manager,
            particle_system_manager,
            container_manager,
            height_field_manager,
            particle_player,
            physics_scene,
            frame_graph,
            scene,
        }
    }

    /// Runs one frame. Returns `false` when a task hit the fatal path, in
    /// which case the host breaks the frame loop.
    pub fn update(&mut self) -> bool {
        self.timer.update();
        let elapsed_time = self.timer.elapsed_time();

        let _frame = self.transient_arena.reset();

        // Deferred notifier work and animation advance run on the host
        // thread before the frame's tasks see the scene.
        self.scene.update(elapsed_time);

        let fence = self.scheduler.begin_frame();

        let manager_pairs = [
            self.animation_manager.create_tasks(),
            self.geometry_manager.create_tasks(),
            self.texture_manager.create_tasks(),
            self.blend_tree_manager.create_tasks(),
            self.motion_graph_manager.create_tasks(),
            self.particle_system_manager.create_tasks(),
            self.container_manager.create_tasks(),
            self.height_field_manager.create_tasks(),
        ];
        let (material_begin, material_end, pipeline_end) = self.material_manager.create_tasks();
        let (player_begin, player_end) = self.particle_player.create_tasks(elapsed_time);
        let (physics_begin, physics_end) = self.physics_scene.create_tasks(elapsed_time);

        let view = FrameView {
            camera: self.scene.camera().clone(),
            geometry_accel: self.scene.geometry_accel(),
            light_accel: self.scene.light_accel(),
        };
        let frame_tasks = self.frame_graph.create_tasks(&view);
        let acquire = &frame_tasks[0];

        // Rendering consumes everything the frame produced.
        for (begin, end) in &manager_pairs {
            acquire.add_input_dependency(end);
            self.scheduler.enqueue_all(&[begin, end]);
        }
        acquire.add_input_dependency(&material_end);
        acquire.add_input_dependency(&pipeline_end);
        acquire.add_input_dependency(&player_end);
        acquire.add_input_dependency(&physics_end);
        self.scheduler
            .enqueue_all(&[&material_begin, &material_end, &pipeline_end]);
        self.scheduler.enqueue_all(&[&player_begin, &player_end]);
        self.scheduler.enqueue_all(&[&physics_begin, &physics_end]);

        for task in &frame_tasks {
            self.scheduler.enqueue(task);
        }

        fence.wait()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The scene.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The task scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    /// The frame timer.
    #[must_use]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// The frame-transient arena.
    #[must_use]
    pub fn transient_arena(&self) -> &FrameArena {
        &self.transient_arena
    }

    /// Animation manager.
    #[must_use]
    pub fn animation_manager(&self) -> &Arc<AnimationManager> {
        &self.animation_manager
    }

    /// Geometry manager.
    #[must_use]
    pub fn geometry_manager(&self) -> &Arc<GeometryManager> {
        &self.geometry_manager
    }

    /// Texture manager.
    #[must_use]
    pub fn texture_manager(&self) -> &Arc<TextureManager> {
        &self.texture_manager
    }

    /// Material manager.
    #[must_use]
    pub fn material_manager(&self) -> &Arc<MaterialManager> {
        &self.material_manager
    }

    /// Blend-tree manager.
    #[must_use]
    pub fn blend_tree_manager(&self) -> &Arc<BlendTreeManager> {
        &self.blend_tree_manager
    }

    /// Motion-graph manager.
    #[must_use]
    pub fn motion_graph_manager(&self) -> &Arc<MotionGraphManager> {
        &self.motion_graph_manager
    }

    /// Particle-system manager.
    #[must_use]
    pub fn particle_system_manager(&self) -> &Arc<ParticleSystemManager> {
        &self.particle_system_manager
    }

    /// Container-prototype manager.
    #[must_use]
    pub fn container_manager(&self) -> &Arc<ContainerManager> {
        &self.container_manager
    }

    /// Heightfield manager.
    #[must_use]
    pub fn height_field_manager(&self) -> &Arc<HeightFieldManager> {
        &self.height_field_manager
    }

    /// Particle player.
    #[must_use]
    pub fn particle_player(&self) -> &Arc<ParticleSystemPlayer> {
        &self.particle_player
    }

    /// Physics scene.
    #[must_use]
    pub fn physics_scene(&self) -> &Arc<PhysicsScene> {
        &self.physics_scene
    }

    /// Frame graph.
    #[must_use]
    pub fn frame_graph(&self) -> &FrameGraph {
        &self.frame_graph
    }
}
