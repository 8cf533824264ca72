//! Whole-engine frame tests
//!
//! Drives the assembled task graph for a few frames against the null
//! backends and checks the cross-subsystem wiring: manager ends ahead of the
//! frame graph, particle simulation advancing, render passes culling through
//! the scene's octree.

use std::sync::Arc;

use glam::Vec3;
use keel::engine::{Engine, EngineDescriptor};
use keel::math::Transform;
use keel::render::{FrameGraph, FrameView, NullRenderBackend, RenderPass};
use keel::render::passes::{OpaquePass, TonemappingPass};
use keel::scene::{Camera, GeometryData, Primitive, PrimitiveKind};
use keel::spatial::{AccelerationStructure, OctreeAccelerationStructure};
use keel::tasks::TaskScheduler;

// ============================================================================
// Engine frames
// ============================================================================

#[test]
fn engine_runs_frames_against_null_backends() {
    let render_backend = Arc::new(NullRenderBackend::default());
    let mut engine = Engine::new(EngineDescriptor {
        worker_count: 4,
        render_backend: Arc::clone(&render_backend) as Arc<_>,
        ..EngineDescriptor::default()
    });

    let root = engine.scene().root();
    engine
        .scene_mut()
        .add_child(
            root,
            Primitive::new(
                PrimitiveKind::Geometry(GeometryData::new(None, None, None)),
                Transform::from_translation(Vec3::new(0.0, 0.0, -5.0)),
            ),
        )
        .unwrap();

    for _ in 0..3 {
        assert!(engine.update(), "frame must complete without fatal errors");
    }

    assert_eq!(render_backend.frame_count(), 3);
    // Every pass submitted every frame.
    let passes_per_frame = engine.frame_graph().pass_count();
    assert_eq!(render_backend.submission_count(), passes_per_frame * 3);
}

#[test]
fn engine_streams_assets_across_frames() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("clip.kwa");

    let mut bytes = b"KWA ".to_vec();
    bytes.extend_from_slice(&1u32.to_le_bytes()); // joints
    bytes.extend_from_slice(&1u32.to_le_bytes()); // keyframes
    for value in [0.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    std::fs::write(&path, bytes).unwrap();

    let mut engine = Engine::new(EngineDescriptor {
        worker_count: 2,
        ..EngineDescriptor::default()
    });

    let handle = engine
        .animation_manager()
        .load(path.to_str().unwrap())
        .unwrap();
    assert!(!handle.is_loaded());

    assert!(engine.update());
    assert!(handle.is_loaded(), "requested before begin, loaded by end");
}

// ============================================================================
// Frame graph culling
// ============================================================================

#[test]
fn render_passes_cull_through_the_octree() {
    let scheduler = TaskScheduler::new(2);
    let backend = Arc::new(NullRenderBackend::default());

    let mut graph = FrameGraph::new(Arc::clone(&backend) as Arc<_>);
    graph.add_pass(Arc::new(OpaquePass));
    graph.add_pass(Arc::new(TonemappingPass::default()));

    let accel = Arc::new(OctreeAccelerationStructure::with_defaults());
    let mut keys: slotmap::SlotMap<keel::scene::PrimitiveKey, ()> =
        slotmap::SlotMap::with_key();
    let in_front = keys.insert(());
    accel.add(
        in_front,
        keel::math::Aabb::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE),
    );

    let mut camera = Camera::new(1.0, 1.0, 0.1, 200.0);
    camera.set_transform(Transform::IDENTITY);

    let view = FrameView {
        camera,
        geometry_accel: Some(accel),
        light_accel: None,
    };
    assert_eq!(view.visible_geometry(), vec![in_front]);

    let fence = scheduler.begin_frame();
    let tasks = graph.create_tasks(&view);
    for task in &tasks {
        scheduler.enqueue(task);
    }
    assert!(fence.wait());

    assert_eq!(backend.frame_count(), 1);
    assert_eq!(backend.submission_count(), 2);
}

#[test]
fn pass_chain_declares_swapchain_wiring() {
    let tonemapping = TonemappingPass::default();
    assert_eq!(tonemapping.color_attachments(), ["swapchain_attachment"]);

    let opaque = OpaquePass;
    assert_eq!(opaque.depth_stencil_attachment(), Some("depth_attachment"));
}
