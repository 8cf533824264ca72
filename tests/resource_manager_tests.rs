//! Resource manager tests
//!
//! Tests for:
//! - Handle deduplication and the null handle
//! - The begin/worker/end frame protocol over real files
//! - Refcount-based eviction, deferred by one frame
//! - The material/pipeline two-stage load and staggered eviction
//! - Cross-manager loads landing on the next frame
//! - Binary format parsing (.kwa/.kwg/.kwt) and the heightfield TSV

use std::sync::Arc;

use glam::Vec3;
use keel::assets::managers::{
    AnimationManager, BlendTreeManager, ContainerManager, GeometryManager, MaterialManager,
    MotionGraphManager, ParticleSystemManager, TextureManager,
};
use keel::assets::reflection::ReflectionContext;
use keel::assets::{Resource, ResourceHandle};
use keel::math::Transform;
use keel::physics::{HeightFieldManager, NullPhysicsBackend};
use keel::resources::TextureFormat;
use keel::scene::{ContainerData, Primitive, PrimitiveKind, Scene, SceneDescriptor};
use keel::tasks::{Task, TaskScheduler};
use rustc_hash::FxHashMap;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn run_pair(scheduler: &Arc<TaskScheduler>, pair: (Task, Task)) -> bool {
    let fence = scheduler.begin_frame();
    let (begin, end) = pair;
    scheduler.enqueue_all(&[&begin, &end]);
    fence.wait()
}

fn push_f32(bytes: &mut Vec<u8>, value: f32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

/// Builds a `.kwa` file: per joint a list of `(timestamp, translation)`
/// keyframes with identity rotation and unit scale.
fn kwa_bytes(tracks: &[Vec<(f32, Vec3)>]) -> Vec<u8> {
    let mut bytes = b"KWA ".to_vec();
    push_u32(&mut bytes, tracks.len() as u32);
    for track in tracks {
        push_u32(&mut bytes, track.len() as u32);
        for (timestamp, translation) in track {
            push_f32(&mut bytes, *timestamp);
            push_f32(&mut bytes, translation.x);
            push_f32(&mut bytes, translation.y);
            push_f32(&mut bytes, translation.z);
            for component in [0.0, 0.0, 0.0, 1.0] {
                push_f32(&mut bytes, component);
            }
            for component in [1.0, 1.0, 1.0] {
                push_f32(&mut bytes, component);
            }
        }
    }
    bytes
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path.to_str().unwrap().to_owned()
}

// ============================================================================
// Load protocol
// ============================================================================

#[test]
fn load_deduplicates_by_path() {
    let scheduler = TaskScheduler::new(2);
    let manager = AnimationManager::new(scheduler);

    let first = manager.load("anims/walk.kwa").unwrap();
    let second = manager.load("anims/walk.kwa").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.len(), 1);

    assert_eq!(
        manager.relative_path(&first).as_deref(),
        Some("anims/walk.kwa")
    );
}

#[test]
fn empty_path_yields_null_handle() {
    let scheduler = TaskScheduler::new(2);
    let manager = AnimationManager::new(scheduler);
    assert!(manager.load("").is_none());
}

#[test]
fn animation_loads_after_end_and_normalizes_time() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "idle.kwa",
        &kwa_bytes(&[vec![
            (0.0, Vec3::ZERO),
            (2.0, Vec3::new(2.0, 0.0, 0.0)),
        ]]),
    );

    let scheduler = TaskScheduler::new(2);
    let manager = AnimationManager::new(Arc::clone(&scheduler));

    let handle = manager.load(&path).unwrap();
    assert!(!handle.is_loaded());

    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert!(handle.is_loaded());

    let animation = handle.read();
    assert!((animation.duration() - 2.0).abs() < 1e-5);

    // Sampling at 3.0 wraps to 1.0.
    let sampled = animation.joint_transform(0, 3.0);
    assert!((sampled.translation.x - 1.0).abs() < 1e-4);
}

#[test]
fn missing_file_hits_the_fatal_path() {
    let _ = env_logger::builder().is_test(true).try_init();

    let scheduler = TaskScheduler::new(2);
    let manager = AnimationManager::new(Arc::clone(&scheduler));

    let handle = manager.load("does/not/exist.kwa").unwrap();
    // The load itself succeeds; the failure surfaces at worker time.
    assert!(!run_pair(&scheduler, manager.create_tasks()));
    assert!(!handle.is_loaded());
}

#[test]
fn eviction_is_refcount_based_and_deferred() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "clip.kwa", &kwa_bytes(&[vec![(0.0, Vec3::ZERO)]]));

    let scheduler = TaskScheduler::new(2);
    let manager = AnimationManager::new(Arc::clone(&scheduler));

    let handle = manager.load(&path).unwrap();
    assert!(run_pair(&scheduler, manager.create_tasks()));

    // A handle held by user code survives frames.
    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert_eq!(manager.len(), 1);

    // Once only the manager holds it, the next begin evicts.
    drop(handle);
    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert_eq!(manager.len(), 0);
}

#[test]
fn notifier_fires_when_worker_publishes() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "clip.kwa", &kwa_bytes(&[vec![(0.0, Vec3::ZERO)]]));

    let scheduler = TaskScheduler::new(2);
    let manager = AnimationManager::new(Arc::clone(&scheduler));

    let handle = manager.load(&path).unwrap();

    let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    manager
        .notifier()
        .subscribe(&handle, keel::assets::ListenerToken(1), move |resource| {
            assert!(resource.is_loaded());
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });

    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert!(fired.load(std::sync::atomic::Ordering::SeqCst));
}

// ============================================================================
// Geometry (.kwg)
// ============================================================================

fn kwg_bytes() -> Vec<u8> {
    let mut bytes = b"KWG ".to_vec();
    push_u32(&mut bytes, 3); // vertices
    push_u32(&mut bytes, 3); // skinned vertices
    push_u32(&mut bytes, 3); // indices
    push_u32(&mut bytes, 2); // joints

    // Bounds: center + extent.
    for value in [0.0, 0.0, 0.0, 1.0, 1.0, 1.0] {
        push_f32(&mut bytes, value);
    }

    for index in 0..3 {
        // position, normal, tangent, texcoord
        for value in [
            index as f32,
            0.0,
            0.0,
            0.0,
            1.0,
            0.0,
            1.0,
            0.0,
            0.0,
            1.0,
            0.0,
            0.0,
        ] {
            push_f32(&mut bytes, value);
        }
    }

    // Skinned vertices: joints + weights.
    for _ in 0..3 {
        bytes.extend_from_slice(&[0, 1, 0, 0]);
        bytes.extend_from_slice(&[255, 0, 0, 0]);
    }

    // u16 indices (vertex count < 65535).
    for index in [0u16, 1, 2] {
        bytes.extend_from_slice(&index.to_le_bytes());
    }

    // Joint parents: root sentinel then joint 0.
    push_u32(&mut bytes, u32::MAX);
    push_u32(&mut bytes, 0);

    // Inverse bind and bind matrices: identity.
    for _ in 0..4 {
        for index in 0..16 {
            push_f32(&mut bytes, if index % 5 == 0 { 1.0 } else { 0.0 });
        }
    }

    // Joint names.
    for name in ["root", "tip"] {
        push_u32(&mut bytes, name.len() as u32);
        bytes.extend_from_slice(name.as_bytes());
    }

    bytes
}

#[test]
fn geometry_parses_vertices_indices_and_skeleton() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "mesh.kwg", &kwg_bytes());

    let scheduler = TaskScheduler::new(2);
    let manager = GeometryManager::new(Arc::clone(&scheduler));

    let handle = manager.load(&path).unwrap();
    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert!(handle.is_loaded());

    let geometry = handle.read();
    assert_eq!(geometry.vertices().len(), 3);
    assert!((geometry.vertices()[2].position[0] - 2.0).abs() < 1e-6);
    assert_eq!(geometry.skinned_vertices().len(), 3);
    assert_eq!(geometry.indices().len(), 3);

    let skeleton = geometry.skeleton().unwrap();
    assert_eq!(skeleton.joint_count(), 2);
    assert_eq!(skeleton.parent_joint(0), None);
    assert_eq!(skeleton.parent_joint(1), Some(0));
    assert_eq!(skeleton.joint_by_name("tip"), Some(1));
}

#[test]
fn truncated_geometry_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let mut bytes = kwg_bytes();
    bytes.truncate(bytes.len() / 2);
    let path = write_file(&dir, "broken.kwg", &bytes);

    let scheduler = TaskScheduler::new(2);
    let manager = GeometryManager::new(Arc::clone(&scheduler));

    let handle = manager.load(&path).unwrap();
    assert!(!run_pair(&scheduler, manager.create_tasks()));
    assert!(!handle.is_loaded());
}

// ============================================================================
// Texture (.kwt)
// ============================================================================

#[test]
fn texture_parses_header_and_mips_smallest_first() {
    let mut bytes = b"KWT ".to_vec();
    push_u32(&mut bytes, 0); // 2D
    push_u32(&mut bytes, 8); // Rgba8Unorm
    push_u32(&mut bytes, 2); // mips
    push_u32(&mut bytes, 1); // layers
    push_u32(&mut bytes, 4); // width
    push_u32(&mut bytes, 4); // height
    push_u32(&mut bytes, 1); // depth

    // Smallest mip first: 2x2, then 4x4.
    bytes.extend(std::iter::repeat_n(0xAAu8, 2 * 2 * 4));
    bytes.extend(std::iter::repeat_n(0xBBu8, 4 * 4 * 4));

    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "albedo.kwt", &bytes);

    let scheduler = TaskScheduler::new(2);
    let manager = TextureManager::new(Arc::clone(&scheduler));

    let handle = manager.load(&path).unwrap();
    assert!(run_pair(&scheduler, manager.create_tasks()));

    let texture = handle.read();
    assert_eq!(texture.format(), TextureFormat::Rgba8Unorm);
    assert_eq!(texture.mip_level_count(), 2);
    assert_eq!(texture.mip_data(0).len(), 64);
    assert_eq!(texture.mip_data(0)[0], 0xBB);
    assert_eq!(texture.mip_data(1).len(), 16);
    assert_eq!(texture.mip_data(1)[0], 0xAA);
}

#[test]
fn compressed_format_sizes_use_block_math() {
    // BC1: 8 bytes per 4x4 block.
    assert_eq!(TextureFormat::Bc1Unorm.data_size(8, 8, 1), Some(32));
    // Sub-block sizes round up to one block.
    assert_eq!(TextureFormat::Bc7Unorm.data_size(2, 2, 1), Some(16));
}

// ============================================================================
// Material + pipeline staging
// ============================================================================

fn run_material_frame(scheduler: &Arc<TaskScheduler>, manager: &Arc<MaterialManager>) -> bool {
    let fence = scheduler.begin_frame();
    let (begin, material_end, pipeline_end) = manager.create_tasks();
    scheduler.enqueue_all(&[&begin, &material_end, &pipeline_end]);
    fence.wait()
}

#[test]
fn material_and_pipeline_evict_one_frame_apart() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "a.mdl",
        br#"{ "vertex_shader": "geometry.vert", "fragment_shader": "lit.frag" }"#,
    );

    let scheduler = TaskScheduler::new(2);
    let texture_manager = TextureManager::new(Arc::clone(&scheduler));
    let manager = MaterialManager::new(Arc::clone(&scheduler), texture_manager);

    let handle = manager.load(&path).unwrap();
    assert!(run_material_frame(&scheduler, &manager));

    assert!(handle.is_loaded(), "pipeline stage completed within the frame");
    let pipeline = handle.read().graphics_pipeline().cloned().unwrap();
    assert_eq!(pipeline.vertex_shader, "geometry.vert");
    assert_eq!(manager.pipeline_count(), 1);

    // Drop the user handle: the material goes first, its pipeline one frame
    // later.
    drop(handle);
    assert!(run_material_frame(&scheduler, &manager));
    assert_eq!(manager.len(), 0);
    assert_eq!(manager.pipeline_count(), 1);

    assert!(run_material_frame(&scheduler, &manager));
    assert_eq!(manager.pipeline_count(), 0);
}

#[test]
fn materials_share_identical_pipelines() {
    let dir = TempDir::new().unwrap();
    let body = br#"{ "vertex_shader": "geometry.vert", "fragment_shader": "lit.frag" }"#;
    let first_path = write_file(&dir, "a.mdl", body);
    let second_path = write_file(&dir, "b.mdl", body);

    let scheduler = TaskScheduler::new(2);
    let texture_manager = TextureManager::new(Arc::clone(&scheduler));
    let manager = MaterialManager::new(Arc::clone(&scheduler), texture_manager);

    let first = manager.load(&first_path).unwrap();
    let second = manager.load(&second_path).unwrap();
    assert!(run_material_frame(&scheduler, &manager));

    let first_pipeline = first.read().graphics_pipeline().cloned().unwrap();
    let second_pipeline = second.read().graphics_pipeline().cloned().unwrap();
    assert!(Arc::ptr_eq(&first_pipeline, &second_pipeline));
    assert_eq!(manager.pipeline_count(), 1);
}

// ============================================================================
// Cross-manager loads
// ============================================================================

#[test]
fn blend_tree_pulls_animations_on_the_next_frame() {
    let dir = TempDir::new().unwrap();
    let animation_path = write_file(
        &dir,
        "idle.kwa",
        &kwa_bytes(&[vec![(0.0, Vec3::new(5.0, 0.0, 0.0))]]),
    );
    let tree_path = write_file(
        &dir,
        "idle.kbt",
        format!(r#"{{ "type": "animation", "animation": "{}" }}"#, animation_path.replace('\\', "/"))
            .as_bytes(),
    );

    let scheduler = TaskScheduler::new(2);
    let animation_manager = AnimationManager::new(Arc::clone(&scheduler));
    let manager = BlendTreeManager::new(Arc::clone(&scheduler), Arc::clone(&animation_manager));

    let handle = manager.load(&tree_path).unwrap();

    // Frame 1 loads the tree; the animation it referenced is now pending.
    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert!(handle.is_loaded());
    assert_eq!(animation_manager.len(), 1);

    // Frame 2 materializes the animation.
    assert!(run_pair(&scheduler, animation_manager.create_tasks()));

    let attributes = FxHashMap::default();
    let pose = handle.read().compute(&keel::animation::BlendTreeContext {
        attributes: &attributes,
        timestamp: 0.0,
    });
    assert!((pose.joint_space_transforms()[0].translation.x - 5.0).abs() < 1e-4);
}

#[test]
fn motion_graph_parses_motions_and_transitions() {
    let dir = TempDir::new().unwrap();
    let graph_path = write_file(
        &dir,
        "locomotion.kmg",
        br#"{
            "default": "idle",
            "motions": {
                "idle": { "blend_tree": "", "duration": 2.0 },
                "jump": { "blend_tree": "", "duration": 1.0 }
            },
            "transitions": [
                {
                    "sources": ["idle"],
                    "destination": "jump",
                    "duration": 0.2,
                    "trigger_event": "jump"
                }
            ]
        }"#,
    );

    let scheduler = TaskScheduler::new(2);
    let animation_manager = AnimationManager::new(Arc::clone(&scheduler));
    let blend_tree_manager =
        BlendTreeManager::new(Arc::clone(&scheduler), animation_manager);
    let manager = MotionGraphManager::new(Arc::clone(&scheduler), blend_tree_manager);

    let handle = manager.load(&graph_path).unwrap();
    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert!(handle.is_loaded());

    let graph = handle.read();
    assert_eq!(graph.motions().len(), 2);
    assert_eq!(graph.transitions().len(), 1);

    let idle = graph.motion_index("idle").unwrap();
    assert_eq!(graph.default_motion_index(), idle);

    let jump = graph.motion_index("jump").unwrap();
    let transition = &graph.transitions()[0];
    assert_eq!(transition.destination, jump);
    assert_eq!(transition.trigger_event, "jump");
    assert!((transition.duration - 0.2).abs() < 1e-6);
}

#[test]
fn duplicate_transition_between_motions_is_rejected() {
    let dir = TempDir::new().unwrap();
    let graph_path = write_file(
        &dir,
        "broken.kmg",
        br#"{
            "default": "a",
            "motions": {
                "a": { "blend_tree": "", "duration": 1.0 },
                "b": { "blend_tree": "", "duration": 1.0 }
            },
            "transitions": [
                { "sources": ["a"], "destination": "b", "duration": 0.1, "trigger_event": "x" },
                { "sources": ["a"], "destination": "b", "duration": 0.2, "trigger_event": "y" }
            ]
        }"#,
    );

    let scheduler = TaskScheduler::new(2);
    let animation_manager = AnimationManager::new(Arc::clone(&scheduler));
    let blend_tree_manager =
        BlendTreeManager::new(Arc::clone(&scheduler), animation_manager);
    let manager = MotionGraphManager::new(Arc::clone(&scheduler), blend_tree_manager);

    let handle = manager.load(&graph_path).unwrap();
    assert!(!run_pair(&scheduler, manager.create_tasks()));
    assert!(!handle.is_loaded());
}

// ============================================================================
// Heightfield TSV
// ============================================================================

#[test]
fn height_field_quantizes_samples() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "terrain.tsv", b"2 2\n0.0 0.5\n-0.5 1.0\n");

    let scheduler = TaskScheduler::new(2);
    let manager = HeightFieldManager::new(Arc::clone(&scheduler), Arc::new(NullPhysicsBackend));

    let handle = manager.load(&path).unwrap();
    assert!(run_pair(&scheduler, manager.create_tasks()));
    assert!(handle.is_loaded());

    let height_field = handle.read();
    let cooked = height_field.cooked().unwrap();
    assert_eq!(cooked.rows(), 2);
    assert_eq!(cooked.columns(), 2);
    assert_eq!(cooked.height_at(0, 0), 0);
    assert_eq!(cooked.height_at(0, 1), 16383);
    assert_eq!(cooked.height_at(1, 0), -16383);
    assert_eq!(cooked.height_at(1, 1), i16::MAX);
}

// ============================================================================
// Container prototypes
// ============================================================================

#[test]
fn prototype_instantiates_children_once_loaded() {
    let dir = TempDir::new().unwrap();
    let prototype_path = write_file(
        &dir,
        "lamp_post.kwp",
        br#"[
            {
                "type": "geometry_primitive",
                "geometry": "",
                "material": "",
                "local_transform": { "translation": [1.0, 2.0, 3.0] }
            },
            {
                "type": "sphere_light_primitive",
                "color": [1.0, 0.9, 0.8],
                "radius": 4.0,
                "local_transform": { "translation": [0.0, 5.0, 0.0] }
            }
        ]"#,
    );

    let scheduler = TaskScheduler::new(2);
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
    let height_field_manager =
        HeightFieldManager::new(Arc::clone(&scheduler), Arc::new(NullPhysicsBackend));
    let container_manager = ContainerManager::new(Arc::clone(&scheduler));
    container_manager.bind(ReflectionContext {
        animation: animation_manager,
        geometry: geometry_manager,
        material: material_manager,
        motion_graph: motion_graph_manager,
        particle_system: particle_system_manager,
        height_field: height_field_manager,
        container: Arc::downgrade(&container_manager),
    });

    let prototype: ResourceHandle<_> = container_manager.load(&prototype_path).unwrap();

    let mut scene = Scene::new(SceneDescriptor {
        prototype_notifier: Some(Arc::clone(container_manager.notifier())),
        ..SceneDescriptor::default()
    });

    let container = scene
        .add_child(
            scene.root(),
            Primitive::new(
                PrimitiveKind::Container(ContainerData {
                    prototype: Some(prototype),
                }),
                Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            ),
        )
        .unwrap();
    assert!(scene.primitive(container).unwrap().children().is_empty());

    assert!(run_pair(&scheduler, container_manager.create_tasks()));

    // The loaded notification queued the instantiation; scene update applies
    // it.
    scene.update(0.0);

    let children = scene.primitive(container).unwrap().children().to_vec();
    assert_eq!(children.len(), 2);

    let geometry_child = scene.primitive(children[0]).unwrap();
    assert!(matches!(geometry_child.kind(), PrimitiveKind::Geometry(_)));
    let global = geometry_child.global_transform();
    assert!((global.translation - Vec3::new(11.0, 2.0, 3.0)).length() < 1e-4);

    let light_child = scene.primitive(children[1]).unwrap();
    assert!(matches!(light_child.kind(), PrimitiveKind::Light(_)));
}
