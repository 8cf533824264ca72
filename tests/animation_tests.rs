//! Animation, blend-tree, motion-graph and IK tests
//!
//! Tests for:
//! - Keyframe sampling with time normalization
//! - Model-space pose building and inverse-bind application
//! - Pose blending with identity padding
//! - Blend-tree lerp node bounds and interpolation
//! - Motion-graph transitions (the "jump" scenario)
//! - Two-joint IK reachability and zero-weight identity

use glam::{Mat4, Quat, Vec3};
use keel::animation::{
    Animation, BlendTree, BlendTreeContext, BlendTreeNode, JointKeyframe, JointTrack, Motion,
    MotionGraph, MotionState, SkeletonPose, Transition,
};
use keel::assets::{ResourceHandle, ResourceSlot};
use keel::math::{Aabb, Transform};
use keel::resources::geometry::{Geometry, Indices, Skeleton, Vertex};
use rustc_hash::FxHashMap;

// ============================================================================
// Helpers
// ============================================================================

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn keyframe(timestamp: f32, translation: Vec3) -> JointKeyframe {
    JointKeyframe {
        timestamp,
        transform: Transform::from_translation(translation),
    }
}

fn constant_animation(joint_translations: &[Vec3]) -> ResourceHandle<Animation> {
    let tracks = joint_translations
        .iter()
        .map(|translation| JointTrack {
            keyframes: vec![keyframe(0.0, *translation)],
        })
        .collect();
    ResourceSlot::new_loaded(Animation::from_tracks(tracks, "test").unwrap())
}

fn animation_leaf(joint_translations: &[Vec3]) -> BlendTreeNode {
    BlendTreeNode::Animation {
        animation: Some(constant_animation(joint_translations)),
    }
}

fn skinned_geometry(parent_joints: Vec<u32>) -> Geometry {
    let joint_count = parent_joints.len();
    let names = (0..joint_count).map(|index| format!("joint_{index}")).collect();
    let skeleton = Skeleton::new(
        parent_joints,
        vec![Mat4::IDENTITY; joint_count],
        vec![Mat4::IDENTITY; joint_count],
        names,
    );

    let vertex = Vertex {
        position: [0.0; 3],
        normal: [0.0, 1.0, 0.0],
        tangent: [1.0, 0.0, 0.0, 1.0],
        texcoord_0: [0.0; 2],
    };
    Geometry::new(
        vec![vertex],
        Vec::new(),
        Indices::U16(Vec::new()),
        Aabb::ZERO,
        Some(skeleton),
    )
}

const ROOT: u32 = u32::MAX;

// ============================================================================
// Animation sampling
// ============================================================================

#[test]
fn sampling_interpolates_between_keyframes() {
    let track = JointTrack {
        keyframes: vec![
            keyframe(0.0, Vec3::ZERO),
            keyframe(2.0, Vec3::new(2.0, 0.0, 0.0)),
        ],
    };
    let animation = Animation::from_tracks(vec![track], "test").unwrap();

    assert!(approx_eq(animation.duration(), 2.0));
    let sampled = animation.joint_transform(0, 1.0);
    assert!(vec3_approx(sampled.translation, Vec3::new(1.0, 0.0, 0.0)));
}

#[test]
fn sampling_wraps_past_duration() {
    let track = JointTrack {
        keyframes: vec![
            keyframe(0.0, Vec3::ZERO),
            keyframe(2.0, Vec3::new(2.0, 0.0, 0.0)),
        ],
    };
    let animation = Animation::from_tracks(vec![track], "test").unwrap();

    // 3.0 normalizes to 1.0.
    let sampled = animation.joint_transform(0, 3.0);
    assert!(vec3_approx(sampled.translation, Vec3::new(1.0, 0.0, 0.0)));
}

#[test]
fn empty_track_is_a_parse_error() {
    let result = Animation::from_tracks(vec![JointTrack { keyframes: Vec::new() }], "test");
    assert!(result.is_err());
}

// ============================================================================
// Skeleton pose
// ============================================================================

#[test]
fn model_space_matrices_concatenate_down_the_chain() {
    let geometry = skinned_geometry(vec![ROOT, 0, 1]);
    let skeleton = geometry.skeleton().unwrap();

    let mut pose = SkeletonPose::new();
    pose.set_joint_space_transform(0, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    pose.set_joint_space_transform(1, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    pose.set_joint_space_transform(2, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));

    pose.build_model_space_matrices(skeleton);

    let positions: Vec<Vec3> = pose
        .model_space_matrices()
        .iter()
        .map(|matrix| matrix.w_axis.truncate())
        .collect();
    assert!(vec3_approx(positions[0], Vec3::new(1.0, 0.0, 0.0)));
    assert!(vec3_approx(positions[1], Vec3::new(2.0, 0.0, 0.0)));
    assert!(vec3_approx(positions[2], Vec3::new(3.0, 0.0, 0.0)));
}

#[test]
fn inverse_bind_matrices_apply_in_place() {
    let joint_count = 2;
    let inverse_bind = vec![Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0)); joint_count];
    let skeleton = Skeleton::new(
        vec![ROOT, 0],
        inverse_bind,
        vec![Mat4::IDENTITY; joint_count],
        vec!["a".to_owned(), "b".to_owned()],
    );

    let mut pose = SkeletonPose::new();
    pose.set_joint_space_transform(0, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    pose.set_joint_space_transform(1, Transform::IDENTITY);
    pose.build_model_space_matrices(&skeleton);
    pose.apply_inverse_bind_matrices(&skeleton);

    // model * inverse_bind: translation 1 then -1 in joint-local space.
    let skinning = pose.model_space_matrices()[0];
    assert!(vec3_approx(skinning.w_axis.truncate(), Vec3::ZERO));
}

#[test]
fn pose_lerp_pads_shorter_pose_with_identity() {
    let mut short = SkeletonPose::new();
    short.set_joint_space_transform(0, Transform::from_translation(Vec3::new(2.0, 0.0, 0.0)));

    let mut long = SkeletonPose::new();
    long.set_joint_space_transform(0, Transform::from_translation(Vec3::new(4.0, 0.0, 0.0)));
    long.set_joint_space_transform(1, Transform::from_translation(Vec3::new(8.0, 0.0, 0.0)));

    short.lerp(&long, 0.5);

    assert_eq!(short.joint_count(), 2);
    let transforms = short.joint_space_transforms();
    assert!(vec3_approx(transforms[0].translation, Vec3::new(3.0, 0.0, 0.0)));
    // Identity padded toward the longer pose.
    assert!(vec3_approx(transforms[1].translation, Vec3::new(4.0, 0.0, 0.0)));
}

// ============================================================================
// Blend tree
// ============================================================================

fn lerp_tree(attribute: &str) -> BlendTree {
    BlendTree::from_root(BlendTreeNode::Lerp {
        attribute: attribute.to_owned(),
        children: vec![
            (0.0, animation_leaf(&[Vec3::ZERO])),
            (1.0, animation_leaf(&[Vec3::new(10.0, 0.0, 0.0)])),
        ],
    })
}

#[test]
fn lerp_node_interpolates_between_keys() {
    let tree = lerp_tree("speed");
    let mut attributes = FxHashMap::default();
    attributes.insert("speed".to_owned(), 0.3_f32);

    let pose = tree.compute(&BlendTreeContext {
        attributes: &attributes,
        timestamp: 0.0,
    });

    assert!(vec3_approx(
        pose.joint_space_transforms()[0].translation,
        Vec3::new(3.0, 0.0, 0.0)
    ));
}

#[test]
fn lerp_node_clamps_outside_key_range() {
    let tree = lerp_tree("speed");

    let mut attributes = FxHashMap::default();
    attributes.insert("speed".to_owned(), -5.0_f32);
    let below = tree.compute(&BlendTreeContext {
        attributes: &attributes,
        timestamp: 0.0,
    });
    assert!(vec3_approx(
        below.joint_space_transforms()[0].translation,
        Vec3::ZERO
    ));

    attributes.insert("speed".to_owned(), 5.0_f32);
    let above = tree.compute(&BlendTreeContext {
        attributes: &attributes,
        timestamp: 0.0,
    });
    assert!(vec3_approx(
        above.joint_space_transforms()[0].translation,
        Vec3::new(10.0, 0.0, 0.0)
    ));
}

#[test]
fn missing_attribute_reads_as_zero() {
    let tree = lerp_tree("speed");
    let attributes = FxHashMap::default();

    let pose = tree.compute(&BlendTreeContext {
        attributes: &attributes,
        timestamp: 0.0,
    });
    assert!(vec3_approx(
        pose.joint_space_transforms()[0].translation,
        Vec3::ZERO
    ));
}

#[test]
fn unloaded_animation_yields_empty_pose() {
    let node = BlendTreeNode::Animation {
        animation: Some(ResourceSlot::<Animation>::new_empty()),
    };
    let attributes = FxHashMap::default();
    let pose = node.compute(&BlendTreeContext {
        attributes: &attributes,
        timestamp: 0.0,
    });
    assert_eq!(pose.joint_count(), 0);
}

// ============================================================================
// Motion graph
// ============================================================================

fn jump_graph() -> ResourceHandle<MotionGraph> {
    let tree_a = ResourceSlot::new_loaded(BlendTree::from_root(animation_leaf(&[Vec3::new(
        5.0, 0.0, 0.0,
    )])));
    let tree_b = ResourceSlot::new_loaded(BlendTree::from_root(animation_leaf(&[Vec3::new(
        9.0, 0.0, 0.0,
    )])));

    let mut mapping = FxHashMap::default();
    mapping.insert("a".to_owned(), 0);
    mapping.insert("b".to_owned(), 1);

    ResourceSlot::new_loaded(MotionGraph::new(
        vec![
            Motion {
                blend_tree: Some(tree_a),
                transitions: vec![0],
                duration: 1.0,
            },
            Motion {
                blend_tree: Some(tree_b),
                transitions: Vec::new(),
                duration: 1.0,
            },
        ],
        vec![Transition {
            destination: 1,
            duration: 0.2,
            trigger_event: "jump".to_owned(),
        }],
        mapping,
        0,
    ))
}

fn pose_x(state: &MotionState) -> f32 {
    state.skeleton_pose().model_space_matrices()[0].w_axis.x
}

#[test]
fn jump_transition_scenario() {
    let geometry = skinned_geometry(vec![ROOT]);
    let mut state = MotionState::new(Some(jump_graph()));

    state.update(&geometry, &Transform::IDENTITY, 0.1);
    assert_eq!(state.motion_index(), 0);
    assert!(approx_eq(state.motion_time(), 0.1));
    assert!(approx_eq(pose_x(&state), 5.0));

    state.emit_event("jump");
    assert_eq!(state.motion_index(), 1);
    assert!(approx_eq(state.motion_time(), 0.0));
    assert!(approx_eq(state.transition_duration(), 0.2));

    // Blend starts at A's frozen pose and lands on B's pose.
    state.update(&geometry, &Transform::IDENTITY, 0.1);
    assert!(approx_eq(pose_x(&state), 5.0));

    state.update(&geometry, &Transform::IDENTITY, 0.1);
    assert!(approx_eq(pose_x(&state), 7.0));

    state.update(&geometry, &Transform::IDENTITY, 0.1);
    assert!(approx_eq(pose_x(&state), 9.0));
    assert!(approx_eq(state.transition_duration(), 0.0));
}

#[test]
fn transition_does_not_fire_when_it_cannot_complete() {
    let geometry = skinned_geometry(vec![ROOT]);
    let mut state = MotionState::new(Some(jump_graph()));

    for _ in 0..9 {
        state.update(&geometry, &Transform::IDENTITY, 0.1);
    }
    assert!(state.motion_time() > 0.85);

    // 0.9 + 0.2 runs past the motion's end.
    state.emit_event("jump");
    assert_eq!(state.motion_index(), 0);
}

#[test]
fn unknown_event_is_ignored() {
    let geometry = skinned_geometry(vec![ROOT]);
    let mut state = MotionState::new(Some(jump_graph()));

    state.update(&geometry, &Transform::IDENTITY, 0.1);
    state.emit_event("crouch");
    assert_eq!(state.motion_index(), 0);
}

#[test]
fn frozen_fade_blends_from_captured_pose() {
    let geometry = skinned_geometry(vec![ROOT]);
    let mut state = MotionState::new(Some(jump_graph()));

    state.update(&geometry, &Transform::IDENTITY, 0.1);
    state.frozen_fade(0.5);
    assert!(approx_eq(state.transition_duration(), 0.5));

    // Still motion A, so the blend resolves to the same constant pose.
    state.update(&geometry, &Transform::IDENTITY, 0.1);
    assert!(approx_eq(pose_x(&state), 5.0));
}

// ============================================================================
// Two-joint IK
// ============================================================================

fn ik_setup() -> (Geometry, MotionState) {
    // A slightly bent three-joint chain along +X.
    let animation = BlendTreeNode::Animation {
        animation: Some(ResourceSlot::new_loaded(
            Animation::from_tracks(
                vec![
                    JointTrack {
                        keyframes: vec![keyframe(0.0, Vec3::ZERO)],
                    },
                    JointTrack {
                        keyframes: vec![keyframe(0.0, Vec3::new(1.0, 0.0, 0.0))],
                    },
                    JointTrack {
                        keyframes: vec![keyframe(0.0, Vec3::new(1.0, 0.2, 0.0))],
                    },
                ],
                "chain",
            )
            .unwrap(),
        )),
    };

    let tree = ResourceSlot::new_loaded(BlendTree::from_root(animation));
    let mut mapping = FxHashMap::default();
    mapping.insert("idle".to_owned(), 0);
    let graph = ResourceSlot::new_loaded(MotionGraph::new(
        vec![Motion {
            blend_tree: Some(tree),
            transitions: Vec::new(),
            duration: 10.0,
        }],
        Vec::new(),
        mapping,
        0,
    ));

    (skinned_geometry(vec![ROOT, 0, 1]), MotionState::new(Some(graph)))
}

#[test]
fn ik_with_full_weight_reaches_target() {
    let (geometry, mut state) = ik_setup();

    let target = Vec3::new(1.2, 1.0, 0.0);
    state.set_ik_target(0, 1, 2, target, 1.0);
    state.update(&geometry, &Transform::IDENTITY, 0.0);

    let end_effector = state.skeleton_pose().model_space_matrices()[2]
        .w_axis
        .truncate();
    assert!(
        (end_effector - target).length() < 1e-4,
        "end effector {end_effector:?} must land on {target:?}"
    );
}

#[test]
fn ik_with_zero_weight_leaves_pose_untouched() {
    let (geometry, mut reference_state) = ik_setup();
    let (_, mut ik_state) = ik_setup();

    // Zero weight removes the constraint entirely.
    ik_state.set_ik_target(0, 1, 2, Vec3::new(1.2, 1.0, 0.0), 0.0);
    assert!(ik_state.ik_target(0, 1, 2).is_none());

    reference_state.update(&geometry, &Transform::IDENTITY, 0.0);
    ik_state.update(&geometry, &Transform::IDENTITY, 0.0);

    let reference = reference_state.skeleton_pose().model_space_matrices();
    let with_ik = ik_state.skeleton_pose().model_space_matrices();
    assert_eq!(reference, with_ik);
}

#[test]
fn ik_target_is_expressed_in_primitive_space() {
    let (geometry, mut state) = ik_setup();

    // Move the whole primitive; the world target must be transformed into
    // its model space.
    let global = Transform::from_translation(Vec3::new(100.0, 0.0, 0.0));
    let world_target = Vec3::new(101.2, 1.0, 0.0);
    state.set_ik_target(0, 1, 2, world_target, 1.0);
    state.update(&geometry, &global, 0.0);

    let end_effector = state.skeleton_pose().model_space_matrices()[2]
        .w_axis
        .truncate();
    assert!((end_effector - Vec3::new(1.2, 1.0, 0.0)).length() < 1e-4);
}

#[test]
fn pre_ik_matrices_capture_unconstrained_pose() {
    let (geometry, mut state) = ik_setup();

    state.set_ik_target(0, 1, 2, Vec3::new(1.2, 1.0, 0.0), 1.0);
    state.update(&geometry, &Transform::IDENTITY, 0.0);

    // The pre-IK snapshot still holds the straight-ish chain.
    let pre_ik_end = state.model_space_pre_ik_matrices()[2].w_axis.truncate();
    assert!(vec3_approx(pre_ik_end, Vec3::new(2.0, 0.2, 0.0)));
}

#[test]
fn ik_handles_rotated_primitives() {
    let (geometry, mut state) = ik_setup();

    let global = Transform::from_rotation(Quat::from_rotation_z(0.3));
    let model_target = Vec3::new(1.2, 1.0, 0.0);
    let world_target = global.transform_point(model_target);

    state.set_ik_target(0, 1, 2, world_target, 1.0);
    state.update(&geometry, &global, 0.0);

    let end_effector = state.skeleton_pose().model_space_matrices()[2]
        .w_axis
        .truncate();
    assert!((end_effector - model_target).length() < 1e-4);
}
