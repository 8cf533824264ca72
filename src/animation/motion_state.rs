use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashMap;

use super::motion_graph::MOTION_NONE;
use super::{BlendTreeContext, MotionGraph, SkeletonPose};
use crate::assets::{Resource, ResourceHandle};
use crate::math::{EPSILON, Transform};
use crate::resources::geometry::Geometry;

/// One two-joint IK constraint: move joint C of the chain A-B-C toward a
/// world-space target.
#[derive(Debug, Clone, Copy)]
pub struct IkTarget {
    /// Chain root (e.g. hip).
    pub joint_a: usize,
    /// Middle joint (e.g. knee).
    pub joint_b: usize,
    /// End effector (e.g. foot).
    pub joint_c: usize,
    /// Target position in world space.
    pub target: Vec3,
    /// Blend weight in `[0, 1]`; zero removes the constraint.
    pub weight: f32,
}

/// Motion-graph execution state of one motion-geometry primitive.
///
/// Owns the current and previous skeleton poses, the attribute map driving
/// blend trees, the in-flight transition and the IK constraints applied
/// after blending.
pub struct MotionState {
    motion_graph: Option<ResourceHandle<MotionGraph>>,
    attributes: FxHashMap<String, f32>,
    skeleton_pose: SkeletonPose,
    previous_skeleton_pose: SkeletonPose,
    joints_model_pre_ik: Vec<Mat4>,
    ik_targets: Vec<IkTarget>,
    motion_index: u32,
    motion_time: f32,
    transition_time: f32,
    transition_duration: f32,
}

impl MotionState {
    /// Creates a state driven by `motion_graph` (which may still be loading).
    #[must_use]
    pub fn new(motion_graph: Option<ResourceHandle<MotionGraph>>) -> Self {
        Self {
            motion_graph,
            attributes: FxHashMap::default(),
            skeleton_pose: SkeletonPose::new(),
            previous_skeleton_pose: SkeletonPose::new(),
            joints_model_pre_ik: Vec::new(),
            ik_targets: Vec::new(),
            motion_index: MOTION_NONE,
            motion_time: 0.0,
            transition_time: 0.0,
            transition_duration: 0.0,
        }
    }

    /// The driving motion graph.
    #[must_use]
    pub fn motion_graph(&self) -> Option<&ResourceHandle<MotionGraph>> {
        self.motion_graph.as_ref()
    }

    /// Swaps the driving motion graph, resetting motion position.
    pub fn set_motion_graph(&mut self, motion_graph: Option<ResourceHandle<MotionGraph>>) {
        let same = match (&self.motion_graph, &motion_graph) {
            (Some(current), Some(new)) => std::sync::Arc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.motion_graph = motion_graph;
            self.motion_index = MOTION_NONE;
            self.motion_time = 0.0;
        }
    }

    /// Current motion index ([`MOTION_NONE`] before the first update).
    #[must_use]
    pub fn motion_index(&self) -> u32 {
        self.motion_index
    }

    /// Seconds into the current motion.
    #[must_use]
    pub fn motion_time(&self) -> f32 {
        self.motion_time
    }

    /// Duration of the in-flight transition (zero when none).
    #[must_use]
    pub fn transition_duration(&self) -> f32 {
        self.transition_duration
    }

    /// The skinning pose produced by the last update.
    #[must_use]
    pub fn skeleton_pose(&self) -> &SkeletonPose {
        &self.skeleton_pose
    }

    /// Model-space joint matrices captured before IK was applied. Used by
    /// gameplay code that needs the un-corrected pose (e.g. foot locking).
    #[must_use]
    pub fn model_space_pre_ik_matrices(&self) -> &[Mat4] {
        &self.joints_model_pre_ik
    }

    /// Reads a named attribute; missing attributes read as zero.
    #[must_use]
    pub fn attribute(&self, name: &str) -> f32 {
        self.attributes.get(name).copied().unwrap_or(0.0)
    }

    /// Writes a named attribute.
    pub fn set_attribute(&mut self, name: &str, value: f32) {
        self.attributes.insert(name.to_owned(), value);
    }

    /// Fires the first outgoing transition of the current motion whose
    /// trigger equals `name` and which would complete before the current
    /// motion ends.
    ///
    /// On fire: the current pose is frozen into the previous pose, the
    /// destination motion starts at time zero and the transition timer
    /// starts.
    pub fn emit_event(&mut self, name: &str) {
        let Some(graph_handle) = &self.motion_graph else {
            return;
        };
        let graph = graph_handle.read();
        if !graph.is_loaded() {
            return;
        }

        if self.motion_index == MOTION_NONE {
            self.motion_index = graph.default_motion_index();
        }

        let motion = &graph.motions()[self.motion_index as usize];
        let transitions = graph.transitions();

        for &transition_index in &motion.transitions {
            let transition = &transitions[transition_index as usize];
            if transition.trigger_event == name
                && self.motion_time + transition.duration <= motion.duration
            {
                self.motion_index = transition.destination;
                self.motion_time = 0.0;

                std::mem::swap(&mut self.previous_skeleton_pose, &mut self.skeleton_pose);

                self.transition_time = 0.0;
                self.transition_duration = transition.duration;
                break;
            }
        }
    }

    /// Freezes the current pose and fades back from it over `duration`
    /// seconds, without changing motion.
    pub fn frozen_fade(&mut self, duration: f32) {
        std::mem::swap(&mut self.previous_skeleton_pose, &mut self.skeleton_pose);

        self.transition_time = 0.0;
        self.transition_duration = duration;
    }

    /// Adds, updates or (with zero weight) removes the IK constraint keyed
    /// by the joint triple.
    pub fn set_ik_target(
        &mut self,
        joint_a: usize,
        joint_b: usize,
        joint_c: usize,
        target: Vec3,
        weight: f32,
    ) {
        if let Some(index) = self.ik_targets.iter().position(|ik| {
            ik.joint_a == joint_a && ik.joint_b == joint_b && ik.joint_c == joint_c
        }) {
            if weight != 0.0 {
                self.ik_targets[index].target = target;
                self.ik_targets[index].weight = weight;
            } else {
                self.ik_targets.remove(index);
            }
            return;
        }

        if weight != 0.0 {
            self.ik_targets.push(IkTarget {
                joint_a,
                joint_b,
                joint_c,
                target,
                weight,
            });
        }
    }

    /// The IK constraint keyed by the joint triple, if any.
    #[must_use]
    pub fn ik_target(&self, joint_a: usize, joint_b: usize, joint_c: usize) -> Option<&IkTarget> {
        self.ik_targets.iter().find(|ik| {
            ik.joint_a == joint_a && ik.joint_b == joint_b && ik.joint_c == joint_c
        })
    }

    /// Advances the state by `elapsed_time` and rebuilds the skinning pose:
    /// blend-tree evaluation, transition blending, IK, inverse bind.
    ///
    /// No-op until both the geometry (with its skeleton) and the motion
    /// graph are loaded.
    pub fn update(&mut self, geometry: &Geometry, global_transform: &Transform, elapsed_time: f32) {
        let Some(graph_handle) = &self.motion_graph else {
            return;
        };
        let graph = graph_handle.read();
        if !graph.is_loaded() || !geometry.is_loaded() {
            return;
        }
        let Some(skeleton) = geometry.skeleton() else {
            return;
        };

        if self.motion_index == MOTION_NONE {
            self.motion_index = graph.default_motion_index();
        }

        let motion = &graph.motions()[self.motion_index as usize];

        let context = BlendTreeContext {
            attributes: &self.attributes,
            timestamp: self.motion_time,
        };

        let computed = motion
            .blend_tree
            .as_ref()
            .map_or_else(SkeletonPose::new, |tree| tree.read().compute(&context));
        self.skeleton_pose.lerp(&computed, 1.0);

        if self.transition_duration > 0.0 {
            let factor = 1.0 - self.transition_time / self.transition_duration;
            self.skeleton_pose
                .lerp(&self.previous_skeleton_pose, factor);

            self.transition_time += elapsed_time;
            if self.transition_time >= self.transition_duration {
                self.transition_time = 0.0;
                self.transition_duration = 0.0;
            }
        }

        self.motion_time += elapsed_time;

        self.skeleton_pose.build_model_space_matrices(skeleton);
        self.joints_model_pre_ik.clear();
        self.joints_model_pre_ik
            .extend_from_slice(self.skeleton_pose.model_space_matrices());

        let inverse_global = global_transform.inverse();
        for index in 0..self.ik_targets.len() {
            let ik = self.ik_targets[index];
            apply_two_joint_ik(&mut self.skeleton_pose, &ik, &inverse_global);
        }

        self.skeleton_pose.build_model_space_matrices(skeleton);
        self.skeleton_pose.apply_inverse_bind_matrices(skeleton);
    }
}

/// Two-joint IK after theorangeduck's construction: two hinge corrections at
/// A and B flatten or bend the chain to the target length, a swing at A
/// points it at the target.
fn apply_two_joint_ik(pose: &mut SkeletonPose, ik: &IkTarget, inverse_global: &Transform) {
    let matrices = pose.model_space_matrices();
    debug_assert!(
        ik.joint_a < matrices.len() && ik.joint_b < matrices.len() && ik.joint_c < matrices.len(),
        "IK joints out of range"
    );

    let a_model = Transform::from_mat4(&matrices[ik.joint_a]);
    let b_model = Transform::from_mat4(&matrices[ik.joint_b]);
    let c_model = Transform::from_mat4(&matrices[ik.joint_c]);

    let a = a_model.translation;
    let b = b_model.translation;
    let c = c_model.translation;

    // Target expressed in the primitive's model space.
    let t = inverse_global.transform_point(ik.target);

    let a_gr = a_model.rotation;
    let b_gr = b_model.rotation;

    let mut a_joint = pose.joint_space_transforms()[ik.joint_a];
    let mut b_joint = pose.joint_space_transforms()[ik.joint_b];

    let lab = (b - a).length();
    let lcb = (b - c).length();
    let lat = (t - a).length().clamp(EPSILON, lab + lcb - EPSILON);

    let ac_ab_0 = angle_between(c - a, b - a);
    let ba_bc_0 = angle_between(a - b, c - b);
    let ac_at_0 = angle_between(c - a, t - a);

    let ac_ab_1 = ((lcb * lcb - lab * lab - lat * lat) / (-2.0 * lab * lat))
        .clamp(-1.0, 1.0)
        .acos();
    let ba_bc_1 = ((lat * lat - lab * lab - lcb * lcb) / (-2.0 * lab * lcb))
        .clamp(-1.0, 1.0)
        .acos();

    let axis0 = (c - a).cross(b - a).normalize_or_zero();
    let axis1 = (c - a).cross(t - a).normalize_or_zero();

    // Axes are pre-rotated into each joint's local frame.
    let r0 = rotation_about(a_gr.inverse() * axis0, ac_ab_1 - ac_ab_0);
    let r1 = rotation_about(b_gr.inverse() * axis0, ba_bc_1 - ba_bc_0);
    let r2 = rotation_about(a_gr.inverse() * axis1, ac_at_0);

    a_joint.rotation = a_joint
        .rotation
        .slerp(a_joint.rotation * r0 * r2, ik.weight)
        .normalize();
    b_joint.rotation = b_joint
        .rotation
        .slerp(b_joint.rotation * r1, ik.weight)
        .normalize();

    pose.set_joint_space_transform(ik.joint_a, a_joint);
    pose.set_joint_space_transform(ik.joint_b, b_joint);
}

fn angle_between(lhs: Vec3, rhs: Vec3) -> f32 {
    lhs.normalize_or_zero()
        .dot(rhs.normalize_or_zero())
        .clamp(-1.0, 1.0)
        .acos()
}

fn rotation_about(axis: Vec3, angle: f32) -> Quat {
    if axis.length_squared() < EPSILON {
        // Degenerate (collinear) chain: nothing to rotate about.
        Quat::IDENTITY
    } else {
        Quat::from_axis_angle(axis.normalize(), angle)
    }
}
