//! Animation core: keyframed joint animations, skeletal poses, blend-tree
//! evaluation and the motion-graph state machine with two-joint IK.

mod animation;
mod blend_tree;
mod motion_graph;
mod motion_state;
mod skeleton_pose;

pub use animation::{Animation, JointKeyframe, JointTrack};
pub use blend_tree::{BlendTree, BlendTreeContext, BlendTreeNode};
pub use motion_graph::{Motion, MotionGraph, Transition};
pub use motion_state::{IkTarget, MotionState};
pub use skeleton_pose::SkeletonPose;
