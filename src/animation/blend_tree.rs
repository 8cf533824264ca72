use rustc_hash::FxHashMap;

use super::{Animation, SkeletonPose};
use crate::assets::{Resource, ResourceHandle};

/// Inputs of one blend-tree evaluation.
pub struct BlendTreeContext<'a> {
    /// Named float attributes of the evaluating primitive.
    pub attributes: &'a FxHashMap<String, f32>,
    /// Motion time in seconds.
    pub timestamp: f32,
}

/// One node of a blend tree.
///
/// Leaves sample an animation; inner nodes blend their children by a named
/// attribute over a sorted key range.
pub enum BlendTreeNode {
    /// Samples every joint of the animation at the context timestamp. An
    /// unloaded animation yields an empty pose.
    Animation {
        /// The sampled animation; `None` means "no binding".
        animation: Option<ResourceHandle<Animation>>,
    },
    /// Linear blend indexed by a named float attribute. Children are sorted
    /// by key; duplicate keys are rejected at load time.
    Lerp {
        /// Attribute driving the blend. A missing attribute reads as zero.
        attribute: String,
        /// `(key, subtree)` pairs, ascending by key, never empty.
        children: Vec<(f32, BlendTreeNode)>,
    },
}

impl BlendTreeNode {
    /// Evaluates the subtree to a pose.
    #[must_use]
    pub fn compute(&self, context: &BlendTreeContext<'_>) -> SkeletonPose {
        match self {
            BlendTreeNode::Animation { animation } => {
                let mut pose = SkeletonPose::new();
                if let Some(animation) = animation {
                    let animation = animation.read();
                    if animation.is_loaded() {
                        for joint in 0..animation.joint_count() {
                            pose.set_joint_space_transform(
                                joint,
                                animation.joint_transform(joint, context.timestamp),
                            );
                        }
                    }
                }
                pose
            }
            BlendTreeNode::Lerp {
                attribute,
                children,
            } => {
                let value = context.attributes.get(attribute).copied().unwrap_or(0.0);

                // First child whose key is not below the value.
                let upper = children.partition_point(|(key, _)| *key < value);
                if upper == children.len() {
                    // Above the maximum key: the highest child wins.
                    return children[children.len() - 1].1.compute(context);
                }

                let (upper_key, upper_node) = &children[upper];
                if upper == 0 || (*upper_key - value).abs() <= f32::EPSILON {
                    // Below the minimum key, or exactly on a key.
                    return upper_node.compute(context);
                }

                let (lower_key, lower_node) = &children[upper - 1];
                let factor = ((value - lower_key) / (upper_key - lower_key)).clamp(0.0, 1.0);

                let mut pose = lower_node.compute(context);
                pose.lerp(&upper_node.compute(context), factor);
                pose
            }
        }
    }
}

/// A blend tree asset: a single root node once loaded.
#[derive(Default)]
pub struct BlendTree {
    root: Option<BlendTreeNode>,
}

impl Resource for BlendTree {
    fn is_loaded(&self) -> bool {
        self.root.is_some()
    }
}

impl BlendTree {
    /// Wraps a parsed root node.
    #[must_use]
    pub fn from_root(root: BlendTreeNode) -> Self {
        Self { root: Some(root) }
    }

    /// The root node, if loaded.
    #[must_use]
    pub fn root(&self) -> Option<&BlendTreeNode> {
        self.root.as_ref()
    }

    /// Evaluates the tree; an unloaded tree yields an empty pose.
    #[must_use]
    pub fn compute(&self, context: &BlendTreeContext<'_>) -> SkeletonPose {
        self.root
            .as_ref()
            .map_or_else(SkeletonPose::new, |root| root.compute(context))
    }
}
