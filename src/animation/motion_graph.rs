use rustc_hash::FxHashMap;

use super::BlendTree;
use crate::assets::{Resource, ResourceHandle};

/// Index sentinel for "no motion".
pub const MOTION_NONE: u32 = u32::MAX;

/// One motion: a blend tree paired with a duration and its outgoing
/// transitions.
pub struct Motion {
    /// The pose source.
    pub blend_tree: Option<ResourceHandle<BlendTree>>,
    /// Indices into [`MotionGraph::transitions`].
    pub transitions: Vec<u32>,
    /// Motion duration in seconds.
    pub duration: f32,
}

/// One event-triggered transition between motions.
pub struct Transition {
    /// Index into [`MotionGraph::motions`].
    pub destination: u32,
    /// Blend duration in seconds.
    pub duration: f32,
    /// Event name that fires this transition.
    pub trigger_event: String,
}

/// A graph of motions and event-triggered transitions.
///
/// Loaded iff the default motion index is set: the worker publishes a graph
/// with a valid default, so the predicate derives from content.
#[derive(Default)]
pub struct MotionGraph {
    motions: Vec<Motion>,
    transitions: Vec<Transition>,
    mapping: FxHashMap<String, u32>,
    default_motion_index: Option<u32>,
}

impl Resource for MotionGraph {
    fn is_loaded(&self) -> bool {
        self.default_motion_index.is_some()
    }
}

impl MotionGraph {
    /// Builds a graph from parsed parts.
    #[must_use]
    pub fn new(
        motions: Vec<Motion>,
        transitions: Vec<Transition>,
        mapping: FxHashMap<String, u32>,
        default_motion_index: u32,
    ) -> Self {
        Self {
            motions,
            transitions,
            mapping,
            default_motion_index: Some(default_motion_index),
        }
    }

    /// All motions.
    #[must_use]
    pub fn motions(&self) -> &[Motion] {
        &self.motions
    }

    /// All transitions.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Looks a motion up by name.
    #[must_use]
    pub fn motion_index(&self, name: &str) -> Option<u32> {
        self.mapping.get(name).copied()
    }

    /// The motion a fresh primitive starts in.
    #[must_use]
    pub fn default_motion_index(&self) -> u32 {
        self.default_motion_index.unwrap_or(MOTION_NONE)
    }
}
