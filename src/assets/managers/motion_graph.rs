use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::blend_tree::BlendTreeManager;
use crate::animation::{Motion, MotionGraph, Transition};
use crate::assets::handle::ResourceHandle;
use crate::assets::notifier::ResourceNotifier;
use crate::assets::registry::ResourceRegistry;
use crate::assets::tree;
use crate::errors::{KeelError, Result};
use crate::tasks::{Task, TaskScheduler};

/// Streams motion-graph resource files.
///
/// A motion graph names a default motion, a motion table (blend tree +
/// duration each) and a transition list; blend trees route through the
/// blend-tree manager.
pub struct MotionGraphManager {
    registry: ResourceRegistry<MotionGraph>,
    notifier: Arc<ResourceNotifier<MotionGraph>>,
    scheduler: Arc<TaskScheduler>,
    blend_tree_manager: Arc<BlendTreeManager>,
}

impl MotionGraphManager {
    /// Creates the motion-graph manager.
    #[must_use]
    pub fn new(
        scheduler: Arc<TaskScheduler>,
        blend_tree_manager: Arc<BlendTreeManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            blend_tree_manager,
        })
    }

    /// Looks up or enqueues a motion graph; an empty path yields the null
    /// handle.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<MotionGraph>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<MotionGraph>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<MotionGraph>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task) {
        let end_task = Task::noop("motion graph manager end");

        let manager = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new("motion graph manager begin", move || {
            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker = Task::new("motion graph manager worker", move || {
                    let text = std::fs::read_to_string(&path)
                        .map_err(|error| KeelError::asset(&path, format!("failed to open: {error}")))?;
                    let root: Value = serde_json::from_str(&text)?;

                    let graph = graph_from_tree(&worker_manager.blend_tree_manager, &root, &path)?;
                    handle.publish(graph);
                    worker_manager.notifier.notify(&handle);
                    Ok(())
                });
                worker.add_output_dependencies(&[&begin_end]);
                manager.scheduler.enqueue(&worker);
            }
            Ok(())
        });

        begin_task.add_output_dependency(&end_task);
        (begin_task, end_task)
    }
}

fn graph_from_tree(
    blend_tree_manager: &BlendTreeManager,
    root: &Value,
    path: &str,
) -> Result<MotionGraph> {
    let root = tree::object(root, path)?;
    let default_name = tree::string(tree::field(root, "default", path)?, path)?;
    let motions_node = tree::object(tree::field(root, "motions", path)?, path)?;
    let transitions_node = tree::array(tree::field(root, "transitions", path)?, path)?;

    let mut motions = Vec::with_capacity(motions_node.len());
    let mut transitions: Vec<Transition> = Vec::with_capacity(transitions_node.len());
    let mut mapping = FxHashMap::default();

    for (name, motion_node) in motions_node {
        if name.is_empty() {
            return Err(KeelError::asset(path, "motion name must not be empty"));
        }

        let motion_object = tree::object(motion_node, path)?;
        let blend_tree_path =
            tree::string(tree::field(motion_object, "blend_tree", path)?, path)?;
        let duration = tree::number(tree::field(motion_object, "duration", path)?, path)?;

        if mapping
            .insert(name.clone(), motions.len() as u32)
            .is_some()
        {
            return Err(KeelError::asset(path, "motions with the same name are illegal"));
        }

        motions.push(Motion {
            blend_tree: blend_tree_manager.load(blend_tree_path),
            transitions: Vec::new(),
            duration,
        });
    }

    for transition_node in transitions_node {
        let transition_object = tree::object(transition_node, path)?;
        let sources = tree::array(tree::field(transition_object, "sources", path)?, path)?;
        let destination_name =
            tree::string(tree::field(transition_object, "destination", path)?, path)?;
        let duration = tree::number(tree::field(transition_object, "duration", path)?, path)?;
        let trigger_event =
            tree::string(tree::field(transition_object, "trigger_event", path)?, path)?;

        if trigger_event.is_empty() {
            return Err(KeelError::asset(path, "trigger event name must not be empty"));
        }

        let destination = *mapping
            .get(destination_name)
            .ok_or_else(|| KeelError::asset(path, "transition destination is not found"))?;

        for source_node in sources {
            let source_name = tree::string(source_node, path)?;
            let source = *mapping
                .get(source_name)
                .ok_or_else(|| KeelError::asset(path, "transition source is not found"))?;

            let duplicate = motions[source as usize]
                .transitions
                .iter()
                .any(|&index| transitions[index as usize].destination == destination);
            if duplicate {
                return Err(KeelError::asset(
                    path,
                    "only one transition from one motion to another is allowed",
                ));
            }

            motions[source as usize]
                .transitions
                .push(transitions.len() as u32);
        }

        transitions.push(Transition {
            destination,
            duration,
            trigger_event: trigger_event.to_owned(),
        });
    }

    let default_motion_index = *mapping
        .get(default_name)
        .ok_or_else(|| KeelError::asset(path, "invalid default motion"))?;

    Ok(MotionGraph::new(
        motions,
        transitions,
        mapping,
        default_motion_index,
    ))
}
