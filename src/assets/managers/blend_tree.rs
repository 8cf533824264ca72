use std::sync::Arc;

use serde_json::Value;

use super::binary::AnimationManager;
use crate::animation::{BlendTree, BlendTreeNode};
use crate::assets::handle::ResourceHandle;
use crate::assets::notifier::ResourceNotifier;
use crate::assets::registry::ResourceRegistry;
use crate::assets::tree;
use crate::errors::{KeelError, Result};
use crate::tasks::{Task, TaskScheduler};

/// Streams blend-tree resource files.
///
/// A blend tree file is a single node tree; animation leaves route their
/// references through the animation manager, so loading a blend tree pulls
/// its animations on the next frame's begin.
pub struct BlendTreeManager {
    registry: ResourceRegistry<BlendTree>,
    notifier: Arc<ResourceNotifier<BlendTree>>,
    scheduler: Arc<TaskScheduler>,
    animation_manager: Arc<AnimationManager>,
}

impl BlendTreeManager {
    /// Creates the blend-tree manager.
    #[must_use]
    pub fn new(
        scheduler: Arc<TaskScheduler>,
        animation_manager: Arc<AnimationManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: ResourceRegistry::new(),
            notifier: Arc::new(ResourceNotifier::new()),
            scheduler,
            animation_manager,
        })
    }

    /// Looks up or enqueues a blend tree; an empty path yields the null
    /// handle.
    pub fn load(&self, relative_path: &str) -> Option<ResourceHandle<BlendTree>> {
        self.registry.load(relative_path)
    }

    /// The loaded-event notifier.
    #[must_use]
    pub fn notifier(&self) -> &Arc<ResourceNotifier<BlendTree>> {
        &self.notifier
    }

    /// Reverse path lookup, for tools.
    #[must_use]
    pub fn relative_path(&self, handle: &ResourceHandle<BlendTree>) -> Option<String> {
        self.registry.relative_path(handle)
    }

    /// Builds this frame's `(begin, end)` task pair.
    pub fn create_tasks(self: &Arc<Self>) -> (Task, Task) {
        let end_task = Task::noop("blend tree manager end");

        let manager = Arc::clone(self);
        let begin_end = end_task.clone();
        let begin_task = Task::new("blend tree manager begin", move || {
            for (path, handle) in manager.registry.begin_frame() {
                let worker_manager = Arc::clone(&manager);
                let worker = Task::new("blend tree manager worker", move || {
                    let text = std::fs::read_to_string(&path)
                        .map_err(|error| KeelError::asset(&path, format!("failed to open: {error}")))?;
                    let root: Value = serde_json::from_str(&text)?;

                    let node = node_from_tree(&worker_manager.animation_manager, &root, &path)?;
                    handle.publish(BlendTree::from_root(node));
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

fn node_from_tree(
    animation_manager: &AnimationManager,
    node: &Value,
    path: &str,
) -> Result<BlendTreeNode> {
    let object = tree::object(node, path)?;
    let kind = tree::string(tree::field(object, "type", path)?, path)?;

    match kind {
        "animation" => {
            let animation_path = tree::string(tree::field(object, "animation", path)?, path)?;
            Ok(BlendTreeNode::Animation {
                animation: animation_manager.load(animation_path),
            })
        }
        "lerp" => {
            let attribute = tree::string(tree::field(object, "attribute", path)?, path)?;
            let child_nodes = tree::array(tree::field(object, "children", path)?, path)?;
            if child_nodes.is_empty() {
                return Err(KeelError::asset(path, "lerp node requires children"));
            }

            let mut children = Vec::with_capacity(child_nodes.len());
            for child in child_nodes {
                let child_object = tree::object(child, path)?;
                let key = tree::number(tree::field(child_object, "key", path)?, path)?;
                let subtree =
                    node_from_tree(animation_manager, tree::field(child_object, "node", path)?, path)?;
                children.push((key, subtree));
            }

            children.sort_by(|(lhs, _), (rhs, _)| lhs.total_cmp(rhs));
            if children.windows(2).any(|pair| pair[0].0 == pair[1].0) {
                return Err(KeelError::asset(
                    path,
                    "lerp children with the same key are illegal",
                ));
            }

            Ok(BlendTreeNode::Lerp {
                attribute: attribute.to_owned(),
                children,
            })
        }
        _ => Err(KeelError::asset(
            path,
            format!("unknown blend tree node type \"{kind}\""),
        )),
    }
}
