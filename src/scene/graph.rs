use slotmap::SlotMap;
use smallvec::SmallVec;

use super::primitive::{Primitive, PrimitiveKind};
use super::PrimitiveKey;
use crate::errors::{KeelError, Result};
use crate::math::Transform;

/// Storage and hierarchy logic of the scene graph.
///
/// The graph owns every primitive; containers reference children by key and
/// children reference their parent by key. All transform mutators propagate
/// global transforms through the affected subtree and report every touched
/// primitive so the caller can refresh derived state (bounds, acceleration
/// structures, particle mirrors).
#[derive(Default)]
pub struct SceneGraph {
    primitives: SlotMap<PrimitiveKey, Primitive>,
}

impl SceneGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a detached primitive as a root.
    pub fn insert(&mut self, primitive: Primitive) -> PrimitiveKey {
        debug_assert!(primitive.parent.is_none(), "primitive already has a parent");
        self.primitives.insert(primitive)
    }

    /// Shared access to a primitive.
    #[must_use]
    pub fn get(&self, key: PrimitiveKey) -> Option<&Primitive> {
        self.primitives.get(key)
    }

    /// Mutable access to a primitive.
    ///
    /// Transform fields must be changed through the graph's mutators so the
    /// subtree stays consistent; payload access is what this is for.
    pub fn get_mut(&mut self, key: PrimitiveKey) -> Option<&mut Primitive> {
        self.primitives.get_mut(key)
    }

    /// Whether `key` is alive.
    #[must_use]
    pub fn contains(&self, key: PrimitiveKey) -> bool {
        self.primitives.contains_key(key)
    }

    /// Number of live primitives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Iterates every live primitive.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveKey, &Primitive)> {
        self.primitives.iter()
    }

    /// Iterates every live primitive mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PrimitiveKey, &mut Primitive)> {
        self.primitives.iter_mut()
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Attaches a detached primitive to a container.
    ///
    /// The child must have no parent and must not already be among the
    /// container's children; children keep insertion order. The child enters
    /// the container's coordinate system: its global transform becomes
    /// `parent.global * child.local` and the whole subtree refreshes, with
    /// every touched key appended to `touched`.
    pub fn attach(
        &mut self,
        parent: PrimitiveKey,
        child: PrimitiveKey,
        touched: &mut Vec<PrimitiveKey>,
    ) -> Result<()> {
        match self.primitives.get(parent) {
            None => {
                return Err(KeelError::Invariant("parent primitive is dead".to_owned()));
            }
            Some(primitive) => {
                if !matches!(primitive.kind, PrimitiveKind::Container(_)) {
                    return Err(KeelError::Invariant(
                        "only containers own children".to_owned(),
                    ));
                }
            }
        }
        {
            let child_primitive = self
                .primitives
                .get(child)
                .ok_or_else(|| KeelError::Invariant("child primitive is dead".to_owned()))?;
            if child_primitive.parent.is_some() {
                return Err(KeelError::Invariant(
                    "primitive already has a parent".to_owned(),
                ));
            }
        }

        let parent_global = self.primitives[parent].global_transform;

        debug_assert!(
            !self.primitives[parent].children.contains(&child),
            "primitive is already a child of this container"
        );
        self.primitives[parent].children.push(child);

        let child_primitive = &mut self.primitives[child];
        child_primitive.parent = Some(parent);
        child_primitive.global_transform = parent_global.mul(&child_primitive.local_transform);

        self.propagate(child, touched);
        Ok(())
    }

    /// Inserts a fresh primitive directly as a child of `parent`.
    pub fn add_child(
        &mut self,
        parent: PrimitiveKey,
        primitive: Primitive,
        touched: &mut Vec<PrimitiveKey>,
    ) -> Result<PrimitiveKey> {
        let child = self.insert(primitive);
        self.attach(parent, child, touched)?;
        Ok(child)
    }

    /// Detaches a primitive from its parent, keeping its subtree alive.
    ///
    /// The primitive leaves the parent's coordinate system: its global
    /// transform becomes its local transform and the subtree refreshes.
    /// Removal preserves the order of the remaining children.
    pub fn detach(&mut self, child: PrimitiveKey, touched: &mut Vec<PrimitiveKey>) {
        let Some(parent) = self.primitives.get(child).and_then(|primitive| primitive.parent)
        else {
            return;
        };

        let children = &mut self.primitives[parent].children;
        let position = children
            .iter()
            .position(|stored| *stored == child)
            .expect("child list out of sync");
        children.remove(position);

        let child_primitive = &mut self.primitives[child];
        child_primitive.parent = None;
        child_primitive.global_transform = child_primitive.local_transform;

        self.propagate(child, touched);
    }

    /// Removes a primitive and its whole subtree from the graph, collecting
    /// the removed primitives (depth-first, parents before children).
    ///
    /// The primitive unlinks itself from its parent first, so an attached
    /// subtree disappears cleanly from the hierarchy.
    pub fn destroy(&mut self, key: PrimitiveKey, removed: &mut Vec<(PrimitiveKey, Primitive)>) {
        if let Some(parent) = self.primitives.get(key).and_then(|primitive| primitive.parent) {
            let children = &mut self.primitives[parent].children;
            if let Some(position) = children.iter().position(|stored| *stored == key) {
                children.remove(position);
            }
        }

        let mut keys = Vec::new();
        self.collect_subtree(key, &mut keys);
        for key in keys {
            if let Some(primitive) = self.primitives.remove(key) {
                removed.push((key, primitive));
            }
        }
    }

    /// Collects a subtree depth-first, parents before children.
    pub fn collect_subtree(&self, key: PrimitiveKey, output: &mut Vec<PrimitiveKey>) {
        let Some(primitive) = self.primitives.get(key) else {
            return;
        };
        output.push(key);
        let children: SmallVec<[PrimitiveKey; 8]> = SmallVec::from_slice(&primitive.children);
        for child in children {
            self.collect_subtree(child, output);
        }
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    /// Sets the local transform and rederives the subtree's globals.
    pub fn set_local_transform(
        &mut self,
        key: PrimitiveKey,
        transform: Transform,
        touched: &mut Vec<PrimitiveKey>,
    ) {
        let Some(primitive) = self.primitives.get(key) else {
            return;
        };
        let parent_global = primitive
            .parent
            .map(|parent| self.primitives[parent].global_transform);

        let primitive = &mut self.primitives[key];
        primitive.local_transform = transform;
        primitive.global_transform = match parent_global {
            Some(parent_global) => parent_global.mul(&transform),
            None => transform,
        };

        self.propagate(key, touched);
    }

    /// Sets the global transform and rederives the local one as
    /// `parent.global.inverse() * global`, then refreshes the subtree.
    pub fn set_global_transform(
        &mut self,
        key: PrimitiveKey,
        transform: Transform,
        touched: &mut Vec<PrimitiveKey>,
    ) {
        let Some(primitive) = self.primitives.get(key) else {
            return;
        };
        let parent_global = primitive
            .parent
            .map(|parent| self.primitives[parent].global_transform);

        let primitive = &mut self.primitives[key];
        primitive.global_transform = transform;
        primitive.local_transform = match parent_global {
            Some(parent_global) => parent_global.inverse().mul(&transform),
            None => transform,
        };

        self.propagate(key, touched);
    }

    /// Convenience: replaces only the local translation.
    pub fn set_local_translation(
        &mut self,
        key: PrimitiveKey,
        translation: glam::Vec3,
        touched: &mut Vec<PrimitiveKey>,
    ) {
        if let Some(primitive) = self.primitives.get(key) {
            let mut transform = primitive.local_transform;
            transform.translation = translation;
            self.set_local_transform(key, transform, touched);
        }
    }

    /// Rederives global transforms below `key` (whose own global is already
    /// current) and appends every visited primitive to `touched`.
    fn propagate(&mut self, key: PrimitiveKey, touched: &mut Vec<PrimitiveKey>) {
        touched.push(key);

        let children: SmallVec<[PrimitiveKey; 8]> =
            SmallVec::from_slice(&self.primitives[key].children);
        let global = self.primitives[key].global_transform;

        for child in children {
            let child_primitive = &mut self.primitives[child];
            child_primitive.global_transform = global.mul(&child_primitive.local_transform);
            self.propagate(child, touched);
        }
    }
}
