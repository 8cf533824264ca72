use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::assets::Resource;
use crate::assets::formats::JOINT_NONE;
use crate::math::Aabb;

/// One vertex record of a `.kwg` file.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Tangent with handedness in `w`.
    pub tangent: [f32; 4],
    /// First UV channel.
    pub texcoord_0: [f32; 2],
}

/// Per-vertex skinning record: joint indices plus unsigned-normalized
/// weights.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SkinnedVertex {
    /// Up to four joint indices.
    pub joints: [u8; 4],
    /// Matching weights, unsigned normalized.
    pub weights: [u8; 4],
}

/// Index buffer, `u16` for small meshes and `u32` otherwise.
#[derive(Debug, Clone)]
pub enum Indices {
    /// 16-bit indices (`vertex_count < 65535`).
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl Indices {
    /// Number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(indices) => indices.len(),
            Indices::U32(indices) => indices.len(),
        }
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Indices {
    fn default() -> Self {
        Indices::U16(Vec::new())
    }
}

/// Joint hierarchy with bind data.
///
/// Joints are ordered parents-first: a joint's parent index is strictly less
/// than its own, which lets pose matrices build in one pass.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    parent_joints: Vec<u32>,
    inverse_bind_matrices: Vec<Mat4>,
    bind_matrices: Vec<Mat4>,
    names: Vec<String>,
    name_to_joint: FxHashMap<String, usize>,
}

impl Skeleton {
    /// Builds a skeleton from parsed parts.
    #[must_use]
    pub fn new(
        parent_joints: Vec<u32>,
        inverse_bind_matrices: Vec<Mat4>,
        bind_matrices: Vec<Mat4>,
        names: Vec<String>,
    ) -> Self {
        let name_to_joint = names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        Self {
            parent_joints,
            inverse_bind_matrices,
            bind_matrices,
            names,
            name_to_joint,
        }
    }

    /// Number of joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.parent_joints.len()
    }

    /// Parent of `joint`, `None` for the root.
    #[must_use]
    pub fn parent_joint(&self, joint: usize) -> Option<usize> {
        let parent = self.parent_joints[joint];
        (parent != JOINT_NONE).then_some(parent as usize)
    }

    /// Inverse-bind matrix of `joint`.
    #[must_use]
    pub fn inverse_bind_matrix(&self, joint: usize) -> Mat4 {
        self.inverse_bind_matrices[joint]
    }

    /// Bind matrix of `joint`.
    #[must_use]
    pub fn bind_matrix(&self, joint: usize) -> Mat4 {
        self.bind_matrices[joint]
    }

    /// Name of `joint`.
    #[must_use]
    pub fn joint_name(&self, joint: usize) -> &str {
        &self.names[joint]
    }

    /// Looks a joint up by name.
    #[must_use]
    pub fn joint_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_joint.get(name).copied()
    }
}

/// A mesh asset: vertex/index data, object-space bounds and an optional
/// skeleton.
///
/// Loaded iff the vertex buffer is non-empty.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    skinned_vertices: Vec<SkinnedVertex>,
    indices: Indices,
    bounds: Aabb,
    skeleton: Option<Skeleton>,
}

impl Resource for Geometry {
    fn is_loaded(&self) -> bool {
        !self.vertices.is_empty()
    }
}

impl Geometry {
    /// Builds a geometry from parsed parts.
    #[must_use]
    pub fn new(
        vertices: Vec<Vertex>,
        skinned_vertices: Vec<SkinnedVertex>,
        indices: Indices,
        bounds: Aabb,
        skeleton: Option<Skeleton>,
    ) -> Self {
        Self {
            vertices,
            skinned_vertices,
            indices,
            bounds,
            skeleton,
        }
    }

    /// Vertex records.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Skinning records; empty for rigid meshes.
    #[must_use]
    pub fn skinned_vertices(&self) -> &[SkinnedVertex] {
        &self.skinned_vertices
    }

    /// Index buffer.
    #[must_use]
    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    /// Object-space bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Skeleton, if the mesh is skinned.
    #[must_use]
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }
}
