use glam::{Mat4, Vec3};

use super::reader::BinaryReader;
use crate::errors::{KeelError, Result};
use crate::math::Aabb;
use crate::resources::geometry::{Geometry, Indices, Skeleton, SkinnedVertex, Vertex};

const KWG_MAGIC: [u8; 4] = *b"KWG ";

/// Joint parent index marking the skeleton root.
pub const JOINT_NONE: u32 = u32::MAX;

/// Parses a `.kwg` geometry file.
///
/// Layout: magic; `u32` vertex, skinned-vertex, index and joint counts; 6 ×
/// `f32` bounds (center, extent); vertex records; skinned-vertex records;
/// indices (`u16` while `vertex_count < 65535`, `u32` otherwise); joint
/// parent indices; inverse-bind matrices; bind matrices; length-prefixed
/// joint names.
pub fn parse_geometry(data: &[u8], path: &str) -> Result<Geometry> {
    let mut reader = BinaryReader::new(data, path);
    reader.expect_magic(KWG_MAGIC)?;

    let vertex_count = reader.read_u32()? as usize;
    let skinned_vertex_count = reader.read_u32()? as usize;
    let index_count = reader.read_u32()? as usize;
    let joint_count = reader.read_u32()? as usize;

    if skinned_vertex_count != 0 && skinned_vertex_count != vertex_count {
        return Err(KeelError::asset(
            path,
            format!(
                "skinned vertex count {skinned_vertex_count} does not match vertex count {vertex_count}"
            ),
        ));
    }

    let bounds_values: [f32; 6] = reader.read_pod()?;
    let bounds = Aabb::new(
        Vec3::new(bounds_values[0], bounds_values[1], bounds_values[2]),
        Vec3::new(bounds_values[3], bounds_values[4], bounds_values[5]),
    );

    let vertices: Vec<Vertex> = reader.read_pod_vec(vertex_count)?;
    let skinned_vertices: Vec<SkinnedVertex> = reader.read_pod_vec(skinned_vertex_count)?;

    let indices = if vertex_count < usize::from(u16::MAX) {
        Indices::U16(reader.read_pod_vec(index_count)?)
    } else {
        Indices::U32(reader.read_pod_vec(index_count)?)
    };

    let skeleton = if joint_count > 0 {
        let parent_joints: Vec<u32> = reader.read_pod_vec(joint_count)?;

        for (joint, &parent) in parent_joints.iter().enumerate() {
            // Parents must precede children so pose matrices build in order.
            if parent != JOINT_NONE && parent as usize >= joint {
                return Err(KeelError::asset(
                    path,
                    format!("joint {joint} has out-of-order parent {parent}"),
                ));
            }
        }

        let inverse_bind_matrices = read_matrices(&mut reader, joint_count)?;
        let bind_matrices = read_matrices(&mut reader, joint_count)?;

        let mut names = Vec::with_capacity(joint_count);
        for _ in 0..joint_count {
            names.push(reader.read_string()?);
        }

        Some(Skeleton::new(
            parent_joints,
            inverse_bind_matrices,
            bind_matrices,
            names,
        ))
    } else {
        None
    };

    Ok(Geometry::new(
        vertices,
        skinned_vertices,
        indices,
        bounds,
        skeleton,
    ))
}

fn read_matrices(reader: &mut BinaryReader<'_>, count: usize) -> Result<Vec<Mat4>> {
    let values: Vec<f32> = reader.read_pod_vec(count * 16)?;
    Ok(values
        .chunks_exact(16)
        .map(|chunk| Mat4::from_cols_array(chunk.try_into().expect("chunk of 16")))
        .collect())
}
