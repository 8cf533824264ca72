use glam::{Quat, Vec3};

use super::reader::BinaryReader;
use crate::animation::{Animation, JointKeyframe, JointTrack};
use crate::errors::Result;
use crate::math::Transform;

const KWA_MAGIC: [u8; 4] = *b"KWA ";

/// Parses a `.kwa` animation file.
///
/// Layout: magic, `u32` joint count, then per joint a `u32` keyframe count
/// followed by `{f32 timestamp, float3 translation, float4 rotation,
/// float3 scale}` records.
pub fn parse_animation(data: &[u8], path: &str) -> Result<Animation> {
    let mut reader = BinaryReader::new(data, path);
    reader.expect_magic(KWA_MAGIC)?;

    let joint_count = reader.read_u32()?;

    let mut tracks = Vec::with_capacity(joint_count as usize);
    for _ in 0..joint_count {
        let keyframe_count = reader.read_u32()?;

        let mut keyframes = Vec::with_capacity(keyframe_count as usize);
        for _ in 0..keyframe_count {
            let record: [f32; 11] = reader.read_pod()?;
            keyframes.push(JointKeyframe {
                timestamp: record[0],
                transform: Transform::new(
                    Vec3::new(record[1], record[2], record[3]),
                    Quat::from_xyzw(record[4], record[5], record[6], record[7]),
                    Vec3::new(record[8], record[9], record[10]),
                ),
            });
        }

        tracks.push(JointTrack { keyframes });
    }

    Animation::from_tracks(tracks, path)
}
