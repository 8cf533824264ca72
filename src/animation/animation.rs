use crate::assets::Resource;
use crate::errors::{KeelError, Result};
use crate::math::{EPSILON, Transform};

/// One keyframe of one joint.
#[derive(Debug, Clone, Copy)]
pub struct JointKeyframe {
    /// Sample time in seconds. Keyframes of a track are ascending.
    pub timestamp: f32,
    /// Joint-space transform at that time.
    pub transform: Transform,
}

/// All keyframes of one joint.
#[derive(Debug, Clone, Default)]
pub struct JointTrack {
    /// Ascending by timestamp; never empty in a loaded animation.
    pub keyframes: Vec<JointKeyframe>,
}

/// A keyframed animation: one track per joint of the target skeleton.
///
/// `duration` doubles as the loaded flag: an empty slot carries NaN, and
/// `is_loaded` is the self-inequality test on it.
#[derive(Debug, Clone)]
pub struct Animation {
    duration: f32,
    tracks: Vec<JointTrack>,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            duration: f32::NAN,
            tracks: Vec::new(),
        }
    }
}

impl Resource for Animation {
    fn is_loaded(&self) -> bool {
        // NaN sentinel: loaded iff duration equals itself.
        !self.duration.is_nan()
    }
}

impl Animation {
    /// Builds an animation from parsed tracks. Duration is the maximum
    /// keyframe timestamp across all tracks; empty tracks are a parse error.
    pub fn from_tracks(tracks: Vec<JointTrack>, path: &str) -> Result<Self> {
        let mut duration = 0.0_f32;
        for track in &tracks {
            let last = track
                .keyframes
                .last()
                .ok_or_else(|| KeelError::asset(path, "empty joint track"))?;
            duration = duration.max(last.timestamp);
        }

        Ok(Self { duration, tracks })
    }

    /// Duration in seconds (NaN while unloaded).
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Number of joints of the target skeleton.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.tracks.len()
    }

    /// Samples one joint at `timestamp`.
    ///
    /// Time is normalized into `[0, duration)` by wrapping, so sampling past
    /// the end loops the animation. Between keyframes the transform is
    /// interpolated; before the first keyframe it blends from the last one
    /// (the loop seam).
    #[must_use]
    pub fn joint_transform(&self, joint_index: usize, timestamp: f32) -> Transform {
        debug_assert!(self.is_loaded(), "animation is not loaded yet");
        let track = &self.tracks[joint_index];
        let keyframes = &track.keyframes;

        let time = if self.duration > 0.0 {
            timestamp.rem_euclid(self.duration)
        } else {
            0.0
        };

        let next = keyframes.partition_point(|keyframe| keyframe.timestamp < time);
        if next == keyframes.len() {
            let keyframe = keyframes[keyframes.len() - 1];
            return keyframe.transform;
        }

        if next > 0 {
            let previous = &keyframes[next - 1];
            let current = &keyframes[next];
            let factor = (time - previous.timestamp) / (current.timestamp - previous.timestamp);
            previous.transform.lerp(&current.transform, factor)
        } else {
            // Wrap across the loop seam: blend from the last keyframe.
            let previous = &keyframes[keyframes.len() - 1];
            let current = &keyframes[0];
            let factor = if current.timestamp > EPSILON {
                time / current.timestamp
            } else {
                1.0
            };
            previous.transform.lerp(&current.transform, factor)
        }
    }
}
