use glam::{Vec3, Vec4};

use super::state::EffectInner;
use super::stream::{Stream, StreamMask};
use crate::errors::{KeelError, Result};

/// Mutates one or more streams over all live particles each frame.
///
/// Updaters run in declared order and process whole 4-wide lanes; the
/// 4-aligned stream capacity guarantees the lanes past the live count are
/// allocated (their values are garbage and harmless).
pub trait ParticleUpdater: Send + Sync {
    /// Advances the streams this updater owns by `elapsed_time`.
    fn update(&self, effect: &mut EffectInner, elapsed_time: f32);

    /// Streams this updater reads or writes.
    fn stream_mask(&self) -> StreamMask;
}

#[inline]
fn live_lanes(particle_count: usize) -> usize {
    particle_count.div_ceil(4)
}

// ============================================================================
// Lifetime
// ============================================================================

/// `current_lifetime += elapsed_time`.
#[derive(Default)]
pub struct LifetimeUpdater;

impl ParticleUpdater for LifetimeUpdater {
    fn update(&self, effect: &mut EffectInner, elapsed_time: f32) {
        let lanes = live_lanes(effect.particle_count);
        let [current] = effect.streams.disjoint_lanes_mut([Stream::CurrentLifetime]);
        let elapsed = Vec4::splat(elapsed_time);

        for lane in &mut current[..lanes] {
            *lane += elapsed;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::CURRENT_LIFETIME
    }
}

// ============================================================================
// Frame
// ============================================================================

/// `frame += elapsed_time * framerate`.
pub struct FrameUpdater {
    framerate: f32,
}

impl FrameUpdater {
    /// Spritesheet playback at `framerate` frames per second.
    #[must_use]
    pub fn new(framerate: f32) -> Self {
        Self { framerate }
    }
}

impl ParticleUpdater for FrameUpdater {
    fn update(&self, effect: &mut EffectInner, elapsed_time: f32) {
        let lanes = live_lanes(effect.particle_count);
        let [frame] = effect.streams.disjoint_lanes_mut([Stream::Frame]);
        let step = Vec4::splat(elapsed_time * self.framerate);

        for lane in &mut frame[..lanes] {
            *lane += step;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::FRAME
    }
}

// ============================================================================
// Position
// ============================================================================

/// `position += generated_velocity * velocity * elapsed_time`, per axis.
#[derive(Default)]
pub struct PositionUpdater;

impl PositionUpdater {
    fn integrate_axis(
        effect: &mut EffectInner,
        position: Stream,
        generated_velocity: Stream,
        velocity: Stream,
        elapsed: Vec4,
    ) {
        let lanes = live_lanes(effect.particle_count);
        let [position, generated_velocity, velocity] =
            effect
                .streams
                .disjoint_lanes_mut([position, generated_velocity, velocity]);

        for index in 0..lanes {
            position[index] =
                (generated_velocity[index] * velocity[index]).mul_add(elapsed, position[index]);
        }
    }
}

impl ParticleUpdater for PositionUpdater {
    fn update(&self, effect: &mut EffectInner, elapsed_time: f32) {
        let elapsed = Vec4::splat(elapsed_time);
        Self::integrate_axis(
            effect,
            Stream::PositionX,
            Stream::GeneratedVelocityX,
            Stream::VelocityX,
            elapsed,
        );
        Self::integrate_axis(
            effect,
            Stream::PositionY,
            Stream::GeneratedVelocityY,
            Stream::VelocityY,
            elapsed,
        );
        Self::integrate_axis(
            effect,
            Stream::PositionZ,
            Stream::GeneratedVelocityZ,
            Stream::VelocityZ,
            elapsed,
        );
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::POSITION_X
            | StreamMask::POSITION_Y
            | StreamMask::POSITION_Z
            | StreamMask::VELOCITY_X
            | StreamMask::VELOCITY_Y
            | StreamMask::VELOCITY_Z
            | StreamMask::GENERATED_VELOCITY_X
            | StreamMask::GENERATED_VELOCITY_Y
            | StreamMask::GENERATED_VELOCITY_Z
    }
}

// ============================================================================
// Over-lifetime curves
// ============================================================================

/// A sampled curve over normalized particle age.
///
/// Inputs are sorted keys on `[0, 1]`, first exactly 0 and last exactly 1;
/// outputs carry `arity` components per key. Evaluation is a branchless
/// 4-wide sweep over the segments: each segment overwrites the result for
/// lanes whose age passed its start, so the last covering segment wins.
pub struct OverLifetimeCurve {
    inputs: Vec<f32>,
    outputs: Vec<f32>,
    arity: usize,
}

impl OverLifetimeCurve {
    /// Validates and wraps curve data. `outputs` is `arity` components per
    /// input key.
    pub fn new(inputs: Vec<f32>, outputs: Vec<f32>, arity: usize) -> Result<Self> {
        if inputs.len() < 2 {
            return Err(KeelError::Invariant(
                "over-lifetime curve needs at least two keys".to_owned(),
            ));
        }
        if inputs[0] != 0.0 || inputs[inputs.len() - 1] != 1.0 {
            return Err(KeelError::Invariant(
                "over-lifetime curve must start at 0 and end at 1".to_owned(),
            ));
        }
        if outputs.len() != inputs.len() * arity {
            return Err(KeelError::Invariant(
                "over-lifetime curve outputs do not match inputs".to_owned(),
            ));
        }
        Ok(Self {
            inputs,
            outputs,
            arity,
        })
    }

    fn update_stream(&self, effect: &mut EffectInner, target: Stream, component: usize) {
        let lanes = live_lanes(effect.particle_count);
        let [target, total, current] = effect.streams.disjoint_lanes_mut([
            target,
            Stream::TotalLifetime,
            Stream::CurrentLifetime,
        ]);

        for index in 0..lanes {
            let age = current[index] / total[index];

            let mut previous_input = Vec4::splat(self.inputs[0]);
            let mut previous_output = Vec4::splat(self.outputs[component]);
            let mut output = previous_output;

            for key in 1..self.inputs.len() {
                let current_input = Vec4::splat(self.inputs[key]);
                let current_output = Vec4::splat(self.outputs[key * self.arity + component]);

                let relative = (age - previous_input) / (current_input - previous_input);
                let candidate =
                    (current_output - previous_output).mul_add(relative, previous_output);
                let mask = relative.cmpge(Vec4::ZERO);

                output = Vec4::select(mask, candidate, output);
                previous_output = current_output;
                previous_input = current_input;
            }

            target[index] = output;
        }
    }
}

macro_rules! over_lifetime_updater {
    ($(#[$doc:meta])* $name:ident, $arity:expr, [$($stream:expr),+], $mask:expr) => {
        $(#[$doc])*
        pub struct $name {
            curve: OverLifetimeCurve,
        }

        impl $name {
            /// Wraps validated curve data.
            pub fn new(inputs: Vec<f32>, outputs: Vec<f32>) -> Result<Self> {
                Ok(Self {
                    curve: OverLifetimeCurve::new(inputs, outputs, $arity)?,
                })
            }
        }

        impl ParticleUpdater for $name {
            fn update(&self, effect: &mut EffectInner, _elapsed_time: f32) {
                for (component, stream) in [$($stream),+].into_iter().enumerate() {
                    self.curve.update_stream(effect, stream, component);
                }
            }

            fn stream_mask(&self) -> StreamMask {
                $mask | StreamMask::TOTAL_LIFETIME | StreamMask::CURRENT_LIFETIME
            }
        }
    };
}

over_lifetime_updater!(
    /// Velocity multiplier sampled over particle age.
    VelocityOverLifetimeUpdater,
    3,
    [Stream::VelocityX, Stream::VelocityY, Stream::VelocityZ],
    StreamMask::VELOCITY_X | StreamMask::VELOCITY_Y | StreamMask::VELOCITY_Z
);

over_lifetime_updater!(
    /// Color sampled over particle age.
    ColorOverLifetimeUpdater,
    3,
    [Stream::ColorR, Stream::ColorG, Stream::ColorB],
    StreamMask::COLOR_R | StreamMask::COLOR_G | StreamMask::COLOR_B
);

over_lifetime_updater!(
    /// Alpha sampled over particle age.
    AlphaOverLifetimeUpdater,
    1,
    [Stream::ColorA],
    StreamMask::COLOR_A
);

over_lifetime_updater!(
    /// Scale sampled over particle age.
    ScaleOverLifetimeUpdater,
    3,
    [Stream::ScaleX, Stream::ScaleY, Stream::ScaleZ],
    StreamMask::SCALE_X | StreamMask::SCALE_Y | StreamMask::SCALE_Z
);

// ============================================================================
// Scale by speed
// ============================================================================

/// Multiplies scale by `|generated_velocity * velocity| * speed_scale`.
pub struct ScaleBySpeedUpdater {
    speed_scale: Vec3,
}

impl ScaleBySpeedUpdater {
    /// Per-axis speed-to-scale factor.
    #[must_use]
    pub fn new(speed_scale: Vec3) -> Self {
        Self { speed_scale }
    }
}

impl ParticleUpdater for ScaleBySpeedUpdater {
    fn update(&self, effect: &mut EffectInner, _elapsed_time: f32) {
        let lanes = live_lanes(effect.particle_count);
        let [scale_x, scale_y, scale_z, generated_x, generated_y, generated_z, velocity_x, velocity_y, velocity_z] =
            effect.streams.disjoint_lanes_mut([
                Stream::ScaleX,
                Stream::ScaleY,
                Stream::ScaleZ,
                Stream::GeneratedVelocityX,
                Stream::GeneratedVelocityY,
                Stream::GeneratedVelocityZ,
                Stream::VelocityX,
                Stream::VelocityY,
                Stream::VelocityZ,
            ]);

        let speed_scale_x = Vec4::splat(self.speed_scale.x);
        let speed_scale_y = Vec4::splat(self.speed_scale.y);
        let speed_scale_z = Vec4::splat(self.speed_scale.z);

        for index in 0..lanes {
            let final_x = generated_x[index] * velocity_x[index];
            let final_y = generated_y[index] * velocity_y[index];
            let final_z = generated_z[index] * velocity_z[index];

            let speed = final_x
                .mul_add(final_x, final_y.mul_add(final_y, final_z * final_z))
                .powf(0.5);

            scale_x[index] *= speed * speed_scale_x;
            scale_y[index] *= speed * speed_scale_y;
            scale_z[index] *= speed * speed_scale_z;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::SCALE_X
            | StreamMask::SCALE_Y
            | StreamMask::SCALE_Z
            | StreamMask::VELOCITY_X
            | StreamMask::VELOCITY_Y
            | StreamMask::VELOCITY_Z
            | StreamMask::GENERATED_VELOCITY_X
            | StreamMask::GENERATED_VELOCITY_Y
            | StreamMask::GENERATED_VELOCITY_Z
    }
}
