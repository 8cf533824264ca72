use glam::Vec3;

use super::random::ParticleRandom;
use super::state::EffectInner;
use super::stream::{Stream, StreamMask};

/// Produces initial values for a subset of streams over a newly-emitted
/// particle range.
///
/// Exactly one generator per stream is permitted; the particle system
/// validates that at load time.
pub trait ParticleGenerator: Send + Sync {
    /// Fills `[begin, end)` of the streams this generator owns.
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    );

    /// Streams this generator writes.
    fn stream_mask(&self) -> StreamMask;
}

// ============================================================================
// Position
// ============================================================================

/// Spawns particles uniformly inside a cylinder given in primitive-local
/// space, written out in world space.
pub struct CylinderPositionGenerator {
    origin: Vec3,
    radius: f32,
    height: f32,
}

impl CylinderPositionGenerator {
    /// Cylinder with `origin` at the base center, extending `height` along
    /// local Y.
    #[must_use]
    pub fn new(origin: Vec3, radius: f32, height: f32) -> Self {
        Self {
            origin,
            radius,
            height,
        }
    }
}

impl ParticleGenerator for CylinderPositionGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let global_transform = effect.global_transform;
        let [position_x, position_y, position_z] = effect.streams.disjoint_mut([
            Stream::PositionX,
            Stream::PositionY,
            Stream::PositionZ,
        ]);

        for index in begin..end {
            let height = self.height * random.rand_float();
            let radius = (self.radius * random.rand_float()).sqrt();
            let angle = std::f32::consts::TAU * random.rand_float();

            let local = self.origin + Vec3::new(radius * angle.cos(), height, radius * angle.sin());
            let point = global_transform.transform_point(local);

            position_x[index] = point.x;
            position_y[index] = point.y;
            position_z[index] = point.z;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::POSITION_X | StreamMask::POSITION_Y | StreamMask::POSITION_Z
    }
}

// ============================================================================
// Lifetime
// ============================================================================

/// Random total lifetime in `[min, max]`; current lifetime starts at zero.
pub struct LifetimeGenerator {
    lifetime_range: f32,
    lifetime_offset: f32,
}

impl LifetimeGenerator {
    /// Lifetime drawn uniformly between `min_lifetime` and `max_lifetime`.
    #[must_use]
    pub fn new(min_lifetime: f32, max_lifetime: f32) -> Self {
        Self {
            lifetime_range: max_lifetime - min_lifetime,
            lifetime_offset: min_lifetime,
        }
    }
}

impl ParticleGenerator for LifetimeGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let [total, current] = effect
            .streams
            .disjoint_mut([Stream::TotalLifetime, Stream::CurrentLifetime]);

        for value in &mut total[begin..end] {
            *value = random.rand_float() * self.lifetime_range + self.lifetime_offset;
        }
        current[begin..end].fill(0.0);
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::TOTAL_LIFETIME | StreamMask::CURRENT_LIFETIME
    }
}

// ============================================================================
// Velocity
// ============================================================================

/// Random launch direction in a local-space range, rotated into world space
/// by the primitive's global transform. The velocity multiplier streams are
/// initialized to one so updaters can scale them over lifetime.
pub struct VelocityGenerator {
    velocity_range: Vec3,
    velocity_offset: Vec3,
}

impl VelocityGenerator {
    /// Direction drawn component-wise between `min_velocity` and
    /// `max_velocity`.
    #[must_use]
    pub fn new(min_velocity: Vec3, max_velocity: Vec3) -> Self {
        Self {
            velocity_range: max_velocity - min_velocity,
            velocity_offset: min_velocity,
        }
    }
}

impl ParticleGenerator for VelocityGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let global_transform = effect.global_transform;
        let [generated_x, generated_y, generated_z, velocity_x, velocity_y, velocity_z] =
            effect.streams.disjoint_mut([
                Stream::GeneratedVelocityX,
                Stream::GeneratedVelocityY,
                Stream::GeneratedVelocityZ,
                Stream::VelocityX,
                Stream::VelocityY,
                Stream::VelocityZ,
            ]);

        for index in begin..end {
            let local = random.rand_vec3() * self.velocity_range + self.velocity_offset;
            let direction = global_transform.transform_direction(local);

            generated_x[index] = direction.x;
            generated_y[index] = direction.y;
            generated_z[index] = direction.z;
        }

        velocity_x[begin..end].fill(1.0);
        velocity_y[begin..end].fill(1.0);
        velocity_z[begin..end].fill(1.0);
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::GENERATED_VELOCITY_X
            | StreamMask::GENERATED_VELOCITY_Y
            | StreamMask::GENERATED_VELOCITY_Z
            | StreamMask::VELOCITY_X
            | StreamMask::VELOCITY_Y
            | StreamMask::VELOCITY_Z
    }
}

// ============================================================================
// Scale
// ============================================================================

/// Random spawn scale. Uniform mode draws one factor applied to every axis;
/// otherwise each axis is drawn separately.
pub struct ScaleGenerator {
    scale_range: Vec3,
    scale_offset: Vec3,
    is_uniform: bool,
}

impl ScaleGenerator {
    /// Scale drawn between `min_scale` and `max_scale`.
    #[must_use]
    pub fn new(is_uniform: bool, min_scale: Vec3, max_scale: Vec3) -> Self {
        Self {
            scale_range: max_scale - min_scale,
            scale_offset: min_scale,
            is_uniform,
        }
    }
}

impl ParticleGenerator for ScaleGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let [scale_x, scale_y, scale_z] = effect.streams.disjoint_mut([
            Stream::GeneratedScaleX,
            Stream::GeneratedScaleY,
            Stream::GeneratedScaleZ,
        ]);

        if self.is_uniform {
            for index in begin..end {
                let factor = random.rand_float();
                scale_x[index] = factor * self.scale_range.x + self.scale_offset.x;
                scale_y[index] = factor * self.scale_range.y + self.scale_offset.y;
                scale_z[index] = factor * self.scale_range.z + self.scale_offset.z;
            }
        } else {
            for value in &mut scale_x[begin..end] {
                *value = random.rand_float() * self.scale_range.x + self.scale_offset.x;
            }
            for value in &mut scale_y[begin..end] {
                *value = random.rand_float() * self.scale_range.y + self.scale_offset.y;
            }
            for value in &mut scale_z[begin..end] {
                *value = random.rand_float() * self.scale_range.z + self.scale_offset.z;
            }
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::GENERATED_SCALE_X | StreamMask::GENERATED_SCALE_Y | StreamMask::GENERATED_SCALE_Z
    }
}

// ============================================================================
// Color / alpha / frame
// ============================================================================

/// Random tint between two colors, one draw per particle.
pub struct ColorGenerator {
    color_range: Vec3,
    color_offset: Vec3,
}

impl ColorGenerator {
    /// Tint drawn on the segment between `min_color` and `max_color`.
    #[must_use]
    pub fn new(min_color: Vec3, max_color: Vec3) -> Self {
        Self {
            color_range: max_color - min_color,
            color_offset: min_color,
        }
    }
}

impl ParticleGenerator for ColorGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let [color_r, color_g, color_b] =
            effect
                .streams
                .disjoint_mut([Stream::ColorR, Stream::ColorG, Stream::ColorB]);

        for index in begin..end {
            let factor = random.rand_float();
            color_r[index] = factor * self.color_range.x + self.color_offset.x;
            color_g[index] = factor * self.color_range.y + self.color_offset.y;
            color_b[index] = factor * self.color_range.z + self.color_offset.z;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::COLOR_R | StreamMask::COLOR_G | StreamMask::COLOR_B
    }
}

/// Random spawn alpha in `[min, max]`.
pub struct AlphaGenerator {
    alpha_range: f32,
    alpha_offset: f32,
}

impl AlphaGenerator {
    /// Alpha drawn uniformly between `min_alpha` and `max_alpha`.
    #[must_use]
    pub fn new(min_alpha: f32, max_alpha: f32) -> Self {
        Self {
            alpha_range: max_alpha - min_alpha,
            alpha_offset: min_alpha,
        }
    }
}

impl ParticleGenerator for AlphaGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let [alpha] = effect.streams.disjoint_mut([Stream::ColorA]);
        for value in &mut alpha[begin..end] {
            *value = random.rand_float() * self.alpha_range + self.alpha_offset;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::COLOR_A
    }
}

/// Random spritesheet start frame in `[min, max]`.
pub struct FrameGenerator {
    frame_range: f32,
    frame_offset: f32,
}

impl FrameGenerator {
    /// Start frame drawn uniformly between `min_frame` and `max_frame`.
    #[must_use]
    pub fn new(min_frame: f32, max_frame: f32) -> Self {
        Self {
            frame_range: max_frame - min_frame,
            frame_offset: min_frame,
        }
    }
}

impl ParticleGenerator for FrameGenerator {
    fn generate(
        &self,
        effect: &mut EffectInner,
        begin: usize,
        end: usize,
        random: &mut ParticleRandom,
    ) {
        let [frame] = effect.streams.disjoint_mut([Stream::Frame]);
        for value in &mut frame[begin..end] {
            *value = random.rand_float() * self.frame_range + self.frame_offset;
        }
    }

    fn stream_mask(&self) -> StreamMask {
        StreamMask::FRAME
    }
}
