/// Decides how many particles to spawn this frame.
pub trait ParticleEmitter: Send + Sync {
    /// Number of particles to emit given the primitive's wrapped system time
    /// and the frame delta.
    fn emit(&self, system_time: f32, system_duration: f32, elapsed_time: f32) -> usize;
}

/// Emission rate interpolated over the particle system's lifetime.
///
/// `from` is the per-second rate at time zero, `to` the rate at the end of
/// the system's duration. Emission counts are discretized through the
/// integral `f(t) = (t/D * R + O) * t` with `R = (to - from) / 2` and
/// `O = from`; the frame's count is `floor(f(t)) - floor(f(t - dt))`, which
/// is monotone and never loses fractional particles to frame quantization.
pub struct OverLifetimeEmitter {
    emit_per_second_half_range: f32,
    emit_per_second_offset: f32,
}

impl OverLifetimeEmitter {
    /// Creates an emitter ramping from `from` to `to` particles per second.
    #[must_use]
    pub fn new(emit_per_second_from: f32, emit_per_second_to: f32) -> Self {
        Self {
            emit_per_second_half_range: (emit_per_second_to - emit_per_second_from) / 2.0,
            emit_per_second_offset: emit_per_second_from,
        }
    }
}

impl ParticleEmitter for OverLifetimeEmitter {
    fn emit(&self, system_time: f32, system_duration: f32, elapsed_time: f32) -> usize {
        if system_duration <= 0.0 {
            return 0;
        }

        let current_time = system_time.clamp(0.0, system_duration);
        let previous_time = (system_time - elapsed_time).clamp(0.0, system_duration);

        let current_factor = current_time / system_duration;
        let previous_factor = previous_time / system_duration;

        let current_emitted = (current_factor * self.emit_per_second_half_range
            + self.emit_per_second_offset)
            * current_time;
        let previous_emitted = (previous_factor * self.emit_per_second_half_range
            + self.emit_per_second_offset)
            * previous_time;

        (current_emitted as usize).saturating_sub(previous_emitted as usize)
    }
}
