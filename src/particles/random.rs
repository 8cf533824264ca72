use glam::{Vec3, Vec4};

use parking_lot::{Mutex, MutexGuard};

// Powers of the LCG multiplier, 16807^1..4 mod 2^32. The 4-lane helpers
// step the generator once per lane, then advance the seed by the product.
const MULTIPLIERS: [i32; 4] = [16_807, 282_475_249, 1_622_647_863, -1_199_696_159];

/// Pseudo-random generator for particle emission.
///
/// A 16807 multiplicative congruential generator with a mantissa trick: the
/// low 24 seed bits are spliced into a float in `[1, 2)` and shifted down to
/// `[0, 1)`. Not cryptographic and not statistically strong, but fast and
/// good enough for spawn jitter.
pub struct ParticleRandom {
    seed: i32,
}

static GLOBAL: Mutex<ParticleRandom> = Mutex::new(ParticleRandom::new(1_890_424_906));

impl ParticleRandom {
    /// Creates a generator from a seed.
    #[must_use]
    pub const fn new(seed: i32) -> Self {
        Self { seed }
    }

    /// The process-wide instance the particle workers draw from.
    pub fn global() -> MutexGuard<'static, ParticleRandom> {
        GLOBAL.lock()
    }

    /// One uniform in `[0, 1)`.
    pub fn rand_float(&mut self) -> f32 {
        self.seed = self.seed.wrapping_mul(MULTIPLIERS[0]);
        mantissa_to_unit(self.seed)
    }

    /// Three uniforms in `[0, 1)`.
    pub fn rand_vec3(&mut self) -> Vec3 {
        Vec3::new(self.rand_float(), self.rand_float(), self.rand_float())
    }

    /// Four uniforms in `[0, 1)`.
    pub fn rand_vec4(&mut self) -> Vec4 {
        Vec4::new(
            self.rand_float(),
            self.rand_float(),
            self.rand_float(),
            self.rand_float(),
        )
    }

    /// One 4-wide lane of uniforms in `[0, 1)`.
    pub fn rand_lane4(&mut self) -> Vec4 {
        let lanes = MULTIPLIERS.map(|multiplier| mantissa_to_unit(self.seed.wrapping_mul(multiplier)));
        self.seed = self.seed.wrapping_mul(MULTIPLIERS[3]);
        Vec4::from_array(lanes)
    }

    /// One 4-wide lane with three uniforms in `[0, 1)`; the fourth component
    /// is zero.
    pub fn rand_lane3(&mut self) -> Vec4 {
        let result = Vec4::new(
            mantissa_to_unit(self.seed.wrapping_mul(MULTIPLIERS[0])),
            mantissa_to_unit(self.seed.wrapping_mul(MULTIPLIERS[1])),
            mantissa_to_unit(self.seed.wrapping_mul(MULTIPLIERS[2])),
            0.0,
        );
        self.seed = self.seed.wrapping_mul(MULTIPLIERS[2]);
        result
    }
}

#[inline]
fn mantissa_to_unit(seed: i32) -> f32 {
    // Splice the low 24 bits into [1, 2), then shift to [0, 1).
    f32::from_bits(0x3F80_0000 | (seed as u32 & 0x00FF_FFFF)) - 1.0
}
