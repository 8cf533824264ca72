//! Data-oriented particle simulation.
//!
//! Particle attributes live in a stream-of-arrays layout: one dense `f32`
//! array per attribute, 16-byte aligned with length rounded up to a multiple
//! of four, so the update kernels run 4-wide without tail handling. The
//! per-frame pipeline per primitive is kill (compaction), emit (emitters +
//! generators over the new range) and update (updaters in declared order).

mod emitters;
mod generators;
mod player;
mod random;
pub mod reflection;
mod state;
mod stream;
mod system;
mod updaters;

pub use emitters::{OverLifetimeEmitter, ParticleEmitter};
pub use generators::{
    AlphaGenerator, ColorGenerator, CylinderPositionGenerator, FrameGenerator, LifetimeGenerator,
    ParticleGenerator, ScaleGenerator, VelocityGenerator,
};
pub use player::ParticleSystemPlayer;
pub use random::ParticleRandom;
pub use state::{EffectInner, ParticleEffectState};
pub use stream::{ParticleStreams, Stream, StreamBuffer, StreamMask, STREAM_COUNT};
pub use system::{ParticleSystem, ParticleSystemAxes, ParticleSystemDescriptor};
pub use updaters::{
    AlphaOverLifetimeUpdater, ColorOverLifetimeUpdater, FrameUpdater, LifetimeUpdater,
    OverLifetimeCurve, ParticleUpdater, PositionUpdater, ScaleBySpeedUpdater,
    ScaleOverLifetimeUpdater, VelocityOverLifetimeUpdater,
};
