use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::random::ParticleRandom;
use super::stream::{ParticleStreams, Stream};
use super::system::ParticleSystem;
use crate::assets::{Resource, ResourceHandle};
use crate::math::{Aabb, Transform};

/// Mutable simulation state of one particle primitive.
///
/// `streams` holds the live particles as a dense prefix of length
/// `particle_count`; `time` is the wrapped emission clock.
#[derive(Default)]
pub struct EffectInner {
    /// Allocated attribute streams.
    pub streams: ParticleStreams,
    /// Length of the live prefix.
    pub particle_count: usize,
    /// Seconds into the current emission cycle.
    pub time: f32,
    /// The primitive's global transform, mirrored here for the spawn
    /// kernels.
    pub global_transform: Transform,
    /// World-space bounds (`max_bounds` under the global transform).
    pub bounds: Aabb,
}

/// Shared simulation state of one particle-system primitive.
///
/// The scene-graph payload and the particle player both hold this through an
/// `Arc`: the scene feeds transform updates in, the player's worker task
/// simulates. A single worker touches a given effect per frame; the mutex
/// makes the sharing sound rather than providing parallelism.
pub struct ParticleEffectState {
    particle_system: RwLock<Option<ResourceHandle<ParticleSystem>>>,
    inner: Mutex<EffectInner>,
}

impl ParticleEffectState {
    /// Creates the state for a primitive bound to `particle_system`.
    #[must_use]
    pub fn new(particle_system: Option<ResourceHandle<ParticleSystem>>) -> Arc<Self> {
        Arc::new(Self {
            particle_system: RwLock::new(particle_system),
            inner: Mutex::new(EffectInner::default()),
        })
    }

    /// The bound particle system.
    #[must_use]
    pub fn particle_system(&self) -> Option<ResourceHandle<ParticleSystem>> {
        self.particle_system.read().clone()
    }

    /// Copy semantics of particle primitives: the clone shares the particle
    /// system but starts with no live particles, fresh streams and time
    /// zero.
    #[must_use]
    pub fn duplicate(&self) -> Arc<Self> {
        Self::new(self.particle_system())
    }

    /// Rebinds the particle system, dropping live particles.
    pub fn set_particle_system(&self, particle_system: Option<ResourceHandle<ParticleSystem>>) {
        *self.particle_system.write() = particle_system;
        let mut inner = self.inner.lock();
        inner.streams = ParticleStreams::default();
        inner.particle_count = 0;
        inner.time = 0.0;
    }

    /// Allocates the streams the loaded system's mask selects and computes
    /// world bounds. Called from the system's loaded notification; returns
    /// the bounds so the caller can update the acceleration structure.
    pub fn on_system_loaded(&self) -> Aabb {
        let system = self.particle_system.read();
        let mut inner = self.inner.lock();

        if let Some(system) = system.as_ref() {
            let system = system.read();
            if system.is_loaded() {
                inner
                    .streams
                    .allocate(system.stream_mask(), system.max_particle_count());
                inner.bounds = system.max_bounds().transform(&inner.global_transform);
            }
        }

        inner.bounds
    }

    /// Mirrors a new global transform and refits the world bounds. Returns
    /// the new bounds for the caller's acceleration-structure update.
    pub fn set_global_transform(&self, global_transform: Transform) -> Aabb {
        let system = self.particle_system.read();
        let mut inner = self.inner.lock();

        inner.global_transform = global_transform;
        if let Some(system) = system.as_ref() {
            let system = system.read();
            if system.is_loaded() {
                inner.bounds = system.max_bounds().transform(&global_transform);
            }
        }

        inner.bounds
    }

    /// Current world-space bounds.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.inner.lock().bounds
    }

    /// Number of live particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.inner.lock().particle_count
    }

    /// Runs one effect's read-only inspection closure against the inner
    /// state. Test and tooling hook.
    pub fn inspect<R>(&self, f: impl FnOnce(&EffectInner) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Runs a mutating closure against the inner state. Test and tooling
    /// hook; the player must not be simulating this effect concurrently.
    pub fn modify<R>(&self, f: impl FnOnce(&mut EffectInner) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// One frame of simulation: kill, emit, update. No-op until the system
    /// is loaded.
    pub fn simulate(&self, elapsed_time: f32) {
        let system_handle = self.particle_system.read().clone();
        let Some(system_handle) = system_handle else {
            return;
        };
        let system = system_handle.read();
        if !system.is_loaded() {
            return;
        }

        let mut inner = self.inner.lock();
        kill(&mut inner);
        emit(&mut inner, &system, elapsed_time);
        update(&mut inner, &system, elapsed_time);
    }
}

/// Kill pass: drops particles whose lifetime expired by compacting every
/// allocated stream toward the front, preserving the relative order of
/// survivors.
fn kill(inner: &mut EffectInner) {
    let particle_count = inner.particle_count;
    let mut particles_killed = 0;

    for index in 0..particle_count {
        let expired = {
            let current = inner
                .streams
                .get(Stream::CurrentLifetime)
                .expect("lifetime streams are mandatory");
            let total = inner
                .streams
                .get(Stream::TotalLifetime)
                .expect("lifetime streams are mandatory");
            current[index] >= total[index]
        };

        if expired {
            particles_killed += 1;
        } else if particles_killed > 0 {
            for buffer in inner.streams.allocated_mut() {
                let values = buffer.as_mut_slice();
                values[index - particles_killed] = values[index];
            }
        }
    }

    inner.particle_count -= particles_killed;
}

/// Emit pass: advances and wraps the system clock, sums emitter counts,
/// clamps to capacity and runs the generators over the new range.
fn emit(inner: &mut EffectInner, system: &ParticleSystem, elapsed_time: f32) {
    inner.time += elapsed_time;
    if inner.time >= system.duration() {
        inner.time = 0.0;
    }

    let begin_index = inner.particle_count;
    let mut end_index = begin_index;

    for emitter in system.emitters() {
        end_index += emitter.emit(inner.time, system.duration(), elapsed_time);
    }

    end_index = end_index.min(system.max_particle_count());

    if begin_index != end_index {
        inner.particle_count = end_index;

        let mut random = ParticleRandom::global();
        for generator in system.generators() {
            generator.generate(inner, begin_index, end_index, &mut random);
        }
    }
}

/// Update pass: runs the updaters in declared order over the live range.
fn update(inner: &mut EffectInner, system: &ParticleSystem, elapsed_time: f32) {
    for updater in system.updaters() {
        updater.update(inner, elapsed_time);
    }
}
