//! Particle pipeline tests
//!
//! Tests for:
//! - Kill-pass compaction preserving survivor order across every stream
//! - Over-lifetime emitter discretization
//! - Stream allocation from the system mask (alignment, rounding)
//! - Updater kernels (lifetime, position, over-lifetime, scale by speed)
//! - The emit/kill lifecycle scenario
//! - The player driving effects through the scheduler

use std::sync::Arc;

use glam::Vec3;
use keel::assets::ResourceSlot;
use keel::math::Aabb;
use keel::particles::{
    LifetimeGenerator, LifetimeUpdater, OverLifetimeEmitter, ParticleEffectState, ParticleEmitter,
    ParticleRandom, ParticleSystem, ParticleSystemDescriptor, ParticleSystemPlayer,
    PositionUpdater, ScaleBySpeedUpdater, Stream, StreamMask, VelocityGenerator,
    VelocityOverLifetimeUpdater,
};
use keel::resources::Geometry;
use keel::tasks::TaskScheduler;

// ============================================================================
// Helpers
// ============================================================================

fn loaded_system(descriptor: ParticleSystemDescriptor) -> Arc<ResourceSlot<ParticleSystem>> {
    let mut descriptor = descriptor;
    // A system is loaded iff it references a geometry.
    descriptor.geometry = Some(ResourceSlot::new_loaded(Geometry::default()));
    ResourceSlot::new_loaded(ParticleSystem::from_descriptor(descriptor, "test").unwrap())
}

fn constant_rate_emitter(rate: f32) -> Box<dyn ParticleEmitter> {
    Box::new(OverLifetimeEmitter::new(rate, rate))
}

/// Emits a fixed burst on the first frame, then nothing.
struct BurstEmitter {
    count: usize,
}

impl ParticleEmitter for BurstEmitter {
    fn emit(&self, system_time: f32, _system_duration: f32, elapsed_time: f32) -> usize {
        if system_time - elapsed_time <= 0.0 {
            self.count
        } else {
            0
        }
    }
}

// ============================================================================
// Emitter discretization
// ============================================================================

#[test]
fn over_lifetime_emitter_never_drops_fractional_particles() {
    let emitter = OverLifetimeEmitter::new(30.0, 30.0);
    let duration = 10.0;
    let step = 1.0 / 60.0;

    let mut time = 0.0;
    let mut emitted = 0;
    for _ in 0..600 {
        time += step;
        emitted += emitter.emit(time, duration, step);
    }

    // 30 particles/second over 10 seconds.
    assert_eq!(emitted, 300);
}

#[test]
fn over_lifetime_emitter_ramps_rate() {
    let emitter = OverLifetimeEmitter::new(0.0, 100.0);
    let duration = 1.0;

    // The integral form gives more particles in the late half.
    let early: usize = emitter.emit(0.25, duration, 0.25);
    let late: usize = emitter.emit(1.0, duration, 0.25);
    assert!(late > early);
}

// ============================================================================
// Stream allocation
// ============================================================================

#[test]
fn streams_allocate_from_mask_rounded_and_aligned() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 10.0,
        max_particle_count: 30,
        emitters: vec![constant_rate_emitter(1.0)],
        generators: vec![Box::new(LifetimeGenerator::new(1.0, 1.0))],
        updaters: vec![Box::new(LifetimeUpdater)],
        ..ParticleSystemDescriptor::default()
    });

    // 30 rounds up to 32 for the 4-wide kernels.
    assert_eq!(system.read().max_particle_count(), 32);
    assert_eq!(
        system.read().stream_mask(),
        StreamMask::TOTAL_LIFETIME | StreamMask::CURRENT_LIFETIME
    );

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();

    effect.inspect(|inner| {
        let total = inner.streams.get(Stream::TotalLifetime).unwrap();
        assert_eq!(total.len(), 32);
        assert_eq!(total.as_ptr() as usize % 16, 0, "streams are 16-byte aligned");
        assert!(!inner.streams.has(Stream::PositionX));
    });
}

#[test]
fn duplicate_generators_for_a_stream_are_rejected() {
    let descriptor = ParticleSystemDescriptor {
        duration: 1.0,
        max_particle_count: 4,
        generators: vec![
            Box::new(LifetimeGenerator::new(1.0, 1.0)),
            Box::new(LifetimeGenerator::new(2.0, 2.0)),
        ],
        ..ParticleSystemDescriptor::default()
    };

    assert!(ParticleSystem::from_descriptor(descriptor, "test").is_err());
}

#[test]
fn loop_count_zero_means_infinite() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 1.0,
        loop_count: 0,
        max_particle_count: 4,
        ..ParticleSystemDescriptor::default()
    });
    assert_eq!(system.read().loop_count(), u32::MAX);

    let system = loaded_system(ParticleSystemDescriptor {
        duration: 1.0,
        loop_count: 3,
        max_particle_count: 4,
        ..ParticleSystemDescriptor::default()
    });
    assert_eq!(system.read().loop_count(), 3);
}

// ============================================================================
// Kill compaction
// ============================================================================

#[test]
fn kill_pass_compacts_survivors_in_order_across_streams() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 100.0,
        max_particle_count: 8,
        generators: vec![Box::new(LifetimeGenerator::new(1.0, 1.0))],
        ..ParticleSystemDescriptor::default()
    });

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();

    // Hand-build a population with a known death pattern: particles 1, 3
    // and 4 are expired.
    effect.modify(|inner| {
        inner.particle_count = 6;
        let [total, current] = inner
            .streams
            .disjoint_mut([Stream::TotalLifetime, Stream::CurrentLifetime]);
        for (index, slot) in total.iter_mut().enumerate().take(6) {
            *slot = index as f32 + 10.0;
        }
        current[..6].copy_from_slice(&[0.0, 99.0, 0.0, 99.0, 99.0, 0.0]);
    });

    effect.simulate(0.0);

    assert_eq!(effect.particle_count(), 3);
    effect.inspect(|inner| {
        // Survivors 0, 2, 5 kept their values in original relative order,
        // on every allocated stream.
        let total = inner.streams.get(Stream::TotalLifetime).unwrap();
        assert_eq!(&total[..3], &[10.0, 12.0, 15.0]);
    });
}

// ============================================================================
// Updater kernels
// ============================================================================

#[test]
fn position_updater_integrates_velocity() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 100.0,
        max_particle_count: 4,
        emitters: vec![constant_rate_emitter(1000.0)],
        generators: vec![
            Box::new(LifetimeGenerator::new(10.0, 10.0)),
            Box::new(VelocityGenerator::new(
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            )),
        ],
        updaters: vec![Box::new(LifetimeUpdater), Box::new(PositionUpdater)],
        ..ParticleSystemDescriptor::default()
    });

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();
    effect.modify(|inner| {
        // Position streams come from the updater mask; spawn at origin.
        inner.streams.get_mut(Stream::PositionX).unwrap().fill(0.0);
    });

    effect.simulate(0.5);

    effect.inspect(|inner| {
        assert!(inner.particle_count > 0);
        let position_x = inner.streams.get(Stream::PositionX).unwrap();
        // velocity (2,0,0) * multiplier 1 * dt 0.5
        assert!((position_x[0] - 1.0).abs() < 1e-5);
    });
}

#[test]
fn velocity_over_lifetime_samples_curve_segments() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 100.0,
        max_particle_count: 8,
        generators: vec![
            Box::new(LifetimeGenerator::new(1.0, 1.0)),
            Box::new(VelocityGenerator::new(Vec3::ONE, Vec3::ONE)),
        ],
        updaters: vec![Box::new(
            VelocityOverLifetimeUpdater::new(
                vec![0.0, 0.5, 1.0],
                vec![
                    1.0, 1.0, 1.0, // at age 0
                    3.0, 3.0, 3.0, // at age 0.5
                    5.0, 5.0, 5.0, // at age 1
                ],
            )
            .unwrap(),
        )],
        ..ParticleSystemDescriptor::default()
    });

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();

    effect.modify(|inner| {
        inner.particle_count = 4;
        let [total, current] = inner
            .streams
            .disjoint_mut([Stream::TotalLifetime, Stream::CurrentLifetime]);
        total[..4].fill(1.0);
        // Ages 0, 0.25, 0.5, 0.75 hit both curve segments.
        current[..4].copy_from_slice(&[0.0, 0.25, 0.5, 0.75]);
    });

    effect.simulate(0.0);

    effect.inspect(|inner| {
        let velocity_x = inner.streams.get(Stream::VelocityX).unwrap();
        assert!((velocity_x[0] - 1.0).abs() < 1e-4);
        assert!((velocity_x[1] - 2.0).abs() < 1e-4);
        assert!((velocity_x[2] - 3.0).abs() < 1e-4);
        assert!((velocity_x[3] - 4.0).abs() < 1e-4);
    });
}

#[test]
fn scale_by_speed_multiplies_scale() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 100.0,
        max_particle_count: 4,
        generators: vec![
            Box::new(LifetimeGenerator::new(10.0, 10.0)),
            Box::new(VelocityGenerator::new(
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 0.0),
            )),
        ],
        updaters: vec![Box::new(ScaleBySpeedUpdater::new(Vec3::splat(2.0)))],
        ..ParticleSystemDescriptor::default()
    });

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();

    effect.modify(|inner| {
        inner.particle_count = 4;
        let [total, current] = inner
            .streams
            .disjoint_mut([Stream::TotalLifetime, Stream::CurrentLifetime]);
        total[..4].fill(10.0);
        current[..4].fill(0.0);
        let [scale_x, generated_x, velocity_x] = inner.streams.disjoint_mut([
            Stream::ScaleX,
            Stream::GeneratedVelocityX,
            Stream::VelocityX,
        ]);
        scale_x.fill(1.0);
        generated_x.fill(3.0);
        velocity_x.fill(1.0);
        let [gy, gz, vy, vz] = inner.streams.disjoint_mut([
            Stream::GeneratedVelocityY,
            Stream::GeneratedVelocityZ,
            Stream::VelocityY,
            Stream::VelocityZ,
        ]);
        gy.fill(0.0);
        gz.fill(0.0);
        vy.fill(1.0);
        vz.fill(1.0);
    });

    effect.simulate(0.0);

    effect.inspect(|inner| {
        let scale_x = inner.streams.get(Stream::ScaleX).unwrap();
        // |v| = 3, speed_scale = 2, previous scale = 1.
        assert!((scale_x[0] - 6.0).abs() < 1e-4);
    });
}

// ============================================================================
// RNG
// ============================================================================

#[test]
fn random_produces_unit_range_and_matching_lanes() {
    let mut scalar = ParticleRandom::new(12345);
    let mut lanes = ParticleRandom::new(12345);

    let a = scalar.rand_float();
    let b = scalar.rand_float();
    let c = scalar.rand_float();
    let d = scalar.rand_float();
    let lane = lanes.rand_lane4();

    // The 4-lane helper steps the same sequence as four scalar draws.
    assert_eq!(lane.to_array(), [a, b, c, d]);

    let mut generator = ParticleRandom::new(999);
    for _ in 0..1000 {
        let value = generator.rand_float();
        assert!((0.0..1.0).contains(&value));
    }
}

// ============================================================================
// End-to-end scenario: emit then expire
// ============================================================================

#[test]
fn emit_one_hundred_then_expire_scenario() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 10.0,
        max_particle_count: 100,
        emitters: vec![Box::new(BurstEmitter { count: 100 })],
        generators: vec![Box::new(LifetimeGenerator::new(1.0, 1.0))],
        updaters: vec![Box::new(LifetimeUpdater)],
        ..ParticleSystemDescriptor::default()
    });

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();

    effect.simulate(0.5); // frame 1: 100 emitted, aged to 0.5
    assert_eq!(effect.particle_count(), 100);

    effect.simulate(0.5); // frame 2: at capacity, aged to 1.0
    assert_eq!(effect.particle_count(), 100);

    effect.simulate(0.5); // frame 3: everything expired
    assert_eq!(effect.particle_count(), 0);
}

// ============================================================================
// Player
// ============================================================================

#[test]
fn player_simulates_registered_effects_through_scheduler() {
    let scheduler = TaskScheduler::new(4);
    let player = ParticleSystemPlayer::new(Arc::clone(&scheduler));

    let mut effects = Vec::new();
    for _ in 0..4 {
        let system = loaded_system(ParticleSystemDescriptor {
            duration: 10.0,
            max_particle_count: 16,
            emitters: vec![constant_rate_emitter(100.0)],
            generators: vec![Box::new(LifetimeGenerator::new(5.0, 5.0))],
            updaters: vec![Box::new(LifetimeUpdater)],
            ..ParticleSystemDescriptor::default()
        });
        let effect = ParticleEffectState::new(Some(system));
        effect.on_system_loaded();
        player.add(Arc::clone(&effect));
        effects.push(effect);
    }
    assert_eq!(player.len(), 4);

    let fence = scheduler.begin_frame();
    let (begin, end) = player.create_tasks(0.25);
    scheduler.enqueue_all(&[&begin, &end]);
    assert!(fence.wait());

    for effect in &effects {
        assert_eq!(effect.particle_count(), 16);
    }

    // Removal leaves a reusable hole.
    player.remove(&effects[1]);
    assert_eq!(player.len(), 3);

    let fence = scheduler.begin_frame();
    let (begin, end) = player.create_tasks(0.25);
    scheduler.enqueue_all(&[&begin, &end]);
    assert!(fence.wait());

    // The removed effect did not advance.
    effects[1].inspect(|inner| {
        let current = inner.streams.get(Stream::CurrentLifetime).unwrap();
        assert!((current[0] - 0.25).abs() < 1e-5);
    });
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn loaded_effect_bounds_follow_global_transform() {
    let system = loaded_system(ParticleSystemDescriptor {
        duration: 1.0,
        max_particle_count: 4,
        max_bounds: Aabb::new(Vec3::ZERO, Vec3::splat(2.0)),
        ..ParticleSystemDescriptor::default()
    });

    let effect = ParticleEffectState::new(Some(system));
    effect.on_system_loaded();

    let bounds = effect.set_global_transform(keel::math::Transform::from_translation(Vec3::new(
        10.0, 0.0, 0.0,
    )));
    assert!((bounds.center.x - 10.0).abs() < 1e-5);
    assert!((bounds.extent.x - 2.0).abs() < 1e-5);
}
