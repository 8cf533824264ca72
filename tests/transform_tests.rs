//! Transform and scene-graph propagation tests
//!
//! Tests for:
//! - Transform composition, inversion and blending
//! - Local/global propagation through containers
//! - Child add/remove round trips
//! - Scene registration bookkeeping

use glam::{Quat, Vec3};
use keel::math::Transform;
use keel::scene::{GeometryData, LightData, Primitive, PrimitiveKind, Scene, SceneDescriptor};
use keel::spatial::{AccelerationStructure, LinearAccelerationStructure};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

// ============================================================================
// Helpers
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

fn transform_approx(a: &Transform, b: &Transform) -> bool {
    vec3_approx(a.translation, b.translation)
        && vec3_approx(a.scale, b.scale)
        && a.rotation.angle_between(b.rotation) < 1e-4
}

fn empty_scene() -> Scene {
    Scene::new(SceneDescriptor::default())
}

// ============================================================================
// Transform Unit Tests
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::default();
    assert_eq!(t.translation, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_compose_translations() {
    let parent = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let local = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));

    let global = parent.mul(&local);
    assert!(vec3_approx(global.translation, Vec3::new(11.0, 2.0, 3.0)));
}

#[test]
fn transform_compose_applies_child_in_parent_space() {
    // Parent rotates 90 degrees around Y and scales by 2.
    let parent = Transform::new(
        Vec3::new(5.0, 0.0, 0.0),
        Quat::from_rotation_y(FRAC_PI_2),
        Vec3::splat(2.0),
    );
    let local = Transform::from_translation(Vec3::new(1.0, 0.0, 0.0));

    // (1,0,0) scaled to (2,0,0), rotated to (0,0,-2), then offset.
    let global = parent.mul(&local);
    assert!(vec3_approx(global.translation, Vec3::new(5.0, 0.0, -2.0)));
}

#[test]
fn transform_inverse_round_trip() {
    let transform = Transform::new(
        Vec3::new(3.0, -2.0, 7.0),
        Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.2),
        Vec3::new(2.0, 2.0, 2.0),
    );

    let identity = transform.mul(&transform.inverse());
    assert!(transform_approx(&identity, &Transform::IDENTITY));

    let point = Vec3::new(4.0, 5.0, 6.0);
    let round_trip = transform
        .inverse()
        .transform_point(transform.transform_point(point));
    assert!(vec3_approx(round_trip, point));
}

#[test]
fn transform_lerp_blends_components() {
    let a = Transform::from_translation(Vec3::ZERO);
    let b = Transform::new(
        Vec3::new(10.0, 0.0, 0.0),
        Quat::from_rotation_y(FRAC_PI_2),
        Vec3::splat(3.0),
    );

    let mid = a.lerp(&b, 0.5);
    assert!(vec3_approx(mid.translation, Vec3::new(5.0, 0.0, 0.0)));
    assert!(vec3_approx(mid.scale, Vec3::splat(2.0)));
    assert!(approx_eq(mid.rotation.angle_between(Quat::IDENTITY), FRAC_PI_2 / 2.0));
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn set_local_transform_derives_global_from_parent() {
    let mut scene = empty_scene();
    let parent = scene
        .add_child(
            scene.root(),
            Primitive::container(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        )
        .unwrap();
    let child = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();

    let local = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    scene.set_local_transform(child, local);

    let parent_global = scene.primitive(parent).unwrap().global_transform();
    let child_global = scene.primitive(child).unwrap().global_transform();
    assert!(transform_approx(&child_global, &parent_global.mul(&local)));
}

#[test]
fn set_global_transform_derives_local_from_parent() {
    let mut scene = empty_scene();
    let parent = scene
        .add_child(
            scene.root(),
            Primitive::container(Transform::new(
                Vec3::new(4.0, 0.0, 0.0),
                Quat::from_rotation_y(FRAC_PI_2),
                Vec3::ONE,
            )),
        )
        .unwrap();
    let child = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();

    let target = Transform::from_translation(Vec3::new(7.0, 1.0, -2.0));
    scene.set_global_transform(child, target);

    let child_primitive = scene.primitive(child).unwrap();
    assert!(transform_approx(&child_primitive.global_transform(), &target));

    let parent_global = scene.primitive(parent).unwrap().global_transform();
    let rederived = parent_global.mul(&child_primitive.local_transform());
    assert!(transform_approx(&rederived, &target));
}

#[test]
fn remove_and_re_add_preserves_global_transform() {
    let mut scene = empty_scene();
    let parent = scene
        .add_child(
            scene.root(),
            Primitive::container(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        )
        .unwrap();
    let child = scene
        .add_child(
            parent,
            Primitive::container(Transform::from_translation(Vec3::new(1.0, 2.0, 3.0))),
        )
        .unwrap();

    let before = scene.primitive(child).unwrap().global_transform();

    scene.remove_child(child);
    // Detached: the primitive is its own coordinate system.
    let detached = scene.primitive(child).unwrap();
    assert!(detached.parent().is_none());
    assert!(transform_approx(
        &detached.global_transform(),
        &detached.local_transform()
    ));

    scene.attach(parent, child).unwrap();
    let after = scene.primitive(child).unwrap().global_transform();
    assert!(transform_approx(&before, &after));
}

#[test]
fn children_keep_insertion_order_across_removal() {
    let mut scene = empty_scene();
    let parent = scene
        .add_child(scene.root(), Primitive::container(Transform::IDENTITY))
        .unwrap();

    let a = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();
    let b = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();
    let c = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();

    assert_eq!(scene.primitive(parent).unwrap().children(), &[a, b, c]);

    scene.remove_child(b);
    assert_eq!(scene.primitive(parent).unwrap().children(), &[a, c]);
}

#[test]
fn adding_attached_primitive_is_rejected() {
    let mut scene = empty_scene();
    let parent = scene
        .add_child(scene.root(), Primitive::container(Transform::IDENTITY))
        .unwrap();
    let child = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();

    assert!(scene.attach(scene.root(), child).is_err());
}

#[test]
fn destroy_removes_subtree() {
    let mut scene = empty_scene();
    let parent = scene
        .add_child(scene.root(), Primitive::container(Transform::IDENTITY))
        .unwrap();
    let child = scene
        .add_child(parent, Primitive::container(Transform::IDENTITY))
        .unwrap();
    let grandchild = scene
        .add_child(child, Primitive::container(Transform::IDENTITY))
        .unwrap();

    scene.destroy(child);

    assert!(scene.primitive(child).is_none());
    assert!(scene.primitive(grandchild).is_none());
    assert_eq!(scene.primitive(parent).unwrap().children(), &[]);
}

// ============================================================================
// Scene registration
// ============================================================================

#[test]
fn spatial_primitives_register_with_acceleration_structures() {
    let geometry_accel = Arc::new(LinearAccelerationStructure::new());
    let light_accel = Arc::new(LinearAccelerationStructure::new());

    let mut scene = Scene::new(SceneDescriptor {
        geometry_accel: Some(geometry_accel.clone()),
        light_accel: Some(light_accel.clone()),
        ..SceneDescriptor::default()
    });

    let geometry = scene
        .add_child(
            scene.root(),
            Primitive::new(
                PrimitiveKind::Geometry(GeometryData::new(None, None, None)),
                Transform::IDENTITY,
            ),
        )
        .unwrap();
    scene
        .add_child(
            scene.root(),
            Primitive::new(
                PrimitiveKind::Light(LightData::new(Vec3::ONE, 5.0)),
                Transform::IDENTITY,
            ),
        )
        .unwrap();

    assert_eq!(geometry_accel.count(), 1);
    assert_eq!(light_accel.count(), 1);

    scene.remove_child(geometry);
    assert_eq!(geometry_accel.count(), 0);
    assert_eq!(light_accel.count(), 1);
}

// ============================================================================
// End-to-end scenario: container translation
// ============================================================================

#[test]
fn container_translation_scenario() {
    let mut scene = empty_scene();

    let container = scene
        .add_child(
            scene.root(),
            Primitive::container(Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        )
        .unwrap();
    let geometry = scene
        .add_child(
            container,
            Primitive::new(
                PrimitiveKind::Geometry(GeometryData::new(None, None, None)),
                Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            ),
        )
        .unwrap();

    let global = scene.primitive(geometry).unwrap().global_transform();
    assert!(vec3_approx(global.translation, Vec3::new(11.0, 2.0, 3.0)));

    scene.set_local_translation(container, Vec3::ZERO);

    let global = scene.primitive(geometry).unwrap().global_transform();
    assert!(vec3_approx(global.translation, Vec3::new(1.0, 2.0, 3.0)));
}
