//! Helpers for the JSON-like resource trees (materials, particle systems,
//! blend trees, motion graphs, container prototypes).
//!
//! Every accessor reports failures as asset-parse errors against the file
//! being loaded, so a malformed tree surfaces with its path and the missing
//! or mistyped field.

use glam::{Quat, Vec3};
use serde_json::{Map, Value};

use crate::errors::{KeelError, Result};
use crate::math::{Aabb, Transform};

/// The value as an object.
pub fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| KeelError::asset(path, "expected an object"))
}

/// The value as an array.
pub fn array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| KeelError::asset(path, "expected an array"))
}

/// A required field of an object.
pub fn field<'a>(object: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    object
        .get(key)
        .ok_or_else(|| KeelError::asset(path, format!("missing field \"{key}\"")))
}

/// The value as a float.
pub fn number(value: &Value, path: &str) -> Result<f32> {
    value
        .as_f64()
        .map(|number| number as f32)
        .ok_or_else(|| KeelError::asset(path, "expected a number"))
}

/// The value as an unsigned integer.
pub fn unsigned(value: &Value, path: &str) -> Result<u32> {
    value
        .as_u64()
        .map(|number| number as u32)
        .ok_or_else(|| KeelError::asset(path, "expected an unsigned integer"))
}

/// The value as a string.
pub fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| KeelError::asset(path, "expected a string"))
}

/// The value as a boolean.
pub fn boolean(value: &Value, path: &str) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| KeelError::asset(path, "expected a boolean"))
}

/// The value as `[x, y, z]`.
pub fn vec3(value: &Value, path: &str) -> Result<Vec3> {
    let values = float_array::<3>(value, path)?;
    Ok(Vec3::from_array(values))
}

/// The value as `[x, y, z, w]` (a quaternion).
pub fn quat(value: &Value, path: &str) -> Result<Quat> {
    let values = float_array::<4>(value, path)?;
    Ok(Quat::from_array(values).normalize())
}

/// The value as a flat list of floats.
pub fn numbers(value: &Value, path: &str) -> Result<Vec<f32>> {
    array(value, path)?
        .iter()
        .map(|entry| number(entry, path))
        .collect()
}

/// The value as `{ "center": [...], "extent": [...] }`.
pub fn aabb(value: &Value, path: &str) -> Result<Aabb> {
    let object = object(value, path)?;
    Ok(Aabb::new(
        vec3(field(object, "center", path)?, path)?,
        vec3(field(object, "extent", path)?, path)?,
    ))
}

/// The value as a transform object; missing components default to identity.
pub fn transform(value: &Value, path: &str) -> Result<Transform> {
    let object = object(value, path)?;
    let translation = match object.get("translation") {
        Some(value) => vec3(value, path)?,
        None => Vec3::ZERO,
    };
    let rotation = match object.get("rotation") {
        Some(value) => quat(value, path)?,
        None => Quat::IDENTITY,
    };
    let scale = match object.get("scale") {
        Some(value) => vec3(value, path)?,
        None => Vec3::ONE,
    };
    Ok(Transform::new(translation, rotation, scale))
}

fn float_array<const N: usize>(value: &Value, path: &str) -> Result<[f32; N]> {
    let values = array(value, path)?;
    if values.len() != N {
        return Err(KeelError::asset(path, format!("expected {N} numbers")));
    }
    let mut result = [0.0; N];
    for (slot, entry) in result.iter_mut().zip(values) {
        *slot = number(entry, path)?;
    }
    Ok(result)
}
