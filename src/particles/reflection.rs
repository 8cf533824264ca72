//! Maps resource-tree type tags to particle component factories.

use serde_json::Value;

use super::emitters::{OverLifetimeEmitter, ParticleEmitter};
use super::generators::{
    AlphaGenerator, ColorGenerator, CylinderPositionGenerator, FrameGenerator, LifetimeGenerator,
    ParticleGenerator, ScaleGenerator, VelocityGenerator,
};
use super::updaters::{
    AlphaOverLifetimeUpdater, ColorOverLifetimeUpdater, FrameUpdater, LifetimeUpdater,
    ParticleUpdater, PositionUpdater, ScaleBySpeedUpdater, ScaleOverLifetimeUpdater,
    VelocityOverLifetimeUpdater,
};
use crate::assets::tree;
use crate::errors::{KeelError, Result};

/// Builds an emitter from its resource-tree node.
pub fn emitter_from_tree(node: &Value, path: &str) -> Result<Box<dyn ParticleEmitter>> {
    let object = tree::object(node, path)?;
    let kind = tree::string(tree::field(object, "type", path)?, path)?;

    match kind {
        "over_lifetime" => Ok(Box::new(OverLifetimeEmitter::new(
            tree::number(tree::field(object, "from", path)?, path)?,
            tree::number(tree::field(object, "to", path)?, path)?,
        ))),
        _ => Err(KeelError::asset(
            path,
            format!("unknown emitter type \"{kind}\""),
        )),
    }
}

/// Builds a generator from its resource-tree node.
pub fn generator_from_tree(node: &Value, path: &str) -> Result<Box<dyn ParticleGenerator>> {
    let object = tree::object(node, path)?;
    let kind = tree::string(tree::field(object, "type", path)?, path)?;

    match kind {
        "cylinder_position" => Ok(Box::new(CylinderPositionGenerator::new(
            tree::vec3(tree::field(object, "origin", path)?, path)?,
            tree::number(tree::field(object, "radius", path)?, path)?,
            tree::number(tree::field(object, "height", path)?, path)?,
        ))),
        "lifetime" => Ok(Box::new(LifetimeGenerator::new(
            tree::number(tree::field(object, "min", path)?, path)?,
            tree::number(tree::field(object, "max", path)?, path)?,
        ))),
        "velocity" => Ok(Box::new(VelocityGenerator::new(
            tree::vec3(tree::field(object, "min", path)?, path)?,
            tree::vec3(tree::field(object, "max", path)?, path)?,
        ))),
        "scale" => Ok(Box::new(ScaleGenerator::new(
            tree::boolean(tree::field(object, "is_uniform", path)?, path)?,
            tree::vec3(tree::field(object, "min", path)?, path)?,
            tree::vec3(tree::field(object, "max", path)?, path)?,
        ))),
        "color" => Ok(Box::new(ColorGenerator::new(
            tree::vec3(tree::field(object, "min", path)?, path)?,
            tree::vec3(tree::field(object, "max", path)?, path)?,
        ))),
        "alpha" => Ok(Box::new(AlphaGenerator::new(
            tree::number(tree::field(object, "min", path)?, path)?,
            tree::number(tree::field(object, "max", path)?, path)?,
        ))),
        "frame" => Ok(Box::new(FrameGenerator::new(
            tree::number(tree::field(object, "min", path)?, path)?,
            tree::number(tree::field(object, "max", path)?, path)?,
        ))),
        _ => Err(KeelError::asset(
            path,
            format!("unknown generator type \"{kind}\""),
        )),
    }
}

/// Builds an updater from its resource-tree node.
pub fn updater_from_tree(node: &Value, path: &str) -> Result<Box<dyn ParticleUpdater>> {
    let object = tree::object(node, path)?;
    let kind = tree::string(tree::field(object, "type", path)?, path)?;

    match kind {
        "lifetime" => Ok(Box::new(LifetimeUpdater)),
        "frame" => Ok(Box::new(FrameUpdater::new(tree::number(
            tree::field(object, "framerate", path)?,
            path,
        )?))),
        "position" => Ok(Box::new(PositionUpdater)),
        "scale_by_speed" => Ok(Box::new(ScaleBySpeedUpdater::new(tree::vec3(
            tree::field(object, "speed_scale", path)?,
            path,
        )?))),
        "velocity_over_lifetime" => {
            let (inputs, outputs) = curve_vec3(object, path)?;
            Ok(Box::new(VelocityOverLifetimeUpdater::new(inputs, outputs)?))
        }
        "color_over_lifetime" => {
            let (inputs, outputs) = curve_vec3(object, path)?;
            Ok(Box::new(ColorOverLifetimeUpdater::new(inputs, outputs)?))
        }
        "scale_over_lifetime" => {
            let (inputs, outputs) = curve_vec3(object, path)?;
            Ok(Box::new(ScaleOverLifetimeUpdater::new(inputs, outputs)?))
        }
        "alpha_over_lifetime" => {
            let inputs = tree::numbers(tree::field(object, "inputs", path)?, path)?;
            let outputs = tree::numbers(tree::field(object, "outputs", path)?, path)?;
            Ok(Box::new(AlphaOverLifetimeUpdater::new(inputs, outputs)?))
        }
        _ => Err(KeelError::asset(
            path,
            format!("unknown updater type \"{kind}\""),
        )),
    }
}

fn curve_vec3(
    object: &serde_json::Map<String, Value>,
    path: &str,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let inputs = tree::numbers(tree::field(object, "inputs", path)?, path)?;

    let output_nodes = tree::array(tree::field(object, "outputs", path)?, path)?;
    let mut outputs = Vec::with_capacity(output_nodes.len() * 3);
    for node in output_nodes {
        let value = tree::vec3(node, path)?;
        outputs.extend_from_slice(&value.to_array());
    }

    Ok((inputs, outputs))
}
