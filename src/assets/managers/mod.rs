//! Per-asset resource managers.
//!
//! Every manager follows the same per-frame protocol: `load` deduplicates by
//! path and queues new entries; the begin task evicts entries only the
//! manager still references and spawns one worker per pending entry with an
//! output dependency on the end task; workers parse, publish by move
//! assignment and fire the loaded notifier; the end task is the
//! synchronization point consumers order themselves after.

mod binary;
mod blend_tree;
mod container;
mod material;
mod motion_graph;
mod particle_system;

pub use binary::{AnimationManager, BinaryAssetManager, GeometryManager, TextureManager};
pub use blend_tree::BlendTreeManager;
pub use container::ContainerManager;
pub use material::MaterialManager;
pub use motion_graph::MotionGraphManager;
pub use particle_system::ParticleSystemManager;
